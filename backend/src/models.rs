use chrono::DateTime;
use common::{utils, MessageDto};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub pw_hash: String,
}

/// A message joined with its author, as every timeline query returns it.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TimelineEntry {
    pub message_id: i64,
    pub author_id: i64,
    pub text: String,
    pub pub_date: i64,
    pub username: String,
    pub email: String,
}

impl From<TimelineEntry> for MessageDto {
    fn from(entry: TimelineEntry) -> Self {
        MessageDto {
            content: entry.text,
            pub_date: DateTime::from_timestamp(entry.pub_date, 0).unwrap_or_default(),
            user: entry.username,
        }
    }
}

/// What a timeline page needs to show for one message.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub text: String,
    pub username: String,
    pub pub_date: String,
    pub gravatar_url: String,
}

impl From<TimelineEntry> for MessageView {
    fn from(entry: TimelineEntry) -> Self {
        MessageView {
            gravatar_url: utils::gravatar_url(&entry.email, 48),
            pub_date: utils::format_pub_date(entry.pub_date),
            text: entry.text,
            username: entry.username,
        }
    }
}
