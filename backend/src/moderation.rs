//! Moderator operations behind the `minitwit-flag` tool.

use std::fmt::Write as _;

use common::utils;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::TimelineEntry;
use crate::repository;

/// Flags every id in `message_ids` and returns the ones that matched no message.
pub async fn flag_messages(pool: &DbPool, message_ids: &[i64]) -> Result<Vec<i64>, AppError> {
    let mut unknown = Vec::new();
    for &message_id in message_ids {
        if repository::flag_message(pool, message_id).await? {
            tracing::info!(message_id, "Flagged message");
        } else {
            tracing::warn!(message_id, "No such message");
            unknown.push(message_id);
        }
    }
    Ok(unknown)
}

/// One line per message: id, author, date, text.
pub fn format_listing(entries: &[TimelineEntry]) -> String {
    entries.iter().fold(String::new(), |mut out, entry| {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            entry.message_id,
            entry.username,
            utils::format_pub_date(entry.pub_date),
            entry.text
        );
        out
    })
}
