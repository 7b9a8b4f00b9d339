use askama::Template;
use axum::response::Html;

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::MessageView;

/// Which timeline a `TimelineTemplate` is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKind {
    Home,
    Public,
    User,
}

impl TimelineKind {
    pub fn is_home(&self) -> bool {
        *self == TimelineKind::Home
    }

    pub fn is_user(&self) -> bool {
        *self == TimelineKind::User
    }
}

#[derive(Template)]
#[template(path = "timeline.html")]
pub struct TimelineTemplate {
    pub title: String,
    pub user: Option<AuthUser>,
    pub flashes: Vec<String>,
    pub kind: TimelineKind,
    pub messages: Vec<MessageView>,
    pub profile_username: String,
    pub is_own_profile: bool,
    pub followed: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub title: String,
    pub user: Option<AuthUser>,
    pub flashes: Vec<String>,
    pub error: Option<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub title: String,
    pub user: Option<AuthUser>,
    pub flashes: Vec<String>,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

/// Renders any template into an HTML response body.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
