use axum::{
    debug_handler,
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::flash;
use crate::models::{MessageView, TimelineEntry, User};
use crate::repository;
use crate::templates::{render, TimelineKind, TimelineTemplate};
use crate::web_server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageForm {
    pub text: String,
}

fn views(entries: Vec<TimelineEntry>) -> Vec<MessageView> {
    entries.into_iter().map(MessageView::from).collect()
}

async fn profile_user(state: &AppState, username: &str) -> Result<User, AppError> {
    repository::get_user_by_name(&state.db_pool, username)
        .await?
        .ok_or(AppError::NotFound)
}

/// Home timeline for a logged-in user, the public one otherwise.
#[debug_handler]
pub async fn timeline(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Ok(Redirect::to("/public").into_response());
    };

    let entries =
        repository::home_timeline(&state.db_pool, user.id, state.app_config.web.per_page).await?;
    let (jar, flashes) = flash::take(jar);
    let page = render(&TimelineTemplate {
        title: "My Timeline".to_string(),
        user: Some(user),
        flashes,
        kind: TimelineKind::Home,
        messages: views(entries),
        profile_username: String::new(),
        is_own_profile: false,
        followed: false,
    })?;
    Ok((jar, page).into_response())
}

#[debug_handler]
pub async fn public_timeline(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let entries = repository::public_timeline(&state.db_pool, state.app_config.web.per_page).await?;
    let (jar, flashes) = flash::take(jar);
    let page = render(&TimelineTemplate {
        title: "Public Timeline".to_string(),
        user,
        flashes,
        kind: TimelineKind::Public,
        messages: views(entries),
        profile_username: String::new(),
        is_own_profile: false,
        followed: false,
    })?;
    Ok((jar, page).into_response())
}

#[debug_handler]
pub async fn user_timeline(
    State(state): State<AppState>,
    Path(username): Path<String>,
    user: Option<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let profile = profile_user(&state, &username).await?;

    let (is_own_profile, followed) = match &user {
        Some(current) if current.id == profile.user_id => (true, false),
        Some(current) => (
            false,
            repository::is_following(&state.db_pool, current.id, profile.user_id).await?,
        ),
        None => (false, false),
    };

    let entries =
        repository::user_timeline(&state.db_pool, profile.user_id, state.app_config.web.per_page)
            .await?;
    let (jar, flashes) = flash::take(jar);
    let page = render(&TimelineTemplate {
        title: format!("{}'s Timeline", profile.username),
        user,
        flashes,
        kind: TimelineKind::User,
        messages: views(entries),
        profile_username: profile.username,
        is_own_profile,
        followed,
    })?;
    Ok((jar, page).into_response())
}

#[debug_handler]
pub async fn follow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let whom = profile_user(&state, &username).await?;
    if whom.user_id == user.id {
        return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
    }

    repository::follow(&state.db_pool, user.id, whom.user_id).await?;
    tracing::info!(who = user.id, whom = whom.user_id, "Follow");

    let jar = flash::push(jar, format!("You are now following \"{}\"", whom.username));
    Ok((jar, Redirect::to(&format!("/{}", whom.username))).into_response())
}

#[debug_handler]
pub async fn unfollow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let whom = profile_user(&state, &username).await?;
    if !repository::unfollow(&state.db_pool, user.id, whom.user_id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(who = user.id, whom = whom.user_id, "Unfollow");

    let jar = flash::push(jar, format!("You are no longer following \"{}\"", whom.username));
    Ok((jar, Redirect::to(&format!("/{}", whom.username))).into_response())
}

#[debug_handler]
pub async fn add_message(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    if form.text.trim().is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let message_id =
        repository::create_message(&state.db_pool, user.id, &form.text, Utc::now().timestamp())
            .await?;
    tracing::info!(message_id, author_id = user.id, "Message recorded");

    let jar = flash::push(jar, "Your message was recorded");
    Ok((jar, Redirect::to("/")).into_response())
}
