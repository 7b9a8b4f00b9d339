//! JSON API driven by the external simulator.
//!
//! Every write-ish route records `?latest=` before checking the simulator's
//! basic-auth credentials, so the counter moves even for rejected calls.

use axum::{
    debug_handler,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::headers::{authorization::Basic, Authorization, HeaderMapExt};
use chrono::Utc;
use common::{
    ErrorResponse, FollowRequest, FollowsResponse, LatestResponse, MessageDto, PostMessageRequest,
    RegisterRequest,
};
use serde_json::{json, Value};
use utoipa::OpenApi;

use crate::auth::hash_password;
use crate::error::{validate_in_order, AppError, SIMULATOR_FORBIDDEN};
use crate::extractors::{ApiJson, ApiQuery, LatestParam, LimitParam};
use crate::repository;
use crate::web_server::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(latest, register, messages, user_messages, post_message, follows, update_follows, health),
    components(schemas(
        RegisterRequest,
        MessageDto,
        PostMessageRequest,
        FollowRequest,
        FollowsResponse,
        LatestResponse,
        ErrorResponse
    )),
    tags((name = "simulator", description = "MiniTwit simulator API"))
)]
pub struct ApiDoc;

pub async fn simulator_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let latest = Query::<LatestParam>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(params)| params.value());
    if let Some(latest) = latest {
        repository::set_latest(&state.db_pool, latest).await?;
    }

    // Anything that does not decode as `Basic` credentials is treated as absent.
    let simulator = &state.app_config.simulator;
    let authorized = request
        .headers()
        .typed_get::<Authorization<Basic>>()
        .is_some_and(|auth| {
            auth.username() == simulator.username && auth.password() == simulator.password
        });
    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected simulator request");
        return Err(AppError::Forbidden(SIMULATOR_FORBIDDEN.to_string()));
    }

    Ok(next.run(request).await)
}

async fn require_user_id(state: &AppState, username: &str) -> Result<i64, AppError> {
    repository::get_user_id(&state.db_pool, username)
        .await?
        .ok_or(AppError::NotFound)
}

/// Latest processed simulator command id.
#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "simulator",
    responses((status = 200, description = "Latest command id, -1 if none", body = LatestResponse))
)]
pub async fn latest(State(state): State<AppState>) -> Result<Json<LatestResponse>, AppError> {
    let latest = repository::get_latest(&state.db_pool).await?.unwrap_or(-1);
    Ok(Json(LatestResponse { latest }))
}

/// ## Register a new user
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "simulator",
    params(LatestParam),
    request_body = RegisterRequest,
    responses(
        (status = 204, description = "User created"),
        (status = 400, description = "Invalid data or username taken", body = ErrorResponse),
        (status = 403, description = "Missing simulator credentials", body = ErrorResponse),
    )
)]
#[debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    validate_in_order(&payload, RegisterRequest::FIELD_ORDER).map_err(AppError::BadRequest)?;

    if repository::get_user_id(&state.db_pool, &payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(repository::USERNAME_TAKEN.to_string()));
    }

    let pw_hash = hash_password(&payload.pwd, state.app_config.session.bcrypt_cost)?;
    let user_id =
        repository::create_user(&state.db_pool, &payload.username, &payload.email, &pw_hash)
            .await?;
    tracing::info!(user_id, username = %payload.username, "Registered user via API");

    Ok(StatusCode::NO_CONTENT)
}

/// Public timeline.
#[utoipa::path(
    get,
    path = "/api/msgs",
    tag = "simulator",
    params(LimitParam, LatestParam),
    responses((status = 200, description = "Newest messages first", body = [MessageDto]))
)]
pub async fn messages(
    State(state): State<AppState>,
    ApiQuery(limit): ApiQuery<LimitParam>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let entries = repository::public_timeline(&state.db_pool, limit.limit()).await?;
    Ok(Json(entries.into_iter().map(MessageDto::from).collect()))
}

/// Messages authored by one user.
#[utoipa::path(
    get,
    path = "/api/msgs/{username}",
    tag = "simulator",
    params(("username" = String, Path, description = "Author"), LimitParam, LatestParam),
    responses(
        (status = 200, description = "Newest messages first", body = [MessageDto]),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    )
)]
pub async fn user_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiQuery(limit): ApiQuery<LimitParam>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let user_id = require_user_id(&state, &username).await?;
    let entries = repository::user_timeline(&state.db_pool, user_id, limit.limit()).await?;
    Ok(Json(entries.into_iter().map(MessageDto::from).collect()))
}

/// Post a message as `username`.
#[utoipa::path(
    post,
    path = "/api/msgs/{username}",
    tag = "simulator",
    params(("username" = String, Path, description = "Author"), LatestParam),
    request_body = PostMessageRequest,
    responses(
        (status = 204, description = "Message stored"),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    )
)]
#[debug_handler]
pub async fn post_message(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(payload): ApiJson<PostMessageRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = require_user_id(&state, &username).await?;
    repository::create_message(
        &state.db_pool,
        user_id,
        &payload.content,
        Utc::now().timestamp(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Usernames followed by `username`.
#[utoipa::path(
    get,
    path = "/api/fllws/{username}",
    tag = "simulator",
    params(("username" = String, Path, description = "Follower"), LimitParam, LatestParam),
    responses(
        (status = 200, description = "Followed usernames", body = FollowsResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    )
)]
pub async fn follows(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiQuery(limit): ApiQuery<LimitParam>,
) -> Result<Json<FollowsResponse>, AppError> {
    let user_id = require_user_id(&state, &username).await?;
    let follows = repository::followed_usernames(&state.db_pool, user_id, limit.limit()).await?;
    Ok(Json(FollowsResponse { follows }))
}

/// Follow or unfollow on behalf of `username`.
#[utoipa::path(
    post,
    path = "/api/fllws/{username}",
    tag = "simulator",
    params(("username" = String, Path, description = "Follower"), LatestParam),
    request_body = FollowRequest,
    responses(
        (status = 204, description = "Relationship updated"),
        (status = 400, description = "Neither `follow` nor `unfollow` given", body = ErrorResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse),
    )
)]
#[debug_handler]
pub async fn update_follows(
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(payload): ApiJson<FollowRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = require_user_id(&state, &username).await?;

    match (payload.follow, payload.unfollow) {
        (Some(target), _) => {
            let target_id = require_user_id(&state, &target).await?;
            if target_id == user_id {
                return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
            }
            repository::follow(&state.db_pool, user_id, target_id).await?;
        }
        (None, Some(target)) => {
            let target_id = require_user_id(&state, &target).await?;
            repository::unfollow(&state.db_pool, user_id, target_id).await?;
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Missing 'follow' or 'unfollow' field".to_string(),
            ))
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Database connectivity check.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "simulator",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 500, description = "Database unreachable", body = ErrorResponse),
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    repository::ping(&state.db_pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
