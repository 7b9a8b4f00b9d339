use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub mod utils;

/// Default number of rows returned by the simulator API when `no` is absent.
pub const DEFAULT_API_LIMIT: i64 = 100;

/// Body of `POST /api/register`.
#[derive(Serialize, Deserialize, Validate, ToSchema, Clone, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "You have to enter a username"))]
    pub username: String,
    #[validate(contains(pattern = "@", message = "You have to enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "You have to enter a password"))]
    pub pwd: String,
}

impl RegisterRequest {
    /// Fields in the order their errors are reported.
    pub const FIELD_ORDER: &'static [&'static str] = &["username", "email", "pwd"];
}

/// A single message as exposed by the simulator API.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct MessageDto {
    pub content: String,
    pub pub_date: DateTime<Utc>,
    pub user: String,
}

/// Body of `POST /api/msgs/{username}`.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct PostMessageRequest {
    pub content: String,
}

/// Body of `POST /api/fllws/{username}`. Exactly one key is expected.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, Default)]
pub struct FollowRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfollow: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct FollowsResponse {
    pub follows: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct LatestResponse {
    pub latest: i64,
}

/// Error body shared by every JSON error response.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub error_msg: String,
}
