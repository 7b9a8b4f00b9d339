use std::convert::Infallible;

use crate::error::AppError;
use axum::{
    extract::{FromRequest, FromRequestParts, OptionalFromRequestParts, Query},
    http::request::Parts,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// The logged-in user, placed in request extensions by the session middleware.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent means either no session cookie or one that didn't check out.
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

/// `Json` whose rejections come back as the API's `{"status","error_msg"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` with the same error body as [`ApiJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `?no=` on the simulator's list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParam {
    /// Maximum number of rows to return (default 100).
    pub no: Option<i64>,
}

impl LimitParam {
    pub fn limit(&self) -> i64 {
        self.no.unwrap_or(common::DEFAULT_API_LIMIT).max(0)
    }
}

/// `?latest=` carried by every simulator request. Kept as a string so a
/// malformed value is ignored instead of failing the request.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestParam {
    /// Id of the simulator command this request belongs to.
    pub latest: Option<String>,
}

impl LatestParam {
    pub fn value(&self) -> Option<i64> {
        self.latest.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(LimitParam { no: None }.limit(), 100);
        assert_eq!(LimitParam { no: Some(5) }.limit(), 5);
        assert_eq!(LimitParam { no: Some(-3) }.limit(), 0);
    }

    #[test]
    fn latest_ignores_garbage() {
        let parse = |raw: &str| LatestParam { latest: Some(raw.to_string()) }.value();
        assert_eq!(parse("42"), Some(42));
        assert_eq!(parse("abc"), None);
        assert_eq!(LatestParam { latest: None }.value(), None);
    }
}
