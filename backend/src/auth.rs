use axum::{
    debug_handler,
    extract::{Form, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::SessionConfig;
use crate::error::{validate_in_order, AppError};
use crate::extractors::AuthUser;
use crate::flash;
use crate::repository;
use crate::templates::{render, LoginTemplate, RegisterTemplate};
use crate::web_server::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user id)
    pub exp: u64,      // Expiration time
    pub nonce: String, // Makes every issued token unique
}

// --- Form payloads ---

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "You have to enter a username"))]
    pub username: String,
    #[validate(contains(pattern = "@", message = "You have to enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "You have to enter a password"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "The two passwords do not match"))]
    pub password2: String,
}

impl RegisterForm {
    const FIELD_ORDER: &'static [&'static str] = &["username", "email", "password", "password2"];
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// --- Password & token helpers ---

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(hash(password, cost)?)
}

/// A stored hash that bcrypt cannot parse counts as a mismatch.
pub fn verify_password(password: &str, pw_hash: &str) -> bool {
    verify(password, pw_hash).unwrap_or_else(|e| {
        tracing::warn!("Password verification failed: {}", e);
        false
    })
}

/// Signs a session token for `user_id`.
pub fn issue_session_token(user_id: i64, config: &SessionConfig) -> Result<String, AppError> {
    // Generate a random nonce for the token to ensure uniqueness
    let nonce: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let exp = Duration::try_hours(config.expires_hours)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .and_then(|expires_at| u64::try_from(expires_at.timestamp()).ok())
        .ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Session lifetime of {} hours is out of range",
                config.expires_hours
            ))
        })?;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        nonce,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_ref()),
    )?;
    Ok(token)
}

/// Verifies signature and expiry, returning the user id the token was issued for.
pub fn decode_session_token(token: &str, config: &SessionConfig) -> Result<i64, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &validation,
    )?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::InternalServerError("Invalid user ID in token".to_string()))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// --- Middleware for cookie sessions ---

/// Resolves the session cookie into an `AuthUser` extension. Missing,
/// expired or forged cookies simply leave the request anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match decode_session_token(cookie.value(), &state.app_config.session) {
            Ok(user_id) => {
                if let Some(user) = repository::get_user_by_id(&state.db_pool, user_id).await? {
                    request.extensions_mut().insert(AuthUser {
                        id: user.user_id,
                        username: user.username,
                        email: user.email,
                    });
                }
            }
            Err(e) => tracing::debug!("Ignoring invalid session cookie: {}", e),
        }
    }

    Ok(next.run(request).await)
}

// --- Page handlers ---

pub async fn register_page(user: Option<AuthUser>, jar: CookieJar) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, flashes) = flash::take(jar);
    let page = render(&RegisterTemplate {
        title: "Sign Up".to_string(),
        user: None,
        flashes,
        error: None,
        username: String::new(),
        email: String::new(),
    })?;
    Ok((jar, page).into_response())
}

#[debug_handler]
pub async fn register(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let outcome = match validate_in_order(&form, RegisterForm::FIELD_ORDER) {
        Err(message) => Err(message),
        Ok(()) => {
            if repository::get_user_id(&state.db_pool, &form.username)
                .await?
                .is_some()
            {
                Err(repository::USERNAME_TAKEN.to_string())
            } else {
                let pw_hash = hash_password(&form.password, state.app_config.session.bcrypt_cost)?;
                match repository::create_user(&state.db_pool, &form.username, &form.email, &pw_hash)
                    .await
                {
                    Ok(user_id) => Ok(user_id),
                    Err(AppError::BadRequest(message)) => Err(message),
                    Err(e) => return Err(e),
                }
            }
        }
    };

    match outcome {
        Ok(user_id) => {
            tracing::info!(user_id, username = %form.username, "Registered new user");
            let jar = flash::push(jar, "You were successfully registered and can login now");
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(error) => {
            let (jar, flashes) = flash::take(jar);
            let page = render(&RegisterTemplate {
                title: "Sign Up".to_string(),
                user: None,
                flashes,
                error: Some(error),
                username: form.username,
                email: form.email,
            })?;
            Ok((jar, page).into_response())
        }
    }
}

pub async fn login_page(user: Option<AuthUser>, jar: CookieJar) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, flashes) = flash::take(jar);
    let page = render(&LoginTemplate {
        title: "Sign In".to_string(),
        user: None,
        flashes,
        error: None,
        username: String::new(),
    })?;
    Ok((jar, page).into_response())
}

#[debug_handler]
pub async fn login(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let error = match repository::get_user_by_name(&state.db_pool, &form.username).await? {
        None => "Invalid username",
        Some(user) if !verify_password(&form.password, &user.pw_hash) => "Invalid password",
        Some(user) => {
            tracing::info!(user_id = user.user_id, "User logged in");
            let token = issue_session_token(user.user_id, &state.app_config.session)?;
            let jar = flash::push(jar.add(session_cookie(token)), "You were logged in");
            return Ok((jar, Redirect::to("/")).into_response());
        }
    };

    let (jar, flashes) = flash::take(jar);
    let page = render(&LoginTemplate {
        title: "Sign In".to_string(),
        user: None,
        flashes,
        error: Some(error.to_string()),
        username: form.username,
    })?;
    Ok((jar, page).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let jar = flash::push(jar, "You were logged out");
    (jar, Redirect::to("/public"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> SessionConfig {
        SessionConfig {
            secret: secret.to_string(),
            expires_hours: 1,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn session_token_round_trip() {
        let config = config("test-secret");
        let token = issue_session_token(42, &config).unwrap();
        assert_eq!(decode_session_token(&token, &config).unwrap(), 42);
    }

    #[test]
    fn tokens_are_unique() {
        let config = config("test-secret");
        let a = issue_session_token(1, &config).unwrap();
        let b = issue_session_token(1, &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_session_token(42, &config("one")).unwrap();
        assert!(matches!(
            decode_session_token(&token, &config("two")),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut expired = config("test-secret");
        expired.expires_hours = -1;
        let token = issue_session_token(42, &expired).unwrap();
        assert!(decode_session_token(&token, &expired).is_err());
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let mut config = config("test-secret");
        for hours in [i64::MAX, i64::MIN, -1_000_000] {
            config.expires_hours = hours;
            assert!(matches!(
                issue_session_token(42, &config),
                Err(AppError::InternalServerError(_))
            ));
        }
    }

    #[test]
    fn password_hash_and_verify() {
        let pw_hash = hash_password("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &pw_hash));
        assert!(!verify_password("hunter3", &pw_hash));
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn register_form_reports_errors_in_order() {
        let form = RegisterForm {
            username: String::new(),
            email: "nope".into(),
            password: String::new(),
            password2: "x".into(),
        };
        assert_eq!(
            validate_in_order(&form, RegisterForm::FIELD_ORDER).unwrap_err(),
            "You have to enter a username"
        );

        let form = RegisterForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "a".into(),
            password2: "b".into(),
        };
        assert_eq!(
            validate_in_order(&form, RegisterForm::FIELD_ORDER).unwrap_err(),
            "The two passwords do not match"
        );
    }
}
