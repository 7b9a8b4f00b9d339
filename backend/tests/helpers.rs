// backend/tests/helpers.rs
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt; // for .collect()
use minitwit::{
    config::{AppConfig, DatabaseConfig, SessionConfig, SimulatorConfig, WebConfig},
    db::{self, DbPool},
    web_server::{create_router, AppState},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::TcpListener;
use tower::ServiceExt; // for .oneshot()

/// `Basic` credentials for the default `simulator:super_safe!` pair.
pub const SIMULATOR_AUTH: &str = "Basic c2ltdWxhdG9yOnN1cGVyX3NhZmUh";

pub fn test_config() -> AppConfig {
    AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port: 0,
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
            per_page: 30,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: "test-secret".to_string(),
            expires_hours: 1,
            bcrypt_cost: 4,
        },
        simulator: SimulatorConfig {
            username: "simulator".to_string(),
            password: "super_safe!".to_string(),
        },
    }
}

pub async fn test_pool() -> DbPool {
    // Create connection options that enforce foreign keys
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    // A single connection keeps every query on the same in-memory database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    db_pool
}

/// Router over a fresh in-memory database, for `oneshot` tests.
pub async fn test_app() -> (Router, DbPool) {
    let db_pool = test_pool().await;
    let app_state = AppState::new(db_pool.clone(), test_config()).unwrap();
    (create_router(app_state), db_pool)
}

/// Spawn a test server and return the address and a reqwest client.
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, DbPool) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (app, db_pool) = test_app().await;

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client, db_pool)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

/// Encodes simple form fields; spaces become `+`, nothing else is escaped.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={}", v.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
}

/// Minimal browser stand-in: remembers cookies between `oneshot` calls.
#[derive(Default)]
pub struct Browser {
    cookies: HashMap<String, String>,
}

impl Browser {
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    fn absorb(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let expired = raw.to_ascii_lowercase().contains("max-age=0");
            if expired || value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn send(&mut self, app: &Router, request: Request<Body>) -> Response<Body> {
        let response = app.clone().oneshot(request).await.unwrap();
        self.absorb(&response);
        response
    }

    pub async fn get(&mut self, app: &Router, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, self.cookie_header())
            .body(Body::empty())
            .unwrap();
        self.send(app, request).await
    }

    pub async fn post_form(
        &mut self,
        app: &Router,
        uri: &str,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, self.cookie_header())
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.send(app, request).await
    }

    pub async fn register(&mut self, app: &Router, username: &str, password: &str) -> Response<Body> {
        let email = format!("{username}@example.com");
        self.post_form(
            app,
            "/register",
            &[
                ("username", username),
                ("email", &email),
                ("password", password),
                ("password2", password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, app: &Router, username: &str, password: &str) -> Response<Body> {
        self.post_form(
            app,
            "/login",
            &[("username", username), ("password", password)],
        )
        .await
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Response is not a redirect")
        .to_str()
        .unwrap()
}
