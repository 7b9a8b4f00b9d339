use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use dotenvy::dotenv;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub addr: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: String,
    /// Messages shown per timeline page.
    pub per_page: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub expires_hours: i64,
    pub bcrypt_cost: u32,
}

/// Basic-auth credentials the simulator must present on `/api` writes.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SimulatorConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub simulator: SimulatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web: WebConfig {
                addr: "127.0.0.1".to_string(),
                port: 8080,
                static_dir: "backend/static".to_string(),
                per_page: 30,
            },
            database: DatabaseConfig {
                url: "sqlite://minitwit.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            session: SessionConfig {
                secret: String::new(),
                expires_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            simulator: SimulatorConfig {
                username: "simulator".to_string(),
                password: "super_safe!".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Layers `Config.toml` and `APP_*` variables over the defaults, without
    /// checking the result. Tools that only touch the database start here.
    pub fn load() -> Result<Self, figment::Error> {
        dotenv().ok();

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("Config.toml")) // For non-sensitive defaults
            .merge(Env::prefixed("APP_").split("__")) // e.g., APP_DATABASE__URL
            .extract()
    }

    /// Configuration for the web server: `load` plus `validate`.
    pub fn from_env() -> Result<Self, figment::Error> {
        let config = Self::load()?;
        config.validate()?;

        tracing::info!(
            addr = %config.web.addr,
            port = config.web.port,
            database = %config.database.url,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Rejects settings that would only fail later, at request time.
    pub fn validate(&self) -> Result<(), figment::Error> {
        if self.session.secret.trim().is_empty() {
            return Err(figment::Error::from(
                "session.secret must be set (e.g. APP_SESSION__SECRET)".to_string(),
            ));
        }
        if self.session.expires_hours <= 0 {
            return Err(figment::Error::from(format!(
                "session.expires_hours must be positive, got {}",
                self.session.expires_hours
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.web.addr, self.web.port)
    }
}
