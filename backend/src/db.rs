#[cfg(not(any(feature = "db-sqlite", feature = "db-postgres")))]
compile_error!("Either the `db-sqlite` or `db-postgres` feature must be enabled.");

#[cfg(all(feature = "db-sqlite", feature = "db-postgres"))]
compile_error!("Only one of `db-sqlite` or `db-postgres` can be enabled.");

#[cfg(feature = "db-postgres")]
pub use sqlx::postgres::{PgPool as DbPool, PgPoolOptions as DbPoolOptions};

#[cfg(feature = "db-sqlite")]
pub use sqlx::sqlite::{SqlitePool as DbPool, SqlitePoolOptions as DbPoolOptions};

use crate::config::DatabaseConfig;

/// Opens the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    tracing::info!(max_connections = config.max_connections, "Connecting to database");
    DbPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// Applies the embedded migrations for the enabled backend.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");

    #[cfg(feature = "db-sqlite")]
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;

    #[cfg(feature = "db-postgres")]
    sqlx::migrate!("./migrations/postgres").run(pool).await?;

    tracing::info!("Migrations complete.");
    Ok(())
}
