//! minitwit-flag: hide offending messages from every timeline.
//!
//! `minitwit-flag -i` lists the newest visible messages with their ids;
//! `minitwit-flag 12 40` flags messages 12 and 40.

use anyhow::{bail, Context, Result};
use clap::Parser;
use minitwit::{config::AppConfig, db, moderation, repository};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "minitwit-flag", version, about = "Flag MiniTwit messages")]
struct Cli {
    /// List the newest visible messages instead of flagging
    #[arg(short = 'i', long)]
    list: bool,

    /// How many messages `--list` prints
    #[arg(long, default_value_t = common::DEFAULT_API_LIMIT)]
    limit: i64,

    /// Ids of the messages to flag
    message_ids: Vec<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if !cli.list && cli.message_ids.is_empty() {
        bail!("Nothing to do: pass message ids, or -i to list messages");
    }

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db_pool = db::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    if cli.list {
        let entries = repository::public_timeline(&db_pool, cli.limit.max(0)).await?;
        print!("{}", moderation::format_listing(&entries));
    }

    if !cli.message_ids.is_empty() {
        let unknown = moderation::flag_messages(&db_pool, &cli.message_ids).await?;
        if !unknown.is_empty() {
            bail!("Unknown message ids: {unknown:?}");
        }
    }

    Ok(())
}
