//! TalentHub - package-gated training courses for talents
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for the talent-facing HTTP API with rate limiting
//! - Teloxide for the admin Telegram bot
//! - Tokio for async runtime

mod entity;
mod error;
mod package;
mod plugins;
mod prelude;
mod progress;
mod state;
mod sv;
mod utils;

use std::{collections::HashSet, env, sync::Arc};

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, cron, server, telegram},
  prelude::*,
  state::{AppState, Config},
};

fn parse_admins(input: &str) -> anyhow::Result<HashSet<i64>> {
  input
    .split(',')
    .map(str::trim)
    .filter(|id| !id.is_empty())
    .map(|id| id.parse().with_context(|| format!("Invalid admin id `{id}`")))
    .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "talenthub=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let admins = parse_admins(&env::var("ADMIN_IDS").context("ADMIN_IDS not set")?)?;
  if admins.is_empty() {
    warn!("No admins configured, the bot will refuse every command");
  }

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:talenthub.db?mode=rwc".into());
  let token = env::var("TELOXIDE_TOKEN").context("TELOXIDE_TOKEN not set")?;
  let config = Config::from_env()?;

  info!("Starting TalentHub v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(&db_url, &token, admins, config).await?);

  App::new()
    .register(server::Plugin)
    .register(telegram::Plugin)
    .register(cron::Plugin)
    .run(app)
    .await;

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down");

  Ok(())
}
