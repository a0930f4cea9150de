pub mod cron;
pub mod server;
pub mod telegram;

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::state::AppState;

const RESTART_DELAY: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Runs every registered plugin in its own task and restarts it when it
/// stops.
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub async fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      let app = app.clone();

      tokio::spawn(async move {
        let name = plugin.name();
        info!("SYSTEM: Service `{name}` initialized");

        loop {
          let app = app.clone();
          let plugin = plugin.clone();

          let handle = tokio::spawn(async move { plugin.start(app).await });

          match handle.await {
            Ok(Ok(())) => {
              warn!("Service `{name}` stopped unexpectedly (Ok).");
            }
            Ok(Err(err)) => {
              error!("Service `{name}` crashed with error: {err:#}.");
            }
            Err(join_err) => {
              if join_err.is_cancelled() {
                info!("Service `{name}` shutdown.");
                break;
              } else {
                error!("Service `{name}` PANICKED!");
              }
            }
          }

          sleep(RESTART_DELAY).await;
          info!("SYSTEM: Restarting service `{name}`...");
        }
      });
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::state::{Config, testing::app_state};

  struct Failing(Arc<AtomicUsize>);

  #[async_trait::async_trait]
  impl Plugin for Failing {
    async fn start(&self, _: Arc<AppState>) -> anyhow::Result<()> {
      self.0.fetch_add(1, Ordering::SeqCst);
      anyhow::bail!("listener closed")
    }
  }

  #[tokio::test]
  async fn test_failed_plugin_is_restarted() {
    let app = Arc::new(app_state(Config::default()).await);
    let starts = Arc::new(AtomicUsize::new(0));

    tokio::time::pause();
    App::new().register(Failing(starts.clone())).run(app).await;
    sleep(Duration::from_secs(12)).await;

    // started at 0s, then after each restart delay
    assert_eq!(starts.load(Ordering::SeqCst), 3);
  }
}
