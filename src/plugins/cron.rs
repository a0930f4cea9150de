//! Periodic housekeeping.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{prelude::*, state::AppState};

/// Evicts stale entitlements from the read cache.
pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(app.config.gc_interval);
    loop {
      interval.tick().await;
      let evicted = app.gc_entitlements();
      if evicted > 0 {
        debug!(
          "Evicted {evicted} cached entitlements, {} left",
          app.cached_entitlements()
        );
      }
    }
  }
}
