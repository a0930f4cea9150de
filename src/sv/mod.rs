//! Business logic over the store.
//!
//! Services borrow a [`Db`] handle; every query they issue goes through
//! [`Db::run`], which bounds it with the configured backend timeout.

pub mod access;
pub mod catalog;
pub mod progress;
pub mod talent;

use std::future::Future;

pub use access::Access;
pub use catalog::Catalog;
pub use progress::Progress;
pub use talent::Talent;

use crate::prelude::*;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
pub struct Db<'a> {
  pub conn: &'a DatabaseConnection,
  pub timeout: Duration,
}

impl<'a> Db<'a> {
  #[cfg(test)]
  pub fn new(conn: &'a DatabaseConnection) -> Self {
    Self { conn, timeout: DEFAULT_TIMEOUT }
  }

  pub fn with_timeout(conn: &'a DatabaseConnection, timeout: Duration) -> Self {
    Self { conn, timeout }
  }

  /// Runs one backend call; an elapsed deadline becomes [`Error::Timeout`].
  pub async fn run<T, F>(&self, call: F) -> Result<T>
  where
    F: Future<Output = std::result::Result<T, sea_orm::DbErr>>,
  {
    match time::timeout(self.timeout, call).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(Error::Timeout(self.timeout)),
    }
  }
}
