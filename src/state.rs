use std::{
  collections::HashSet,
  env,
  sync::atomic::{AtomicU64, Ordering},
  time::Instant,
};

use migration::{Migrator, MigratorTrait};
use teloxide::Bot;
use uuid::Uuid;

use crate::{
  package::Entitlement,
  prelude::*,
  sv::{self, Db},
};

#[derive(Debug, Clone)]
pub struct Config {
  pub port: u16,
  /// Upper bound for any single store call
  pub backend_timeout: Duration,
  /// How long a loaded entitlement may be served from cache
  pub entitlement_ttl: Duration,
  pub gc_interval: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      port: 3000,
      backend_timeout: sv::DEFAULT_TIMEOUT,
      entitlement_ttl: Duration::from_secs(300),
      gc_interval: Duration::from_secs(60),
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Ok(port) = env::var("PORT") {
      config.port = port.parse().context("Invalid PORT")?;
    }
    if let Ok(timeout) = env::var("BACKEND_TIMEOUT") {
      config.backend_timeout = humantime::parse_duration(&timeout)
        .context("Invalid BACKEND_TIMEOUT")?;
    }
    if let Ok(ttl) = env::var("ENTITLEMENT_TTL") {
      config.entitlement_ttl =
        humantime::parse_duration(&ttl).context("Invalid ENTITLEMENT_TTL")?;
    }

    Ok(config)
  }
}

/// Invalidation counters observed before a load. An entry is served only
/// while both still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
  epoch: u64,
  generation: u64,
}

#[derive(Debug, Clone)]
pub struct CachedEntitlement {
  pub entitlement: Entitlement,
  pub loaded_at: Instant,
  pub stamp: Stamp,
}

pub struct Services<'a> {
  pub talent: sv::Talent<'a>,
  pub catalog: sv::Catalog<'a>,
  pub access: sv::Access<'a>,
  pub progress: sv::Progress<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub bot: Bot,
  pub admins: HashSet<i64>,
  pub config: Config,
  entitlements: DashMap<Uuid, CachedEntitlement>,
  /// Bumped by `invalidate_all`
  epoch: AtomicU64,
  /// Bumped by `invalidate`
  generations: DashMap<Uuid, u64>,
}

impl AppState {
  pub async fn new(
    db_url: &str,
    bot_token: &str,
    admins: HashSet<i64>,
    config: Config,
  ) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db =
      Database::connect(db_url).await.context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self {
      db,
      bot: Bot::new(bot_token),
      admins,
      config,
      entitlements: DashMap::new(),
      epoch: AtomicU64::new(0),
      generations: DashMap::new(),
    })
  }

  pub fn sv(&self) -> Services<'_> {
    let db = Db::with_timeout(&self.db, self.config.backend_timeout);
    Services {
      talent: sv::Talent::new(db),
      catalog: sv::Catalog::new(db),
      access: sv::Access::new(db),
      progress: sv::Progress::new(db),
    }
  }

  pub fn is_admin(&self, user_id: i64) -> bool {
    self.admins.contains(&user_id)
  }

  fn stamp(&self, talent_id: Uuid) -> Stamp {
    Stamp {
      epoch: self.epoch.load(Ordering::Acquire),
      generation: self.generations.get(&talent_id).map_or(0, |g| *g),
    }
  }

  fn is_valid(&self, talent_id: Uuid, cached: &CachedEntitlement) -> bool {
    cached.loaded_at.elapsed() < self.config.entitlement_ttl
      && cached.stamp == self.stamp(talent_id)
  }

  /// Caches a loaded entitlement under the stamp taken before loading it.
  fn store(&self, talent_id: Uuid, entitlement: Entitlement, stamp: Stamp) {
    self.entitlements.insert(
      talent_id,
      CachedEntitlement { entitlement, loaded_at: Instant::now(), stamp },
    );
  }

  /// Entitlement for read paths, served from cache while fresh.
  pub async fn entitlement(&self, talent_id: Uuid) -> Result<Entitlement> {
    let stamp = self.stamp(talent_id);
    if let Some(cached) = self.entitlements.get(&talent_id)
      && cached.stamp == stamp
      && cached.loaded_at.elapsed() < self.config.entitlement_ttl
    {
      return Ok(cached.entitlement.clone());
    }

    let entitlement = self.sv().access.load(talent_id).await?;
    self.store(talent_id, entitlement.clone(), stamp);
    Ok(entitlement)
  }

  /// Must be called after any change to the talent's package.
  pub fn invalidate(&self, talent_id: Uuid) {
    *self.generations.entry(talent_id).or_default() += 1;
    self.entitlements.remove(&talent_id);
  }

  /// Must be called after any change to course gates.
  pub fn invalidate_all(&self) {
    self.epoch.fetch_add(1, Ordering::AcqRel);
    self.entitlements.clear();
  }

  /// Drops expired or superseded cache entries, returns how many were
  /// removed.
  pub fn gc_entitlements(&self) -> usize {
    let before = self.entitlements.len();
    self.entitlements.retain(|&talent_id, cached| self.is_valid(talent_id, cached));
    before - self.entitlements.len()
  }

  pub fn cached_entitlements(&self) -> usize {
    self.entitlements.len()
  }
}


#[cfg(test)]
mod tests {
  use super::{testing::app_state, *};
  use crate::package::PackageCode;

  #[tokio::test]
  async fn test_migrations_match_entities() {
    let app = app_state(Config::default()).await;
    let sv = app.sv();

    let talent = sv.talent.create("Bia".into(), Some("bia@example.com".into())).await.unwrap();
    sv.talent.assign_package(talent.id, PackageCode::Start, Some(1)).await.unwrap();

    let level = sv.catalog.create_level("new_face".into(), "New Face".into(), 1).await.unwrap();
    let course = sv.catalog.create_course(Some(level.id), "Posing".into(), None).await.unwrap();
    sv.catalog.gate(course.id, PackageCode::Start).await.unwrap();
    let lesson = sv.catalog.create_lesson(course.id, "Angles".into(), 0).await.unwrap();

    let completion =
      sv.progress.set_lesson_completed(talent.id, lesson.id, true).await.unwrap();
    assert_eq!(completion.percentage, 100);

    let entitlement = app.entitlement(talent.id).await.unwrap();
    let journey = sv.progress.journey(talent.id, &entitlement).await.unwrap();
    assert_eq!(journey[0].progress.status, crate::entity::ProgressStatus::Completed);
  }

  #[tokio::test]
  async fn test_migrations_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("hub.db").display());

    let app = AppState::new(&url, "0:test", HashSet::new(), Config::default())
      .await
      .unwrap();
    assert!(app.sv().catalog.levels().await.unwrap().is_empty());

    // second start must not fail on existing schema
    drop(app);
    AppState::new(&url, "0:test", HashSet::new(), Config::default())
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn test_cache_is_invalidated_on_package_change() {
    let app = app_state(Config::default()).await;
    let sv = app.sv();

    let talent = sv.talent.create("Caio".into(), None).await.unwrap();
    let course = sv.catalog.create_course(None, "Runway".into(), None).await.unwrap();
    sv.catalog.gate(course.id, PackageCode::Advanced).await.unwrap();

    sv.talent.assign_package(talent.id, PackageCode::Advanced, None).await.unwrap();
    assert!(app.entitlement(talent.id).await.unwrap().has_access(course.id));

    sv.talent.assign_package(talent.id, PackageCode::Start, None).await.unwrap();
    // still cached until invalidated
    assert!(app.entitlement(talent.id).await.unwrap().has_access(course.id));

    app.invalidate(talent.id);
    assert!(!app.entitlement(talent.id).await.unwrap().has_access(course.id));
  }

  #[tokio::test]
  async fn test_late_load_does_not_outlive_invalidate() {
    let app = app_state(Config::default()).await;
    let sv = app.sv();

    let talent = sv.talent.create("Duda".into(), None).await.unwrap();
    let course = sv.catalog.create_course(None, "Runway".into(), None).await.unwrap();
    sv.catalog.gate(course.id, PackageCode::Advanced).await.unwrap();
    sv.talent.assign_package(talent.id, PackageCode::Advanced, None).await.unwrap();

    // a read starts loading, the package changes before it stores
    let stamp = app.stamp(talent.id);
    let stale = sv.access.load(talent.id).await.unwrap();
    sv.talent.assign_package(talent.id, PackageCode::Start, None).await.unwrap();
    app.invalidate(talent.id);
    app.store(talent.id, stale, stamp);

    assert!(!app.entitlement(talent.id).await.unwrap().has_access(course.id));
    assert_eq!(app.gc_entitlements(), 0);
  }

  #[tokio::test]
  async fn test_late_load_does_not_outlive_gate_change() {
    let app = app_state(Config::default()).await;
    let sv = app.sv();

    let talent = sv.talent.create("Caio".into(), None).await.unwrap();
    sv.talent.assign_package(talent.id, PackageCode::Start, None).await.unwrap();
    let course = sv.catalog.create_course(None, "Posing".into(), None).await.unwrap();

    let stamp = app.stamp(talent.id);
    let stale = sv.access.load(talent.id).await.unwrap();
    sv.catalog.gate(course.id, PackageCode::Start).await.unwrap();
    app.invalidate_all();
    app.store(talent.id, stale, stamp);
    assert_eq!(app.cached_entitlements(), 1);

    // superseded entries are dropped by gc as well
    assert_eq!(app.gc_entitlements(), 1);
    assert!(app.entitlement(talent.id).await.unwrap().has_access(course.id));
  }

  #[tokio::test]
  async fn test_gc_drops_expired_entries() {
    let config = Config { entitlement_ttl: Duration::ZERO, ..Config::default() };
    let app = app_state(config).await;

    app.entitlement(Uuid::new_v4()).await.unwrap();
    app.entitlement(Uuid::new_v4()).await.unwrap();
    assert_eq!(app.cached_entitlements(), 2);

    assert_eq!(app.gc_entitlements(), 2);
    assert_eq!(app.cached_entitlements(), 0);
  }
}
