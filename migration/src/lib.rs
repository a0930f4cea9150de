pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_talents;
mod m20260301_000002_create_training_levels;
mod m20260301_000003_create_courses;
mod m20260301_000004_create_course_lessons;
mod m20260302_000005_create_talent_packages;
mod m20260302_000006_create_progress;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_talents::Migration),
      Box::new(m20260301_000002_create_training_levels::Migration),
      Box::new(m20260301_000003_create_courses::Migration),
      Box::new(m20260301_000004_create_course_lessons::Migration),
      Box::new(m20260302_000005_create_talent_packages::Migration),
      Box::new(m20260302_000006_create_progress::Migration),
    ]
  }
}
