use sea_orm_migration::prelude::*;

use super::m20260301_000002_create_training_levels::TrainingLevels;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Courses::Table)
          .if_not_exists()
          .col(ColumnDef::new(Courses::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Courses::LevelId).uuid().null())
          .col(ColumnDef::new(Courses::Title).string().not_null())
          .col(ColumnDef::new(Courses::Description).text().null())
          .col(ColumnDef::new(Courses::Category).string().null())
          .col(
            ColumnDef::new(Courses::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Courses::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_courses_level")
              .from(Courses::Table, Courses::LevelId)
              .to(TrainingLevels::Table, TrainingLevels::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(CoursePackages::Table)
          .if_not_exists()
          .col(ColumnDef::new(CoursePackages::CourseId).uuid().not_null())
          .col(ColumnDef::new(CoursePackages::PackageCode).string().not_null())
          .col(ColumnDef::new(CoursePackages::CreatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(CoursePackages::CourseId)
              .col(CoursePackages::PackageCode),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_course_packages_course")
              .from(CoursePackages::Table, CoursePackages::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_course_packages_code")
          .table(CoursePackages::Table)
          .col(CoursePackages::PackageCode)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CoursePackages::Table).to_owned())
      .await?;
    manager.drop_table(Table::drop().table(Courses::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Courses {
  Table,
  Id,
  LevelId,
  Title,
  Description,
  Category,
  IsActive,
  CreatedAt,
}

#[derive(DeriveIden)]
pub enum CoursePackages {
  Table,
  CourseId,
  PackageCode,
  CreatedAt,
}
