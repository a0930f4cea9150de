use sea_orm_migration::prelude::*;

use super::m20260301_000003_create_courses::Courses;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(CourseLessons::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CourseLessons::Id).uuid().not_null().primary_key(),
          )
          .col(ColumnDef::new(CourseLessons::CourseId).uuid().not_null())
          .col(ColumnDef::new(CourseLessons::Title).string().not_null())
          .col(ColumnDef::new(CourseLessons::Description).text().null())
          .col(ColumnDef::new(CourseLessons::VideoUrl).string().null())
          .col(
            ColumnDef::new(CourseLessons::OrderIndex)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(CourseLessons::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(CourseLessons::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_course_lessons_course")
              .from(CourseLessons::Table, CourseLessons::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_course_lessons_course")
          .table(CourseLessons::Table)
          .col(CourseLessons::CourseId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CourseLessons::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CourseLessons {
  Table,
  Id,
  CourseId,
  Title,
  Description,
  VideoUrl,
  OrderIndex,
  IsActive,
  CreatedAt,
}
