use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_talents::Talents,
  m20260301_000003_create_courses::Courses,
  m20260301_000004_create_course_lessons::CourseLessons,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LessonProgress::Table)
          .if_not_exists()
          .col(ColumnDef::new(LessonProgress::TalentId).uuid().not_null())
          .col(ColumnDef::new(LessonProgress::LessonId).uuid().not_null())
          .col(ColumnDef::new(LessonProgress::CourseId).uuid().not_null())
          .col(
            ColumnDef::new(LessonProgress::IsCompleted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(LessonProgress::CompletedAt).date_time().null())
          .col(ColumnDef::new(LessonProgress::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(LessonProgress::TalentId)
              .col(LessonProgress::LessonId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_progress_talent")
              .from(LessonProgress::Table, LessonProgress::TalentId)
              .to(Talents::Table, Talents::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_progress_lesson")
              .from(LessonProgress::Table, LessonProgress::LessonId)
              .to(CourseLessons::Table, CourseLessons::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_lesson_progress_course")
          .table(LessonProgress::Table)
          .col(LessonProgress::TalentId)
          .col(LessonProgress::CourseId)
          .to_owned(),
      )
      .await?;

    manager
      .create_table(
        Table::create()
          .table(TalentCourses::Table)
          .if_not_exists()
          .col(ColumnDef::new(TalentCourses::TalentId).uuid().not_null())
          .col(ColumnDef::new(TalentCourses::CourseId).uuid().not_null())
          .col(
            ColumnDef::new(TalentCourses::ProgressPercentage)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(TalentCourses::Status)
              .string()
              .not_null()
              .default("not_started"),
          )
          .col(ColumnDef::new(TalentCourses::StartedAt).date_time().not_null())
          .col(ColumnDef::new(TalentCourses::CompletedAt).date_time().null())
          .col(ColumnDef::new(TalentCourses::UpdatedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(TalentCourses::TalentId)
              .col(TalentCourses::CourseId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_talent_courses_talent")
              .from(TalentCourses::Table, TalentCourses::TalentId)
              .to(Talents::Table, Talents::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_talent_courses_course")
              .from(TalentCourses::Table, TalentCourses::CourseId)
              .to(Courses::Table, Courses::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(TalentCourses::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(LessonProgress::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum LessonProgress {
  Table,
  TalentId,
  LessonId,
  CourseId,
  IsCompleted,
  CompletedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TalentCourses {
  Table,
  TalentId,
  CourseId,
  ProgressPercentage,
  Status,
  StartedAt,
  CompletedAt,
  UpdatedAt,
}
