//! Denormalized per-course progress, recomputed from `lesson_progress`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  PartialEq,
  Eq,
  EnumIter,
  DeriveActiveEnum,
  Serialize,
  Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
  #[default]
  #[sea_orm(string_value = "not_started")]
  NotStarted,
  #[sea_orm(string_value = "in_progress")]
  InProgress,
  #[sea_orm(string_value = "completed")]
  Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talent_courses")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub talent_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub course_id: Uuid,
  pub progress_percentage: i32,
  pub status: ProgressStatus,
  pub started_at: DateTime,
  pub completed_at: Option<DateTime>,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::talent::Entity",
    from = "Column::TalentId",
    to = "super::talent::Column::Id",
    on_delete = "Cascade"
  )]
  Talent,
  #[sea_orm(
    belongs_to = "super::course::Entity",
    from = "Column::CourseId",
    to = "super::course::Column::Id",
    on_delete = "Cascade"
  )]
  Course,
}

impl Related<super::talent::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Talent.def()
  }
}

impl Related<super::course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Course.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
