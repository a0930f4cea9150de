use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lesson_progress")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub talent_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub lesson_id: Uuid,
  pub course_id: Uuid,
  pub is_completed: bool,
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
    belongs_to = "super::lesson::Entity",
    from = "Column::LessonId",
    to = "super::lesson::Column::Id",
    on_delete = "Cascade"
  )]
  Lesson,
}

impl Related<super::talent::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Talent.def()
  }
}

impl Related<super::lesson::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lesson.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
