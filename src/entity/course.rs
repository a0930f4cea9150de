use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub level_id: Option<Uuid>,
  pub title: String,
  #[sea_orm(column_type = "Text", nullable)]
  pub description: Option<String>,
  pub category: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::training_level::Entity",
    from = "Column::LevelId",
    to = "super::training_level::Column::Id",
    on_delete = "SetNull"
  )]
  TrainingLevel,
  #[sea_orm(has_many = "super::course_package::Entity")]
  CoursePackages,
  #[sea_orm(has_many = "super::lesson::Entity")]
  Lessons,
}

impl Related<super::training_level::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::TrainingLevel.def()
  }
}

impl Related<super::course_package::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::CoursePackages.def()
  }
}

impl Related<super::lesson::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Lessons.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
