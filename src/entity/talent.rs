use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talents")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub full_name: String,
  pub email: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_one = "super::talent_package::Entity")]
  TalentPackage,
  #[sea_orm(has_many = "super::package_change::Entity")]
  PackageChanges,
  #[sea_orm(has_many = "super::talent_course::Entity")]
  TalentCourses,
}

impl Related<super::talent_package::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::TalentPackage.def()
  }
}

impl Related<super::package_change::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::PackageChanges.def()
  }
}

impl Related<super::talent_course::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::TalentCourses.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
