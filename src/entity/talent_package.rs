//! The package a talent currently holds. Reassignment overwrites the row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "talent_packages")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub talent_id: Uuid,
  pub package_code: String,
  pub purchased_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::talent::Entity",
    from = "Column::TalentId",
    to = "super::talent::Column::Id"
  )]
  Talent,
}

impl Related<super::talent::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Talent.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
