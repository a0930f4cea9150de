//! Append-only ledger of package assignments and revocations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_changes")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub talent_id: Uuid,
  pub previous_code: Option<String>,
  /// `None` when the package was revoked
  pub new_code: Option<String>,
  /// Telegram id of the admin who made the change
  pub changed_by: Option<i64>,
  pub changed_at: DateTime,
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
