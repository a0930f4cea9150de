use serde::Serialize;
use uuid::Uuid;

use super::Db;
use crate::{
  entity::{package_change, talent, talent_package},
  package::PackageCode,
  prelude::*,
};

/// How many talents hold each tier.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStats {
  pub start: u64,
  pub advanced: u64,
  pub premium: u64,
  pub none: u64,
  /// Rows whose stored code is outside the catalog
  pub unknown: u64,
}

pub struct Talent<'a> {
  db: Db<'a>,
}

impl<'a> Talent<'a> {
  pub fn new(db: Db<'a>) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    full_name: String,
    email: Option<String>,
  ) -> Result<talent::Model> {
    let talent = talent::ActiveModel {
      id: Set(Uuid::new_v4()),
      full_name: Set(full_name),
      email: Set(email),
      created_at: Set(Utc::now().naive_utc()),
    };

    self.db.run(talent.insert(self.db.conn)).await
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<talent::Model>> {
    self.db.run(talent::Entity::find_by_id(id).one(self.db.conn)).await
  }

  pub async fn all_with_packages(
    &self,
  ) -> Result<Vec<(talent::Model, Option<talent_package::Model>)>> {
    self
      .db
      .run(
        talent::Entity::find()
          .order_by_asc(talent::Column::FullName)
          .find_also_related(talent_package::Entity)
          .all(self.db.conn),
      )
      .await
  }

  pub async fn package_of(
    &self,
    talent_id: Uuid,
  ) -> Result<Option<talent_package::Model>> {
    self
      .db
      .run(talent_package::Entity::find_by_id(talent_id).one(self.db.conn))
      .await
  }

  /// Gives the talent `code`, replacing whatever they held before. The
  /// change is recorded in the ledger in the same transaction.
  pub async fn assign_package(
    &self,
    talent_id: Uuid,
    code: PackageCode,
    admin: Option<i64>,
  ) -> Result<talent_package::Model> {
    let txn = self.db.run(self.db.conn.begin()).await?;

    self
      .db
      .run(talent::Entity::find_by_id(talent_id).one(&txn))
      .await?
      .ok_or(Error::TalentNotFound)?;

    let now = Utc::now().naive_utc();
    let existing = self
      .db
      .run(talent_package::Entity::find_by_id(talent_id).one(&txn))
      .await?;
    let previous = existing.as_ref().map(|row| row.package_code.clone());

    let model = match existing {
      Some(row) => {
        let update = talent_package::ActiveModel {
          package_code: Set(code.as_str().to_string()),
          purchased_at: Set(now),
          updated_at: Set(now),
          ..row.into()
        };
        self.db.run(update.update(&txn)).await?
      }
      None => {
        let insert = talent_package::ActiveModel {
          talent_id: Set(talent_id),
          package_code: Set(code.as_str().to_string()),
          purchased_at: Set(now),
          updated_at: Set(now),
        };
        self.db.run(insert.insert(&txn)).await?
      }
    };

    self
      .db
      .run(
        Self::ledger_entry(talent_id, previous, Some(code), admin, now)
          .insert(&txn),
      )
      .await?;

    self.db.run(txn.commit()).await?;
    info!("Talent {talent_id} now holds package `{code}`");
    Ok(model)
  }

  /// Removes the talent's package. Returns `false` if they had none.
  pub async fn revoke_package(
    &self,
    talent_id: Uuid,
    admin: Option<i64>,
  ) -> Result<bool> {
    let txn = self.db.run(self.db.conn.begin()).await?;

    let Some(existing) = self
      .db
      .run(talent_package::Entity::find_by_id(talent_id).one(&txn))
      .await?
    else {
      return Ok(false);
    };

    let now = Utc::now().naive_utc();
    let previous = Some(existing.package_code.clone());

    self
      .db
      .run(talent_package::Entity::delete_by_id(talent_id).exec(&txn))
      .await?;
    self
      .db
      .run(Self::ledger_entry(talent_id, previous, None, admin, now).insert(&txn))
      .await?;

    self.db.run(txn.commit()).await?;
    info!("Package revoked for talent {talent_id}");
    Ok(true)
  }

  fn ledger_entry(
    talent_id: Uuid,
    previous: Option<String>,
    new: Option<PackageCode>,
    admin: Option<i64>,
    at: DateTime,
  ) -> package_change::ActiveModel {
    package_change::ActiveModel {
      id: NotSet,
      talent_id: Set(talent_id),
      previous_code: Set(previous),
      new_code: Set(new.map(|code| code.as_str().to_string())),
      changed_by: Set(admin),
      changed_at: Set(at),
    }
  }

  /// Ledger entries for a talent, newest first.
  pub async fn history(
    &self,
    talent_id: Uuid,
  ) -> Result<Vec<package_change::Model>> {
    self
      .db
      .run(
        package_change::Entity::find()
          .filter(package_change::Column::TalentId.eq(talent_id))
          .order_by_desc(package_change::Column::Id)
          .all(self.db.conn),
      )
      .await
  }

  pub async fn package_stats(&self) -> Result<PackageStats> {
    let (talents, codes) = futures::try_join!(
      self.db.run(talent::Entity::find().count(self.db.conn)),
      self.db.run(
        talent_package::Entity::find()
          .select_only()
          .column(talent_package::Column::PackageCode)
          .into_tuple::<String>()
          .all(self.db.conn),
      ),
    )?;

    let mut stats = PackageStats::default();
    for code in &codes {
      match code.parse::<PackageCode>() {
        Ok(PackageCode::Start) => stats.start += 1,
        Ok(PackageCode::Advanced) => stats.advanced += 1,
        Ok(PackageCode::Premium) => stats.premium += 1,
        Err(_) => stats.unknown += 1,
      }
    }
    stats.none = talents.saturating_sub(codes.len() as u64);

    Ok(stats)
  }
}
