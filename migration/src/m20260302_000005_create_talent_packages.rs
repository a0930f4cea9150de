use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_talents::Talents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(TalentPackages::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TalentPackages::TalentId)
              .uuid()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(TalentPackages::PackageCode).string().not_null())
          .col(ColumnDef::new(TalentPackages::PurchasedAt).date_time().not_null())
          .col(ColumnDef::new(TalentPackages::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_talent_packages_talent")
              .from(TalentPackages::Table, TalentPackages::TalentId)
              .to(Talents::Table, Talents::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // append-only, rows are never updated
    manager
      .create_table(
        Table::create()
          .table(PackageChanges::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PackageChanges::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(PackageChanges::TalentId).uuid().not_null())
          .col(ColumnDef::new(PackageChanges::PreviousCode).string().null())
          .col(ColumnDef::new(PackageChanges::NewCode).string().null())
          .col(ColumnDef::new(PackageChanges::ChangedBy).big_integer().null())
          .col(ColumnDef::new(PackageChanges::ChangedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_package_changes_talent")
              .from(PackageChanges::Table, PackageChanges::TalentId)
              .to(Talents::Table, Talents::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_package_changes_talent")
          .table(PackageChanges::Table)
          .col(PackageChanges::TalentId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PackageChanges::Table).to_owned())
      .await?;
    manager
      .drop_table(Table::drop().table(TalentPackages::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum TalentPackages {
  Table,
  TalentId,
  PackageCode,
  PurchasedAt,
  UpdatedAt,
}

#[derive(DeriveIden)]
pub enum PackageChanges {
  Table,
  Id,
  TalentId,
  PreviousCode,
  NewCode,
  ChangedBy,
  ChangedAt,
}
