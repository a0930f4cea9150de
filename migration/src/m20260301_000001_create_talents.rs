use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Talents::Table)
          .if_not_exists()
          .col(ColumnDef::new(Talents::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Talents::FullName).string().not_null())
          .col(ColumnDef::new(Talents::Email).string().null())
          .col(ColumnDef::new(Talents::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Talents::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Talents {
  Table,
  Id,
  FullName,
  Email,
  CreatedAt,
}
