use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(TrainingLevels::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TrainingLevels::Id).uuid().not_null().primary_key(),
          )
          .col(
            ColumnDef::new(TrainingLevels::Code)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(TrainingLevels::Name).string().not_null())
          .col(ColumnDef::new(TrainingLevels::ShortName).string().null())
          .col(ColumnDef::new(TrainingLevels::Description).text().null())
          .col(
            ColumnDef::new(TrainingLevels::OrderIndex)
              .integer()
              .not_null()
              .default(0),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(TrainingLevels::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum TrainingLevels {
  Table,
  Id,
  Code,
  Name,
  ShortName,
  Description,
  OrderIndex,
}
