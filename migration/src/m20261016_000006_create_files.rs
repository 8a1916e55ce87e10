use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(File::Table)
                    .if_not_exists()
                    .col(uuid(File::Id).primary_key())
                    .col(string_len(File::Filename, 255).not_null().unique_key())
                    .col(string_len(File::OriginalName, 255).not_null())
                    .col(string_len(File::ContentType, 100).not_null())
                    .col(big_integer(File::Size).not_null())
                    .col(binary(File::Data).not_null())
                    .col(
                        timestamp_with_time_zone(File::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(File::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum File {
    Table,
    Id,
    Filename,
    OriginalName,
    ContentType,
    Size,
    Data,
    CreatedAt,
}
