use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentAvailable::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentAvailable::Id))
                    .col(string_len(PaymentAvailable::Name, 100).not_null())
                    .col(string_len(PaymentAvailable::AccountNumber, 100).not_null())
                    .col(string_len(PaymentAvailable::AccountHolder, 200).not_null())
                    .col(string_len_null(PaymentAvailable::Image, 500))
                    .col(text_null(PaymentAvailable::Description))
                    .col(string_len(PaymentAvailable::MethodType, 16).not_null())
                    .col(boolean(PaymentAvailable::Active).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(PaymentAvailable::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(PaymentAvailable::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentAvailable::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PaymentAvailable {
    Table,
    Id,
    Name,
    AccountNumber,
    AccountHolder,
    Image,
    Description,
    MethodType,
    Active,
    CreatedAt,
    UpdatedAt,
}
