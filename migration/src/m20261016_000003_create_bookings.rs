use sea_orm_migration::{prelude::*, schema::*};

use super::m20261016_000001_create_tours::Tour;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(pk_auto(Booking::Id))
                    .col(integer(Booking::TourId).not_null())
                    .col(string_len(Booking::FirstName, 100).not_null())
                    .col(string_len(Booking::LastName, 100).not_null())
                    .col(string_len(Booking::Gender, 20).not_null())
                    .col(date(Booking::BirthDate).not_null())
                    .col(string_len(Booking::Nationality, 100).not_null())
                    .col(string_len(Booking::Email, 255).not_null())
                    .col(string_len(Booking::PhoneCode, 10).not_null())
                    .col(string_len(Booking::PhoneNumber, 30).not_null())
                    .col(integer(Booking::Adults).not_null())
                    .col(integer(Booking::Children).not_null().default(0))
                    .col(date(Booking::StartDate).not_null())
                    .col(date(Booking::EndDate).not_null())
                    .col(string_len(Booking::FindUs, 100).not_null())
                    .col(text_null(Booking::Comments))
                    .col(boolean(Booking::TermsAccepted).not_null().default(false))
                    .col(big_integer(Booking::TotalPrice).not_null().default(0))
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_tour")
                            .from(Booking::Table, Booking::TourId)
                            .to(Tour::Table, Tour::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_email")
                    .table(Booking::Table)
                    .col(Booking::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    TourId,
    FirstName,
    LastName,
    Gender,
    BirthDate,
    Nationality,
    Email,
    PhoneCode,
    PhoneNumber,
    Adults,
    Children,
    StartDate,
    EndDate,
    FindUs,
    Comments,
    TermsAccepted,
    TotalPrice,
    Status,
    CreatedAt,
    UpdatedAt,
}
