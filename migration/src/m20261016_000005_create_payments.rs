use sea_orm_migration::{prelude::*, schema::*};

use super::m20261016_000003_create_bookings::Booking;
use super::m20261016_000004_create_payment_available::PaymentAvailable;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(pk_auto(Payment::Id))
                    .col(integer(Payment::BookingId).not_null())
                    .col(integer(Payment::PaymentAvailableId).not_null())
                    .col(big_integer(Payment::Amount).not_null())
                    .col(string_len(Payment::Status, 16).not_null())
                    .col(string_len(Payment::ReferenceCode, 64).not_null().unique_key())
                    .col(string_len_null(Payment::ProofOfPayment, 500))
                    .col(timestamp_with_time_zone_null(Payment::PaidAt))
                    .col(timestamp_with_time_zone_null(Payment::CancelledAt))
                    .col(
                        timestamp_with_time_zone(Payment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Payment::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payment::Table, Payment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_payment_available")
                            .from(Payment::Table, Payment::PaymentAvailableId)
                            .to(PaymentAvailable::Table, PaymentAvailable::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one live pending attempt per (booking, amount). Partial
        // indexes have the same syntax on PostgreSQL and SQLite.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_payment_pending_booking_amount \
                 ON payment (booking_id, amount) WHERE status = 'PENDING'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payment {
    Table,
    Id,
    BookingId,
    PaymentAvailableId,
    Amount,
    Status,
    ReferenceCode,
    ProofOfPayment,
    PaidAt,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}
