pub use sea_orm_migration::prelude::*;

mod m20261016_000001_create_tours;
mod m20261016_000002_create_users;
mod m20261016_000003_create_bookings;
mod m20261016_000004_create_payment_available;
mod m20261016_000005_create_payments;
mod m20261016_000006_create_files;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_create_tours::Migration),
            Box::new(m20261016_000002_create_users::Migration),
            Box::new(m20261016_000003_create_bookings::Migration),
            Box::new(m20261016_000004_create_payment_available::Migration),
            Box::new(m20261016_000005_create_payments::Migration),
            Box::new(m20261016_000006_create_files::Migration),
        ]
    }
}
