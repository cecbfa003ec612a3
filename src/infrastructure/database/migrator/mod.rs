//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_seats;
mod m20250101_000002_create_reservations;
mod m20250101_000003_create_purchases;
mod m20250101_000004_create_tickets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_seats::Migration),
            Box::new(m20250101_000002_create_reservations::Migration),
            Box::new(m20250101_000003_create_purchases::Migration),
            Box::new(m20250101_000004_create_tickets::Migration),
        ]
    }
}
