//! Create purchases table
//!
//! At most one purchase per reservation.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_reservations::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::UserId).string().not_null())
                    .col(ColumnDef::new(Purchases::EventId).string().not_null())
                    .col(
                        ColumnDef::new(Purchases::ReservationId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Purchases::TotalCents).big_integer().not_null())
                    .col(ColumnDef::new(Purchases::PaymentMethod).string().not_null())
                    .col(
                        ColumnDef::new(Purchases::PaymentStatus)
                            .string()
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(Purchases::TransactionId).string().not_null())
                    .col(ColumnDef::new(Purchases::PaymentDetails).json().not_null())
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_reservation")
                            .from(Purchases::Table, Purchases::ReservationId)
                            .to(Reservations::Table, Reservations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchases_user")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Purchases {
    Table,
    Id,
    UserId,
    EventId,
    ReservationId,
    TotalCents,
    PaymentMethod,
    PaymentStatus,
    TransactionId,
    PaymentDetails,
    CreatedAt,
}
