//! Create tickets table

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_seats::Seats;
use super::m20250101_000003_create_purchases::Purchases;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tickets::PurchaseId).string().not_null())
                    .col(ColumnDef::new(Tickets::SeatId).string().not_null())
                    .col(ColumnDef::new(Tickets::EventId).string().not_null())
                    .col(ColumnDef::new(Tickets::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Tickets::ScanCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_purchase")
                            .from(Tickets::Table, Tickets::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_seat")
                            .from(Tickets::Table, Tickets::SeatId)
                            .to(Seats::Table, Seats::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_user")
                    .table(Tickets::Table)
                    .col(Tickets::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Tickets {
    Table,
    Id,
    PurchaseId,
    SeatId,
    EventId,
    UserId,
    ScanCode,
    Status,
    CreatedAt,
}
