//! Create seats table
//!
//! One row per seat of an event's map. Status and holder are changed only by
//! conditional updates on (id, status, reservation_id).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Seats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Seats::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Seats::EventId).string().not_null())
                    .col(ColumnDef::new(Seats::Section).string().not_null())
                    .col(ColumnDef::new(Seats::Row).string().not_null())
                    .col(ColumnDef::new(Seats::Number).integer().not_null())
                    .col(ColumnDef::new(Seats::PriceCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Seats::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Seats::ReservationId).string())
                    .col(
                        ColumnDef::new(Seats::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seats_position")
                    .table(Seats::Table)
                    .col(Seats::EventId)
                    .col(Seats::Section)
                    .col(Seats::Row)
                    .col(Seats::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seats_reservation")
                    .table(Seats::Table)
                    .col(Seats::ReservationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Seats::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Seats {
    Table,
    Id,
    EventId,
    Section,
    Row,
    Number,
    PriceCents,
    Status,
    ReservationId,
    CreatedAt,
}
