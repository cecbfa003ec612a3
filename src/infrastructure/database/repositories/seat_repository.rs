//! SeaORM implementation of SeatRepository
//!
//! Every state change is a single `UPDATE ... WHERE status = <expected>`
//! inside a transaction; a short row count means another writer got there
//! first and the whole change is rolled back.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::debug;

use super::{corrupt, db_err, from_cents, to_cents};
use crate::domain::seat::{Seat, SeatRepository, SeatStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::seat;

/// SQLite bounds the number of bind parameters per statement
const INSERT_CHUNK: usize = 100;

pub struct SeaOrmSeatRepository {
    db: DatabaseConnection,
}

impl SeaOrmSeatRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: seat::Model) -> DomainResult<Seat> {
    let status =
        SeatStatus::parse(&m.status).ok_or_else(|| corrupt("seat", "status", &m.status))?;
    Ok(Seat {
        id: m.id,
        event_id: m.event_id,
        section: m.section,
        row: m.row,
        number: u32::try_from(m.number).unwrap_or_default(),
        price: from_cents(m.price_cents),
        status,
        reservation_id: m.reservation_id,
        created_at: m.created_at,
    })
}

fn domain_to_active(s: Seat) -> DomainResult<seat::ActiveModel> {
    let number = i32::try_from(s.number)
        .map_err(|_| DomainError::Validation(format!("seat number {} out of range", s.number)))?;
    Ok(seat::ActiveModel {
        id: Set(s.id),
        event_id: Set(s.event_id),
        section: Set(s.section),
        row: Set(s.row),
        number: Set(number),
        price_cents: Set(to_cents(s.price)?),
        status: Set(s.status.as_str().to_string()),
        reservation_id: Set(s.reservation_id),
        created_at: Set(s.created_at),
    })
}

/// Ids from `seat_ids` that are not in the expected state, in request order.
async fn not_matching(
    txn: &DatabaseTransaction,
    seat_ids: &[String],
    expected: impl Fn(&seat::Model) -> bool,
) -> DomainResult<Vec<String>> {
    let rows: HashMap<String, seat::Model> = seat::Entity::find()
        .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
        .all(txn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect();

    Ok(seat_ids
        .iter()
        .filter(|id| !rows.get(id.as_str()).is_some_and(&expected))
        .cloned()
        .collect())
}

// ── SeatRepository impl ─────────────────────────────────────────

#[async_trait]
impl SeatRepository for SeaOrmSeatRepository {
    async fn find_by_event(&self, event_id: &str) -> DomainResult<Vec<Seat>> {
        let models = seat::Entity::find()
            .filter(seat::Column::EventId.eq(event_id))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let mut seats = models
            .into_iter()
            .map(model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;
        seats.sort_by(|a, b| a.cmp_position(b));
        Ok(seats)
    }

    async fn find_by_ids(&self, seat_ids: &[String]) -> DomainResult<Vec<Seat>> {
        if seat_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut by_id: HashMap<String, Seat> = seat::Entity::find()
            .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| model_to_domain(m).map(|s| (s.id.clone(), s)))
            .collect::<DomainResult<_>>()?;
        Ok(seat_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn count_by_event(&self, event_id: &str) -> DomainResult<u64> {
        seat::Entity::find()
            .filter(seat::Column::EventId.eq(event_id))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn insert_many(&self, seats: Vec<Seat>) -> DomainResult<()> {
        if seats.is_empty() {
            return Ok(());
        }
        debug!(count = seats.len(), "Inserting seats");

        let models = seats
            .into_iter()
            .map(domain_to_active)
            .collect::<DomainResult<Vec<_>>>()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        for chunk in models.chunks(INSERT_CHUNK) {
            seat::Entity::insert_many(chunk.to_vec())
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn claim(
        &self,
        event_id: &str,
        seat_ids: &[String],
        reservation_id: &str,
    ) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let foreign = not_matching(&txn, seat_ids, |m| m.event_id == event_id).await?;
        if !foreign.is_empty() {
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::Validation(format!(
                "seats {} do not belong to event {}",
                foreign.join(", "),
                event_id
            )));
        }

        let result = seat::Entity::update_many()
            .col_expr(seat::Column::Status, Expr::value(SeatStatus::Reserved.as_str()))
            .col_expr(
                seat::Column::ReservationId,
                Expr::value(Some(reservation_id.to_string())),
            )
            .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
            .filter(seat::Column::EventId.eq(event_id))
            .filter(seat::Column::Status.eq(SeatStatus::Available.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected != seat_ids.len() as u64 {
            txn.rollback().await.map_err(db_err)?;
            // Rolled back, so this reads the state that made the claim fail
            let conflicts = seat::Entity::find()
                .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
                .filter(seat::Column::Status.ne(SeatStatus::Available.as_str()))
                .all(&self.db)
                .await
                .map_err(db_err)?;
            let taken: Vec<&str> = conflicts.iter().map(|m| m.id.as_str()).collect();
            let seat_ids = seat_ids
                .iter()
                .filter(|id| taken.contains(&id.as_str()))
                .cloned()
                .collect();
            return Err(DomainError::SeatUnavailable { seat_ids });
        }

        txn.commit().await.map_err(db_err)
    }

    async fn release(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64> {
        let result = seat::Entity::update_many()
            .col_expr(seat::Column::Status, Expr::value(SeatStatus::Available.as_str()))
            .col_expr(seat::Column::ReservationId, Expr::value(Option::<String>::None))
            .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
            .filter(seat::Column::Status.eq(SeatStatus::Reserved.as_str()))
            .filter(seat::Column::ReservationId.eq(reservation_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn sell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = seat::Entity::update_many()
            .col_expr(seat::Column::Status, Expr::value(SeatStatus::Sold.as_str()))
            .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
            .filter(seat::Column::Status.eq(SeatStatus::Reserved.as_str()))
            .filter(seat::Column::ReservationId.eq(reservation_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected != seat_ids.len() as u64 {
            txn.rollback().await.map_err(db_err)?;
            let txn = self.db.begin().await.map_err(db_err)?;
            let not_held = not_matching(&txn, seat_ids, |m| {
                m.status == SeatStatus::Reserved.as_str()
                    && m.reservation_id.as_deref() == Some(reservation_id)
            })
            .await?;
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::SeatUnavailable { seat_ids: not_held });
        }

        txn.commit().await.map_err(db_err)
    }

    async fn unsell(&self, seat_ids: &[String], reservation_id: &str) -> DomainResult<u64> {
        let result = seat::Entity::update_many()
            .col_expr(seat::Column::Status, Expr::value(SeatStatus::Available.as_str()))
            .col_expr(seat::Column::ReservationId, Expr::value(Option::<String>::None))
            .filter(seat::Column::Id.is_in(seat_ids.to_vec()))
            .filter(seat::Column::Status.eq(SeatStatus::Sold.as_str()))
            .filter(seat::Column::ReservationId.eq(reservation_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}

// ── Tests ──────────────────────────────────────────────────────
