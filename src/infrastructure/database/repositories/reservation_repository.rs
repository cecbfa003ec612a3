//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use super::{corrupt, db_err};
use crate::domain::reservation::{Reservation, ReservationRepository, ReservationStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;
use crate::shared::errors::InfraError;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    let status = ReservationStatus::parse(&m.status)
        .ok_or_else(|| corrupt("reservation", "status", &m.status))?;
    let seat_ids: Vec<String> =
        serde_json::from_value(m.seat_ids).map_err(InfraError::Serialization)?;
    Ok(Reservation {
        id: m.id,
        user_id: m.user_id,
        event_id: m.event_id,
        seat_ids,
        status,
        created_at: m.created_at,
        expires_at: m.expires_at,
    })
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn save(&self, r: Reservation) -> DomainResult<()> {
        debug!(reservation_id = %r.id, "Saving reservation");

        let seat_ids = serde_json::to_value(&r.seat_ids).map_err(InfraError::Serialization)?;
        let model = reservation::ActiveModel {
            id: Set(r.id),
            user_id: Set(r.user_id),
            event_id: Set(r.event_id),
            seat_ids: Set(seat_ids),
            status: Set(r.status.as_str().to_string()),
            created_at: Set(r.created_at),
            expires_at: Set(r.expires_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn transition(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<bool> {
        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(to.as_str()))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected > 0 {
            debug!(reservation_id = %id, %from, %to, "Reservation transitioned");
            return Ok(true);
        }

        let exists = reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .is_some();
        if exists {
            Ok(false)
        } else {
            Err(DomainError::ReservationNotFound(id.to_string()))
        }
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .filter(reservation::Column::ExpiresAt.lt(now))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────
