//! SeaORM implementation of PurchaseRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::debug;

use super::{corrupt, db_err, from_cents, to_cents};
use crate::domain::purchase::{
    PaymentStatus, Purchase, PurchaseRepository, Ticket, TicketStatus,
};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{purchase, ticket};

pub struct SeaOrmPurchaseRepository {
    db: DatabaseConnection,
}

impl SeaOrmPurchaseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn purchase_to_domain(m: purchase::Model) -> DomainResult<Purchase> {
    let payment_status = match m.payment_status.as_str() {
        "completed" => PaymentStatus::Completed,
        other => return Err(corrupt("purchase", "payment_status", other)),
    };
    Ok(Purchase {
        id: m.id,
        user_id: m.user_id,
        event_id: m.event_id,
        reservation_id: m.reservation_id,
        total: from_cents(m.total_cents),
        payment_method: m.payment_method,
        payment_status,
        transaction_id: m.transaction_id,
        payment_details: m.payment_details,
        created_at: m.created_at,
    })
}

fn ticket_to_domain(m: ticket::Model) -> DomainResult<Ticket> {
    let status = match m.status.as_str() {
        "active" => TicketStatus::Active,
        other => return Err(corrupt("ticket", "status", other)),
    };
    Ok(Ticket {
        id: m.id,
        purchase_id: m.purchase_id,
        seat_id: m.seat_id,
        event_id: m.event_id,
        user_id: m.user_id,
        scan_code: m.scan_code,
        status,
        created_at: m.created_at,
    })
}

fn ticket_to_active(t: Ticket) -> ticket::ActiveModel {
    ticket::ActiveModel {
        id: Set(t.id),
        purchase_id: Set(t.purchase_id),
        seat_id: Set(t.seat_id),
        event_id: Set(t.event_id),
        user_id: Set(t.user_id),
        scan_code: Set(t.scan_code),
        status: Set(t.status.as_str().to_string()),
        created_at: Set(t.created_at),
    }
}

// ── PurchaseRepository impl ─────────────────────────────────────

#[async_trait]
impl PurchaseRepository for SeaOrmPurchaseRepository {
    async fn record(&self, p: Purchase, tickets: Vec<Ticket>) -> DomainResult<()> {
        debug!(purchase_id = %p.id, tickets = tickets.len(), "Recording purchase");

        let model = purchase::ActiveModel {
            id: Set(p.id),
            user_id: Set(p.user_id),
            event_id: Set(p.event_id),
            reservation_id: Set(p.reservation_id),
            total_cents: Set(to_cents(p.total)?),
            payment_method: Set(p.payment_method),
            payment_status: Set(p.payment_status.as_str().to_string()),
            transaction_id: Set(p.transaction_id),
            payment_details: Set(p.payment_details),
            created_at: Set(p.created_at),
        };

        let txn = self.db.begin().await.map_err(db_err)?;
        model.insert(&txn).await.map_err(db_err)?;
        if !tickets.is_empty() {
            ticket::Entity::insert_many(tickets.into_iter().map(ticket_to_active))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn remove(&self, purchase_id: &str) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        ticket::Entity::delete_many()
            .filter(ticket::Column::PurchaseId.eq(purchase_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        purchase::Entity::delete_by_id(purchase_id.to_string())
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)
    }

    async fn find_by_id(&self, purchase_id: &str) -> DomainResult<Option<Purchase>> {
        purchase::Entity::find_by_id(purchase_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(purchase_to_domain)
            .transpose()
    }

    async fn find_tickets_for_purchase(&self, purchase_id: &str) -> DomainResult<Vec<Ticket>> {
        ticket::Entity::find()
            .filter(ticket::Column::PurchaseId.eq(purchase_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(ticket_to_domain)
            .collect()
    }

    async fn find_tickets_by_user(&self, user_id: &str) -> DomainResult<Vec<Ticket>> {
        ticket::Entity::find()
            .filter(ticket::Column::UserId.eq(user_id))
            .order_by_desc(ticket::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(ticket_to_domain)
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────
