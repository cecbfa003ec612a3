//! Seat entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub event_id: String,
    pub section: String,
    pub row: String,
    pub number: i32,

    /// Price in minor currency units
    pub price_cents: i64,

    /// Seat status: available, reserved, sold
    pub status: String,

    #[sea_orm(nullable)]
    pub reservation_id: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
