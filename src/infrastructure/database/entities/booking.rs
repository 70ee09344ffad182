//! Booking entity
//!
//! Money columns hold minor units (cents). `start_time`/`end_time` are
//! `HH:MM:SS` strings kept for hourly rentals.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub vehicle_id: String,
    pub user_id: String,

    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,

    #[sea_orm(nullable)]
    pub start_time: Option<String>,
    #[sea_orm(nullable)]
    pub end_time: Option<String>,

    pub pickup_location: String,
    #[sea_orm(nullable)]
    pub dropoff_location: Option<String>,

    // Pricing snapshot
    pub price_per_day: i64,
    #[sea_orm(nullable)]
    pub price_per_hour: Option<i64>,
    pub total_days: i64,
    pub total_hours: i64,
    pub subtotal: i64,
    pub taxes: i64,
    pub fees: i64,
    pub discount: i64,
    pub coupon_discount: i64,
    pub total_amount: i64,
    #[sea_orm(nullable)]
    pub coupon_id: Option<String>,

    /// PENDING, CONFIRMED, ACTIVE, COMPLETED, CANCELLED, REJECTED
    pub status: String,
    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,
    #[sea_orm(nullable)]
    pub cancellation_fee: Option<i64>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
