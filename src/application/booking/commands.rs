//! Reservation commands and outcomes

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Booking;

/// Request to reserve a vehicle
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservation {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub hourly: bool,
    pub pickup_location: String,
    /// Defaults to the pickup location
    pub dropoff_location: Option<String>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Partial edit of a pending booking; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReservation {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

impl UpdateReservation {
    /// Whether the patch moves the rental window
    pub fn changes_schedule(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }
}

/// Quote request for a prospective rental
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRequest {
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub hourly: bool,
    pub coupon_code: Option<String>,
}

/// Result of a cancellation, handed to the payment collaborator
#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub cancellation_fee: Decimal,
    /// Present when a refund was requested and a completed payment exists
    pub refund_amount: Option<Decimal>,
}
