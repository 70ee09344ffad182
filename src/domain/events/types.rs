//! Booking notification events
//!
//! Defines all event types that can be broadcast to subscribers
//! (confirmation, cancellation and reminder mailers, dashboards).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BookingCreated(BookingCreatedEvent),
    BookingUpdated(BookingUpdatedEvent),
    BookingStatusChanged(BookingStatusChangedEvent),
    BookingCancelled(BookingCancelledEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingCreated(_) => "booking_created",
            Event::BookingUpdated(_) => "booking_updated",
            Event::BookingStatusChanged(_) => "booking_status_changed",
            Event::BookingCancelled(_) => "booking_cancelled",
        }
    }

    pub fn booking_id(&self) -> Uuid {
        match self {
            Event::BookingCreated(e) => e.booking_id,
            Event::BookingUpdated(e) => e.booking_id,
            Event::BookingStatusChanged(e) => e.booking_id,
            Event::BookingCancelled(e) => e.booking_id,
        }
    }

    pub fn created(booking: &Booking) -> Self {
        Event::BookingCreated(BookingCreatedEvent {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            user_id: booking.user_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_amount: booking.total_amount,
            timestamp: booking.created_at,
        })
    }

    pub fn updated(booking: &Booking) -> Self {
        Event::BookingUpdated(BookingUpdatedEvent {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_amount: booking.total_amount,
            timestamp: booking.updated_at,
        })
    }

    pub fn status_changed(booking: &Booking, old_status: BookingStatus) -> Self {
        Event::BookingStatusChanged(BookingStatusChangedEvent {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            user_id: booking.user_id,
            old_status,
            new_status: booking.status,
            reason: booking.cancellation_reason.clone(),
            timestamp: booking.updated_at,
        })
    }

    pub fn cancelled(booking: &Booking, refund_amount: Option<Decimal>) -> Self {
        Event::BookingCancelled(BookingCancelledEvent {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            user_id: booking.user_id,
            reason: booking.cancellation_reason.clone(),
            cancellation_fee: booking.cancellation_fee.unwrap_or(Decimal::ZERO),
            refund_amount,
            timestamp: booking.updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUpdatedEvent {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub old_status: BookingStatus,
    pub new_status: BookingStatus,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub reason: Option<String>,
    pub cancellation_fee: Decimal,
    /// Set when a refund is due; executed by the payment collaborator
    pub refund_amount: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
