//! Booking domain entity

use chrono::{DateTime, Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::BookingStatus;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`.
/// Touching endpoints do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Priced components of a candidate or stored reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_price: Decimal,
    pub total_days: i64,
    pub total_hours: Option<i64>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    /// Manual discount, reserved; always zero today
    pub discount: Decimal,
    pub coupon_discount: Option<Decimal>,
    pub coupon_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub price_per_day: Decimal,
    pub price_per_hour: Option<Decimal>,
}

impl PricingBreakdown {
    pub fn is_hourly(&self) -> bool {
        self.total_hours.is_some_and(|h| h > 0)
    }
}

/// Vehicle reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    /// Effective interval start (inclusive)
    pub start_date: DateTime<Utc>,
    /// Effective interval end (exclusive)
    pub end_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,

    // Rates snapshotted from the vehicle at booking time
    pub price_per_day: Decimal,
    pub price_per_hour: Option<Decimal>,
    pub total_days: i64,
    pub total_hours: i64,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discount: Decimal,
    pub coupon_discount: Decimal,
    pub total_amount: Decimal,
    pub coupon_id: Option<Uuid>,

    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub cancellation_fee: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to persist a new PENDING booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

impl Booking {
    pub fn pending(draft: NewBooking, pricing: &PricingBreakdown, now: DateTime<Utc>) -> Self {
        let mut booking = Self {
            id: Uuid::new_v4(),
            vehicle_id: draft.vehicle_id,
            user_id: draft.user_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            pickup_location: draft.pickup_location,
            dropoff_location: draft.dropoff_location,
            price_per_day: Decimal::ZERO,
            price_per_hour: None,
            total_days: 0,
            total_hours: 0,
            subtotal: Decimal::ZERO,
            taxes: Decimal::ZERO,
            fees: Decimal::ZERO,
            discount: Decimal::ZERO,
            coupon_discount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            coupon_id: None,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            cancellation_fee: None,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };
        booking.apply_pricing(pricing);
        booking
    }

    /// Copy a price breakdown onto the booking, including the rate snapshot.
    pub fn apply_pricing(&mut self, pricing: &PricingBreakdown) {
        self.price_per_day = pricing.price_per_day;
        self.price_per_hour = pricing.price_per_hour;
        self.total_hours = pricing.total_hours.unwrap_or(0);
        self.total_days = if self.total_hours > 0 { 0 } else { pricing.total_days };
        self.subtotal = pricing.subtotal;
        self.taxes = pricing.taxes;
        self.fees = pricing.fees;
        self.discount = pricing.discount;
        self.coupon_discount = pricing.coupon_discount.unwrap_or(Decimal::ZERO);
        self.total_amount = pricing.total_amount;
        if pricing.coupon_id.is_some() {
            self.coupon_id = pricing.coupon_id;
        }
    }

    pub fn is_hourly(&self) -> bool {
        self.total_hours > 0
    }

    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.start_date, self.end_date, start, end)
    }

    /// Time left until pickup; negative once the booking has started.
    pub fn lead_time(&self, now: DateTime<Utc>) -> Duration {
        self.start_date - now
    }

    /// Only PENDING bookings that have not started may be edited.
    pub fn is_modifiable(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Pending && self.start_date > now
    }

    pub fn is_cancellable(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
            && self.start_date > now
    }

    /// Move to `status` without consulting the transition table; callers
    /// validate with [`super::status::ensure_transition`] first.
    pub fn set_status(&mut self, status: BookingStatus, reason: Option<String>, at: DateTime<Utc>) {
        self.status = status;
        if matches!(status, BookingStatus::Cancelled | BookingStatus::Rejected) {
            self.cancellation_reason = reason;
        }
        self.updated_at = at;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 10, 0, 0).unwrap()
    }

    pub fn booking_between(
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: BookingStatus,
    ) -> Booking {
        let pricing = PricingBreakdown {
            base_price: Decimal::new(100, 0),
            total_days: 1,
            total_hours: None,
            subtotal: Decimal::new(100, 0),
            taxes: Decimal::new(10, 0),
            fees: Decimal::new(5, 0),
            discount: Decimal::ZERO,
            coupon_discount: None,
            coupon_id: None,
            total_amount: Decimal::new(115, 0),
            price_per_day: Decimal::new(100, 0),
            price_per_hour: None,
        };
        let mut booking = Booking::pending(
            NewBooking {
                vehicle_id,
                user_id: Uuid::new_v4(),
                start_date: start,
                end_date: end,
                start_time: None,
                end_time: None,
                pickup_location: "Main depot".into(),
                dropoff_location: None,
                notes: None,
            },
            &pricing,
            start - Duration::days(7),
        );
        booking.status = status;
        booking
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let t = t0();
        let h = Duration::hours(1);
        assert!(!intervals_overlap(t - h, t, t, t + h));
        assert!(!intervals_overlap(t, t + h, t - h, t));
        assert!(intervals_overlap(t - h, t + h, t, t + h));
        assert!(intervals_overlap(t, t + h * 3, t + h, t + h * 2));
    }

    #[test]
    fn modifiable_only_while_pending_and_future() {
        let vehicle = Uuid::new_v4();
        let mut b = booking_between(vehicle, t0(), t0() + Duration::days(2), BookingStatus::Pending);
        assert!(b.is_modifiable(t0() - Duration::hours(1)));
        assert!(!b.is_modifiable(t0()));

        b.status = BookingStatus::Confirmed;
        assert!(!b.is_modifiable(t0() - Duration::hours(1)));
        assert!(b.is_cancellable(t0() - Duration::hours(1)));

        b.status = BookingStatus::Active;
        assert!(!b.is_cancellable(t0() - Duration::hours(1)));
    }

    #[test]
    fn cancellation_reason_only_recorded_on_terminal_rejections() {
        let mut b = booking_between(Uuid::new_v4(), t0(), t0() + Duration::days(1), BookingStatus::Pending);
        b.set_status(BookingStatus::Confirmed, Some("ignored".into()), t0());
        assert_eq!(b.cancellation_reason, None);

        b.set_status(BookingStatus::Cancelled, Some("plans changed".into()), t0());
        assert_eq!(b.cancellation_reason.as_deref(), Some("plans changed"));
        assert_eq!(b.updated_at, t0());
    }

    #[test]
    fn hourly_pricing_clears_day_basis() {
        let mut b = booking_between(Uuid::new_v4(), t0(), t0() + Duration::hours(3), BookingStatus::Pending);
        let pricing = PricingBreakdown {
            base_price: Decimal::new(30, 0),
            total_days: 1,
            total_hours: Some(3),
            subtotal: Decimal::new(30, 0),
            taxes: Decimal::new(3, 0),
            fees: Decimal::new(15, 1),
            discount: Decimal::ZERO,
            coupon_discount: None,
            coupon_id: None,
            total_amount: Decimal::new(345, 1),
            price_per_day: Decimal::new(100, 0),
            price_per_hour: Some(Decimal::new(10, 0)),
        };
        b.apply_pricing(&pricing);
        assert!(b.is_hourly());
        assert_eq!(b.total_days, 0);
        assert_eq!(b.total_hours, 3);
    }
}
