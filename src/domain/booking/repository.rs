//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::Booking;
use super::status::BookingStatus;
use crate::domain::vehicle::VehicleStatus;
use crate::domain::DomainResult;

/// Typed query over bookings. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub vehicle_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Empty means any status
    pub statuses: Vec<BookingStatus>,
    /// Half-open window the booking must overlap
    pub overlapping: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub exclude_id: Option<Uuid>,
}

impl BookingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_vehicle(vehicle_id: Uuid) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Self::default()
        }
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Restrict to statuses that hold the vehicle.
    pub fn holding(mut self) -> Self {
        self.statuses = BookingStatus::HOLDING.to_vec();
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = BookingStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn overlapping(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.overlapping = Some((start, end));
        self
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if self.vehicle_id.is_some_and(|v| v != booking.vehicle_id) {
            return false;
        }
        if self.user_id.is_some_and(|u| u != booking.user_id) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&booking.status) {
            return false;
        }
        if let Some((start, end)) = self.overlapping {
            if !booking.overlaps(start, end) {
                return false;
            }
        }
        if self.exclude_id.is_some_and(|id| id == booking.id) {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>>;

    /// Bookings matching `filter`, ordered by start date
    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>>;

    /// Persist a new reservation as one unit of work:
    /// re-verify that no holding booking overlaps it, insert it, mark the
    /// vehicle RENTED and, when a coupon is attached, increment its usage.
    /// Nothing is written if any step fails.
    async fn insert_reservation(&self, booking: &Booking) -> DomainResult<()>;

    /// Persist edits to an existing booking. When the booking holds its
    /// vehicle, overlap with other holding bookings is re-verified.
    async fn update(&self, booking: &Booking) -> DomainResult<()>;

    /// Persist a status change together with an optional vehicle status
    /// change in one unit of work.
    async fn save_transition(
        &self,
        booking: &Booking,
        vehicle_status: Option<VehicleStatus>,
    ) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::model::fixtures::*;
    use chrono::Duration;

    #[test]
    fn filter_combines_constraints() {
        let vehicle = Uuid::new_v4();
        let b = booking_between(vehicle, t0(), t0() + Duration::days(1), BookingStatus::Confirmed);

        assert!(BookingFilter::for_vehicle(vehicle).holding().matches(&b));
        assert!(!BookingFilter::for_vehicle(Uuid::new_v4()).matches(&b));
        assert!(!BookingFilter::for_vehicle(vehicle)
            .with_statuses([BookingStatus::Pending])
            .matches(&b));
        assert!(!BookingFilter::for_vehicle(vehicle).excluding(Some(b.id)).matches(&b));
        assert!(BookingFilter::new()
            .overlapping(t0() + Duration::hours(23), t0() + Duration::days(3))
            .matches(&b));
        assert!(!BookingFilter::new()
            .overlapping(t0() + Duration::days(1), t0() + Duration::days(3))
            .matches(&b));
        assert!(BookingFilter::for_user(b.user_id).matches(&b));
    }
}
