//! Availability checker
//!
//! A vehicle is free over `[start, end)` when no booking that holds it
//! (PENDING, CONFIRMED, ACTIVE) overlaps that interval.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Booking, BookingFilter, DomainResult, RepositoryProvider};

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    /// Every conflicting booking, so callers can suggest alternatives
    pub conflicts: Vec<Booking>,
}

/// Bookings among `candidates` that hold their vehicle and overlap `[start, end)`.
pub fn find_conflicts<'a>(
    candidates: impl IntoIterator<Item = &'a Booking>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_booking_id: Option<Uuid>,
) -> Vec<&'a Booking> {
    candidates
        .into_iter()
        .filter(|b| b.status.holds_vehicle())
        .filter(|b| Some(b.id) != exclude_booking_id)
        .filter(|b| b.overlaps(start, end))
        .collect()
}

#[derive(Clone)]
pub struct AvailabilityChecker {
    repos: Arc<dyn RepositoryProvider>,
}

impl AvailabilityChecker {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn check(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_booking_id: Option<Uuid>,
    ) -> DomainResult<AvailabilityReport> {
        let filter = BookingFilter::for_vehicle(vehicle_id)
            .holding()
            .excluding(exclude_booking_id);
        let held = self.repos.bookings().find(&filter).await?;

        let conflicts: Vec<Booking> = find_conflicts(&held, start, end, exclude_booking_id)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            %vehicle_id,
            %start,
            %end,
            held = held.len(),
            conflicts = conflicts.len(),
            "Availability checked"
        );

        Ok(AvailabilityReport {
            available: conflicts.is_empty(),
            conflicts,
        })
    }
}
