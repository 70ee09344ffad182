//! In-memory storage implementation for development and testing
//!
//! Reads go straight to the `DashMap`s. Compound writes (reservation insert,
//! edits, status transitions) run under one async write lock so the
//! overlap re-check and the writes that follow it are a single step.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::PaymentGateway;
use crate::domain::{
    Booking, BookingFilter, BookingRepository, Coupon, CouponRepository, DomainError,
    DomainResult, RepositoryProvider, Vehicle, VehicleRepository, VehicleStatus,
};

#[derive(Default)]
struct MemoryState {
    bookings: DashMap<Uuid, Booking>,
    vehicles: DashMap<Uuid, Vehicle>,
    coupons: DashMap<Uuid, Coupon>,
    write_lock: Mutex<()>,
}

impl MemoryState {
    fn find_overlapping(&self, booking: &Booking) -> Option<Uuid> {
        let filter = BookingFilter::for_vehicle(booking.vehicle_id)
            .holding()
            .overlapping(booking.start_date, booking.end_date)
            .excluding(Some(booking.id));
        self.bookings
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| *entry.key())
    }

    fn ensure_no_overlap(&self, booking: &Booking) -> DomainResult<()> {
        if let Some(existing) = self.find_overlapping(booking) {
            debug!(booking_id = %booking.id, %existing, "Overlap detected on write");
            return Err(DomainError::Conflict(format!(
                "Vehicle {} is already booked for the selected dates",
                booking.vehicle_id
            )));
        }
        Ok(())
    }

    fn set_vehicle_status(&self, id: Uuid, status: VehicleStatus) -> DomainResult<()> {
        let mut vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Vehicle", id))?;
        vehicle.status = status;
        vehicle.updated_at = chrono::Utc::now();
        Ok(())
    }
}

pub struct InMemoryBookingRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        Ok(self.state.bookings.get(&id).map(|b| b.clone()))
    }

    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .state
            .bookings
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|b| (b.start_date, b.created_at));
        Ok(found)
    }

    async fn insert_reservation(&self, booking: &Booking) -> DomainResult<()> {
        let state = &self.state;
        let _write = state.write_lock.lock().await;

        if state.bookings.contains_key(&booking.id) {
            return Err(DomainError::Conflict(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        if !state.vehicles.contains_key(&booking.vehicle_id) {
            return Err(DomainError::not_found("Vehicle", booking.vehicle_id));
        }
        state.ensure_no_overlap(booking)?;

        // Validate the coupon before anything is written
        if let Some(coupon_id) = booking.coupon_id {
            let coupon = state
                .coupons
                .get(&coupon_id)
                .ok_or_else(|| DomainError::not_found("Coupon", coupon_id))?;
            if !coupon.has_remaining_uses() {
                return Err(DomainError::Conflict(format!(
                    "Coupon {} has reached its usage limit",
                    coupon.code
                )));
            }
        }

        state.bookings.insert(booking.id, booking.clone());
        state.set_vehicle_status(booking.vehicle_id, VehicleStatus::Rented)?;
        if let Some(coupon_id) = booking.coupon_id {
            if let Some(mut coupon) = state.coupons.get_mut(&coupon_id) {
                coupon.used_count += 1;
            }
        }
        Ok(())
    }

    async fn update(&self, booking: &Booking) -> DomainResult<()> {
        let state = &self.state;
        let _write = state.write_lock.lock().await;

        if !state.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("Booking", booking.id));
        }
        if booking.status.holds_vehicle() {
            state.ensure_no_overlap(booking)?;
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn save_transition(
        &self,
        booking: &Booking,
        vehicle_status: Option<VehicleStatus>,
    ) -> DomainResult<()> {
        let state = &self.state;
        let _write = state.write_lock.lock().await;

        if !state.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("Booking", booking.id));
        }
        if let Some(status) = vehicle_status {
            state.set_vehicle_status(booking.vehicle_id, status)?;
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }
}

pub struct InMemoryVehicleRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Vehicle>> {
        Ok(self.state.vehicles.get(&id).map(|v| v.clone()))
    }

    async fn save(&self, vehicle: Vehicle) -> DomainResult<()> {
        self.state.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: VehicleStatus) -> DomainResult<()> {
        let _write = self.state.write_lock.lock().await;
        self.state.set_vehicle_status(id, status)
    }
}

pub struct InMemoryCouponRepository {
    state: Arc<MemoryState>,
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Coupon>> {
        Ok(self
            .state
            .coupons
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Coupon>> {
        Ok(self.state.coupons.get(&id).map(|c| c.clone()))
    }

    async fn save(&self, coupon: Coupon) -> DomainResult<()> {
        self.state.coupons.insert(coupon.id, coupon);
        Ok(())
    }
}

/// [`RepositoryProvider`] backed by process memory
pub struct InMemoryRepositoryProvider {
    state: Arc<MemoryState>,
    bookings: InMemoryBookingRepository,
    vehicles: InMemoryVehicleRepository,
    coupons: InMemoryCouponRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let state = Arc::new(MemoryState::default());
        Self {
            bookings: InMemoryBookingRepository {
                state: state.clone(),
            },
            vehicles: InMemoryVehicleRepository {
                state: state.clone(),
            },
            coupons: InMemoryCouponRepository {
                state: state.clone(),
            },
            state,
        }
    }

    /// Store a booking as-is, skipping overlap and vehicle checks.
    /// Used to seed fixtures.
    pub fn insert_booking_unchecked(&self, booking: Booking) {
        self.state.bookings.insert(booking.id, booking);
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn coupons(&self) -> &dyn CouponRepository {
        &self.coupons
    }
}

/// Payment lookup backed by a set of paid booking ids
#[derive(Default)]
pub struct InMemoryPaymentGateway {
    completed: DashMap<Uuid, ()>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&self, booking_id: Uuid) {
        self.completed.insert(booking_id, ());
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn has_completed_payment(&self, booking_id: Uuid) -> DomainResult<bool> {
        Ok(self.completed.contains_key(&booking_id))
    }
}
