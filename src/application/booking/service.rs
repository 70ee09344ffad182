//! Reservation orchestrator
//!
//! Composes availability, pricing, coupons, cancellation fees and the
//! status state machine into the reservation use cases.
//!
//! Lock order is always booking, then vehicle. Creation and updates hold
//! the vehicle lock across the availability check and the write; the store
//! additionally re-verifies overlap inside its own transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::availability::{AvailabilityChecker, AvailabilityReport};
use super::cancellation::{cancellation_fee, refund_amount};
use super::commands::{CancellationOutcome, CreateReservation, PriceRequest, UpdateReservation};
use super::coupons::CouponValidator;
use super::pricing::{PricingCalculator, PricingPolicy};
use super::window::RentalWindow;
use crate::application::ports::{SharedNotifier, SharedPaymentGateway};
use crate::domain::booking::{ensure_transition, NewBooking};
use crate::domain::events::Event;
use crate::domain::{
    Booking, BookingFilter, BookingStatus, DomainError, DomainResult, PricingBreakdown, Principal,
    RepositoryProvider, Role, Vehicle, VehicleStatus,
};
use crate::shared::{KeyedLocks, SharedClock};

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    availability: AvailabilityChecker,
    pricing: PricingCalculator,
    notifier: SharedNotifier,
    payments: SharedPaymentGateway,
    clock: SharedClock,
    vehicle_locks: KeyedLocks<Uuid>,
    booking_locks: KeyedLocks<Uuid>,
}

impl ReservationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: SharedNotifier,
        payments: SharedPaymentGateway,
        clock: SharedClock,
        policy: PricingPolicy,
    ) -> Self {
        let coupons = CouponValidator::new(repos.clone(), clock.clone());
        Self {
            availability: AvailabilityChecker::new(repos.clone()),
            pricing: PricingCalculator::new(coupons, policy),
            repos,
            notifier,
            payments,
            clock,
            vehicle_locks: KeyedLocks::new(),
            booking_locks: KeyedLocks::new(),
        }
    }

    /// Reserve a vehicle. The booking starts PENDING and the vehicle is
    /// marked RENTED in the same unit of work.
    pub async fn create(
        &self,
        request: CreateReservation,
        principal: &Principal,
    ) -> DomainResult<Booking> {
        let now = self.clock.now();
        let pickup_location = required_location(&request.pickup_location)?;

        let window = RentalWindow::resolve(
            request.start_date,
            request.end_date,
            request.start_time,
            request.end_time,
            request.hourly,
        )?;
        window.ensure_future(now)?;

        let _vehicle_guard = self.vehicle_locks.acquire(&request.vehicle_id).await;

        let vehicle = self.load_vehicle(request.vehicle_id).await?;

        // Conflicts first: a competing overlapping booking is a conflict even
        // though it has also flipped the vehicle to RENTED.
        let report = self
            .availability
            .check(vehicle.id, window.start, window.end, None)
            .await?;
        if !report.available {
            warn!(
                vehicle_id = %vehicle.id,
                conflicts = report.conflicts.len(),
                "Reservation rejected: overlapping booking"
            );
            return Err(DomainError::Conflict(
                "Vehicle is already booked for the selected dates".to_string(),
            ));
        }

        if !vehicle.is_available() {
            return Err(DomainError::Unavailable(vehicle.id.to_string()));
        }

        let pricing = self
            .pricing
            .price(&vehicle, &window, request.coupon_code.as_deref())
            .await?;

        let dropoff_location = request
            .dropoff_location
            .filter(|loc| !loc.trim().is_empty())
            .unwrap_or_else(|| pickup_location.clone());

        let booking = Booking::pending(
            NewBooking {
                vehicle_id: vehicle.id,
                user_id: principal.user_id,
                start_date: window.start,
                end_date: window.end,
                start_time: window.start_time,
                end_time: window.end_time,
                pickup_location,
                dropoff_location: Some(dropoff_location),
                notes: request.notes,
            },
            &pricing,
            now,
        );

        self.repos.bookings().insert_reservation(&booking).await?;

        info!(
            booking_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            user_id = %booking.user_id,
            total = %booking.total_amount,
            coupon_id = ?booking.coupon_id,
            "Booking created"
        );

        self.dispatch(Event::created(&booking));
        Ok(booking)
    }

    /// Edit a PENDING booking that has not started. Moving the window
    /// re-checks availability and re-prices from the rate snapshot; an
    /// applied coupon is recomputed against the new subtotal.
    pub async fn update(
        &self,
        booking_id: Uuid,
        patch: UpdateReservation,
        principal: &Principal,
    ) -> DomainResult<Booking> {
        let now = self.clock.now();
        let _booking_guard = self.booking_locks.acquire(&booking_id).await;

        let mut booking = self.load_booking(booking_id).await?;
        ensure_manager(principal, &booking)?;

        if !booking.is_modifiable(now) {
            return Err(DomainError::Conflict(format!(
                "Booking {} can only be modified while pending and before it starts",
                booking.id
            )));
        }

        if !booking.is_hourly() && (patch.start_time.is_some() || patch.end_time.is_some()) {
            return Err(DomainError::InvalidInput(
                "Pickup and return times apply to hourly bookings only".to_string(),
            ));
        }

        let _vehicle_guard = self.vehicle_locks.acquire(&booking.vehicle_id).await;

        if patch.changes_schedule() {
            let start_time = patch.start_time.or(booking.start_time);
            let end_time = patch.end_time.or(booking.end_time);
            let window = RentalWindow::resolve(
                patch.start_date.unwrap_or(booking.start_date),
                patch.end_date.unwrap_or(booking.end_date),
                start_time,
                end_time,
                booking.is_hourly(),
            )?;
            window.ensure_future(now)?;

            let report = self
                .availability
                .check(booking.vehicle_id, window.start, window.end, Some(booking.id))
                .await?;
            if !report.available {
                return Err(DomainError::Conflict(
                    "Vehicle is already booked for the selected dates".to_string(),
                ));
            }

            let pricing = self.pricing.reprice(&booking, &window).await?;
            booking.start_date = window.start;
            booking.end_date = window.end;
            booking.start_time = window.start_time;
            booking.end_time = window.end_time;
            booking.apply_pricing(&pricing);
        }

        if let Some(pickup) = patch.pickup_location {
            booking.pickup_location = required_location(&pickup)?;
        }
        if let Some(dropoff) = patch.dropoff_location {
            booking.dropoff_location = Some(dropoff);
        }
        if let Some(notes) = patch.notes {
            booking.notes = Some(notes);
        }
        booking.updated_at = now;

        self.repos.bookings().update(&booking).await?;

        info!(booking_id = %booking.id, total = %booking.total_amount, "Booking updated");
        self.dispatch(Event::updated(&booking));
        Ok(booking)
    }

    /// Cancel a PENDING or CONFIRMED booking before it starts, computing the
    /// lead-time fee and, when asked, the refund due.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        reason: Option<String>,
        refund_requested: bool,
        principal: &Principal,
    ) -> DomainResult<CancellationOutcome> {
        let now = self.clock.now();
        let _booking_guard = self.booking_locks.acquire(&booking_id).await;

        let mut booking = self.load_booking(booking_id).await?;
        ensure_manager(principal, &booking)?;

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(DomainError::IllegalTransition {
                from: booking.status,
                to: BookingStatus::Cancelled,
            });
        }
        if !booking.is_cancellable(now) {
            return Err(DomainError::InvalidInput(
                "Cannot cancel a booking that has already started".to_string(),
            ));
        }

        let fee = cancellation_fee(now, booking.start_date, booking.total_amount);

        // Ask the payment collaborator before anything is written.
        let refund = if refund_requested
            && self.payments.has_completed_payment(booking.id).await?
        {
            Some(refund_amount(booking.total_amount, fee))
        } else {
            None
        };

        booking.cancellation_fee = Some(fee);
        booking.set_status(BookingStatus::Cancelled, reason, now);

        let _vehicle_guard = self.vehicle_locks.acquire(&booking.vehicle_id).await;
        let vehicle_status = self.release_target(booking.vehicle_id).await?;
        self.repos
            .bookings()
            .save_transition(&booking, vehicle_status)
            .await?;

        info!(
            booking_id = %booking.id,
            fee = %fee,
            refund = ?refund,
            "Booking cancelled"
        );

        self.dispatch(Event::cancelled(&booking, refund));
        Ok(CancellationOutcome {
            booking,
            cancellation_fee: fee,
            refund_amount: refund,
        })
    }

    /// Drive a booking through the state machine on behalf of staff.
    pub async fn change_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        reason: Option<String>,
        principal: &Principal,
    ) -> DomainResult<Booking> {
        let now = self.clock.now();
        let _booking_guard = self.booking_locks.acquire(&booking_id).await;

        let mut booking = self.load_booking(booking_id).await?;
        let old_status = booking.status;
        ensure_transition(old_status, new_status, principal.role)?;

        if new_status == BookingStatus::Cancelled {
            booking.cancellation_fee = Some(cancellation_fee(
                now,
                booking.start_date,
                booking.total_amount,
            ));
        }
        booking.set_status(new_status, reason, now);

        let vehicle_status = if new_status.releases_vehicle() {
            let _vehicle_guard = self.vehicle_locks.acquire(&booking.vehicle_id).await;
            let target = self.release_target(booking.vehicle_id).await?;
            self.repos.bookings().save_transition(&booking, target).await?;
            target
        } else {
            self.repos.bookings().save_transition(&booking, None).await?;
            None
        };

        info!(
            booking_id = %booking.id,
            from = %old_status,
            to = %new_status,
            by = %principal.role,
            vehicle_released = vehicle_status.is_some(),
            "Booking status changed"
        );

        self.dispatch(Event::status_changed(&booking, old_status));
        if new_status == BookingStatus::Cancelled {
            self.dispatch(Event::cancelled(&booking, None));
        }
        Ok(booking)
    }

    /// Owners, admins and desk agents may read a booking.
    pub async fn get(&self, booking_id: Uuid, principal: &Principal) -> DomainResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if principal.role == Role::Agent || principal.may_manage(booking.user_id) {
            Ok(booking)
        } else {
            Err(DomainError::Forbidden(format!(
                "User {} may not view booking {}",
                principal.user_id, booking.id
            )))
        }
    }

    /// Bookings matching `filter`; customers only ever see their own.
    pub async fn list(
        &self,
        mut filter: BookingFilter,
        principal: &Principal,
    ) -> DomainResult<Vec<Booking>> {
        if principal.role == Role::Customer {
            filter.user_id = Some(principal.user_id);
        }
        self.repos.bookings().find(&filter).await
    }

    pub async fn check_availability(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_booking_id: Option<Uuid>,
    ) -> DomainResult<AvailabilityReport> {
        if end <= start {
            return Err(DomainError::InvalidInput(
                "End date must be after start date".to_string(),
            ));
        }
        self.load_vehicle(vehicle_id).await?;
        self.availability
            .check(vehicle_id, start, end, exclude_booking_id)
            .await
    }

    pub async fn calculate_price(&self, request: PriceRequest) -> DomainResult<PricingBreakdown> {
        let vehicle = self.load_vehicle(request.vehicle_id).await?;
        let window = RentalWindow::resolve(
            request.start_date,
            request.end_date,
            request.start_time,
            request.end_time,
            request.hourly,
        )?;
        self.pricing
            .price(&vehicle, &window, request.coupon_code.as_deref())
            .await
    }

    async fn load_booking(&self, id: Uuid) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    async fn load_vehicle(&self, id: Uuid) -> DomainResult<Vehicle> {
        self.repos
            .vehicles()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", id))
    }

    /// AVAILABLE when the vehicle is currently RENTED; a vehicle moved to
    /// maintenance or retired in the meantime is left alone.
    async fn release_target(&self, vehicle_id: Uuid) -> DomainResult<Option<VehicleStatus>> {
        let vehicle = self.repos.vehicles().find_by_id(vehicle_id).await?;
        Ok(match vehicle {
            Some(v) if v.status == VehicleStatus::Rented => Some(VehicleStatus::Available),
            _ => None,
        })
    }

    fn dispatch(&self, event: Event) {
        let event_type = event.event_type();
        let booking_id = event.booking_id();
        if let Err(e) = self.notifier.notify(event) {
            warn!(event_type, %booking_id, error = %e, "Notification failed");
        }
    }
}

fn ensure_manager(principal: &Principal, booking: &Booking) -> DomainResult<()> {
    if principal.may_manage(booking.user_id) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "User {} may not manage booking {}",
            principal.user_id, booking.id
        )))
    }
}

fn required_location(location: &str) -> DomainResult<String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(
            "Pickup location is required".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::EventBus;
    use crate::application::ports::{Notifier, NotifyError};
    use crate::domain::{Coupon, DiscountType};
    use crate::infrastructure::storage::{InMemoryPaymentGateway, InMemoryRepositoryProvider};
    use crate::shared::FixedClock;
    use chrono::{Duration, NaiveTime, TimeZone};
    use rust_decimal::Decimal;

    struct Harness {
        service: Arc<ReservationService>,
        repos: Arc<InMemoryRepositoryProvider>,
        payments: Arc<InMemoryPaymentGateway>,
        clock: Arc<FixedClock>,
        bus: Arc<EventBus>,
        vehicle: Vehicle,
        customer: Principal,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 4, 1, 12, 0, 0).unwrap()
    }

    async fn harness_with(notifier: Option<SharedNotifier>) -> Harness {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let payments = Arc::new(InMemoryPaymentGateway::new());
        let clock = Arc::new(FixedClock::new(now()));
        let bus = Arc::new(EventBus::new());

        let vehicle = Vehicle::new("Sedan", Decimal::new(100, 0), Some(Decimal::new(10, 0)));
        repos.vehicles().save(vehicle.clone()).await.unwrap();

        let notifier = notifier.unwrap_or_else(|| bus.clone() as SharedNotifier);
        let service = Arc::new(ReservationService::new(
            repos.clone(),
            notifier,
            payments.clone(),
            clock.clone(),
            PricingPolicy::default(),
        ));

        Harness {
            service,
            repos,
            payments,
            clock,
            bus,
            vehicle,
            customer: Principal::customer(Uuid::new_v4()),
        }
    }

    async fn harness() -> Harness {
        harness_with(None).await
    }

    fn request(vehicle_id: Uuid, start_in_days: i64, days: i64) -> CreateReservation {
        let start = now() + Duration::days(start_in_days);
        CreateReservation {
            vehicle_id,
            start_date: start,
            end_date: start + Duration::days(days),
            start_time: None,
            end_time: None,
            hourly: false,
            pickup_location: "Airport".into(),
            dropoff_location: None,
            coupon_code: None,
            notes: None,
        }
    }

    async fn vehicle_status(h: &Harness) -> VehicleStatus {
        h.repos
            .vehicles()
            .find_by_id(h.vehicle.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn create_persists_pending_booking_and_rents_vehicle() {
        let h = harness().await;
        let mut events = h.bus.subscribe();

        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 3), &h.customer)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.user_id, h.customer.user_id);
        assert_eq!(booking.total_days, 3);
        assert_eq!(booking.total_amount, Decimal::new(345, 0));
        assert_eq!(booking.price_per_day, Decimal::new(100, 0));
        assert_eq!(booking.dropoff_location.as_deref(), Some("Airport"));
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Rented);

        let stored = h.repos.bookings().find_by_id(booking.id).await.unwrap();
        assert_eq!(stored, Some(booking.clone()));

        let msg = events.try_recv().expect("created event");
        assert_eq!(msg.event.event_type(), "booking_created");
        assert_eq!(msg.event.booking_id(), booking.id);
    }

    #[tokio::test]
    async fn create_validates_dates() {
        let h = harness().await;

        let mut past = request(h.vehicle.id, 0, 1);
        past.start_date = now();
        let err = h.service.create(past, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let mut inverted = request(h.vehicle.id, 5, 1);
        inverted.end_date = inverted.start_date - Duration::hours(1);
        let err = h.service.create(inverted, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let mut same_day = request(h.vehicle.id, 5, 0);
        same_day.hourly = true;
        same_day.start_time = NaiveTime::from_hms_opt(14, 0, 0);
        same_day.end_time = NaiveTime::from_hms_opt(10, 0, 0);
        let err = h.service.create(same_day, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let mut nowhere = request(h.vehicle.id, 5, 1);
        nowhere.pickup_location = "  ".into();
        let err = h.service.create(nowhere, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        assert_eq!(vehicle_status(&h).await, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn create_rejects_missing_or_unavailable_vehicle() {
        let h = harness().await;

        let err = h
            .service
            .create(request(Uuid::new_v4(), 5, 1), &h.customer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Vehicle", .. }));

        h.repos
            .vehicles()
            .update_status(h.vehicle.id, VehicleStatus::Maintenance)
            .await
            .unwrap();
        let err = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
    }

    #[tokio::test]
    async fn hourly_create_uses_hourly_rate() {
        let h = harness().await;
        let mut req = request(h.vehicle.id, 3, 0);
        req.hourly = true;
        req.start_time = NaiveTime::from_hms_opt(9, 0, 0);
        req.end_time = NaiveTime::from_hms_opt(13, 15, 0);

        let booking = h.service.create(req, &h.customer).await.unwrap();
        assert_eq!(booking.total_hours, 5);
        assert_eq!(booking.total_days, 0);
        assert_eq!(booking.subtotal, Decimal::new(50, 0));
        assert_eq!(booking.start_date, (now() + Duration::days(3)).date_naive().and_hms_opt(9, 0, 0).unwrap().and_utc());
    }

    #[tokio::test]
    async fn concurrent_overlapping_creates_yield_one_conflict() {
        let h = harness().await;
        let first = request(h.vehicle.id, 5, 3);
        let mut second = request(h.vehicle.id, 6, 3);
        second.pickup_location = "Downtown".into();

        let other = Principal::customer(Uuid::new_v4());
        let (a, b) = tokio::join!(
            h.service.create(first, &h.customer),
            h.service.create(second, &other),
        );

        let results = [a, b];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict(_))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 1);

        let all = h
            .repos
            .bookings()
            .find(&BookingFilter::for_vehicle(h.vehicle.id))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn coupon_usage_counts_once_per_booking() {
        let h = harness().await;
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: "HALF".into(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(50, 0),
            max_discount: Some(Decimal::new(20, 0)),
            min_amount: None,
            valid_from: now() - Duration::days(1),
            valid_until: now() + Duration::days(30),
            usage_limit: Some(5),
            used_count: 0,
            is_active: true,
        };
        h.repos.coupons().save(coupon.clone()).await.unwrap();

        let mut req = request(h.vehicle.id, 5, 1);
        req.coupon_code = Some("HALF".into());
        let booking = h.service.create(req, &h.customer).await.unwrap();

        assert_eq!(booking.coupon_id, Some(coupon.id));
        assert_eq!(booking.coupon_discount, Decimal::new(20, 0));
        // 100 + 10 + 5 - 20
        assert_eq!(booking.total_amount, Decimal::new(95, 0));

        let stored = h.repos.coupons().find_by_id(coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);

        // a failed create leaves the counter alone
        let mut clash = request(h.vehicle.id, 5, 1);
        clash.coupon_code = Some("HALF".into());
        assert!(h.service.create(clash, &h.customer).await.is_err());
        let stored = h.repos.coupons().find_by_id(coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
    }

    #[tokio::test]
    async fn cancel_is_not_repeatable_and_frees_vehicle_once() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 2), &h.customer)
            .await
            .unwrap();

        let outcome = h
            .service
            .cancel(booking.id, Some("Plans changed".into()), false, &h.customer)
            .await
            .unwrap();
        assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
        assert_eq!(outcome.cancellation_fee, Decimal::ZERO);
        assert_eq!(outcome.refund_amount, None);
        assert_eq!(
            outcome.booking.cancellation_reason.as_deref(),
            Some("Plans changed")
        );
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Available);

        // someone else rents the vehicle; a repeated cancel must not free it
        h.repos
            .vehicles()
            .update_status(h.vehicle.id, VehicleStatus::Rented)
            .await
            .unwrap();
        let err = h
            .service
            .cancel(booking.id, None, false, &h.customer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::IllegalTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Cancelled
            }
        ));
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Rented);
    }

    #[tokio::test]
    async fn cancel_fee_and_refund_follow_lead_time() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 2), &h.customer)
            .await
            .unwrap();
        assert_eq!(booking.total_amount, Decimal::new(230, 0));
        h.payments.record_completed(booking.id);

        // 30 hours before pickup
        h.clock.set(booking.start_date - Duration::hours(30));
        let outcome = h
            .service
            .cancel(booking.id, None, true, &h.customer)
            .await
            .unwrap();
        assert_eq!(outcome.cancellation_fee, Decimal::new(5750, 2));
        assert_eq!(outcome.refund_amount, Some(Decimal::new(17250, 2)));
        assert_eq!(outcome.booking.cancellation_fee, Some(Decimal::new(5750, 2)));
    }

    #[tokio::test]
    async fn cancel_without_payment_owes_no_refund() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();

        let outcome = h
            .service
            .cancel(booking.id, None, true, &h.customer)
            .await
            .unwrap();
        assert_eq!(outcome.refund_amount, None);
    }

    #[tokio::test]
    async fn cancel_requires_owner_or_admin_and_a_future_start() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();

        let stranger = Principal::customer(Uuid::new_v4());
        let err = h
            .service
            .cancel(booking.id, None, false, &stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        h.clock.set(booking.start_date + Duration::minutes(5));
        let err = h
            .service
            .cancel(booking.id, None, false, &Principal::admin(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn status_changes_follow_roles_and_table() {
        let h = harness().await;
        let admin = Principal::admin(Uuid::new_v4());
        let agent = Principal::agent(Uuid::new_v4());
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();

        let err = h
            .service
            .change_status(booking.id, BookingStatus::Confirmed, None, &h.customer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = h
            .service
            .change_status(booking.id, BookingStatus::Confirmed, None, &agent)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = h
            .service
            .change_status(booking.id, BookingStatus::Completed, None, &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));

        let confirmed = h
            .service
            .change_status(booking.id, BookingStatus::Confirmed, None, &admin)
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        h.service
            .change_status(booking.id, BookingStatus::Active, None, &agent)
            .await
            .unwrap();
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Rented);

        let completed = h
            .service
            .change_status(booking.id, BookingStatus::Completed, None, &agent)
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn rejection_records_reason_and_frees_vehicle() {
        let h = harness().await;
        let admin = Principal::admin(Uuid::new_v4());
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        let mut events = h.bus.subscribe();

        let rejected = h
            .service
            .change_status(
                booking.id,
                BookingStatus::Rejected,
                Some("Licence expired".into()),
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(rejected.cancellation_reason.as_deref(), Some("Licence expired"));
        assert_eq!(vehicle_status(&h).await, VehicleStatus::Available);

        let msg = events.try_recv().expect("status event");
        assert_eq!(msg.event.event_type(), "booking_status_changed");
    }

    #[tokio::test]
    async fn admin_cancel_through_status_change_charges_fee() {
        let h = harness().await;
        let admin = Principal::admin(Uuid::new_v4());
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        h.clock.set(booking.start_date - Duration::hours(10));

        let cancelled = h
            .service
            .change_status(booking.id, BookingStatus::Cancelled, None, &admin)
            .await
            .unwrap();
        assert_eq!(cancelled.cancellation_fee, Some(booking.total_amount / Decimal::TWO));
    }

    #[tokio::test]
    async fn update_moves_window_and_reprices() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();

        let patch = UpdateReservation {
            end_date: Some(booking.start_date + Duration::days(3)),
            notes: Some("Child seat".into()),
            ..UpdateReservation::default()
        };
        let updated = h.service.update(booking.id, patch, &h.customer).await.unwrap();
        assert_eq!(updated.total_days, 3);
        assert_eq!(updated.total_amount, Decimal::new(345, 0));
        assert_eq!(updated.notes.as_deref(), Some("Child seat"));
        assert_eq!(updated.created_at, booking.created_at);
    }

    #[tokio::test]
    async fn update_keeps_applied_coupon_discount() {
        let h = harness().await;
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: "TEN".into(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::new(10, 0),
            max_discount: None,
            min_amount: None,
            valid_from: now() - Duration::days(1),
            valid_until: now() + Duration::days(1),
            usage_limit: Some(1),
            used_count: 0,
            is_active: true,
        };
        h.repos.coupons().save(coupon.clone()).await.unwrap();
        let mut req = request(h.vehicle.id, 5, 1);
        req.coupon_code = Some("TEN".into());
        let booking = h.service.create(req, &h.customer).await.unwrap();

        // the coupon is used up and expires; the booking keeps its discount
        h.clock.set(now() + Duration::days(2));
        let patch = UpdateReservation {
            end_date: Some(booking.start_date + Duration::days(2)),
            ..UpdateReservation::default()
        };
        let updated = h.service.update(booking.id, patch, &h.customer).await.unwrap();
        assert_eq!(updated.coupon_id, Some(coupon.id));
        assert_eq!(updated.coupon_discount, Decimal::new(10, 0));
        assert_eq!(updated.total_amount, Decimal::new(220, 0));
    }

    #[tokio::test]
    async fn shortening_hourly_booking_clamps_fixed_coupon() {
        let h = harness().await;
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: "FLAT80".into(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::new(80, 0),
            max_discount: None,
            min_amount: None,
            valid_from: now() - Duration::days(1),
            valid_until: now() + Duration::days(30),
            usage_limit: None,
            used_count: 0,
            is_active: true,
        };
        h.repos.coupons().save(coupon.clone()).await.unwrap();

        let mut req = request(h.vehicle.id, 3, 0);
        req.hourly = true;
        req.start_time = NaiveTime::from_hms_opt(8, 0, 0);
        req.end_time = NaiveTime::from_hms_opt(18, 0, 0);
        req.coupon_code = Some("FLAT80".into());
        let booking = h.service.create(req, &h.customer).await.unwrap();
        assert_eq!(booking.subtotal, Decimal::new(100, 0));
        // 100 + 10 + 5 - 80
        assert_eq!(booking.total_amount, Decimal::new(35, 0));

        let patch = UpdateReservation {
            end_time: NaiveTime::from_hms_opt(10, 0, 0),
            ..UpdateReservation::default()
        };
        let updated = h.service.update(booking.id, patch, &h.customer).await.unwrap();
        assert_eq!(updated.total_hours, 2);
        assert_eq!(updated.subtotal, Decimal::new(20, 0));
        assert_eq!(updated.coupon_id, Some(coupon.id));
        assert_eq!(updated.coupon_discount, Decimal::new(20, 0));
        // 20 + 2 + 1 - 20
        assert_eq!(updated.total_amount, Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn extending_booking_scales_percentage_coupon() {
        let h = harness().await;
        let coupon = Coupon {
            id: Uuid::new_v4(),
            code: "TENPCT".into(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::new(10, 0),
            max_discount: None,
            min_amount: None,
            valid_from: now() - Duration::days(1),
            valid_until: now() + Duration::days(30),
            usage_limit: Some(1),
            used_count: 0,
            is_active: true,
        };
        h.repos.coupons().save(coupon.clone()).await.unwrap();

        let mut req = request(h.vehicle.id, 5, 1);
        req.coupon_code = Some("TENPCT".into());
        let booking = h.service.create(req, &h.customer).await.unwrap();
        assert_eq!(booking.coupon_discount, Decimal::new(10, 0));

        // used up, but the booking already holds it
        let patch = UpdateReservation {
            end_date: Some(booking.start_date + Duration::days(10)),
            ..UpdateReservation::default()
        };
        let updated = h.service.update(booking.id, patch, &h.customer).await.unwrap();
        assert_eq!(updated.subtotal, Decimal::new(1000, 0));
        assert_eq!(updated.coupon_discount, Decimal::new(100, 0));
        // 1000 + 100 + 50 - 100
        assert_eq!(updated.total_amount, Decimal::new(1050, 0));
    }

    #[tokio::test]
    async fn daily_booking_rejects_time_patch() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 2), &h.customer)
            .await
            .unwrap();

        let patch = UpdateReservation {
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            ..UpdateReservation::default()
        };
        let err = h.service.update(booking.id, patch, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let stored = h.repos.bookings().find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.start_time, None);
        assert_eq!(stored.total_days, 2);
        assert_eq!(stored.total_amount, booking.total_amount);
        assert_eq!(stored.updated_at, booking.updated_at);
    }

    #[tokio::test]
    async fn locks_are_released_after_each_operation() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        h.service
            .cancel(booking.id, None, false, &h.customer)
            .await
            .unwrap();
        assert!(h.service.vehicle_locks.is_empty());
        assert!(h.service.booking_locks.is_empty());
    }

    #[tokio::test]
    async fn update_checks_availability_against_other_bookings_only() {
        let h = harness().await;
        let second_vehicle = Vehicle::new("Hatchback", Decimal::new(60, 0), None);
        h.repos.vehicles().save(second_vehicle.clone()).await.unwrap();

        let mine = h
            .service
            .create(request(second_vehicle.id, 5, 2), &h.customer)
            .await
            .unwrap();
        // overlapping only itself is fine
        let patch = UpdateReservation {
            start_date: Some(mine.start_date + Duration::days(1)),
            end_date: Some(mine.end_date + Duration::days(1)),
            ..UpdateReservation::default()
        };
        let moved = h.service.update(mine.id, patch, &h.customer).await.unwrap();
        assert_eq!(moved.start_date, mine.start_date + Duration::days(1));

        // a second holder on the same vehicle blocks the move
        let other = crate::domain::booking::model::fixtures::booking_between(
            second_vehicle.id,
            moved.end_date + Duration::days(1),
            moved.end_date + Duration::days(4),
            BookingStatus::Confirmed,
        );
        h.repos.insert_booking_unchecked(other);
        let patch = UpdateReservation {
            end_date: Some(moved.end_date + Duration::days(2)),
            ..UpdateReservation::default()
        };
        let err = h.service.update(mine.id, patch, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_only_while_pending() {
        let h = harness().await;
        let admin = Principal::admin(Uuid::new_v4());
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        h.service
            .change_status(booking.id, BookingStatus::Confirmed, None, &admin)
            .await
            .unwrap();

        let patch = UpdateReservation {
            notes: Some("late".into()),
            ..UpdateReservation::default()
        };
        let err = h.service.update(booking.id, patch, &h.customer).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _event: Event) -> Result<(), NotifyError> {
            Err(NotifyError("smtp unreachable".into()))
        }
    }

    #[tokio::test]
    async fn notifier_failure_does_not_undo_booking() {
        let h = harness_with(Some(Arc::new(FailingNotifier))).await;

        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        assert!(h.repos.bookings().find_by_id(booking.id).await.unwrap().is_some());

        let outcome = h
            .service
            .cancel(booking.id, None, false, &h.customer)
            .await
            .unwrap();
        assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn reads_are_scoped_to_caller() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 1), &h.customer)
            .await
            .unwrap();
        let stranger = Principal::customer(Uuid::new_v4());

        assert!(h.service.get(booking.id, &h.customer).await.is_ok());
        assert!(h.service.get(booking.id, &Principal::agent(Uuid::new_v4())).await.is_ok());
        assert!(matches!(
            h.service.get(booking.id, &stranger).await,
            Err(DomainError::Forbidden(_))
        ));

        let seen = h.service.list(BookingFilter::new(), &stranger).await.unwrap();
        assert!(seen.is_empty());
        let seen = h
            .service
            .list(BookingFilter::new(), &Principal::admin(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn availability_and_price_passthroughs() {
        let h = harness().await;
        let booking = h
            .service
            .create(request(h.vehicle.id, 5, 2), &h.customer)
            .await
            .unwrap();

        let report = h
            .service
            .check_availability(h.vehicle.id, booking.end_date, booking.end_date + Duration::days(1), None)
            .await
            .unwrap();
        assert!(report.available);

        let report = h
            .service
            .check_availability(h.vehicle.id, booking.start_date, booking.end_date, None)
            .await
            .unwrap();
        assert_eq!(report.conflicts.len(), 1);

        let err = h
            .service
            .check_availability(Uuid::new_v4(), booking.start_date, booking.end_date, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let quote = h
            .service
            .calculate_price(PriceRequest {
                vehicle_id: h.vehicle.id,
                start_date: booking.start_date,
                end_date: booking.start_date + Duration::days(3),
                start_time: None,
                end_time: None,
                hourly: false,
                coupon_code: None,
            })
            .await
            .unwrap();
        assert_eq!(quote.total_amount, Decimal::new(345, 0));
    }
}
