//! Booking reservation engine
//!
//! - `window` resolves request dates and times into the rental interval
//! - `availability` finds conflicting bookings
//! - `pricing` and `coupons` compute the commercial breakdown
//! - `cancellation` holds the lead-time fee tiers
//! - `service` orchestrates the use cases

pub mod availability;
pub mod cancellation;
pub mod commands;
pub mod coupons;
pub mod pricing;
pub mod service;
pub mod window;

pub use availability::{find_conflicts, AvailabilityChecker, AvailabilityReport};
pub use cancellation::{cancellation_fee, refund_amount};
pub use commands::{CancellationOutcome, CreateReservation, PriceRequest, UpdateReservation};
pub use coupons::{AppliedCoupon, CouponValidator};
pub use pricing::{ChargeBasis, PricingCalculator, PricingPolicy, Rates};
pub use service::ReservationService;
pub use window::RentalWindow;
