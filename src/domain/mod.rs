//! Domain layer: entities, value objects, events and repository contracts

pub mod booking;
pub mod coupon;
pub mod events;
pub mod identity;
pub mod repositories;
pub mod vehicle;

pub use booking::{Booking, BookingFilter, BookingRepository, BookingStatus, PricingBreakdown};
pub use coupon::{Coupon, CouponRepository, DiscountType};
pub use identity::{Principal, Role};
pub use repositories::{DomainResult, RepositoryProvider};
pub use vehicle::{Vehicle, VehicleRepository, VehicleStatus};

pub use crate::shared::errors::DomainError;
