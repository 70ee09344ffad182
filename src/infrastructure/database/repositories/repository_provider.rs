//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::repositories::RepositoryProvider;
use crate::domain::{BookingRepository, CouponRepository, VehicleRepository};

use super::booking_repository::SeaOrmBookingRepository;
use super::coupon_repository::SeaOrmCouponRepository;
use super::vehicle_repository::SeaOrmVehicleRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let vehicle = repos.vehicles().find_by_id(vehicle_id).await?;
/// let mine = repos.bookings().find(&BookingFilter::for_user(user_id)).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    bookings: SeaOrmBookingRepository,
    vehicles: SeaOrmVehicleRepository,
    coupons: SeaOrmCouponRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            bookings: SeaOrmBookingRepository::new(db.clone()),
            vehicles: SeaOrmVehicleRepository::new(db.clone()),
            coupons: SeaOrmCouponRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
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
