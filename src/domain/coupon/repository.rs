//! Coupon repository interface
//!
//! Usage counters are only incremented as part of
//! [`BookingRepository::insert_reservation`](crate::domain::booking::BookingRepository::insert_reservation).

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Coupon;
use crate::domain::DomainResult;

#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Coupon>>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Coupon>>;

    /// Insert or replace a coupon (back-office import, test seeding)
    async fn save(&self, coupon: Coupon) -> DomainResult<()>;
}
