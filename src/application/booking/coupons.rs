//! Coupon validator
//!
//! Resolves a coupon code against a subtotal. Unknown or ineligible codes
//! are not an error: the booking simply proceeds without a coupon.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Coupon, DiscountType, DomainResult, RepositoryProvider};
use crate::shared::SharedClock;

/// A coupon accepted for a given subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub id: Uuid,
    pub discount_amount: Decimal,
}

/// Why a coupon was turned down, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    Inactive,
    OutsideValidity,
    UsageExhausted,
    BelowMinimum,
}

pub fn check_eligibility(
    coupon: &Coupon,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<(), Ineligibility> {
    if !coupon.is_active {
        return Err(Ineligibility::Inactive);
    }
    if !coupon.is_valid_at(now) {
        return Err(Ineligibility::OutsideValidity);
    }
    if !coupon.has_remaining_uses() {
        return Err(Ineligibility::UsageExhausted);
    }
    if !coupon.meets_minimum(subtotal) {
        return Err(Ineligibility::BelowMinimum);
    }
    Ok(())
}

/// Discount granted by `coupon` on `subtotal`.
///
/// Percentage coupons are capped at `max_discount`; fixed coupons never
/// exceed the subtotal.
pub fn discount_amount(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let pct = subtotal * coupon.discount_value / Decimal::ONE_HUNDRED;
            match coupon.max_discount {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
        DiscountType::Fixed => coupon.discount_value.min(subtotal),
    };
    raw.max(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone)]
pub struct CouponValidator {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
}

impl CouponValidator {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self { repos, clock }
    }

    pub async fn validate(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> DomainResult<Option<AppliedCoupon>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        let Some(coupon) = self.repos.coupons().find_by_code(code).await? else {
            debug!(code, "Coupon not found");
            return Ok(None);
        };

        if let Err(reason) = check_eligibility(&coupon, subtotal, self.clock.now()) {
            info!(code, coupon_id = %coupon.id, ?reason, "Coupon not applicable");
            return Ok(None);
        }

        let discount = discount_amount(&coupon, subtotal);
        debug!(code, coupon_id = %coupon.id, %discount, "Coupon applied");
        Ok(Some(AppliedCoupon {
            id: coupon.id,
            discount_amount: discount,
        }))
    }

    /// Recompute the discount of a coupon already attached to a booking for
    /// a new subtotal. Eligibility and usage are not checked again: the
    /// coupon was consumed when the booking was created.
    pub async fn reapply(
        &self,
        coupon_id: Uuid,
        previous_discount: Decimal,
        subtotal: Decimal,
    ) -> DomainResult<AppliedCoupon> {
        let discount = match self.repos.coupons().find_by_id(coupon_id).await? {
            Some(coupon) => discount_amount(&coupon, subtotal),
            None => {
                warn!(%coupon_id, "Applied coupon no longer exists; clamping its discount");
                previous_discount.min(subtotal).max(Decimal::ZERO)
            }
        };
        Ok(AppliedCoupon {
            id: coupon_id,
            discount_amount: discount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::FixedClock;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 15, 12, 0, 0).unwrap()
    }

    fn coupon(code: &str, discount_type: DiscountType, value: i64) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: code.into(),
            discount_type,
            discount_value: Decimal::new(value, 0),
            max_discount: None,
            min_amount: None,
            valid_from: now() - Duration::days(10),
            valid_until: now() + Duration::days(10),
            usage_limit: None,
            used_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn percentage_discount_respects_cap() {
        let mut c = coupon("HALF", DiscountType::Percentage, 50);
        c.max_discount = Some(Decimal::new(20, 0));
        assert_eq!(discount_amount(&c, Decimal::new(100, 0)), Decimal::new(20, 0));

        c.max_discount = None;
        assert_eq!(discount_amount(&c, Decimal::new(100, 0)), Decimal::new(50, 0));
    }

    #[test]
    fn fixed_discount_is_clamped_to_subtotal() {
        let c = coupon("FLAT", DiscountType::Fixed, 80);
        assert_eq!(discount_amount(&c, Decimal::new(50, 0)), Decimal::new(50, 0));
        assert_eq!(discount_amount(&c, Decimal::new(200, 0)), Decimal::new(80, 0));
    }

    #[test]
    fn eligibility_reasons() {
        let mut c = coupon("X", DiscountType::Fixed, 5);
        assert_eq!(check_eligibility(&c, Decimal::ONE, now()), Ok(()));

        c.min_amount = Some(Decimal::new(10, 0));
        assert_eq!(
            check_eligibility(&c, Decimal::ONE, now()),
            Err(Ineligibility::BelowMinimum)
        );

        c.usage_limit = Some(3);
        c.used_count = 3;
        assert_eq!(
            check_eligibility(&c, Decimal::new(10, 0), now()),
            Err(Ineligibility::UsageExhausted)
        );

        assert_eq!(
            check_eligibility(&c, Decimal::new(10, 0), now() + Duration::days(11)),
            Err(Ineligibility::OutsideValidity)
        );

        c.is_active = false;
        assert_eq!(
            check_eligibility(&c, Decimal::new(10, 0), now()),
            Err(Ineligibility::Inactive)
        );
    }

    #[tokio::test]
    async fn validate_resolves_codes_through_the_store() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut expired = coupon("OLD", DiscountType::Percentage, 10);
        expired.valid_until = now() - Duration::days(1);
        let good = coupon("TENOFF", DiscountType::Fixed, 10);
        repos.coupons().save(expired).await.unwrap();
        repos.coupons().save(good.clone()).await.unwrap();

        let validator = CouponValidator::new(repos, Arc::new(FixedClock::new(now())));

        let applied = validator
            .validate("TENOFF", Decimal::new(100, 0))
            .await
            .unwrap()
            .expect("coupon applies");
        assert_eq!(applied.id, good.id);
        assert_eq!(applied.discount_amount, Decimal::new(10, 0));

        assert!(validator.validate("OLD", Decimal::new(100, 0)).await.unwrap().is_none());
        assert!(validator.validate("NOPE", Decimal::new(100, 0)).await.unwrap().is_none());
        assert!(validator.validate("  ", Decimal::new(100, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reapply_recomputes_without_eligibility_checks() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut spent = coupon("FLAT80", DiscountType::Fixed, 80);
        spent.usage_limit = Some(1);
        spent.used_count = 1;
        spent.valid_until = now() - Duration::days(1);
        repos.coupons().save(spent.clone()).await.unwrap();

        let validator = CouponValidator::new(repos, Arc::new(FixedClock::new(now())));

        let applied = validator
            .reapply(spent.id, Decimal::new(80, 0), Decimal::new(20, 0))
            .await
            .unwrap();
        assert_eq!(applied.id, spent.id);
        assert_eq!(applied.discount_amount, Decimal::new(20, 0));

        // a deleted coupon keeps its old discount, clamped to the new subtotal
        let gone = validator
            .reapply(Uuid::new_v4(), Decimal::new(80, 0), Decimal::new(50, 0))
            .await
            .unwrap();
        assert_eq!(gone.discount_amount, Decimal::new(50, 0));
    }
}
