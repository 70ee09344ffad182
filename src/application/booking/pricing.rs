//! Pricing calculator
//!
//! `subtotal = rate × units`, where units are ceiling days or, for hourly
//! rentals, ceiling hours. Taxes and fees are percentages of the subtotal;
//! discounts come off the gross and the total never drops below zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coupons::{AppliedCoupon, CouponValidator};
use super::window::RentalWindow;
use crate::domain::{Booking, DomainError, DomainResult, PricingBreakdown, Vehicle};

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax and service fee rates applied to every quote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    pub fee_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            fee_rate: Decimal::new(5, 2),
        }
    }
}

impl PricingPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        if self.tax_rate < Decimal::ZERO || self.fee_rate < Decimal::ZERO {
            return Err(DomainError::InvalidInput(
                "Tax and fee rates must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Assemble the breakdown for a charge basis and an optional coupon.
    pub fn quote(
        &self,
        rates: &Rates,
        basis: &ChargeBasis,
        coupon: Option<AppliedCoupon>,
    ) -> PricingBreakdown {
        let subtotal = basis.base_price;
        let taxes = money(subtotal * self.tax_rate);
        let fees = money(subtotal * self.fee_rate);
        let discount = Decimal::ZERO;
        let coupon_discount = coupon.map(|c| c.discount_amount);

        let total_amount = (subtotal + taxes + fees
            - discount
            - coupon_discount.unwrap_or(Decimal::ZERO))
        .max(Decimal::ZERO);

        PricingBreakdown {
            base_price: basis.base_price,
            total_days: basis.total_days,
            total_hours: basis.total_hours,
            subtotal,
            taxes,
            fees,
            discount,
            coupon_discount,
            coupon_id: coupon.map(|c| c.id),
            total_amount: money(total_amount),
            price_per_day: rates.price_per_day,
            price_per_hour: rates.price_per_hour,
        }
    }
}

/// Rates a booking is priced at: live from the vehicle at creation,
/// from the booking's snapshot afterwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub price_per_day: Decimal,
    pub price_per_hour: Option<Decimal>,
}

impl From<&Vehicle> for Rates {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            price_per_day: vehicle.price_per_day,
            price_per_hour: vehicle.price_per_hour,
        }
    }
}

impl From<&Booking> for Rates {
    fn from(booking: &Booking) -> Self {
        Self {
            price_per_day: booking.price_per_day,
            price_per_hour: booking.price_per_hour,
        }
    }
}

/// Billable units and the base price they produce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeBasis {
    pub base_price: Decimal,
    pub total_days: i64,
    pub total_hours: Option<i64>,
}

impl ChargeBasis {
    pub fn compute(rates: &Rates, window: &RentalWindow) -> DomainResult<Self> {
        if window.hourly {
            let per_hour = rates.price_per_hour.ok_or_else(|| {
                DomainError::InvalidInput("Vehicle has no hourly rate".to_string())
            })?;
            let hours = window.total_hours();
            return Ok(Self {
                base_price: money(per_hour * Decimal::from(hours)),
                total_days: 0,
                total_hours: Some(hours),
            });
        }

        let days = window.total_days();
        Ok(Self {
            base_price: money(rates.price_per_day * Decimal::from(days)),
            total_days: days,
            total_hours: None,
        })
    }
}

#[derive(Clone)]
pub struct PricingCalculator {
    coupons: CouponValidator,
    policy: PricingPolicy,
}

impl PricingCalculator {
    pub fn new(coupons: CouponValidator, policy: PricingPolicy) -> Self {
        Self { coupons, policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Price a prospective rental of `vehicle` over `window`.
    pub async fn price(
        &self,
        vehicle: &Vehicle,
        window: &RentalWindow,
        coupon_code: Option<&str>,
    ) -> DomainResult<PricingBreakdown> {
        let rates = Rates::from(vehicle);
        let basis = ChargeBasis::compute(&rates, window)?;

        let coupon = match coupon_code {
            Some(code) => self.coupons.validate(code, basis.base_price).await?,
            None => None,
        };

        let breakdown = self.policy.quote(&rates, &basis, coupon);
        debug!(
            vehicle_id = %vehicle.id,
            subtotal = %breakdown.subtotal,
            total = %breakdown.total_amount,
            hourly = window.hourly,
            "Price calculated"
        );
        Ok(breakdown)
    }

    /// Re-price an existing booking over a new window from its rate
    /// snapshot. An applied coupon stays attached and its discount is
    /// recomputed against the new subtotal.
    pub async fn reprice(
        &self,
        booking: &Booking,
        window: &RentalWindow,
    ) -> DomainResult<PricingBreakdown> {
        let rates = Rates::from(booking);
        let basis = ChargeBasis::compute(&rates, window)?;
        let coupon = match booking.coupon_id {
            Some(id) => Some(
                self.coupons
                    .reapply(id, booking.coupon_discount, basis.base_price)
                    .await?,
            ),
            None => None,
        };
        Ok(self.policy.quote(&rates, &basis, coupon))
    }
}
