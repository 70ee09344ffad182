//! Cancellation fee tiers

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fee charged for cancelling a booking of `total_amount` starting at
/// `start_date`, given the current instant.
///
/// | lead time      | fee  |
/// |----------------|------|
/// | >= 48h         | 0    |
/// | >= 24h, < 48h  | 25%  |
/// | < 24h          | 50%  |
pub fn cancellation_fee(
    now: DateTime<Utc>,
    start_date: DateTime<Utc>,
    total_amount: Decimal,
) -> Decimal {
    let lead = start_date - now;
    if lead >= Duration::hours(48) {
        return Decimal::ZERO;
    }
    let rate = if lead >= Duration::hours(24) {
        Decimal::new(25, 2)
    } else {
        Decimal::new(50, 2)
    };
    (total_amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Amount owed back to the customer once the fee is withheld
pub fn refund_amount(total_amount: Decimal, fee: Decimal) -> Decimal {
    (total_amount - fee).max(Decimal::ZERO)
}
