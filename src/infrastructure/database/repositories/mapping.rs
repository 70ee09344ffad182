//! Column conversion helpers shared by the SeaORM repositories

use chrono::NaiveTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

const TIME_FORMAT: &str = "%H:%M:%S";

pub(super) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

/// Decimal amount to minor units
pub(super) fn to_cents(value: Decimal) -> DomainResult<i64> {
    (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| DomainError::InvalidInput(format!("Amount out of range: {}", value)))
}

pub(super) fn opt_to_cents(value: Option<Decimal>) -> DomainResult<Option<i64>> {
    value.map(to_cents).transpose()
}

pub(super) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub(super) fn parse_uuid(column: &str, raw: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| DomainError::Storage(format!("Corrupt {} '{}': {}", column, raw, e)))
}

pub(super) fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

pub(super) fn parse_time(column: &str, raw: Option<String>) -> DomainResult<Option<NaiveTime>> {
    raw.map(|s| {
        NaiveTime::parse_from_str(&s, TIME_FORMAT)
            .map_err(|e| DomainError::Storage(format!("Corrupt {} '{}': {}", column, s, e)))
    })
    .transpose()
}

/// Parse a stored enum column, reporting corruption as a storage error
pub(super) fn parse_enum<T>(column: &str, raw: &str) -> DomainResult<T>
where
    T: std::str::FromStr,
{
    raw.parse::<T>()
        .map_err(|_| DomainError::Storage(format!("Corrupt {} '{}'", column, raw)))
}
