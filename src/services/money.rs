//! Decimal helpers for baht amounts. A missing amount is zero, never an error.
//!
//! Arithmetic is checked: an overflowing sum or product is a
//! `ValidationError`, never a panic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::ServiceError;

/// Scale interest is rounded to.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept by stored amounts and rates (`DECIMAL(18,4)` and
/// `DECIMAL(10,4)`).
pub const STORED_SCALE: u32 = 4;

/// Exclusive upper bound of a stored amount: 14 integer digits.
pub fn max_amount() -> Decimal {
    Decimal::new(100_000_000_000_000, 0)
}

/// Exclusive upper bound of a stored rate: 6 integer digits.
pub fn max_rate() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn out_of_range() -> ServiceError {
    ServiceError::ValidationError("amount out of range".to_string())
}

pub fn or_zero(amount: Option<Decimal>) -> Decimal {
    amount.unwrap_or(Decimal::ZERO)
}

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, ServiceError> {
    a.checked_add(b).ok_or_else(out_of_range)
}

/// Sums amounts, treating `None` as zero.
pub fn sum<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| checked_add(acc, or_zero(amount)))
}

/// Exact `units × rate`, or `None` unless both are present.
pub fn multiply(units: Option<i32>, rate: Option<Decimal>) -> Result<Option<Decimal>, ServiceError> {
    match (units, rate) {
        (Some(units), Some(rate)) => Decimal::from(units)
            .checked_mul(rate)
            .map(Some)
            .ok_or_else(out_of_range),
        _ => Ok(None),
    }
}

/// Rounds to satang, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × percent / 100 × months`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal, months: i32) -> Result<Decimal, ServiceError> {
    amount
        .checked_mul(percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|v| v.checked_mul(Decimal::from(months)))
        .ok_or_else(out_of_range)
}

pub fn ensure_non_negative(field: &str, amount: Option<Decimal>) -> Result<(), ServiceError> {
    match amount {
        Some(value) if value.is_sign_negative() && !value.is_zero() => Err(
            ServiceError::ValidationError(format!("{} must not be negative", field)),
        ),
        _ => Ok(()),
    }
}

pub fn ensure_non_negative_units(field: &str, units: Option<i32>) -> Result<(), ServiceError> {
    match units {
        Some(value) if value < 0 => Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        ))),
        _ => Ok(()),
    }
}

fn ensure_storable(field: &str, value: Option<Decimal>, limit: Decimal) -> Result<(), ServiceError> {
    ensure_non_negative(field, value)?;
    match value {
        Some(value) if value.normalize().scale() > STORED_SCALE => {
            Err(ServiceError::ValidationError(format!(
                "{} must have at most {} decimal places",
                field, STORED_SCALE
            )))
        }
        Some(value) if value >= limit => Err(ServiceError::ValidationError(format!(
            "{} is out of range",
            field
        ))),
        _ => Ok(()),
    }
}

/// Non-negative, at most four decimal places and within the amount columns.
pub fn ensure_amount(field: &str, amount: Option<Decimal>) -> Result<(), ServiceError> {
    ensure_storable(field, amount, max_amount())
}

/// Non-negative, at most four decimal places and within the rate columns.
pub fn ensure_rate(field: &str, rate: Option<Decimal>) -> Result<(), ServiceError> {
    ensure_storable(field, rate, max_rate())
}
