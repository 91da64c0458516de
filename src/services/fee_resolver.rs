//! Per-category amounts from explicit overrides, the lease and the room.
//!
//! Precedence for every category is explicit value first, then the derived
//! value, then zero (or `None` for metered utilities).

use rust_decimal::Decimal;

use crate::entities::{lease, room};
use crate::errors::ServiceError;
use crate::services::money::{self, ensure_amount, ensure_non_negative_units, ensure_rate};

/// Caller-supplied values that take precedence over derived ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeOverrides {
    pub rent_baht: Option<Decimal>,
    pub electricity_units: Option<i32>,
    pub electricity_rate: Option<Decimal>,
    pub electricity_baht: Option<Decimal>,
    pub water_units: Option<i32>,
    pub water_rate: Option<Decimal>,
    pub water_baht: Option<Decimal>,
    pub other_baht: Option<Decimal>,
    pub common_fee_baht: Option<Decimal>,
    pub garbage_fee_baht: Option<Decimal>,
    /// Fall back to the room's flat common fee when no override is given
    pub include_common_fee: bool,
    /// Fall back to the room's flat garbage fee when no override is given
    pub include_garbage_fee: bool,
}

impl FeeOverrides {
    fn validate(&self) -> Result<(), ServiceError> {
        ensure_amount("rent_baht", self.rent_baht)?;
        ensure_non_negative_units("electricity_units", self.electricity_units)?;
        ensure_rate("electricity_rate", self.electricity_rate)?;
        ensure_amount("electricity_baht", self.electricity_baht)?;
        ensure_non_negative_units("water_units", self.water_units)?;
        ensure_rate("water_rate", self.water_rate)?;
        ensure_amount("water_baht", self.water_baht)?;
        ensure_amount("other_baht", self.other_baht)?;
        ensure_amount("common_fee_baht", self.common_fee_baht)?;
        ensure_amount("garbage_fee_baht", self.garbage_fee_baht)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFees {
    pub rent_baht: Decimal,
    pub electricity_units: Option<i32>,
    pub electricity_rate: Option<Decimal>,
    pub electricity_baht: Option<Decimal>,
    pub water_units: Option<i32>,
    pub water_rate: Option<Decimal>,
    pub water_baht: Option<Decimal>,
    pub other_baht: Decimal,
    pub common_fee_baht: Decimal,
    pub garbage_fee_baht: Decimal,
}

impl ResolvedFees {
    /// Sum of every category except maintenance.
    pub fn subtotal(&self) -> Result<Decimal, ServiceError> {
        money::sum([
            Some(self.rent_baht),
            self.electricity_baht,
            self.water_baht,
            Some(self.other_baht),
            Some(self.common_fee_baht),
            Some(self.garbage_fee_baht),
        ])
    }
}

fn flat_fee(explicit: Option<Decimal>, include: bool, room_fee: Decimal) -> Decimal {
    match explicit {
        Some(amount) => amount,
        None if include => room_fee,
        None => Decimal::ZERO,
    }
}

/// Resolves the final amounts for one invoice.
///
/// `lease` must be the lease active on the issue date, if any.
pub fn resolve_fees(
    room: &room::Model,
    lease: Option<&lease::Model>,
    overrides: &FeeOverrides,
) -> Result<ResolvedFees, ServiceError> {
    overrides.validate()?;

    let rent_baht = overrides
        .rent_baht
        .or_else(|| lease.map(|l| l.monthly_rent))
        .unwrap_or(Decimal::ZERO);

    let electricity_baht = match overrides.electricity_baht {
        Some(amount) => Some(amount),
        None => money::multiply(overrides.electricity_units, overrides.electricity_rate)?,
    };
    let water_baht = match overrides.water_baht {
        Some(amount) => Some(amount),
        None => money::multiply(overrides.water_units, overrides.water_rate)?,
    };
    ensure_amount("electricity_baht", electricity_baht)?;
    ensure_amount("water_baht", water_baht)?;

    Ok(ResolvedFees {
        rent_baht,
        electricity_units: overrides.electricity_units,
        electricity_rate: overrides.electricity_rate,
        electricity_baht,
        water_units: overrides.water_units,
        water_rate: overrides.water_rate,
        water_baht,
        other_baht: money::or_zero(overrides.other_baht),
        common_fee_baht: flat_fee(
            overrides.common_fee_baht,
            overrides.include_common_fee,
            room.common_fee_baht,
        ),
        garbage_fee_baht: flat_fee(
            overrides.garbage_fee_baht,
            overrides.include_garbage_fee,
            room.garbage_fee_baht,
        ),
    })
}
