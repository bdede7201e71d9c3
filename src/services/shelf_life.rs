//! Remaining shelf-life percentage and the `"min-max"` acceptance window.

use crate::errors::ServiceError;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Percentage of total shelf life still left on `today`, in `0..=100`.
///
/// Zero when either date is missing, when the lot is past expiry, or when the
/// expiry does not come after manufacture. Halves round to even.
pub fn shelf_life_percent(
    mfg_date: Option<NaiveDate>,
    exp_date: Option<NaiveDate>,
    today: NaiveDate,
) -> u32 {
    let (Some(mfg), Some(exp)) = (mfg_date, exp_date) else {
        return 0;
    };
    if today > exp {
        return 0;
    }

    let total_days = (exp - mfg).num_days();
    if total_days <= 0 {
        return 0;
    }
    let remaining_days = (exp - today).num_days();

    let percent = (Decimal::from(remaining_days) * Decimal::ONE_HUNDRED / Decimal::from(total_days))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

    // Manufacture dates in the future push the ratio past 100.
    percent.min(Decimal::ONE_HUNDRED).to_u32().unwrap_or(0)
}

/// Inclusive shelf-life bounds a lot must fall within to be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShelfLifeWindow {
    pub min_pct: u32,
    pub max_pct: u32,
}

impl ShelfLifeWindow {
    /// Accepts every lot, including ones without dates.
    pub const ANY: ShelfLifeWindow = ShelfLifeWindow {
        min_pct: 0,
        max_pct: 100,
    };

    pub fn contains(&self, percent: u32) -> bool {
        self.min_pct <= percent && percent <= self.max_pct
    }
}

impl FromStr for ShelfLifeWindow {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            ServiceError::ParseError(format!(
                "shelf-life window '{}' must look like 'min-max' (e.g. '60-100')",
                raw
            ))
        };

        let (min, max) = raw.trim().split_once('-').ok_or_else(malformed)?;
        let min_pct: u32 = min.trim().parse().map_err(|_| malformed())?;
        let max_pct: u32 = max.trim().parse().map_err(|_| malformed())?;

        if min_pct > max_pct {
            return Err(ServiceError::ParseError(format!(
                "shelf-life window '{}' has min above max",
                raw
            )));
        }

        Ok(ShelfLifeWindow { min_pct, max_pct })
    }
}

impl fmt::Display for ShelfLifeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min_pct, self.max_pct)
    }
}
