// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Numeric Rounding

//! Two-decimal rounding shared by every financial field.
//!
//! Values are converted to `Decimal` through their shortest decimal
//! representation, so `2.675_f64` rounds as the literal `2.675` and not as
//! its binary neighbour `2.67499999...`. Ties go away from zero.

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Number of decimal places every monetary and ratio field is finalized to.
pub const DECIMAL_PLACES: u32 = 2;

/// Anything smaller in magnitude than half a cent rounds to zero.
const HALF_CENT: f64 = 0.005;

/// Sentinel for a value that cannot be computed (division by zero).
pub const UNDEFINED: f64 = f64::NAN;

/// Round to two decimal places, half away from zero.
///
/// Non-finite input is returned unchanged so the undefined sentinel survives
/// every pass. Magnitudes outside the `Decimal` range are returned as-is.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if value.abs() < HALF_CENT {
        return 0.0;
    }
    match to_decimal(value) {
        Some(d) => from_decimal(
            d.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
        .unwrap_or(value),
        None => value,
    }
}

/// Whether a field holds the undefined sentinel.
pub fn is_undefined(value: f64) -> bool {
    value.is_nan()
}

/// Convert f64 to Decimal via its shortest round-trip text form.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Convert Decimal back to f64.
pub fn from_decimal(d: Decimal) -> Option<f64> {
    d.to_f64()
}
