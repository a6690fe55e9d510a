//! Conversions between monetary decimals and floating-point analytics.

use crate::Decimal;
use crate::types::error::{XRayError, XRayResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Converts a decimal to `f64` for use in return-series arithmetic.
///
/// # Errors
///
/// Returns `XRayError::Validation` if the value cannot be represented.
pub fn decimal_to_f64(value: Decimal) -> XRayResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| XRayError::Validation(format!("{} is not representable as f64", value)))
}

/// Converts an `f64` to a decimal.
///
/// # Errors
///
/// Returns `XRayError::Validation` for NaN, infinite or out-of-range values.
pub fn f64_to_decimal(value: f64) -> XRayResult<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| XRayError::Validation(format!("{} is not representable as a decimal", value)))
}
