//! Conversion between human-readable token amounts and integer base units
//!
//! Amounts are `rust_decimal::Decimal` on the human side and decimal digit
//! strings on the wire side; scaling is done in integer arithmetic so no binary
//! floating point ever touches a value that backs a transfer.

use crate::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

fn pow10(exp: u32) -> Result<u128> {
    10u128
        .checked_pow(exp)
        .ok_or_else(|| Error::InvalidAmount(format!("10^{} exceeds the supported range", exp)))
}

/// Convert a human amount into a base-unit digit string
///
/// Digits below the token's precision are truncated.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount(format!(
            "{} is negative; amounts must be non-negative",
            amount
        )));
    }

    let mantissa = amount.mantissa().unsigned_abs();
    let scale = amount.scale();

    let raw = if scale <= decimals {
        mantissa.checked_mul(pow10(decimals - scale)?).ok_or_else(|| {
            Error::InvalidAmount(format!(
                "{} overflows base units at {} decimals",
                amount, decimals
            ))
        })?
    } else {
        mantissa / pow10(scale - decimals)?
    };

    Ok(raw.to_string())
}

/// Convert a base-unit digit string back into a human amount
///
/// Values with more significant digits than `Decimal` can carry lose their
/// lowest digits.
pub fn from_base_units(raw: &str, decimals: u32) -> Result<Decimal> {
    let trimmed = raw.trim();
    let value: u128 = trimmed
        .parse()
        .map_err(|_| Error::InvalidAmount(format!("'{}' is not a base-unit integer", raw)))?;
    let mut value = i128::try_from(value)
        .map_err(|_| Error::InvalidAmount(format!("'{}' exceeds the supported range", raw)))?;

    let mut scale = decimals;
    loop {
        match Decimal::try_from_i128_with_scale(value, scale) {
            Ok(amount) => return Ok(amount.normalize()),
            Err(_) if scale > 0 => {
                value /= 10;
                scale -= 1;
            }
            Err(e) => {
                return Err(Error::InvalidAmount(format!(
                    "'{}' cannot be represented: {}",
                    raw, e
                )))
            }
        }
    }
}

/// Parse a user-supplied decimal amount
pub fn parse_amount(input: &str) -> Result<Decimal> {
    Decimal::from_str(input.trim())
        .or_else(|_| Decimal::from_scientific(input.trim()))
        .map_err(|_| Error::InvalidAmount(format!("'{}' is not a decimal number", input)))
}

/// Negate a base-unit digit string for the input side of a token diff
pub fn negate_base_units(raw: &str) -> String {
    if raw == "0" {
        raw.to_string()
    } else {
        format!("-{}", raw)
    }
}
