//! Fixed-precision decimal arithmetic.
//!
//! Every monetary or quantity field in the engine is a [`Dec`]. The type wraps
//! `rust_decimal::Decimal` and centralizes the rounding-mode choice so call
//! sites never pick a rounding mode ad hoc: the process uses banker's
//! rounding (`MidpointEven`) everywhere a value is rescaled.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// The single rounding mode used everywhere in the engine.
const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointEven;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dec(Decimal);

impl Dec {
    pub const ZERO: Dec = Dec(Decimal::ZERO);
    pub const ONE: Dec = Dec(Decimal::ONE);

    pub fn zero() -> Dec {
        Dec::ZERO
    }

    pub fn one() -> Dec {
        Dec::ONE
    }

    /// Parse a string to a `Dec`, rescaling to `prec` digits after the point.
    /// Values that do not parse as a decimal fail; values are always rescaled
    /// with the process rounding mode, never truncated silently.
    pub fn parse(s: &str, prec: u32) -> Result<Dec, ParseDecError> {
        let raw = Decimal::from_str(s).map_err(|_| ParseDecError(s.to_string()))?;
        Ok(Dec(raw.round_dp_with_strategy(prec, ROUNDING)))
    }

    pub fn from_decimal(d: Decimal) -> Dec {
        Dec(d)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Dec {
        Dec(self.0.abs())
    }

    pub fn checked_add(&self, other: Dec) -> Option<Dec> {
        self.0.checked_add(other.0).map(Dec)
    }

    pub fn checked_sub(&self, other: Dec) -> Option<Dec> {
        self.0.checked_sub(other.0).map(Dec)
    }

    pub fn checked_mul(&self, other: Dec) -> Option<Dec> {
        self.0.checked_mul(other.0).map(Dec)
    }

    pub fn checked_div(&self, other: Dec) -> Option<Dec> {
        if other.is_zero() {
            return None;
        }
        self.0.checked_div(other.0).map(Dec)
    }

    /// Remainder, `self % modulus`.
    pub fn rem(&self, modulus: Dec) -> Dec {
        Dec(self.0 % modulus.0)
    }

    /// True when `self` is an exact multiple of `step` (used for tick-size checks).
    pub fn is_multiple_of(&self, step: Dec) -> bool {
        if step.is_zero() {
            return self.is_zero();
        }
        self.rem(step).is_zero()
    }

    /// Rescale to `prec` digits after the decimal point using the process
    /// rounding mode. `prec` is the count of digits kept, matching
    /// `rescale(x, -p)` in the source's convention.
    pub fn rescale(&self, prec: u32) -> Dec {
        Dec(self.0.round_dp_with_strategy(prec, ROUNDING))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Dec {
    type Output = Dec;
    fn add(self, rhs: Dec) -> Dec {
        Dec(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Dec {
    type Output = Dec;
    fn sub(self, rhs: Dec) -> Dec {
        Dec(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Dec {
    type Output = Dec;
    fn mul(self, rhs: Dec) -> Dec {
        Dec(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec(-self.0)
    }
}

impl From<i64> for Dec {
    fn from(v: i64) -> Dec {
        Dec(Decimal::from(v))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid decimal string: {0}")]
pub struct ParseDecError(pub String);
