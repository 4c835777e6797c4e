//! Fixed-point decimal values.
//!
//! A `Decimal` is an unscaled 128-bit integer plus the precision and scale
//! it was declared with, so `3.50` as `decimal(10,2)` is stored as
//! `unscaled = 350, precision = 10, scale = 2`.

use std::fmt;
use std::str::FromStr;

use crate::constants::MAX_DECIMAL_PRECISION;
use crate::error::{ModelError, ModelResult};

/// A fixed-point decimal value with explicit precision and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: i128,
    precision: u8,
    scale: u8,
}

impl Decimal {
    /// Creates a decimal, checking that the digits fit the precision.
    pub fn new(unscaled: i128, precision: u8, scale: u8) -> ModelResult<Self> {
        if precision == 0
            || precision > MAX_DECIMAL_PRECISION
            || scale > precision
            || digit_count(unscaled) > precision
        {
            return Err(ModelError::DecimalPrecision { precision, scale });
        }
        Ok(Self {
            unscaled,
            precision,
            scale,
        })
    }

    /// Returns the unscaled integer value.
    #[inline]
    pub const fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Returns the declared precision.
    #[inline]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the declared scale.
    #[inline]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Converts to the given precision and scale without losing digits.
    ///
    /// Returns `None` if reducing the scale would round, or if the result
    /// does not fit the target precision.
    pub fn rescale(&self, precision: u8, scale: u8) -> Option<Self> {
        let unscaled = if scale >= self.scale {
            let factor = 10i128.checked_pow(u32::from(scale - self.scale))?;
            self.unscaled.checked_mul(factor)?
        } else {
            let factor = 10i128.checked_pow(u32::from(self.scale - scale))?;
            if self.unscaled % factor != 0 {
                return None;
            }
            self.unscaled / factor
        };
        Self::new(unscaled, precision, scale).ok()
    }

    /// Lossy conversion to a float, for display and metrics.
    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(i32::from(self.scale))
    }
}

/// Number of base-10 digits of the magnitude; zero has one digit.
fn digit_count(value: i128) -> u8 {
    let mut magnitude = value.unsigned_abs();
    let mut digits = 1u8;
    while magnitude >= 10 {
        magnitude /= 10;
        digits += 1;
    }
    digits
}

impl FromStr for Decimal {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidDecimal {
            input: s.to_string(),
        };

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let scale = u8::try_from(frac_part.len()).map_err(|_| invalid())?;
        let mut unscaled: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(b - b'0')))
                .ok_or_else(invalid)?;
        }
        if negative {
            unscaled = -unscaled;
        }

        let precision = digit_count(unscaled).max(scale).max(1);
        Self::new(unscaled, precision, scale)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let divisor = 10u128.pow(u32::from(self.scale));
        let magnitude = self.unscaled.unsigned_abs();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0>width$}",
            sign,
            magnitude / divisor,
            magnitude % divisor,
            width = self.scale as usize
        )
    }
}
