//! Exact decimal prices and their en-US dollar rendering.
//!
//! [`Price`] keeps the exact decimal value handed to it (a string from markup,
//! whole cents, or an `f64`) and only rounds when rendered. Rendering matches
//! `Intl.NumberFormat("en-US", { style: "currency", currency: "USD" })`: two
//! fraction digits, comma grouping, half-away-from-zero rounding, and a
//! leading minus before the symbol.
//!
//! [`format_price`] rounds the shortest decimal that reads back as the same
//! `f64`, so `1.005` renders as `$1.01` even though the stored double is
//! slightly below it.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::{Error, Result};

const CURRENCY_SYMBOL: char = '$';
const FRACTION_DIGITS: u32 = 2;

/// A decimal amount `magnitude * 10^-scale`, with its own sign so that
/// negative zero survives.
///
/// Equality is representational: `1.0` and `1.00` are different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    negative: bool,
    magnitude: BigUint,
    scale: u32,
}

impl Price {
    pub fn new(unscaled: impl Into<BigInt>, scale: u32) -> Self {
        let (sign, magnitude) = unscaled.into().into_parts();
        Self {
            negative: sign == Sign::Minus,
            magnitude,
            scale,
        }
    }

    pub fn from_cents(cents: i64) -> Self {
        Self::new(cents, FRACTION_DIGITS)
    }

    /// The exact value of `value`, including the binary expansion error of
    /// literals such as `1.005`.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidPrice(value.to_string()));
        }

        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let exponent_bits = ((bits >> 52) & 0x7FF) as i32;
        let fraction_bits = bits & 0x000F_FFFF_FFFF_FFFF;

        let (mantissa, exponent) = if exponent_bits == 0 {
            (fraction_bits, -1074)
        } else {
            (fraction_bits | (1 << 52), exponent_bits - 1075)
        };

        let mantissa = BigUint::from(mantissa);
        let (magnitude, scale) = if exponent >= 0 {
            (mantissa << exponent as usize, 0)
        } else {
            // m * 2^-k == m * 5^k / 10^k
            let k = exponent.unsigned_abs();
            (mantissa * BigUint::from(5u32).pow(k), k)
        };

        Ok(Self {
            negative,
            magnitude,
            scale,
        })
    }

    /// The shortest decimal that parses back to `value`, which is the number
    /// as written in source or markup (`1.005`, not `1.00499999...`).
    pub fn from_f64_shortest(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidPrice(value.to_string()));
        }
        // `Display` for f64 is shortest round-trip and never uses exponents.
        value.to_string().parse()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// The value in whole cents, rounding half away from zero.
    pub fn rounded_cents(&self) -> BigInt {
        let cents = self.rounded_cents_magnitude();
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, cents)
    }

    fn rounded_cents_magnitude(&self) -> BigUint {
        if self.scale <= FRACTION_DIGITS {
            return &self.magnitude * BigUint::from(10u32).pow(FRACTION_DIGITS - self.scale);
        }

        let divisor = BigUint::from(10u32).pow(self.scale - FRACTION_DIGITS);
        let quotient = &self.magnitude / &divisor;
        let remainder = &self.magnitude % &divisor;
        if remainder * 2u32 >= divisor {
            quotient + BigUint::one()
        } else {
            quotient
        }
    }

    /// Renders the amount as en-US dollars, e.g. `$1,234.50` or `-$3.00`.
    pub fn format_usd(&self) -> String {
        let cents = self.rounded_cents_magnitude();
        let hundred = BigUint::from(100u32);
        let dollars = (&cents / &hundred).to_str_radix(10);
        let fraction = (&cents % &hundred).to_str_radix(10);

        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        out.push(CURRENCY_SYMBOL);
        out.push_str(&group_thousands(&dollars));
        out.push('.');
        if fraction.len() < FRACTION_DIGITS as usize {
            out.push('0');
        }
        out.push_str(&fraction);
        out
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

impl From<i64> for Price {
    fn from(dollars: i64) -> Self {
        Self::new(dollars, 0)
    }
}

impl TryFrom<f64> for Price {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value)
    }
}

impl FromStr for Price {
    type Err = Error;

    /// Accepts plain decimal notation: optional sign, digits, optional
    /// fraction (`12`, `-0.5`, `1234.567`, `.99`).
    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || Error::InvalidPrice(raw.to_string());
        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{integer}{fraction}");
        let magnitude = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
        let scale = u32::try_from(fraction.len()).map_err(|_| invalid())?;
        Ok(Self {
            negative,
            magnitude,
            scale,
        })
    }
}

impl fmt::Display for Price {
    /// Plain decimal notation with the stored scale.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude.to_str_radix(10);
        let scale = self.scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        if self.negative {
            f.write_str("-")?;
        }
        let (integer, fraction) = padded.split_at(padded.len() - scale);
        f.write_str(integer)?;
        if scale > 0 {
            write!(f, ".{fraction}")?;
        }
        Ok(())
    }
}

/// Formats a number as en-US dollars. Non-finite inputs render the way the
/// platform formatter renders them (`$NaN`, `$∞`, `-$∞`).
pub fn format_price(value: f64) -> String {
    if value.is_nan() {
        return format!("{CURRENCY_SYMBOL}NaN");
    }
    if value.is_infinite() {
        let sign = if value.is_sign_negative() { "-" } else { "" };
        return format!("{sign}{CURRENCY_SYMBOL}∞");
    }
    match Price::from_f64_shortest(value) {
        Ok(price) => price.format_usd(),
        Err(_) => format!("{CURRENCY_SYMBOL}NaN"),
    }
}
