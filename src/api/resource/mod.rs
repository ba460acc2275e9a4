// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Resource quantities (e.g. "100m", "1Gi", "1e3").
//!
//! A [`Quantity`] is a fixed-point number with nano precision. Values are
//! compared, hashed and copied by value; the remembered [`Format`] only
//! affects how the canonical string is rendered.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// Largest power of ten that fits in an i128.
const MAX_POW10: u32 = 38;

/// Decimal SI suffixes ordered from largest to smallest exponent.
const DECIMAL_SUFFIXES: [(i32, &str); 10] = [
    (18, "E"),
    (15, "P"),
    (12, "T"),
    (9, "G"),
    (6, "M"),
    (3, "k"),
    (0, ""),
    (-3, "m"),
    (-6, "u"),
    (-9, "n"),
];

/// Binary SI suffixes ordered from largest to smallest power of 1024.
const BINARY_SUFFIXES: [(u32, &str); 6] = [
    (6, "Ei"),
    (5, "Pi"),
    (4, "Ti"),
    (3, "Gi"),
    (2, "Mi"),
    (1, "Ki"),
];

/// Format describes how a quantity is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Base 10 with SI suffixes (m, k, M, G, ...).
    #[default]
    DecimalSI,
    /// Base 2 with binary suffixes (Ki, Mi, Gi, ...).
    BinarySI,
    /// Base 10 with an explicit exponent (e3, e-6, ...).
    DecimalExponent,
}

/// QuantityParseError describes why a string is not a valid quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityParseError {
    #[error("quantities must not be empty")]
    Empty,

    #[error("quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'")]
    InvalidFormat,

    #[error("unable to parse quantity's suffix: {0:?}")]
    InvalidSuffix(String),

    #[error("quantity is too large")]
    TooLarge,
}

/// Quantity is a fixed-point representation of a number.
#[derive(Clone, Default)]
pub struct Quantity {
    nanos: i128,
    format: Format,
}

enum Multiplier {
    Decimal(i32),
    Binary(u32),
}

impl Quantity {
    /// Parse a quantity string such as "4", "100m", "1.5Gi" or "1e3".
    pub fn parse(s: &str) -> Result<Self, QuantityParseError> {
        if s.is_empty() {
            return Err(QuantityParseError::Empty);
        }

        let (negative, unsigned) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let int_end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        let int_part = &unsigned[..int_end];
        let mut rest = &unsigned[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(QuantityParseError::InvalidFormat);
        }

        let (format, multiplier) = parse_suffix(rest)?;
        let magnitude = magnitude_nanos(int_part, frac_part, multiplier)?;

        Ok(Quantity {
            nanos: if negative { -magnitude } else { magnitude },
            format,
        })
    }

    /// Create a quantity holding a whole number of units.
    pub fn new(value: i64, format: Format) -> Self {
        Quantity {
            nanos: i128::from(value) * NANOS_PER_UNIT,
            format,
        }
    }

    /// Create a quantity from a number of thousandths of a unit.
    pub fn new_milli(value: i64, format: Format) -> Self {
        Quantity {
            nanos: i128::from(value) * 1_000_000,
            format,
        }
    }

    /// Returns -1, 0 or 1 depending on the sign of the quantity.
    pub fn sign(&self) -> i32 {
        match self.nanos.cmp(&0) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Returns true if the quantity has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.nanos % NANOS_PER_UNIT == 0
    }

    fn write_decimal(&self, f: &mut fmt::Formatter<'_>, exponent_form: bool) -> fmt::Result {
        for (exponent, suffix) in DECIMAL_SUFFIXES {
            let divisor = 10i128.pow((exponent + 9) as u32);
            if self.nanos % divisor == 0 {
                let mantissa = self.nanos / divisor;
                return if exponent_form && exponent != 0 {
                    write!(f, "{}e{}", mantissa, exponent)
                } else if exponent_form {
                    write!(f, "{}", mantissa)
                } else {
                    write!(f, "{}{}", mantissa, suffix)
                };
            }
        }
        // Every value is a whole number of nanos, so the last suffix always matches.
        write!(f, "{}n", self.nanos)
    }
}

fn parse_suffix(suffix: &str) -> Result<(Format, Multiplier), QuantityParseError> {
    if let Some((exponent, _)) = DECIMAL_SUFFIXES.iter().find(|(_, s)| *s == suffix) {
        return Ok((Format::DecimalSI, Multiplier::Decimal(*exponent)));
    }
    if let Some((power, _)) = BINARY_SUFFIXES.iter().find(|(_, s)| *s == suffix) {
        return Ok((Format::BinarySI, Multiplier::Binary(*power)));
    }
    if let Some(exponent) = suffix.strip_prefix(['e', 'E']) {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let exponent: i32 = exponent
                .parse()
                .map_err(|_| QuantityParseError::TooLarge)?;
            return Ok((Format::DecimalExponent, Multiplier::Decimal(exponent)));
        }
    }
    Err(QuantityParseError::InvalidSuffix(suffix.to_string()))
}

/// Computes the absolute value in nanos, rounding sub-nano fractions up.
fn magnitude_nanos(
    int_part: &str,
    frac_part: &str,
    multiplier: Multiplier,
) -> Result<i128, QuantityParseError> {
    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');
    if int_part.len() + frac_part.len() > MAX_POW10 as usize {
        return Err(QuantityParseError::TooLarge);
    }

    let mut mantissa: i128 = 0;
    for digit in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(digit - b'0')))
            .ok_or(QuantityParseError::TooLarge)?;
    }
    let scale = frac_part.len() as i32;

    match multiplier {
        Multiplier::Decimal(exponent) => {
            let shift = exponent
                .checked_add(9)
                .and_then(|e| e.checked_sub(scale))
                .ok_or(QuantityParseError::TooLarge)?;
            scale_pow10(mantissa, shift)
        }
        Multiplier::Binary(power) => {
            let factor = 1024i128.pow(power);
            let scaled = mantissa
                .checked_mul(factor)
                .ok_or(QuantityParseError::TooLarge)?;
            scale_pow10(scaled, 9 - scale)
        }
    }
}

fn scale_pow10(value: i128, shift: i32) -> Result<i128, QuantityParseError> {
    if shift >= 0 {
        let factor = 10i128
            .checked_pow(shift as u32)
            .ok_or(QuantityParseError::TooLarge)?;
        return value.checked_mul(factor).ok_or(QuantityParseError::TooLarge);
    }
    let shift = shift.unsigned_abs();
    if shift > MAX_POW10 {
        return Ok(if value == 0 { 0 } else { 1 });
    }
    Ok(ceil_div(value, 10i128.pow(shift)))
}

fn ceil_div(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    if value % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return write!(f, "0");
        }
        match self.format {
            Format::BinarySI if self.is_integer() => {
                let units = self.nanos / NANOS_PER_UNIT;
                if units.abs() < 1024 {
                    return write!(f, "{}", units);
                }
                for (power, suffix) in BINARY_SUFFIXES {
                    let divisor = 1024i128.pow(power);
                    if units % divisor == 0 {
                        return write!(f, "{}{}", units / divisor, suffix);
                    }
                }
                self.write_decimal(f, false)
            }
            Format::BinarySI | Format::DecimalSI => self.write_decimal(f, false),
            Format::DecimalExponent => self.write_decimal(f, true),
        }
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a quantity string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                Quantity::parse(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                Ok(Quantity::new(v, Format::DecimalSI))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                Quantity::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                Quantity::parse(&v.to_string()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}
