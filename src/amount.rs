// Copyright (c) 2024 Botho Foundation

//! Arbitrary-precision coin amounts.
//!
//! Balances are non-negative decimals with a fixed fractional scale of
//! eight digits, stored as a count of 10^-8 units in a [`BigUint`].
//! Addition never loses precision and there is no saturation anywhere;
//! total-supply sums stay exact no matter how many wallets exist.
//!
//! The decimal string form is canonical (trailing fractional zeros are
//! trimmed, no decimal point when the fractional part is zero) and feeds
//! the per-wallet checksum, so it must stay deterministic.

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of fractional decimal digits carried by every amount.
pub const AMOUNT_SCALE: u32 = 8;

fn scale_factor() -> BigUint {
    BigUint::from(100_000_000u64)
}

/// A non-negative coin amount with eight fractional digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IxiAmount {
    units: BigUint,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount string: {0}")]
    Invalid(String),
}

impl IxiAmount {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    /// Build an amount from a raw count of 10^-8 units.
    pub fn from_units(units: BigUint) -> Self {
        Self { units }
    }

    /// Build an amount from a whole number of coins.
    pub fn from_whole(coins: u64) -> Self {
        Self {
            units: BigUint::from(coins) * scale_factor(),
        }
    }

    pub fn units(&self) -> &BigUint {
        &self.units
    }

    /// Subtraction; `None` when the result would be negative.
    pub fn checked_sub(&self, other: &IxiAmount) -> Option<IxiAmount> {
        if self.units < other.units {
            return None;
        }
        Some(Self {
            units: &self.units - &other.units,
        })
    }
}

impl Add for IxiAmount {
    type Output = IxiAmount;

    fn add(self, rhs: IxiAmount) -> IxiAmount {
        IxiAmount {
            units: self.units + rhs.units,
        }
    }
}

impl Add for &IxiAmount {
    type Output = IxiAmount;

    fn add(self, rhs: &IxiAmount) -> IxiAmount {
        IxiAmount {
            units: &self.units + &rhs.units,
        }
    }
}

impl AddAssign<&IxiAmount> for IxiAmount {
    fn add_assign(&mut self, rhs: &IxiAmount) {
        self.units += &rhs.units;
    }
}

impl fmt::Display for IxiAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factor = scale_factor();
        let whole = &self.units / &factor;
        let frac = &self.units % &factor;
        if frac.is_zero() {
            return write!(f, "{}", whole);
        }
        let mut frac_str = frac.to_string();
        while frac_str.len() < AMOUNT_SCALE as usize {
            frac_str.insert(0, '0');
        }
        write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

impl FromStr for IxiAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        let mut units = BigUint::from_str(int_part)
            .map_err(|_| AmountError::Invalid(s.to_string()))?
            * scale_factor();

        if let Some(frac) = frac_part {
            if frac.is_empty()
                || frac.len() > AMOUNT_SCALE as usize
                || !frac.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(AmountError::Invalid(s.to_string()));
            }
            let mut padded = frac.to_string();
            while padded.len() < AMOUNT_SCALE as usize {
                padded.push('0');
            }
            units += BigUint::from_str(&padded).map_err(|_| AmountError::Invalid(s.to_string()))?;
        }

        Ok(Self { units })
    }
}

impl Serialize for IxiAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IxiAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
