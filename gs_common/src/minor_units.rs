use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "inr";

//--------------------------------------     MinorUnits      ---------------------------------------------------------
/// An amount of money expressed in the smallest unit of its currency (paise, cents, ...).
///
/// Prices are stored and summed as integers, so `amount = round(subtotal * 100)` in major units is exactly the
/// wrapped value, and no floating point rounding ever enters an order total.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Mul<i64> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MinorUnits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MinorUnits {}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MinorUnitsConversionError(format!("Value {value} is too large to convert to MinorUnits")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `self * rhs`, or `None` if the result does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sums `iter`, or returns `None` as soon as the running total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(iter: I) -> Option<Self> {
        iter.into_iter().try_fold(Self::default(), Self::checked_add)
    }
}
