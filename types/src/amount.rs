//! Credit amount type.
//!
//! Credits are whole, non-negative units. Every balance field of a ledger
//! account is a `Credits`, so a negative balance is unrepresentable and any
//! subtraction that would go below zero surfaces as `None` from the checked
//! helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// A quantity of credits.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Credits(u64);

impl Credits {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Credits {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, c| acc + c)
    }
}

impl From<u64> for Credits {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sub_refuses_to_go_negative() {
        assert_eq!(Credits::new(5).checked_sub(Credits::new(6)), None);
        assert_eq!(
            Credits::new(150).checked_sub(Credits::new(50)),
            Some(Credits::new(100))
        );
    }

    #[test]
    fn checked_mul_detects_overflow() {
        assert_eq!(Credits::new(u64::MAX).checked_mul(2), None);
        assert_eq!(Credits::new(20).checked_mul(5), Some(Credits::new(100)));
    }

    #[test]
    fn sum_of_credits() {
        let total: Credits = [10, 20, 30].into_iter().map(Credits::new).sum();
        assert_eq!(total, Credits::new(60));
    }
}
