use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

/// currency precision used for every stored amount
pub const MONEY_DP: u32 = 2;

/// round to currency precision, half away from zero
///
/// every arithmetic step on `Money` goes through here so that repeated
/// payments never accumulate sub-cent drift.
pub fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Money type with 2 decimal places (cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// tolerance used when comparing cumulative totals against caps
    pub const EPSILON: Money = Money::CENT;

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(round2(d))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(round2(Decimal::from_str(s)?)))
    }

    /// create from integer amount (dollars, shillings, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from cents
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_DP))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// amount in cents, `None` when it does not fit an `i64`
    pub fn to_cents(&self) -> Option<i64> {
        let cents = self.0.checked_mul(Decimal::ONE_HUNDRED)?;
        i64::try_from(cents.trunc()).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// subtraction floored at zero
    pub fn saturating_sub(self, other: Self) -> Self {
        (self - other).max(Money::ZERO)
    }

    /// true when `self` reaches `target` within one cent
    pub fn reaches(&self, target: Money) -> bool {
        self.0 >= target.0 - Money::EPSILON.0
    }

    /// share of this amount at the given rate (e.g. 0.0909 of 200)
    pub fn share(&self, rate: Rate) -> Self {
        Money(round2(self.0 * rate.as_decimal()))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(|d| Money(round2(d)))
    }

    /// `share` that reports overflow instead of panicking
    pub fn checked_share(&self, rate: Rate) -> Option<Self> {
        self.0.checked_mul(rate.as_decimal()).map(|d| Money(round2(d)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(round2(self.0 + other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = round2(self.0 + other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(round2(self.0 - other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = round2(self.0 - other.0);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money(round2(self.0 * other))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// rate type for interest rates, shares and ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.10 for 10%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 10 for 10%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::ONE_HUNDRED)
    }

    /// ratio of two amounts, zero when the denominator is zero
    pub fn ratio(numerator: Money, denominator: Money) -> Self {
        if denominator.is_zero() {
            return Rate::ZERO;
        }
        Rate(numerator.as_decimal() / denominator.as_decimal())
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.125").unwrap();
        assert_eq!(m.to_string(), "100.13"); // half rounds away from zero

        let m = Money::from_str_exact("100.124").unwrap();
        assert_eq!(m.to_string(), "100.12");
    }

    #[test]
    fn test_round2_is_half_up_not_bankers() {
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
        assert_eq!(round2(dec!(0.135)), dec!(0.14));
        assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn test_cents() {
        assert_eq!(Money::from_cents(1), Money::CENT);
        assert_eq!(Money::from_cents(110_000), Money::from_major(1_100));
        assert_eq!(Money::from_str_exact("18.18").unwrap().to_cents(), Some(1818));
        assert_eq!(Money::from_decimal(Decimal::MAX).to_cents(), None);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let max = Money::from_decimal(Decimal::MAX);

        assert_eq!(max.checked_add(Money::ONE), None);
        assert_eq!(Money::ONE.checked_add(Money::CENT), Some(Money::from(dec!(1.01))));
        assert_eq!(
            Money::from_major(1_000).checked_share(Rate::from_percentage(10)),
            Some(Money::from_major(100))
        );
        assert_eq!(max.checked_share(Rate::from_decimal(dec!(2))), None);
    }

    #[test]
    fn test_flat_interest_share() {
        let share = Rate::ratio(Money::from_major(100), Money::from_major(1_100));

        assert_eq!(Money::from_major(200).share(share), Money::from(dec!(18.18)));
        assert_eq!(Money::from_major(300).share(share), Money::from(dec!(27.27)));
        assert_eq!(Money::from_major(500).share(share), Money::from(dec!(45.45)));
    }

    #[test]
    fn test_reaches_within_tolerance() {
        let target = Money::from_major(100);

        assert!(Money::from(dec!(99.99)).reaches(target));
        assert!(Money::from_major(100).reaches(target));
        assert!(!Money::from(dec!(99.98)).reaches(target));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let small = Money::from_major(5);
        let large = Money::from_major(8);

        assert_eq!(small.saturating_sub(large), Money::ZERO);
        assert_eq!(large.saturating_sub(small), Money::from_major(3));
    }

    #[test]
    fn test_ratio_of_zero_denominator() {
        assert_eq!(Rate::ratio(Money::ONE, Money::ZERO), Rate::ZERO);
    }
}
