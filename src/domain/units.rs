//! Energy and money newtypes backed by rust_decimal.
//!
//! Balancing and tariff energy arrives in kWh, wholesale energy and prices in
//! MWh; every conversion between the two scales lives on these types so the
//! accumulators never multiply raw numbers.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format a quantity with fixed three-decimal precision, rounding away from
/// zero on midpoints.
fn three_dp(value: Decimal) -> String {
    format!(
        "{:.3}",
        value.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Signed retail-side energy in kWh.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Kwh(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Kwh {
    pub fn new(value: Decimal) -> Self {
        Kwh(value)
    }

    pub fn zero() -> Self {
        Kwh(Decimal::ZERO)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True if the quantity is > 0 (surplus when read as an imbalance).
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// True if the quantity is < 0 (shortage when read as an imbalance).
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Kwh(self.0.abs())
    }

    /// Fixed three-decimal rendering for tabular output.
    pub fn to_3dp(&self) -> String {
        three_dp(self.0)
    }
}

impl std::ops::Add for Kwh {
    type Output = Kwh;
    fn add(self, rhs: Kwh) -> Kwh {
        Kwh(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Kwh {
    fn add_assign(&mut self, rhs: Kwh) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Kwh {
    type Output = Kwh;
    fn sub(self, rhs: Kwh) -> Kwh {
        Kwh(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Kwh {
    type Output = Kwh;
    fn neg(self) -> Kwh {
        Kwh(-self.0)
    }
}

impl fmt::Display for Kwh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed wholesale-side energy in MWh.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Mwh(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Mwh {
    pub fn new(value: Decimal) -> Self {
        Mwh(value)
    }

    pub fn zero() -> Self {
        Mwh(Decimal::ZERO)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Mwh(self.0.abs())
    }

    /// Convert to kWh (×1000).
    pub fn to_kwh(&self) -> Kwh {
        Kwh(self.0 * Decimal::ONE_THOUSAND)
    }

    pub fn to_3dp(&self) -> String {
        three_dp(self.0)
    }
}

impl std::ops::AddAssign for Mwh {
    fn add_assign(&mut self, rhs: Mwh) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Mwh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signed amount of currency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub fn new(value: Decimal) -> Self {
        Money(value)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_3dp(&self) -> String {
        three_dp(self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wholesale quote in currency per MWh, as carried by market transactions
/// and order-book entries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MwhPrice(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl MwhPrice {
    pub fn new(value: Decimal) -> Self {
        MwhPrice(value)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    /// Convert to a retail-scale unit price (÷1000).
    pub fn per_kwh(&self) -> UnitPrice {
        UnitPrice(self.0 / Decimal::ONE_THOUSAND)
    }

    /// Cost of a wholesale quantity at this quote.
    pub fn cost_for(&self, qty: Mwh) -> Money {
        Money(self.0 * qty.inner())
    }
}

impl fmt::Display for MwhPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A price in currency per kWh, the scale every output figure uses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UnitPrice(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl UnitPrice {
    pub fn new(value: Decimal) -> Self {
        UnitPrice(value)
    }

    pub fn zero() -> Self {
        UnitPrice(Decimal::ZERO)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Cost of a retail quantity at this price.
    pub fn cost_for(&self, qty: Kwh) -> Money {
        Money(self.0 * qty.inner())
    }

    pub fn to_3dp(&self) -> String {
        three_dp(self.0)
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
