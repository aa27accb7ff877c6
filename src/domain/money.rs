use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Monetary amount held to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const TARGET_DECIMALS: u32 = 2;

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Rounds to cents, ties go to the even neighbour.
    pub fn new(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(
            Self::TARGET_DECIMALS,
            RoundingStrategy::MidpointNearestEven,
        );
        rounded.rescale(Self::TARGET_DECIMALS);
        Self(rounded)
    }

    pub fn from_major(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    pub fn from_decimal_str(s: &str) -> Option<Self> {
        parse_decimal(s).map(Self::new)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `None` on `Decimal` overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Self::new)
    }

    /// Whether `value` fits in cents without rounding.
    pub fn is_whole_cents(value: Decimal) -> bool {
        value.normalize().scale() <= Self::TARGET_DECIMALS
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// Uses the shortest decimal text of `value`, so 5000.01 stays 5000.01.
fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    parse_decimal(&value.to_string())
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Decimal {
        value.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// JSON clients expect plain numbers, e.g. `"balance": 295.5`.
impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Going through the decimal text gives the f64 nearest to the printed value.
        match self.to_string().parse::<f64>() {
            Ok(v) if v.is_finite() => serializer.serialize_f64(v),
            _ => serializer.serialize_str(&self.to_string()),
        }
    }
}

/// Reads a JSON/YAML number or a decimal string without rounding it.
struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("a decimal number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        decimal_from_f64(v).ok_or_else(|| E::custom(format!("Invalid Money value: {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        parse_decimal(v).ok_or_else(|| E::custom(format!("Invalid Money format: {}", v)))
    }
}

/// For `#[serde(deserialize_with)]` on amounts that must be checked before
/// they are rounded to cents.
pub fn deserialize_exact<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DecimalVisitor)
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_exact(deserializer).map(Money::new)
    }
}
