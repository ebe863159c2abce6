use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// A non-negative amount with two decimal places, held as integer cents.
///
/// Serializes as a JSON number (`10.0`) and accepts either a number or a
/// decimal string (`"10.00"`) on input. Values are rounded to the nearest cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn from_decimal(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err("price must be a finite number".to_string());
        }
        if value < 0.0 {
            return Err("price cannot be negative".to_string());
        }
        let cents = (value * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err("price is too large".to_string());
        }
        Ok(Self(cents as i64))
    }

    #[must_use]
    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Emitted as a JSON number (`10.0`), not a fixed-point string like `"10.00"`.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match RawPrice::deserialize(deserializer)? {
            RawPrice::Number(n) => n,
            RawPrice::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("invalid price '{s}'")))?,
        };
        Price::from_decimal(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_number_and_string() {
        let a: Price = serde_json::from_str("10.5").unwrap();
        let b: Price = serde_json::from_str("\"10.50\"").unwrap();
        let c: Price = serde_json::from_str("10").unwrap();
        assert_eq!(a, Price::from_cents(1050));
        assert_eq!(a, b);
        assert_eq!(c.cents(), 1000);
    }

    #[test]
    fn test_price_rounds_to_cents() {
        let p: Price = serde_json::from_str("19.999").unwrap();
        assert_eq!(p.cents(), 2000);
        let p: Price = serde_json::from_str("0.125").unwrap();
        assert_eq!(p.cents(), 13);
    }

    #[test]
    fn test_price_rejects_negative_and_garbage() {
        assert!(serde_json::from_str::<Price>("-1").is_err());
        assert!(serde_json::from_str::<Price>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Price>("true").is_err());
    }

    #[test]
    fn test_price_display_and_serialize() {
        let p = Price::from_cents(1005);
        assert_eq!(p.to_string(), "10.05");
        assert_eq!(serde_json::to_string(&p).unwrap(), "10.05");
        assert_eq!(serde_json::to_string(&Price::from_cents(1000)).unwrap(), "10.0");
    }
}
