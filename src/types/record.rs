//! Commodity record types

use super::ConversionError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A price as it arrives from a scrape or a stored file.
///
/// Scraped prices are noisy ("N/A", blanks, stray text), so the value is
/// classified once at the ingestion boundary instead of being coerced later.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceInput {
    /// A finite number
    Numeric(f64),
    /// Anything else, kept verbatim for auditing
    Malformed(String),
}

impl PriceInput {
    /// Classify a raw text value. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Numeric(value),
            _ => Self::Malformed(raw.to_string()),
        }
    }

    /// An absent price (empty cell, JSON null)
    pub fn missing() -> Self {
        Self::Malformed(String::new())
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Malformed(_) => None,
        }
    }
}

impl Default for PriceInput {
    fn default() -> Self {
        Self::missing()
    }
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Numeric(value)
        } else {
            Self::Malformed(value.to_string())
        }
    }
}

impl From<&str> for PriceInput {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Option<&str>> for PriceInput {
    fn from(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for PriceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{}", v),
            Self::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for PriceInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(v) => serializer.serialize_f64(*v),
            Self::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

struct PriceVisitor;

impl<'de> Visitor<'de> for PriceVisitor {
    type Value = PriceInput;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a string, or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::Malformed(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::from(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::from(v as f64))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::from(v as f64))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::from(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::parse(v))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::missing())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<PriceInput, E> {
        Ok(PriceInput::missing())
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<PriceInput, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

impl<'de> Deserialize<'de> for PriceInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// One traded good as produced by the commodity scrape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRecord {
    /// Market segment (e.g., "Agricultural", "Livestock")
    #[serde(default)]
    pub category: String,
    #[serde(alias = "trading_goods_name")]
    pub name: String,
    #[serde(default)]
    pub price: PriceInput,
    /// Raw currency label, not yet normalized
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub unit: String,
}

impl CommodityRecord {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        price: impl Into<PriceInput>,
        currency: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            price: price.into(),
            currency: currency.into(),
            unit: unit.into(),
        }
    }
}

/// A record after USD conversion, ready for a row sink.
///
/// Column order matches the `commodity_prices_usd` table, with the
/// canonical currency code appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedRecord {
    pub category: String,
    #[serde(rename = "trading_goods_name", alias = "name")]
    pub name: String,
    pub price: PriceInput,
    /// Raw currency label as received
    pub currency: String,
    pub unit: String,
    /// `None` means the price could not be converted; never written as 0
    pub converted_usd_price: Option<f64>,
    /// Batch capture date (`YYYYMMDD`)
    pub timestamp: String,
    pub currency_code: String,
    #[serde(skip)]
    pub failure: Option<ConversionError>,
}

impl ConvertedRecord {
    pub fn from_record(
        record: &CommodityRecord,
        currency_code: String,
        outcome: std::result::Result<f64, ConversionError>,
        timestamp: &str,
    ) -> Self {
        let (converted_usd_price, failure) = match outcome {
            Ok(usd) => (Some(usd), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            category: record.category.clone(),
            name: record.name.clone(),
            price: record.price.clone(),
            currency: record.currency.clone(),
            unit: record.unit.clone(),
            converted_usd_price,
            timestamp: timestamp.to_string(),
            currency_code,
            failure,
        }
    }

    pub fn is_converted(&self) -> bool {
        self.converted_usd_price.is_some()
    }

    /// Table key: one row per good per capture date
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.timestamp)
    }
}
