//! USD conversion of commodity records
//!
//! Pure functions: the rate table is only read, and a batch is a plain map
//! over its input that never drops or reorders records.

use super::normalizer::{normalize_currency, USD};
use super::rates::ExchangeRateTable;
use crate::config::TIMESTAMP_FORMAT;
use crate::types::{CommodityRecord, ConversionError, ConvertedRecord, PriceInput};
use chrono::{DateTime, Utc};

/// Convert a price in `currency` (already normalized) to USD.
///
/// Rates are units of the currency per one USD, so `usd = price / rate`.
/// A zero rate yields `ZeroRate` instead of a division, and a quotient
/// that overflows (tiny rate or huge price) yields `NonFiniteResult`.
pub fn convert_to_usd(
    price: &PriceInput,
    currency: &str,
    rates: &ExchangeRateTable,
) -> Result<f64, ConversionError> {
    let price = price.value().ok_or(ConversionError::UnparsablePrice)?;

    if currency == USD {
        return Ok(price);
    }

    match rates.get(currency) {
        Some(rate) if rate == 0.0 => Err(ConversionError::ZeroRate),
        Some(rate) => {
            let usd = price / rate;
            if usd.is_finite() {
                Ok(usd)
            } else {
                Err(ConversionError::NonFiniteResult)
            }
        }
        None => Err(ConversionError::UnresolvableCurrency),
    }
}

/// Format the batch capture stamp
pub fn batch_timestamp(captured_at: DateTime<Utc>) -> String {
    captured_at.format(TIMESTAMP_FORMAT).to_string()
}

/// Convert a batch captured now
pub fn convert_batch(
    records: &[CommodityRecord],
    rates: &ExchangeRateTable,
) -> Vec<ConvertedRecord> {
    convert_batch_at(records, rates, Utc::now())
}

/// Convert a batch with an explicit capture instant.
///
/// Every output row carries the same stamp, derived once from `captured_at`.
pub fn convert_batch_at(
    records: &[CommodityRecord],
    rates: &ExchangeRateTable,
    captured_at: DateTime<Utc>,
) -> Vec<ConvertedRecord> {
    let timestamp = batch_timestamp(captured_at);

    records
        .iter()
        .map(|record| {
            let code = normalize_currency(&record.currency);
            let outcome = convert_to_usd(&record.price, &code, rates);
            ConvertedRecord::from_record(record, code, outcome, &timestamp)
        })
        .collect()
}
