use serde::{Deserialize, Serialize};
use thiserror::Error;

/// commodity-usd error types
#[derive(Error, Debug)]
pub enum CommodityError {
    /// Failed to interpret an input value
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV structure
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Snapshot directory holds no CSV file
    #[error("no CSV snapshot found in {}", .0.display())]
    NoSnapshot(std::path::PathBuf),

    /// Exchange-rate snapshot could not be loaded or fetched
    #[error("rates error: {0}")]
    Rates(String),

    /// Table store operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for commodity-usd
pub type Result<T> = std::result::Result<T, CommodityError>;

/// Reason a single record has no USD price.
///
/// These never abort a batch; the record is kept with an unknown price.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionError {
    #[error("price is not a finite number")]
    UnparsablePrice,

    #[error("currency is not USD and has no exchange rate")]
    UnresolvableCurrency,

    #[error("exchange rate is zero")]
    ZeroRate,

    #[error("converted price overflows to a non-finite number")]
    NonFiniteResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommodityError::Rates("no snapshot".into());
        assert_eq!(err.to_string(), "rates error: no snapshot");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CommodityError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_conversion_error_serializes_snake_case() {
        let json = serde_json::to_string(&ConversionError::UnresolvableCurrency).unwrap();
        assert_eq!(json, "\"unresolvable_currency\"");

        let json = serde_json::to_string(&ConversionError::NonFiniteResult).unwrap();
        assert_eq!(json, "\"non_finite_result\"");
    }
}
