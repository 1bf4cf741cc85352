use super::{ConversionError, ConvertedRecord};
use serde::Serialize;
use std::fmt;

/// Outcome counts for one converted batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub timestamp: String,
    pub total: usize,
    pub converted: usize,
    pub unparsable_price: usize,
    pub unresolvable_currency: usize,
    pub zero_rate: usize,
    pub non_finite_result: usize,
    /// Rows accepted by the sink
    pub written: usize,
    pub records_source: String,
    pub rates_source: String,
}

impl BatchSummary {
    pub fn from_rows(rows: &[ConvertedRecord], timestamp: &str) -> Self {
        rows.iter().fold(
            Self {
                timestamp: timestamp.to_string(),
                ..Self::default()
            },
            |mut acc, row| {
                acc.total += 1;
                match row.failure {
                    None if row.is_converted() => acc.converted += 1,
                    None => {}
                    Some(ConversionError::UnparsablePrice) => acc.unparsable_price += 1,
                    Some(ConversionError::UnresolvableCurrency) => acc.unresolvable_currency += 1,
                    Some(ConversionError::ZeroRate) => acc.zero_rate += 1,
                    Some(ConversionError::NonFiniteResult) => acc.non_finite_result += 1,
                }
                acc
            },
        )
    }

    pub fn unknown(&self) -> usize {
        self.total - self.converted
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Converted {}/{} rows for batch {} using exchange file '{}' and data file '{}'",
            self.converted, self.total, self.timestamp, self.rates_source, self.records_source
        )?;
        if self.unknown() > 0 {
            write!(
                f,
                "; unknown: {} (unparsable price: {}, unresolvable currency: {}, zero rate: {}, overflow: {})",
                self.unknown(),
                self.unparsable_price,
                self.unresolvable_currency,
                self.zero_rate,
                self.non_finite_result
            )?;
        }
        write!(f, "; {} rows written", self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommodityRecord;

    fn row(outcome: std::result::Result<f64, ConversionError>) -> ConvertedRecord {
        let record = CommodityRecord::new("Agricultural", "Corn", "450", "USD", "Bu");
        ConvertedRecord::from_record(&record, "USD".into(), outcome, "20250501")
    }

    #[test]
    fn test_counts_by_outcome() {
        let rows = vec![
            row(Ok(450.0)),
            row(Ok(1.0)),
            row(Err(ConversionError::UnparsablePrice)),
            row(Err(ConversionError::UnresolvableCurrency)),
            row(Err(ConversionError::ZeroRate)),
            row(Err(ConversionError::NonFiniteResult)),
        ];

        let summary = BatchSummary::from_rows(&rows, "20250501");

        assert_eq!(summary.total, 6);
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.unknown(), 4);
        assert_eq!(summary.non_finite_result, 1);
        assert_eq!(summary.unparsable_price, 1);
        assert_eq!(summary.unresolvable_currency, 1);
        assert_eq!(summary.zero_rate, 1);
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_rows(&[], "20250501");
        assert_eq!(summary.total, 0);
        assert_eq!(summary.unknown(), 0);
    }

    #[test]
    fn test_display_mentions_sources() {
        let mut summary = BatchSummary::from_rows(&[row(Ok(450.0))], "20250501");
        summary.rates_source = "rates_20250501.csv".into();
        summary.records_source = "commodity_data_20250501.csv".into();
        summary.written = 1;

        let text = summary.to_string();
        assert!(text.contains("Converted 1/1 rows for batch 20250501"));
        assert!(text.contains("'rates_20250501.csv'"));
        assert!(!text.contains("unknown"));
        assert!(text.ends_with("1 rows written"));
    }
}
