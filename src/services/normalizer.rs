//! Currency label normalization
//!
//! Scraped currency labels arrive with inconsistent casing, padding and
//! decorations ("usd", "US$ (spot)", " EUR "). This reduces them to the
//! code used for rate lookups.

/// Canonical code for US dollars
pub const USD: &str = "USD";

/// Substrings that mark a label as US dollars
const USD_MARKERS: [&str; 2] = [USD, "US$"];

/// Normalize a raw currency label to its canonical code.
///
/// Transformations:
/// - Trim and uppercase: " eur " → "EUR"
/// - Any label containing "USD" or "US$" collapses to "USD":
///   "USD (approx)" → "USD", "US$ (spot)" → "USD"
///
/// The USD rule is a plain substring match and over-matches labels that
/// merely embed "USD" (e.g. "AUSD"). Nothing else is validated: unknown
/// codes pass through and fail later at rate lookup.
///
/// # Examples
/// ```
/// use commodity_usd::services::normalizer::normalize_currency;
///
/// assert_eq!(normalize_currency(" eur "), "EUR");
/// assert_eq!(normalize_currency("USd"), "USD");
/// ```
pub fn normalize_currency(raw: &str) -> String {
    let label = raw.trim().to_uppercase();
    if USD_MARKERS.iter().any(|marker| label.contains(marker)) {
        return USD.to_string();
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== USD absorption ==========

    #[test]
    fn test_usd_exact() {
        assert_eq!(normalize_currency("USD"), "USD");
    }

    #[test]
    fn test_usd_lowercase_and_mixed() {
        assert_eq!(normalize_currency("usd"), "USD");
        assert_eq!(normalize_currency("USd"), "USD");
    }

    #[test]
    fn test_usd_with_decoration() {
        assert_eq!(normalize_currency("USD (approx)"), "USD");
        assert_eq!(normalize_currency("  usd/bushel"), "USD");
    }

    #[test]
    fn test_us_dollar_sign() {
        assert_eq!(normalize_currency("US$ (spot)"), "USD");
        assert_eq!(normalize_currency("us$"), "USD");
    }

    #[test]
    fn test_substring_over_match_is_kept() {
        assert_eq!(normalize_currency("AUSD"), "USD");
    }

    // ========== Passthrough ==========

    #[test]
    fn test_trim_and_uppercase() {
        assert_eq!(normalize_currency(" eur "), "EUR");
        assert_eq!(normalize_currency("chf"), "CHF");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        assert_eq!(normalize_currency("xyz"), "XYZ");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(normalize_currency(""), "");
        assert_eq!(normalize_currency("   "), "");
    }
}
