//! Price normalization
//!
//! Turns the price labels shown on listing pages (`1 234,50 Kč`, `1.099 €`,
//! `1 290,- Kč`) into plain amounts.

use thiserror::Error;

/// A non-empty price label that could not be read as an amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("no digits in price text '{0}'")]
    NoDigits(String),

    #[error("unreadable price text '{0}'")]
    Malformed(String),
}

/// Parses a locale-formatted price label into an amount
///
/// Everything except digits and `,`/`.` is discarded, so currency symbols,
/// `Kč` and (narrow) no-break space thousands separators are tolerated. The
/// last separator is treated as the decimal point only when one or two
/// digits follow it; every other separator groups thousands.
///
/// # Returns
///
/// * `Ok(None)` - The label is empty or whitespace only
/// * `Ok(Some(amount))` - The parsed amount
/// * `Err(PriceError)` - The label is non-empty but not a price
///
/// # Example
///
/// ```
/// use bikero_scraper::parse_price;
///
/// assert_eq!(parse_price("1 234,50 Kč").unwrap(), Some(1234.50));
/// assert_eq!(parse_price("").unwrap(), None);
/// ```
pub fn parse_price(text: &str) -> Result<Option<f64>, PriceError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    // `1 290,-` leaves a dangling separator behind
    let kept = kept.trim_end_matches([',', '.']);
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return Err(PriceError::NoDigits(text.to_string()));
    }

    let (whole, fraction) = match kept.rfind([',', '.']) {
        Some(pos) if (1..=2).contains(&(kept.len() - pos - 1)) => (&kept[..pos], &kept[pos + 1..]),
        _ => (kept, ""),
    };

    let whole: String = whole.chars().filter(char::is_ascii_digit).collect();
    let normalized = match (whole.is_empty(), fraction.is_empty()) {
        (true, _) => format!("0.{}", fraction),
        (false, true) => whole,
        (false, false) => format!("{}.{}", whole, fraction),
    };

    normalized
        .parse::<f64>()
        .map(Some)
        .map_err(|_| PriceError::Malformed(text.to_string()))
}
