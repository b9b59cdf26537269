//! Date string canonicalisation.

use chrono::NaiveDate;

const CANONICAL: &str = "%Y-%m-%d";
const ACCEPTED: &[&str] = &["%d.%m.%Y", CANONICAL];

/// Coerce `DD.MM.YYYY` or `YYYY-MM-DD` into `YYYY-MM-DD`.
///
/// Anything else comes back unchanged.
pub fn normalize_date(input: &str) -> String {
    ACCEPTED
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input.trim(), format).ok())
        .map(|date| date.format(CANONICAL).to_string())
        .unwrap_or_else(|| input.to_string())
}
