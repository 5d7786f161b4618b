//! Document code formatting.

use chrono::{DateTime, Datelike, Utc};

/// Purchase order code prefix.
pub const PO_PREFIX: &str = "PO";
/// Goods receipt code prefix.
pub const GR_PREFIX: &str = "GR";

/// Format a document code: `<prefix>/<year>/<month>/<sequence>`, with the
/// sequence zero-padded to four digits and scoped to the year/month bucket.
pub fn document_code(prefix: &str, date: DateTime<Utc>, sequence: u32) -> String {
    format!(
        "{prefix}/{:04}/{:02}/{:04}",
        date.year(),
        date.month(),
        sequence
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn codes_are_zero_padded() {
        let date = Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap();
        assert_eq!(document_code(PO_PREFIX, date, 42), "PO/2026/08/0042");
        assert_eq!(document_code(GR_PREFIX, date, 1), "GR/2026/08/0001");
    }

    #[test]
    fn sequences_above_the_pad_width_keep_all_digits() {
        let date = Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(document_code(PO_PREFIX, date, 12345), "PO/2026/12/12345");
    }
}
