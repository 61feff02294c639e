//! Utility functions for perflog: timestamp normalization, rounding and
//! value formatting shared by the normalizers and the report writer.

use chrono::DateTime;

/// Canonical timestamp layout of every `start`/`end` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub const MIB: f64 = 1024.0 * 1024.0;
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a Unix timestamp in milliseconds to the canonical format (UTC).
pub fn unix_millis_to_timestamp(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Normalize an ISO-8601-like timestamp (`2024-08-21T20:49:38.283712`) to the
/// canonical format. Fractional seconds are dropped; no timezone conversion.
pub fn iso_to_timestamp(iso: &str) -> String {
    let whole_seconds = iso.split('.').next().unwrap_or(iso);
    format!("{} UTC", whole_seconds.replace('T', " "))
}

/// Round to `decimals` places, ties to even (`0.125` -> `0.12`).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Render a float the way the report has always shown them: whole values
/// keep a trailing `.0` (`80.0`), others print their shortest form (`33.33`).
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Parse a size such as `64K`, `1M`, `100MB`, `2GiB` or `4096` into bytes.
/// Suffixes are binary and case-insensitive.
pub fn parse_size(size: &str) -> Option<u64> {
    let trimmed = size.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(digits_end);
    let value: u64 = digits.parse().ok()?;

    let suffix = suffix.to_ascii_uppercase();
    let unit = suffix
        .strip_suffix("IB")
        .or_else(|| suffix.strip_suffix('B'))
        .unwrap_or(&suffix);
    let multiplier: u64 = match unit {
        "" => 1,
        "K" => 1 << 10,
        "M" => 1 << 20,
        "G" => 1 << 30,
        "T" => 1 << 40,
        _ => return None,
    };

    value.checked_mul(multiplier)
}

/// Wrap a value in double quotes for the delimited output, doubling any
/// embedded quote.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_millis_to_timestamp() {
        assert_eq!(
            unix_millis_to_timestamp(1_724_273_378_283).as_deref(),
            Some("2024-08-21 20:49:38 UTC")
        );
        assert_eq!(unix_millis_to_timestamp(0).as_deref(), Some("1970-01-01 00:00:00 UTC"));
    }

    #[test]
    fn test_iso_to_timestamp() {
        assert_eq!(iso_to_timestamp("2024-08-21T20:49:38.283712"), "2024-08-21 20:49:38 UTC");
        assert_eq!(iso_to_timestamp("2024-08-21T20:49:38"), "2024-08-21 20:49:38 UTC");
    }

    #[test]
    fn test_both_sources_agree() {
        let from_millis = unix_millis_to_timestamp(1_724_273_378_999).unwrap();
        let from_iso = iso_to_timestamp("2024-08-21T20:49:38.999");
        assert_eq!(from_millis, from_iso);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(57.0 / 100.0 * 100.0, 2), 57.0);
        assert_eq!(round_to(1.0 / 3.0 * 100.0, 2), 33.33);
        assert_eq!(round_to(0.123456789, 5), 0.12346);
        // ties go to the even neighbour
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-0.125, 2), -0.12);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(80.0), "80.0");
        assert_eq!(format_float(33.33), "33.33");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64K"), Some(65536));
        assert_eq!(parse_size("1m"), Some(1048576));
        assert_eq!(parse_size("100MB"), Some(100 * 1048576));
        assert_eq!(parse_size("2GiB"), Some(2 * 1073741824));
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("big"), None);
        assert_eq!(parse_size("12X"), None);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("implicit-dirs,max-conns=10"), "\"implicit-dirs,max-conns=10\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
