//! Cell-level parsing shared by the batch loader and the coordinate table.

use chrono::{Datelike as _, NaiveDate, NaiveDateTime};

/// Day-first date formats accepted in batch files, tried in order.
///
/// `%Y` also accepts one or two digit years, so a four-digit format can
/// match `01-03-25` as year 25; such matches are rejected by
/// [`parse_day_first_date`] and the two-digit formats get their turn.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%y", "%d/%m/%y", "%Y-%m-%d",
];

/// Normalizes a pincode to a bare digit string.
///
/// Strips any namespace prefix up to the last `/` (e.g. `IN/110001`), drops
/// the fractional part left behind by numeric storage (`110001.0`), and
/// keeps only ASCII digits. Returns `None` if nothing is left.
#[must_use]
pub fn normalize_pincode(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unprefixed = trimmed.rsplit_once('/').map_or(trimmed, |(_, rest)| rest);
    let integral = unprefixed.split_once('.').map_or(unprefixed, |(int, _)| int);
    let digits: String = integral.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Years below this come from a two-digit year read by a `%Y` format.
const MIN_FOUR_DIGIT_YEAR: i32 = 100;

/// Parses a day-first calendar date, with or without a trailing time.
/// Two-digit years resolve to 1970-2069. Returns `None` for anything
/// unparseable.
#[must_use]
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|format| {
        let date = NaiveDate::parse_from_str(s, format).ok().or_else(|| {
            NaiveDateTime::parse_from_str(s, &format!("{format} %H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })?;
        (date.year() >= MIN_FOUR_DIGIT_YEAR).then_some(date)
    })
}

/// Parses a metric cell. Missing, non-numeric, negative, and non-finite
/// values count as `0.0`.
#[must_use]
pub fn parse_metric(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Parses a coordinate cell. Returns `None` if missing or not a finite
/// number.
#[must_use]
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use chrono::Datelike as _;

    use super::*;

    #[test]
    fn pincode_from_integer_string() {
        assert_eq!(normalize_pincode("110001").as_deref(), Some("110001"));
    }

    #[test]
    fn pincode_strips_float_suffix() {
        assert_eq!(normalize_pincode("110001.0").as_deref(), Some("110001"));
        assert_eq!(normalize_pincode(" 560034.00 ").as_deref(), Some("560034"));
    }

    #[test]
    fn pincode_strips_namespace_prefix() {
        assert_eq!(normalize_pincode("IN/110001").as_deref(), Some("110001"));
        assert_eq!(normalize_pincode("IN/110001.0").as_deref(), Some("110001"));
    }

    #[test]
    fn pincode_output_is_all_digits() {
        for raw in ["110001", "110001.0", "IN/110001", "'110001", "1100 01"] {
            let pin = normalize_pincode(raw).unwrap();
            assert!(pin.chars().all(|c| c.is_ascii_digit()), "{raw} -> {pin}");
        }
    }

    #[test]
    fn pincode_rejects_empty_and_nan() {
        assert!(normalize_pincode("").is_none());
        assert!(normalize_pincode("nan").is_none());
        assert!(normalize_pincode("IN/").is_none());
    }

    #[test]
    fn parses_day_first_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_day_first_date("01-03-2025"), Some(expected));
        assert_eq!(parse_day_first_date("01/03/2025"), Some(expected));
        assert_eq!(parse_day_first_date("01.03.2025"), Some(expected));
        assert_eq!(parse_day_first_date("2025-03-01"), Some(expected));
        assert_eq!(parse_day_first_date("01-03-2025 10:15:00"), Some(expected));
    }

    #[test]
    fn two_digit_years_are_in_this_century() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(parse_day_first_date("01-03-25"), expected);
        assert_eq!(parse_day_first_date("01/03/25"), expected);
        assert_eq!(parse_day_first_date("01-03-25 08:30:00"), expected);
    }

    #[test]
    fn short_and_long_years_land_in_the_same_month() {
        let short = parse_day_first_date("05-03-25").unwrap();
        let long = parse_day_first_date("20-03-2025").unwrap();
        assert_eq!((short.year(), short.month()), (long.year(), long.month()));
    }

    #[test]
    fn day_comes_before_month() {
        let date = parse_day_first_date("12-01-2025").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
    }

    #[test]
    fn unparseable_date_is_none() {
        assert!(parse_day_first_date("").is_none());
        assert!(parse_day_first_date("not-a-date").is_none());
        assert!(parse_day_first_date("31-02-2025").is_none());
    }

    #[test]
    fn metric_defaults_to_zero() {
        assert!((parse_metric("12") - 12.0).abs() < f64::EPSILON);
        assert!((parse_metric("3.5") - 3.5).abs() < f64::EPSILON);
        assert!(parse_metric("").abs() < f64::EPSILON);
        assert!(parse_metric("n/a").abs() < f64::EPSILON);
        assert!(parse_metric("-4").abs() < f64::EPSILON);
        assert!(parse_metric("NaN").abs() < f64::EPSILON);
    }

    #[test]
    fn coordinate_parsing() {
        assert_eq!(parse_coordinate("28.6139"), Some(28.6139));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("abc"), None);
    }
}
