//! Review date parsing.
//!
//! Month-first for ambiguous slash dates. Anything unrecognised is `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

/// Parse a `last_review` field.
///
/// Timezone-aware values are converted to UTC. Dates without a time of day
/// land on midnight.
pub fn parse_review_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_review_date("2019-05-21"), Some(ymd_hms(2019, 5, 21, 0, 0, 0)));
    }

    #[test]
    fn test_datetime_variants() {
        let expected = Some(ymd_hms(2019, 5, 21, 14, 30, 5));
        assert_eq!(parse_review_date("2019-05-21 14:30:05"), expected);
        assert_eq!(parse_review_date("2019-05-21T14:30:05"), expected);
        assert_eq!(parse_review_date("2019/05/21 14:30:05"), expected);
        assert_eq!(parse_review_date("05/21/2019 14:30:05"), expected);
        assert_eq!(
            parse_review_date("2019-05-21 14:30"),
            Some(ymd_hms(2019, 5, 21, 14, 30, 0))
        );
    }

    #[test]
    fn test_rfc3339_converted_to_utc() {
        assert_eq!(
            parse_review_date("2019-05-21T14:30:00+02:00"),
            Some(ymd_hms(2019, 5, 21, 12, 30, 0))
        );
    }

    #[test]
    fn test_other_date_layouts() {
        let expected = Some(ymd_hms(2019, 5, 21, 0, 0, 0));
        assert_eq!(parse_review_date("2019/05/21"), expected);
        assert_eq!(parse_review_date("05/21/2019"), expected);
        assert_eq!(parse_review_date("21 May 2019"), expected);
        assert_eq!(parse_review_date("May 21, 2019"), expected);
        assert_eq!(parse_review_date("20190521"), expected);
        assert_eq!(parse_review_date("  2019-05-21 "), expected);
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_review_date("not-a-date"), None);
        assert_eq!(parse_review_date(""), None);
        assert_eq!(parse_review_date("2019-02-30"), None);
        assert_eq!(parse_review_date("21/05/2019"), None);
        assert_eq!(parse_review_date("20191321"), None);
    }
}
