//! Zoned timestamp normalization.
//!
//! career.habr.com publishes vacancy dates as ISO-8601 strings with an
//! explicit offset (`2022-05-18T10:15:30+03:00`). Posts keep the wall-clock
//! fields and drop the offset; nothing is converted to UTC.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::{AppError, Result};

/// Converts a source-specific timestamp string into a local timestamp.
pub trait DateTimeParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<NaiveDateTime>;
}

/// Parser for the career.habr.com `datetime` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct HabrCareerDateTimeParser;

impl HabrCareerDateTimeParser {
    /// Minute-precision form, e.g. `2022-05-18T10:15+03:00`.
    const NO_SECONDS_FORMAT: &'static str = "%Y-%m-%dT%H:%M%:z";

    fn parse_zoned(text: &str) -> Option<DateTime<FixedOffset>> {
        // Date and time must be joined by `T`; RFC 3339 parsing alone also
        // lets a space through.
        if !matches!(text.as_bytes().get(10), Some(b'T' | b't')) {
            return None;
        }
        let text = match text.strip_suffix(['Z', 'z']) {
            Some(local) => Cow::Owned(format!("{local}+00:00")),
            None => Cow::Borrowed(text),
        };
        DateTime::parse_from_rfc3339(&text)
            .or_else(|_| DateTime::parse_from_str(&text, Self::NO_SECONDS_FORMAT))
            .ok()
    }

    /// Strip a trailing region id such as `[Europe/Moscow]`.
    fn strip_region(text: &str) -> &str {
        match text.find('[') {
            Some(idx) if text.ends_with(']') => &text[..idx],
            _ => text,
        }
    }
}

impl DateTimeParser for HabrCareerDateTimeParser {
    fn parse(&self, text: &str) -> Result<NaiveDateTime> {
        let trimmed = Self::strip_region(text.trim());
        Self::parse_zoned(trimmed)
            .map(|zoned| zoned.naive_local())
            .ok_or_else(|| {
                AppError::parse(
                    "timestamp",
                    format!("'{text}' is not a zoned ISO-8601 timestamp"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_offset_is_discarded_not_converted() {
        let parsed = HabrCareerDateTimeParser
            .parse("2022-05-18T10:15:30+03:00")
            .unwrap();
        assert_eq!(parsed, ymd_hms(2022, 5, 18, 10, 15, 30));
    }

    #[test]
    fn test_negative_offset_and_utc() {
        let parser = HabrCareerDateTimeParser;
        assert_eq!(
            parser.parse("2022-12-31T23:59:59-08:00").unwrap(),
            ymd_hms(2022, 12, 31, 23, 59, 59)
        );
        assert_eq!(
            parser.parse("2022-01-01T00:00:00Z").unwrap(),
            ymd_hms(2022, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        let parsed = HabrCareerDateTimeParser
            .parse("2022-05-19T10:00:00.250+03:00")
            .unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_minute_precision() {
        assert_eq!(
            HabrCareerDateTimeParser.parse("2022-05-19T10:00+03:00").unwrap(),
            ymd_hms(2022, 5, 19, 10, 0, 0)
        );
    }

    #[test]
    fn test_minute_precision_utc() {
        assert_eq!(
            HabrCareerDateTimeParser.parse("2022-05-18T10:15Z").unwrap(),
            ymd_hms(2022, 5, 18, 10, 15, 0)
        );
    }

    #[test]
    fn test_rejects_space_separator() {
        assert!(HabrCareerDateTimeParser
            .parse("2022-05-18 10:15:30+03:00")
            .is_err());
        assert!(HabrCareerDateTimeParser.parse("2022-05-18 10:15+03:00").is_err());
    }

    #[test]
    fn test_region_suffix() {
        assert_eq!(
            HabrCareerDateTimeParser
                .parse("2022-05-19T10:00:00+03:00[Europe/Moscow]")
                .unwrap(),
            ymd_hms(2022, 5, 19, 10, 0, 0)
        );
    }

    #[test]
    fn test_rejects_missing_offset() {
        let err = HabrCareerDateTimeParser
            .parse("2022-05-19T10:00:00")
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(HabrCareerDateTimeParser.parse("вчера").is_err());
        assert!(HabrCareerDateTimeParser.parse("").is_err());
    }
}
