//! UTCTime and GeneralizedTime: canonical "Z" form (X.690 §11.7-8).
//! Fractional seconds are not required to be present, but must round-trip
//! when they are.

use crate::error::primitive::InvalidTimeSnafu;
use crate::error::PrimitiveError;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use chrono::{DateTime, NaiveDateTime, Utc};

const UTC_TIME_FORMAT: &str = "%y%m%d%H%M%SZ";
const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";
const GENERALIZED_TIME_FRACTIONAL_FORMAT: &str = "%Y%m%d%H%M%S%.3fZ";

pub fn format_utc_time(value: &DateTime<Utc>) -> Vec<u8> {
    value.format(UTC_TIME_FORMAT).to_string().into_bytes()
}

pub fn parse_utc_time(body: &[u8]) -> Result<DateTime<Utc>, PrimitiveError> {
    let text = body_as_str(body, "UTCTime")?;
    NaiveDateTime::parse_from_str(&text, UTC_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| InvalidTimeSnafu { kind: "UTCTime", value: text }.build())
}

pub fn format_generalized_time(value: &DateTime<Utc>) -> Vec<u8> {
    let nanos = value.timestamp_subsec_nanos();
    if nanos == 0 {
        value.format(GENERALIZED_TIME_FORMAT).to_string().into_bytes()
    } else {
        value.format(GENERALIZED_TIME_FRACTIONAL_FORMAT).to_string().into_bytes()
    }
}

pub fn parse_generalized_time(body: &[u8]) -> Result<DateTime<Utc>, PrimitiveError> {
    let text = body_as_str(body, "GeneralizedTime")?;
    let format = if text.contains('.') {
        GENERALIZED_TIME_FRACTIONAL_FORMAT
    } else {
        GENERALIZED_TIME_FORMAT
    };
    NaiveDateTime::parse_from_str(&text, format)
        .map(|naive| naive.and_utc())
        .map_err(|_| InvalidTimeSnafu { kind: "GeneralizedTime", value: text }.build())
}

fn body_as_str(body: &[u8], kind: &'static str) -> Result<String, PrimitiveError> {
    core::str::from_utf8(body)
        .map(ToString::to_string)
        .map_err(|_| {
            InvalidTimeSnafu { kind, value: alloc::format!("{body:?}") }.build()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn utc_time_round_trip() {
        let value = Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap();
        let body = format_utc_time(&value);
        assert_eq!(body, b"240314092653Z");
        assert_eq!(parse_utc_time(&body).unwrap(), value);
    }

    #[test]
    fn generalized_time_round_trip_without_fraction() {
        let value = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        let body = format_generalized_time(&value);
        assert_eq!(body, b"19991231235959Z");
        assert_eq!(parse_generalized_time(&body).unwrap(), value);
    }

    #[test]
    fn generalized_time_round_trip_with_fraction() {
        let value = Utc
            .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
            .unwrap()
            .with_nanosecond(500_000_000)
            .unwrap();
        let body = format_generalized_time(&value);
        assert_eq!(parse_generalized_time(&body).unwrap(), value);
    }

    #[test]
    fn rejects_malformed_time() {
        assert!(parse_utc_time(b"not-a-time").is_err());
    }
}
