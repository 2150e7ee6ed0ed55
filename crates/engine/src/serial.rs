//! Date/time to day-serial conversion.
//!
//! The wire format carries dates as fractional day counts since
//! 1899-12-30: day zero of the platform's 1900 date system shifted by two
//! to absorb the historical phantom leap day (1900-02-29) and the
//! off-by-one of counting from "day 1".

use chrono::{NaiveDate, NaiveDateTime};

fn epoch() -> NaiveDateTime {
    // Unwrap is fine: the literal date is valid.
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Fractional days since the serial epoch.
pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let delta = *dt - epoch();
    delta.num_seconds() as f64 / 86_400.0
}

/// Inverse of `datetime_to_serial`, to whole-second precision.
pub fn serial_to_datetime(serial: f64) -> NaiveDateTime {
    epoch() + chrono::Duration::seconds((serial * 86_400.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_serials() {
        let d = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(datetime_to_serial(&d), 2.0);

        // Post-1900 dates include the phantom leap day.
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(datetime_to_serial(&d), 45658.0);
    }

    #[test]
    fn time_of_day_is_the_fraction() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
        assert_eq!(datetime_to_serial(&d), 45658.25);
    }

    #[test]
    fn round_trip() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(18, 30, 15).unwrap();
        assert_eq!(serial_to_datetime(datetime_to_serial(&d)), d);
    }
}
