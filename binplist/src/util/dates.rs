/*!
 Conversions between [`DateTime<Utc>`] and Apple's `CFAbsoluteTime`, the number of seconds
 since the Apple reference epoch `2001-01-01T00:00:00Z`.
*/

use chrono::{DateTime, Utc};

use crate::error::binary::BinaryPlistError;

/// Seconds between the Unix epoch and the Apple reference epoch
pub const APPLE_REFERENCE_DATE_OFFSET: i64 = 978_307_200;

/// Dates are kept to microsecond precision, which a [`f64`] holds exactly for any realistic date
const MICROS_PER_SECOND: f64 = 1_000_000.;

/// Get the number of seconds between the Apple reference epoch and `date`
///
/// # Example:
///
/// ```
/// use chrono::DateTime;
/// use binplist::util::dates::to_apple_seconds;
///
/// let date = DateTime::from_timestamp(978_307_200, 0).unwrap();
/// assert_eq!(to_apple_seconds(&date), 0.0);
/// ```
pub fn to_apple_seconds(date: &DateTime<Utc>) -> f64 {
    let whole = (date.timestamp() - APPLE_REFERENCE_DATE_OFFSET) as f64;
    whole + f64::from(date.timestamp_subsec_micros()) / MICROS_PER_SECOND
}

/// Build a UTC date from a number of seconds since the Apple reference epoch
pub fn from_apple_seconds(seconds: f64) -> Result<DateTime<Utc>, BinaryPlistError> {
    if !seconds.is_finite() {
        return Err(BinaryPlistError::InvalidDate(seconds));
    }
    let whole = seconds.floor();
    let mut micros = ((seconds - whole) * MICROS_PER_SECOND).round() as u32;
    let mut whole = whole as i64;
    if micros >= 1_000_000 {
        whole += 1;
        micros -= 1_000_000;
    }

    whole
        .checked_add(APPLE_REFERENCE_DATE_OFFSET)
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, micros * 1000))
        .ok_or(BinaryPlistError::InvalidDate(seconds))
}
