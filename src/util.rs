use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use crate::errors::{Result, ReportError};

/// Placeholder written by data sources for a missing value.
pub const NULL_SENTINEL: &str = "null";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)?)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// True for cells that mean "no data": the `null` sentinel or nothing at all.
pub fn is_missing(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == NULL_SENTINEL
}

pub fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>> {
    if is_missing(raw) {
        return Ok(None);
    }
    parse_date(raw).map(Some)
}

pub fn parse_optional_price(raw: &str) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| ReportError::DataError(format!("Invalid price '{}': {}", raw, e)))
}

/// Calendar date "now" in the market's timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Exchange-local date of a unix timestamp given the exchange's UTC offset in seconds.
pub fn local_date_from_timestamp(timestamp: i64, gmt_offset_secs: i32) -> Result<NaiveDate> {
    let offset = FixedOffset::east_opt(gmt_offset_secs)
        .ok_or_else(|| ReportError::DataError(format!("Invalid UTC offset: {}", gmt_offset_secs)))?;
    let utc = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| ReportError::DataError(format!("Invalid timestamp: {}", timestamp)))?;
    Ok(utc.with_timezone(&offset).date_naive())
}
