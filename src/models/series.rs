use chrono::NaiveDate;

/// One row of a series file. `None` marks a missing value on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date: Some(date),
            close: Some(close),
        }
    }

    /// Both fields present.
    pub fn observation(&self) -> Option<(NaiveDate, f64)> {
        match (self.date, self.close) {
            (Some(date), Some(close)) => Some((date, close)),
            _ => None,
        }
    }
}

/// Everything read back from one index's series file, in file order.
/// Duplicate dates are kept as written.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub symbol: String,
    pub records: Vec<DailyRecord>,
}

impl TimeSeries {
    pub fn new(symbol: &str, records: Vec<DailyRecord>) -> Self {
        Self {
            symbol: symbol.to_string(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.date).max()
    }
}
