use chrono::NaiveDate;

/// Rendered chart for one index.
#[derive(Debug, Clone)]
pub struct IndexChart {
    pub symbol: String,
    pub display_name: String,
    pub png: Vec<u8>,
}

impl IndexChart {
    pub fn attachment_name(&self) -> String {
        format!("{}.png", self.symbol)
    }
}

/// One run's worth of charts, in configured index order.
#[derive(Debug, Clone)]
pub struct Report {
    pub date: NaiveDate,
    pub charts: Vec<IndexChart>,
}

impl Report {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            charts: Vec::new(),
        }
    }

    pub fn subject(&self) -> String {
        format!("Stock Market Index Report for {}", self.date.format("%Y-%m-%d"))
    }
}
