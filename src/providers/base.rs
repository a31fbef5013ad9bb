use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Latest close reported for an index.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    /// Most recent date the provider has posted a price for.
    pub trade_date: NaiveDate,
}

/// Source of current index prices
#[async_trait]
pub trait QuoteProvider {
    /// Short name used in log lines
    fn provider_name(&self) -> &'static str;

    /// Fetch the current price and the date of the last trade for `symbol`
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}
