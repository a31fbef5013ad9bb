use crate::errors::{Result, ReportError};
use crate::providers::base::{Quote, QuoteProvider};
use crate::util;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i32>,
}

/// Yahoo Finance quote provider backed by the v8 chart endpoint.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

impl YahooProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ReportError::RequestError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            last_request: Mutex::new(None),
        })
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{}/{}", self.base_url, symbol.replace('^', "%5E"))
    }

    /// Keeps consecutive requests at least 500ms apart.
    async fn wait_for_rate_limit(&self) {
        const MIN_INTERVAL: Duration = Duration::from_millis(500);

        let now = Instant::now();
        let should_wait = match self.last_request.lock() {
            Ok(mut last) => {
                let wait = last
                    .map(|instant| instant.elapsed())
                    .filter(|elapsed| *elapsed < MIN_INTERVAL)
                    .map(|elapsed| MIN_INTERVAL - elapsed);
                *last = Some(now);
                wait
            }
            Err(_) => None,
        };

        if let Some(wait_time) = should_wait {
            debug!("Waiting {:?} before next quote request", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }
}

/// Pull price and trade date out of a chart API response body.
fn parse_quote(symbol: &str, body: &str) -> Result<Quote> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(ReportError::ProviderError(format!(
            "{} for {}: {}",
            err.code, symbol, err.description
        )));
    }

    let meta = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| ReportError::ProviderError(format!("Empty chart result for {}", symbol)))?;

    let price = meta.regular_market_price.ok_or_else(|| {
        ReportError::ProviderError(format!("No market price for {}", symbol))
    })?;
    let timestamp = meta.regular_market_time.ok_or_else(|| {
        ReportError::ProviderError(format!("No trade time for {}", symbol))
    })?;
    let trade_date = util::local_date_from_timestamp(timestamp, meta.gmt_offset.unwrap_or(0))?;

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        trade_date,
    })
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(self.quote_url(symbol))
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() && !text.contains("\"chart\"") {
            return Err(ReportError::ProviderError(format!(
                "HTTP {} while fetching {}",
                status, symbol
            )));
        }

        let quote = parse_quote(symbol, &text)?;
        info!(
            "{} last traded at {:.2} on {}",
            symbol, quote.price, quote.trade_date
        );
        Ok(quote)
    }
}
