use crate::charts::ChartRenderer;
use crate::config::Config;
use crate::errors::{Result, ReportError};
use crate::mailer::Mailer;
use crate::models::report::{IndexChart, Report};
use crate::providers::base::{Quote, QuoteProvider};
use crate::services::selector;
use crate::storage::SeriesStore;
use chrono::NaiveDate;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which optional stages a run performs.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Ask the provider for today's closes and append them before reporting.
    pub fetch: bool,
    /// Also write every chart to the output directory.
    pub save_charts: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self {
            fetch: true,
            save_charts: false,
        }
    }

    pub fn with_fetch(mut self, fetch: bool) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_save_charts(mut self, save: bool) -> Self {
        self.save_charts = save;
        self
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The provider has nothing newer than `trade_date`; no file was touched.
    NotTradingDay { today: NaiveDate, trade_date: NaiveDate },
    Reported { trade_date: NaiveDate, report: Report },
}

/// Fetch, append, select, render and mail, once.
pub struct ReportService {
    config: Config,
    options: RunOptions,
    store: SeriesStore,
    provider: Arc<dyn QuoteProvider + Send + Sync>,
    renderer: Arc<dyn ChartRenderer + Send + Sync>,
    mailer: Option<Arc<dyn Mailer + Send + Sync>>,
}

impl ReportService {
    /// A `None` mailer renders the report without sending it.
    pub fn new(
        config: Config,
        options: RunOptions,
        provider: Arc<dyn QuoteProvider + Send + Sync>,
        renderer: Arc<dyn ChartRenderer + Send + Sync>,
        mailer: Option<Arc<dyn Mailer + Send + Sync>>,
    ) -> Self {
        let store = SeriesStore::new(&config.data_dir);
        Self {
            config,
            options,
            store,
            provider,
            renderer,
            mailer,
        }
    }

    /// Run the whole pipeline for `today`. The first error aborts the run.
    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome> {
        if self.config.indexes.is_empty() {
            return Err(ReportError::ConfigError("No indexes configured".to_string()));
        }

        let trade_date = if self.options.fetch {
            let guard_quote = self.fetch_guard_quote().await?;
            if today > guard_quote.trade_date {
                info!(
                    "{} is not a trading day (last trade {}), skipping report",
                    today, guard_quote.trade_date
                );
                return Ok(RunOutcome::NotTradingDay {
                    today,
                    trade_date: guard_quote.trade_date,
                });
            }
            self.record_closes(guard_quote).await?
        } else {
            info!("Fetch disabled, reporting from existing series");
            today
        };

        let report = self.build_report(today)?;

        if self.options.save_charts {
            self.save_charts(&report)?;
        }

        match &self.mailer {
            Some(mailer) => mailer.send_report(&report).await?,
            None => warn!("Mailing disabled, report for {} not sent", report.date),
        }

        Ok(RunOutcome::Reported { trade_date, report })
    }

    async fn fetch_guard_quote(&self) -> Result<Quote> {
        let guard = self
            .config
            .guard_index()
            .ok_or_else(|| ReportError::ConfigError("No indexes configured".to_string()))?;
        info!(
            "Checking latest trade date of {} via {}",
            guard.symbol,
            self.provider.provider_name()
        );
        self.provider.fetch_quote(&guard.symbol).await
    }

    /// Fetch every index's close, then append them all dated `guard_quote.trade_date`.
    /// Nothing is written unless every fetch succeeded.
    async fn record_closes(&self, guard_quote: Quote) -> Result<NaiveDate> {
        let trade_date = guard_quote.trade_date;

        let mut quotes = Vec::with_capacity(self.config.indexes.len());
        for index in &self.config.indexes {
            if index.symbol == guard_quote.symbol {
                quotes.push(guard_quote.clone());
            } else {
                quotes.push(self.provider.fetch_quote(&index.symbol).await?);
            }
        }

        for quote in &quotes {
            if quote.trade_date != trade_date {
                warn!(
                    "{} last traded on {}, recording it under {}",
                    quote.symbol, quote.trade_date, trade_date
                );
            }
            self.store.append_close(&quote.symbol, &trade_date, quote.price)?;
        }

        info!("Recorded {} closes for {}", quotes.len(), trade_date);
        Ok(trade_date)
    }

    /// Reload every series from disk and render its chart.
    pub fn build_report(&self, today: NaiveDate) -> Result<Report> {
        let mut report = Report::new(today);

        for index in &self.config.indexes {
            let series = self.store.load_series(&index.symbol)?;
            let windows = selector::select_windows(&series, today);
            let png = self.renderer.render(index, &windows, today)?;

            report.charts.push(IndexChart {
                symbol: index.symbol.clone(),
                display_name: index.display_name.clone(),
                png,
            });
        }

        Ok(report)
    }

    fn save_charts(&self, report: &Report) -> Result<Vec<PathBuf>> {
        let output_dir = Path::new(&self.config.output_dir);
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::with_capacity(report.charts.len());
        for chart in &report.charts {
            let path = output_dir.join(chart.attachment_name());
            fs::write(&path, &chart.png)?;
            info!("Saved chart {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
