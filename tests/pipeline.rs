use async_trait::async_trait;
use chrono::NaiveDate;
use index_report::charts::ChartRenderer;
use index_report::config::Config;
use index_report::errors::{ReportError, Result};
use index_report::mailer::Mailer;
use index_report::models::index::TrackedIndex;
use index_report::models::report::Report;
use index_report::models::window::WindowSeries;
use index_report::providers::{Quote, QuoteProvider};
use index_report::services::{ReportService, RunOptions, RunOutcome};
use index_report::storage::SeriesStore;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct FakeProvider {
    quotes: HashMap<String, Quote>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn new(trade_date: NaiveDate, prices: &[(&str, f64)]) -> Self {
        let quotes = prices
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.to_string(),
                    Quote {
                        symbol: symbol.to_string(),
                        price: *price,
                        trade_date,
                    },
                )
            })
            .collect();
        Self {
            quotes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for FakeProvider {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| ReportError::ProviderError(format!("no quote for {}", symbol)))
    }
}

#[derive(Default)]
struct FakeRenderer {
    rendered: Mutex<Vec<(String, Vec<WindowSeries>)>>,
}

impl ChartRenderer for FakeRenderer {
    fn render(
        &self,
        index: &TrackedIndex,
        windows: &[WindowSeries],
        _today: NaiveDate,
    ) -> Result<Vec<u8>> {
        self.rendered
            .lock()
            .unwrap()
            .push((index.symbol.clone(), windows.to_vec()));
        Ok(format!("png:{}", index.symbol).into_bytes())
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<Report>>,
    fail: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_report(&self, report: &Report) -> Result<()> {
        if self.fail {
            return Err(ReportError::MailError("relay refused".to_string()));
        }
        self.sent.lock().unwrap().push(report.clone());
        Ok(())
    }
}

struct Harness {
    dir: TempDir,
    provider: Arc<FakeProvider>,
    renderer: Arc<FakeRenderer>,
    mailer: Arc<FakeMailer>,
}

const PRICES: [(&str, f64); 4] = [
    ("^IXIC", 13748.74),
    ("^DJI", 34529.45),
    ("^GSPC", 4204.11),
    ("^GSPTSE", 19731.0),
];

impl Harness {
    fn new(trade_date: NaiveDate, prices: &[(&str, f64)]) -> Self {
        Self::with_mailer(trade_date, prices, FakeMailer::default())
    }

    fn with_mailer(trade_date: NaiveDate, prices: &[(&str, f64)], mailer: FakeMailer) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            provider: Arc::new(FakeProvider::new(trade_date, prices)),
            renderer: Arc::new(FakeRenderer::default()),
            mailer: Arc::new(mailer),
        }
    }

    fn data_dir(&self) -> String {
        self.dir.path().join("data").to_string_lossy().into_owned()
    }

    fn output_dir(&self) -> String {
        self.dir.path().join("output").to_string_lossy().into_owned()
    }

    fn store(&self) -> SeriesStore {
        SeriesStore::new(self.data_dir())
    }

    fn service(&self, options: RunOptions) -> ReportService {
        let config = Config::new()
            .with_data_dir(&self.data_dir())
            .with_output_dir(&self.output_dir());
        let mailer: Arc<dyn Mailer + Send + Sync> = self.mailer.clone();
        ReportService::new(
            config,
            options,
            self.provider.clone(),
            self.renderer.clone(),
            Some(mailer),
        )
    }

    fn sent(&self) -> Vec<Report> {
        self.mailer.sent.lock().unwrap().clone()
    }
}

fn seed_history(store: &SeriesStore) {
    for (symbol, price) in PRICES {
        store.append_close(symbol, &date("2015-01-02"), price / 3.0).unwrap();
        store.append_close(symbol, &date("2020-12-01"), price * 0.9).unwrap();
        store.append_close(symbol, &date("2021-04-01"), price * 0.95).unwrap();
    }
}

#[tokio::test]
async fn stale_trade_date_skips_everything() {
    let h = Harness::new(date("2021-06-04"), &PRICES);
    let service = h.service(RunOptions::new());

    let outcome = service.run(date("2021-06-05")).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::NotTradingDay { trade_date, .. } if trade_date == date("2021-06-04")
    ));
    assert_eq!(h.provider.calls(), vec!["^IXIC"]);
    assert!(!Path::new(&h.data_dir()).exists());
    assert!(h.renderer.rendered.lock().unwrap().is_empty());
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn trading_day_appends_renders_and_mails_once() {
    let h = Harness::new(date("2021-06-01"), &PRICES);
    seed_history(&h.store());
    let service = h.service(RunOptions::new());

    let outcome = service.run(date("2021-06-01")).await.unwrap();
    let trade_date = match outcome {
        RunOutcome::Reported { trade_date, .. } => trade_date,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(trade_date, date("2021-06-01"));

    // The guard quote is reused, so every index is queried exactly once.
    assert_eq!(h.provider.calls(), vec!["^IXIC", "^DJI", "^GSPC", "^GSPTSE"]);

    let nasdaq = h.store().load_series("^IXIC").unwrap();
    assert_eq!(nasdaq.len(), 4);
    assert_eq!(nasdaq.latest_date(), Some(date("2021-06-01")));
    assert_eq!(nasdaq.records.last().unwrap().close, Some(13748.74));

    let rendered = h.renderer.rendered.lock().unwrap();
    assert_eq!(rendered.len(), 4);
    let (symbol, windows) = &rendered[0];
    assert_eq!(symbol, "^IXIC");
    let counts: Vec<usize> = windows.iter().map(|w| w.len()).collect();
    // MAX, 5Y, 12M, 6M, 3M as of 2021-06-01
    assert_eq!(counts, vec![4, 3, 3, 3, 2]);

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    let names: Vec<String> = sent[0].charts.iter().map(|c| c.attachment_name()).collect();
    assert_eq!(names, vec!["^IXIC.png", "^DJI.png", "^GSPC.png", "^GSPTSE.png"]);
    assert_eq!(sent[0].charts[1].png, b"png:^DJI".to_vec());
    assert_eq!(sent[0].subject(), "Stock Market Index Report for 2021-06-01");
}

#[tokio::test]
async fn same_day_rerun_appends_duplicate_rows() {
    let h = Harness::new(date("2021-06-01"), &PRICES);
    let service = h.service(RunOptions::new());

    service.run(date("2021-06-01")).await.unwrap();
    service.run(date("2021-06-01")).await.unwrap();

    let dow = h.store().load_series("^DJI").unwrap();
    assert_eq!(dow.len(), 2);
    assert_eq!(dow.records[0], dow.records[1]);

    let rendered = h.renderer.rendered.lock().unwrap();
    let (_, windows) = rendered.last().unwrap();
    assert!(windows.iter().all(|w| w.len() == 2));
    assert_eq!(h.sent().len(), 2);
}

#[tokio::test]
async fn provider_failure_leaves_files_untouched() {
    let h = Harness::new(date("2021-06-01"), &PRICES[..2]);
    seed_history(&h.store());
    let before = fs::read_to_string(h.store().series_path("^IXIC")).unwrap();
    let service = h.service(RunOptions::new());

    let err = service.run(date("2021-06-01")).await.unwrap_err();

    assert!(matches!(err, ReportError::ProviderError(_)));
    assert_eq!(fs::read_to_string(h.store().series_path("^IXIC")).unwrap(), before);
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn mail_failure_aborts_after_rendering() {
    let mailer = FakeMailer {
        fail: true,
        ..FakeMailer::default()
    };
    let h = Harness::with_mailer(date("2021-06-01"), &PRICES, mailer);
    let service = h.service(RunOptions::new());

    let err = service.run(date("2021-06-01")).await.unwrap_err();

    assert!(matches!(err, ReportError::MailError(_)));
    assert_eq!(h.renderer.rendered.lock().unwrap().len(), 4);
    assert!(!Path::new(&h.output_dir()).exists());
}

#[tokio::test]
async fn skip_fetch_reports_from_existing_series() {
    let h = Harness::new(date("2021-06-01"), &PRICES);
    seed_history(&h.store());
    let service = h.service(RunOptions::new().with_fetch(false).with_save_charts(true));

    let outcome = service.run(date("2021-06-10")).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Reported { .. }));
    assert!(h.provider.calls().is_empty());
    assert_eq!(h.store().load_series("^GSPC").unwrap().len(), 3);

    let saved = Path::new(&h.output_dir()).join("^GSPTSE.png");
    assert_eq!(fs::read(saved).unwrap(), b"png:^GSPTSE".to_vec());
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test]
async fn missing_series_file_fails_the_run() {
    let h = Harness::new(date("2021-06-01"), &PRICES);
    let service = h.service(RunOptions::new().with_fetch(false));

    let err = service.run(date("2021-06-01")).await.unwrap_err();
    assert!(matches!(err, ReportError::DataError(_)));
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn only_configured_indexes_are_reported() {
    let h = Harness::new(date("2021-06-01"), &PRICES);
    let config = Config::new()
        .with_indexes(vec![TrackedIndex::new("^GSPC", "S&P 500")])
        .with_data_dir(&h.data_dir());
    let mailer: Arc<dyn Mailer + Send + Sync> = h.mailer.clone();
    let service = ReportService::new(
        config,
        RunOptions::new(),
        h.provider.clone(),
        h.renderer.clone(),
        Some(mailer),
    );

    service.run(date("2021-06-01")).await.unwrap();

    assert_eq!(h.provider.calls(), vec!["^GSPC"]);
    assert!(!h.store().series_path("^IXIC").exists());
    assert_eq!(h.sent()[0].charts.len(), 1);
}
