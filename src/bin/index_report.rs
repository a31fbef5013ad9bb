use index_report::charts::PlottersRenderer;
use index_report::config::{Config, MailConfig};
use index_report::mailer::{Mailer, SmtpMailer};
use index_report::providers::YahooProvider;
use index_report::services::{ReportService, RunOptions, RunOutcome};
use index_report::util;

use anyhow::Context;
use clap::{App, Arg};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let matches = App::new("index_report")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Record today's index closes, chart them and mail the charts")
        .arg(
            Arg::with_name("date")
                .short('d')
                .long("date")
                .value_name("DATE")
                .help("Report date (YYYY-MM-DD), defaults to today in the market timezone")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding the per-index CSV series")
                .takes_value(true)
                .default_value("data"),
        )
        .arg(
            Arg::with_name("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Directory charts are written to with --save-charts")
                .takes_value(true)
                .default_value("output"),
        )
        .arg(
            Arg::with_name("font")
                .long("font")
                .value_name("TTF")
                .help("TrueType font used for chart text")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("save-charts")
                .long("save-charts")
                .help("Also write <symbol>.png files to the output directory")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("no-email")
                .long("no-email")
                .help("Render the report without mailing it")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("skip-fetch")
                .long("skip-fetch")
                .help("Do not contact the quote provider; report from existing series")
                .takes_value(false),
        )
        .get_matches();

    let send_email = !matches.is_present("no-email");
    let mail = MailConfig::from_env().context("reading mail settings")?;
    if send_email {
        mail.validate().context("mail settings are incomplete")?;
    }

    let mut config = Config::new()
        .with_data_dir(matches.value_of("data-dir").unwrap_or("data"))
        .with_output_dir(matches.value_of("output-dir").unwrap_or("output"))
        .with_mail(mail);
    if let Some(font) = matches.value_of("font") {
        config = config.with_font_path(font);
    }

    let today = match matches.value_of("date") {
        Some(date) => util::parse_date(date).with_context(|| format!("invalid --date {}", date))?,
        None => util::today_in(config.market_timezone),
    };
    info!("Running index report for {}", today);

    let options = RunOptions::new()
        .with_fetch(!matches.is_present("skip-fetch"))
        .with_save_charts(matches.is_present("save-charts"));

    let provider = Arc::new(YahooProvider::new().context("creating quote provider")?);
    let renderer = Arc::new(PlottersRenderer::new(&config.chart).context("loading chart font")?);
    let mailer: Option<Arc<dyn Mailer + Send + Sync>> = if send_email {
        Some(Arc::new(SmtpMailer::new(config.mail.clone()).context("configuring SMTP transport")?))
    } else {
        None
    };

    let service = ReportService::new(config, options, provider, renderer, mailer);
    match service.run(today).await.context("index report run failed")? {
        RunOutcome::NotTradingDay { trade_date, .. } => {
            info!("No new closes since {}, nothing sent", trade_date);
        }
        RunOutcome::Reported { trade_date, report } => {
            info!(
                "Report for {} done: {} charts, closes dated {}",
                report.date,
                report.charts.len(),
                trade_date
            );
        }
    }

    Ok(())
}
