use crate::errors::{Result, ReportError};
use crate::models::series::{DailyRecord, TimeSeries};
use crate::util;
use chrono::NaiveDate;
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Header of every series file. Only `Date` and `Close` are filled in.
pub const CSV_FIELDS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

/// Append-only per-index CSV files under one directory.
pub struct SeriesStore {
    data_dir: PathBuf,
}

impl SeriesStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// `<data_dir>/<symbol>.csv`
    pub fn series_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol))
    }

    /// Append one `(date, close)` row. Same-day reruns append again; nothing is deduplicated.
    pub fn append_close(&self, symbol: &str, date: &NaiveDate, close: f64) -> Result<()> {
        let path = self.series_path(symbol);
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }

        let existing_len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let needs_newline = existing_len > 0 && !ends_with_newline(&path, existing_len)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if existing_len == 0 {
            info!("Creating series file {}", path.display());
            writer.write_record(CSV_FIELDS)?;
        }

        let date_str = util::format_date(date);
        let close_str = close.to_string();
        writer.write_record([date_str.as_str(), "", "", "", close_str.as_str(), "", ""])?;
        writer.flush()?;

        debug!("Appended {} {} to {}", date_str, close_str, path.display());
        Ok(())
    }

    /// Read a whole series file back. Missing values become `None`.
    pub fn load_series(&self, symbol: &str) -> Result<TimeSeries> {
        let path = self.series_path(symbol);
        let file = File::open(&path).map_err(|e| {
            ReportError::DataError(format!("Cannot open series {}: {}", path.display(), e))
        })?;
        let records = read_records(file)?;

        info!("Loaded {} records for {} from {}", records.len(), symbol, path.display());
        Ok(TimeSeries::new(symbol, records))
    }
}

fn ends_with_newline(path: &Path, len: u64) -> Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Parse series rows from any CSV source with a header line.
pub fn read_records<R: Read>(source: R) -> Result<Vec<DailyRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, "Date")?;
    let close_idx = column_index(&headers, "Close")?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(DailyRecord {
            date: util::parse_optional_date(row.get(date_idx).unwrap_or(""))?,
            close: util::parse_optional_price(row.get(close_idx).unwrap_or(""))?,
        });
    }
    Ok(records)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReportError::DataError(format!("Series header has no {} column", name)))
}
