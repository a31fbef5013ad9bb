use crate::charts::ChartRenderer;
use crate::config::{ChartConfig, DEFAULT_FONT_PATHS, ENV_FONT};
use crate::errors::{Result, ReportError};
use crate::models::index::TrackedIndex;
use crate::models::window::WindowSeries;
use chrono::{Duration, NaiveDate};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const FONT_FAMILY: &str = "sans-serif";
const DASH_LENGTH: u32 = 8;
const DASH_GAP: u32 = 5;

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::ChartError(e.to_string())
}

/// Draws the five-panel chart with plotters onto an in-memory bitmap.
pub struct PlottersRenderer {
    width: u32,
    height: u32,
}

impl PlottersRenderer {
    /// Loads the chart font and prepares a renderer of the configured size.
    pub fn new(config: &ChartConfig) -> Result<Self> {
        let font_path = resolve_font_path(config.font_path.as_deref())?;
        register_font_file(&font_path)?;

        Ok(Self {
            width: config.width,
            height: config.height,
        })
    }

    fn draw(
        &self,
        buffer: &mut [u8],
        index: &TrackedIndex,
        windows: &[WindowSeries],
        today: NaiveDate,
    ) -> Result<()> {
        let root =
            BitMapBackend::with_buffer(buffer, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let title = format!("Index Time Series of {}", index.display_name);
        let body = root.titled(&title, (FONT_FAMILY, 36)).map_err(chart_err)?;
        let panels = body.split_evenly((windows.len().max(1), 1));

        for (panel, series) in panels.iter().zip(windows) {
            draw_panel(panel, series, today)?;
        }

        root.present().map_err(chart_err)?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(
        &self,
        index: &TrackedIndex,
        windows: &[WindowSeries],
        today: NaiveDate,
    ) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        self.draw(&mut buffer, index, windows, today)?;

        let png = encode_png(&buffer, self.width, self.height)?;
        info!("Rendered chart for {} ({} bytes)", index.symbol, png.len());
        Ok(png)
    }
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    series: &WindowSeries,
    today: NaiveDate,
) -> Result<()> {
    let (x_range, y_range) = panel_ranges(series, today);

    let mut chart = ChartBuilder::on(area)
        .caption(series.window.title(), (FONT_FAMILY, 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(6)
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|v: &f64| format!("{:.0}", v))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(DashedLineSeries::new(
            series.points(),
            DASH_LENGTH,
            DASH_GAP,
            RED.stroke_width(1),
        ))
        .map_err(chart_err)?;

    debug!("Drew {} panel with {} points", series.window.title(), series.len());
    Ok(())
}

/// Axis ranges for a panel. Empty or single-valued windows get a
/// non-degenerate fallback so plotting never divides by zero.
pub fn panel_ranges(series: &WindowSeries, today: NaiveDate) -> (Range<NaiveDate>, Range<f64>) {
    let x_range = match (series.dates.first(), series.dates.last()) {
        (Some(first), Some(last)) if first < last => *first..*last,
        (Some(first), Some(_)) => *first..*first + Duration::days(1),
        _ => {
            let start = series.window.since(today).unwrap_or(today - Duration::days(1));
            if start < today {
                start..today
            } else {
                today..today + Duration::days(1)
            }
        }
    };

    let min = series.prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_range = if !min.is_finite() || !max.is_finite() {
        0.0..1.0
    } else if max > min {
        let pad = (max - min) * 0.05;
        (min - pad)..(max + pad)
    } else {
        let pad = (min.abs() * 0.01).max(1.0);
        (min - pad)..(max + pad)
    };

    (x_range, y_range)
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(rgb, width, height, ColorType::Rgb8)?;
    Ok(png)
}

/// The configured font, or the first well-known system font that exists.
pub fn resolve_font_path(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = configured {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(ReportError::ChartError(format!(
            "Font file {} does not exist",
            path.display()
        )));
    }

    DEFAULT_FONT_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| {
            ReportError::ChartError(format!(
                "No TrueType font found; set {} to a .ttf file",
                ENV_FONT
            ))
        })
}

/// plotters keeps registered fonts for the life of the process, so the
/// first successfully registered file is used by every renderer.
fn register_font_file(path: &Path) -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| {
            let bytes = fs::read(path)
                .map_err(|e| format!("Cannot read font {}: {}", path.display(), e))?;
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            register_font(FONT_FAMILY, FontStyle::Normal, bytes)
                .map_err(|_| format!("{} is not a usable TrueType font", path.display()))?;
            info!("Using chart font {}", path.display());
            Ok(())
        })
        .clone()
        .map_err(ReportError::ChartError)
}
