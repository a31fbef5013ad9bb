use crate::models::series::TimeSeries;
use crate::models::window::{LookbackWindow, WindowSeries};
use chrono::NaiveDate;
use log::debug;

/// Points of `series` that fall inside `window` as seen from `today`.
///
/// Records missing a date or a close are dropped, records before the
/// window's start are dropped, and the rest come back sorted ascending by
/// date. Duplicate dates are all kept, in file order.
pub fn select_window(
    series: &TimeSeries,
    window: LookbackWindow,
    today: NaiveDate,
) -> WindowSeries {
    let since = window.since(today);

    let mut points: Vec<(NaiveDate, f64)> = series
        .records
        .iter()
        .filter_map(|r| r.observation())
        .filter(|(date, _)| since.map_or(true, |start| *date >= start))
        .collect();
    points.sort_by_key(|(date, _)| *date);

    let (dates, prices) = points.into_iter().unzip();
    WindowSeries {
        window,
        dates,
        prices,
    }
}

/// All five panels for one index, in display order.
pub fn select_windows(series: &TimeSeries, today: NaiveDate) -> Vec<WindowSeries> {
    LookbackWindow::ALL
        .iter()
        .map(|window| {
            let selected = select_window(series, *window, today);
            debug!(
                "{} {}: {} points",
                series.symbol,
                window.title(),
                selected.len()
            );
            selected
        })
        .collect()
}
