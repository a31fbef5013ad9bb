pub mod plotters_renderer;

use crate::errors::Result;
use crate::models::index::TrackedIndex;
use crate::models::window::WindowSeries;
use chrono::NaiveDate;

pub use plotters_renderer::PlottersRenderer;

/// Turns one index's selected windows into an encoded image.
pub trait ChartRenderer {
    /// Render `windows` as stacked panels and return the encoded PNG bytes.
    /// `today` anchors the x axis of windows that selected nothing.
    fn render(
        &self,
        index: &TrackedIndex,
        windows: &[WindowSeries],
        today: NaiveDate,
    ) -> Result<Vec<u8>>;
}
