pub mod series_store;

pub use series_store::{SeriesStore, CSV_FIELDS};
