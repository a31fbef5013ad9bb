pub mod base;
pub mod yahoo;

pub use base::{Quote, QuoteProvider};
pub use yahoo::YahooProvider;
