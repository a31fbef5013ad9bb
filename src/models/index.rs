/// A market index whose daily close is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedIndex {
    pub symbol: String,
    pub display_name: String,
}

impl TrackedIndex {
    pub fn new(symbol: &str, display_name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// NASDAQ, Dow 30, S&P 500 and the S&P/TSX Composite.
pub fn default_indexes() -> Vec<TrackedIndex> {
    vec![
        TrackedIndex::new("^IXIC", "NASDAQ"),
        TrackedIndex::new("^DJI", "DOW"),
        TrackedIndex::new("^GSPC", "S&P 500"),
        TrackedIndex::new("^GSPTSE", "S&P/TSX Composite index"),
    ]
}
