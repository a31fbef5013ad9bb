use chrono::{Months, NaiveDate};

/// Historical span shown in one chart panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookbackWindow {
    Max,
    FiveYears,
    TwelveMonths,
    SixMonths,
    ThreeMonths,
}

impl LookbackWindow {
    /// Panel order, top to bottom.
    pub const ALL: [LookbackWindow; 5] = [
        LookbackWindow::Max,
        LookbackWindow::FiveYears,
        LookbackWindow::TwelveMonths,
        LookbackWindow::SixMonths,
        LookbackWindow::ThreeMonths,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            LookbackWindow::Max => "MAX",
            LookbackWindow::FiveYears => "5 YEARS",
            LookbackWindow::TwelveMonths => "12 MONTHS",
            LookbackWindow::SixMonths => "6 MONTHS",
            LookbackWindow::ThreeMonths => "3 MONTHS",
        }
    }

    pub fn months_back(&self) -> Option<u32> {
        match self {
            LookbackWindow::Max => None,
            LookbackWindow::FiveYears => Some(60),
            LookbackWindow::TwelveMonths => Some(12),
            LookbackWindow::SixMonths => Some(6),
            LookbackWindow::ThreeMonths => Some(3),
        }
    }

    /// Earliest date included relative to `today`, or `None` for no lower bound.
    ///
    /// Month arithmetic clamps to the end of the month, so 2024-08-31 minus
    /// six months is 2024-02-29.
    pub fn since(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.months_back()
            .and_then(|months| today.checked_sub_months(Months::new(months)))
    }
}

/// Date-sorted points of one window, ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSeries {
    pub window: LookbackWindow,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
}

impl WindowSeries {
    pub fn empty(window: LookbackWindow) -> Self {
        Self {
            window,
            dates: Vec::new(),
            prices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + Clone + '_ {
        self.dates.iter().copied().zip(self.prices.iter().copied())
    }
}
