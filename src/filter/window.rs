use chrono::{Days, NaiveDate, Utc};

/// Trailing window of whole calendar days ending at a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    days: u32,
    today: NaiveDate,
}

impl DateWindow {
    pub fn new(days: u32, today: NaiveDate) -> Self {
        Self { days, today }
    }

    /// Window ending at today's UTC date.
    pub fn ending_today(days: u32) -> Self {
        Self::new(days, Utc::now().date_naive())
    }

    /// First admitted date, `today - days`.
    pub fn cutoff(&self) -> NaiveDate {
        self.today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn contains(&self, published: NaiveDate) -> bool {
        published >= self.cutoff()
    }
}

/// True when `published` falls on or after `reference - window_days`.
///
/// Later-than-reference dates are admitted.
pub fn is_within_window(published: NaiveDate, window_days: u32, reference: NaiveDate) -> bool {
    DateWindow::new(window_days, reference).contains(published)
}
