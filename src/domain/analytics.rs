//! Reading analytics and month-bucketed borrowing counts.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::entities::LoanWithAuthor;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Number of loans started in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

impl MonthCount {
    /// `"2026-03"`, sortable.
    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// `"Mar 2026"`.
    pub fn label(&self) -> String {
        let name = MONTH_ABBREVIATIONS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{} {}", name, self.year)
    }
}

/// The last `months` calendar months ending with the month of `today`,
/// oldest first.
pub fn recent_months(today: NaiveDate, months: u32) -> Vec<(i32, u32)> {
    let current = today.year() * 12 + today.month0() as i32;
    (0..months as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

/// First day of the oldest month in [`recent_months`].
pub fn window_start(today: NaiveDate, months: u32) -> NaiveDate {
    recent_months(today, months)
        .first()
        .and_then(|&(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        .unwrap_or(today)
}

/// Counts `dates` per calendar month over the last `months` months.
/// Dates outside the window are ignored.
pub fn monthly_counts(dates: &[NaiveDate], today: NaiveDate, months: u32) -> Vec<MonthCount> {
    let mut counts: HashMap<(i32, u32), usize> = HashMap::new();
    for date in dates {
        *counts.entry((date.year(), date.month())).or_default() += 1;
    }

    recent_months(today, months)
        .into_iter()
        .map(|(year, month)| MonthCount {
            year,
            month,
            count: counts.get(&(year, month)).copied().unwrap_or(0),
        })
        .collect()
}

/// A student's reading statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingAnalytics {
    pub total_borrowed: usize,
    pub total_returned: usize,
    pub currently_borrowed: usize,
    pub on_time_returns: usize,
    pub late_returns: usize,
    /// Mean lateness over late returns only, rounded to two decimals.
    pub average_days_late: f64,
    /// Most borrowed authors, at most five, most frequent first.
    pub favorite_authors: Vec<(String, usize)>,
    pub monthly: Vec<MonthCount>,
}

pub const ANALYTICS_MONTHS: u32 = 12;
const FAVORITE_AUTHOR_LIMIT: usize = 5;

pub fn reading_analytics(loans: &[LoanWithAuthor], today: NaiveDate) -> ReadingAnalytics {
    let returned: Vec<_> = loans.iter().filter(|l| !l.loan.is_open()).collect();

    let mut on_time = 0;
    let mut late = 0;
    let mut days_late_total = 0;
    for entry in &returned {
        match entry.loan.days_late() {
            Some(days) if days > 0 => {
                late += 1;
                days_late_total += days;
            }
            _ => on_time += 1,
        }
    }

    let average_days_late = if late > 0 {
        ((days_late_total as f64 / late as f64) * 100.0).round() / 100.0
    } else {
        0.0
    };

    let mut author_counts: HashMap<&str, usize> = HashMap::new();
    for author in loans.iter().filter_map(|l| l.author.as_deref()) {
        *author_counts.entry(author).or_default() += 1;
    }
    let mut favorite_authors: Vec<(String, usize)> = author_counts
        .into_iter()
        .map(|(author, count)| (author.to_string(), count))
        .collect();
    favorite_authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    favorite_authors.truncate(FAVORITE_AUTHOR_LIMIT);

    let borrow_dates: Vec<NaiveDate> = loans.iter().map(|l| l.loan.borrow_date).collect();

    ReadingAnalytics {
        total_borrowed: loans.len(),
        total_returned: returned.len(),
        currently_borrowed: loans.len() - returned.len(),
        on_time_returns: on_time,
        late_returns: late,
        average_days_late,
        favorite_authors,
        monthly: monthly_counts(&borrow_dates, today, ANALYTICS_MONTHS),
    }
}
