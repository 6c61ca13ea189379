//! Dashboard aggregates: category totals and the daily spending series

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{AnnotatedTransaction, Category, DailySpend, SpendingStats};

/// Date formats tried, in order, when ordering the daily series
///
/// `%m/%d/%y` precedes `%m/%d/%Y`: chrono's `%Y` accepts a two-digit year as
/// year 24 AD, while `%y` rejects four digits as trailing input.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a date string as a calendar date
pub fn parse_calendar_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Sum of amounts per category, only for categories that occur
pub fn category_totals(transactions: &[AnnotatedTransaction]) -> BTreeMap<Category, f64> {
    let mut totals = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.category()).or_insert(0.0) += tx.amount();
    }
    totals
}

/// Amounts summed per distinct date string, ascending by calendar date
///
/// Dates are grouped by exact string, so two spellings of the same day stay
/// separate points. Dates that cannot be parsed keep their first-seen order
/// after all parsable ones.
pub fn daily_spending(transactions: &[AnnotatedTransaction]) -> Vec<DailySpend> {
    let mut series: Vec<DailySpend> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for tx in transactions {
        match positions.get(tx.date()) {
            Some(&i) => series[i].amount += tx.amount(),
            None => {
                positions.insert(tx.date(), series.len());
                series.push(DailySpend {
                    date: tx.date().to_string(),
                    amount: tx.amount(),
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal keys
    series.sort_by(|a, b| {
        match (parse_calendar_date(&a.date), parse_calendar_date(&b.date)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    series
}

/// Build the dashboard statistics
pub fn build_stats(total_spent: f64, transactions: &[AnnotatedTransaction]) -> SpendingStats {
    SpendingStats {
        total_spent,
        category_totals: category_totals(transactions),
        daily_spending: daily_spending(transactions),
    }
}
