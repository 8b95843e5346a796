use crate::error::{Result, SpendError};
use crate::models::ExpenseRecord;

/// Filter criteria. Every present field narrows the result (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub search_term: Option<String>,
}

impl FilterCriteria {
    /// Build criteria from user input, rejecting months outside 1..=12 and
    /// dropping blank search terms.
    pub fn new(month: Option<u32>, year: Option<i32>, search_term: Option<String>) -> Result<Self> {
        if let Some(m) = month {
            if !(1..=12).contains(&m) {
                return Err(SpendError::validation(format!(
                    "Month must be between 1 and 12 (got {m})"
                )));
            }
        }
        let search_term = search_term
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self { month, year, search_term })
    }

    pub fn is_empty(&self) -> bool {
        self.month.is_none() && self.year.is_none() && self.search_term.is_none()
    }

    /// Short human description, e.g. "2024-01, search 'sbi'".
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "all expenses".to_string();
        }
        let mut parts = Vec::new();
        match (self.year, self.month) {
            (Some(y), Some(m)) => parts.push(format!("{y:04}-{m:02}")),
            (Some(y), None) => parts.push(format!("{y}")),
            (None, Some(m)) => parts.push(format!("month {m} (all years)")),
            (None, None) => {}
        }
        if let Some(term) = &self.search_term {
            parts.push(format!("search '{term}'"));
        }
        parts.join(", ")
    }
}

fn matches_search(record: &ExpenseRecord, needle_lower: &str) -> bool {
    record
        .field_texts()
        .iter()
        .any(|text| text.to_lowercase().contains(needle_lower))
}

/// Derive the filtered view. Year first, then month, then search; input order
/// is preserved.
pub fn filter(records: &[ExpenseRecord], criteria: &FilterCriteria) -> Vec<ExpenseRecord> {
    let needle = criteria.search_term.as_ref().map(|s| s.to_lowercase());
    records
        .iter()
        .filter(|r| criteria.year.map_or(true, |y| r.date.calendar_year() == y))
        .filter(|r| criteria.month.map_or(true, |m| r.date.calendar_month() == m))
        .filter(|r| needle.as_deref().map_or(true, |n| matches_search(r, n)))
        .cloned()
        .collect()
}

/// Distinct calendar years present, ascending.
pub fn available_years(records: &[ExpenseRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = records.iter().map(|r| r.date.calendar_year()).collect();
    years.sort_unstable();
    years.dedup();
    years
}
