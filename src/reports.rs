use rust_decimal::{Decimal, RoundingStrategy};

use crate::filter::{filter, FilterCriteria};
use crate::models::ExpenseRecord;

/// Round to cents. Only applied when a figure leaves the aggregator.
pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

pub fn total(records: &[ExpenseRecord]) -> Decimal {
    to_cents(records.iter().map(|r| r.amount).sum())
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
    pub count: usize,
    pub pct: f64,
}

/// Group by category label in encounter order. Sums stay exact until the
/// final rounding.
pub fn aggregate_by_category(records: &[ExpenseRecord]) -> Vec<CategoryTotal> {
    let mut buckets: Vec<(&'static str, Decimal, usize)> = Vec::new();
    for r in records {
        let label = r.category_label();
        match buckets.iter_mut().find(|(name, _, _)| *name == label) {
            Some((_, sum, count)) => {
                *sum += r.amount;
                *count += 1;
            }
            None => buckets.push((label, r.amount, 1)),
        }
    }

    let grand: Decimal = buckets.iter().map(|(_, s, _)| *s).sum();
    buckets
        .into_iter()
        .map(|(name, sum, count)| CategoryTotal {
            category: name.to_string(),
            amount: to_cents(sum),
            count,
            pct: share_pct(sum, grand),
        })
        .collect()
}

fn share_pct(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    let ratio = part / whole * Decimal::ONE_HUNDRED;
    ratio.round_dp(1).to_string().parse().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Whole-history total (dashboard)
// ---------------------------------------------------------------------------

pub struct TotalReport {
    pub categories: Vec<CategoryTotal>,
    pub total: Decimal,
    pub count: usize,
}

pub fn get_total_report(records: &[ExpenseRecord]) -> TotalReport {
    TotalReport {
        categories: aggregate_by_category(records),
        total: total(records),
        count: records.len(),
    }
}

// ---------------------------------------------------------------------------
// Monthly analysis
// ---------------------------------------------------------------------------

pub struct MonthlyAnalysis {
    pub month: u32,
    pub year: i32,
    pub categories: Vec<CategoryTotal>,
    pub total: Decimal,
}

impl MonthlyAnalysis {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Category totals for one exact (month, year) pair, largest first.
///
/// Both halves of the selection are required; a partial selection yields an
/// empty analysis rather than a partial one.
pub fn monthly_analysis(
    records: &[ExpenseRecord],
    month: Option<u32>,
    year: Option<i32>,
) -> MonthlyAnalysis {
    let (Some(month), Some(year)) = (month, year) else {
        return MonthlyAnalysis {
            month: month.unwrap_or(0),
            year: year.unwrap_or(0),
            categories: Vec::new(),
            total: Decimal::ZERO,
        };
    };

    let criteria = FilterCriteria {
        month: Some(month),
        year: Some(year),
        search_term: None,
    };
    let scoped = filter(records, &criteria);

    let mut categories = aggregate_by_category(&scoped);
    // stable sort: ties keep encounter order
    categories.sort_by(|a, b| b.amount.cmp(&a.amount));

    MonthlyAnalysis {
        month,
        year,
        categories,
        total: total(&scoped),
    }
}
