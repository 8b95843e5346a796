use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_workspace, FilterArgs};
use crate::error::Result;
use crate::filter::{filter, FilterCriteria};
use crate::fmt::{money, month_name};
use crate::reports::{self, CategoryTotal};

fn category_table(categories: &[CategoryTotal], total: rust_decimal::Decimal, currency: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Count"]);
    for item in categories {
        table.add_row(vec![
            Cell::new(&item.category),
            Cell::new(money(item.amount, currency)),
            Cell::new(format!("{:.1}%", item.pct)),
            Cell::new(item.count),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total, currency).bold()),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

pub fn total(filter_args: FilterArgs) -> Result<()> {
    let criteria = filter_args.criteria()?;
    let ws = open_workspace()?;
    let scoped = filter(ws.store.records(), &criteria);
    let report = reports::get_total_report(&scoped);

    if report.count == 0 {
        println!("No expenses found ({}).", criteria.describe());
        return Ok(());
    }
    let table = category_table(&report.categories, report.total, &ws.settings.currency);
    println!(
        "Total Expenses: {} ({} expenses, {})\n{table}",
        money(report.total, &ws.settings.currency).bold(),
        report.count,
        criteria.describe()
    );
    Ok(())
}

pub fn monthly(month: u32, year: i32) -> Result<()> {
    // rejects month outside 1-12 before any request
    FilterCriteria::new(Some(month), Some(year), None)?;
    let ws = open_workspace()?;
    let analysis = reports::monthly_analysis(ws.store.records(), Some(month), Some(year));

    let period = format!("{} {year}", month_name(month));
    if analysis.is_empty() {
        println!("No expenses in {period}.");
        return Ok(());
    }
    let table = category_table(&analysis.categories, analysis.total, &ws.settings.currency);
    println!("Monthly Analysis: {period}\n{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::record;

    #[test]
    fn test_category_table_lists_categories_and_total() {
        let records = vec![
            record("1", "2024-01-05", "100", Some("Food")),
            record("2", "2024-01-20", "50", Some("Food")),
            record("3", "2024-02-01", "30", Some("Rent")),
        ];
        let analysis = reports::monthly_analysis(&records, Some(1), Some(2024));
        let text = category_table(&analysis.categories, analysis.total, "Rs").to_string();
        assert!(text.contains("Food"));
        assert!(text.contains("Rs 150.00"));
        assert!(!text.contains("Rent"));
    }
}
