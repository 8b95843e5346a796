use std::path::PathBuf;

use colored::Colorize;

use crate::cli::{open_workspace, FilterArgs};
use crate::error::Result;
use crate::export::{default_path, write_csv_file};
use crate::filter::filter;
use crate::fmt::money;
use crate::reports;

fn report_written(path: &std::path::Path, rows: usize) {
    println!("Wrote {} ({rows} rows)", path.display().to_string().bold());
}

pub fn csv(filter_args: FilterArgs, output: Option<String>) -> Result<()> {
    let criteria = filter_args.criteria()?;
    let ws = open_workspace()?;
    let records = filter(ws.store.records(), &criteria);
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&ws.settings.export_dir(), "Expense Report", "csv"));
    write_csv_file(&records, &path)?;
    report_written(&path, records.len());
    println!(
        "Total: {}",
        money(reports::total(&records), &ws.settings.currency)
    );
    Ok(())
}

#[cfg(feature = "pdf")]
pub fn pdf(filter_args: FilterArgs, output: Option<String>) -> Result<()> {
    let criteria = filter_args.criteria()?;
    let ws = open_workspace()?;
    let records = filter(ws.store.records(), &criteria);
    let bytes = crate::pdf::render_expenses(&records, &ws.settings.currency, &criteria.describe())?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&ws.settings.export_dir(), "Expense_Data", "pdf"));
    crate::export::write_bytes(&bytes, &path)?;
    report_written(&path, records.len());
    Ok(())
}

#[cfg(feature = "pdf")]
pub fn monthly(month: u32, year: i32, output: Option<String>) -> Result<()> {
    crate::filter::FilterCriteria::new(Some(month), Some(year), None)?;
    let ws = open_workspace()?;
    let analysis = reports::monthly_analysis(ws.store.records(), Some(month), Some(year));
    let bytes = crate::pdf::render_monthly(&analysis, &ws.settings.currency)?;
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&ws.settings.export_dir(), "Monthly_Analysis", "pdf"));
    crate::export::write_bytes(&bytes, &path)?;
    report_written(&path, analysis.categories.len());
    Ok(())
}
