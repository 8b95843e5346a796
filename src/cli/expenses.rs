use std::io::{self, BufRead, Write};

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_workspace, ExpenseFields, FilterArgs};
use crate::dashboard::Dashboard;
use crate::error::{Result, SpendError};
use crate::fmt::money;
use crate::models::{ExpenseId, ExpenseRecord};
use crate::mutation::{MutationIntent, MutationOutcome};

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn expense_table(records: &[ExpenseRecord], currency: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Item", "Category", "Mode", "Bank", "Amount"]);
    for r in records {
        table.add_row(vec![
            Cell::new(r.id.as_str()),
            Cell::new(r.date.iso()),
            Cell::new(&r.item),
            Cell::new(r.category_label()),
            Cell::new(r.transfer_mode.map(|m| m.label()).unwrap_or("")),
            Cell::new(&r.bank_name),
            Cell::new(money(r.amount, currency)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn list(filter: FilterArgs, page: usize, page_size: Option<usize>) -> Result<()> {
    let criteria = filter.criteria()?;
    let ws = open_workspace()?;
    let page_size = page_size.unwrap_or(ws.settings.page_size);
    let mut dashboard = Dashboard::new(ws.store, criteria, page_size)?;

    if dashboard.filtered().is_empty() {
        println!("No expenses found ({}).", dashboard.criteria().describe());
        return Ok(());
    }
    if !dashboard.go_to_page(page) {
        return Err(SpendError::validation(format!(
            "Page {page} is out of range (1-{})",
            dashboard.total_pages()
        )));
    }

    let currency = &ws.settings.currency;
    println!("{}", expense_table(dashboard.page(), currency));
    println!(
        "Page {} of {} | {} expenses ({}) | Total: {}",
        dashboard.current_page(),
        dashboard.total_pages(),
        dashboard.filtered().len(),
        dashboard.criteria().describe(),
        money(dashboard.filtered_total(), currency).bold()
    );
    Ok(())
}

pub fn add(fields: ExpenseFields) -> Result<()> {
    let mut draft = fields.into_draft();
    if draft.date.is_none() {
        draft.date = Some(today().format("%Y-%m-%d").to_string());
    }
    let new = draft.into_new_expense(today())?;

    let mut ws = open_workspace()?;
    match ws.coord.submit(&mut ws.store, MutationIntent::Create(new))? {
        MutationOutcome::Created(r) => println!(
            "{} Added {} ({}) as {}",
            "\u{2713}".green(),
            r.item.bold(),
            money(r.amount, &ws.settings.currency),
            r.id
        ),
        MutationOutcome::Accepted => println!(
            "{} Added. Run `spendlog list` to see it.",
            "\u{2713}".green()
        ),
        _ => println!("{} Added. {} expenses on record.", "\u{2713}".green(), ws.store.len()),
    }
    Ok(())
}

pub fn edit(id: String, fields: ExpenseFields) -> Result<()> {
    let patch = fields.into_draft().into_patch(today())?;
    if patch.is_empty() {
        return Err(SpendError::validation(
            "Nothing to change. Pass at least one of --date, --item, --amount, --mode, --bank, --category.",
        ));
    }

    let mut ws = open_workspace()?;
    let intent = MutationIntent::Update {
        id: ExpenseId::new(id),
        patch,
    };
    if let MutationOutcome::Updated(r) = ws.coord.submit(&mut ws.store, intent)? {
        println!("{} Updated {}", "\u{2713}".green(), r.id);
        println!("{}", expense_table(std::slice::from_ref(&r), &ws.settings.currency));
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn delete(id: String, yes: bool) -> Result<()> {
    let mut ws = open_workspace()?;
    let id = ExpenseId::new(id);
    let record = ws
        .store
        .get(&id)
        .cloned()
        .ok_or_else(|| SpendError::NotFound(id.to_string()))?;

    if !yes {
        let question = format!(
            "Delete {} ({}) from {}?",
            record.item,
            money(record.amount, &ws.settings.currency),
            record.date
        );
        if !confirm(&question)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ws.coord.submit(&mut ws.store, MutationIntent::Delete(id))?;
    println!("{} Deleted {}", "\u{2713}".green(), record.item.bold());
    Ok(())
}
