use crate::browser::ExpenseBrowser;
use crate::cli::{open_workspace, FilterArgs};
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::tui;

pub fn run(filter: FilterArgs) -> Result<()> {
    let criteria = filter.criteria()?;
    let ws = open_workspace()?;
    if ws.store.is_empty() {
        println!("No expenses yet. Add one with `spendlog add`.");
        return Ok(());
    }
    let dashboard = Dashboard::new(ws.store, criteria, ws.settings.page_size)?;
    let mut browser = ExpenseBrowser::new(dashboard, ws.coord, &ws.settings.currency);
    tui::run_view(&mut browser)
}
