use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::api::ExpenseBackend;
use crate::dashboard::Dashboard;
use crate::error::{Result, SpendError};
use crate::filter::FilterCriteria;
use crate::fmt::money;
use crate::models::{Category, ExpenseId, ExpensePatch};
use crate::mutation::{MutationCoordinator, MutationIntent, MutationOutcome, MutationPhase};
use crate::tui::{self, View, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

enum BrowseMode {
    Normal,
    GotoPage(String),
    Search(String),
    PageSize(String),
    Period(String),
    EditCategory { query: String, selection: usize },
    ConfirmDelete(ExpenseId),
}

pub enum BrowseAction {
    Continue,
    Close,
    Reload,
    SetCategory(Category),
    Delete(ExpenseId),
}

/// Paged, searchable expense register. All derived state lives in the
/// dashboard; the browser only tracks the cursor and input modes.
pub struct ExpenseBrowser<B> {
    dashboard: Dashboard,
    coord: MutationCoordinator<B>,
    currency: String,
    selected: usize,
    mode: BrowseMode,
    status_message: Option<String>,
    error_message: Option<String>,
    table_state: TableState,
}

/// Parse `YYYY-MM`, `YYYY` or an empty string (clear) into period criteria.
fn parse_period(input: &str) -> Result<(Option<u32>, Option<i32>)> {
    let input = input.trim();
    if input.is_empty() {
        return Ok((None, None));
    }
    let bad = || SpendError::validation(format!("Bad period '{input}' (use YYYY or YYYY-MM)"));
    match input.split_once('-') {
        Some((y, m)) => {
            let year = y.parse::<i32>().map_err(|_| bad())?;
            let month = m.parse::<u32>().map_err(|_| bad())?;
            Ok((Some(month), Some(year)))
        }
        None => Ok((None, Some(input.parse::<i32>().map_err(|_| bad())?))),
    }
}

impl<B: ExpenseBackend> ExpenseBrowser<B> {
    pub fn new(dashboard: Dashboard, coord: MutationCoordinator<B>, currency: &str) -> Self {
        Self {
            dashboard,
            coord,
            currency: currency.to_string(),
            selected: 0,
            mode: BrowseMode::Normal,
            status_message: None,
            error_message: None,
            table_state: TableState::default(),
        }
    }

    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let narrow = area.width < 100;

        let edit_height: u16 = match &self.mode {
            BrowseMode::EditCategory { .. } => {
                let matches = self.filtered_categories().len();
                1 + matches.min(9) as u16
            }
            _ => 0,
        };

        let areas = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(edit_height),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
        let (title_area, table_area, edit_area, status_area, keys_area) =
            (areas[0], areas[1], areas[2], areas[3], areas[4]);

        let title = format!(
            "Expenses | {} | Total: {}",
            self.dashboard.criteria().describe(),
            money(self.dashboard.filtered_total(), &self.currency)
        );
        frame.render_widget(Paragraph::new(title).style(HEADER_STYLE), title_area);

        let rows: Vec<Row> = self
            .dashboard
            .page()
            .iter()
            .map(|r| {
                let mode = r.transfer_mode.map(|m| m.label()).unwrap_or("");
                let mut cells = vec![
                    Cell::from(r.date.iso()),
                    Cell::from(r.item.clone()),
                    Cell::from(tui::money_span(r.amount, &self.currency)),
                    Cell::from(r.category_label()),
                ];
                if !narrow {
                    cells.push(Cell::from(mode));
                    cells.push(Cell::from(r.bank_name.clone()));
                }
                Row::new(cells)
            })
            .collect();

        let (widths, headers) = if narrow {
            (
                vec![
                    Constraint::Length(10),
                    Constraint::Fill(1),
                    Constraint::Length(14),
                    Constraint::Length(14),
                ],
                vec!["Date", "Item", "Amount", "Category"],
            )
        } else {
            (
                vec![
                    Constraint::Length(10),
                    Constraint::Fill(1),
                    Constraint::Length(14),
                    Constraint::Length(14),
                    Constraint::Length(8),
                    Constraint::Length(16),
                ],
                vec!["Date", "Item", "Amount", "Category", "Mode", "Bank"],
            )
        };

        let selected = (!self.dashboard.page().is_empty()).then_some(self.selected);
        self.table_state.select(selected);
        let table = Table::new(rows, widths)
            .header(Row::new(headers).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        if edit_height > 0 {
            let query = match &self.mode {
                BrowseMode::EditCategory { query, .. } => query.as_str(),
                _ => "",
            };
            let selection = match &self.mode {
                BrowseMode::EditCategory { selection, .. } => *selection,
                _ => 0,
            };
            let matches = self.filtered_categories();
            let mut lines = vec![Line::from(format!("  Category: {query}\u{2588}"))];
            if matches.is_empty() {
                lines.push(Line::from(Span::styled(
                    "    (no matches)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for (i, cat) in matches.iter().enumerate() {
                let marker = if i == selection { ">" } else { " " };
                lines.push(Line::from(format!("  {marker} {}", cat.label())));
            }
            frame.render_widget(Paragraph::new(lines), edit_area);
        }

        let mut status = format!(
            "Page {} of {} | {} of {} expenses | {} per page",
            self.dashboard.current_page(),
            self.dashboard.total_pages(),
            self.dashboard.filtered().len(),
            self.dashboard.store().len(),
            self.dashboard.page_size(),
        );
        if let Some(msg) = &self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        let status_widget = match (&self.error_message, self.coord.phase()) {
            (Some(err), _) => Paragraph::new(format!("{status} | {err}")).style(ERROR_STYLE),
            (None, MutationPhase::Failed) => Paragraph::new(status).style(ERROR_STYLE),
            _ => Paragraph::new(status).style(FOOTER_STYLE),
        };
        frame.render_widget(status_widget, status_area);

        let keys_widget = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  n/p:page  g:goto  /:search  f:period  s:page size  e:category  d:delete  r:reload  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
            BrowseMode::Search(input) => {
                Paragraph::new(format!("Search (Esc clears): {input}\u{2588}"))
            }
            BrowseMode::PageSize(input) => Paragraph::new(format!("Page size: {input}\u{2588}")),
            BrowseMode::Period(input) => {
                let years: Vec<String> =
                    self.dashboard.years().iter().map(|y| y.to_string()).collect();
                Paragraph::new(format!(
                    "Period (YYYY-MM, YYYY, empty for all; years: {}): {input}\u{2588}",
                    years.join(", ")
                ))
            }
            BrowseMode::EditCategory { .. } => {
                Paragraph::new("Type to filter, Enter=select, Esc=cancel").style(FOOTER_STYLE)
            }
            BrowseMode::ConfirmDelete(id) => {
                Paragraph::new(format!("Delete expense {id}? (y/n)")).style(ERROR_STYLE)
            }
        };
        frame.render_widget(keys_widget, keys_area);
    }

    /// Handle a key event. Returns what the caller should do next.
    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status_message = None;
        self.coord.acknowledge();

        match &self.mode {
            BrowseMode::Normal => match code {
                KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
                KeyCode::Down => {
                    if self.selected + 1 < self.dashboard.page().len() {
                        self.selected += 1;
                    }
                }
                KeyCode::Up => {
                    self.selected = self.selected.saturating_sub(1);
                }
                KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                    if self.dashboard.next_page() {
                        self.selected = 0;
                    } else {
                        self.status_message = Some("Last page".into());
                    }
                }
                KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                    if self.dashboard.prev_page() {
                        self.selected = 0;
                    } else {
                        self.status_message = Some("First page".into());
                    }
                }
                KeyCode::Home => {
                    self.dashboard.go_to_page(1);
                    self.selected = 0;
                }
                KeyCode::End => {
                    let last = self.dashboard.total_pages();
                    self.dashboard.go_to_page(last);
                    self.selected = 0;
                }
                KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
                KeyCode::Char('/') => {
                    let current = self.dashboard.criteria().search_term.clone().unwrap_or_default();
                    self.mode = BrowseMode::Search(current);
                }
                KeyCode::Char('s') => self.mode = BrowseMode::PageSize(String::new()),
                KeyCode::Char('f') => self.mode = BrowseMode::Period(String::new()),
                KeyCode::Char('e') | KeyCode::Enter => {
                    if self.selected_id().is_some() {
                        self.mode = BrowseMode::EditCategory {
                            query: String::new(),
                            selection: 0,
                        };
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_id() {
                        self.mode = BrowseMode::ConfirmDelete(id);
                    }
                }
                KeyCode::Char('r') => return BrowseAction::Reload,
                _ => {}
            },
            BrowseMode::Search(_) => self.handle_search_key(code),
            BrowseMode::GotoPage(_) | BrowseMode::PageSize(_) | BrowseMode::Period(_) => {
                match code {
                    KeyCode::Esc => self.mode = BrowseMode::Normal,
                    KeyCode::Enter => self.submit_input(),
                    KeyCode::Backspace => self.input_backspace(),
                    KeyCode::Char(c) => self.input_push(c),
                    _ => {}
                }
            }
            BrowseMode::EditCategory { .. } => return self.handle_edit_category_key(code),
            BrowseMode::ConfirmDelete(id) => {
                let id = id.clone();
                self.mode = BrowseMode::Normal;
                if matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    return BrowseAction::Delete(id);
                }
                self.status_message = Some("Delete cancelled".into());
            }
        }
        BrowseAction::Continue
    }

    /// Run the backend side of an action. Failures land in the status bar;
    /// the store is left as it was.
    pub fn perform(&mut self, action: BrowseAction) -> ViewAction {
        let result = match action {
            BrowseAction::Continue => return ViewAction::Continue,
            BrowseAction::Close => return ViewAction::Close,
            BrowseAction::Reload => self
                .dashboard
                .reload(&mut self.coord)
                .map(|()| format!("Loaded {} expenses", self.dashboard.store().len())),
            BrowseAction::SetCategory(category) => match self.selected_id() {
                Some(id) => {
                    let patch = ExpensePatch {
                        category: Some(Some(category)),
                        ..Default::default()
                    };
                    self.apply(MutationIntent::Update { id, patch })
                }
                None => return ViewAction::Continue,
            },
            BrowseAction::Delete(id) => self.apply(MutationIntent::Delete(id)),
        };
        match result {
            Ok(msg) => {
                self.error_message = None;
                self.status_message = Some(msg);
            }
            Err(e) if e.is_remote() => {
                self.error_message = Some(format!("{e} (nothing was changed)"));
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
        self.clamp_selection();
        ViewAction::Continue
    }

    fn apply(&mut self, intent: MutationIntent) -> Result<String> {
        let outcome = self.dashboard.apply(&mut self.coord, intent)?;
        Ok(match outcome {
            MutationOutcome::Created(r) => format!("Added {}", r.item),
            MutationOutcome::Reloaded { count } => format!("Loaded {count} expenses"),
            MutationOutcome::Accepted => "Added (press r to reload)".to_string(),
            MutationOutcome::Updated(r) => format!("Updated {}", r.item),
            MutationOutcome::Deleted(r) => format!("Deleted {}", r.item),
        })
    }

    fn selected_id(&self) -> Option<ExpenseId> {
        self.dashboard.page().get(self.selected).map(|r| r.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.dashboard.page().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.mode = BrowseMode::Normal,
            KeyCode::Esc => {
                self.dashboard.set_search(None);
                self.mode = BrowseMode::Normal;
            }
            KeyCode::Backspace | KeyCode::Char(_) => {
                if let BrowseMode::Search(term) = &mut self.mode {
                    match code {
                        KeyCode::Char(c) => term.push(c),
                        _ => {
                            term.pop();
                        }
                    }
                    let term = term.clone();
                    self.dashboard.set_search(Some(term));
                }
            }
            _ => return,
        }
        self.selected = 0;
    }

    fn input_push(&mut self, c: char) {
        if let BrowseMode::GotoPage(s) | BrowseMode::PageSize(s) | BrowseMode::Period(s) =
            &mut self.mode
        {
            s.push(c);
        }
    }

    fn input_backspace(&mut self) {
        if let BrowseMode::GotoPage(s) | BrowseMode::PageSize(s) | BrowseMode::Period(s) =
            &mut self.mode
        {
            s.pop();
        }
    }

    fn submit_input(&mut self) {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        match mode {
            BrowseMode::GotoPage(input) => match input.trim().parse::<usize>() {
                Ok(page) if self.dashboard.go_to_page(page) => self.selected = 0,
                _ => {
                    self.status_message = Some(format!(
                        "No page {} (1-{})",
                        input.trim(),
                        self.dashboard.total_pages()
                    ))
                }
            },
            BrowseMode::PageSize(input) => {
                let result = input
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("Bad page size '{}'", input.trim()))
                    .and_then(|n| self.dashboard.set_page_size(n).map_err(|e| e.to_string()));
                match result {
                    Ok(()) => self.selected = 0,
                    Err(msg) => self.status_message = Some(msg),
                }
            }
            BrowseMode::Period(input) => {
                let search = self.dashboard.criteria().search_term.clone();
                let criteria = parse_period(&input)
                    .and_then(|(month, year)| FilterCriteria::new(month, year, search));
                match criteria {
                    Ok(criteria) => {
                        self.dashboard.set_criteria(criteria);
                        self.selected = 0;
                    }
                    Err(e) => self.status_message = Some(e.to_string()),
                }
            }
            other => self.mode = other,
        }
    }

    fn filtered_categories(&self) -> Vec<Category> {
        let query = match &self.mode {
            BrowseMode::EditCategory { query, .. } => query.to_lowercase(),
            _ => return vec![],
        };
        Category::ALL
            .iter()
            .copied()
            .filter(|c| c.label().to_lowercase().contains(&query))
            .take(9)
            .collect()
    }

    fn handle_edit_category_key(&mut self, code: KeyCode) -> BrowseAction {
        match code {
            KeyCode::Char(c) => {
                if let BrowseMode::EditCategory { query, selection } = &mut self.mode {
                    query.push(c);
                    *selection = 0;
                }
            }
            KeyCode::Backspace => {
                if let BrowseMode::EditCategory { query, selection } = &mut self.mode {
                    query.pop();
                    *selection = 0;
                }
            }
            KeyCode::Up => {
                if let BrowseMode::EditCategory { selection, .. } = &mut self.mode {
                    *selection = selection.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                let count = self.filtered_categories().len();
                if let BrowseMode::EditCategory { selection, .. } = &mut self.mode {
                    if *selection + 1 < count {
                        *selection += 1;
                    }
                }
            }
            KeyCode::Enter => {
                let matches = self.filtered_categories();
                let selection = match &self.mode {
                    BrowseMode::EditCategory { selection, .. } => *selection,
                    _ => 0,
                };
                if let Some(cat) = matches.get(selection.min(matches.len().saturating_sub(1))) {
                    self.mode = BrowseMode::Normal;
                    return BrowseAction::SetCategory(*cat);
                }
            }
            KeyCode::Esc => self.mode = BrowseMode::Normal,
            _ => {}
        }
        BrowseAction::Continue
    }
}

impl<B: ExpenseBackend> View for ExpenseBrowser<B> {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_frame(frame);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        let action = self.handle_key_event(code);
        self.perform(action)
    }
}
