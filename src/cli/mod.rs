pub mod auth;
pub mod browse;
pub mod config;
pub mod expenses;
pub mod export;
pub mod report;
pub mod status;

use clap::{Args, Parser, Subcommand};

use crate::api::ApiClient;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::forms::ExpenseDraft;
use crate::mutation::MutationCoordinator;
use crate::session::SessionContext;
use crate::settings::{load_settings, Settings};
use crate::store::RecordStore;

#[derive(Parser)]
#[command(name = "spendlog", version, about = "Track personal expenses against a spendlog backend.")]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account on the backend.
    Register {
        /// Username (prompted when omitted)
        #[arg(long)]
        user: Option<String>,
    },
    /// Sign in and store the session token.
    Login {
        /// Username (prompted when omitted)
        #[arg(long)]
        user: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show backend, session and settings.
    Status,
    /// Show or change settings.
    Config(ConfigArgs),
    /// List expenses one page at a time.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page (default from settings)
        #[arg(long = "page-size")]
        page_size: Option<usize>,
    },
    /// Interactively browse, search and edit expenses.
    Browse {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Record a new expense.
    Add {
        #[command(flatten)]
        fields: ExpenseFields,
    },
    /// Change fields of an existing expense.
    Edit {
        /// Expense id
        id: String,
        #[command(flatten)]
        fields: ExpenseFields,
    },
    /// Delete an expense.
    Delete {
        /// Expense id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Totals and category breakdowns.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Write expenses to CSV or PDF.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Month number (1-12)
    #[arg(long)]
    pub month: Option<u32>,
    /// Calendar year, e.g. 2024
    #[arg(long)]
    pub year: Option<i32>,
    /// Case-insensitive text matched against every field
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> Result<FilterCriteria> {
        FilterCriteria::new(self.month, self.year, self.search.clone())
    }
}

#[derive(Args, Debug, Default)]
pub struct ExpenseFields {
    /// Date (YYYY-MM-DD); defaults to today when adding
    #[arg(long)]
    pub date: Option<String>,
    /// What the money was spent on
    #[arg(long)]
    pub item: Option<String>,
    /// Amount, e.g. 249.50
    #[arg(long)]
    pub amount: Option<String>,
    /// Online or Cash
    #[arg(long)]
    pub mode: Option<String>,
    /// Bank name (stored upper-case)
    #[arg(long)]
    pub bank: Option<String>,
    /// Category, e.g. Food or Rent. `Uncategorized` clears it on edit
    #[arg(long)]
    pub category: Option<String>,
}

impl ExpenseFields {
    pub fn into_draft(self) -> ExpenseDraft {
        ExpenseDraft {
            date: self.date,
            item: self.item,
            amount: self.amount,
            transfer_mode: self.mode,
            bank_name: self.bank,
            category: self.category,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Backend base URL
    #[arg(long = "api-url")]
    pub api_url: Option<String>,
    /// Default rows per page
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
    /// Currency label used in tables and exports
    #[arg(long)]
    pub currency: Option<String>,
    /// Directory for exported files
    #[arg(long = "export-dir")]
    pub export_dir: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Overall total with a per-category breakdown.
    Total {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Category totals for one month, largest first.
    Monthly {
        /// Month number (1-12)
        #[arg(long)]
        month: u32,
        /// Calendar year
        #[arg(long)]
        year: i32,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Spreadsheet export (CSV).
    Csv {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (default: <export_dir>/Expense Report-<date>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Expense register as a PDF document.
    #[cfg(feature = "pdf")]
    Pdf {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (default: <export_dir>/Expense_Data-<date>.pdf)
        #[arg(long)]
        output: Option<String>,
    },
    /// Monthly category analysis as a PDF document.
    #[cfg(feature = "pdf")]
    Monthly {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        /// Output path (default: <export_dir>/Monthly_Analysis-<date>.pdf)
        #[arg(long)]
        output: Option<String>,
    },
}

/// Everything an authenticated command needs: settings, a coordinator
/// wrapping the API client, and the freshly loaded store.
pub(crate) struct Workspace {
    pub settings: Settings,
    pub coord: MutationCoordinator<ApiClient>,
    pub store: RecordStore,
}

/// Fails with `AuthRequired` before touching the network when there is no
/// usable session.
pub(crate) fn open_workspace() -> Result<Workspace> {
    let settings = load_settings();
    let session = SessionContext::load();
    session.bearer()?;
    let client = ApiClient::new(&settings, session)?;
    let mut coord = MutationCoordinator::new(client);
    let mut store = RecordStore::default();
    coord.load(&mut store)?;
    tracing::debug!(count = store.len(), "loaded expenses");
    Ok(Workspace {
        settings,
        coord,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_reject_bad_month() {
        let args = FilterArgs {
            month: Some(13),
            ..Default::default()
        };
        assert!(args.criteria().is_err());
    }

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::try_parse_from([
            "spendlog", "list", "--month", "1", "--year", "2024", "--search", "sbi", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::List { filter, page, .. } => {
                assert_eq!(filter.month, Some(1));
                assert_eq!(filter.search.as_deref(), Some("sbi"));
                assert_eq!(page, 2);
            }
            _ => panic!("expected list"),
        }
    }
}
