mod api;
mod browser;
mod cli;
mod dashboard;
mod error;
mod export;
mod filter;
mod fmt;
mod forms;
mod models;
mod mutation;
mod paginate;
#[cfg(feature = "pdf")]
mod pdf;
mod reports;
mod session;
mod settings;
mod store;
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ExportCommands, ReportCommands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "spendlog=debug" } else { "spendlog=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Register { user } => cli::auth::register(user),
        Commands::Login { user } => cli::auth::login(user),
        Commands::Logout => cli::auth::logout(),
        Commands::Status => cli::status::run(),
        Commands::Config(args) => cli::config::run(args),
        Commands::List {
            filter,
            page,
            page_size,
        } => cli::expenses::list(filter, page, page_size),
        Commands::Browse { filter } => cli::browse::run(filter),
        Commands::Add { fields } => cli::expenses::add(fields),
        Commands::Edit { id, fields } => cli::expenses::edit(id, fields),
        Commands::Delete { id, yes } => cli::expenses::delete(id, yes),
        Commands::Report { command } => match command {
            ReportCommands::Total { filter } => cli::report::total(filter),
            ReportCommands::Monthly { month, year } => cli::report::monthly(month, year),
        },
        Commands::Export { command } => match command {
            ExportCommands::Csv { filter, output } => cli::export::csv(filter, output),
            #[cfg(feature = "pdf")]
            ExportCommands::Pdf { filter, output } => cli::export::pdf(filter, output),
            #[cfg(feature = "pdf")]
            ExportCommands::Monthly {
                month,
                year,
                output,
            } => cli::export::monthly(month, year, output),
        },
    };

    if let Err(e) = result {
        tracing::debug!("command failed: {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
