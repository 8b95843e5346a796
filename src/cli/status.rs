use colored::Colorize;

use crate::error::Result;
use crate::session::{session_path, SessionContext, SessionState};
use crate::settings::{load_settings, settings_file_exists, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let session = SessionContext::load();

    let settings_note = if settings_file_exists() { "" } else { " (defaults)" };
    println!("Settings:   {}{settings_note}", settings_path().display());
    println!("Backend:    {}", settings.effective_api_url());
    println!("Session:    {}", session_path().display());

    let state = match session.state() {
        SessionState::Valid { user, .. } => format!("logged in as {}", user.bold()),
        SessionState::Expired { user } => {
            format!("{} for {user}", "expired".yellow())
        }
        SessionState::Absent => "not logged in".dimmed().to_string(),
    };
    println!("User:       {state}");

    println!();
    println!("Page size:  {}", settings.page_size);
    println!("Currency:   {}", settings.currency);
    println!("Exports:    {}", settings.export_dir().display());

    if !matches!(session.state(), SessionState::Valid { .. }) {
        println!();
        println!("Run `spendlog login` to sign in.");
    }
    Ok(())
}
