use comfy_table::Table;

use crate::cli::ConfigArgs;
use crate::error::{Result, SpendError};
use crate::paginate::Paginator;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

/// Apply flag overrides. Returns true if anything changed.
fn apply(settings: &mut Settings, args: ConfigArgs) -> Result<bool> {
    let mut changed = false;
    if let Some(url) = args.api_url {
        let url = url.trim().to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SpendError::validation(format!(
                "API URL must start with http:// or https:// (got '{url}')"
            )));
        }
        settings.api_url = url;
        changed = true;
    }
    if let Some(size) = args.page_size {
        Paginator::new(size)?;
        settings.page_size = size;
        changed = true;
    }
    if let Some(currency) = args.currency {
        settings.currency = currency.trim().to_string();
        changed = true;
    }
    if let Some(dir) = args.export_dir {
        settings.export_dir = dir;
        changed = true;
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(SpendError::validation("Timeout must be at least 1 second"));
        }
        settings.timeout_secs = secs;
        changed = true;
    }
    Ok(changed)
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = load_settings();
    if apply(&mut settings, args)? {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["api_url".to_string(), settings.api_url.clone()]);
    table.add_row(vec!["page_size".to_string(), settings.page_size.to_string()]);
    table.add_row(vec!["currency".to_string(), settings.currency.clone()]);
    table.add_row(vec!["export_dir".to_string(), settings.export_dir.clone()]);
    table.add_row(vec!["timeout_secs".to_string(), settings.timeout_secs.to_string()]);
    println!("{table}");
    Ok(())
}
