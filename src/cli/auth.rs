use std::io::{self, BufRead, Write};

use colored::Colorize;
use zeroize::Zeroizing;

use crate::api::ApiClient;
use crate::error::Result;
use crate::forms::{check_credentials, check_password_confirmation};
use crate::session::SessionContext;
use crate::settings::load_settings;

fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn username(user: Option<String>) -> Result<String> {
    match user {
        Some(u) => Ok(u.trim().to_string()),
        None => prompt_line("Username: "),
    }
}

fn password(label: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(rpassword::prompt_password(label)?))
}

pub fn register(user: Option<String>) -> Result<()> {
    let user = username(user)?;
    let pwd = password("Password: ")?;
    let confirm = password("Confirm password: ")?;
    check_credentials(&user, &pwd)?;
    check_password_confirmation(&pwd, &confirm)?;

    let settings = load_settings();
    let mut client = ApiClient::new(&settings, SessionContext::load())?;
    client.register(&user, &pwd)?;
    println!(
        "{} Registered {}. Run `spendlog login` to sign in.",
        "\u{2713}".green(),
        user.bold()
    );
    Ok(())
}

pub fn login(user: Option<String>) -> Result<()> {
    let user = username(user)?;
    let pwd = password("Password: ")?;
    check_credentials(&user, &pwd)?;

    let settings = load_settings();
    let mut client = ApiClient::new(&settings, SessionContext::load())?;
    client.login(&user, &pwd)?;
    println!(
        "{} Logged in as {} ({})",
        "\u{2713}".green(),
        user.bold(),
        client.base_url()
    );
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut session = SessionContext::load();
    let who = session.user().map(str::to_string);
    session.end()?;
    match who {
        Some(user) => println!("Logged out {user}."),
        None => println!("No session to end."),
    }
    Ok(())
}
