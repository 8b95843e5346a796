//! User-input validation. Everything here runs before any request is sent.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{Result, SpendError};
use crate::models::{parse_amount, Category, ExpenseDate, ExpensePatch, NewExpense, TransferMode};

#[derive(Debug, Clone, Default)]
pub struct ExpenseDraft {
    pub date: Option<String>,
    pub item: Option<String>,
    pub amount: Option<String>,
    pub transfer_mode: Option<String>,
    pub bank_name: Option<String>,
    pub category: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(raw: &str, today: NaiveDate) -> Result<ExpenseDate> {
    let date = ExpenseDate::parse_wire(raw)
        .ok_or_else(|| SpendError::validation(format!("Invalid date '{raw}' (expected YYYY-MM-DD)")))?;
    if date.naive() > today {
        return Err(SpendError::validation(format!(
            "Date {} is in the future",
            date.iso()
        )));
    }
    Ok(date)
}

fn parse_amount_input(raw: &str) -> Result<Decimal> {
    parse_amount(&serde_json::Value::String(raw.to_string())).ok_or_else(|| {
        SpendError::validation(format!(
            "Invalid amount '{raw}' (expected a non-negative number)"
        ))
    })
}

fn parse_category(raw: &str) -> Result<Option<Category>> {
    if raw.eq_ignore_ascii_case(crate::models::UNCATEGORIZED) {
        return Ok(None);
    }
    raw.parse().map(Some)
}

impl ExpenseDraft {
    pub fn into_new_expense(self, today: NaiveDate) -> Result<NewExpense> {
        let (Some(date), Some(item), Some(amount)) =
            (present(&self.date), present(&self.item), present(&self.amount))
        else {
            return Err(SpendError::validation("All fields are required."));
        };
        let transfer_mode = present(&self.transfer_mode)
            .ok_or_else(|| SpendError::validation("Mode of transfer is required (Online or Cash)."))?
            .parse::<TransferMode>()?;
        let bank_name = present(&self.bank_name)
            .ok_or_else(|| SpendError::validation("Bank name is required."))?
            .to_uppercase();
        let category = match present(&self.category) {
            Some(c) => parse_category(c)?,
            None => None,
        };

        Ok(NewExpense {
            date: parse_date(date, today)?,
            item: item.to_string(),
            category,
            transfer_mode,
            bank_name,
            amount: parse_amount_input(amount)?,
        })
    }

    /// Fields given on an edit. Blank values count as not given.
    pub fn into_patch(self, today: NaiveDate) -> Result<ExpensePatch> {
        Ok(ExpensePatch {
            date: present(&self.date).map(|d| parse_date(d, today)).transpose()?,
            item: present(&self.item).map(str::to_string),
            category: present(&self.category).map(parse_category).transpose()?,
            transfer_mode: present(&self.transfer_mode)
                .map(str::parse::<TransferMode>)
                .transpose()?,
            bank_name: present(&self.bank_name).map(str::to_uppercase),
            amount: present(&self.amount).map(parse_amount_input).transpose()?,
        })
    }
}

pub fn check_credentials(user: &str, pwd: &str) -> Result<()> {
    if user.trim().is_empty() || pwd.is_empty() {
        return Err(SpendError::validation("Username and password are required."));
    }
    Ok(())
}

pub fn check_password_confirmation(pwd: &str, confirm: &str) -> Result<()> {
    if pwd != confirm {
        return Err(SpendError::validation("Passwords do not match"));
    }
    Ok(())
}
