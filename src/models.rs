use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

/// Bucket name for records without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Backend-assigned identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Groceries,
    Rent,
    Utilities,
    Transport,
    Travel,
    Shopping,
    Health,
    Entertainment,
    Education,
    Bills,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Food,
        Category::Groceries,
        Category::Rent,
        Category::Utilities,
        Category::Transport,
        Category::Travel,
        Category::Shopping,
        Category::Health,
        Category::Entertainment,
        Category::Education,
        Category::Bills,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Groceries => "Groceries",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Transport => "Transport",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::Bills => "Bills",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = SpendError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
                SpendError::validation(format!(
                    "Unknown category '{wanted}' (expected one of: {})",
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Online,
    Cash,
}

impl TransferMode {
    pub fn label(self) -> &'static str {
        match self {
            TransferMode::Online => "Online",
            TransferMode::Cash => "Cash",
        }
    }
}

impl FromStr for TransferMode {
    type Err = SpendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(TransferMode::Online),
            "cash" => Ok(TransferMode::Cash),
            other => Err(SpendError::validation(format!(
                "Unknown transfer mode '{other}' (expected Online or Cash)"
            ))),
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar date of an expense. Time-of-day on the wire is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpenseDate(NaiveDate);

impl ExpenseDate {
    /// Accepts `YYYY-MM-DD` or a full ISO-8601 timestamp; only the date part
    /// before `T` is used.
    pub fn parse_wire(raw: &str) -> Option<Self> {
        let day = raw.trim().split('T').next()?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok().map(Self)
    }

    pub fn calendar_year(self) -> i32 {
        self.0.year()
    }

    /// 1-based month (January = 1). Every month comparison goes through here.
    pub fn calendar_month(self) -> u32 {
        self.0.month0() + 1
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`, the form sent to the backend.
    pub fn iso(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `DD-MM-YYYY`, the form used in exports.
    pub fn dmy(self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }
}

impl fmt::Display for ExpenseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub date: ExpenseDate,
    pub item: String,
    pub category: Option<Category>,
    pub transfer_mode: Option<TransferMode>,
    pub bank_name: String,
    pub amount: Decimal,
}

impl ExpenseRecord {
    pub fn category_label(&self) -> &'static str {
        self.category.map(Category::label).unwrap_or(UNCATEGORIZED)
    }

    /// Text form of every field, used by free-text search.
    pub fn field_texts(&self) -> [String; 7] {
        [
            self.id.to_string(),
            self.date.iso(),
            self.item.clone(),
            self.category_label().to_string(),
            self.transfer_mode.map(|m| m.label().to_string()).unwrap_or_default(),
            self.bank_name.clone(),
            self.amount.to_string(),
        ]
    }
}

/// Expense record as the backend sends it. Loosely typed on purpose: amounts
/// arrive as strings or numbers and ids as `_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseWire {
    #[serde(rename = "_id", alias = "id")]
    pub id: serde_json::Value,
    pub date: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "transferMode")]
    pub transfer_mode: Option<String>,
    #[serde(default, rename = "bankName")]
    pub bank_name: Option<String>,
    pub amount: serde_json::Value,
}

fn id_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a wire amount. Malformed, negative or non-finite values are errors,
/// never zero.
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    Some(amount)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

impl TryFrom<ExpenseWire> for ExpenseRecord {
    type Error = SpendError;

    fn try_from(wire: ExpenseWire) -> Result<Self> {
        let id = id_text(&wire.id);
        let date = ExpenseDate::parse_wire(&wire.date).ok_or_else(|| SpendError::InvalidDate {
            id: id.clone(),
            raw: wire.date.clone(),
        })?;
        let amount = parse_amount(&wire.amount).ok_or_else(|| SpendError::InvalidAmount {
            id: id.clone(),
            raw: id_text(&wire.amount),
        })?;
        let category = non_empty(wire.category)
            .map(|c| c.parse::<Category>())
            .transpose()?;
        let transfer_mode = non_empty(wire.transfer_mode)
            .map(|m| m.parse::<TransferMode>())
            .transpose()?;
        Ok(ExpenseRecord {
            id: ExpenseId::new(id),
            date,
            item: wire.item,
            category,
            transfer_mode,
            bank_name: wire.bank_name.unwrap_or_default(),
            amount,
        })
    }
}

/// Create payload: every field but the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: ExpenseDate,
    pub item: String,
    pub category: Option<Category>,
    pub transfer_mode: TransferMode,
    pub bank_name: String,
    pub amount: Decimal,
}

impl NewExpense {
    #[cfg(test)]
    pub fn into_record(self, id: ExpenseId) -> ExpenseRecord {
        ExpenseRecord {
            id,
            date: self.date,
            item: self.item,
            category: self.category,
            transfer_mode: Some(self.transfer_mode),
            bank_name: self.bank_name,
            amount: self.amount,
        }
    }
}

/// Update payload. `None` keeps the stored value. For `category` the inner
/// `None` clears it back to uncategorized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub date: Option<ExpenseDate>,
    pub item: Option<String>,
    pub category: Option<Option<Category>>,
    pub transfer_mode: Option<TransferMode>,
    pub bank_name: Option<String>,
    pub amount: Option<Decimal>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        *self == ExpensePatch::default()
    }

    pub fn apply_to(&self, record: &ExpenseRecord) -> ExpenseRecord {
        ExpenseRecord {
            id: record.id.clone(),
            date: self.date.unwrap_or(record.date),
            item: self.item.clone().unwrap_or_else(|| record.item.clone()),
            category: self.category.unwrap_or(record.category),
            transfer_mode: self.transfer_mode.or(record.transfer_mode),
            bank_name: self
                .bank_name
                .clone()
                .unwrap_or_else(|| record.bank_name.clone()),
            amount: self.amount.unwrap_or(record.amount),
        }
    }
}

/// JSON body for `POST /expenses` and `PUT /expenses`.
#[derive(Debug, Serialize)]
pub struct ExpensePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub date: String,
    #[serde(rename = "transferMode")]
    pub transfer_mode: &'static str,
    #[serde(rename = "bankName")]
    pub bank_name: &'a str,
    pub item: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl<'a> ExpensePayload<'a> {
    pub fn for_create(new: &'a NewExpense) -> Self {
        Self {
            id: None,
            date: new.date.iso(),
            transfer_mode: new.transfer_mode.label(),
            bank_name: &new.bank_name,
            item: &new.item,
            category: new.category.map(Category::label),
            amount: new.amount,
        }
    }

    pub fn for_update(record: &'a ExpenseRecord) -> Self {
        Self {
            id: Some(record.id.as_str()),
            date: record.date.iso(),
            transfer_mode: record.transfer_mode.map(TransferMode::label).unwrap_or(""),
            bank_name: &record.bank_name,
            item: &record.item,
            category: record.category.map(Category::label),
            amount: record.amount,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Build a record from short literals; panics on bad input.
    pub fn record(id: &str, date: &str, amount: &str, category: Option<&str>) -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseId::new(id),
            date: ExpenseDate::parse_wire(date).unwrap(),
            item: format!("item {id}"),
            category: category.map(|c| c.parse().unwrap()),
            transfer_mode: Some(TransferMode::Online),
            bank_name: "HDFC".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<ExpenseRecord> {
        let wire: ExpenseWire = serde_json::from_value(value).unwrap();
        ExpenseRecord::try_from(wire)
    }

    #[test]
    fn test_decode_mongo_style_record() {
        let r = decode(json!({
            "_id": "65a1",
            "date": "2024-01-05T00:00:00.000Z",
            "item": "Lunch",
            "category": "food",
            "transferMode": "Online",
            "bankName": "SBI",
            "amount": "100.50"
        }))
        .unwrap();
        assert_eq!(r.id.as_str(), "65a1");
        assert_eq!(r.date.iso(), "2024-01-05");
        assert_eq!(r.category, Some(Category::Food));
        assert_eq!(r.amount, Decimal::new(10050, 2));
    }

    #[test]
    fn test_decode_numeric_amount_and_missing_category() {
        let r = decode(json!({"id": 7, "date": "2024-02-01", "amount": 30})).unwrap();
        assert_eq!(r.id.as_str(), "7");
        assert_eq!(r.category_label(), UNCATEGORIZED);
        assert_eq!(r.transfer_mode, None);
        assert_eq!(r.amount, Decimal::from(30));
    }

    #[test]
    fn test_empty_category_is_uncategorized() {
        let r = decode(json!({"_id": "a", "date": "2024-02-01", "amount": "1", "category": ""}))
            .unwrap();
        assert_eq!(r.category, None);
    }

    #[test]
    fn test_malformed_amount_is_an_error() {
        let err = decode(json!({"_id": "x1", "date": "2024-01-01", "amount": "abc"})).unwrap_err();
        assert!(matches!(err, SpendError::InvalidAmount { ref id, .. } if id == "x1"));
    }

    #[test]
    fn test_negative_amount_is_an_error() {
        let err = decode(json!({"_id": "x2", "date": "2024-01-01", "amount": -5})).unwrap_err();
        assert!(matches!(err, SpendError::InvalidAmount { .. }));
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        let err = decode(json!({"_id": "x3", "date": "2024-13-40", "amount": 1})).unwrap_err();
        assert!(matches!(err, SpendError::InvalidDate { .. }));
    }

    #[test]
    fn test_calendar_month_is_one_based() {
        let d = ExpenseDate::parse_wire("2024-01-31").unwrap();
        assert_eq!(d.calendar_month(), 1);
        let d = ExpenseDate::parse_wire("2024-12-01").unwrap();
        assert_eq!(d.calendar_month(), 12);
        assert_eq!(d.dmy(), "01-12-2024");
    }

    #[test]
    fn test_patch_keeps_unedited_fields() {
        let original = testing::record("1", "2024-01-05", "100", Some("Food"));
        let patch = ExpensePatch {
            item: Some("Dinner".into()),
            ..Default::default()
        };
        let merged = patch.apply_to(&original);
        assert_eq!(merged.item, "Dinner");
        assert_eq!(merged.amount, original.amount);
        assert_eq!(merged.date, original.date);
        assert_eq!(merged.bank_name, original.bank_name);
        assert_eq!(merged.category, original.category);
    }

    #[test]
    fn test_patch_can_clear_category() {
        let original = testing::record("1", "2024-01-05", "100", Some("Food"));
        let patch = ExpensePatch {
            category: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.apply_to(&original).category, None);
    }

    #[test]
    fn test_update_payload_carries_id_and_numeric_amount() {
        let r = testing::record("abc", "2024-03-02", "12.5", None);
        let body = serde_json::to_value(ExpensePayload::for_update(&r)).unwrap();
        assert_eq!(body["id"], "abc");
        assert_eq!(body["amount"], 12.5);
        assert_eq!(body["transferMode"], "Online");
        assert!(body.get("category").is_none());
    }
}
