use rust_decimal::Decimal;

use crate::reports::to_cents;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Format an amount with thousands separators: `Rs 1,234.56`
pub fn money(val: Decimal, currency: &str) -> String {
    let cents = to_cents(val);
    let negative = cents.is_sign_negative() && !cents.is_zero();
    let text = format!("{:.2}", cents.abs());
    let (int_part, dec_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    if currency.is_empty() {
        format!("{sign}{with_commas}.{dec_part}")
    } else {
        format!("{sign}{currency} {with_commas}.{dec_part}")
    }
}

/// Two decimal places, no separators. Used in files other tools read back.
pub fn plain(val: Decimal) -> String {
    format!("{:.2}", to_cents(val))
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}
