//! Czech text helpers for notification copy.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Suffix appended to shortened previews.
pub const ELLIPSIS: &str = "...";

/// First `max_chars` characters of `text`, with [`ELLIPSIS`] if cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// `n` with the matching Czech plural of "day": 1 den, 2 dny, 5 dní.
pub fn days(n: i64) -> String {
    let word = match n.abs() {
        1 => "den",
        2..=4 => "dny",
        _ => "dní",
    };
    format!("{n} {word}")
}

/// Czech date format, e.g. `1. 11. 2026`.
pub fn format_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format("%-d. %-m. %Y").to_string()
}

/// Price in whole crowns with space-grouped thousands, e.g. `125 000 Kč`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}{grouped} Kč")
}

/// Comma-separated list, e.g. `název, datum`.
pub fn join_list(items: &[&str]) -> String {
    items.join(", ")
}
