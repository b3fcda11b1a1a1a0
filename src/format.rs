// src/format.rs
//! Display helpers shared by the presenter and the terminal view.

/// `1234567` -> `"1,234,567"`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// One decimal, e.g. `"5.3 km"`.
pub fn distance_km(km: f64) -> String {
    format!("{km:.1} km")
}

pub fn percent(value: u8) -> String {
    format!("{value}%")
}

/// `"<value> / <target>"`, both grouped.
pub fn progress(value: i64, target: i64) -> String {
    format!("{} / {}", thousands(value), thousands(target))
}
