//! Language-invariant number rendering for prose fields.

use crate::types::{RatioKey, Unit};

/// Render a ratio value the way its unit is displayed.
pub fn ratio_value(key: RatioKey, value: f64) -> String {
    match key.unit() {
        Unit::Percent => percent(value),
        Unit::Months => months(value),
        Unit::Multiple => ratio(value),
    }
}

/// `1.9286` -> `1.93`
pub fn ratio(value: f64) -> String {
    format!("{:.2}", value)
}

/// Fraction to percentage: `0.0593` -> `5.9%`
pub fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// `3.6` -> `3.6`
pub fn months(value: f64) -> String {
    format!("{:.1}", value)
}

/// Whole currency amount with thousands grouping: `1323220.3` -> `1,323,220`
pub fn amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
