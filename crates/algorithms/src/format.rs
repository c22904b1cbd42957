//! Brazilian-locale number formatting and rounding helpers

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Group the digits of an unsigned integer string with `.`
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format a number with `.` thousands separators and `,` decimals.
///
/// `format_number(1234567.84, 1)` gives `"1.234.567,8"`. NaN, infinities
/// and exact zero give `"0"`.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Like [`format_number`], but magnitudes below 0.001 also give `"0"`
pub fn format_number_safe(value: f64, decimals: usize) -> String {
    if !value.is_finite() || value.abs() < 0.001 {
        return "0".to_string();
    }
    format_number(value, decimals)
}

/// One-decimal percentage with a comma separator, e.g. `"12,3%"`
pub fn format_percent(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.1}%", value).replace('.', ",")
}

/// Compact axis label: `1,5M`, `12k` or the plain number
pub fn compact_tick(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{}M", format_number(value / 1_000_000.0, 1))
    } else if value >= 1_000.0 {
        format!("{}k", format_number(value / 1_000.0, 0))
    } else {
        format_number(value, 0)
    }
}
