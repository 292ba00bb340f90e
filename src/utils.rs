pub mod date_formatter;

/// Formats a number with at most nine decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1e9).round() / 1e9;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let s = format!("{:.9}", rounded);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}
