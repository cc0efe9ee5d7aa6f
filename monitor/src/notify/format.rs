//! Human-readable number formatting for alert messages.

/// Formats `value` with `decimals` fraction digits and `,` thousands
/// separators, e.g. `1234567.891` with 2 decimals -> `1,234,567.89`.
pub fn with_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Price precision scales with magnitude so that both sub-won tokens and
/// BTC-sized prices stay readable.
pub fn price(value: f64, quote: &str) -> String {
    let body = if value == 0.0 {
        "0".to_string()
    } else if value < 0.01 {
        format!("{value:.6}")
    } else if value < 1.0 {
        format!("{value:.4}")
    } else if value < 100.0 {
        format!("{value:.2}")
    } else if value < 1_000.0 {
        with_thousands(value, 1)
    } else {
        with_thousands(value, 0)
    };

    format!("{body} {quote}")
}

pub fn volume(value: f64) -> String {
    with_thousands(value, 2)
}

pub fn ratio(value: f64) -> String {
    format!("{value:.2}x")
}
