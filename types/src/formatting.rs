//! Centralized number formatting utilities.
//!
//! Counter text and inline style values go through this module so that
//! count-up frames, progress widths and transforms are rendered the same way
//! everywhere, including European-style digit grouping (`.` as separator).

use crate::NumberGrouping;

/// Insert a separator every three digits, counting from the right.
fn group_digits(digits: &str, separator: char) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(separator);
        }
        result.push(c);
    }
    result
}

/// Format a number with thousands separators.
///
/// - Standard: `1,234,567`
/// - European: `1.234.567`
///
/// # Examples
/// ```
/// use dreamjob_types::formatting::format_thousands;
/// assert_eq!(format_thousands(500, false), "500");
/// assert_eq!(format_thousands(1_500, false), "1,500");
/// assert_eq!(format_thousands(1_500_000, true), "1.500.000");
/// ```
pub fn format_thousands(n: u64, european: bool) -> String {
    let separator = if european { '.' } else { ',' };
    group_digits(&n.to_string(), separator)
}

/// Format one count-up frame: the integer value, grouped as configured,
/// followed by the suffix read from the element text.
///
/// # Examples
/// ```
/// use dreamjob_types::NumberGrouping;
/// use dreamjob_types::formatting::format_count;
/// assert_eq!(format_count(120, "+", NumberGrouping::None), "120+");
/// assert_eq!(format_count(12_000, "", NumberGrouping::Standard), "12,000");
/// assert_eq!(format_count(12_000, "+", NumberGrouping::European), "12.000+");
/// ```
pub fn format_count(value: u64, suffix: &str, grouping: NumberGrouping) -> String {
    let digits = match grouping {
        NumberGrouping::None => value.to_string(),
        NumberGrouping::Standard => format_thousands(value, false),
        NumberGrouping::European => format_thousands(value, true),
    };
    format!("{}{}", digits, suffix)
}

/// Format a percentage for a CSS width, two decimal places.
///
/// # Examples
/// ```
/// use dreamjob_types::formatting::format_width_pct;
/// assert_eq!(format_width_pct(42.5), "42.50%");
/// assert_eq!(format_width_pct(100.0), "100.00%");
/// ```
pub fn format_width_pct(pct: f64) -> String {
    format!("{:.2}%", pct)
}

/// Format a vertical translation for a CSS `transform`.
///
/// Whole pixel values are written without a fractional part.
///
/// # Examples
/// ```
/// use dreamjob_types::formatting::format_translate_y;
/// assert_eq!(format_translate_y(30.0), "translateY(30px)");
/// assert_eq!(format_translate_y(0.0), "translateY(0)");
/// assert_eq!(format_translate_y(37.5), "translateY(37.5px)");
/// ```
pub fn format_translate_y(px: f64) -> String {
    if px == 0.0 {
        "translateY(0)".to_string()
    } else if px.fract() == 0.0 {
        format!("translateY({:.0}px)", px)
    } else {
        format!("translateY({}px)", px)
    }
}

/// Format milliseconds as CSS seconds (`600` -> `0.6s`).
///
/// # Examples
/// ```
/// use dreamjob_types::formatting::format_css_secs;
/// assert_eq!(format_css_secs(600), "0.6s");
/// assert_eq!(format_css_secs(800), "0.8s");
/// assert_eq!(format_css_secs(1250), "1.25s");
/// ```
pub fn format_css_secs(ms: u32) -> String {
    format!("{}s", ms as f64 / 1000.0)
}
