//! Marker popup content and `en-US` number formatting.

use bubble_map_stats_models::CategoryKey;

use crate::JoinedPoint;

/// Builds the HTML popup attached to a marker.
///
/// ```text
/// <strong>California (CA)</strong><br>
/// Population: 39,500,000<br>
/// Violent Rate: 450.00<br>
/// Unemployment Rate: 4.20%
/// ```
#[must_use]
pub fn popup_html(point: &JoinedPoint, category: &CategoryKey) -> String {
    let population = point
        .population
        .map_or_else(|| "n/a".to_string(), format_locale);
    let unemployment = point
        .unemployment_rate
        .map_or_else(|| "n/a".to_string(), format_percent);

    format!(
        "<strong>{} ({})</strong><br>\n\
         Population: {population}<br>\n\
         {} Rate: {}<br>\n\
         Unemployment Rate: {unemployment}",
        escape_html(&point.name),
        escape_html(point.state_abbr.as_str()),
        escape_html(category.display_name()),
        format_grouped(point.value, 2),
    )
}

/// Formats a number with comma thousands separators and a fixed number of
/// decimals (`1234.5` with 2 decimals is `"1,234.50"`).
#[must_use]
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = fixed
        .split_once('.')
        .map_or((fixed.as_str(), None), |(i, f)| (i, Some(f)));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Formats a number the way `en-US` locale formatting does by default:
/// grouped thousands and at most 3 fraction digits, trailing zeros dropped
/// (`39500000` is `"39,500,000"`, `1234.5` is `"1,234.5"`).
#[must_use]
pub fn format_locale(value: f64) -> String {
    let formatted = format_grouped(value, 3);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Formats a percentage value (`4.2` means 4.2%) with 2 decimals.
#[must_use]
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    format!("{}%", format_grouped(value, 2))
}

/// Escapes text for inclusion in popup HTML.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
