//! Number ⇄ display text conversion.

use crate::types::DisplayFormat;

pub const INFINITY_TEXT: &str = "Infinity";
pub const NEG_INFINITY_TEXT: &str = "-Infinity";
pub const NAN_TEXT: &str = "NaN";

/// Render a computed value for the display.
///
/// Non-finite values use the `Infinity` / `-Infinity` / `NaN` spellings.
/// Negative zero renders as `0`. Finite values never use exponent notation,
/// so the result is always something the user could have typed.
pub fn format_value(value: f64, format: DisplayFormat) -> String {
    if value.is_nan() {
        return NAN_TEXT.to_string();
    }
    if value.is_infinite() {
        let s = if value.is_sign_positive() {
            INFINITY_TEXT
        } else {
            NEG_INFINITY_TEXT
        };
        return s.to_string();
    }

    let value = match format {
        DisplayFormat::Canonical => value,
        DisplayFormat::Rounded { decimals } => round_half_up(value, decimals),
    };

    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// `floor(v * 10^d + 0.5) / 10^d`; falls back to `v` when scaling overflows.
fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(308) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    (scaled + 0.5).floor() / factor
}

/// Read the display text back as a number.
///
/// A trailing decimal point is accepted (`"3."` is 3). Text that cannot be
/// read is treated as 0.
pub fn parse_entry(text: &str) -> f64 {
    match text {
        INFINITY_TEXT => f64::INFINITY,
        NEG_INFINITY_TEXT => f64::NEG_INFINITY,
        NAN_TEXT => f64::NAN,
        _ => {
            let trimmed = text.strip_suffix('.').unwrap_or(text);
            trimmed.parse::<f64>().unwrap_or_else(|_| {
                tracing::debug!(text, "unreadable entry text, treating as 0");
                0.0
            })
        }
    }
}

/// True when `text` is an ordinary numeral rather than a non-finite result.
pub fn is_numeral(text: &str) -> bool {
    !matches!(text, INFINITY_TEXT | NEG_INFINITY_TEXT | NAN_TEXT)
}
