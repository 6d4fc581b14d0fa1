use regex::Regex;
use std::sync::LazyLock;

use crate::models::Outcome;

/// Shown wherever a value is undefined
pub const UNDEFINED_MARKER: &str = "—";

static LEADING_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").ok()
});

/// Leading-number parse: `"2%"` → 2, `" -1.5x"` → -1.5, `"abc"` → None.
/// Text cells such as risk and P/L carry units, so only the numeric prefix
/// counts.
pub fn parse_leading_number(value: &str) -> Option<f64> {
    let caps = LEADING_NUMBER.as_ref()?.captures(value)?;
    caps.get(1)?.as_str().parse::<f64>().ok()
}

/// Fixed-point formatting with ties rounded away from zero
pub fn to_fixed(value: f64, digits: u32) -> String {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    format!("{:.*}", digits as usize, rounded)
}

/// Profit/loss of a trade in percent of the account.
///
/// | outcome | rr      | result             |
/// |---------|---------|--------------------|
/// | Take    | present | `risk × rr` `%`    |
/// | Stop    | any     | `-risk` `%`        |
/// | BE      | any     | `0%`               |
///
/// Everything else, including a missing or non-numeric risk, is undefined
/// and returned as `None`.
pub fn calculate_pl(risk: &str, rr: &str, outcome: Option<Outcome>) -> Option<String> {
    let risk = risk.trim();
    let outcome = outcome?;
    if risk.is_empty() {
        return None;
    }
    let risk = parse_leading_number(risk)?;

    match outcome {
        Outcome::Take => {
            let rr = rr.trim();
            if rr.is_empty() {
                return None;
            }
            let rr = parse_leading_number(rr)?;
            Some(format!("{}%", to_fixed(risk * rr, 2)))
        }
        Outcome::Stop => Some(format!("-{}%", to_fixed(risk, 2))),
        Outcome::BreakEven => Some("0%".to_string()),
    }
}

/// Text persisted in the `pl` column
pub fn pl_text(risk: &str, rr: &str, outcome: Option<Outcome>) -> String {
    calculate_pl(risk, rr, outcome).unwrap_or_else(|| UNDEFINED_MARKER.to_string())
}
