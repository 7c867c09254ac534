use serde::{Deserialize, Serialize};

/// SCPI numeric keywords (`MINimum`, `MAXimum`, `DEFault`, the infinity
/// family, `UP`, `DOWN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKeyword {
    /// `MIN` / `MINimum`.
    Minimum,
    /// `MAX` / `MAXimum`.
    Maximum,
    /// `DEF` / `DEFault`.
    Default,
    /// `INF` / `INFinity` / `+INF`.
    InfinityPos,
    /// `NINF` / `NINFinity` / `-INF`.
    InfinityNeg,
    /// `NAN` / `NOTA` / `NOTANUMBER`.
    NotANumber,
    /// `UP`.
    Up,
    /// `DOWN`.
    Down,
}

impl NumericKeyword {
    /// The long canonical spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            NumericKeyword::Minimum => "MINIMUM",
            NumericKeyword::Maximum => "MAXIMUM",
            NumericKeyword::Default => "DEFAULT",
            NumericKeyword::InfinityPos => "INFINITY",
            NumericKeyword::InfinityNeg => "NINFINITY",
            NumericKeyword::NotANumber => "NAN",
            NumericKeyword::Up => "UP",
            NumericKeyword::Down => "DOWN",
        }
    }

    /// The short canonical spelling.
    pub fn short_str(self) -> &'static str {
        match self {
            NumericKeyword::Minimum => "MIN",
            NumericKeyword::Maximum => "MAX",
            NumericKeyword::Default => "DEF",
            NumericKeyword::InfinityPos => "INF",
            NumericKeyword::InfinityNeg => "NINF",
            NumericKeyword::NotANumber => "NAN",
            NumericKeyword::Up => "UP",
            NumericKeyword::Down => "DOWN",
        }
    }

    /// The intrinsic numeric value: the IEEE-754 specials for the infinity
    /// family and NaN, `0.0` for the context-dependent keywords.
    pub fn to_f64(self) -> f64 {
        match self {
            NumericKeyword::InfinityPos => f64::INFINITY,
            NumericKeyword::InfinityNeg => f64::NEG_INFINITY,
            NumericKeyword::NotANumber => f64::NAN,
            _ => 0.0,
        }
    }

    /// `true` for `INF` / `NINF`.
    pub fn is_infinity(self) -> bool {
        matches!(self, NumericKeyword::InfinityPos | NumericKeyword::InfinityNeg)
    }

    /// `true` for `MIN` / `MAX` / `DEF`.
    pub fn is_min_max_def(self) -> bool {
        matches!(
            self,
            NumericKeyword::Minimum | NumericKeyword::Maximum | NumericKeyword::Default
        )
    }

    /// `true` for `UP` / `DOWN`.
    pub fn is_up_down(self) -> bool {
        matches!(self, NumericKeyword::Up | NumericKeyword::Down)
    }
}

/// Short/long mnemonic matching: the candidate (already uppercased) matches
/// when it equals the short form, the long form, or a prefix of the long
/// form no shorter than the short form.
fn matches_forms(upper: &str, short: &str, long: &str) -> bool {
    if upper == short || upper == long {
        return true;
    }
    upper.len() >= short.len() && upper.len() <= long.len() && long.starts_with(upper)
}

/// Parse a candidate word as a numeric keyword, or decline.
///
/// Case-insensitive. A leading `+`/`-` is honoured for the infinity family
/// (`+INF`, `-INFINITY`).
pub fn parse_numeric_keyword(text: &str) -> Option<NumericKeyword> {
    if text.is_empty() {
        return None;
    }

    let upper = text.to_ascii_uppercase();

    match upper.as_str() {
        "+INF" | "+INFINITY" => return Some(NumericKeyword::InfinityPos),
        "-INF" | "-INFINITY" => return Some(NumericKeyword::InfinityNeg),
        _ => {}
    }

    if matches_forms(&upper, "MIN", "MINIMUM") {
        return Some(NumericKeyword::Minimum);
    }
    if matches_forms(&upper, "MAX", "MAXIMUM") {
        return Some(NumericKeyword::Maximum);
    }
    if matches_forms(&upper, "DEF", "DEFAULT") {
        return Some(NumericKeyword::Default);
    }
    if matches_forms(&upper, "INF", "INFINITY") {
        return Some(NumericKeyword::InfinityPos);
    }
    if matches_forms(&upper, "NINF", "NINFINITY") {
        return Some(NumericKeyword::InfinityNeg);
    }
    if upper == "NAN" || matches_forms(&upper, "NOTA", "NOTANUMBER") {
        return Some(NumericKeyword::NotANumber);
    }
    if upper == "UP" {
        return Some(NumericKeyword::Up);
    }
    if upper == "DOWN" {
        return Some(NumericKeyword::Down);
    }

    None
}

/// `true` when the text parses as a numeric keyword.
pub fn is_numeric_keyword(text: &str) -> bool {
    parse_numeric_keyword(text).is_some()
}
