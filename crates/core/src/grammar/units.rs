use serde::{Deserialize, Serialize};

/// SI scaling prefix recognised in glued unit suffixes (`100mV`, `1e3kHz`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiPrefix {
    /// `f` — 1e-15.
    Femto,
    /// `p` — 1e-12.
    Pico,
    /// `n` — 1e-9.
    Nano,
    /// `u`/`µ` — 1e-6.
    Micro,
    /// `m` — 1e-3. Lower-case `m` is always milli.
    Milli,
    /// No prefix.
    #[default]
    None,
    /// `k`/`K` — 1e3.
    Kilo,
    /// `M` — 1e6. Upper-case `M` is always mega.
    Mega,
    /// `G` — 1e9.
    Giga,
    /// `T` — 1e12.
    Tera,
}

impl SiPrefix {
    /// Multiplier applied to a raw value carrying this prefix.
    pub fn multiplier(self) -> f64 {
        match self {
            SiPrefix::Femto => 1e-15,
            SiPrefix::Pico => 1e-12,
            SiPrefix::Nano => 1e-9,
            SiPrefix::Micro => 1e-6,
            SiPrefix::Milli => 1e-3,
            SiPrefix::None => 1.0,
            SiPrefix::Kilo => 1e3,
            SiPrefix::Mega => 1e6,
            SiPrefix::Giga => 1e9,
            SiPrefix::Tera => 1e12,
        }
    }

    /// Canonical one-letter spelling (empty for `None`).
    pub fn symbol(self) -> &'static str {
        match self {
            SiPrefix::Femto => "f",
            SiPrefix::Pico => "p",
            SiPrefix::Nano => "n",
            SiPrefix::Micro => "u",
            SiPrefix::Milli => "m",
            SiPrefix::None => "",
            SiPrefix::Kilo => "k",
            SiPrefix::Mega => "M",
            SiPrefix::Giga => "G",
            SiPrefix::Tera => "T",
        }
    }
}

/// Base measurement unit recognised after an optional SI prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseUnit {
    /// No unit.
    #[default]
    None,
    /// Volts.
    Volt,
    /// Amperes.
    Ampere,
    /// Watts.
    Watt,
    /// Ohms.
    Ohm,
    /// Farads.
    Farad,
    /// Henries.
    Henry,
    /// Hertz.
    Hertz,
    /// Seconds.
    Second,
    /// Degrees Celsius.
    Celsius,
    /// Kelvin.
    Kelvin,
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Angular degrees.
    Degree,
    /// Radians.
    Radian,
    /// Percent.
    Percent,
    /// Decibels.
    Decibel,
    /// Decibel-milliwatts.
    Dbm,
}

impl BaseUnit {
    /// Canonical SCPI spelling (`V`, `Hz`, `OHM`, …; empty for `None`).
    pub fn symbol(self) -> &'static str {
        match self {
            BaseUnit::None => "",
            BaseUnit::Volt => "V",
            BaseUnit::Ampere => "A",
            BaseUnit::Watt => "W",
            BaseUnit::Ohm => "OHM",
            BaseUnit::Farad => "F",
            BaseUnit::Henry => "H",
            BaseUnit::Hertz => "Hz",
            BaseUnit::Second => "s",
            BaseUnit::Celsius => "CEL",
            BaseUnit::Kelvin => "K",
            BaseUnit::Fahrenheit => "FAR",
            BaseUnit::Degree => "DEG",
            BaseUnit::Radian => "RAD",
            BaseUnit::Percent => "%",
            BaseUnit::Decibel => "dB",
            BaseUnit::Dbm => "dBm",
        }
    }
}

/// A number glued to a unit suffix, decomposed and scaled.
///
/// Invariant: `scaled_value == raw_value * multiplier` and
/// `multiplier == prefix.multiplier()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitValue {
    /// The value as spelled, before prefix scaling.
    pub raw_value: f64,
    /// The recognised SI prefix.
    pub prefix: SiPrefix,
    /// The recognised base unit.
    pub unit: BaseUnit,
    /// `prefix.multiplier()`, cached.
    pub multiplier: f64,
    /// `raw_value * multiplier` — the value in base units.
    pub scaled_value: f64,
    /// `true` when a prefix or unit was actually present.
    pub has_unit: bool,
}

impl PartialEq<f64> for UnitValue {
    /// A unit value with neither prefix nor unit is just a number at rest.
    fn eq(&self, other: &f64) -> bool {
        !self.has_unit && self.scaled_value == *other
    }
}

impl UnitValue {
    /// Build a unit value from parts, computing the scaled value.
    pub fn new(raw_value: f64, prefix: SiPrefix, unit: BaseUnit) -> Self {
        let multiplier = prefix.multiplier();
        Self {
            raw_value,
            prefix,
            unit,
            multiplier,
            scaled_value: raw_value * multiplier,
            has_unit: unit != BaseUnit::None || prefix != SiPrefix::None,
        }
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────

/// Parse a base-unit spelling (case handled by the caller via uppercasing).
///
/// Accepts the canonical SCPI symbols plus the long spellings the reference
/// grammar allows (`VOLT`, `AMPERE`, `HERTZ`, …).
fn parse_base_unit(upper: &str) -> BaseUnit {
    match upper {
        "V" | "VOLT" | "VOLTS" => BaseUnit::Volt,
        "A" | "AMP" | "AMPERE" | "AMPERES" => BaseUnit::Ampere,
        "W" | "WATT" | "WATTS" => BaseUnit::Watt,
        "OHM" | "OHMS" => BaseUnit::Ohm,
        "F" | "FARAD" | "FARADS" => BaseUnit::Farad,
        "H" | "HENRY" | "HENRYS" | "HENRIES" => BaseUnit::Henry,
        "HZ" | "HERTZ" => BaseUnit::Hertz,
        "S" | "SEC" | "SECOND" | "SECONDS" => BaseUnit::Second,
        "CEL" | "CELSIUS" => BaseUnit::Celsius,
        "K" | "KELVIN" => BaseUnit::Kelvin,
        "FAR" | "FAHRENHEIT" => BaseUnit::Fahrenheit,
        "DEG" | "DEGREE" | "DEGREES" => BaseUnit::Degree,
        "RAD" | "RADIAN" | "RADIANS" => BaseUnit::Radian,
        "PCT" | "PERCENT" | "%" => BaseUnit::Percent,
        "DB" | "DECIBEL" | "DECIBELS" => BaseUnit::Decibel,
        "DBM" => BaseUnit::Dbm,
        _ => BaseUnit::None,
    }
}

/// Parse a single prefix character. `m`/`M` are resolved by the caller —
/// this covers the unambiguous letters.
fn parse_prefix_char(c: char) -> SiPrefix {
    match c {
        'T' => SiPrefix::Tera,
        'G' => SiPrefix::Giga,
        'M' => SiPrefix::Mega,
        'K' | 'k' => SiPrefix::Kilo,
        'm' => SiPrefix::Milli,
        'u' | 'U' | 'µ' | 'μ' => SiPrefix::Micro,
        'n' | 'N' => SiPrefix::Nano,
        'p' | 'P' => SiPrefix::Pico,
        'f' | 'F' => SiPrefix::Femto,
        _ => SiPrefix::None,
    }
}

/// Parse a unit suffix (everything after the numeric head) into prefix+unit.
///
/// Resolution order matters: the whole suffix is tried as a bare unit first
/// (`mV` never means milli-volt if `MV` were itself a unit), then as
/// prefix+unit, then as the special bare `MA` (mega, no unit). The `m`/`M`
/// ambiguity is decided by the original case: lower-case `m` is milli,
/// upper-case `M` is mega.
pub fn parse_unit_suffix(suffix: &str) -> Option<(SiPrefix, BaseUnit)> {
    if suffix.is_empty() {
        return Some((SiPrefix::None, BaseUnit::None));
    }

    let upper = suffix.to_ascii_uppercase();

    // Whole suffix as a unit, no prefix: "V", "HZ", "OHM".
    let unit = parse_base_unit(&upper);
    if unit != BaseUnit::None {
        return Some((SiPrefix::None, unit));
    }

    // The exact spelling "MA" is the mega multiplier without a unit; mixed
    // case ("Ma", "mA") goes through the prefix+unit split below.
    if suffix == "MA" {
        return Some((SiPrefix::Mega, BaseUnit::None));
    }

    // Prefix character + unit remainder.
    let mut chars = suffix.chars();
    if let Some(first) = chars.next() {
        let rest = chars.as_str();
        if !rest.is_empty() {
            let unit = parse_base_unit(&rest.to_ascii_uppercase());
            if unit != BaseUnit::None {
                let prefix = match first {
                    'm' => SiPrefix::Milli,
                    'M' => SiPrefix::Mega,
                    other => parse_prefix_char(other),
                };
                if prefix != SiPrefix::None {
                    return Some((prefix, unit));
                }
            }
        }
    }

    None
}

/// Parse text of the form `<number><unit-suffix>` into a [`UnitValue`].
///
/// The numeric head is the longest prefix that scans as a signed decimal
/// with optional fraction and exponent; the remainder is the unit suffix.
/// Returns `None` when there is no numeric head or the suffix is not a
/// recognised prefix/unit combination.
pub fn parse_unit_value(input: &str) -> Option<UnitValue> {
    if input.is_empty() {
        return None;
    }

    let bytes = input.as_bytes();
    let mut num_end = 0usize;
    let mut has_decimal = false;
    let mut has_exponent = false;

    if bytes[0] == b'+' || bytes[0] == b'-' {
        num_end = 1;
    }

    while num_end < bytes.len() {
        let b = bytes[num_end];
        if b.is_ascii_digit() {
            num_end += 1;
        } else if b == b'.' && !has_decimal && !has_exponent {
            has_decimal = true;
            num_end += 1;
        } else if (b == b'e' || b == b'E') && !has_exponent {
            has_exponent = true;
            num_end += 1;
            if num_end < bytes.len() && (bytes[num_end] == b'+' || bytes[num_end] == b'-') {
                num_end += 1;
            }
        } else {
            break;
        }
    }

    if num_end == 0 || (num_end == 1 && (bytes[0] == b'+' || bytes[0] == b'-')) {
        return None;
    }

    let raw_value = super::lexer::parse_f64(&input[..num_end])?;

    let (prefix, unit) = parse_unit_suffix(&input[num_end..])?;
    Some(UnitValue::new(raw_value, prefix, unit))
}

// ── Formatting ──────────────────────────────────────────────────────────

/// Pick the engineering prefix that brings `value` closest to `1..1000`.
pub fn select_best_prefix(value: f64) -> SiPrefix {
    if value == 0.0 {
        return SiPrefix::None;
    }
    let abs = value.abs();
    if abs >= 1e12 {
        SiPrefix::Tera
    } else if abs >= 1e9 {
        SiPrefix::Giga
    } else if abs >= 1e6 {
        SiPrefix::Mega
    } else if abs >= 1e3 {
        SiPrefix::Kilo
    } else if abs >= 1.0 {
        SiPrefix::None
    } else if abs >= 1e-3 {
        SiPrefix::Milli
    } else if abs >= 1e-6 {
        SiPrefix::Micro
    } else if abs >= 1e-9 {
        SiPrefix::Nano
    } else if abs >= 1e-12 {
        SiPrefix::Pico
    } else {
        SiPrefix::Femto
    }
}

/// Format a base-unit value with an engineering prefix (`0.0015`, `Volt` →
/// `"1.5mV"`). With `use_prefix` false, the value is printed unscaled.
pub fn format_with_unit(value: f64, unit: BaseUnit, use_prefix: bool) -> String {
    let prefix = if use_prefix && value != 0.0 {
        select_best_prefix(value)
    } else {
        SiPrefix::None
    };
    let display = value / prefix.multiplier();
    format!("{}{}{}", display, prefix.symbol(), unit.symbol())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prefix_unit() {
        let uv = parse_unit_value("100mV").unwrap();
        assert_eq!(uv.prefix, SiPrefix::Milli);
        assert_eq!(uv.unit, BaseUnit::Volt);
        assert_eq!(uv.raw_value, 100.0);
        assert_eq!(uv.scaled_value, 0.1);
        assert!(uv.has_unit);
    }

    #[test]
    fn exponent_head() {
        let uv = parse_unit_value("1e3kHz").unwrap();
        assert_eq!(uv.prefix, SiPrefix::Kilo);
        assert_eq!(uv.unit, BaseUnit::Hertz);
        assert_eq!(uv.scaled_value, 1.0e6);
    }

    #[test]
    fn milli_mega_ambiguity() {
        let milli = parse_unit_value("1mA").unwrap();
        assert_eq!(milli.prefix, SiPrefix::Milli);
        assert_eq!(milli.unit, BaseUnit::Ampere);
        // Bare "MA" is the mega multiplier with no unit; "Ma" is mega-ampere.
        let bare = parse_unit_value("1MA").unwrap();
        assert_eq!(bare.prefix, SiPrefix::Mega);
        assert_eq!(bare.unit, BaseUnit::None);
        let mixed = parse_unit_value("1Ma").unwrap();
        assert_eq!(mixed.prefix, SiPrefix::Mega);
        assert_eq!(mixed.unit, BaseUnit::Ampere);
    }

    #[test]
    fn whole_suffix_prefers_bare_unit() {
        // "mV" is milli-volt, but "K" alone is Kelvin, not kilo.
        let uv = parse_unit_value("3K").unwrap();
        assert_eq!(uv.unit, BaseUnit::Kelvin);
        assert_eq!(uv.prefix, SiPrefix::None);
    }

    #[test]
    fn long_unit_spellings() {
        assert_eq!(parse_unit_value("5VOLT").unwrap().unit, BaseUnit::Volt);
        assert_eq!(parse_unit_value("5kHERTZ").unwrap().unit, BaseUnit::Hertz);
    }

    #[test]
    fn no_unit_no_prefix_is_not_glued() {
        let uv = parse_unit_value("100").unwrap();
        assert!(!uv.has_unit);
        assert_eq!(uv.scaled_value, 100.0);
        // At rest it compares equal to the plain float.
        assert_eq!(uv, 100.0);
        assert_ne!(parse_unit_value("100mV").unwrap(), 0.1);
    }

    #[test]
    fn unknown_suffix_declines() {
        assert!(parse_unit_value("100XY").is_none());
        assert!(parse_unit_value("V").is_none());
    }

    #[test]
    fn negative_and_signed_heads() {
        assert_eq!(parse_unit_value("-2.5uV").unwrap().scaled_value, -2.5e-6);
        assert_eq!(parse_unit_value("+3s").unwrap().unit, BaseUnit::Second);
    }

    #[test]
    fn engineering_format() {
        assert_eq!(format_with_unit(0.0015, BaseUnit::Volt, true), "1.5mV");
        assert_eq!(format_with_unit(2.5e6, BaseUnit::Hertz, true), "2.5MHz");
        assert_eq!(format_with_unit(0.0, BaseUnit::Volt, true), "0V");
    }
}
