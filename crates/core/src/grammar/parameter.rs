use super::keywords::{parse_numeric_keyword, NumericKeyword};
use super::token::{Token, TokenKind};
use super::units::{parse_unit_value, BaseUnit, SiPrefix, UnitValue};
use serde::{Deserialize, Serialize};

/// One SCPI command argument.
///
/// A tagged value: the variant selects which payload is meaningful, and the
/// factory functions never produce mixed state. Cross-type coercions
/// (`to_i64`, `to_f64`, `to_bool`, …) are computed on demand and fall back
/// to a caller-supplied default when the variant cannot represent the
/// request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Parameter {
    /// No parameter (also the out-of-range getter result).
    #[default]
    None,
    /// A number spelled without fraction or exponent.
    Integer(i64),
    /// A number spelled with fraction or exponent.
    Double(f64),
    /// A boolean (`ON`/`OFF`/`TRUE`/`FALSE`/`1`/`0`).
    Boolean(bool),
    /// A quoted string (quotes stripped).
    Str(String),
    /// A bare word that is neither keyword, boolean, nor unit value.
    Identifier(String),
    /// A numeric keyword (`MIN`, `MAX`, `DEF`, `INF`, …).
    Keyword(NumericKeyword),
    /// A number glued to a unit suffix (`100mV`).
    WithUnit(UnitValue),
    /// An expanded channel list from `(@…)` syntax.
    ChannelList(Vec<i32>),
    /// Arbitrary-block payload bytes.
    BlockData(Vec<u8>),
}

static EMPTY_PARAM: Parameter = Parameter::None;

impl Parameter {
    // ── Factories ───────────────────────────────────────────────────────

    /// Build a parameter from a keyword, carrying its intrinsic value.
    pub fn from_keyword(keyword: NumericKeyword) -> Self {
        Parameter::Keyword(keyword)
    }

    /// Build a parameter from raw value, prefix, and unit.
    pub fn from_unit_parts(raw: f64, prefix: SiPrefix, unit: BaseUnit) -> Self {
        Parameter::WithUnit(UnitValue::new(raw, prefix, unit))
    }

    /// Resolve a bare word: boolean literals first, then numeric keywords,
    /// otherwise a plain identifier.
    pub fn from_identifier(text: &str) -> Self {
        let upper = text.to_ascii_uppercase();
        match upper.as_str() {
            "ON" | "TRUE" | "1" => return Parameter::Boolean(true),
            "OFF" | "FALSE" | "0" => return Parameter::Boolean(false),
            _ => {}
        }
        if let Some(kw) = parse_numeric_keyword(text) {
            return Parameter::Keyword(kw);
        }
        Parameter::Identifier(text.to_string())
    }

    /// Map a lexer token to its natural parameter variant.
    ///
    /// Identifiers are probed as unit values first (`mV` needs the raw
    /// spelling), then through [`from_identifier`](Self::from_identifier).
    pub fn from_token(token: &Token) -> Self {
        match &token.kind {
            TokenKind::Number { value, integer, .. } => {
                if *integer {
                    Parameter::Integer(*value as i64)
                } else {
                    Parameter::Double(*value)
                }
            }
            TokenKind::Str(s) => Parameter::Str(s.clone()),
            TokenKind::Identifier { .. } => {
                if let Some(uv) = parse_unit_value(&token.text) {
                    if uv.has_unit {
                        return Parameter::WithUnit(uv);
                    }
                }
                Parameter::from_identifier(&token.text)
            }
            TokenKind::BlockData { data, .. } => Parameter::BlockData(data.clone()),
            _ => Parameter::None,
        }
    }

    // ── Type checks ─────────────────────────────────────────────────────

    /// `true` for the `None` variant.
    pub fn is_none(&self) -> bool {
        matches!(self, Parameter::None)
    }

    /// `true` for any variant with a numeric reading: integer, double,
    /// unit value, or numeric keyword.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Parameter::Integer(_)
                | Parameter::Double(_)
                | Parameter::WithUnit(_)
                | Parameter::Keyword(_)
        )
    }

    /// `true` for the numeric-keyword variant.
    pub fn is_keyword(&self) -> bool {
        matches!(self, Parameter::Keyword(_))
    }

    /// The keyword, when this is the keyword variant.
    pub fn numeric_keyword(&self) -> Option<NumericKeyword> {
        match self {
            Parameter::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// `true` for `MIN`/`MINimum`.
    pub fn is_min(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::Minimum)
    }

    /// `true` for `MAX`/`MAXimum`.
    pub fn is_max(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::Maximum)
    }

    /// `true` for `DEF`/`DEFault`.
    pub fn is_def(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::Default)
    }

    /// `true` for positive infinity (`INF`, `+INF`).
    pub fn is_inf(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::InfinityPos)
    }

    /// `true` for negative infinity (`NINF`, `-INF`).
    pub fn is_neg_inf(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::InfinityNeg)
    }

    /// `true` for `NAN`/`NOTANUMBER`.
    pub fn is_nan_keyword(&self) -> bool {
        self.numeric_keyword() == Some(NumericKeyword::NotANumber)
    }

    /// `true` when this parameter carries a unit or SI prefix.
    pub fn has_unit(&self) -> bool {
        matches!(self, Parameter::WithUnit(uv) if uv.has_unit)
    }

    /// `true` for the block-data variant.
    pub fn is_block_data(&self) -> bool {
        matches!(self, Parameter::BlockData(_))
    }

    /// `true` for the channel-list variant.
    pub fn is_channel_list(&self) -> bool {
        matches!(self, Parameter::ChannelList(_))
    }

    // ── Scalar coercions ────────────────────────────────────────────────

    /// Coerce to `i64`. Floats truncate toward zero; strings are parsed by
    /// their leading numeric prefix; otherwise `default`.
    pub fn to_i64(&self, default: i64) -> i64 {
        match self {
            Parameter::Integer(v) => *v,
            Parameter::Double(v) => *v as i64,
            Parameter::Boolean(b) => i64::from(*b),
            Parameter::WithUnit(uv) => uv.scaled_value as i64,
            Parameter::Keyword(kw) => kw.to_f64() as i64,
            Parameter::Str(s) | Parameter::Identifier(s) => {
                parse_i64_prefix(s).unwrap_or(default)
            }
            _ => default,
        }
    }

    /// Coerce to `i32`, saturating at the `i32` range.
    pub fn to_i32(&self, default: i32) -> i32 {
        self.to_i64(i64::from(default))
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Coerce to `f64`. The arithmetic identity across numeric variants;
    /// strings are parsed by their leading numeric prefix; otherwise
    /// `default`.
    pub fn to_f64(&self, default: f64) -> f64 {
        match self {
            Parameter::Integer(v) => *v as f64,
            Parameter::Double(v) => *v,
            Parameter::Boolean(b) => f64::from(u8::from(*b)),
            Parameter::WithUnit(uv) => uv.scaled_value,
            Parameter::Keyword(kw) => kw.to_f64(),
            Parameter::Str(s) | Parameter::Identifier(s) => {
                parse_f64_prefix(s).unwrap_or(default)
            }
            _ => default,
        }
    }

    /// Coerce to `bool`: the boolean variant, any non-zero number, or the
    /// case-insensitive literals `ON`/`OFF`/`TRUE`/`FALSE`/`1`/`0`.
    pub fn to_bool(&self, default: bool) -> bool {
        match self {
            Parameter::Boolean(b) => *b,
            Parameter::Integer(v) => *v != 0,
            Parameter::Double(v) => *v != 0.0,
            Parameter::Str(s) | Parameter::Identifier(s) => {
                match s.to_ascii_uppercase().as_str() {
                    "ON" | "TRUE" | "1" => true,
                    "OFF" | "FALSE" | "0" => false,
                    _ => default,
                }
            }
            _ => default,
        }
    }

    /// Resolve a numeric parameter with keyword substitution: `MIN`/`MAX`/
    /// `DEF` map to the three arguments, the infinity family and `NAN` to
    /// the IEEE-754 specials, anything else through [`to_f64`](Self::to_f64)
    /// with `def` as the default.
    pub fn to_f64_or(&self, min: f64, max: f64, def: f64) -> f64 {
        if let Parameter::Keyword(kw) = self {
            return match kw {
                NumericKeyword::Minimum => min,
                NumericKeyword::Maximum => max,
                NumericKeyword::Default => def,
                NumericKeyword::InfinityPos => f64::INFINITY,
                NumericKeyword::InfinityNeg => f64::NEG_INFINITY,
                NumericKeyword::NotANumber => f64::NAN,
                _ => def,
            };
        }
        self.to_f64(def)
    }

    /// Resolve a numeric parameter through a caller-supplied keyword
    /// resolver; non-keyword variants go through [`to_f64`](Self::to_f64).
    pub fn resolve_numeric(&self, resolver: impl Fn(NumericKeyword) -> f64, default: f64) -> f64 {
        if let Parameter::Keyword(kw) = self {
            return resolver(*kw);
        }
        self.to_f64(default)
    }

    // ── Unit accessors ──────────────────────────────────────────────────

    /// The unit payload, when this is the unit variant.
    pub fn unit_value(&self) -> Option<&UnitValue> {
        match self {
            Parameter::WithUnit(uv) => Some(uv),
            _ => None,
        }
    }

    /// The value in base units (`100mV` → `0.1`); falls through to
    /// [`to_f64`](Self::to_f64) for non-unit variants.
    pub fn to_base_unit(&self) -> f64 {
        match self {
            Parameter::WithUnit(uv) => uv.scaled_value,
            _ => self.to_f64(0.0),
        }
    }

    /// The unscaled value as spelled (`100mV` → `100`).
    pub fn raw_value(&self) -> f64 {
        match self {
            Parameter::WithUnit(uv) => uv.raw_value,
            _ => self.to_f64(0.0),
        }
    }

    /// The SI prefix, `None` for non-unit variants.
    pub fn si_prefix(&self) -> SiPrefix {
        self.unit_value().map_or(SiPrefix::None, |uv| uv.prefix)
    }

    /// The base unit, `None` for non-unit variants.
    pub fn base_unit(&self) -> BaseUnit {
        self.unit_value().map_or(BaseUnit::None, |uv| uv.unit)
    }

    /// The prefix multiplier, `1.0` for non-unit variants.
    pub fn multiplier(&self) -> f64 {
        self.unit_value().map_or(1.0, |uv| uv.multiplier)
    }

    /// The base-unit value re-expressed under `target` (`0.1` V at
    /// `SiPrefix::Milli` → `100.0`).
    pub fn to_unit(&self, target: SiPrefix) -> f64 {
        self.to_base_unit() / target.multiplier()
    }

    // ── Container accessors ─────────────────────────────────────────────

    /// The channel list, empty for other variants.
    pub fn to_channel_list(&self) -> &[i32] {
        match self {
            Parameter::ChannelList(list) => list,
            _ => &[],
        }
    }

    /// The block payload, empty for other variants.
    pub fn to_block_data(&self) -> &[u8] {
        match self {
            Parameter::BlockData(data) => data,
            _ => &[],
        }
    }

    /// Block payload length in bytes, 0 for other variants.
    pub fn block_size(&self) -> usize {
        self.to_block_data().len()
    }

    /// The block payload when present and non-empty.
    pub fn block_bytes(&self) -> Option<&[u8]> {
        match self {
            Parameter::BlockData(data) if !data.is_empty() => Some(data),
            _ => None,
        }
    }

    /// Uppercase-hex rendering of the block payload.
    pub fn block_to_hex(&self) -> String {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let data = self.to_block_data();
        let mut out = String::with_capacity(data.len() * 2);
        for &byte in data {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0F) as usize] as char);
        }
        out
    }

    // ── Debug ───────────────────────────────────────────────────────────

    /// The variant name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Parameter::None => "NONE",
            Parameter::Integer(_) => "INTEGER",
            Parameter::Double(_) => "DOUBLE",
            Parameter::Boolean(_) => "BOOLEAN",
            Parameter::Str(_) => "STRING",
            Parameter::Identifier(_) => "IDENTIFIER",
            Parameter::Keyword(_) => "NUMERIC_KEYWORD",
            Parameter::WithUnit(_) => "NUMERIC_WITH_UNIT",
            Parameter::ChannelList(_) => "CHANNEL_LIST",
            Parameter::BlockData(_) => "BLOCK_DATA",
        }
    }

    /// Verbose rendering: variant name plus payload, for logs.
    pub fn dump(&self) -> String {
        match self {
            Parameter::Str(s) => format!("STRING(\"{}\")", s),
            Parameter::WithUnit(uv) => format!(
                "NUMERIC_WITH_UNIT({}{}{} = {})",
                uv.raw_value,
                uv.prefix.symbol(),
                uv.unit.symbol(),
                uv.scaled_value
            ),
            Parameter::BlockData(data) => format!("BLOCK_DATA({} bytes)", data.len()),
            Parameter::ChannelList(list) => format!("CHANNEL_LIST({} channels)", list.len()),
            Parameter::None => "NONE()".to_string(),
            other => format!("{}({})", other.type_name(), other),
        }
    }
}

impl std::fmt::Display for Parameter {
    /// The SCPI-facing text of the parameter. Floats print with Rust's
    /// shortest round-trip form, which preserves at least 15 significant
    /// digits.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parameter::None => Ok(()),
            Parameter::Integer(v) => write!(f, "{}", v),
            Parameter::Double(v) => write!(f, "{}", v),
            Parameter::Boolean(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            Parameter::Str(s) | Parameter::Identifier(s) => write!(f, "{}", s),
            Parameter::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Parameter::WithUnit(uv) => {
                write!(f, "{}{}{}", uv.raw_value, uv.prefix.symbol(), uv.unit.symbol())
            }
            Parameter::BlockData(data) => write!(f, "[BLOCK:{} bytes]", data.len()),
            Parameter::ChannelList(list) => {
                write!(f, "(@")?;
                for (i, ch) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", ch)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Leading-prefix integer parse: `"42abc"` → `42`, mirroring the tolerant
/// string coercion of instrument firmwares.
fn parse_i64_prefix(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0usize;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    t[..end].parse().ok()
}

/// Leading-prefix float parse: `"1.5e3Hz"` → `1500.0`.
fn parse_f64_prefix(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0usize;
    let mut has_decimal = false;
    let mut has_exponent = false;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            end += 1;
        } else if b == b'.' && !has_decimal && !has_exponent {
            has_decimal = true;
            end += 1;
        } else if (b == b'e' || b == b'E') && !has_exponent && end > 0 {
            has_exponent = true;
            end += 1;
            if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
                end += 1;
            }
        } else {
            break;
        }
    }
    super::lexer::parse_f64(&t[..end])
}

// ── ParameterList ───────────────────────────────────────────────────────

/// The ordered argument list of one command.
///
/// All getters are bounds-safe: out-of-range access yields the caller's
/// default (or the `None` parameter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterList {
    params: Vec<Parameter>,
}

impl ParameterList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn push(&mut self, param: Parameter) {
        self.params.push(param);
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// `true` when no parameters were given.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Remove all parameters.
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Iterate the parameters in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// The parameter at `index`, or the `None` parameter when out of range.
    pub fn at(&self, index: usize) -> &Parameter {
        self.params.get(index).unwrap_or(&EMPTY_PARAM)
    }

    /// `i32` at `index`, with saturation and a default.
    pub fn get_int(&self, index: usize, default: i32) -> i32 {
        self.at(index).to_i32(default)
    }

    /// `i64` at `index`, with a default.
    pub fn get_int64(&self, index: usize, default: i64) -> i64 {
        self.at(index).to_i64(default)
    }

    /// `f64` at `index`, with a default.
    pub fn get_double(&self, index: usize, default: f64) -> f64 {
        self.at(index).to_f64(default)
    }

    /// `bool` at `index`, with a default.
    pub fn get_bool(&self, index: usize, default: bool) -> bool {
        self.at(index).to_bool(default)
    }

    /// Printable text at `index`; `default` when out of range.
    pub fn get_string(&self, index: usize, default: &str) -> String {
        match self.params.get(index) {
            Some(p) => p.to_string(),
            None => default.to_string(),
        }
    }

    /// Base-unit value at `index` (unit parameters are scaled), with a
    /// default for out-of-range access.
    pub fn get_scaled_double(&self, index: usize, default: f64) -> f64 {
        match self.params.get(index) {
            Some(p) => p.to_base_unit(),
            None => default,
        }
    }

    /// Value at `index` re-expressed under `target`, with a default.
    pub fn get_as_unit(&self, index: usize, target: SiPrefix, default: f64) -> f64 {
        match self.params.get(index) {
            Some(p) => p.to_unit(target),
            None => default,
        }
    }

    /// Keyword-aware numeric at `index`: `MIN`/`MAX`/`DEF` resolve to the
    /// three bounds, everything else through the plain coercion.
    pub fn get_numeric(&self, index: usize, min: f64, max: f64, def: f64) -> f64 {
        match self.params.get(index) {
            Some(p) => p.to_f64_or(min, max, def),
            None => def,
        }
    }

    /// `true` when the parameter at `index` carries a unit.
    pub fn has_unit(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::has_unit)
    }

    /// The base unit at `index`, `None` when absent.
    pub fn get_unit(&self, index: usize) -> BaseUnit {
        self.params.get(index).map_or(BaseUnit::None, Parameter::base_unit)
    }

    /// `true` when the parameter at `index` is block data.
    pub fn has_block_data(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::is_block_data)
    }

    /// The block payload at `index`, empty when absent.
    pub fn get_block_data(&self, index: usize) -> &[u8] {
        self.at(index).to_block_data()
    }

    /// The channel list at `index`, empty when absent.
    pub fn get_channel_list(&self, index: usize) -> &[i32] {
        self.at(index).to_channel_list()
    }

    /// `true` when the parameter at `index` is a numeric keyword.
    pub fn is_keyword(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::is_keyword)
    }

    /// `true` when the parameter at `index` is `MIN`.
    pub fn is_min(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::is_min)
    }

    /// `true` when the parameter at `index` is `MAX`.
    pub fn is_max(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::is_max)
    }

    /// `true` when the parameter at `index` is `DEF`.
    pub fn is_def(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(Parameter::is_def)
    }
}

impl From<Vec<Parameter>> for ParameterList {
    fn from(params: Vec<Parameter>) -> Self {
        Self { params }
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_resolution_order() {
        assert_eq!(Parameter::from_identifier("ON"), Parameter::Boolean(true));
        assert_eq!(Parameter::from_identifier("off"), Parameter::Boolean(false));
        assert_eq!(
            Parameter::from_identifier("MAX"),
            Parameter::Keyword(NumericKeyword::Maximum)
        );
        assert_eq!(
            Parameter::from_identifier("BUS"),
            Parameter::Identifier("BUS".into())
        );
    }

    #[test]
    fn integer_coercions() {
        let p = Parameter::Integer(42);
        assert_eq!(p.to_i64(0), 42);
        assert_eq!(p.to_f64(0.0), 42.0);
        assert!(p.to_bool(false));
    }

    #[test]
    fn double_truncates_to_int() {
        assert_eq!(Parameter::Double(3.9).to_i64(0), 3);
        assert_eq!(Parameter::Double(-3.9).to_i64(0), -3);
    }

    #[test]
    fn i32_saturates() {
        assert_eq!(Parameter::Integer(1 << 40).to_i32(0), i32::MAX);
        assert_eq!(Parameter::Integer(-(1 << 40)).to_i32(0), i32::MIN);
    }

    #[test]
    fn string_prefix_parsing() {
        assert_eq!(Parameter::Str("42abc".into()).to_i64(0), 42);
        assert_eq!(Parameter::Str("1.5e3Hz".into()).to_f64(0.0), 1500.0);
        assert_eq!(Parameter::Str("abc".into()).to_i64(7), 7);
    }

    #[test]
    fn keyword_resolution() {
        let p = Parameter::Keyword(NumericKeyword::Maximum);
        assert_eq!(p.to_f64_or(0.1, 1000.0, 10.0), 1000.0);
        let p = Parameter::Keyword(NumericKeyword::InfinityNeg);
        assert_eq!(p.to_f64_or(0.0, 0.0, 0.0), f64::NEG_INFINITY);
        let p = Parameter::Double(5.0);
        assert_eq!(p.to_f64_or(0.0, 10.0, 1.0), 5.0);
    }

    #[test]
    fn resolve_numeric_callback() {
        let p = Parameter::Keyword(NumericKeyword::Up);
        let v = p.resolve_numeric(|kw| if kw == NumericKeyword::Up { 7.0 } else { 0.0 }, 0.0);
        assert_eq!(v, 7.0);
    }

    #[test]
    fn unit_conversions() {
        let p = Parameter::WithUnit(UnitValue::new(100.0, SiPrefix::Milli, BaseUnit::Volt));
        assert_eq!(p.to_base_unit(), 0.1);
        assert_eq!(p.raw_value(), 100.0);
        assert_eq!(p.multiplier(), 1e-3);
        assert_eq!(p.to_unit(SiPrefix::Micro), 100_000.0);
        assert!(p.has_unit());
    }

    #[test]
    fn block_accessors() {
        let p = Parameter::BlockData(vec![0xDE, 0xAD]);
        assert_eq!(p.block_size(), 2);
        assert_eq!(p.block_to_hex(), "DEAD");
        assert_eq!(p.block_bytes(), Some(&[0xDE, 0xAD][..]));
        assert_eq!(Parameter::Integer(1).block_size(), 0);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Parameter::Integer(5).to_string(), "5");
        assert_eq!(Parameter::Boolean(true).to_string(), "1");
        assert_eq!(
            Parameter::Keyword(NumericKeyword::Minimum).to_string(),
            "MINIMUM"
        );
        assert_eq!(
            Parameter::ChannelList(vec![1, 2, 3]).to_string(),
            "(@1,2,3)"
        );
    }

    #[test]
    fn list_defaults_out_of_range() {
        let list = ParameterList::from(vec![Parameter::Integer(1)]);
        assert_eq!(list.get_int(0, 0), 1);
        assert_eq!(list.get_int(5, -7), -7);
        assert_eq!(list.get_string(5, "x"), "x");
        assert!(list.at(5).is_none());
    }

    #[test]
    fn list_predicates() {
        let list = ParameterList::from(vec![
            Parameter::Keyword(NumericKeyword::Minimum),
            Parameter::WithUnit(UnitValue::new(1.0, SiPrefix::Kilo, BaseUnit::Hertz)),
        ]);
        assert!(list.is_keyword(0));
        assert!(list.is_min(0));
        assert!(!list.is_max(0));
        assert!(list.has_unit(1));
        assert_eq!(list.get_unit(1), BaseUnit::Hertz);
    }

    #[test]
    fn parameter_serde_roundtrip() {
        let params = vec![
            Parameter::Integer(7),
            Parameter::WithUnit(UnitValue::new(2.0, SiPrefix::Milli, BaseUnit::Volt)),
            Parameter::BlockData(vec![1, 2, 3]),
        ];
        for p in params {
            let json = serde_json::to_string(&p).unwrap();
            let back: Parameter = serde_json::from_str(&json).unwrap();
            assert_eq!(p, back);
        }
    }
}
