use super::node::{NodeParamDef, SuffixConstraint};
use thiserror::Error;

/// A registration-pattern failure. Returned at registration time — these are
/// programmer errors, not wire errors, so they surface as Rust errors rather
/// than queue entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern string was empty.
    #[error("empty pattern")]
    Empty,
    /// No command steps were found after splitting.
    #[error("no command steps found")]
    NoSteps,
    /// `[` without a matching `]`.
    #[error("unmatched '[]' in pattern")]
    UnmatchedBracket,
    /// `<` without a matching `>`.
    #[error("unmatched '<>' in pattern")]
    UnmatchedAngle,
    /// A parameter definition without its closing `>`.
    #[error("missing '>' in parameter definition")]
    MissingAngleClose,
    /// Characters after `<…>` in one step.
    #[error("unexpected characters after parameter definition")]
    TrailingAfterParam,
    /// Characters after `#` in one step.
    #[error("unexpected characters after '#'")]
    TrailingAfterHash,
    /// A step reduced to nothing after removing its brackets.
    #[error("empty step after removing brackets")]
    EmptyStep,
    /// A step with an empty mnemonic.
    #[error("empty step name")]
    EmptyName,
    /// A malformed `min-max` range.
    #[error("invalid range specification: {0}")]
    InvalidRange(String),
    /// A range with `min > max`.
    #[error("invalid range: min > max")]
    ReversedRange,
}

/// One step of a compiled registration pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStep {
    /// The uppercase subsequence of the spelled name (`MEASure` → `MEAS`).
    pub short_name: String,
    /// The name as spelled.
    pub long_name: String,
    /// `true` when the step was bracketed (`[:DC]`).
    pub optional: bool,
    /// The numeric-suffix declaration (`<ch:1-8>` or `#`).
    pub param: Option<NodeParamDef>,
}

/// The uppercase letters of a pattern name form its short name; a name with
/// no uppercase letters is its own short name, uppercased.
pub(super) fn extract_short_name(name: &str) -> String {
    let upper: String = name.chars().filter(|c| c.is_ascii_uppercase()).collect();
    if upper.is_empty() {
        name.to_ascii_uppercase()
    } else {
        upper
    }
}

/// Compile a pattern string (`:SOURce:FREQuency`, `MEASure<ch:1-8>[:DC]?`)
/// into its steps plus the trailing-`?` query flag.
pub fn parse_pattern(pattern: &str) -> Result<(Vec<PatternStep>, bool), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }

    let mut pat = pattern;
    let is_query = pat.ends_with('?');
    if is_query {
        pat = &pat[..pat.len() - 1];
    }
    let pat = pat.strip_prefix(':').unwrap_or(pat);

    // Split on ':' at depth zero. "[:X]" wraps a whole step and is carried
    // over as "[X]" so the optional flag survives the split.
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0i32;
    let mut angle_depth = 0i32;

    let chars: Vec<char> = pat.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '[' if i + 1 < chars.len() && chars[i + 1] == ':' => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                current.push('[');
                i += 2; // past "[:"
                while i < chars.len() && chars[i] != ']' {
                    match chars[i] {
                        '<' => angle_depth += 1,
                        '>' => angle_depth -= 1,
                        _ => {}
                    }
                    current.push(chars[i]);
                    i += 1;
                }
                if i < chars.len() {
                    current.push(']');
                }
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                bracket_depth += 1;
                current.push(c);
            }
            ']' => {
                if bracket_depth > 0 {
                    bracket_depth -= 1;
                }
                current.push(c);
            }
            '<' => {
                angle_depth += 1;
                current.push(c);
            }
            '>' => {
                angle_depth -= 1;
                current.push(c);
            }
            ':' if bracket_depth == 0 && angle_depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
        i += 1;
    }
    if !current.is_empty() {
        parts.push(current);
    }

    if parts.is_empty() {
        return Err(PatternError::NoSteps);
    }
    if bracket_depth != 0 {
        return Err(PatternError::UnmatchedBracket);
    }
    if angle_depth != 0 {
        return Err(PatternError::UnmatchedAngle);
    }

    let mut steps = Vec::with_capacity(parts.len());
    let mut auto_index = 1i32;
    for part in &parts {
        steps.push(parse_step(part, &mut auto_index)?);
    }

    Ok((steps, is_query))
}

fn parse_step(step_text: &str, auto_index: &mut i32) -> Result<PatternStep, PatternError> {
    let mut text = step_text;
    let mut optional = false;

    if let Some(inner) = text.strip_prefix('[') {
        match inner.strip_suffix(']') {
            Some(core) => {
                optional = true;
                text = core;
            }
            None => return Err(PatternError::UnmatchedBracket),
        }
    }

    if text.is_empty() {
        return Err(PatternError::EmptyStep);
    }

    let (long_name, param) = if let Some(angle) = text.find('<') {
        // Named parameter: MEASure<ch> or MEASure<ch:1-16>.
        let close = text[angle..]
            .find('>')
            .map(|p| angle + p)
            .ok_or(PatternError::MissingAngleClose)?;
        if close + 1 != text.len() {
            return Err(PatternError::TrailingAfterParam);
        }
        let name = &text[..angle];
        let def = parse_param_def(&text[angle + 1..close], auto_index)?;
        (name.to_string(), Some(def))
    } else if let Some(hash) = text.find('#') {
        // Anonymous parameter: MEASure#.
        if hash + 1 != text.len() {
            return Err(PatternError::TrailingAfterHash);
        }
        let name = &text[..hash];
        let def = NodeParamDef {
            name: next_auto_name(auto_index),
            constraint: SuffixConstraint::default(),
        };
        (name.to_string(), Some(def))
    } else {
        (text.to_string(), None)
    };

    if long_name.is_empty() {
        return Err(PatternError::EmptyName);
    }

    Ok(PatternStep {
        short_name: extract_short_name(&long_name),
        long_name,
        optional,
        param,
    })
}

fn next_auto_name(auto_index: &mut i32) -> String {
    let name = format!("_{}", auto_index);
    *auto_index += 1;
    name
}

fn parse_param_def(def_text: &str, auto_index: &mut i32) -> Result<NodeParamDef, PatternError> {
    if def_text.is_empty() {
        return Ok(NodeParamDef {
            name: next_auto_name(auto_index),
            constraint: SuffixConstraint::default(),
        });
    }

    let (name, constraint) = match def_text.find(':') {
        Some(colon) => {
            let range_text = &def_text[colon + 1..];
            let dash = range_text
                .find('-')
                .ok_or_else(|| PatternError::InvalidRange(range_text.to_string()))?;
            let min: i32 = range_text[..dash]
                .parse()
                .map_err(|_| PatternError::InvalidRange(range_text.to_string()))?;
            let max: i32 = range_text[dash + 1..]
                .parse()
                .map_err(|_| PatternError::InvalidRange(range_text.to_string()))?;
            if min > max {
                return Err(PatternError::ReversedRange);
            }
            (&def_text[..colon], SuffixConstraint::range(min, max))
        }
        None => (def_text, SuffixConstraint::default()),
    };

    let name = if name.is_empty() {
        next_auto_name(auto_index)
    } else {
        name.to_string()
    };

    Ok(NodeParamDef { name, constraint })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_path() {
        let (steps, query) = parse_pattern(":SOURce:FREQuency").unwrap();
        assert!(!query);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].short_name, "SOUR");
        assert_eq!(steps[0].long_name, "SOURce");
        assert_eq!(steps[1].short_name, "FREQ");
    }

    #[test]
    fn query_flag_stripped() {
        let (steps, query) = parse_pattern("MEASure:VOLTage?").unwrap();
        assert!(query);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn all_lowercase_name_is_its_own_short_form() {
        let (steps, _) = parse_pattern("frequency").unwrap();
        assert_eq!(steps[0].short_name, "FREQUENCY");
        assert_eq!(steps[0].long_name, "frequency");
    }

    #[test]
    fn optional_middle_step() {
        let (steps, _) = parse_pattern(":OUTPut[:STATe]").unwrap();
        assert_eq!(steps.len(), 2);
        assert!(!steps[0].optional);
        assert!(steps[1].optional);
        assert_eq!(steps[1].short_name, "STAT");
    }

    #[test]
    fn bracket_without_colon() {
        let (steps, _) = parse_pattern("MEASure[DC]").unwrap();
        assert_eq!(steps.len(), 2);
        assert!(steps[1].optional);
        assert_eq!(steps[1].long_name, "DC");
    }

    #[test]
    fn named_param_with_range() {
        let (steps, query) = parse_pattern(":MEASure<ch:1-8>[:DC]?").unwrap();
        assert!(query);
        let def = steps[0].param.as_ref().unwrap();
        assert_eq!(def.name, "ch");
        assert_eq!(def.constraint.min, 1);
        assert_eq!(def.constraint.max, 8);
    }

    #[test]
    fn anonymous_params_number_in_order() {
        let (steps, _) = parse_pattern("SLOT#:CHANnel#").unwrap();
        assert_eq!(steps[0].param.as_ref().unwrap().name, "_1");
        assert_eq!(steps[1].param.as_ref().unwrap().name, "_2");
    }

    #[test]
    fn reversed_range_rejected() {
        assert_eq!(
            parse_pattern("MEAS<ch:8-1>"),
            Err(PatternError::ReversedRange)
        );
    }

    #[test]
    fn malformed_patterns_rejected() {
        assert_eq!(parse_pattern(""), Err(PatternError::Empty));
        assert_eq!(parse_pattern("A<ch"), Err(PatternError::UnmatchedAngle));
        assert_eq!(parse_pattern("A#B"), Err(PatternError::TrailingAfterHash));
        assert_eq!(
            parse_pattern("A<ch:x-2>"),
            Err(PatternError::InvalidRange("x-2".into()))
        );
    }
}
