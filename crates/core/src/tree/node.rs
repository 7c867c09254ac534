use std::collections::BTreeMap;

use super::{CommandHandler, NodeId};

/// Constraint on a node's numeric suffix (`MEASure<ch:1-8>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixConstraint {
    /// Smallest accepted suffix.
    pub min: i32,
    /// Largest accepted suffix.
    pub max: i32,
    /// `true` when the input must spell a suffix.
    pub required: bool,
    /// The captured value when the suffix is optional and absent.
    pub default: i32,
}

impl Default for SuffixConstraint {
    fn default() -> Self {
        Self {
            min: 1,
            max: i32::MAX,
            required: true,
            default: 1,
        }
    }
}

impl SuffixConstraint {
    /// A required suffix bounded to `min..=max`.
    pub fn range(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    /// An optional suffix with a default capture.
    pub fn optional(default: i32) -> Self {
        Self {
            required: false,
            default,
            ..Self::default()
        }
    }

    /// An optional suffix bounded to `min..=max` with a default capture.
    pub fn optional_range(min: i32, max: i32, default: i32) -> Self {
        Self {
            min,
            max,
            required: false,
            default,
        }
    }

    /// `true` when `value` is within bounds.
    pub fn validate(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Registration-time declaration of a node parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeParamDef {
    /// Declared name (`ch`, `slot`), or `_1`, `_2`, … for anonymous params.
    pub name: String,
    /// Suffix bounds and default.
    pub constraint: SuffixConstraint,
}

impl NodeParamDef {
    /// A parameter with the default (unbounded, required) constraint.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: SuffixConstraint::default(),
        }
    }
}

/// One captured node parameter, recorded during path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeParamEntry {
    /// The name declared at registration (`ch`).
    pub param_name: String,
    /// Short name of the capturing node (`MEAS`).
    pub node_short_name: String,
    /// Long name of the capturing node (`MEASure`).
    pub node_long_name: String,
    /// The captured suffix (or the constraint default).
    pub value: i32,
}

/// The node parameters captured while resolving one command.
///
/// Lookup by declared name, by capture order, or by the capturing node's
/// short/long name — all bounds-safe with caller defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeParamValues {
    entries: Vec<NodeParamEntry>,
}

impl NodeParamValues {
    /// An empty capture set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a capture.
    pub fn add(
        &mut self,
        param_name: impl Into<String>,
        node_short_name: impl Into<String>,
        node_long_name: impl Into<String>,
        value: i32,
    ) {
        self.entries.push(NodeParamEntry {
            param_name: param_name.into(),
            node_short_name: node_short_name.into(),
            node_long_name: node_long_name.into(),
            value,
        });
    }

    /// Number of captures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all captures.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Capture value by declared name, or `default`.
    pub fn get(&self, name: &str, default: i32) -> i32 {
        self.entries
            .iter()
            .find(|e| e.param_name == name)
            .map_or(default, |e| e.value)
    }

    /// Capture value by capture order, or `default`.
    pub fn get_at(&self, index: usize, default: i32) -> i32 {
        self.entries.get(index).map_or(default, |e| e.value)
    }

    /// Capture value by the capturing node's short or long name
    /// (case-insensitive), or `default`.
    pub fn get_by_node_name(&self, node_name: &str, default: i32) -> i32 {
        let upper = node_name.to_ascii_uppercase();
        self.entries
            .iter()
            .find(|e| {
                e.node_short_name.to_ascii_uppercase() == upper
                    || e.node_long_name.to_ascii_uppercase() == upper
            })
            .map_or(default, |e| e.value)
    }

    /// The captures in resolution order.
    pub fn entries(&self) -> &[NodeParamEntry] {
        &self.entries
    }
}

/// One node of the command tree.
///
/// Nodes are owned by the tree's arena and refer to children by [`NodeId`];
/// the child map is keyed by the uppercased short name, which is unique per
/// parent.
pub struct CommandNode {
    pub(super) short_name: String,
    pub(super) long_name: String,
    pub(super) param: Option<NodeParamDef>,
    pub(super) optional: bool,
    pub(super) handler: Option<CommandHandler>,
    pub(super) query_handler: Option<CommandHandler>,
    pub(super) children: BTreeMap<String, NodeId>,
}

impl CommandNode {
    pub(super) fn new(short_name: String, long_name: String, param: Option<NodeParamDef>) -> Self {
        Self {
            short_name,
            long_name,
            param,
            optional: false,
            handler: None,
            query_handler: None,
            children: BTreeMap::new(),
        }
    }

    /// Short (all-caps) mnemonic form.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Long mnemonic form.
    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// The node-parameter declaration, when the pattern carried one.
    pub fn param(&self) -> Option<&NodeParamDef> {
        self.param.as_ref()
    }

    /// `true` when the node was declared optional (`[:STATe]`).
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// `true` when a set handler is attached.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// `true` when a query handler is attached.
    pub fn has_query_handler(&self) -> bool {
        self.query_handler.is_some()
    }

    /// Children ids in child-map order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    /// Short name, long form in parentheses when they differ, plus the
    /// parameter declaration — the debug description of one node.
    pub fn describe(&self) -> String {
        let mut out = self.short_name.clone();
        if self.short_name != self.long_name {
            out.push('(');
            out.push_str(&self.long_name);
            out.push(')');
        }
        if let Some(def) = &self.param {
            out.push('<');
            out.push_str(&def.name);
            let c = &def.constraint;
            if c.min != 1 || c.max != i32::MAX {
                out.push_str(&format!(":{}-{}", c.min, c.max));
            }
            if !c.required {
                out.push_str(&format!(",def={}", c.default));
            }
            out.push('>');
        }
        out
    }
}

/// Short/long mnemonic matching.
///
/// `input_upper` (already uppercased) matches when it equals the short name,
/// equals the long name, or is a prefix of the long name at least as long as
/// the short name. Any shorter prefix is a mismatch: `VOL` never matches
/// `VOLTage`, while `VOLT`, `VOLTA`, `VOLTAGE` all do.
pub(super) fn match_name(input_upper: &str, short_name: &str, long_name: &str) -> bool {
    let upper_short = short_name.to_ascii_uppercase();
    let upper_long = long_name.to_ascii_uppercase();

    if input_upper == upper_short || input_upper == upper_long {
        return true;
    }
    input_upper.len() >= upper_short.len()
        && input_upper.len() <= upper_long.len()
        && upper_long.starts_with(input_upper)
}
