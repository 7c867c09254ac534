//! The hierarchical SCPI command tree.
//!
//! Registration compiles pattern strings ([`pattern`]) into a trie of
//! [`node::CommandNode`]s; execution resolves parsed command headers against
//! it ([`resolver`]). Nodes live in an arena owned by [`CommandTree`] and are
//! addressed by [`NodeId`] — the current-path context holds an id, never a
//! reference, so sessions cannot dangle into a rebuilt tree.

/// Tree nodes, suffix constraints, and captured node parameters.
pub mod node;
/// Registration-pattern compilation.
pub mod pattern;
/// Execution-time path resolution and the current-path context.
pub mod resolver;

use crate::exec::Context;
use node::{match_name, CommandNode, NodeParamDef};
use pattern::{parse_pattern, PatternStep};
pub use pattern::PatternError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use resolver::PathContext;

/// A command handler: shared immutable callable, handed the context by
/// exclusive reference for the duration of the call. Returns 0 on success or
/// a SCPI error code (negative standard / positive device-defined).
pub type CommandHandler = Arc<dyn Fn(&mut Context) -> i32 + Send + Sync>;

/// Arena index of a tree node. Valid only for the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of any tree.
    pub const ROOT: NodeId = NodeId(0);
}

/// Outcome of a child lookup during resolution.
pub(crate) enum ChildLookup {
    /// A child matched; `captured` carries the node parameter when declared.
    Found {
        /// The matching child.
        id: NodeId,
        /// The validated suffix or constraint default, for param nodes.
        captured: Option<i32>,
    },
    /// A name matched but its numeric suffix failed the `{min,max}` bounds.
    SuffixMismatch,
    /// Nothing matched.
    NotFound,
}

/// The command tree: an arena of nodes plus the common-command map.
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    common: BTreeMap<String, CommandHandler>,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    /// An empty tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new("ROOT".into(), "ROOT".into(), None)],
            common: BTreeMap::new(),
        }
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    /// The set handler attached to `id`, if any.
    pub fn handler(&self, id: NodeId) -> Option<CommandHandler> {
        self.node(id).handler.clone()
    }

    /// The query handler attached to `id`, if any.
    pub fn query_handler(&self, id: NodeId) -> Option<CommandHandler> {
        self.node(id).query_handler.clone()
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register a set handler under `pattern`. Returns the leaf node.
    pub fn register_command(
        &mut self,
        pattern: &str,
        handler: CommandHandler,
    ) -> Result<NodeId, PatternError> {
        let (steps, _) = parse_pattern(pattern)?;
        self.register_steps(&steps, Some(handler), None)
    }

    /// Register a query handler under `pattern` (with or without its `?`).
    pub fn register_query(
        &mut self,
        pattern: &str,
        handler: CommandHandler,
    ) -> Result<NodeId, PatternError> {
        let (steps, _) = parse_pattern(pattern)?;
        self.register_steps(&steps, None, Some(handler))
    }

    /// Register both operations under one pattern.
    pub fn register_both(
        &mut self,
        pattern: &str,
        set_handler: CommandHandler,
        query_handler: CommandHandler,
    ) -> Result<NodeId, PatternError> {
        let (steps, _) = parse_pattern(pattern)?;
        self.register_steps(&steps, Some(set_handler), Some(query_handler))
    }

    fn register_steps(
        &mut self,
        steps: &[PatternStep],
        set_handler: Option<CommandHandler>,
        query_handler: Option<CommandHandler>,
    ) -> Result<NodeId, PatternError> {
        if steps.is_empty() {
            return Err(PatternError::NoSteps);
        }

        let leaf = self.ensure_path(steps);

        // With trailing optional steps the handlers are replicated at every
        // truncation point from the last non-optional step onward, so input
        // that stops early still resolves (`P:a:b[:c][:d]` → handlers at
        // P:a:b, P:a:b:c, P:a:b:c:d).
        let optional_start = trailing_optional_start(steps);

        let attach = |tree: &mut Self, id: NodeId| {
            if let Some(h) = &set_handler {
                tree.node_mut(id).handler = Some(h.clone());
            }
            if let Some(h) = &query_handler {
                tree.node_mut(id).query_handler = Some(h.clone());
            }
        };

        if optional_start < steps.len() {
            for len in optional_start..=steps.len() {
                if len == 0 {
                    continue; // a fully-optional pattern has no empty form
                }
                let id = self.ensure_path(&steps[..len]);
                attach(self, id);
            }
        } else {
            attach(self, leaf);
        }

        Ok(leaf)
    }

    /// Walk `steps` from the root, creating missing nodes. Existing nodes
    /// pick up the optional flag when a registering pattern declares it;
    /// re-registration otherwise leaves siblings and handlers untouched.
    fn ensure_path(&mut self, steps: &[PatternStep]) -> NodeId {
        let mut current = NodeId::ROOT;
        for step in steps {
            let key = step.short_name.to_ascii_uppercase();
            let existing = self.node(current).children.get(&key).copied();
            let child = match existing {
                Some(id) => {
                    if step.optional {
                        self.node_mut(id).optional = true;
                    }
                    id
                }
                None => {
                    let id = NodeId(self.nodes.len());
                    let mut node = CommandNode::new(
                        step.short_name.clone(),
                        step.long_name.clone(),
                        step.param.clone(),
                    );
                    node.optional = step.optional;
                    self.nodes.push(node);
                    self.node_mut(current).children.insert(key, id);
                    id
                }
            };
            current = child;
        }
        current
    }

    // ── Common commands ─────────────────────────────────────────────────

    /// Register a `*`-command handler. The name is uppercased and given its
    /// leading `*` if missing; a trailing `?` is part of the key, so set and
    /// query variants are two distinct registrations.
    pub fn register_common(&mut self, name: &str, handler: CommandHandler) {
        self.common.insert(normalize_common_name(name), handler);
    }

    /// Look up a common-command handler by normalised name.
    pub fn find_common(&self, name: &str) -> Option<CommandHandler> {
        self.common.get(&normalize_common_name(name)).cloned()
    }

    /// `true` when a common command is registered under `name`.
    pub fn has_common(&self, name: &str) -> bool {
        self.common.contains_key(&normalize_common_name(name))
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    /// Find the child of `parent` matching one header step.
    pub(crate) fn find_child(
        &self,
        parent: NodeId,
        base_name: &str,
        suffix: Option<i32>,
    ) -> ChildLookup {
        let upper = base_name.to_ascii_uppercase();
        let mut suffix_mismatch = false;

        for &child_id in self.node(parent).children.values() {
            let child = self.node(child_id);
            if !match_name(&upper, &child.short_name, &child.long_name) {
                continue;
            }

            match (&child.param, suffix) {
                (Some(def), Some(value)) => {
                    if def.constraint.validate(value) {
                        return ChildLookup::Found {
                            id: child_id,
                            captured: Some(value),
                        };
                    }
                    // Name matched, suffix out of bounds. Keep looking at
                    // siblings before reporting the range failure.
                    suffix_mismatch = true;
                }
                (Some(def), None) => {
                    if !def.constraint.required {
                        return ChildLookup::Found {
                            id: child_id,
                            captured: Some(def.constraint.default),
                        };
                    }
                    // Suffix required but not spelled.
                }
                (None, None) => {
                    return ChildLookup::Found {
                        id: child_id,
                        captured: None,
                    };
                }
                (None, Some(_)) => {
                    // Input has a suffix the node does not expect.
                }
            }
        }

        if suffix_mismatch {
            ChildLookup::SuffixMismatch
        } else {
            ChildLookup::NotFound
        }
    }

    /// Exact-path lookup by full mnemonics (suffix digits included), with
    /// optional capture of node parameters. For tests and tooling.
    pub fn find_node(
        &self,
        path: &[&str],
        mut node_params: Option<&mut node::NodeParamValues>,
    ) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        let mut current = NodeId::ROOT;
        for name in path {
            let (base, suffix) = crate::grammar::token::split_numeric_suffix(name);
            let child = match self.find_child(current, base, suffix) {
                ChildLookup::Found { id, captured } => {
                    if let Some(value) = captured {
                        if let Some(params) = node_params.as_deref_mut() {
                            let n = self.node(id);
                            let declared = n
                                .param
                                .as_ref()
                                .map(|d: &NodeParamDef| d.name.clone())
                                .unwrap_or_default();
                            params.add(declared, n.short_name.clone(), n.long_name.clone(), value);
                        }
                    }
                    id
                }
                _ => return None,
            };
            current = child;
        }
        Some(current)
    }

    // ── Debug ───────────────────────────────────────────────────────────

    /// Render the tree (and common commands) for troubleshooting.
    pub fn dump(&self) -> String {
        let mut out = String::from("=== Command Tree ===\n");
        for child in self.node(NodeId::ROOT).children.values() {
            self.dump_node(*child, 0, &mut out);
        }
        if !self.common.is_empty() {
            out.push_str("\n=== Common Commands ===\n");
            for name in self.common.keys() {
                out.push_str("  ");
                out.push_str(name);
                out.push('\n');
            }
        }
        out
    }

    fn dump_node(&self, id: NodeId, indent: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(indent));
        out.push_str(&node.describe());
        if node.optional {
            out.push_str(" [optional]");
        }
        if node.handler.is_some() {
            out.push_str(" [SET]");
        }
        if node.query_handler.is_some() {
            out.push_str(" [QUERY]");
        }
        out.push('\n');
        for child in node.children.values() {
            self.dump_node(*child, indent + 1, out);
        }
    }
}

/// Index of the first step of the trailing run of optional steps
/// (`steps.len()` when the pattern ends with a non-optional step).
fn trailing_optional_start(steps: &[PatternStep]) -> usize {
    let mut start = steps.len();
    for i in (0..steps.len()).rev() {
        if steps[i].optional {
            start = i;
        } else {
            break;
        }
    }
    start
}

/// Uppercase and ensure the leading `*` of a common-command name; a trailing
/// `?` is preserved as part of the key.
fn normalize_common_name(name: &str) -> String {
    let upper = name.to_ascii_uppercase();
    if upper.starts_with('*') {
        upper
    } else {
        format!("*{}", upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> CommandHandler {
        Arc::new(|_| 0)
    }

    #[test]
    fn registration_builds_path() {
        let mut tree = CommandTree::new();
        let leaf = tree.register_command(":SOURce:FREQuency", noop()).unwrap();
        assert!(tree.node(leaf).has_handler());
        assert_eq!(tree.node(leaf).short_name(), "FREQ");
        assert!(tree.find_node(&["SOUR", "FREQ"], None).is_some());
        assert!(tree.find_node(&["SOURCE", "FREQUENCY"], None).is_some());
        assert!(tree.find_node(&["SOU", "FREQ"], None).is_none());
    }

    #[test]
    fn reregistration_overwrites_handler_only() {
        let mut tree = CommandTree::new();
        tree.register_command(":OUTPut:STATe", noop()).unwrap();
        let leaf = tree.register_query(":OUTPut:STATe?", noop()).unwrap();
        let node = tree.node(leaf);
        assert!(node.has_handler());
        assert!(node.has_query_handler());
    }

    #[test]
    fn trailing_optional_handler_replication() {
        let mut tree = CommandTree::new();
        tree.register_command(":OUTPut[:STATe]", noop()).unwrap();

        let outp = tree.find_node(&["OUTP"], None).unwrap();
        let stat = tree.find_node(&["OUTP", "STAT"], None).unwrap();
        assert!(tree.node(outp).has_handler());
        assert!(tree.node(stat).has_handler());
        assert!(tree.node(stat).is_optional());
    }

    #[test]
    fn common_name_normalisation() {
        let mut tree = CommandTree::new();
        tree.register_common("*IDN?", noop());
        assert!(tree.has_common("*idn?"));
        assert!(tree.has_common("IDN?"));
        assert!(!tree.has_common("*IDN"));
    }

    #[test]
    fn suffix_capture_through_find_node() {
        let mut tree = CommandTree::new();
        tree.register_command(":MEASure<ch:1-8>:VOLTage", noop())
            .unwrap();

        let mut params = node::NodeParamValues::new();
        let id = tree.find_node(&["MEAS3", "VOLT"], Some(&mut params));
        assert!(id.is_some());
        assert_eq!(params.get("ch", 0), 3);

        assert!(tree.find_node(&["MEAS9", "VOLT"], None).is_none());
    }
}
