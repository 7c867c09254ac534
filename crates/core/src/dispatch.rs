use crate::exec::Context;
use crate::grammar::lexer::Lexer;
use crate::grammar::splitter::{split_message, ParsedCommand};
use crate::limits;
use crate::tree::resolver::{resolve, PathContext, Resolution};
use crate::tree::{CommandTree, NodeId, PatternError};
use scpi_pipeline_errors::{class_of, codes, ErrorClass};
use std::sync::Arc;
use tracing::{debug, trace};

pub use crate::tree::CommandHandler;

/// The program-message dispatcher: the registration surface plus the
/// execute loop that ties splitter, resolver, and context together.
///
/// One dispatcher serves one command tree; the current-path context lives
/// here and, with auto-reset enabled (the default), returns to the root at
/// the start of each message.
pub struct Dispatcher {
    tree: CommandTree,
    path: PathContext,
    auto_reset_path: bool,
    block_terminator: Option<fn(u8) -> bool>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// An empty dispatcher with path auto-reset enabled.
    pub fn new() -> Self {
        Self {
            tree: CommandTree::new(),
            path: PathContext::new(),
            auto_reset_path: true,
            block_terminator: None,
        }
    }

    /// The command tree, for inspection and direct registration.
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Enable or disable path auto-reset at the start of each message.
    pub fn set_auto_reset_path(&mut self, enabled: bool) {
        self.auto_reset_path = enabled;
    }

    /// Return the current-path context to the root.
    pub fn reset_path(&mut self) {
        self.path.reset();
    }

    /// Override the indefinite-block terminator used when lexing input
    /// (default: LF, plus CR).
    pub fn set_block_terminator(&mut self, terminator: fn(u8) -> bool) {
        self.block_terminator = Some(terminator);
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register a set handler under a tree pattern.
    pub fn register_command(
        &mut self,
        pattern: &str,
        handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) -> Result<NodeId, PatternError> {
        self.tree.register_command(pattern, Arc::new(handler))
    }

    /// Register a query handler under a tree pattern (`?` optional).
    pub fn register_query(
        &mut self,
        pattern: &str,
        handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) -> Result<NodeId, PatternError> {
        self.tree.register_query(pattern, Arc::new(handler))
    }

    /// Register set and query handlers under one pattern.
    pub fn register_both(
        &mut self,
        pattern: &str,
        set_handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
        query_handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) -> Result<NodeId, PatternError> {
        self.tree
            .register_both(pattern, Arc::new(set_handler), Arc::new(query_handler))
    }

    /// Register an IEEE-488.2 common command (`*RST`, `*IDN?`). The set and
    /// query spellings are distinct registrations.
    pub fn register_common(
        &mut self,
        name: &str,
        handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) {
        self.tree.register_common(name, Arc::new(handler));
    }

    /// Register a single handler, choosing set vs query by the pattern's
    /// trailing `?`. A `*`-pattern is registered in the common map as
    /// spelled — including a set-only spelling, which is accepted silently.
    pub fn register_auto(
        &mut self,
        pattern: &str,
        handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) -> Result<Option<NodeId>, PatternError> {
        if pattern.starts_with('*') {
            self.register_common(pattern, handler);
            return Ok(None);
        }
        let id = if pattern.ends_with('?') {
            self.register_query(pattern, handler)?
        } else {
            self.register_command(pattern, handler)?
        };
        Ok(Some(id))
    }

    /// Register a set/query pair at once. For a `*`-pattern this registers
    /// both `*X` and `*X?`.
    pub fn register_auto_pair(
        &mut self,
        pattern: &str,
        set_handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
        query_handler: impl Fn(&mut Context) -> i32 + Send + Sync + 'static,
    ) -> Result<Option<NodeId>, PatternError> {
        if pattern.starts_with('*') {
            let base = pattern.strip_suffix('?').unwrap_or(pattern);
            self.register_common(base, set_handler);
            self.register_common(&format!("{}?", base), query_handler);
            return Ok(None);
        }
        Ok(Some(self.register_both(pattern, set_handler, query_handler)?))
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// Execute a program message given as text.
    pub fn execute(&mut self, input: &str, ctx: &mut Context) -> i32 {
        self.execute_all(input.as_bytes(), ctx)
    }

    /// Execute a program message: split, then resolve and run each command
    /// in source order. Returns the last non-zero handler/error code, 0 on
    /// clean success. Errors are also queued on the context.
    pub fn execute_all(&mut self, input: &[u8], ctx: &mut Context) -> i32 {
        if input.len() > limits::MAX_INPUT_SIZE {
            ctx.push_standard_error_with_info(codes::OUT_OF_MEMORY, "Command string too long");
            return codes::OUT_OF_MEMORY;
        }

        if self.auto_reset_path {
            self.path.reset();
        }

        let mut lexer = Lexer::new(input);
        if let Some(terminator) = self.block_terminator {
            lexer.set_block_terminator(terminator);
        }

        let commands = split_message(&mut lexer);

        let mut last_rc = 0;
        for item in &commands {
            let cmd = match item {
                Ok(cmd) => cmd,
                Err(err) => {
                    // A malformed command is reported and skipped; the rest
                    // of the message still runs.
                    debug!(code = err.code, offset = err.offset, "command split failed");
                    let code = if err.code == 0 {
                        codes::SYNTAX_ERROR
                    } else {
                        err.code
                    };
                    ctx.push_standard_error_with_info(code, &err.message);
                    last_rc = code;
                    continue;
                }
            };
            // Query-interruption model (buffered mode): a new command with a
            // response still pending discards it and queues -410, or -440
            // after an indefinite block. The new command still executes.
            if ctx.has_pending_response() {
                if ctx.last_response_was_indefinite() {
                    ctx.push_standard_error(codes::QUERY_UNTERMINATED_INDEF);
                } else {
                    ctx.push_standard_error(codes::QUERY_INTERRUPTED);
                }
                ctx.clear_responses();
            }

            let resolution = match resolve(&self.tree, cmd, &self.path) {
                Ok(resolution) => resolution,
                Err(err) => {
                    debug!(code = err.code, header = %cmd.header_text(), "resolve failed");
                    let code = if err.code == 0 {
                        codes::UNDEFINED_HEADER
                    } else {
                        err.code
                    };
                    ctx.push_standard_error_with_info(code, &err.message);
                    last_rc = code;
                    // The path context stays where it was for a failed command.
                    continue;
                }
            };

            let rc = self.execute_resolved(cmd, &resolution, ctx);
            if rc != 0 {
                last_rc = rc;
            }

            self.update_path_context(cmd, &resolution);
        }

        last_rc
    }

    fn execute_resolved(&self, cmd: &ParsedCommand, resolution: &Resolution, ctx: &mut Context) -> i32 {
        ctx.reset_command_state();
        ctx.set_query(cmd.is_query);
        ctx.set_params(cmd.params.clone());

        let handler = match resolution {
            Resolution::Common(handler) => handler.clone(),
            Resolution::Node {
                node, node_params, ..
            } => {
                ctx.set_node_params(node_params.clone());
                let handler = if cmd.is_query {
                    self.tree.query_handler(*node)
                } else {
                    self.tree.handler(*node)
                };
                match handler {
                    Some(handler) => handler,
                    None => {
                        // The node exists but carries no handler for this
                        // operation kind.
                        let code = if cmd.is_query {
                            codes::QUERY_ERROR
                        } else {
                            codes::COMMAND_ERROR
                        };
                        ctx.push_standard_error(code);
                        return code;
                    }
                }
            }
        };

        trace!(header = %cmd.header_text(), "dispatching");
        let rc = normalize_handler_return(handler(ctx));

        // A non-zero return with no error published yet gets the standard
        // error for its class, EXECUTION_ERROR as the out-of-range fallback.
        if rc != 0 && !ctx.has_transient_error() {
            match class_of(rc) {
                ErrorClass::Command
                | ErrorClass::Execution
                | ErrorClass::Device
                | ErrorClass::Query => ctx.push_standard_error(rc),
                ErrorClass::User => ctx.push_error(rc, "Device-defined error"),
                _ => ctx.push_standard_error(codes::EXECUTION_ERROR),
            }
        }
        if rc != 0 {
            debug!(header = %cmd.header_text(), rc, "handler returned error");
        }

        rc
    }

    /// Semicolon-continuation rules: after a command, the context rests on
    /// the parent of the consumed path. Single-step relative commands keep
    /// their starting node; single-step absolute commands rest on the root.
    /// Common commands leave the context alone.
    fn update_path_context(&mut self, cmd: &ParsedCommand, resolution: &Resolution) {
        let consumed = match resolution {
            Resolution::Common(_) => return,
            Resolution::Node { consumed, .. } => consumed,
        };

        let start = if cmd.is_absolute {
            None
        } else {
            self.path.current()
        };

        let new_current = match consumed.len() {
            0 => start,
            1 => start,
            n => Some(consumed[n - 2]),
        };

        self.path.set_current(new_current);
    }
}

/// Clamp a handler return to the contract: 0, a SCPI code in `-499..=-100`,
/// or a positive device-defined code; anything else becomes `-200`.
fn normalize_handler_return(rc: i32) -> i32 {
    if rc == 0 || rc > 0 || (-499..=-100).contains(&rc) {
        rc
    } else {
        codes::EXECUTION_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_return_normalisation() {
        assert_eq!(normalize_handler_return(0), 0);
        assert_eq!(normalize_handler_return(-113), -113);
        assert_eq!(normalize_handler_return(42), 42);
        assert_eq!(normalize_handler_return(-1), codes::EXECUTION_ERROR);
        assert_eq!(normalize_handler_return(-999), codes::EXECUTION_ERROR);
    }
}
