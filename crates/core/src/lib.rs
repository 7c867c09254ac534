//! scpi-pipeline core library.
//!
//! An embeddable SCPI program-message pipeline: lexical analysis of a mixed
//! ASCII/binary byte stream, splitting into commands, resolution of command
//! headers against a hierarchical command tree (short/long mnemonic matching,
//! optional nodes, numeric suffixes), and an execution context carrying the
//! IEEE-488.2 status model (error queue, ESR/ESE/SRE registers, buffered
//! responses with query-interruption semantics).
//!
//! The main entry point is [`Dispatcher`]: register handlers against SCPI
//! patterns, then feed it program messages together with a [`Context`].
//!
//! ```
//! use scpi_pipeline_core::{Context, Dispatcher};
//!
//! let mut scpi = Dispatcher::new();
//! scpi.register_both(
//!     ":SOURce:FREQuency",
//!     |ctx| {
//!         let _hz = ctx.params().get_scaled_double(0, 0.0);
//!         0
//!     },
//!     |ctx| {
//!         ctx.result_f64(1.0e3);
//!         0
//!     },
//! )
//! .unwrap();
//!
//! let mut ctx = Context::new();
//! assert_eq!(scpi.execute(":SOUR:FREQ 1kHz", &mut ctx), 0);
//! ```

#![warn(missing_docs)]

/// Program-message grammar: lexer, units, keywords, parameters, splitter.
pub mod grammar;
/// Command tree: pattern compilation, nodes, path resolution.
pub mod tree;
/// Execution context: error queue, status registers, response buffering.
pub mod exec;

mod defaults;
mod dispatch;

// ── Convenience re-exports ──────────────────────────────────────────────
// Flat imports for the common entry points. Full module paths remain
// available for the less common types.

// Dispatcher
pub use dispatch::{CommandHandler, Dispatcher};

// Execution context
pub use exec::{ByteOrder, Context};

// Parameters
pub use grammar::parameter::{Parameter, ParameterList};

// Units and keywords
pub use grammar::keywords::NumericKeyword;
pub use grammar::units::{BaseUnit, SiPrefix, UnitValue};

// Tree
pub use tree::pattern::PatternError;
pub use tree::{CommandTree, NodeId};

// Errors (re-exported from the errors crate)
pub use scpi_pipeline_errors::{class_of, codes, standard_message, ErrorClass, ErrorEntry};

/// Hard limits of the pipeline. Exposed, not negotiable.
pub mod limits {
    /// Default error-queue capacity.
    pub const DEFAULT_ERROR_QUEUE_SIZE: usize = 20;
    /// Maximum length of one command line (64 KiB).
    pub const MAX_COMMAND_LENGTH: usize = 64 * 1024;
    /// Maximum definite-block payload (100 MiB).
    pub const MAX_BLOCK_DATA_SIZE: usize = 100 * 1024 * 1024;
    /// Maximum overall input: one block plus one command line.
    pub const MAX_INPUT_SIZE: usize = MAX_BLOCK_DATA_SIZE + MAX_COMMAND_LENGTH;
    /// Maximum identifier length accepted by the lexer.
    pub const MAX_IDENTIFIER_LENGTH: usize = 255;
    /// Resolver recursion depth cap.
    pub const MAX_RESOLVE_DEPTH: usize = 32;
    /// Cap on the expanded size of a channel list.
    pub const MAX_CHANNEL_EXPANSION: usize = 100_000;
}
