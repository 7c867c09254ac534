//! SCPI program-message grammar.
//!
//! The grammar side of the pipeline, leaves first: [`token`]/[`lexer`] turn
//! the byte stream into tokens, [`units`] and [`keywords`] recognise glued
//! unit suffixes and numeric keywords, [`parameter`] models one command
//! argument, and [`splitter`] assembles tokens into parsed commands.

/// Numeric keywords (`MIN`, `MAX`, `DEF`, the infinity family).
pub mod keywords;
/// The pull lexer over one program-message byte buffer.
pub mod lexer;
/// The tagged parameter value and the per-command parameter list.
pub mod parameter;
/// Message splitting: tokens → parsed commands.
pub mod splitter;
/// Token and lexical-error vocabulary.
pub mod token;
/// SI prefixes, base units, and glued unit-suffix parsing.
pub mod units;

pub use lexer::Lexer;
pub use splitter::{split, split_message, ParsedCommand, PathStep, SplitError};
pub use token::{LexErrorKind, Token, TokenKind};
