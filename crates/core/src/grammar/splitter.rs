use super::lexer::Lexer;
use super::parameter::{Parameter, ParameterList};
use super::token::{LexErrorKind, Token, TokenKind};
use super::units::parse_unit_value;
use crate::limits;
use scpi_pipeline_errors::codes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of a command header path: a mnemonic with an optional numeric
/// suffix (`MEAS2` → name `MEAS`, suffix 2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// The mnemonic with any numeric suffix removed.
    pub name: String,
    /// The numeric suffix, when spelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<i32>,
}

impl PathStep {
    /// A step without a suffix.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffix: None,
        }
    }

    /// A step with a numeric suffix.
    pub fn with_suffix(name: impl Into<String>, suffix: i32) -> Self {
        Self {
            name: name.into(),
            suffix: Some(suffix),
        }
    }
}

impl std::fmt::Display for PathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.suffix {
            Some(n) => write!(f, "{}{}", self.name, n),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One parsed command of a program message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// `true` when the header began with `:` (resolve from the root).
    pub is_absolute: bool,
    /// `true` when the header ended with `?`.
    pub is_query: bool,
    /// `true` for a `*`-prefixed IEEE-488.2 common command.
    pub is_common: bool,
    /// The header path. For a common command this holds a single step with
    /// the bare mnemonic (no suffix splitting).
    pub path: Vec<PathStep>,
    /// The arguments, in source order.
    pub params: ParameterList,
    /// Byte offset of the first header byte.
    pub start: usize,
    /// Byte offset one past the command.
    pub end: usize,
}

impl ParsedCommand {
    /// Render the header path for diagnostics (`SOUR:FREQ2`).
    pub fn header_text(&self) -> String {
        let mut out = String::new();
        if self.is_common {
            out.push('*');
        } else if self.is_absolute {
            out.push(':');
        }
        for (i, step) in self.path.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            out.push_str(&step.to_string());
        }
        if self.is_query {
            out.push('?');
        }
        out
    }
}

/// A structural failure while splitting a program message.
///
/// `code` is the SCPI error code the dispatcher enqueues (-101, -102, -104,
/// -223, -224, -225); `offset` points at the offending byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SplitError {
    /// SCPI error code for the failure.
    pub code: i32,
    /// Human-readable detail.
    pub message: String,
    /// Byte offset of the offence.
    pub offset: usize,
}

impl SplitError {
    fn new(code: i32, message: impl Into<String>, offset: usize) -> Self {
        Self {
            code,
            message: message.into(),
            offset,
        }
    }
}

/// Split one program message into its commands, failing on the first
/// malformed command. Tooling convenience over [`split_message`].
pub fn split(input: &[u8]) -> Result<Vec<ParsedCommand>, SplitError> {
    split_message(&mut Lexer::new(input)).into_iter().collect()
}

/// Split one program message, recovering at command boundaries.
///
/// A malformed command yields its [`SplitError`] in place and parsing
/// resumes after the next `;` or newline, so one bad command does not take
/// down the rest of the message.
pub fn split_message(lexer: &mut Lexer<'_>) -> Vec<Result<ParsedCommand, SplitError>> {
    let mut out = Vec::new();

    loop {
        // Leading newlines and whitespace between commands.
        while lexer.peek().is_newline() || lexer.peek().is_whitespace() {
            lexer.next();
        }
        if lexer.peek().is_end() {
            break;
        }

        let item = parse_one_terminated_command(lexer);
        let failed = item.is_err();
        out.push(item);
        if failed {
            skip_to_next_command(lexer);
        }
    }

    out
}

fn parse_one_terminated_command(lexer: &mut Lexer<'_>) -> Result<ParsedCommand, SplitError> {
    fail_on_lex_error(lexer.peek())?;

    let cmd = parse_one_command(lexer)?;

    // A command is followed by ';', a newline, or the end of input.
    let tok = lexer.peek();
    match &tok.kind {
        TokenKind::Semicolon | TokenKind::Newline => {
            lexer.next();
        }
        TokenKind::End => {}
        TokenKind::Error { .. } => fail_on_lex_error(tok)?,
        _ => {
            return Err(SplitError::new(
                codes::SYNTAX_ERROR,
                "Expected ';' or newline or end of input",
                tok.offset,
            ));
        }
    }

    Ok(cmd)
}

/// Recovery resync: drop tokens until a command separator is consumed or
/// the input ends, so parsing resumes at the next command.
fn skip_to_next_command(lexer: &mut Lexer<'_>) {
    loop {
        match lexer.peek().kind {
            TokenKind::End => break,
            TokenKind::Semicolon | TokenKind::Newline => {
                lexer.next();
                break;
            }
            _ => {
                lexer.next();
            }
        }
    }
}

fn parse_one_command(lexer: &mut Lexer<'_>) -> Result<ParsedCommand, SplitError> {
    let mut cmd = ParsedCommand {
        start: lexer.peek().offset,
        ..ParsedCommand::default()
    };

    parse_header(lexer, &mut cmd)?;

    // Parameters, when anything but a command terminator follows. SCPI wants
    // whitespace between header and first parameter but glued queries like
    // `RANG?MIN` are accepted in the wild.
    let tok = lexer.peek();
    if !matches!(
        tok.kind,
        TokenKind::Semicolon | TokenKind::Newline | TokenKind::End
    ) {
        parse_parameters(lexer, &mut cmd)?;
    }

    cmd.end = lexer.position();
    Ok(cmd)
}

fn parse_header(lexer: &mut Lexer<'_>, cmd: &mut ParsedCommand) -> Result<(), SplitError> {
    // Common command: *IDN? / *RST.
    if matches!(lexer.peek().kind, TokenKind::Asterisk) {
        cmd.is_common = true;
        lexer.next();

        let name_tok = lexer.next();
        fail_on_lex_error(&name_tok)?;
        if !matches!(name_tok.kind, TokenKind::Identifier { .. }) {
            return Err(SplitError::new(
                codes::SYNTAX_ERROR,
                "Expected common command mnemonic after '*'",
                name_tok.offset,
            ));
        }
        // The whole mnemonic, digits included: common headers have no
        // numeric-suffix splitting.
        cmd.path.push(PathStep::new(name_tok.text));

        if matches!(lexer.peek().kind, TokenKind::Question) {
            cmd.is_query = true;
            lexer.next();
        }
        return Ok(());
    }

    // Ordinary command: optional leading ':' makes it absolute.
    if matches!(lexer.peek().kind, TokenKind::Colon) {
        cmd.is_absolute = true;
        lexer.next();
    }

    let mut got_any = false;
    loop {
        let id = lexer.next();
        fail_on_lex_error(&id)?;
        let (base, suffix) = match id.kind {
            TokenKind::Identifier { base, suffix } => (base, suffix),
            _ => {
                let message = if got_any {
                    "Unexpected token in command header"
                } else {
                    "Expected command identifier"
                };
                return Err(SplitError::new(codes::SYNTAX_ERROR, message, id.offset));
            }
        };
        got_any = true;
        cmd.path.push(PathStep { name: base, suffix });

        match lexer.peek().kind {
            TokenKind::Question => {
                cmd.is_query = true;
                lexer.next();
                break; // '?' ends the header
            }
            TokenKind::Colon => {
                lexer.next();
            }
            _ => break,
        }
    }

    Ok(())
}

fn skip_param_separators(lexer: &mut Lexer<'_>) {
    while matches!(
        lexer.peek().kind,
        TokenKind::Whitespace | TokenKind::Comma
    ) {
        lexer.next();
    }
}

fn at_command_end(tok: &Token) -> bool {
    matches!(
        tok.kind,
        TokenKind::Semicolon | TokenKind::Newline | TokenKind::End
    )
}

fn adjacent(a: &Token, b: &Token) -> bool {
    a.end() == b.offset
}

fn parse_parameters(lexer: &mut Lexer<'_>, cmd: &mut ParsedCommand) -> Result<(), SplitError> {
    loop {
        if at_command_end(lexer.peek()) {
            break;
        }
        skip_param_separators(lexer);
        if at_command_end(lexer.peek()) {
            break;
        }
        parse_one_parameter(lexer, cmd)?;
    }
    Ok(())
}

fn parse_one_parameter(lexer: &mut Lexer<'_>, cmd: &mut ParsedCommand) -> Result<(), SplitError> {
    let tok = lexer.peek();
    fail_on_lex_error(tok)?;

    match &tok.kind {
        TokenKind::LParen => {
            let param = parse_channel_list(lexer)?;
            cmd.params.push(param);
            Ok(())
        }

        TokenKind::BlockData { .. } => {
            let tok = lexer.next();
            if let TokenKind::BlockData { data, .. } = tok.kind {
                cmd.params.push(Parameter::BlockData(data));
            }
            Ok(())
        }

        TokenKind::Str(_) => {
            let tok = lexer.next();
            if let TokenKind::Str(s) = tok.kind {
                cmd.params.push(Parameter::Str(s));
            }
            Ok(())
        }

        TokenKind::Number { .. } => {
            let num_tok = lexer.next();
            let next_tok = lexer.peek();

            // `100mV` lexes as number + identifier; glue them back when
            // strictly adjacent and the identifier reads as a unit suffix.
            if matches!(next_tok.kind, TokenKind::Identifier { .. }) && adjacent(&num_tok, next_tok)
            {
                if num_tok.text.len() + next_tok.text.len() > limits::MAX_COMMAND_LENGTH {
                    return Err(SplitError::new(
                        codes::DATA_TYPE_ERROR,
                        "Parameter too long",
                        num_tok.offset,
                    ));
                }
                let combined = format!("{}{}", num_tok.text, next_tok.text);
                if let Some(uv) = parse_unit_value(&combined) {
                    if uv.has_unit {
                        lexer.next(); // consume the unit identifier
                        cmd.params.push(Parameter::WithUnit(uv));
                        return Ok(());
                    }
                }
                // Committed: the number stands alone, the identifier is the
                // next parameter.
            }

            cmd.params.push(Parameter::from_token(&num_tok));
            Ok(())
        }

        TokenKind::Identifier { .. } => {
            let first = lexer.next();
            let second = lexer.peek();

            // A lone sign glued to a following identifier forms `-INF` etc.
            if (first.text == "+" || first.text == "-")
                && matches!(second.kind, TokenKind::Identifier { .. })
                && adjacent(&first, second)
            {
                let combined = format!("{}{}", first.text, second.text);
                lexer.next();
                cmd.params.push(Parameter::from_identifier(&combined));
                return Ok(());
            }

            cmd.params.push(Parameter::from_identifier(&first.text));
            Ok(())
        }

        _ => Err(SplitError::new(
            codes::SYNTAX_ERROR,
            format!("Unexpected token in parameters: {}", tok.kind_name()),
            tok.offset,
        )),
    }
}

fn parse_channel_list(lexer: &mut Lexer<'_>) -> Result<Parameter, SplitError> {
    let lp = lexer.next();
    if !matches!(lp.kind, TokenKind::LParen) {
        return Err(SplitError::new(
            codes::SYNTAX_ERROR,
            "Expected '(' to start channel list",
            lp.offset,
        ));
    }

    skip_param_separators(lexer);

    let at = lexer.next();
    if !matches!(at.kind, TokenKind::At) {
        return Err(SplitError::new(
            codes::SYNTAX_ERROR,
            "Expected '@' after '(' in channel list",
            at.offset,
        ));
    }

    let mut channels: Vec<i32> = Vec::new();

    loop {
        skip_param_separators(lexer);

        if matches!(lexer.peek().kind, TokenKind::RParen) {
            lexer.next();
            break;
        }

        let first = lexer.next();
        fail_on_lex_error(&first)?;
        let start = match first.kind {
            TokenKind::Number { value, integer: true, .. } => value as i32,
            _ => {
                return Err(SplitError::new(
                    codes::DATA_TYPE_ERROR,
                    "Expected integer in channel list",
                    first.offset,
                ));
            }
        };

        if matches!(lexer.peek().kind, TokenKind::Colon) {
            lexer.next();
            let second = lexer.next();
            let end = match second.kind {
                TokenKind::Number { value, integer: true, .. } => value as i32,
                _ => {
                    return Err(SplitError::new(
                        codes::DATA_TYPE_ERROR,
                        "Expected integer range end in channel list",
                        second.offset,
                    ));
                }
            };

            if end < start {
                return Err(SplitError::new(
                    codes::ILLEGAL_PARAMETER_VALUE,
                    "Invalid channel range: end < start",
                    second.offset,
                ));
            }

            let span = i64::from(end) - i64::from(start);
            if span >= limits::MAX_CHANNEL_EXPANSION as i64
                || channels.len() + (span as usize + 1) > limits::MAX_CHANNEL_EXPANSION
            {
                return Err(SplitError::new(
                    codes::TOO_MUCH_DATA,
                    "Channel range expansion too large",
                    first.offset,
                ));
            }

            channels.extend(start..=end);
        } else {
            if channels.len() + 1 > limits::MAX_CHANNEL_EXPANSION {
                return Err(SplitError::new(
                    codes::TOO_MUCH_DATA,
                    "Too many channels",
                    first.offset,
                ));
            }
            channels.push(start);
        }
    }

    Ok(Parameter::ChannelList(channels))
}

/// Convert a lexer error token into the corresponding SCPI split error.
fn fail_on_lex_error(tok: &Token) -> Result<(), SplitError> {
    if let TokenKind::Error { kind, message } = &tok.kind {
        let code = match kind {
            LexErrorKind::InvalidCharacter => codes::INVALID_CHARACTER,
            LexErrorKind::Syntax => codes::SYNTAX_ERROR,
            LexErrorKind::BlockTooLarge => codes::TOO_MUCH_DATA,
            LexErrorKind::OutOfMemory => codes::OUT_OF_MEMORY,
        };
        return Err(SplitError::new(code, message.clone(), tok.offset));
    }
    Ok(())
}
