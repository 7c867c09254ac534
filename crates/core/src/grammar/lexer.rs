use super::token::{split_numeric_suffix, LexErrorKind, Token, TokenKind};
use crate::limits;

/// Default indefinite-block terminator: LF, plus CR for tolerant transports.
fn default_block_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Pull lexer over one SCPI program message.
///
/// The input is an immutable byte buffer — program messages may embed
/// arbitrary binary block payloads, so the lexer never assumes UTF-8.
/// Tokens are produced lazily via [`next`](Lexer::next) /
/// [`peek`](Lexer::peek); a [`reset`](Lexer::reset) returns the lexer to the
/// start of the same input. Line and column (1-based) are tracked for
/// diagnostics.
///
/// Lexical failures are yielded as [`TokenKind::Error`] tokens rather than
/// `Err` values: the splitter owns the mapping to SCPI error codes.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Token>,
    block_terminator: fn(u8) -> bool,
    max_block_size: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over a byte buffer.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
            block_terminator: default_block_terminator,
            max_block_size: limits::MAX_BLOCK_DATA_SIZE,
        }
    }

    /// Create a lexer over a string.
    pub fn from_str(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }

    /// Override the indefinite-block terminator predicate.
    ///
    /// The default accepts LF and CR.
    pub fn set_block_terminator(&mut self, terminator: fn(u8) -> bool) {
        self.block_terminator = terminator;
    }

    /// Override the definite-block size cap (default 100 MiB).
    pub fn set_max_block_size(&mut self, cap: usize) {
        self.max_block_size = cap;
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        match &self.peeked {
            Some(tok) => tok.offset,
            None => self.pos,
        }
    }

    /// Return to the start of the input.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.peeked = None;
    }

    /// Consume and return the next token.
    pub fn next(&mut self) -> Token {
        if let Some(tok) = self.peeked.take() {
            return tok;
        }
        self.lex()
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            let tok = self.lex();
            self.peeked = Some(tok);
        }
        self.peeked.as_ref().expect("peeked token just stored")
    }

    /// Tokenize the whole input, stopping after the end or the first error.
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next();
            let stop = tok.is_end() || tok.is_error();
            tokens.push(tok);
            if stop {
                return tokens;
            }
        }
    }

    // ── Byte-level helpers ──────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&self, offset: usize) -> u8 {
        *self.input.get(self.pos + offset).unwrap_or(&0)
    }

    fn advance(&mut self) -> u8 {
        if self.at_end() {
            return 0;
        }
        let b = self.input[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        b
    }

    /// Skip space, tab, and lone CR (CR before LF is part of a newline).
    fn skip_inline_whitespace(&mut self) {
        while !self.at_end() {
            match self.byte(0) {
                b' ' | b'\t' => {
                    self.advance();
                }
                b'\r' if self.byte(1) != b'\n' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    // ── Token constructors ──────────────────────────────────────────────

    fn single(&mut self, kind: TokenKind) -> Token {
        let (offset, line, column) = (self.pos, self.line, self.column);
        let b = self.advance();
        Token {
            kind,
            text: (b as char).to_string(),
            offset,
            len: 1,
            line,
            column,
        }
    }

    fn error_at(
        &self,
        kind: LexErrorKind,
        message: impl Into<String>,
        offset: usize,
        line: u32,
        column: u32,
    ) -> Token {
        Token {
            kind: TokenKind::Error {
                kind,
                message: message.into(),
            },
            text: String::new(),
            offset,
            len: self.pos.saturating_sub(offset),
            line,
            column,
        }
    }

    // ── Main dispatch ───────────────────────────────────────────────────

    fn lex(&mut self) -> Token {
        self.skip_inline_whitespace();

        if self.at_end() {
            return Token {
                kind: TokenKind::End,
                text: String::new(),
                offset: self.pos,
                len: 0,
                line: self.line,
                column: self.column,
            };
        }

        let (offset, line, column) = (self.pos, self.line, self.column);
        let b = self.byte(0);

        match b {
            b':' => return self.single(TokenKind::Colon),
            b';' => return self.single(TokenKind::Semicolon),
            b',' => return self.single(TokenKind::Comma),
            b'?' => return self.single(TokenKind::Question),
            b'*' => return self.single(TokenKind::Asterisk),
            b'(' => return self.single(TokenKind::LParen),
            b')' => return self.single(TokenKind::RParen),
            b'@' => return self.single(TokenKind::At),
            b'\n' => return self.single(TokenKind::Newline),
            b'\r' => {
                // Only reachable as CR-LF; lone CR was skipped as whitespace.
                self.advance();
                self.advance();
                return Token {
                    kind: TokenKind::Newline,
                    text: "\r\n".into(),
                    offset,
                    len: 2,
                    line,
                    column,
                };
            }
            b'#' => return self.read_hash_prefixed(),
            b'"' => return self.read_string(b'"'),
            b'\'' => return self.read_string(b'\''),
            _ => {}
        }

        if b.is_ascii_digit() || b == b'+' || b == b'-' || b == b'.' {
            if b == b'+' || b == b'-' {
                let next = self.byte(1);
                if next.is_ascii_digit() || next == b'.' {
                    return self.read_number();
                }
                // A lone sign is yielded as a one-character identifier so the
                // splitter can re-glue `-INF` by adjacency.
                self.advance();
                return Token {
                    kind: TokenKind::Identifier {
                        base: (b as char).to_string(),
                        suffix: None,
                    },
                    text: (b as char).to_string(),
                    offset,
                    len: 1,
                    line,
                    column,
                };
            }
            if b == b'.' && !self.byte(1).is_ascii_digit() {
                self.advance();
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Unexpected character '.'",
                    offset,
                    line,
                    column,
                );
            }
            return self.read_number();
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            return self.read_identifier();
        }

        self.advance();
        self.error_at(
            LexErrorKind::InvalidCharacter,
            format!("Unexpected character '{}'", b as char),
            offset,
            line,
            column,
        )
    }

    // ── Identifiers ─────────────────────────────────────────────────────

    fn read_identifier(&mut self) -> Token {
        let (offset, line, column) = (self.pos, self.line, self.column);
        let mut value = String::new();

        while !self.at_end() {
            let b = self.byte(0);
            if b.is_ascii_alphanumeric() || b == b'_' {
                value.push(self.advance() as char);
                if value.len() > limits::MAX_IDENTIFIER_LENGTH {
                    return self.error_at(
                        LexErrorKind::Syntax,
                        format!("Identifier too long (> {})", limits::MAX_IDENTIFIER_LENGTH),
                        offset,
                        line,
                        column,
                    );
                }
            } else {
                break;
            }
        }

        let (base, suffix) = split_numeric_suffix(&value);
        let base = base.to_string();
        let len = value.len();
        Token {
            kind: TokenKind::Identifier { base, suffix },
            text: value,
            offset,
            len,
            line,
            column,
        }
    }

    // ── Numbers ─────────────────────────────────────────────────────────

    fn read_number(&mut self) -> Token {
        let (offset, line, column) = (self.pos, self.line, self.column);
        let mut text = String::new();
        let mut negative = false;
        let mut is_float = false;

        match self.byte(0) {
            b'+' => text.push(self.advance() as char),
            b'-' => {
                negative = true;
                text.push(self.advance() as char);
            }
            _ => {}
        }

        let mut has_int_part = false;
        while !self.at_end() && self.byte(0).is_ascii_digit() {
            text.push(self.advance() as char);
            has_int_part = true;
        }

        if !self.at_end() && self.byte(0) == b'.' {
            text.push(self.advance() as char);
            is_float = true;
            while !self.at_end() && self.byte(0).is_ascii_digit() {
                text.push(self.advance() as char);
            }
        }

        if !self.at_end() && (self.byte(0) == b'e' || self.byte(0) == b'E') {
            text.push(self.advance() as char);
            is_float = true;
            if !self.at_end() && (self.byte(0) == b'+' || self.byte(0) == b'-') {
                text.push(self.advance() as char);
            }
            let mut has_exp_digits = false;
            while !self.at_end() && self.byte(0).is_ascii_digit() {
                text.push(self.advance() as char);
                has_exp_digits = true;
            }
            if !has_exp_digits {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Expected digits after exponent",
                    offset,
                    line,
                    column,
                );
            }
        }

        if !has_int_part && !is_float {
            return self.error_at(
                LexErrorKind::Syntax,
                "Invalid number format",
                offset,
                line,
                column,
            );
        }

        let value = match parse_f64(&text) {
            Some(v) => v,
            None => {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Number parsing failed",
                    offset,
                    line,
                    column,
                );
            }
        };

        let len = text.len();
        Token {
            kind: TokenKind::Number {
                value,
                integer: !is_float,
                negative,
            },
            text,
            offset,
            len,
            line,
            column,
        }
    }

    // ── Strings ─────────────────────────────────────────────────────────

    fn read_string(&mut self, quote: u8) -> Token {
        let (offset, line, column) = (self.pos, self.line, self.column);
        self.advance(); // opening quote

        let mut content = String::new();
        loop {
            if self.at_end() {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Unterminated string literal",
                    offset,
                    line,
                    column,
                );
            }
            let b = self.byte(0);
            if b == quote {
                // Doubled quote is a literal quote.
                if self.byte(1) == quote {
                    content.push(quote as char);
                    self.advance();
                    self.advance();
                    continue;
                }
                self.advance();
                break;
            }
            if b == b'\n' || b == b'\r' {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Unterminated string literal",
                    offset,
                    line,
                    column,
                );
            }
            content.push(self.advance() as char);
        }

        let len = self.pos - offset; // covers the quotes
        let text = String::from_utf8_lossy(&self.input[offset..self.pos]).into_owned();
        Token {
            kind: TokenKind::Str(content),
            text,
            offset,
            len,
            line,
            column,
        }
    }

    // ── Hash-prefixed group ─────────────────────────────────────────────

    fn read_hash_prefixed(&mut self) -> Token {
        let (offset, line, column) = (self.pos, self.line, self.column);
        self.advance(); // '#'

        if self.at_end() {
            return self.error_at(
                LexErrorKind::Syntax,
                "Unexpected end after '#'",
                offset,
                line,
                column,
            );
        }

        match self.byte(0) {
            b'B' | b'b' => {
                self.advance();
                self.read_radix_literal(offset, line, column, Radix::Binary)
            }
            b'H' | b'h' => {
                self.advance();
                self.read_radix_literal(offset, line, column, Radix::Hex)
            }
            b'Q' | b'q' => {
                self.advance();
                self.read_radix_literal(offset, line, column, Radix::Octal)
            }
            b'0' => {
                self.advance();
                self.read_indefinite_block(offset, line, column)
            }
            b'1'..=b'9' => self.read_definite_block(offset, line, column),
            _ => Token {
                kind: TokenKind::Hash,
                text: "#".into(),
                offset,
                len: 1,
                line,
                column,
            },
        }
    }

    fn read_radix_literal(&mut self, offset: usize, line: u32, column: u32, radix: Radix) -> Token {
        let mut digits = String::new();
        while !self.at_end() && radix.accepts(self.byte(0)) {
            digits.push(self.advance() as char);
        }
        if digits.is_empty() {
            return self.error_at(
                LexErrorKind::Syntax,
                format!("Expected {} digits after #{}", radix.noun(), radix.letter()),
                offset,
                line,
                column,
            );
        }
        let value = match i64::from_str_radix(&digits, radix.base()) {
            Ok(v) => v,
            Err(_) => {
                return self.error_at(
                    LexErrorKind::Syntax,
                    format!("{} number overflow", radix.noun_title()),
                    offset,
                    line,
                    column,
                );
            }
        };
        let text = format!("#{}{}", radix.letter(), digits);
        let len = text.len();
        Token {
            kind: TokenKind::Number {
                value: value as f64,
                integer: true,
                negative: false,
            },
            text,
            offset,
            len,
            line,
            column,
        }
    }

    fn read_definite_block(&mut self, offset: usize, line: u32, column: u32) -> Token {
        let n = (self.advance() - b'0') as usize; // 1..=9 by dispatch

        let mut len_str = String::new();
        for _ in 0..n {
            if self.at_end() {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Unexpected end in block data length field",
                    offset,
                    line,
                    column,
                );
            }
            if !self.byte(0).is_ascii_digit() {
                return self.error_at(
                    LexErrorKind::Syntax,
                    "Expected digit in block data length field",
                    offset,
                    line,
                    column,
                );
            }
            len_str.push(self.advance() as char);
        }

        let data_len: usize = match len_str.parse() {
            Ok(v) => v,
            Err(_) => {
                return self.error_at(
                    LexErrorKind::Syntax,
                    format!("Invalid block data length: {}", len_str),
                    offset,
                    line,
                    column,
                );
            }
        };

        // Cap before allocating, then guard the cursor arithmetic.
        if data_len > self.max_block_size {
            return self.error_at(
                LexErrorKind::BlockTooLarge,
                "Block data too large (exceeds maximum block size)",
                offset,
                line,
                column,
            );
        }
        if usize::MAX - self.pos < data_len {
            return self.error_at(
                LexErrorKind::OutOfMemory,
                "Block data length overflow",
                offset,
                line,
                column,
            );
        }
        if self.pos + data_len > self.input.len() {
            return self.error_at(
                LexErrorKind::Syntax,
                format!(
                    "Block data truncated: expected {} bytes, got {}",
                    data_len,
                    self.input.len() - self.pos
                ),
                offset,
                line,
                column,
            );
        }

        let data = self.input[self.pos..self.pos + data_len].to_vec();
        self.pos += data_len;
        self.column += data_len as u32; // payload bytes are opaque, no line tracking

        Token {
            kind: TokenKind::BlockData {
                data,
                indefinite: false,
            },
            text: String::new(),
            offset,
            len: self.pos - offset,
            line,
            column,
        }
    }

    fn read_indefinite_block(&mut self, offset: usize, line: u32, column: u32) -> Token {
        let mut data = Vec::new();
        while !self.at_end() {
            let b = self.byte(0);
            if (self.block_terminator)(b) {
                break;
            }
            data.push(b);
            self.advance();
        }
        Token {
            kind: TokenKind::BlockData {
                data,
                indefinite: true,
            },
            text: String::new(),
            offset,
            len: self.pos - offset,
            line,
            column,
        }
    }
}

#[derive(Clone, Copy)]
enum Radix {
    Binary,
    Hex,
    Octal,
}

impl Radix {
    fn accepts(self, b: u8) -> bool {
        match self {
            Radix::Binary => b == b'0' || b == b'1',
            Radix::Hex => b.is_ascii_hexdigit(),
            Radix::Octal => (b'0'..=b'7').contains(&b),
        }
    }

    fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Hex => 16,
            Radix::Octal => 8,
        }
    }

    fn letter(self) -> char {
        match self {
            Radix::Binary => 'B',
            Radix::Hex => 'H',
            Radix::Octal => 'Q',
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Radix::Binary => "binary",
            Radix::Hex => "hex",
            Radix::Octal => "octal",
        }
    }

    fn noun_title(self) -> &'static str {
        match self {
            Radix::Binary => "Binary",
            Radix::Hex => "Hex",
            Radix::Octal => "Octal",
        }
    }
}

/// Parse a SCPI number spelling as `f64`.
///
/// SCPI permits a trailing decimal point (`100.`, `100.e3`) which Rust's
/// float parser rejects, so those spellings are normalised first.
pub(crate) fn parse_f64(text: &str) -> Option<f64> {
    let mut norm = text.to_string();
    if norm.ends_with('.') {
        norm.pop();
    }
    let norm = norm.replace(".e", "e").replace(".E", "E");
    norm.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        Lexer::from_str(input).tokenize_all()
    }

    #[test]
    fn trailing_dot_number() {
        let toks = kinds("100.");
        assert!(
            matches!(toks[0].kind, TokenKind::Number { value, integer: false, .. } if value == 100.0)
        );
    }

    #[test]
    fn cr_alone_is_whitespace_crlf_is_newline() {
        let toks = kinds("A\rB");
        assert!(matches!(&toks[0].kind, TokenKind::Identifier { base, .. } if base == "A"));
        assert!(matches!(&toks[1].kind, TokenKind::Identifier { base, .. } if base == "B"));

        let toks = kinds("A\r\nB");
        assert!(matches!(toks[1].kind, TokenKind::Newline));
    }

    #[test]
    fn lone_sign_is_identifier() {
        let toks = kinds("- INF");
        assert!(matches!(&toks[0].kind, TokenKind::Identifier { base, .. } if base == "-"));
    }

    #[test]
    fn identifier_length_cap() {
        let long = "A".repeat(300);
        let toks = kinds(&long);
        assert!(matches!(
            toks[0].kind,
            TokenKind::Error {
                kind: LexErrorKind::Syntax,
                ..
            }
        ));
    }
}
