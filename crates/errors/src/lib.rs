//! SCPI error vocabulary for the scpi-pipeline engine.
//!
//! Provides the standard SCPI error-code constants (the negative integers of
//! the [`codes`] module), the [`ErrorClass`] taxonomy, the standard message
//! table ([`standard_message`]), and [`ErrorEntry`] — the element type of the
//! execution context's error queue, with `:SYSTem:ERRor?` response
//! formatting.
//!
//! Positive codes are reserved for device-defined (user) errors and are
//! passed through unchanged.

#![warn(missing_docs)]

/// Standard SCPI error-code constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// ── Error classes ───────────────────────────────────────────────────────

/// Coarse SCPI error taxonomy, keyed by code range.
///
/// The class drives which Standard Event Status Register bit an error sets:
/// command errors raise CME (bit 5), execution errors EXE (bit 4), device
/// errors DDE (bit 3), and query errors QYE (bit 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorClass {
    /// No error (code 0).
    None,
    /// Command errors, `-100..=-199`: syntax, data type, undefined header.
    Command,
    /// Execution errors, `-200..=-299`: out of range, illegal value.
    Execution,
    /// Device-specific errors, `-300..=-399`: hardware, queue overflow.
    Device,
    /// Query errors, `-400..=-499`: interrupted, unterminated, deadlocked.
    Query,
    /// Device-defined (user) errors: positive codes.
    User,
    /// Anything else (negative codes outside the SCPI ranges).
    Unknown,
}

/// Classify a SCPI error code into its [`ErrorClass`].
pub fn class_of(code: i32) -> ErrorClass {
    match code {
        0 => ErrorClass::None,
        -199..=-100 => ErrorClass::Command,
        -299..=-200 => ErrorClass::Execution,
        -399..=-300 => ErrorClass::Device,
        -499..=-400 => ErrorClass::Query,
        c if c > 0 => ErrorClass::User,
        _ => ErrorClass::Unknown,
    }
}

/// `true` for command errors (`-100..=-199`).
pub fn is_command_error(code: i32) -> bool {
    class_of(code) == ErrorClass::Command
}

/// `true` for execution errors (`-200..=-299`).
pub fn is_execution_error(code: i32) -> bool {
    class_of(code) == ErrorClass::Execution
}

/// `true` for device-specific errors (`-300..=-399`).
pub fn is_device_error(code: i32) -> bool {
    class_of(code) == ErrorClass::Device
}

/// `true` for query errors (`-400..=-499`).
pub fn is_query_error(code: i32) -> bool {
    class_of(code) == ErrorClass::Query
}

/// `true` for device-defined (user) errors (positive codes).
pub fn is_user_error(code: i32) -> bool {
    code > 0
}

// ── Standard messages ───────────────────────────────────────────────────

/// The standard message text for a SCPI error code.
///
/// Unlisted positive codes yield `"Device-defined error"`; unlisted negative
/// codes yield `"Unknown error"`.
pub fn standard_message(code: i32) -> &'static str {
    match code {
        codes::NO_ERROR => "No error",

        // Command errors (-100..-199)
        codes::COMMAND_ERROR => "Command error",
        codes::INVALID_CHARACTER => "Invalid character",
        codes::SYNTAX_ERROR => "Syntax error",
        codes::INVALID_SEPARATOR => "Invalid separator",
        codes::DATA_TYPE_ERROR => "Data type error",
        codes::GET_NOT_ALLOWED => "GET not allowed",
        codes::PARAMETER_NOT_ALLOWED => "Parameter not allowed",
        codes::MISSING_PARAMETER => "Missing parameter",
        codes::COMMAND_HEADER_ERROR => "Command header error",
        codes::HEADER_SEPARATOR_ERROR => "Header separator error",
        codes::PROGRAM_MNEMONIC_TOO_LONG => "Program mnemonic too long",
        codes::UNDEFINED_HEADER => "Undefined header",
        codes::HEADER_SUFFIX_OUT_OF_RANGE => "Header suffix out of range",
        codes::UNEXPECTED_NUMBER_OF_PARAMS => "Unexpected number of parameters",
        codes::NUMERIC_DATA_ERROR => "Numeric data error",
        codes::INVALID_CHAR_IN_NUMBER => "Invalid character in number",
        codes::EXPONENT_TOO_LARGE => "Exponent too large",
        codes::TOO_MANY_DIGITS => "Too many digits",
        codes::NUMERIC_DATA_NOT_ALLOWED => "Numeric data not allowed",
        codes::SUFFIX_ERROR => "Suffix error",
        codes::INVALID_SUFFIX => "Invalid suffix",
        codes::SUFFIX_TOO_LONG => "Suffix too long",
        codes::SUFFIX_NOT_ALLOWED => "Suffix not allowed",
        codes::CHARACTER_DATA_ERROR => "Character data error",
        codes::INVALID_CHARACTER_DATA => "Invalid character data",
        codes::CHARACTER_DATA_TOO_LONG => "Character data too long",
        codes::CHARACTER_DATA_NOT_ALLOWED => "Character data not allowed",
        codes::STRING_DATA_ERROR => "String data error",
        codes::INVALID_STRING_DATA => "Invalid string data",
        codes::STRING_DATA_NOT_ALLOWED => "String data not allowed",
        codes::BLOCK_DATA_ERROR => "Block data error",
        codes::INVALID_BLOCK_DATA => "Invalid block data",
        codes::BLOCK_DATA_NOT_ALLOWED => "Block data not allowed",

        // Execution errors (-200..-299)
        codes::EXECUTION_ERROR => "Execution error",
        codes::INVALID_WHILE_IN_LOCAL => "Invalid while in local",
        codes::COMMAND_PROTECTED => "Command protected",
        codes::TRIGGER_ERROR => "Trigger error",
        codes::TRIGGER_IGNORED => "Trigger ignored",
        codes::INIT_IGNORED => "Init ignored",
        codes::TRIGGER_DEADLOCK => "Trigger deadlock",
        codes::PARAMETER_ERROR => "Parameter error",
        codes::SETTINGS_CONFLICT => "Settings conflict",
        codes::DATA_OUT_OF_RANGE => "Data out of range",
        codes::TOO_MUCH_DATA => "Too much data",
        codes::ILLEGAL_PARAMETER_VALUE => "Illegal parameter value",
        codes::OUT_OF_MEMORY => "Out of memory",
        codes::LISTS_NOT_SAME_LENGTH => "Lists not same length",
        codes::DATA_CORRUPT_OR_STALE => "Data corrupt or stale",
        codes::INVALID_FORMAT => "Invalid format",
        codes::HARDWARE_ERROR => "Hardware error",
        codes::HARDWARE_MISSING => "Hardware missing",
        codes::MASS_STORAGE_ERROR => "Mass storage error",
        codes::FILE_NOT_FOUND => "File name not found",

        // Device-specific errors (-300..-399)
        codes::DEVICE_SPECIFIC_ERROR => "Device-specific error",
        codes::SYSTEM_ERROR => "System error",
        codes::MEMORY_ERROR => "Memory error",
        codes::SELF_TEST_FAILED => "Self-test failed",
        codes::CALIBRATION_FAILED => "Calibration failed",
        codes::QUEUE_OVERFLOW => "Queue overflow",
        codes::COMMUNICATION_ERROR => "Communication error",
        codes::INPUT_BUFFER_OVERRUN => "Input buffer overrun",
        codes::TIMEOUT_ERROR => "Time out error",

        // Query errors (-400..-499)
        codes::QUERY_ERROR => "Query error",
        codes::QUERY_INTERRUPTED => "Query INTERRUPTED",
        codes::QUERY_UNTERMINATED => "Query UNTERMINATED",
        codes::QUERY_DEADLOCKED => "Query DEADLOCKED",
        codes::QUERY_UNTERMINATED_INDEF => "Query UNTERMINATED after indefinite response",

        c if c > 0 => "Device-defined error",
        _ => "Unknown error",
    }
}

// ── ErrorEntry ──────────────────────────────────────────────────────────

/// One entry in the execution context's error queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// SCPI error code (negative standard / positive device-defined).
    pub code: i32,
    /// Human-readable message, sent verbatim in the `:SYST:ERR?` response.
    pub message: String,
    /// Free-form context (e.g. the offending command text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Wall-clock timestamp, seconds since the Unix epoch.
    pub timestamp: u64,
}

impl ErrorEntry {
    /// Create an entry stamped with the current wall-clock time.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            timestamp: now_secs(),
        }
    }

    /// Create an entry with free-form context attached.
    pub fn with_context(code: i32, message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::new(code, message)
        }
    }

    /// Create an entry using the standard message for `code`.
    pub fn standard(code: i32) -> Self {
        Self::new(code, standard_message(code))
    }

    /// The "no error" entry returned when popping an empty queue.
    pub fn no_error() -> Self {
        Self {
            code: codes::NO_ERROR,
            message: "No error".into(),
            context: None,
            timestamp: 0,
        }
    }

    /// `true` if this entry represents an actual error (non-zero code).
    pub fn is_error(&self) -> bool {
        self.code != codes::NO_ERROR
    }

    /// The [`ErrorClass`] of this entry's code.
    pub fn class(&self) -> ErrorClass {
        class_of(self.code)
    }

    /// Format as a `:SYSTem:ERRor?` response: `<code>,"<message>"`.
    ///
    /// Double quotes inside the message are doubled, per the SCPI string
    /// escape convention.
    pub fn to_response_string(&self) -> String {
        let mut out = String::with_capacity(self.message.len() + 8);
        out.push_str(&self.code.to_string());
        out.push_str(",\"");
        for ch in self.message.chars() {
            if ch == '"' {
                out.push_str("\"\"");
            } else {
                out.push(ch);
            }
        }
        out.push('"');
        out
    }
}

impl std::fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {}: {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " [{}]", ctx)?;
        }
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Classification ──────────────────────────────────────────────────

    #[test]
    fn class_boundaries() {
        assert_eq!(class_of(0), ErrorClass::None);
        assert_eq!(class_of(codes::COMMAND_ERROR), ErrorClass::Command);
        assert_eq!(class_of(-199), ErrorClass::Command);
        assert_eq!(class_of(codes::EXECUTION_ERROR), ErrorClass::Execution);
        assert_eq!(class_of(-299), ErrorClass::Execution);
        assert_eq!(class_of(codes::QUEUE_OVERFLOW), ErrorClass::Device);
        assert_eq!(class_of(codes::QUERY_INTERRUPTED), ErrorClass::Query);
        assert_eq!(class_of(1), ErrorClass::User);
        assert_eq!(class_of(-500), ErrorClass::Unknown);
        assert_eq!(class_of(-99), ErrorClass::Unknown);
    }

    #[test]
    fn class_predicates() {
        assert!(is_command_error(codes::UNDEFINED_HEADER));
        assert!(is_execution_error(codes::ILLEGAL_PARAMETER_VALUE));
        assert!(is_device_error(codes::QUEUE_OVERFLOW));
        assert!(is_query_error(codes::QUERY_UNTERMINATED));
        assert!(is_user_error(42));
        assert!(!is_command_error(codes::QUERY_ERROR));
    }

    // ── Standard messages ───────────────────────────────────────────────

    #[test]
    fn standard_messages() {
        assert_eq!(standard_message(codes::UNDEFINED_HEADER), "Undefined header");
        assert_eq!(standard_message(codes::QUEUE_OVERFLOW), "Queue overflow");
        assert_eq!(
            standard_message(codes::QUERY_UNTERMINATED_INDEF),
            "Query UNTERMINATED after indefinite response"
        );
        assert_eq!(standard_message(17), "Device-defined error");
        assert_eq!(standard_message(-999), "Unknown error");
    }

    // ── ErrorEntry ──────────────────────────────────────────────────────

    #[test]
    fn entry_response_format() {
        let e = ErrorEntry::new(codes::UNDEFINED_HEADER, "Undefined header");
        assert_eq!(e.to_response_string(), "-113,\"Undefined header\"");
    }

    #[test]
    fn entry_response_doubles_quotes() {
        let e = ErrorEntry::new(-200, "bad \"value\" given");
        assert_eq!(e.to_response_string(), "-200,\"bad \"\"value\"\" given\"");
    }

    #[test]
    fn no_error_entry() {
        let e = ErrorEntry::no_error();
        assert!(!e.is_error());
        assert_eq!(e.to_response_string(), "0,\"No error\"");
    }

    #[test]
    fn entry_display_includes_context() {
        let e = ErrorEntry::with_context(codes::SYNTAX_ERROR, "Syntax error", ":FOO@@");
        assert_eq!(format!("{}", e), "Error -102: Syntax error [:FOO@@]");
    }

    #[test]
    fn entry_serde_roundtrip() {
        let e = ErrorEntry::standard(codes::DATA_OUT_OF_RANGE);
        let json = serde_json::to_string(&e).unwrap();
        let back: ErrorEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn entry_serde_omits_none_context() {
        let e = ErrorEntry::standard(codes::SYNTAX_ERROR);
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("context"), "None context should be omitted: {json}");
    }
}
