//! Standard SCPI error-code constants.
//!
//! Negative codes are defined by SCPI-99 / IEEE-488.2; positive codes are
//! reserved for device-defined errors. The constants are grouped by class —
//! see [`crate::class_of`].

/// No error.
pub const NO_ERROR: i32 = 0;

// ── Command errors (-100..-199): produced while parsing ─────────────────

/// Generic command error.
pub const COMMAND_ERROR: i32 = -100;
/// Invalid character in the program message.
pub const INVALID_CHARACTER: i32 = -101;
/// Syntax error.
pub const SYNTAX_ERROR: i32 = -102;
/// Invalid separator.
pub const INVALID_SEPARATOR: i32 = -103;
/// Data type error (wrong parameter type).
pub const DATA_TYPE_ERROR: i32 = -104;
/// GET not allowed.
pub const GET_NOT_ALLOWED: i32 = -105;
/// Parameter not allowed (too many parameters).
pub const PARAMETER_NOT_ALLOWED: i32 = -108;
/// Missing parameter.
pub const MISSING_PARAMETER: i32 = -109;
/// Command header error.
pub const COMMAND_HEADER_ERROR: i32 = -110;
/// Header separator error.
pub const HEADER_SEPARATOR_ERROR: i32 = -111;
/// Program mnemonic too long.
pub const PROGRAM_MNEMONIC_TOO_LONG: i32 = -112;
/// Undefined header: no registered command matched.
pub const UNDEFINED_HEADER: i32 = -113;
/// Header suffix out of range: a numeric suffix failed its constraint.
pub const HEADER_SUFFIX_OUT_OF_RANGE: i32 = -114;
/// Unexpected number of parameters.
pub const UNEXPECTED_NUMBER_OF_PARAMS: i32 = -115;

/// Numeric data error.
pub const NUMERIC_DATA_ERROR: i32 = -120;
/// Invalid character in number.
pub const INVALID_CHAR_IN_NUMBER: i32 = -121;
/// Exponent too large.
pub const EXPONENT_TOO_LARGE: i32 = -123;
/// Too many digits.
pub const TOO_MANY_DIGITS: i32 = -124;
/// Numeric data not allowed.
pub const NUMERIC_DATA_NOT_ALLOWED: i32 = -128;

/// Suffix error.
pub const SUFFIX_ERROR: i32 = -130;
/// Invalid suffix.
pub const INVALID_SUFFIX: i32 = -131;
/// Suffix too long.
pub const SUFFIX_TOO_LONG: i32 = -134;
/// Suffix not allowed.
pub const SUFFIX_NOT_ALLOWED: i32 = -138;

/// Character data error.
pub const CHARACTER_DATA_ERROR: i32 = -140;
/// Invalid character data.
pub const INVALID_CHARACTER_DATA: i32 = -141;
/// Character data too long.
pub const CHARACTER_DATA_TOO_LONG: i32 = -144;
/// Character data not allowed.
pub const CHARACTER_DATA_NOT_ALLOWED: i32 = -148;

/// String data error.
pub const STRING_DATA_ERROR: i32 = -150;
/// Invalid string data.
pub const INVALID_STRING_DATA: i32 = -151;
/// String data not allowed.
pub const STRING_DATA_NOT_ALLOWED: i32 = -158;

/// Block data error.
pub const BLOCK_DATA_ERROR: i32 = -160;
/// Invalid block data.
pub const INVALID_BLOCK_DATA: i32 = -161;
/// Block data not allowed.
pub const BLOCK_DATA_NOT_ALLOWED: i32 = -168;

// ── Execution errors (-200..-299): valid syntax, failed execution ───────

/// Generic execution error.
pub const EXECUTION_ERROR: i32 = -200;
/// Invalid while in local.
pub const INVALID_WHILE_IN_LOCAL: i32 = -201;
/// Command protected.
pub const COMMAND_PROTECTED: i32 = -203;
/// Trigger error.
pub const TRIGGER_ERROR: i32 = -210;
/// Trigger ignored.
pub const TRIGGER_IGNORED: i32 = -211;
/// Init ignored.
pub const INIT_IGNORED: i32 = -213;
/// Trigger deadlock.
pub const TRIGGER_DEADLOCK: i32 = -214;
/// Parameter error.
pub const PARAMETER_ERROR: i32 = -220;
/// Settings conflict.
pub const SETTINGS_CONFLICT: i32 = -221;
/// Data out of range.
pub const DATA_OUT_OF_RANGE: i32 = -222;
/// Too much data (oversize channel list or block).
pub const TOO_MUCH_DATA: i32 = -223;
/// Illegal parameter value (e.g. reversed channel range).
pub const ILLEGAL_PARAMETER_VALUE: i32 = -224;
/// Out of memory.
pub const OUT_OF_MEMORY: i32 = -225;
/// Lists not same length.
pub const LISTS_NOT_SAME_LENGTH: i32 = -226;
/// Data corrupt or stale.
pub const DATA_CORRUPT_OR_STALE: i32 = -230;
/// Invalid format.
pub const INVALID_FORMAT: i32 = -232;
/// Hardware error.
pub const HARDWARE_ERROR: i32 = -240;
/// Hardware missing.
pub const HARDWARE_MISSING: i32 = -241;
/// Mass storage error.
pub const MASS_STORAGE_ERROR: i32 = -250;
/// File name not found.
pub const FILE_NOT_FOUND: i32 = -256;

// ── Device-specific errors (-300..-399) ─────────────────────────────────

/// Generic device-specific error.
pub const DEVICE_SPECIFIC_ERROR: i32 = -300;
/// System error.
pub const SYSTEM_ERROR: i32 = -310;
/// Memory error.
pub const MEMORY_ERROR: i32 = -311;
/// Self-test failed.
pub const SELF_TEST_FAILED: i32 = -330;
/// Calibration failed.
pub const CALIBRATION_FAILED: i32 = -340;
/// Error-queue overflow; replaces the queue tail when the queue is full.
pub const QUEUE_OVERFLOW: i32 = -350;
/// Communication error.
pub const COMMUNICATION_ERROR: i32 = -360;
/// Input buffer overrun.
pub const INPUT_BUFFER_OVERRUN: i32 = -363;
/// Time out error.
pub const TIMEOUT_ERROR: i32 = -365;

// ── Query errors (-400..-499) ───────────────────────────────────────────

/// Generic query error.
pub const QUERY_ERROR: i32 = -400;
/// Query interrupted: a new command arrived with a response still pending.
pub const QUERY_INTERRUPTED: i32 = -410;
/// Query unterminated: a response was requested but none is pending.
pub const QUERY_UNTERMINATED: i32 = -420;
/// Query deadlocked.
pub const QUERY_DEADLOCKED: i32 = -430;
/// Query unterminated after an indefinite-length response.
pub const QUERY_UNTERMINATED_INDEF: i32 = -440;
