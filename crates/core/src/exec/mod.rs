//! Per-session execution state: the context handed to command handlers.
//!
//! [`Context`] owns the command-scoped parameter view, the error queue, the
//! IEEE-488.2 status registers, and the response machinery (caller-installed
//! output callbacks, or the buffered response queue with SCPI
//! query-interruption semantics when none are installed).

/// The capped FIFO error queue with `-350` overflow semantics.
pub mod error_queue;
/// The IEEE-488.2 status register family.
pub mod status;

pub use error_queue::ErrorQueue;
pub use status::StatusRegister;

use crate::grammar::parameter::ParameterList;
use crate::limits;
use crate::tree::node::NodeParamValues;
use scpi_pipeline_errors::{codes, standard_message};
use std::any::Any;
use std::collections::VecDeque;

/// Byte order for typed array block output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Network byte order — the SCPI default.
    #[default]
    BigEndian,
    /// Host byte order on x86.
    LittleEndian,
}

/// A scalar that can serialise itself into a block payload in a chosen byte
/// order. Implemented for the integer and float widths instruments exchange.
pub trait BlockScalar: Copy {
    /// Append this value's bytes to `out` in `order`.
    fn append_bytes(self, order: ByteOrder, out: &mut Vec<u8>);
}

macro_rules! impl_block_scalar {
    ($($ty:ty),+) => {
        $(impl BlockScalar for $ty {
            fn append_bytes(self, order: ByteOrder, out: &mut Vec<u8>) {
                match order {
                    ByteOrder::BigEndian => out.extend_from_slice(&self.to_be_bytes()),
                    ByteOrder::LittleEndian => out.extend_from_slice(&self.to_le_bytes()),
                }
            }
        })+
    };
}

impl_block_scalar!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Synchronous text output sink.
pub type OutputCallback = Box<dyn FnMut(&str) + Send>;
/// Synchronous binary output sink.
pub type BinaryOutputCallback = Box<dyn FnMut(&[u8]) + Send>;

enum ResponsePayload {
    Text(String),
    Binary(Vec<u8>),
}

struct ResponseItem {
    payload: ResponsePayload,
    indefinite: bool,
}

/// The execution context of one SCPI session.
///
/// A handler sees the context by exclusive reference for the duration of its
/// call: the current parameters and captured node parameters (cleared before
/// each command), the `result*` output primitives, the error queue and
/// status registers, and an opaque user-data slot for embedder state.
///
/// With no output callback installed the context runs in *buffered mode*:
/// responses accumulate in an internal queue and the query-interruption
/// errors (-410/-420/-440) apply. With a callback, responses are delivered
/// synchronously and count as read immediately.
pub struct Context {
    params: ParameterList,
    node_params: NodeParamValues,

    output_cb: Option<OutputCallback>,
    binary_cb: Option<BinaryOutputCallback>,

    error_queue: ErrorQueue,
    status: StatusRegister,

    transient_error: Option<(i32, String)>,

    is_query: bool,
    byte_order: ByteOrder,
    user_data: Option<Box<dyn Any + Send>>,

    responses: VecDeque<ResponseItem>,
    last_response_indefinite: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context with the default error-queue capacity.
    pub fn new() -> Self {
        Self::with_error_queue_size(limits::DEFAULT_ERROR_QUEUE_SIZE)
    }

    /// A context with a caller-chosen error-queue capacity (min 1).
    pub fn with_error_queue_size(size: usize) -> Self {
        Self {
            params: ParameterList::new(),
            node_params: NodeParamValues::new(),
            output_cb: None,
            binary_cb: None,
            error_queue: ErrorQueue::new(size),
            status: StatusRegister::new(),
            transient_error: None,
            is_query: false,
            byte_order: ByteOrder::BigEndian,
            user_data: None,
            responses: VecDeque::new(),
            last_response_indefinite: false,
        }
    }

    // ── Parameter access ────────────────────────────────────────────────

    /// The current command's arguments.
    pub fn params(&self) -> &ParameterList {
        &self.params
    }

    /// Replace the current command's arguments (dispatcher use).
    pub fn set_params(&mut self, params: ParameterList) {
        self.params = params;
    }

    /// The node parameters captured during resolution.
    pub fn node_params(&self) -> &NodeParamValues {
        &self.node_params
    }

    /// Replace the captured node parameters (dispatcher use).
    pub fn set_node_params(&mut self, params: NodeParamValues) {
        self.node_params = params;
    }

    /// Captured node parameter by declared name.
    pub fn node_param(&self, name: &str, default: i32) -> i32 {
        self.node_params.get(name, default)
    }

    /// Captured node parameter by capture order.
    pub fn node_param_at(&self, index: usize, default: i32) -> i32 {
        self.node_params.get_at(index, default)
    }

    /// Captured node parameter by the capturing node's short or long name.
    pub fn node_param_of(&self, node_name: &str, default: i32) -> i32 {
        self.node_params.get_by_node_name(node_name, default)
    }

    // ── Output sinks ────────────────────────────────────────────────────

    /// Install the text output callback. Responses are delivered through it
    /// synchronously and the buffered-mode query errors no longer apply.
    pub fn set_output_callback(&mut self, cb: impl FnMut(&str) + Send + 'static) {
        self.output_cb = Some(Box::new(cb));
    }

    /// Install the binary output callback. Block output is delivered to it
    /// as header bytes followed by payload bytes.
    pub fn set_binary_output_callback(&mut self, cb: impl FnMut(&[u8]) + Send + 'static) {
        self.binary_cb = Some(Box::new(cb));
    }

    fn buffered_mode(&self) -> bool {
        self.output_cb.is_none() && self.binary_cb.is_none()
    }

    // ── Text and scalar results ─────────────────────────────────────────

    /// Emit a text response.
    pub fn result(&mut self, s: &str) {
        if let Some(cb) = &mut self.output_cb {
            cb(s);
        }
        self.enqueue_text(s, false);
    }

    /// Emit an integer response.
    pub fn result_int(&mut self, v: i64) {
        self.result(&v.to_string());
    }

    /// Emit a float response, in Rust's shortest round-trip form.
    pub fn result_f64(&mut self, v: f64) {
        self.result(&v.to_string());
    }

    /// Emit a boolean response as `1`/`0`.
    pub fn result_bool(&mut self, v: bool) {
        self.result(if v { "1" } else { "0" });
    }

    // ── Block results ───────────────────────────────────────────────────

    /// The definite-block header for a payload of `len` bytes (`#3123`
    /// for 123).
    fn make_block_header(len: usize) -> String {
        let len_str = len.to_string();
        let mut hdr = String::with_capacity(2 + len_str.len());
        hdr.push('#');
        hdr.push((b'0' + len_str.len() as u8) as char);
        hdr.push_str(&len_str);
        hdr
    }

    /// Emit a definite block (`#<n><len><bytes>`).
    ///
    /// With a binary callback the header and payload are delivered as two
    /// byte chunks; with only a text callback the whole frame goes through
    /// it (non-UTF-8 payload bytes are lossily replaced — install the binary
    /// callback for byte-exact delivery); in buffered mode the frame is
    /// queued as one binary response.
    pub fn result_block(&mut self, data: &[u8]) {
        let hdr = Self::make_block_header(data.len());

        if let Some(cb) = &mut self.binary_cb {
            cb(hdr.as_bytes());
            if !data.is_empty() {
                cb(data);
            }
            return;
        }

        if let Some(cb) = &mut self.output_cb {
            let mut out = String::with_capacity(hdr.len() + data.len());
            out.push_str(&hdr);
            out.push_str(&String::from_utf8_lossy(data));
            cb(&out);
            return;
        }

        let mut frame = Vec::with_capacity(hdr.len() + data.len());
        frame.extend_from_slice(hdr.as_bytes());
        frame.extend_from_slice(data);
        self.enqueue_binary(frame, false);
    }

    /// Emit an indefinite block (`#0<bytes>\n`).
    pub fn result_indefinite_block(&mut self, data: &[u8]) {
        if let Some(cb) = &mut self.binary_cb {
            cb(b"#0");
            if !data.is_empty() {
                cb(data);
            }
            cb(b"\n");
            return;
        }

        if let Some(cb) = &mut self.output_cb {
            let mut out = String::with_capacity(3 + data.len());
            out.push_str("#0");
            out.push_str(&String::from_utf8_lossy(data));
            out.push('\n');
            cb(&out);
            return;
        }

        let mut frame = Vec::with_capacity(3 + data.len());
        frame.extend_from_slice(b"#0");
        frame.extend_from_slice(data);
        frame.push(b'\n');
        self.enqueue_binary(frame, true);
    }

    /// Emit a typed array as a definite block, serialised in the context
    /// byte order (big-endian by default).
    pub fn result_block_array<T: BlockScalar>(&mut self, values: &[T]) {
        let mut bytes = Vec::with_capacity(values.len() * std::mem::size_of::<T>());
        for &v in values {
            v.append_bytes(self.byte_order, &mut bytes);
        }
        self.result_block(&bytes);
    }

    // ── Buffered responses ──────────────────────────────────────────────

    fn enqueue_text(&mut self, s: &str, indefinite: bool) {
        if self.buffered_mode() {
            self.responses.push_back(ResponseItem {
                payload: ResponsePayload::Text(s.to_string()),
                indefinite,
            });
            self.last_response_indefinite = indefinite;
        }
    }

    fn enqueue_binary(&mut self, bytes: Vec<u8>, indefinite: bool) {
        if self.buffered_mode() {
            self.responses.push_back(ResponseItem {
                payload: ResponsePayload::Binary(bytes),
                indefinite,
            });
            self.last_response_indefinite = indefinite;
        }
    }

    /// `true` when a buffered response awaits reading.
    pub fn has_pending_response(&self) -> bool {
        !self.responses.is_empty()
    }

    /// `true` when the most recently queued response was an indefinite
    /// block (selects -440 over -410 on interruption).
    pub fn last_response_was_indefinite(&self) -> bool {
        self.last_response_indefinite
    }

    /// Pop the next buffered response as text. On an empty queue, enqueue
    /// `-420 Query UNTERMINATED` and return the empty string.
    pub fn pop_text_response(&mut self) -> String {
        match self.pop_response() {
            Some(ResponsePayload::Text(s)) => s,
            Some(ResponsePayload::Binary(b)) => String::from_utf8_lossy(&b).into_owned(),
            None => String::new(),
        }
    }

    /// Pop the next buffered response as bytes. On an empty queue, enqueue
    /// `-420 Query UNTERMINATED` and return empty.
    pub fn pop_binary_response(&mut self) -> Vec<u8> {
        match self.pop_response() {
            Some(ResponsePayload::Text(s)) => s.into_bytes(),
            Some(ResponsePayload::Binary(b)) => b,
            None => Vec::new(),
        }
    }

    fn pop_response(&mut self) -> Option<ResponsePayload> {
        match self.responses.pop_front() {
            Some(item) => {
                if self.responses.is_empty() {
                    self.last_response_indefinite = false;
                }
                Some(item.payload)
            }
            None => {
                self.push_standard_error(codes::QUERY_UNTERMINATED);
                None
            }
        }
    }

    /// Discard all buffered responses and reset the indefinite flag.
    pub fn clear_responses(&mut self) {
        self.responses.clear();
        self.last_response_indefinite = false;
    }

    // ── Errors ──────────────────────────────────────────────────────────

    /// Record an error: sets the transient error for this command, raises
    /// the matching ESR event bit, and enqueues into the error queue.
    pub fn push_error(&mut self, code: i32, message: &str) {
        self.transient_error = Some((code, message.to_string()));
        self.status.set_error_by_code(code);
        self.error_queue.push(code, message);
    }

    /// [`push_error`](Self::push_error) with free-form context attached to
    /// the queue entry.
    pub fn push_error_with_context(&mut self, code: i32, message: &str, context: &str) {
        self.transient_error = Some((code, message.to_string()));
        self.status.set_error_by_code(code);
        self.error_queue
            .push_entry(scpi_pipeline_errors::ErrorEntry::with_context(
                code, message, context,
            ));
    }

    /// Record a standard error by code.
    pub fn push_standard_error(&mut self, code: i32) {
        self.push_error(code, standard_message(code));
    }

    /// Record a standard error with `"; <info>"` appended.
    pub fn push_standard_error_with_info(&mut self, code: i32, info: &str) {
        let mut message = standard_message(code).to_string();
        if !info.is_empty() {
            message.push_str("; ");
            message.push_str(info);
        }
        self.push_error(code, &message);
    }

    /// `true` when the current command has recorded an error.
    pub fn has_transient_error(&self) -> bool {
        self.transient_error.is_some()
    }

    /// The current command's error code, 0 when clean.
    pub fn transient_error_code(&self) -> i32 {
        self.transient_error.as_ref().map_or(0, |(code, _)| *code)
    }

    /// The current command's error message, empty when clean.
    pub fn transient_error_message(&self) -> &str {
        self.transient_error
            .as_ref()
            .map_or("", |(_, message)| message.as_str())
    }

    /// Clear the transient error without touching the queue.
    pub fn clear_transient_error(&mut self) {
        self.transient_error = None;
    }

    /// The error queue.
    pub fn error_queue(&self) -> &ErrorQueue {
        &self.error_queue
    }

    /// The error queue, mutably (for `:SYST:ERR*` handlers and embedders).
    pub fn error_queue_mut(&mut self) -> &mut ErrorQueue {
        &mut self.error_queue
    }

    // ── Status ──────────────────────────────────────────────────────────

    /// The status register set.
    pub fn status(&self) -> &StatusRegister {
        &self.status
    }

    /// The status register set, mutably.
    pub fn status_mut(&mut self) -> &mut StatusRegister {
        &mut self.status
    }

    /// Derive the status byte. MAV is set only in buffered mode with a
    /// response pending — callback-delivered responses count as read.
    pub fn compute_stb(&self) -> u8 {
        let mav = self.buffered_mode() && !self.responses.is_empty();
        self.status.compute_stb(!self.error_queue.is_empty(), mav)
    }

    // ── Query flag, byte order, user data ───────────────────────────────

    /// `true` while a query handler runs.
    pub fn is_query(&self) -> bool {
        self.is_query
    }

    /// Set the query flag (dispatcher use).
    pub fn set_query(&mut self, query: bool) {
        self.is_query = query;
    }

    /// The byte order for typed array block output.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Select the byte order for typed array block output.
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    /// Attach embedder state to the session.
    pub fn set_user_data<T: Any + Send>(&mut self, data: T) {
        self.user_data = Some(Box::new(data));
    }

    /// Borrow the embedder state, when present and of type `T`.
    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_deref().and_then(|d| d.downcast_ref())
    }

    /// Borrow the embedder state mutably.
    pub fn user_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.user_data.as_deref_mut().and_then(|d| d.downcast_mut())
    }

    // ── Reset semantics ─────────────────────────────────────────────────

    /// Per-command reset: clears parameters, node parameters, the query
    /// flag, and the transient error. Queues and registers survive.
    pub fn reset_command_state(&mut self) {
        self.params.clear();
        self.node_params.clear();
        self.is_query = false;
        self.clear_transient_error();
    }

    /// The `*CLS` semantics: clear the ESR, the response queue, and the
    /// error queue; ESE and SRE stay.
    pub fn clear_status(&mut self) {
        self.error_queue.clear();
        self.clear_responses();
        self.status.clear_for_cls();
        self.clear_transient_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scpi_pipeline_errors::codes;
    use std::sync::{Arc, Mutex};

    #[test]
    fn buffered_text_response() {
        let mut ctx = Context::new();
        ctx.result("hello");
        assert!(ctx.has_pending_response());
        assert_eq!(ctx.pop_text_response(), "hello");
        assert!(!ctx.has_pending_response());
    }

    #[test]
    fn empty_pop_enqueues_unterminated() {
        let mut ctx = Context::new();
        assert_eq!(ctx.pop_text_response(), "");
        assert_eq!(ctx.error_queue().last_error_code(), codes::QUERY_UNTERMINATED);
    }

    #[test]
    fn callback_bypasses_queue() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut ctx = Context::new();
        ctx.set_output_callback(move |s| sink.lock().unwrap().push(s.to_string()));

        ctx.result("42");
        assert!(!ctx.has_pending_response());
        assert_eq!(seen.lock().unwrap().as_slice(), ["42"]);
    }

    #[test]
    fn block_header_format() {
        let mut ctx = Context::new();
        ctx.result_block(b"ABC");
        assert_eq!(ctx.pop_binary_response(), b"#13ABC");
    }

    #[test]
    fn block_via_text_callback() {
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        let mut ctx = Context::new();
        ctx.set_output_callback(move |s| sink.lock().unwrap().push_str(s));

        ctx.result_block(b"ABC");
        assert_eq!(seen.lock().unwrap().as_str(), "#13ABC");
    }

    #[test]
    fn indefinite_block_framing_and_flag() {
        let mut ctx = Context::new();
        ctx.result_indefinite_block(b"xyz");
        assert!(ctx.last_response_was_indefinite());
        assert_eq!(ctx.pop_binary_response(), b"#0xyz\n");
        assert!(!ctx.last_response_was_indefinite());
    }

    #[test]
    fn block_array_byte_orders() {
        let mut ctx = Context::new();
        ctx.result_block_array(&[0x0102u16, 0x0304]);
        assert_eq!(ctx.pop_binary_response(), b"#14\x01\x02\x03\x04");

        ctx.set_byte_order(ByteOrder::LittleEndian);
        ctx.result_block_array(&[0x0102u16]);
        assert_eq!(ctx.pop_binary_response(), b"#12\x02\x01");
    }

    #[test]
    fn push_error_updates_esr_and_queue() {
        let mut ctx = Context::new();
        ctx.push_standard_error(codes::UNDEFINED_HEADER);
        assert!(ctx.has_transient_error());
        assert_eq!(ctx.transient_error_code(), codes::UNDEFINED_HEADER);
        assert_eq!(ctx.error_queue().len(), 1);
        assert_ne!(ctx.status().esr() & status::ESR_CME, 0);
    }

    #[test]
    fn reset_command_state_keeps_queues() {
        let mut ctx = Context::new();
        ctx.push_standard_error(codes::SYNTAX_ERROR);
        ctx.result("pending");
        ctx.set_query(true);
        ctx.reset_command_state();
        assert!(!ctx.is_query());
        assert!(!ctx.has_transient_error());
        assert_eq!(ctx.error_queue().len(), 1);
        assert!(ctx.has_pending_response());
    }

    #[test]
    fn clear_status_is_cls() {
        let mut ctx = Context::new();
        ctx.status_mut().set_ese(0x20);
        ctx.push_standard_error(codes::SYNTAX_ERROR);
        ctx.result("pending");
        ctx.clear_status();
        assert!(ctx.error_queue().is_empty());
        assert!(!ctx.has_pending_response());
        assert_eq!(ctx.status().esr(), 0);
        assert_eq!(ctx.status().ese(), 0x20);
    }

    #[test]
    fn stb_mav_only_in_buffered_mode() {
        let mut ctx = Context::new();
        ctx.result("pending");
        assert_ne!(ctx.compute_stb() & status::STB_MAV, 0);

        let mut ctx = Context::new();
        ctx.set_output_callback(|_| {});
        ctx.result("sent");
        assert_eq!(ctx.compute_stb() & status::STB_MAV, 0);
    }

    #[test]
    fn user_data_roundtrip() {
        struct Device {
            frequency: f64,
        }
        let mut ctx = Context::new();
        ctx.set_user_data(Device { frequency: 50.0 });
        ctx.user_data_mut::<Device>().unwrap().frequency = 60.0;
        assert_eq!(ctx.user_data::<Device>().unwrap().frequency, 60.0);
    }
}
