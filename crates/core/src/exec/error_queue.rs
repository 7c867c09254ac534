use crate::limits;
use scpi_pipeline_errors::{codes, standard_message, ErrorEntry};
use std::collections::VecDeque;

/// The SCPI error queue: a capped FIFO of [`ErrorEntry`] values.
///
/// When the queue is full, new errors are dropped and the tail entry is
/// replaced by `-350 "Queue overflow"`, which is then preserved until the
/// queue drains. The queue is owned by its context and accessed through
/// `&mut`; embedders that share a context across threads must serialise
/// externally.
pub struct ErrorQueue {
    queue: VecDeque<ErrorEntry>,
    max_size: usize,
    overflow_count: usize,
    has_overflowed: bool,
}

impl Default for ErrorQueue {
    fn default() -> Self {
        Self::new(limits::DEFAULT_ERROR_QUEUE_SIZE)
    }
}

impl ErrorQueue {
    /// A queue with the given capacity (clamped to at least 1).
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max_size: max_size.max(1),
            overflow_count: 0,
            has_overflowed: false,
        }
    }

    // ── Enqueue ─────────────────────────────────────────────────────────

    /// Enqueue an entry. "No error" entries are ignored; on a full queue the
    /// tail becomes the `-350` overflow marker and the new entry is dropped.
    pub fn push_entry(&mut self, entry: ErrorEntry) {
        if entry.code == codes::NO_ERROR {
            return;
        }

        if self.queue.len() >= self.max_size {
            self.has_overflowed = true;
            self.overflow_count += 1;
            if let Some(tail) = self.queue.back_mut() {
                if tail.code != codes::QUEUE_OVERFLOW {
                    *tail = ErrorEntry::standard(codes::QUEUE_OVERFLOW);
                }
            }
            return;
        }

        self.queue.push_back(entry);
    }

    /// Enqueue a code with a custom message.
    pub fn push(&mut self, code: i32, message: impl Into<String>) {
        self.push_entry(ErrorEntry::new(code, message));
    }

    /// Enqueue a code with its standard message.
    pub fn push_standard(&mut self, code: i32) {
        self.push_entry(ErrorEntry::standard(code));
    }

    /// Enqueue a code with its standard message plus `"; <info>"`.
    pub fn push_standard_with_info(&mut self, code: i32, info: &str) {
        let mut message = standard_message(code).to_string();
        if !info.is_empty() {
            message.push_str("; ");
            message.push_str(info);
        }
        self.push_entry(ErrorEntry::new(code, message));
    }

    // ── Dequeue ─────────────────────────────────────────────────────────

    /// Remove and return the oldest entry; the "no error" entry when empty.
    pub fn pop(&mut self) -> ErrorEntry {
        self.queue.pop_front().unwrap_or_else(ErrorEntry::no_error)
    }

    /// The oldest entry without removing it.
    pub fn peek(&self) -> ErrorEntry {
        self.queue.front().cloned().unwrap_or_else(ErrorEntry::no_error)
    }

    /// Drain the queue in FIFO order.
    pub fn pop_all(&mut self) -> Vec<ErrorEntry> {
        self.queue.drain(..).collect()
    }

    // ── State ───────────────────────────────────────────────────────────

    /// `true` when no errors are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued errors.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// The configured capacity.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// `true` when the queue has ever overflowed. Survives `clear`.
    pub fn has_overflowed(&self) -> bool {
        self.has_overflowed
    }

    /// Number of errors dropped to overflow. Survives `clear`.
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// Code of the most recently queued error (0 when empty).
    pub fn last_error_code(&self) -> i32 {
        self.queue.back().map_or(codes::NO_ERROR, |e| e.code)
    }

    // ── Management ──────────────────────────────────────────────────────

    /// Drop all entries. Overflow bookkeeping is history and survives.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Change the capacity (clamped to at least 1), truncating from the
    /// tail and counting the dropped entries as overflow.
    pub fn set_max_size(&mut self, size: usize) {
        self.max_size = size.max(1);
        while self.queue.len() > self.max_size {
            self.queue.pop_back();
            self.overflow_count += 1;
            self.has_overflowed = true;
        }
    }

    /// Reset the overflow bookkeeping.
    pub fn reset_overflow_count(&mut self) {
        self.overflow_count = 0;
        self.has_overflowed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut q = ErrorQueue::new(10);
        q.push_standard(codes::UNDEFINED_HEADER);
        q.push_standard(codes::SYNTAX_ERROR);
        assert_eq!(q.pop().code, codes::UNDEFINED_HEADER);
        assert_eq!(q.pop().code, codes::SYNTAX_ERROR);
        assert_eq!(q.pop().code, codes::NO_ERROR);
    }

    #[test]
    fn overflow_replaces_tail() {
        let mut q = ErrorQueue::new(3);
        for _ in 0..5 {
            q.push_standard(codes::UNDEFINED_HEADER);
        }
        assert_eq!(q.len(), 3);
        assert!(q.has_overflowed());
        assert_eq!(q.overflow_count(), 2);
        assert_eq!(q.pop().code, codes::UNDEFINED_HEADER);
        assert_eq!(q.pop().code, codes::UNDEFINED_HEADER);
        assert_eq!(q.pop().code, codes::QUEUE_OVERFLOW);
    }

    #[test]
    fn overflow_marker_is_preserved() {
        let mut q = ErrorQueue::new(2);
        q.push_standard(codes::SYNTAX_ERROR);
        q.push_standard(codes::SYNTAX_ERROR);
        q.push_standard(codes::SYNTAX_ERROR);
        // A further push must not overwrite the -350 marker again.
        q.push_standard(codes::UNDEFINED_HEADER);
        assert_eq!(q.last_error_code(), codes::QUEUE_OVERFLOW);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn no_error_is_ignored() {
        let mut q = ErrorQueue::new(5);
        q.push_standard(codes::NO_ERROR);
        assert!(q.is_empty());
    }

    #[test]
    fn capacity_clamps_to_one() {
        let q = ErrorQueue::new(0);
        assert_eq!(q.max_size(), 1);
    }

    #[test]
    fn shrink_truncates_and_counts() {
        let mut q = ErrorQueue::new(5);
        for _ in 0..5 {
            q.push_standard(codes::SYNTAX_ERROR);
        }
        q.set_max_size(2);
        assert_eq!(q.len(), 2);
        assert_eq!(q.overflow_count(), 3);
    }

    #[test]
    fn clear_keeps_overflow_history() {
        let mut q = ErrorQueue::new(1);
        q.push_standard(codes::SYNTAX_ERROR);
        q.push_standard(codes::SYNTAX_ERROR);
        q.clear();
        assert!(q.is_empty());
        assert!(q.has_overflowed());
    }

    #[test]
    fn with_info_appends_detail() {
        let mut q = ErrorQueue::new(5);
        q.push_standard_with_info(codes::SYNTAX_ERROR, "near ';'");
        assert_eq!(q.pop().message, "Syntax error; near ';'");
    }
}
