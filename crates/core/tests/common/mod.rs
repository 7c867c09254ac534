//! Shared helpers for the integration suites.

#![allow(dead_code)]

use scpi_pipeline_core::Context;
use std::sync::{Arc, Mutex};

/// A text sink capturing every `result` call, for callback-mode tests.
pub fn install_text_sink(ctx: &mut Context) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    ctx.set_output_callback(move |s| sink.lock().unwrap().push(s.to_string()));
    seen
}

/// A binary sink capturing every chunk the binary callback receives.
pub fn install_binary_sink(ctx: &mut Context) -> Arc<Mutex<Vec<Vec<u8>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    ctx.set_binary_output_callback(move |b| sink.lock().unwrap().push(b.to_vec()));
    seen
}

/// Drain the error queue into its codes, oldest first.
pub fn drain_error_codes(ctx: &mut Context) -> Vec<i32> {
    ctx.error_queue_mut()
        .pop_all()
        .into_iter()
        .map(|e| e.code)
        .collect()
}
