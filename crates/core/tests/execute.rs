//! End-to-end execution scenarios: semicolon path continuation, unit
//! scaling, block round-trips, error-queue overflow, the status-register
//! family, and the buffered-mode query-interruption model.

mod common;

use common::{drain_error_codes, install_text_sink};
use scpi_pipeline_core::exec::status::{STB_EAV, STB_ESB};
use scpi_pipeline_core::{codes, Context, Dispatcher};
use std::sync::{Arc, Mutex};

// ─── Semicolon path continuation ────────────────────────────────────────

#[test]
fn semicolon_continuation_and_absolute_reset() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut scpi = Dispatcher::new();

    let log = calls.clone();
    scpi.register_command(":SOURce:FREQuency", move |ctx| {
        log.lock().unwrap().push(format!("FREQ {}", ctx.params().get_double(0, 0.0)));
        0
    })
    .unwrap();

    let log = calls.clone();
    scpi.register_command(":SOURce:AMPLitude", move |ctx| {
        log.lock().unwrap().push(format!("AMPL {}", ctx.params().get_double(0, 0.0)));
        0
    })
    .unwrap();

    let log = calls.clone();
    scpi.register_command(":OUTPut[:STATe]", move |ctx| {
        log.lock().unwrap().push(format!("OUTP {}", ctx.params().get_bool(0, false)));
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    let rc = scpi.execute(":SOUR:FREQ 1000;AMPL 5;:OUTP ON", &mut ctx);

    assert_eq!(rc, 0);
    assert_eq!(
        calls.lock().unwrap().as_slice(),
        ["FREQ 1000", "AMPL 5", "OUTP true"]
    );
    assert!(ctx.error_queue().is_empty());
}

#[test]
fn failed_command_keeps_context_for_the_rest_of_the_message() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut scpi = Dispatcher::new();

    let log = calls.clone();
    scpi.register_command(":SOURce:FREQuency", move |_| {
        log.lock().unwrap().push("FREQ");
        0
    })
    .unwrap();
    let log = calls.clone();
    scpi.register_command(":SOURce:AMPLitude", move |_| {
        log.lock().unwrap().push("AMPL");
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    let rc = scpi.execute(":SOUR:FREQ 1;BAD 2;AMPL 5", &mut ctx);

    // BAD fails relative to SOUR; AMPL still resolves there afterwards.
    assert_eq!(rc, codes::UNDEFINED_HEADER);
    assert_eq!(calls.lock().unwrap().as_slice(), ["FREQ", "AMPL"]);
    assert_eq!(drain_error_codes(&mut ctx), [codes::UNDEFINED_HEADER]);
}

#[test]
fn auto_reset_controls_cross_message_context() {
    let mut scpi = Dispatcher::new();
    scpi.register_command(":SOURce:FREQuency", |_| 0).unwrap();
    scpi.register_command(":SOURce:AMPLitude", |_| 0).unwrap();

    let mut ctx = Context::new();
    assert_eq!(scpi.execute(":SOUR:FREQ 1", &mut ctx), 0);
    // With auto-reset (the default) the next message starts at the root.
    assert_eq!(scpi.execute("AMPL 5", &mut ctx), codes::UNDEFINED_HEADER);

    scpi.set_auto_reset_path(false);
    assert_eq!(scpi.execute(":SOUR:FREQ 1", &mut ctx), 0);
    assert_eq!(scpi.execute("AMPL 5", &mut ctx), 0);
}

// ─── Unit scaling and keyword resolution ────────────────────────────────

#[test]
fn unit_scaling_and_keywords() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut scpi = Dispatcher::new();

    let log = seen.clone();
    scpi.register_command(":SOURce:VOLTage", move |ctx| {
        log.lock().unwrap().push(ctx.params().at(0).to_base_unit());
        0
    })
    .unwrap();

    let log = seen.clone();
    scpi.register_command(":VOLTage:RANGe", move |ctx| {
        log.lock()
            .unwrap()
            .push(ctx.params().at(0).to_f64_or(0.1, 1000.0, 10.0));
        0
    })
    .unwrap();

    let log = seen.clone();
    scpi.register_command(":CALCulate:LIMit:LOWer", move |ctx| {
        assert!(ctx.params().at(0).is_neg_inf());
        log.lock().unwrap().push(ctx.params().at(0).to_f64(0.0));
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    let rc = scpi.execute(":SOUR:VOLT 100mV;:VOLT:RANG MAX;:CALC:LIM:LOW -INF", &mut ctx);

    assert_eq!(rc, 0);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], 0.1);
    assert_eq!(seen[1], 1000.0);
    assert_eq!(seen[2], f64::NEG_INFINITY);
}

// ─── Block round-trip ───────────────────────────────────────────────────

#[test]
fn block_upload_and_query_round_trip() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut scpi = Dispatcher::new();

    let store = captured.clone();
    scpi.register_command(":DATA:UPLoad", move |ctx| {
        store
            .lock()
            .unwrap()
            .extend_from_slice(ctx.params().get_block_data(0));
        0
    })
    .unwrap();

    scpi.register_query(":DATA:READ?", |ctx| {
        ctx.result_block(b"ABC");
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    let responses = install_text_sink(&mut ctx);

    assert_eq!(scpi.execute(":DATA:UPL #15HELLO", &mut ctx), 0);
    assert_eq!(captured.lock().unwrap().as_slice(), b"HELLO");

    assert_eq!(scpi.execute(":DATA:READ?", &mut ctx), 0);
    assert_eq!(responses.lock().unwrap().as_slice(), ["#13ABC"]);
}

// ─── Error-queue overflow ───────────────────────────────────────────────

#[test]
fn error_queue_overflow_marks_tail() {
    let mut scpi = Dispatcher::new();
    let mut ctx = Context::with_error_queue_size(5);

    for _ in 0..8 {
        assert_eq!(scpi.execute(":NO:SUCH:NODE", &mut ctx), codes::UNDEFINED_HEADER);
    }

    assert_eq!(ctx.error_queue().len(), 5);
    assert_eq!(ctx.error_queue().last_error_code(), codes::QUEUE_OVERFLOW);
    assert_eq!(
        drain_error_codes(&mut ctx),
        [
            codes::UNDEFINED_HEADER,
            codes::UNDEFINED_HEADER,
            codes::UNDEFINED_HEADER,
            codes::UNDEFINED_HEADER,
            codes::QUEUE_OVERFLOW
        ]
    );
}

// ─── Status registers ───────────────────────────────────────────────────

#[test]
fn status_register_scenario() {
    let mut scpi = Dispatcher::new();
    scpi.register_default_common();

    let mut ctx = Context::new();
    assert_eq!(scpi.execute("*ESE 32", &mut ctx), 0);

    // One command error raises CME (bit 5).
    assert_eq!(scpi.execute(":FOO", &mut ctx), codes::UNDEFINED_HEADER);

    scpi.execute("*STB?", &mut ctx);
    let stb: u8 = ctx.pop_text_response().parse().unwrap();
    assert_ne!(stb & STB_ESB, 0, "ESB set while ESR & ESE != 0");
    assert_ne!(stb & STB_EAV, 0, "EAV set while the error queue holds -113");

    // *ESR? reads 32 and clears, so ESB drops out of the next STB.
    scpi.execute("*ESR?", &mut ctx);
    assert_eq!(ctx.pop_text_response(), "32");

    scpi.execute("*STB?", &mut ctx);
    let stb: u8 = ctx.pop_text_response().parse().unwrap();
    assert_eq!(stb & STB_ESB, 0);
    assert_ne!(stb & STB_EAV, 0, "the error is still queued");

    // *OPC sets bit 0; *ESR? in the same message reads it back.
    assert_eq!(scpi.execute("*OPC", &mut ctx), 0);
    scpi.execute("*ESR?", &mut ctx);
    assert_eq!(ctx.pop_text_response(), "1");
}

#[test]
fn cls_clears_events_and_queues_but_not_masks() {
    let mut scpi = Dispatcher::new();
    scpi.register_default_common();

    let mut ctx = Context::new();
    scpi.execute("*ESE 255", &mut ctx);
    scpi.execute(":FOO", &mut ctx);
    assert_eq!(scpi.execute("*CLS", &mut ctx), 0);

    assert!(ctx.error_queue().is_empty());
    assert!(!ctx.has_pending_response());
    scpi.execute("*ESR?", &mut ctx);
    assert_eq!(ctx.pop_text_response(), "0");
    scpi.execute("*ESE?", &mut ctx);
    assert_eq!(ctx.pop_text_response(), "255");
}

// ─── Query interruption (buffered mode) ─────────────────────────────────

#[test]
fn query_interrupted_discards_pending_response() {
    let mut scpi = Dispatcher::new();
    scpi.register_default_common();

    let mut ctx = Context::new();
    assert_eq!(scpi.execute("*IDN?", &mut ctx), 0);
    assert!(ctx.has_pending_response());

    // A new command with the response unread: -410, old response dropped,
    // new command still runs.
    assert_eq!(scpi.execute("*OPC?", &mut ctx), 0);
    assert_eq!(ctx.error_queue().len(), 1);
    assert_eq!(ctx.pop_text_response(), "1");

    // Popping the now-empty queue: empty string plus -420.
    assert_eq!(ctx.pop_text_response(), "");
    assert_eq!(
        drain_error_codes(&mut ctx),
        [codes::QUERY_INTERRUPTED, codes::QUERY_UNTERMINATED]
    );
}

#[test]
fn indefinite_response_interruption_is_440() {
    let mut scpi = Dispatcher::new();
    scpi.register_default_common();
    scpi.register_query(":DATA:INDefinite?", |ctx| {
        ctx.result_indefinite_block(b"stream");
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    assert_eq!(scpi.execute(":DATA:IND?", &mut ctx), 0);
    assert!(ctx.last_response_was_indefinite());

    assert_eq!(scpi.execute("*OPC?", &mut ctx), 0);
    assert_eq!(ctx.pop_text_response(), "1");
    assert_eq!(drain_error_codes(&mut ctx), [codes::QUERY_UNTERMINATED_INDEF]);
}

#[test]
fn callback_mode_never_interrupts() {
    let mut scpi = Dispatcher::new();
    scpi.register_default_common();

    let mut ctx = Context::new();
    let responses = install_text_sink(&mut ctx);

    scpi.execute("*IDN?", &mut ctx);
    scpi.execute("*OPC?", &mut ctx);

    assert!(ctx.error_queue().is_empty());
    assert_eq!(responses.lock().unwrap().len(), 2);
}

// ─── Handler error propagation ──────────────────────────────────────────

#[test]
fn handler_codes_map_to_standard_errors() {
    let mut scpi = Dispatcher::new();
    scpi.register_command(":RANGE", |_| codes::DATA_OUT_OF_RANGE).unwrap();
    scpi.register_command(":USER", |_| 42).unwrap();
    scpi.register_command(":WEIRD", |_| -5).unwrap();
    scpi.register_command(":SELF", |ctx| {
        // Handler publishes its own error and reports it via the code.
        ctx.push_error(codes::SETTINGS_CONFLICT, "probe already armed");
        codes::SETTINGS_CONFLICT
    })
    .unwrap();

    let mut ctx = Context::new();

    assert_eq!(scpi.execute(":RANGE 1", &mut ctx), codes::DATA_OUT_OF_RANGE);
    assert_eq!(scpi.execute(":USER 1", &mut ctx), 42);
    // Out-of-contract negative codes collapse to -200.
    assert_eq!(scpi.execute(":WEIRD 1", &mut ctx), codes::EXECUTION_ERROR);
    assert_eq!(scpi.execute(":SELF 1", &mut ctx), codes::SETTINGS_CONFLICT);

    let entries = ctx.error_queue_mut().pop_all();
    let codes_seen: Vec<i32> = entries.iter().map(|e| e.code).collect();
    assert_eq!(
        codes_seen,
        [codes::DATA_OUT_OF_RANGE, 42, codes::EXECUTION_ERROR, codes::SETTINGS_CONFLICT]
    );
    // The self-published message survives untouched.
    assert_eq!(entries[3].message, "probe already armed");
}

#[test]
fn last_nonzero_code_wins_across_a_message() {
    let mut scpi = Dispatcher::new();
    scpi.register_command(":GOOD", |_| 0).unwrap();
    scpi.register_command(":BAD", |_| codes::DATA_OUT_OF_RANGE).unwrap();

    let mut ctx = Context::new();
    assert_eq!(
        scpi.execute(":BAD 1;:GOOD 2", &mut ctx),
        codes::DATA_OUT_OF_RANGE
    );
    assert_eq!(scpi.execute(":GOOD 1;:GOOD 2", &mut ctx), 0);
}

#[test]
fn oversize_input_is_rejected_up_front() {
    let mut scpi = Dispatcher::new();
    let mut ctx = Context::new();

    let input = vec![b' '; scpi_pipeline_core::limits::MAX_INPUT_SIZE + 1];
    assert_eq!(scpi.execute_all(&input, &mut ctx), codes::OUT_OF_MEMORY);
    assert_eq!(drain_error_codes(&mut ctx), [codes::OUT_OF_MEMORY]);
}

#[test]
fn malformed_command_is_skipped_and_the_message_continues() {
    let hits = Arc::new(Mutex::new(0usize));
    let mut scpi = Dispatcher::new();
    let counter = hits.clone();
    scpi.register_command(":GOOD", move |_| {
        *counter.lock().unwrap() += 1;
        0
    })
    .unwrap();

    let mut ctx = Context::new();
    let rc = scpi.execute(":GOOD 1;:GOOD $;:GOOD 2", &mut ctx);

    // The bad middle command queues -101; the commands around it both run.
    assert_eq!(rc, codes::INVALID_CHARACTER);
    assert_eq!(*hits.lock().unwrap(), 2);
    assert_eq!(drain_error_codes(&mut ctx), [codes::INVALID_CHARACTER]);
}
