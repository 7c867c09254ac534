//! Stock command registrations: the IEEE-488.2 common set and the
//! `:SYSTem:ERRor` family. Thin over the core — each body is a couple of
//! context calls — and opt-in so embedders can supply their own.

use crate::dispatch::Dispatcher;
use crate::exec::Context;
use scpi_pipeline_errors::codes;

/// Guard for `*ESE`/`*SRE`: exactly one numeric parameter.
fn require_one_numeric_param(ctx: &mut Context) -> i32 {
    if ctx.params().is_empty() {
        ctx.push_standard_error(codes::MISSING_PARAMETER);
        return codes::MISSING_PARAMETER;
    }
    if ctx.params().len() > 1 {
        ctx.push_standard_error(codes::PARAMETER_NOT_ALLOWED);
        return codes::PARAMETER_NOT_ALLOWED;
    }
    if !ctx.params().at(0).is_numeric() {
        ctx.push_standard_error(codes::DATA_TYPE_ERROR);
        return codes::DATA_TYPE_ERROR;
    }
    0
}

impl Dispatcher {
    /// Register the IEEE-488.2 common commands: `*CLS`, `*IDN?`, `*RST`,
    /// `*OPC`/`*OPC?`, `*ESR?`, `*ESE`/`*ESE?`, `*SRE`/`*SRE?`, `*STB?`.
    ///
    /// `*IDN?` reports a library placeholder; embedders override it by
    /// re-registering. `*RST` is a no-op hook for the same reason.
    pub fn register_default_common(&mut self) {
        self.register_common("*CLS", |ctx| {
            ctx.clear_status();
            0
        });

        self.register_common("*IDN?", |ctx| {
            ctx.result("scpi-pipeline,VirtualInstrument,0,0.1.0");
            0
        });

        self.register_common("*RST", |_ctx| 0);

        self.register_common("*OPC", |ctx| {
            ctx.status_mut().set_opc();
            0
        });

        // No overlapped commands: operations complete synchronously, so
        // *OPC? answers 1 immediately.
        self.register_common("*OPC?", |ctx| {
            ctx.result_int(1);
            0
        });

        self.register_common("*ESR?", |ctx| {
            let value = ctx.status_mut().read_and_clear_esr();
            ctx.result_int(i64::from(value));
            0
        });

        self.register_common("*ESE", |ctx| {
            let rc = require_one_numeric_param(ctx);
            if rc != 0 {
                return rc;
            }
            let mask = ctx.params().at(0).to_i32(0);
            ctx.status_mut().set_ese((mask & 0xFF) as u8);
            0
        });

        self.register_common("*ESE?", |ctx| {
            ctx.result_int(i64::from(ctx.status().ese()));
            0
        });

        self.register_common("*SRE", |ctx| {
            let rc = require_one_numeric_param(ctx);
            if rc != 0 {
                return rc;
            }
            let mask = ctx.params().at(0).to_i32(0);
            ctx.status_mut().set_sre((mask & 0xFF) as u8);
            0
        });

        self.register_common("*SRE?", |ctx| {
            ctx.result_int(i64::from(ctx.status().sre()));
            0
        });

        self.register_common("*STB?", |ctx| {
            ctx.result_int(i64::from(ctx.compute_stb()));
            0
        });
    }

    /// Register the `:SYSTem:ERRor` family: `?`/`:NEXT?` (pop one entry),
    /// `:COUNt?`, `:CLEar`, and `:ALL?` (drain, comma-joined).
    pub fn register_default_system(&mut self) {
        let pop_one = |ctx: &mut Context| {
            let entry = ctx.error_queue_mut().pop();
            ctx.result(&entry.to_response_string());
            0
        };

        self.register_query(":SYSTem:ERRor?", pop_one)
            .expect("valid pattern");
        self.register_query(":SYSTem:ERRor:NEXT?", pop_one)
            .expect("valid pattern");

        self.register_query(":SYSTem:ERRor:COUNt?", |ctx| {
            ctx.result_int(ctx.error_queue().len() as i64);
            0
        })
        .expect("valid pattern");

        self.register_command(":SYSTem:ERRor:CLEar", |ctx| {
            ctx.error_queue_mut().clear();
            0
        })
        .expect("valid pattern");

        self.register_query(":SYSTem:ERRor:ALL?", |ctx| {
            let all = ctx.error_queue_mut().pop_all();
            if all.is_empty() {
                ctx.result("0,\"No error\"");
                return 0;
            }
            let joined = all
                .iter()
                .map(|e| e.to_response_string())
                .collect::<Vec<_>>()
                .join(",");
            ctx.result(&joined);
            0
        })
        .expect("valid pattern");
    }
}
