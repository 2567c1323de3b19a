//! Shared helpers for session tests.

use std::sync::Once;

use opal_eval::{
    buffer_handler, ExtensionStore, Interpreter, SessionConfig, SessionFlags, Value,
};

static TRACING_INIT: Once = Once::new();

/// Route `tracing` output to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// A session capturing its output.
pub fn session() -> Interpreter {
    init_tracing();
    Interpreter::builder()
        .print_handler(buffer_handler())
        .build()
        .unwrap()
}

/// A session over `store` with the given driver switches.
pub fn session_on(store: impl ExtensionStore + 'static, switches: &str) -> Interpreter {
    init_tracing();
    let config = SessionConfig::default().with_flags(SessionFlags::from_switches(switches));
    Interpreter::builder()
        .config(config)
        .print_handler(buffer_handler())
        .extension_store(store)
        .build()
        .unwrap()
}

pub fn run(interp: &mut Interpreter, source: &str) -> Value {
    interp.evaluate_source(source).unwrap()
}

/// Output captured so far.
pub fn output(interp: &Interpreter) -> String {
    interp.print_handler().get_output()
}
