//! Log output of test runs

use std::sync::Once;

use tracing::metadata::Level;
use tracing_subscriber::filter::EnvFilter;

static INIT: Once = Once::new();

/// Installs a subscriber which writes to the captured test output.
///
/// The filter is taken from `RUST_LOG` and falls back to `default_level`
/// if the variable is unset or invalid. Subsequent calls have no effect.
pub fn init_test_logging(default_level: Level) {
    INIT.call_once(|| {
        let default_directive = default_level.to_string().to_ascii_lowercase();
        let env_filter = match std::env::var("RUST_LOG") {
            Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
                eprintln!("invalid log filter [{}]: {}", directive, err);
                eprintln!("falling back to default logging");
                EnvFilter::new(&default_directive)
            }),
            Err(_) => EnvFilter::new(&default_directive),
        };

        // Another subscriber may already be installed by the test framework.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}
