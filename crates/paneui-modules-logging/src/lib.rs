//! Logger setup shared by paneui binaries and tests.

use env_logger::{Builder, Env, TimestampPrecision};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs `env_logger` with millisecond timestamps. `RUST_LOG` overrides
/// [`DEFAULT_FILTER`]. Safe to call more than once; later calls do nothing.
pub fn init() {
    let installed = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .try_init()
        .is_ok();
    if installed {
        log::debug!("logging: env_logger installed");
    }
}

/// Logger for `cargo test`: output captured per test, everything enabled
/// down to `debug` unless `RUST_LOG` says otherwise.
pub fn init_for_tests() {
    let _ = Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_for_tests();
        init_for_tests();
        init();
        log::debug!("still logging");
    }
}
