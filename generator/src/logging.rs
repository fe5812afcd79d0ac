//! Logging setup for the shader generator.
//!
//! The generator logs through the `log` facade; binaries pick a level with
//! [`init_with_level`] or defer to `RUST_LOG` with [`init_from_env`].
//!
//! - `error!` - failures that abort the run
//! - `warn!` - artifacts skipped during embedding
//! - `info!` - phases and output files
//! - `debug!` - per-job decisions (optimizer disabled, file unchanged)
//! - `trace!` - variants excluded by a capability or exclusion rule
//!
//! ```bash
//! RUST_LOG=info shadergen --input-dir vulkan-shaders --output-dir build/spv
//! RUST_LOG=catalog::families=trace shadergen --target-cmake build/CMakeLists.txt
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging with a specific level. Subsequent calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to Warn.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Level for a `-v` count: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize logging for tests.
pub fn init_test() {
    // try_init() doesn't panic if already initialized
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }
}
