//! Diagnostics for cold paths.
//!
//! Enable with `--features tracing`. Without the feature every macro expands
//! to nothing, so the rings carry no logging cost in production builds.

/// Installs a `tracing-subscriber` formatter with thread ids and uptime.
///
/// Filtering follows `RUST_LOG`, defaulting to `nexus_ring=trace`. Calling it
/// twice is harmless; the second install is ignored. Does nothing when the
/// `tracing` feature is disabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nexus_ring=trace"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

/// Installs a `tracing-subscriber` formatter. No-op without the `tracing`
/// feature.
#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use warn_noop as warn;
