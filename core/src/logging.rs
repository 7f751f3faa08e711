//! Tracing initialization for binaries built on this crate.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `GOCD_LOG=gocd_core=debug`.
pub const LOG_ENV: &str = "GOCD_LOG";

/// Install a global subscriber.
///
/// `GOCD_LOG` wins when set and valid. Otherwise `debug` picks between
/// `gocd_core=info` and `gocd_core=debug`, the latter also reporting file and
/// line of each event. Calling this more than once is a no-op, as is calling
/// it after another global subscriber was installed.
pub fn init_tracing(debug: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
            EnvFilter::new(if debug {
                "gocd_core=debug"
            } else {
                "gocd_core=info"
            })
        });

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(debug)
                    .with_line_number(debug),
            )
            .with(filter)
            .try_init()
            .ok();
    });
}
