//! Tracing initialisation for harness binaries and test runs.

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. With `json`, log lines are
/// newline-delimited JSON. Logs go to stderr; stdout is reserved for run
/// output such as TAP. Returns `false` if a subscriber was already
/// installed, in which case nothing changes.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer(json, std::io::stderr))
        .try_init()
        .is_ok()
}

/// Formatting layer used by [`init_tracing`], writing to `writer`.
pub fn log_layer<S, W>(json: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .json()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(writer)
            .boxed()
    }
}
