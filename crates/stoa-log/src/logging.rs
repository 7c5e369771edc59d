//! Process-level wiring of a [`Logger`] into the `tracing` ecosystem.
//!
//! Provides:
//! - [`init_logging`]: installs the [`StoaLayer`] bridge plus a stderr layer
//!   for this crate's own diagnostics (`RUST_LOG` tunes its level, but only
//!   `stoa_log` targets ever reach it)
//! - [`handle_panics`]: records panics on exception-handling transports

use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;
use crate::layer::StoaLayer;
use crate::logger::Logger;

/// Default filter for the diagnostics layer.
const DIAGNOSTICS_FILTER: &str = "stoa_log=warn";

/// Target prefix of this crate's own events.
const DIAGNOSTICS_TARGET: &str = "stoa_log";

/// Install the global tracing subscriber.
///
/// Should be called once at program start, after the logger is assembled.
/// After this, `tracing::info!()` etc. are routed through `logger`.
pub fn init_logging(logger: Arc<Logger>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DIAGNOSTICS_FILTER));

    tracing_subscriber::registry()
        .with(StoaLayer::new(logger))
        .with(diagnostics_layer(std::io::stderr, env_filter))
        .try_init()?;
    Ok(())
}

/// Host events already reach the logger's transports; only this crate's
/// diagnostics go to `writer`.
fn diagnostics_layer<S, W>(writer: W, filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_filter(filter)
        .with_filter(filter_fn(|metadata| metadata.target().starts_with(DIAGNOSTICS_TARGET)))
}

/// Record every panic on the logger's exception-handling transports, then
/// run the previously installed hook.
pub fn handle_panics(logger: Arc<Logger>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        logger.log_exception(format!("uncaught panic: {info}"));
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;
    use crate::level::Level;
    use crate::transport::ConsoleTransport;
    use crate::transport::console::tests::Capture;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn panic_hook_records_and_chains() {
        let capture = Capture::default();
        let mut logger = Logger::new(Level::Error);
        logger.add(ConsoleTransport::with_writer("Stoa", capture.clone()));

        let original = std::panic::take_hook();
        let chained = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&chained);
        std::panic::set_hook(Box::new(move |_| flag.store(true, Ordering::SeqCst)));

        handle_panics(Arc::new(logger));
        let result = std::panic::catch_unwind(|| panic!("boom"));

        drop(std::panic::take_hook());
        std::panic::set_hook(original);

        assert!(result.is_err());
        assert!(chained.load(Ordering::SeqCst));
        let out = capture.contents();
        assert!(out.starts_with("[Stoa] "));
        assert!(out.contains(" error uncaught panic: "));
        assert!(out.contains("boom"));
    }

    #[test]
    fn second_init_is_rejected() {
        let logger = Arc::new(Logger::new(Level::Error));
        let _ = init_logging(Arc::clone(&logger));
        assert!(matches!(init_logging(logger), Err(LogError::SubscriberInit(_))));
    }

    #[test]
    fn diagnostics_skip_host_targets() {
        let capture = Capture::default();
        let subscriber =
            tracing_subscriber::registry().with(diagnostics_layer(capture.clone(), EnvFilter::new("trace")));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "stoa_log::transport::database", "queue full");
            tracing::warn!(target: "stoa_runner", "host event");
        });

        let out = capture.contents();
        assert!(out.contains("queue full"));
        assert!(!out.contains("host event"));
    }
}
