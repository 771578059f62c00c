//! Two append-only event channels the middleware emits on: `error` and
//! `log`. Grounded in `Config`'s own `broadcast::Sender<Config>` hot-reload
//! channel from the teacher — the same primitive, reused for observability
//! instead of config propagation.

use log::Level;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A structured log event, mirroring spec §6's `log(level, ...args)`.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub message: String,
}

/// An error event, carrying a human-readable rendering of a `GatewayError`
/// (or any other internal failure) for subscribers that only want text.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
}

/// Shared, cheaply-clonable handle to the gateway's event channels.
///
/// Subscribers call [`GatewayEvents::subscribe_log`] / `subscribe_error`;
/// the channels are lossy under backpressure (`broadcast`'s usual
/// `Lagged` semantics) which is acceptable for observability traffic.
#[derive(Clone)]
pub struct GatewayEvents {
    inner: Arc<Inner>,
}

struct Inner {
    log_tx: broadcast::Sender<LogEvent>,
    error_tx: broadcast::Sender<ErrorEvent>,
    log_to_console: bool,
}

impl Default for GatewayEvents {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GatewayEvents {
    /// `log_to_console` mirrors [`GatewayConfig::log_errors_to_console`]:
    /// whether emitted events are also passed through the `log` facade, on
    /// top of being broadcast on the channels below.
    pub fn new(log_to_console: bool) -> Self {
        let (log_tx, _) = broadcast::channel(256);
        let (error_tx, _) = broadcast::channel(256);
        Self { inner: Arc::new(Inner { log_tx, error_tx, log_to_console }) }
    }

    pub fn subscribe_log(&self) -> broadcast::Receiver<LogEvent> {
        self.inner.log_tx.subscribe()
    }

    pub fn subscribe_error(&self) -> broadcast::Receiver<ErrorEvent> {
        self.inner.error_tx.subscribe()
    }

    /// Emit a log event on the channel, and — when `log_to_console` is set
    /// (spec §3's `log_errors_to_console`) — also through the `log` facade
    /// at the matching level.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        if self.inner.log_to_console {
            log::log!(level, "{}", message);
        }
        let _ = self.inner.log_tx.send(LogEvent { level, message });
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        if self.inner.log_to_console {
            log::error!("{}", message);
        }
        let _ = self.inner.error_tx.send(ErrorEvent { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Once;

    static FACADE_CALLS: AtomicUsize = AtomicUsize::new(0);
    static INIT: Once = Once::new();

    struct CountingLogger;

    impl log::Log for CountingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }
        fn log(&self, _record: &log::Record) {
            FACADE_CALLS.fetch_add(1, Ordering::SeqCst);
        }
        fn flush(&self) {}
    }

    fn install_counting_logger() {
        INIT.call_once(|| {
            log::set_boxed_logger(Box::new(CountingLogger)).expect("no other logger installed in this test binary");
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    #[test]
    fn log_to_console_false_suppresses_the_log_facade_call() {
        install_counting_logger();
        let before = FACADE_CALLS.load(Ordering::SeqCst);

        let events = GatewayEvents::new(false);
        let mut log_rx = events.subscribe_log();
        events.log(Level::Error, "should not reach the log facade");

        assert_eq!(FACADE_CALLS.load(Ordering::SeqCst), before, "log_to_console=false must not call the log facade");
        assert_eq!(log_rx.try_recv().unwrap().message, "should not reach the log facade", "the broadcast channel still receives the event");
    }

    #[test]
    fn log_to_console_true_reaches_the_log_facade() {
        install_counting_logger();
        let before = FACADE_CALLS.load(Ordering::SeqCst);

        let events = GatewayEvents::new(true);
        events.error("should reach the log facade");

        assert_eq!(FACADE_CALLS.load(Ordering::SeqCst), before + 1, "log_to_console=true must call the log facade exactly once");
    }
}
