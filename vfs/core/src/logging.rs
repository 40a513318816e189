//! The `Logger` host collaborator and the logging interceptor.

use crate::dispatch::{FileSystemInterceptor, InterceptedCall};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for messages produced by the host.
pub trait Logger: Send + Sync {
    fn enabled(&self, level: LogLevel) -> bool {
        let _ = level;
        true
    }

    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards messages to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }
}

/// How much of a call an event shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    /// No event.
    #[default]
    None,
    /// Operation name and outcome.
    Name,
    /// Adds the inputs to the start event and the error message to the end
    /// event.
    Basic,
    /// Adds inputs and outputs to the end event.
    Verbose,
}

/// Which events the [`LoggingInterceptor`] emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingEvents {
    pub start: LogVerbosity,
    pub end: LogVerbosity,
    pub track_duration: bool,
}

impl LoggingEvents {
    pub fn is_silent(&self) -> bool {
        self.start == LogVerbosity::None && self.end == LogVerbosity::None
    }
}

/// Logs every call that passes through it.
///
/// ```text
/// ^open(Open { path: "/tmp/x", .. })
/// open(): OK. Inputs: Open { .. } Outputs: Fd(3) Duration: 12.3µs
/// open(): NOENT(open: No such file or directory).
/// ```
pub struct LoggingInterceptor {
    logger: Arc<dyn Logger>,
    events: LoggingEvents,
    level: LogLevel,
}

impl LoggingInterceptor {
    pub fn new(logger: Arc<dyn Logger>, events: LoggingEvents) -> Self {
        Self {
            logger,
            events,
            level: LogLevel::Debug,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn start_message(&self, call: &dyn InterceptedCall) -> Option<String> {
        let name = call.operation();
        match self.events.start {
            LogVerbosity::None => None,
            LogVerbosity::Name => Some(format!("^{name}()")),
            LogVerbosity::Basic | LogVerbosity::Verbose => {
                Some(format!("^{name}({:?})", call.input()))
            }
        }
    }

    fn end_message(
        &self,
        call: &dyn InterceptedCall,
        outcome: Result<(), crate::Errno>,
        started: Option<Instant>,
    ) -> Option<String> {
        let verbosity = self.events.end;
        if verbosity == LogVerbosity::None {
            return None;
        }
        let mut message = format!("{}(): ", call.operation());
        match outcome {
            Ok(()) => message.push_str("OK."),
            Err(errno) if verbosity == LogVerbosity::Name => {
                let _ = write!(message, "{}.", errno.name());
            }
            Err(errno) => {
                let detail = call.error().map(|err| err.to_string()).unwrap_or_default();
                let _ = write!(message, "{}({detail}).", errno.name());
            }
        }
        if verbosity == LogVerbosity::Verbose {
            let _ = write!(message, " Inputs: {:?}", call.input());
            if let Some(output) = call.output() {
                let _ = write!(message, " Outputs: {output:?}");
            }
        }
        if let Some(started) = started {
            let _ = write!(message, " Duration: {:?}", started.elapsed());
        }
        Some(message)
    }
}

impl FileSystemInterceptor for LoggingInterceptor {
    fn intercept(&self, call: &mut dyn InterceptedCall) {
        if self.events.is_silent() || !self.logger.enabled(self.level) {
            let _ = call.proceed();
            return;
        }
        if let Some(message) = self.start_message(call) {
            self.logger.log(self.level, &message);
        }
        let started = self.events.track_duration.then(Instant::now);
        let outcome = call.proceed();
        if let Some(message) = self.end_message(call, outcome, started) {
            self.logger.log(self.level, &message);
        }
    }
}
