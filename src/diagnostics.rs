//! Ordered diagnostic events emitted during source selection.
//!
//! The selection transcript (which sources were rejected, which one was
//! picked) is part of the credential's observable behavior, so events go
//! through an injected sink rather than a global logger. The default sink
//! forwards to [`tracing`].

use std::sync::Mutex;

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Verbose,
    Informational,
    Warning,
}

/// Receives ordered (severity, message) events from the credential.
///
/// Implementations must preserve call order; the message text for source
/// selection is stable and asserted on by tests.
pub trait DiagnosticsSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Default sink: forwards events to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Verbose => tracing::debug!(target: "rs_azure_msi", "{message}"),
            Level::Informational => tracing::info!(target: "rs_azure_msi", "{message}"),
            Level::Warning => tracing::warn!(target: "rs_azure_msi", "{message}"),
        }
    }
}

/// Collects events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events recorded so far.
    pub fn events(&self) -> Vec<(Level, String)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((level, message.to_owned()));
    }
}
