use std::cell::RefCell;

/// Target used for session milestones, so they can be filtered separately
/// from backend chatter.
pub const DIAGNOSTICS_TARGET: &str = "trigon";

/// Severity of a diagnostic event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DiagnosticLevel {
    Info,
    Error,
}

/// Leveled sink for session milestones and driver diagnostics.
///
/// Passed by reference to the components that report; nothing in the session
/// logs through process-wide state on its own behalf.
pub trait Diagnostics {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn info(&self, message: &str) {
        log::info!(target: DIAGNOSTICS_TARGET, "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: DIAGNOSTICS_TARGET, "{message}");
    }
}

/// A single recorded event.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DiagnosticEvent {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Keeps every event in memory. Used by tests and by hosts that want to show
/// shader diagnostics in their own UI.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: RefCell<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(DiagnosticLevel::Error)
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(DiagnosticLevel::Info)
    }

    fn messages(&self, level: DiagnosticLevel) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    fn push(&self, level: DiagnosticLevel, message: &str) {
        self.events.borrow_mut().push(DiagnosticEvent {
            level,
            message: message.to_owned(),
        });
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn info(&self, message: &str) {
        self.push(DiagnosticLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(DiagnosticLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order_and_levels() {
        let diag = RecordingDiagnostics::new();
        diag.info("initialized platform");
        diag.error("vertex shader failed");
        diag.info("render loop is about to begin");

        let events = diag.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].level, DiagnosticLevel::Error);
        assert_eq!(diag.errors(), vec!["vertex shader failed".to_string()]);
        assert_eq!(diag.infos().len(), 2);
    }

    #[test]
    fn log_diagnostics_is_usable_as_trait_object() {
        let diag: &dyn Diagnostics = &LogDiagnostics;
        diag.info("no logger installed; this must not panic");
        diag.error("still fine");
    }
}
