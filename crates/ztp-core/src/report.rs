// ── Run report ──
//
// Each step returns an `Outcome` with its own `changed` flag and messages;
// the orchestrator folds them into a `Report`. There is no shared mutable
// "changed" state anywhere else.

use serde::Serialize;

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub switch: String,
    pub message: String,
}

impl ReportEntry {
    pub fn new(switch: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            switch: switch.into(),
            message: message.into(),
        }
    }
}

/// Result of one step: its value, whether it mutated a device, and the
/// messages it wants reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub changed: bool,
    pub notes: Vec<ReportEntry>,
}

impl<T> Outcome<T> {
    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            changed: false,
            notes: Vec::new(),
        }
    }

    pub fn changed(value: T) -> Self {
        Self {
            value,
            changed: true,
            notes: Vec::new(),
        }
    }

    pub fn note(mut self, switch: impl Into<String>, message: impl Into<String>) -> Self {
        self.notes.push(ReportEntry::new(switch, message));
        self
    }
}

/// Ordered messages of a run plus the aggregated changed flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub changed: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a step's outcome in and hand back its value.
    pub fn absorb<T>(&mut self, outcome: Outcome<T>) -> T {
        self.changed |= outcome.changed;
        self.entries.extend(outcome.notes);
        outcome.value
    }

    pub fn push(&mut self, switch: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ReportEntry::new(switch, message));
    }
}
