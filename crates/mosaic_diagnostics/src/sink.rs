//! Diagnostic accumulator for the sequential mapping pipeline.

use crate::diagnostic::Diagnostic;
use std::cell::RefCell;

/// An accumulator for diagnostics emitted during placement and routing.
///
/// The mapping stages run sequentially on one thread — the grid and the
/// occupancy counters they mutate are inherently serial — so the sink uses
/// plain interior mutability rather than locks, and error counts are
/// derived from the stored diagnostics on demand.
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Returns `true` if any error-severity diagnostics are held.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity.is_error())
    }

    /// Returns the number of error-severity diagnostics held.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    /// Returns the number of diagnostics held, of any severity.
    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Returns `true` if no diagnostics are held.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    ///
    /// After draining, `has_errors` and `error_count` reflect only
    /// diagnostics emitted afterwards.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
