//! Diagnostic codes identifying the mapping stage and finding kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The mapping stage a diagnostic originates from.
///
/// Each category maps to a single-letter prefix in the rendered code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Architecture or task-graph construction.
    Construct,
    /// Placement (annealing, initial seating).
    Place,
    /// Routing (Pathfinder).
    Route,
    /// Invariant verification.
    Verify,
}

impl Category {
    /// Returns the single-letter prefix used when rendering codes.
    pub fn prefix(self) -> char {
        match self {
            Category::Construct => 'C',
            Category::Place => 'P',
            Category::Route => 'R',
            Category::Verify => 'V',
        }
    }
}

/// A unique code identifying the kind of a diagnostic, e.g. `R201`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The stage the diagnostic belongs to.
    pub category: Category,
    /// The number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
