//! Paths: the global identity of architecture elements.

use crate::address::Address;
use mosaic_common::{Ident, Interner};
use serde::{Deserialize, Serialize};

/// An ordered sequence of instance-name steps terminating at a component,
/// port or link.
///
/// A path with an [`Address`] is *global*: it is rooted at the top level,
/// the address selects the tile, and the steps descend from the tile
/// component (the tile itself is the empty-step path). A path without an
/// address is *relative* to whichever component owns the reference — link
/// endpoints inside a component are written this way.
///
/// Paths are plain values: cloneable, hashable, and the currency of the
/// mappability oracle.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Path {
    /// The tile address for global paths; `None` for relative paths.
    pub address: Option<Address>,
    /// Instance-name steps, outermost first. The final step may name a
    /// component, a port or a link; which one is determined by resolution.
    pub steps: Vec<Ident>,
}

impl Path {
    /// Creates a relative path from its steps.
    pub fn local(steps: impl Into<Vec<Ident>>) -> Self {
        Self {
            address: None,
            steps: steps.into(),
        }
    }

    /// Creates a global path rooted at the given tile address.
    pub fn global(address: Address, steps: impl Into<Vec<Ident>>) -> Self {
        Self {
            address: Some(address),
            steps: steps.into(),
        }
    }

    /// Returns `true` if this path is global (rooted at a tile address).
    pub fn is_global(&self) -> bool {
        self.address.is_some()
    }

    /// Returns the final step, if any.
    pub fn last(&self) -> Option<Ident> {
        self.steps.last().copied()
    }

    /// Returns the path with the final step removed, or `None` if there
    /// are no steps.
    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Path {
            address: self.address.clone(),
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Returns this path extended by one step.
    pub fn child(&self, step: Ident) -> Path {
        let mut steps = self.steps.clone();
        steps.push(step);
        Path {
            address: self.address.clone(),
            steps,
        }
    }

    /// Globalizes a relative path by rooting it at `address`, prefixed by
    /// the steps of `base` (the owning component's global path).
    ///
    /// If the path is already global it is returned unchanged.
    pub fn qualify(&self, base: &Path) -> Path {
        if self.is_global() {
            return self.clone();
        }
        let mut steps = base.steps.clone();
        steps.extend_from_slice(&self.steps);
        Path {
            address: base.address.clone(),
            steps,
        }
    }

    /// Renders the path for diagnostics, e.g. `(1, 0)/pe/in0`.
    pub fn render(&self, interner: &Interner) -> String {
        let mut out = String::new();
        if let Some(addr) = &self.address {
            out.push_str(&addr.to_string());
        }
        for step in &self.steps {
            out.push('/');
            out.push_str(interner.resolve(*step));
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}
