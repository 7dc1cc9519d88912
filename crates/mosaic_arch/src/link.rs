//! Links: named connectors between port paths.

use crate::path::Path;
use mosaic_common::Ident;
use serde::{Deserialize, Serialize};

/// A named connector with a set of source port paths and a set of
/// destination port paths.
///
/// A link owned by a [`Component`](crate::Component) uses paths relative to
/// that component; a link owned by the [`TopLevel`](crate::TopLevel) uses
/// global paths and may span tiles. Signal flows from every source to every
/// destination.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    /// The link name, unique within its owner.
    pub name: Ident,
    /// Paths of the ports driving this link.
    pub sources: Vec<Path>,
    /// Paths of the ports driven by this link.
    pub dests: Vec<Path>,
    /// How many channels may occupy this link simultaneously.
    pub capacity: u32,
}

impl Link {
    /// Creates a link with the default capacity of one.
    pub fn new(name: Ident, sources: Vec<Path>, dests: Vec<Path>) -> Self {
        Self {
            name,
            sources,
            dests,
            capacity: 1,
        }
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }
}
