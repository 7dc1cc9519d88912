//! Hierarchical fabric architecture model for the Mosaic mapping toolkit.
//!
//! A fabric is a [`TopLevel`] whose direct children — *tiles* — are addressed
//! by an N-dimensional [`Address`] rather than by name. Each tile is a tree of
//! [`Component`]s owning [`Port`]s and [`Link`]s; any element is globally
//! identified by a [`Path`]. The model is frozen after construction: the
//! placement and routing engines only read it.
//!
//! Construction is in-memory only. Loading architectures from files and the
//! example fabric zoo live outside this workspace.

#![warn(missing_docs)]

pub mod address;
pub mod component;
pub mod link;
pub mod path;
pub mod port;
pub mod toplevel;

pub use address::{Address, AddressSpace};
pub use component::{ArchRef, Component};
pub use link::Link;
pub use path::Path;
pub use port::{Direction, Port};
pub use toplevel::TopLevel;
