//! Shared foundational types used across the Mosaic mapping toolkit.
//!
//! This crate provides interned identifiers, the heterogeneous metadata map
//! carried by task-graph entities and mapping results, and the common error
//! types shared by every mapping stage.

#![warn(missing_docs)]

pub mod ident;
pub mod metadata;
pub mod result;

pub use ident::{Ident, Interner};
pub use metadata::Metadata;
pub use result::{MappingError, MosaicResult};
