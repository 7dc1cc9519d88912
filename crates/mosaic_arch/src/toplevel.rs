//! The root of the architecture: tiles addressed by [`Address`].

use crate::address::{Address, AddressSpace};
use crate::component::{ArchRef, Component};
use crate::link::Link;
use crate::path::Path;
use crate::port::Direction;
use indexmap::IndexMap;
use mosaic_common::{Ident, MappingError, MosaicResult};

/// The root component of a fabric.
///
/// Direct children — *tiles* — are addressed by an N-dimensional
/// [`Address`] rather than by name; links owned by the top level connect
/// ports across tiles and define the fabric's interconnect topology. The
/// tree is frozen after construction.
#[derive(Clone, Debug)]
pub struct TopLevel {
    /// The fabric name.
    pub name: Ident,
    dims: usize,
    tiles: IndexMap<Address, Component>,
    links: IndexMap<Ident, Link>,
}

impl TopLevel {
    /// Creates an empty fabric with the given address dimensionality.
    pub fn new(name: Ident, dims: usize) -> Self {
        Self {
            name,
            dims,
            tiles: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Returns the address dimensionality.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Adds a tile at the given address.
    ///
    /// Fails on a dimensionality mismatch or if the address is already
    /// occupied.
    pub fn add_tile(&mut self, address: Address, tile: Component) -> MosaicResult<()> {
        if address.dims() != self.dims {
            return Err(MappingError::Construction(format!(
                "tile address {address} has {} dimensions, fabric has {}",
                address.dims(),
                self.dims
            )));
        }
        if self.tiles.contains_key(&address) {
            return Err(MappingError::Construction(format!(
                "tile address {address} already occupied"
            )));
        }
        self.tiles.insert(address, tile);
        Ok(())
    }

    /// Adds a top-level link.
    ///
    /// Every endpoint must be a global path resolving to a port of some
    /// tile's subtree and must agree with signal flow: tile ports sit
    /// below the top level, so a source must be an output and a
    /// destination an input (no boundary lifting applies here).
    pub fn add_link(&mut self, link: Link) -> MosaicResult<()> {
        if self.links.contains_key(&link.name) {
            return Err(MappingError::Construction(format!(
                "duplicate top-level link {:?}",
                link.name
            )));
        }
        let endpoints = link
            .sources
            .iter()
            .map(|p| (p, Direction::Output, "source"))
            .chain(link.dests.iter().map(|p| (p, Direction::Input, "destination")));
        for (endpoint, want, role) in endpoints {
            match self.resolve(endpoint) {
                Some(ArchRef::Port(_, port)) if port.direction == want => {}
                Some(ArchRef::Port(..)) => {
                    return Err(MappingError::Construction(format!(
                        "top-level link {:?} {role} endpoint flows against its port direction",
                        link.name
                    )))
                }
                _ => {
                    return Err(MappingError::Construction(format!(
                        "top-level link {:?} endpoint does not resolve to a port",
                        link.name
                    )))
                }
            }
        }
        self.links.insert(link.name, link);
        Ok(())
    }

    /// Returns the tile at the given address.
    pub fn tile(&self, address: &Address) -> Option<&Component> {
        self.tiles.get(address)
    }

    /// Iterates over tile addresses in insertion order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.tiles.keys()
    }

    /// Iterates over `(address, tile)` pairs in insertion order.
    pub fn tiles(&self) -> impl Iterator<Item = (&Address, &Component)> {
        self.tiles.iter()
    }

    /// Returns the number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Iterates over top-level links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Builds the dense address space covering all tile addresses.
    pub fn address_space(&self) -> AddressSpace {
        AddressSpace::from_addresses(self.tiles.keys())
    }

    /// Resolves a global path to an element of the fabric.
    ///
    /// Returns `None` for relative paths, unknown addresses, or dangling
    /// steps.
    pub fn resolve(&self, path: &Path) -> Option<ArchRef<'_>> {
        let address = path.address.as_ref()?;
        let tile = self.tiles.get(address)?;
        tile.resolve(&path.steps)
    }
}
