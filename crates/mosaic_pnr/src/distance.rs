//! Precomputed all-pairs hop distances between tile addresses.

use mosaic_arch::{Address, AddressSpace, TopLevel};
use std::collections::VecDeque;

/// Hop count marking an unreachable address pair.
pub const UNREACHABLE: u16 = u16::MAX;

/// All-pairs hop distances over the tile-adjacency graph.
///
/// The adjacency is derived from the top-level links: a link whose source
/// port sits in tile `a` and whose destination port sits in tile `b` makes
/// `b` reachable from `a` in one hop. Distances are directed, so asymmetric
/// fabrics (one-way meshes, tori with skewed wrap links) are represented
/// faithfully.
///
/// Stored as a flat `K×K` table of small integers so that channel cost in
/// the annealing hot loop is a single indexed load.
#[derive(Clone, Debug)]
pub struct DistanceLut {
    space: AddressSpace,
    dist: Vec<u16>,
    max_hop: u16,
}

impl DistanceLut {
    /// Builds the LUT by BFS from every tile address.
    pub fn build(top: &TopLevel) -> Self {
        let space = top.address_space();
        let k = space.len();

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); k];
        for link in top.links() {
            for src in &link.sources {
                let Some(si) = src.address.as_ref().and_then(|a| space.index(a)) else {
                    continue;
                };
                for dst in &link.dests {
                    let Some(di) = dst.address.as_ref().and_then(|a| space.index(a)) else {
                        continue;
                    };
                    if si != di {
                        neighbors[si].push(di);
                    }
                }
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let mut dist = vec![UNREACHABLE; k * k];
        let mut queue = VecDeque::new();
        let mut max_hop = 0u16;
        for s in 0..k {
            // skip positions inside the bounding box that hold no tile
            if top.tile(&space.address(s)).is_none() {
                continue;
            }
            let row = &mut dist[s * k..(s + 1) * k];
            row[s] = 0;
            queue.clear();
            queue.push_back(s);
            while let Some(v) = queue.pop_front() {
                let d = row[v];
                for &n in &neighbors[v] {
                    if row[n] == UNREACHABLE {
                        row[n] = d + 1;
                        max_hop = max_hop.max(d + 1);
                        queue.push_back(n);
                    }
                }
            }
        }

        Self {
            space,
            dist,
            max_hop,
        }
    }

    /// Returns the address space the LUT is indexed by.
    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    /// Hop distance between two dense address indices. O(1).
    pub fn hops_idx(&self, src: usize, dst: usize) -> u16 {
        self.dist[src * self.space.len() + dst]
    }

    /// Hop distance between two addresses, or `None` if either lies
    /// outside the fabric's bounding box.
    pub fn hops(&self, src: &Address, dst: &Address) -> Option<u16> {
        let s = self.space.index(src)?;
        let d = self.space.index(dst)?;
        Some(self.hops_idx(s, d))
    }

    /// The largest finite hop distance in the fabric (at least 1).
    ///
    /// Used as the upper clamp for the annealing move radius.
    pub fn max_hop(&self) -> u16 {
        self.max_hop.max(1)
    }

    /// Approximate heap footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.dist.capacity() * std::mem::size_of::<u16>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_arch::{Component, Direction, Link, Path, Port};
    use mosaic_common::Interner;

    /// 1-D chain of `n` tiles with bidirectional neighbor links.
    fn chain(interner: &Interner, n: i32) -> TopLevel {
        let mut top = TopLevel::new(interner.get_or_intern("chain"), 1);
        let inp = interner.get_or_intern("in");
        let out = interner.get_or_intern("out");
        for x in 0..n {
            let mut tile = Component::new(interner.get_or_intern("tile"));
            tile.add_port(Port::new(inp, Direction::Input)).unwrap();
            tile.add_port(Port::new(out, Direction::Output)).unwrap();
            top.add_tile(Address::new(vec![x]), tile).unwrap();
        }
        for x in 0..n - 1 {
            top.add_link(Link::new(
                interner.get_or_intern(&format!("east{x}")),
                vec![Path::global(Address::new(vec![x]), vec![out])],
                vec![Path::global(Address::new(vec![x + 1]), vec![inp])],
            ))
            .unwrap();
            top.add_link(Link::new(
                interner.get_or_intern(&format!("west{x}")),
                vec![Path::global(Address::new(vec![x + 1]), vec![out])],
                vec![Path::global(Address::new(vec![x]), vec![inp])],
            ))
            .unwrap();
        }
        top
    }

    #[test]
    fn chain_distances() {
        let interner = Interner::new();
        let top = chain(&interner, 4);
        let lut = DistanceLut::build(&top);
        let a = |x| Address::new(vec![x]);
        assert_eq!(lut.hops(&a(0), &a(0)), Some(0));
        assert_eq!(lut.hops(&a(0), &a(3)), Some(3));
        assert_eq!(lut.hops(&a(3), &a(0)), Some(3));
        assert_eq!(lut.hops(&a(2), &a(1)), Some(1));
        assert_eq!(lut.max_hop(), 3);
    }

    #[test]
    fn one_way_link_is_asymmetric() {
        let interner = Interner::new();
        let mut top = TopLevel::new(interner.get_or_intern("oneway"), 1);
        let inp = interner.get_or_intern("in");
        let out = interner.get_or_intern("out");
        for x in 0..2 {
            let mut tile = Component::new(interner.get_or_intern("tile"));
            tile.add_port(Port::new(inp, Direction::Input)).unwrap();
            tile.add_port(Port::new(out, Direction::Output)).unwrap();
            top.add_tile(Address::new(vec![x]), tile).unwrap();
        }
        top.add_link(Link::new(
            interner.get_or_intern("fwd"),
            vec![Path::global(Address::new(vec![0]), vec![out])],
            vec![Path::global(Address::new(vec![1]), vec![inp])],
        ))
        .unwrap();

        let lut = DistanceLut::build(&top);
        assert_eq!(
            lut.hops(&Address::new(vec![0]), &Address::new(vec![1])),
            Some(1)
        );
        assert_eq!(
            lut.hops(&Address::new(vec![1]), &Address::new(vec![0])),
            Some(UNREACHABLE)
        );
    }

    #[test]
    fn singleton_fabric() {
        let interner = Interner::new();
        let top = chain(&interner, 1);
        let lut = DistanceLut::build(&top);
        assert_eq!(
            lut.hops(&Address::new(vec![0]), &Address::new(vec![0])),
            Some(0)
        );
        assert_eq!(lut.max_hop(), 1);
    }

    #[test]
    fn outside_bounding_box() {
        let interner = Interner::new();
        let top = chain(&interner, 2);
        let lut = DistanceLut::build(&top);
        assert_eq!(lut.hops(&Address::new(vec![5]), &Address::new(vec![0])), None);
    }
}
