//! N-dimensional tile addresses and dense address indexing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Index, Sub};

/// An N-dimensional integer tuple identifying a tile in a [`TopLevel`].
///
/// Dimensionality is fixed when the address is constructed; every operation
/// that combines two addresses requires them to agree.
///
/// [`TopLevel`]: crate::TopLevel
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Address(Vec<i32>);

impl Address {
    /// Creates an address from its coordinates.
    pub fn new(coords: impl Into<Vec<i32>>) -> Self {
        Self(coords.into())
    }

    /// Returns the number of dimensions.
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Returns the coordinates as a slice.
    pub fn coords(&self) -> &[i32] {
        &self.0
    }

    /// Componentwise minimum of two addresses.
    ///
    /// # Panics
    ///
    /// Panics if the dimensionalities differ.
    pub fn min(&self, other: &Address) -> Address {
        assert_eq!(self.dims(), other.dims());
        Address(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (*a).min(*b))
                .collect(),
        )
    }

    /// Componentwise maximum of two addresses.
    ///
    /// # Panics
    ///
    /// Panics if the dimensionalities differ.
    pub fn max(&self, other: &Address) -> Address {
        assert_eq!(self.dims(), other.dims());
        Address(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (*a).max(*b))
                .collect(),
        )
    }

    /// The L-infinity (Chebyshev) distance to another address.
    ///
    /// # Panics
    ///
    /// Panics if the dimensionalities differ.
    pub fn chebyshev(&self, other: &Address) -> u32 {
        assert_eq!(self.dims(), other.dims());
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0)
    }
}

impl Index<usize> for Address {
    type Output = i32;

    fn index(&self, dim: usize) -> &i32 {
        &self.0[dim]
    }
}

impl Add for &Address {
    type Output = Address;

    fn add(self, rhs: &Address) -> Address {
        assert_eq!(self.dims(), rhs.dims());
        Address(self.0.iter().zip(&rhs.0).map(|(a, b)| a + b).collect())
    }
}

impl Sub for &Address {
    type Output = Address;

    fn sub(self, rhs: &Address) -> Address {
        assert_eq!(self.dims(), rhs.dims());
        Address(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b).collect())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

/// The bijection between a set of addresses and dense row-major indices.
///
/// All lookup tables in the placement engine (distance LUT, map tables,
/// grid) are flat vectors indexed through an `AddressSpace`, so hot-loop
/// queries never hash or allocate. The space covers the bounding box of the
/// addresses it was built from; indices inside the box but outside the
/// original set are valid positions that simply hold no tile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressSpace {
    origin: Vec<i32>,
    extents: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl AddressSpace {
    /// Builds the space covering the bounding box of `addresses`.
    ///
    /// Returns an empty space if the iterator yields nothing.
    pub fn from_addresses<'a>(addresses: impl IntoIterator<Item = &'a Address>) -> Self {
        let mut iter = addresses.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                origin: Vec::new(),
                extents: Vec::new(),
                strides: Vec::new(),
                len: 0,
            };
        };
        let mut lo = first.clone();
        let mut hi = first.clone();
        for addr in iter {
            lo = Address::min(&lo, addr);
            hi = Address::max(&hi, addr);
        }
        let origin: Vec<i32> = lo.coords().to_vec();
        let extents: Vec<usize> = lo
            .coords()
            .iter()
            .zip(hi.coords())
            .map(|(l, h)| (h - l) as usize + 1)
            .collect();
        // row-major: last dimension is contiguous
        let mut strides = vec![1usize; extents.len()];
        for d in (0..extents.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * extents[d + 1];
        }
        let len = extents.iter().product();
        Self {
            origin,
            extents,
            strides,
            len,
        }
    }

    /// Returns the number of dimensions.
    pub fn dims(&self) -> usize {
        self.extents.len()
    }

    /// Returns the number of index positions covered by the bounding box.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the space covers no addresses.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the dense index of `addr`, or `None` if it lies outside the
    /// bounding box.
    pub fn index(&self, addr: &Address) -> Option<usize> {
        if addr.dims() != self.dims() {
            return None;
        }
        let mut idx = 0usize;
        for d in 0..self.dims() {
            let off = addr[d] - self.origin[d];
            if off < 0 || off as usize >= self.extents[d] {
                return None;
            }
            idx += off as usize * self.strides[d];
        }
        Some(idx)
    }

    /// Returns the address at the given dense index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len()`.
    pub fn address(&self, idx: usize) -> Address {
        assert!(idx < self.len);
        let mut rem = idx;
        let mut coords = Vec::with_capacity(self.dims());
        for d in 0..self.dims() {
            let off = rem / self.strides[d];
            rem %= self.strides[d];
            coords.push(self.origin[d] + off as i32);
        }
        Address::new(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_min_max() {
        let a = Address::new(vec![1, 5]);
        let b = Address::new(vec![3, 2]);
        assert_eq!(Address::min(&a, &b), Address::new(vec![1, 2]));
        assert_eq!(Address::max(&a, &b), Address::new(vec![3, 5]));
    }

    #[test]
    fn arithmetic() {
        let a = Address::new(vec![1, 2]);
        let b = Address::new(vec![3, -1]);
        assert_eq!(&a + &b, Address::new(vec![4, 1]));
        assert_eq!(&b - &a, Address::new(vec![2, -3]));
    }

    #[test]
    fn chebyshev_distance() {
        let a = Address::new(vec![0, 0]);
        let b = Address::new(vec![2, -3]);
        assert_eq!(a.chebyshev(&b), 3);
        assert_eq!(a.chebyshev(&a), 0);
    }

    #[test]
    fn indexing_and_display() {
        let a = Address::new(vec![4, 7]);
        assert_eq!(a[0], 4);
        assert_eq!(a[1], 7);
        assert_eq!(format!("{a}"), "(4, 7)");
    }

    #[test]
    fn space_roundtrip_2d() {
        let addrs: Vec<Address> = (0..3)
            .flat_map(|x| (0..4).map(move |y| Address::new(vec![x, y])))
            .collect();
        let space = AddressSpace::from_addresses(&addrs);
        assert_eq!(space.len(), 12);
        for addr in &addrs {
            let idx = space.index(addr).unwrap();
            assert_eq!(space.address(idx), *addr);
        }
    }

    #[test]
    fn space_with_negative_origin() {
        let addrs = [Address::new(vec![-2, 1]), Address::new(vec![0, 3])];
        let space = AddressSpace::from_addresses(&addrs);
        assert_eq!(space.len(), 9);
        assert_eq!(space.index(&Address::new(vec![-2, 1])), Some(0));
        assert_eq!(space.index(&Address::new(vec![-3, 1])), None);
        assert_eq!(space.index(&Address::new(vec![1, 1])), None);
    }

    #[test]
    fn space_1d() {
        let addrs = [Address::new(vec![0]), Address::new(vec![3])];
        let space = AddressSpace::from_addresses(&addrs);
        assert_eq!(space.len(), 4);
        assert_eq!(space.index(&Address::new(vec![2])), Some(2));
    }

    #[test]
    fn empty_space() {
        let space = AddressSpace::from_addresses(std::iter::empty());
        assert!(space.is_empty());
        assert_eq!(space.index(&Address::new(vec![0])), None);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let addrs = [Address::new(vec![0, 0])];
        let space = AddressSpace::from_addresses(&addrs);
        assert_eq!(space.index(&Address::new(vec![0])), None);
    }

    #[test]
    fn serde_roundtrip() {
        let a = Address::new(vec![1, 2, 3]);
        let json = serde_json::to_string(&a).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
