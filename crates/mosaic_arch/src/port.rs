//! Component ports.

use mosaic_common::Ident;
use serde::{Deserialize, Serialize};

/// The direction of a port relative to its owning component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Signal flows into the component.
    Input,
    /// Signal flows out of the component.
    Output,
}

impl Direction {
    /// Returns the opposite direction.
    ///
    /// A component's own boundary port faces the interior with the
    /// opposite direction: an input port drives inward and acts as a
    /// source for the links inside, an output port is driven from inside.
    /// Link-endpoint validation lifts boundary ports through this before
    /// checking signal flow.
    pub fn invert(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// A named endpoint on a component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// The port name, unique within its component.
    pub name: Ident,
    /// The signal direction.
    pub direction: Direction,
}

impl Port {
    /// Creates a new port.
    pub fn new(name: Ident, direction: Direction) -> Self {
        Self { name, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_is_involution() {
        assert_eq!(Direction::Input.invert(), Direction::Output);
        assert_eq!(Direction::Output.invert(), Direction::Input);
        assert_eq!(Direction::Input.invert().invert(), Direction::Input);
    }

    #[test]
    fn port_fields() {
        let p = Port::new(Ident::from_raw(3), Direction::Output);
        assert_eq!(p.name, Ident::from_raw(3));
        assert_eq!(p.direction, Direction::Output);
    }
}
