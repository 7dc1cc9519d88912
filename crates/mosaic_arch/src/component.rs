//! Hierarchical components: the nodes of the architecture tree.

use crate::link::Link;
use crate::path::Path;
use crate::port::{Direction, Port};
use indexmap::IndexMap;
use mosaic_common::{Ident, MappingError, MosaicResult};
use std::collections::HashMap;

/// A node of the architecture tree.
///
/// A component owns child components (keyed by instance name), ports and
/// links, plus an index from port paths to the links touching them. Child
/// identity is scoped by the parent; global identity is a [`Path`].
///
/// Components tagged with a `primitive` kind (e.g. a mux or a functional
/// unit) route traffic internally: every input→output port pair is an
/// implicit internal connection in the routing graph.
#[derive(Clone, Debug)]
pub struct Component {
    /// The instance name of this component.
    pub name: Ident,
    /// The primitive kind tag, if this component is a primitive.
    pub primitive: Option<Ident>,
    children: IndexMap<Ident, Component>,
    ports: IndexMap<Ident, Port>,
    links: IndexMap<Ident, Link>,
    port_links: HashMap<Path, Vec<Ident>>,
}

/// A resolved reference to an architecture element.
#[derive(Debug)]
pub enum ArchRef<'a> {
    /// A component.
    Component(&'a Component),
    /// A port, together with the component owning it.
    Port(&'a Component, &'a Port),
    /// A link, together with the component owning it.
    Link(&'a Component, &'a Link),
}

impl Component {
    /// Creates an empty non-primitive component.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            primitive: None,
            children: IndexMap::new(),
            ports: IndexMap::new(),
            links: IndexMap::new(),
            port_links: HashMap::new(),
        }
    }

    /// Creates an empty primitive component with the given kind tag.
    pub fn primitive(name: Ident, kind: Ident) -> Self {
        let mut c = Self::new(name);
        c.primitive = Some(kind);
        c
    }

    /// Returns `true` if this component is a primitive.
    pub fn is_primitive(&self) -> bool {
        self.primitive.is_some()
    }

    /// Adds a child component.
    ///
    /// Fails if a child with the same instance name already exists.
    pub fn add_child(&mut self, child: Component) -> MosaicResult<()> {
        if self.children.contains_key(&child.name) {
            return Err(MappingError::Construction(format!(
                "duplicate child instance {:?}",
                child.name
            )));
        }
        self.children.insert(child.name, child);
        Ok(())
    }

    /// Adds a port.
    ///
    /// Fails if a port with the same name already exists.
    pub fn add_port(&mut self, port: Port) -> MosaicResult<()> {
        if self.ports.contains_key(&port.name) {
            return Err(MappingError::Construction(format!(
                "duplicate port {:?}",
                port.name
            )));
        }
        self.ports.insert(port.name, port);
        Ok(())
    }

    /// Adds a link and updates the port→link index.
    ///
    /// Every endpoint must be a relative path resolving to a port of this
    /// component or of a descendant, and must agree with signal flow: a
    /// source drives the interior, a destination is driven by it. This
    /// component's own boundary ports are lifted through
    /// [`Direction::invert`] first, so its inputs count as interior
    /// sources and its outputs as interior sinks.
    pub fn add_link(&mut self, link: Link) -> MosaicResult<()> {
        if self.links.contains_key(&link.name) {
            return Err(MappingError::Construction(format!(
                "duplicate link {:?}",
                link.name
            )));
        }
        let endpoints = link
            .sources
            .iter()
            .map(|p| (p, Direction::Output, "source"))
            .chain(link.dests.iter().map(|p| (p, Direction::Input, "destination")));
        for (endpoint, want, role) in endpoints {
            if endpoint.is_global() {
                return Err(MappingError::Construction(format!(
                    "link {:?} endpoint must be relative",
                    link.name
                )));
            }
            let Some(ArchRef::Port(_, port)) = self.resolve(&endpoint.steps) else {
                return Err(MappingError::Construction(format!(
                    "link {:?} endpoint does not resolve to a port",
                    link.name
                )));
            };
            let interior = if endpoint.steps.len() == 1 {
                port.direction.invert()
            } else {
                port.direction
            };
            if interior != want {
                return Err(MappingError::Construction(format!(
                    "link {:?} {role} endpoint flows against its port direction",
                    link.name
                )));
            }
        }
        for endpoint in link.sources.iter().chain(&link.dests) {
            self.port_links
                .entry(endpoint.clone())
                .or_default()
                .push(link.name);
        }
        self.links.insert(link.name, link);
        Ok(())
    }

    /// Returns the child with the given instance name.
    pub fn child(&self, name: Ident) -> Option<&Component> {
        self.children.get(&name)
    }

    /// Returns the port with the given name.
    pub fn port(&self, name: Ident) -> Option<&Port> {
        self.ports.get(&name)
    }

    /// Returns the link with the given name.
    pub fn link(&self, name: Ident) -> Option<&Link> {
        self.links.get(&name)
    }

    /// Iterates over child components in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &Component> {
        self.children.values()
    }

    /// Iterates over ports in insertion order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Iterates over links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Returns the names of links touching the given relative port path.
    pub fn links_on_port(&self, port_path: &Path) -> &[Ident] {
        self.port_links
            .get(port_path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolves a sequence of relative steps to an element of this subtree.
    ///
    /// Steps descend through child components; the final step may name a
    /// child, a port or a link, tried in that order. The empty sequence
    /// resolves to this component.
    pub fn resolve(&self, steps: &[Ident]) -> Option<ArchRef<'_>> {
        let Some((&head, rest)) = steps.split_first() else {
            return Some(ArchRef::Component(self));
        };
        if let Some(child) = self.children.get(&head) {
            if rest.is_empty() {
                return Some(ArchRef::Component(child));
            }
            return child.resolve(rest);
        }
        if !rest.is_empty() {
            return None;
        }
        if let Some(port) = self.ports.get(&head) {
            return Some(ArchRef::Port(self, port));
        }
        self.links.get(&head).map(|link| ArchRef::Link(self, link))
    }
}
