//! The mappability oracle: pluggable dispatch over architecture and tasks.

use crate::taskgraph::{TaskEdge, TaskNode};
use mosaic_arch::{Component, Link, Path, Port};
use mosaic_common::Metadata;

/// The dispatch table consulted by every mapping stage.
///
/// A `RuleSet` is a small closed capability set, not a class hierarchy:
/// concrete fabrics implement the trait and override only where they differ
/// from the defaults. Every method defaults to the most permissive answer
/// (everything maps, everything routes, capacity one) except
/// [`is_special`](RuleSet::is_special), which defaults to `false`.
///
/// The core never inspects task or edge metadata directly; all typed
/// behavior flows through these methods.
pub trait RuleSet: Send + Sync {
    /// Whether two tasks belong to the same placement equivalence class
    /// (and therefore share a map-table).
    fn is_equivalent(&self, a: &TaskNode, b: &TaskNode) -> bool {
        let _ = (a, b);
        true
    }

    /// Whether a task belongs to a special class with a restricted,
    /// pre-enumerated address set.
    fn is_special(&self, node: &TaskNode) -> bool {
        let _ = node;
        false
    }

    /// Whether a component can host tasks at all. Controls which component
    /// paths appear in the per-address slot tables.
    fn is_mappable(&self, component: &Component) -> bool {
        let _ = component;
        true
    }

    /// Whether a specific task may be seated on a specific component.
    fn can_map(&self, node: &TaskNode, component: &Component) -> bool {
        let _ = (node, component);
        true
    }

    /// Whether a routed channel for `edge` may occupy `link`.
    fn can_use(&self, link: &Link, edge: &TaskEdge) -> bool {
        let _ = (link, edge);
        true
    }

    /// The number of channels that may simultaneously occupy `link`.
    fn get_capacity(&self, link: &Link) -> u32 {
        link.capacity
    }

    /// Whether `port` on a source task's component may emit `edge`.
    ///
    /// Only output-direction ports are ever offered.
    fn is_source_port(&self, port: &Port, edge: &TaskEdge) -> bool {
        let _ = (port, edge);
        true
    }

    /// Whether `port` on a sink task's component may receive `edge`.
    ///
    /// Only input-direction ports are ever offered.
    fn is_sink_port(&self, port: &Port, edge: &TaskEdge) -> bool {
        let _ = (port, edge);
        true
    }

    /// Whether `edge` requires a physical route. Edges that carry no data
    /// (ordering constraints, self-loops) answer `false` and are skipped
    /// by the router.
    fn needs_routing(&self, edge: &TaskEdge) -> bool {
        let _ = edge;
        true
    }

    /// Post-routing hook: attach fabric-specific annotations for a routed
    /// edge to the map metadata.
    fn annotate(&self, edge_index: usize, edge: &TaskEdge, route: &[Path], metadata: &mut Metadata) {
        let _ = (edge_index, edge, route, metadata);
    }

    /// Optional routing-priority override for `edge`. Channels with lower
    /// values route earlier; `None` keeps the default ordering (ascending
    /// fanout, then ascending endpoint count).
    fn routing_channel(&self, edge_index: usize, edge: &TaskEdge) -> Option<i64> {
        let _ = (edge_index, edge);
        None
    }
}

/// The all-defaults oracle: every task maps everywhere, every link is
/// usable with capacity one, every edge routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl RuleSet for DefaultRules {}
