//! Filtered views over the split graph.
//!
//! A view never copies edge storage; its only state is the active-vertex mask.

use super::input::{SplitGraph, WeightedEdge};

#[derive(Debug, Clone)]
pub struct GraphView<'a> {
    base: &'a SplitGraph<'a>,
    active: Vec<bool>,
    len: usize,
}

impl<'a> GraphView<'a> {
    pub(crate) fn full(base: &'a SplitGraph<'a>) -> Self {
        Self {
            base,
            active: vec![true; base.node_count()],
            len: base.node_count(),
        }
    }

    fn filtered(&self, keep: impl Fn(usize) -> bool) -> Self {
        let active: Vec<bool> = self
            .active
            .iter()
            .enumerate()
            .map(|(ix, &on)| on && keep(ix))
            .collect();
        let len = active.iter().filter(|&&on| on).count();
        Self {
            base: self.base,
            active,
            len,
        }
    }

    /// Splits the view along `source_side` (indexed by node index) into the source-side view
    /// and the sink-side view. Inactive nodes stay inactive in both.
    pub fn partition(&self, source_side: &[bool]) -> (Self, Self) {
        let on_source = |ix: usize| source_side.get(ix).copied().unwrap_or(false);
        (self.filtered(on_source), self.filtered(|ix| !on_source(ix)))
    }

    /// Number of nodes in the underlying graph, active or not.
    pub fn node_count(&self) -> usize {
        self.active.len()
    }

    /// Number of active nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_active(&self, ix: usize) -> bool {
        self.active.get(ix).copied().unwrap_or(false)
    }

    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(ix, &on)| on.then_some(ix))
    }

    /// Edges with both endpoints active, each reported once.
    pub fn edges(&self) -> impl Iterator<Item = WeightedEdge> + '_ {
        self.vertices().flat_map(move |v| {
            self.base
                .incident_edges(v)
                .filter(move |e| {
                    let w = e.other(v);
                    w > v && self.active[w]
                })
                .copied()
        })
    }

    /// Caller-facing id of node `ix`.
    pub fn node_id(&self, ix: usize) -> &'a str {
        self.base.id(ix)
    }
}
