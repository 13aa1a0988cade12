//! Minimum s-t cuts over a [`GraphView`].

use crate::error::{Error, Result};
use crate::split::GraphView;
use petgraph::Direction;
use petgraph::algo::ford_fulkerson;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// A binary partition of the active nodes of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// Maximum flow value, equal to the total weight of the cut edges.
    pub value: f64,
    /// Indexed by node index. `true` for active nodes on the source side; inactive nodes are
    /// `false` and must be ignored.
    pub source_side: Vec<bool>,
}

impl Cut {
    pub fn is_source_side(&self, ix: usize) -> bool {
        self.source_side.get(ix).copied().unwrap_or(false)
    }
}

/// Computes a minimum cut separating `source` from `sink` inside `view`, using edge weights as
/// capacities. Undirected edges carry the same capacity in both directions. Terminals that are
/// not connected are a valid input and give a cut of value 0.
pub trait MinCut {
    fn min_cut(&self, view: &GraphView<'_>, source: usize, sink: usize) -> Result<Cut>;
}

/// Max-flow via `petgraph`'s Ford-Fulkerson, followed by the residual-reachability cut.
///
/// The source side is the set of nodes reachable from the source through edges with residual
/// capacity above `residual_epsilon`. That set is the same for every maximum flow, so the
/// result does not depend on which augmenting paths were taken.
#[derive(Debug, Clone, Copy)]
pub struct FordFulkerson {
    pub residual_epsilon: f64,
}

impl Default for FordFulkerson {
    fn default() -> Self {
        Self {
            residual_epsilon: 1e-9,
        }
    }
}

impl FordFulkerson {
    pub fn new(residual_epsilon: f64) -> Self {
        Self { residual_epsilon }
    }
}

impl MinCut for FordFulkerson {
    fn min_cut(&self, view: &GraphView<'_>, source: usize, sink: usize) -> Result<Cut> {
        if source == sink {
            return Err(Error::InvalidCut {
                reason: "source and sink are the same node",
            });
        }
        if !(view.is_active(source) && view.is_active(sink)) {
            return Err(Error::InvalidCut {
                reason: "cut terminals must be active in the view",
            });
        }

        let mut network: DiGraph<usize, f64> = DiGraph::with_capacity(view.len(), 0);
        let mut local: FxHashMap<usize, NodeIndex> = FxHashMap::default();
        for ix in view.vertices() {
            local.insert(ix, network.add_node(ix));
        }
        for e in view.edges() {
            let (a, b) = (local[&e.v], local[&e.w]);
            network.add_edge(a, b, e.weight);
            network.add_edge(b, a, e.weight);
        }
        let (s, t) = (local[&source], local[&sink]);

        let (value, flows) = ford_fulkerson(&network, s, t);

        let eps = self.residual_epsilon;
        let mut reached = vec![false; network.node_count()];
        reached[s.index()] = true;
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([s]);
        while let Some(x) = queue.pop_front() {
            for e in network.edges_directed(x, Direction::Outgoing) {
                let y = e.target();
                if !reached[y.index()] && *e.weight() - flows[e.id().index()] > eps {
                    reached[y.index()] = true;
                    queue.push_back(y);
                }
            }
            // Flow on an incoming edge can be pushed back.
            for e in network.edges_directed(x, Direction::Incoming) {
                let y = e.source();
                if !reached[y.index()] && flows[e.id().index()] > eps {
                    reached[y.index()] = true;
                    queue.push_back(y);
                }
            }
        }

        if reached[t.index()] {
            return Err(Error::InvalidCut {
                reason: "sink is reachable in the residual network",
            });
        }

        let mut source_side = vec![false; view.node_count()];
        for n in network.node_indices() {
            if reached[n.index()] {
                source_side[network[n]] = true;
            }
        }
        Ok(Cut { value, source_side })
    }
}
