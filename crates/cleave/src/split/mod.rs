//! Recursive min-cut splitting.
//!
//! Every branch holds a view over the input graph and the groups still present in it. A branch
//! with at most one group is resolved: all its nodes share the next free label. Otherwise the
//! two largest groups are separated by a minimum cut between their closest nodes, and both
//! sides become new branches. Branches are kept on an explicit stack, so depth is bounded by
//! memory rather than by the call stack.

mod groups;
pub(crate) mod input;
mod observe;
mod pair;
pub(crate) mod view;

use crate::error::{Error, Result};
use crate::graph::AttrGraph;
use crate::mincut::{Cut, FordFulkerson, MinCut};
use groups::active_groups;
use indexmap::IndexMap;
use input::SplitGraph;
use pair::{SplitPair, select_pair};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, trace};

pub use input::WeightedEdge;
pub use observe::{CutEvent, ResolvedEvent, SplitObserver, SplitStats};
pub use view::GraphView;

/// Which nodes must carry every position attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionScope {
    /// Every node of the graph. Missing positions are reported even for nodes outside groups.
    #[default]
    AllNodes,
    /// Only group members, the only nodes whose positions are ever read.
    GroupNodes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOptions {
    pub positions: PositionScope,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    /// Number of cuts performed.
    pub num_splits: usize,
    /// Label of every node, in graph insertion order.
    pub labels: IndexMap<String, usize>,
    pub stats: SplitStats,
}

impl SplitResult {
    pub fn label(&self, id: &str) -> Option<usize> {
        self.labels.get(id).copied()
    }

    /// Number of distinct labels carried by nodes.
    pub fn num_labels(&self) -> usize {
        self.partitions().len()
    }

    /// Node ids grouped by label, ordered by label.
    pub fn partitions(&self) -> Vec<Vec<&str>> {
        let mut parts: Vec<Vec<&str>> = Vec::new();
        for (id, &label) in &self.labels {
            if parts.len() <= label {
                parts.resize_with(label + 1, Vec::new);
            }
            parts[label].push(id.as_str());
        }
        parts.retain(|part| !part.is_empty());
        parts
    }
}

struct Branch<'a> {
    view: GraphView<'a>,
    groups: Vec<Vec<usize>>,
    depth: usize,
}

/// Splits graphs with a configurable min-cut capability.
#[derive(Debug, Clone)]
pub struct Splitter<C = FordFulkerson> {
    cut: C,
    options: SplitOptions,
}

impl Splitter<FordFulkerson> {
    pub fn new() -> Self {
        Self::with_min_cut(FordFulkerson::default())
    }
}

impl Default for Splitter<FordFulkerson> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Splitter<C> {
    pub fn with_min_cut(cut: C) -> Self {
        Self {
            cut,
            options: SplitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SplitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    pub fn min_cut(&self) -> &C {
        &self.cut
    }
}

impl<C: MinCut> Splitter<C> {
    /// Labels every node of `graph` so that nodes of different `groups` never share a label.
    ///
    /// Positions are read from the node attributes named by `position_attributes`, in that
    /// order, and cut capacities from the edge attribute `weight_attribute`. All input is
    /// validated before the first cut.
    pub fn split<G, S, P>(
        &self,
        graph: &AttrGraph,
        groups: &[G],
        position_attributes: &[P],
        weight_attribute: &str,
    ) -> Result<SplitResult>
    where
        G: AsRef<[S]>,
        S: AsRef<str>,
        P: AsRef<str>,
    {
        self.split_observed(
            graph,
            groups,
            position_attributes,
            weight_attribute,
            &mut (),
        )
    }

    /// [`split`](Self::split), reporting every cut and every resolved branch to `observer`.
    pub fn split_observed<G, S, P>(
        &self,
        graph: &AttrGraph,
        groups: &[G],
        position_attributes: &[P],
        weight_attribute: &str,
        observer: &mut dyn SplitObserver,
    ) -> Result<SplitResult>
    where
        G: AsRef<[S]>,
        S: AsRef<str>,
        P: AsRef<str>,
    {
        let _span = tracing::debug_span!(
            "split_graph",
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            groups = groups.len()
        )
        .entered();

        let base = SplitGraph::build(
            graph,
            groups,
            position_attributes,
            weight_attribute,
            &self.options,
        )?;

        let mut labels: Vec<Option<usize>> = vec![None; base.node_count()];
        let mut stats = SplitStats::default();

        let root = GraphView::full(&base);
        let root_groups = active_groups(base.groups(), &root);
        let mut pending = vec![Branch {
            view: root,
            groups: root_groups,
            depth: 0,
        }];

        while let Some(Branch {
            view,
            groups: active,
            depth,
        }) = pending.pop()
        {
            stats.max_depth = stats.max_depth.max(depth);

            if active.len() <= 1 {
                let label = stats.labels;
                stats.labels += 1;
                for ix in view.vertices() {
                    labels[ix] = Some(label);
                }
                trace!(label, depth, size = view.len(), "branch resolved");
                observer.on_resolved(&ResolvedEvent {
                    label,
                    depth,
                    size: view.len(),
                });
                continue;
            }

            let started = Instant::now();
            let pair = select_pair(&active, &base)?;
            stats.selection_time += started.elapsed();
            if pair.source == pair.sink {
                return Err(Error::CoincidentTerminals {
                    node: base.id(pair.source).to_string(),
                });
            }

            let started = Instant::now();
            let cut = self.cut.min_cut(&view, pair.source, pair.sink)?;
            stats.cut_time += started.elapsed();
            check_cut(&cut, &view, &pair)?;

            let (source_view, sink_view) = view.partition(&cut.source_side);
            stats.cuts += 1;
            stats.total_cut_weight += cut.value;

            let event = CutEvent {
                depth,
                source: base.id(pair.source),
                sink: base.id(pair.sink),
                distance: pair.distance,
                value: cut.value,
                source_size: source_view.len(),
                sink_size: sink_view.len(),
            };
            debug!(
                depth,
                groups = ?pair.groups,
                source = event.source,
                sink = event.sink,
                distance = event.distance,
                value = event.value,
                source_size = event.source_size,
                sink_size = event.sink_size,
                "cut"
            );
            observer.on_cut(&event);

            let source_groups = active_groups(base.groups(), &source_view);
            let sink_groups = active_groups(base.groups(), &sink_view);
            // Popped source side first.
            pending.push(Branch {
                view: sink_view,
                groups: sink_groups,
                depth: depth + 1,
            });
            pending.push(Branch {
                view: source_view,
                groups: source_groups,
                depth: depth + 1,
            });
        }

        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(ix, label)| {
                let id = base.id(ix);
                label
                    .map(|label| (id.to_string(), label))
                    .ok_or_else(|| Error::Unlabeled {
                        node: id.to_string(),
                    })
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        info!(
            splits = stats.cuts,
            labels = stats.labels,
            max_depth = stats.max_depth,
            "graph split"
        );
        Ok(SplitResult {
            num_splits: stats.cuts,
            labels,
            stats,
        })
    }
}

fn check_cut(cut: &Cut, view: &GraphView<'_>, pair: &SplitPair) -> Result<()> {
    if cut.source_side.len() != view.node_count() {
        return Err(Error::InvalidCut {
            reason: "partition does not cover the graph",
        });
    }
    if !cut.is_source_side(pair.source) {
        return Err(Error::InvalidCut {
            reason: "source is not on the source side",
        });
    }
    if cut.is_source_side(pair.sink) {
        return Err(Error::InvalidCut {
            reason: "sink is on the source side",
        });
    }
    Ok(())
}
