#![forbid(unsafe_code)]

//! Recursive minimum-cut splitting of weighted proximity graphs.
//!
//! Given an undirected graph with node positions and edge weights, and a list of node groups
//! that must stay apart, `cleave` repeatedly cuts the graph between the closest nodes of the
//! two largest groups until no part holds more than one group. Every node ends up with a
//! partition label.
//!
//! ```
//! use cleave::{AttrGraph, Attrs, split_graph};
//!
//! let mut g = AttrGraph::new();
//! g.set_node("a", Attrs::new().with("x", 0.0));
//! g.set_node("b", Attrs::new().with("x", 1.0));
//! g.set_node("c", Attrs::new().with("x", 2.0));
//! g.set_edge_with_label("a", "b", Attrs::new().with("weight", 0.1));
//! g.set_edge_with_label("b", "c", Attrs::new().with("weight", 1.0));
//!
//! let result = split_graph(&g, &[["a"], ["c"]], &["x"], "weight").unwrap();
//! assert_eq!(result.num_splits, 1);
//! assert_ne!(result.label("a"), result.label("c"));
//! assert_eq!(result.label("b"), result.label("c"));
//! ```

pub mod error;
pub mod graph;
pub mod metrics;
pub mod mincut;
pub mod spatial;
pub mod split;

pub use cleave_graphlib as graphlib;
pub use error::{Error, Result};
pub use graph::{AttrGraph, Attrs};
pub use metrics::{
    DetectionOptions, DetectionScores, MatchingScore, NodeSegments, RandVoi, RunLength,
    SkeletonScores, detection_scores, evaluate_skeletons, expected_run_length, rand_voi,
    skeleton_lengths, store_edge_lengths,
};
pub use mincut::{Cut, FordFulkerson, MinCut};
pub use split::{
    CutEvent, GraphView, PositionScope, ResolvedEvent, SplitObserver, SplitOptions, SplitResult,
    SplitStats, Splitter,
};

/// Splits `graph` with the default [`Splitter`].
pub fn split_graph<G, S, P>(
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
    Splitter::new().split(graph, groups, position_attributes, weight_attribute)
}

/// Splits `graph` and stores every node's label in its `split_attribute` attribute.
///
/// Returns the number of cuts. The graph is only modified when the split succeeds.
pub fn label_graph<G, S, P>(
    graph: &mut AttrGraph,
    groups: &[G],
    position_attributes: &[P],
    weight_attribute: &str,
    split_attribute: &str,
) -> Result<usize>
where
    G: AsRef<[S]>,
    S: AsRef<str>,
    P: AsRef<str>,
{
    let result = split_graph(graph, groups, position_attributes, weight_attribute)?;
    graph.for_each_node_mut(|id, attrs| {
        if let Some(label) = result.label(id) {
            attrs.set(split_attribute, label as f64);
        }
    });
    Ok(result.num_splits)
}
