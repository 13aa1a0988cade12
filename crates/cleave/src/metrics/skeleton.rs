//! Scores of a segmentation against ground-truth skeletons.
//!
//! Skeleton nodes carry a skeleton id attribute and are looked up in a node to segment table.
//! Every skeleton edge is then either
//!
//! - omitted: an endpoint has no segment (missing from the table or mapped to `0`),
//! - split: its endpoints lie in different segments,
//! - merged: both endpoints lie in a segment that also covers another skeleton,
//! - correct otherwise.
//!
//! The expected run length (ERL) is the length of the correct run a uniformly chosen skeleton
//! point lies on, in expectation: `sum(run^2) / sum(skeleton lengths)`, where runs are the
//! connected pieces of correct edges.

use crate::error::{Error, Result};
use crate::graph::AttrGraph;
use crate::split::input::read_position;
use indexmap::IndexMap;
use petgraph::unionfind::UnionFind;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Segment id of each skeleton node, keyed by node id.
pub type NodeSegments = IndexMap<String, u64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkeletonScores {
    pub omitted: usize,
    pub split: usize,
    pub merged: usize,
    pub correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLength {
    pub erl: f64,
    /// Segments that cover more than one skeleton, with those skeletons in ascending order.
    pub merge_stats: IndexMap<u64, Vec<u64>>,
    /// Segment pairs of the split edges of each skeleton.
    pub split_stats: IndexMap<u64, Vec<(u64, u64)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    Omitted,
    Split(u64, u64),
    Merged,
    Correct,
}

#[derive(Debug)]
struct Classified {
    /// Skeleton ids in order of first appearance among the nodes.
    skeletons: Vec<u64>,
    /// `(skeleton, v_ix, w_ix, class)` in edge order.
    edges: Vec<(u64, usize, usize, EdgeClass)>,
    merged: IndexMap<u64, Vec<u64>>,
}

/// Total edge length of every skeleton, measured between node positions.
pub fn skeleton_lengths<P: AsRef<str>>(
    graph: &AttrGraph,
    position_attributes: &[P],
    skeleton_id_attribute: &str,
) -> Result<IndexMap<u64, f64>> {
    let skeleton_of = skeleton_ids(graph, skeleton_id_attribute)?;
    let lengths = edge_lengths(graph, position_attributes)?;

    let mut totals: IndexMap<u64, f64> = IndexMap::new();
    for &skeleton in &skeleton_of {
        totals.entry(skeleton).or_default();
    }
    for ((v, w, _), length) in graph.indexed_edges().zip(lengths) {
        let skeleton = edge_skeleton(graph, &skeleton_of, v, w)?;
        *totals.entry(skeleton).or_default() += length;
    }
    Ok(totals)
}

/// Stores the length of every edge, measured between node positions, under
/// `edge_length_attribute`.
pub fn store_edge_lengths<P: AsRef<str>>(
    graph: &mut AttrGraph,
    position_attributes: &[P],
    edge_length_attribute: &str,
) -> Result<()> {
    let mut lengths = edge_lengths(graph, position_attributes)?.into_iter();
    graph.for_each_edge_mut(|_, attrs| {
        if let Some(length) = lengths.next() {
            attrs.set(edge_length_attribute, length);
        }
    });
    Ok(())
}

/// Edge classes counted per skeleton, in order of first appearance of each skeleton.
pub fn evaluate_skeletons(
    graph: &AttrGraph,
    skeleton_id_attribute: &str,
    segments: &NodeSegments,
) -> Result<IndexMap<u64, SkeletonScores>> {
    let classified = classify(graph, skeleton_id_attribute, segments)?;

    let mut scores: IndexMap<u64, SkeletonScores> = classified
        .skeletons
        .iter()
        .map(|&s| (s, SkeletonScores::default()))
        .collect();
    for &(skeleton, _, _, class) in &classified.edges {
        let entry = scores.entry(skeleton).or_default();
        match class {
            EdgeClass::Omitted => entry.omitted += 1,
            EdgeClass::Split(..) => entry.split += 1,
            EdgeClass::Merged => entry.merged += 1,
            EdgeClass::Correct => entry.correct += 1,
        }
    }
    Ok(scores)
}

/// Expected run length of the segmentation along the skeletons.
///
/// Edge lengths are read from `edge_length_attribute` (see [`store_edge_lengths`]). Skeleton
/// lengths default to the sum of their edge lengths; `skeleton_lengths` overrides them per
/// skeleton.
pub fn expected_run_length(
    graph: &AttrGraph,
    skeleton_id_attribute: &str,
    edge_length_attribute: &str,
    segments: &NodeSegments,
    skeleton_lengths: Option<&IndexMap<u64, f64>>,
) -> Result<RunLength> {
    let classified = classify(graph, skeleton_id_attribute, segments)?;

    let mut lengths = Vec::with_capacity(classified.edges.len());
    for (v, w, attrs) in graph.indexed_edges() {
        let name = |ix: usize| graph.node_id(ix).unwrap_or_default().to_string();
        let Some(length) = attrs.get(edge_length_attribute) else {
            return Err(Error::MissingEdgeLength {
                v: name(v),
                w: name(w),
                attribute: edge_length_attribute.to_string(),
            });
        };
        if !(length.is_finite() && length >= 0.0) {
            return Err(Error::InvalidEdgeLength {
                v: name(v),
                w: name(w),
                length,
            });
        }
        lengths.push(length);
    }

    let mut runs = UnionFind::<usize>::new(graph.node_count());
    let mut measured: FxHashMap<u64, f64> = FxHashMap::default();
    let mut split_stats: IndexMap<u64, Vec<(u64, u64)>> = IndexMap::new();
    for (&(skeleton, v, w, class), &length) in classified.edges.iter().zip(&lengths) {
        *measured.entry(skeleton).or_default() += length;
        match class {
            EdgeClass::Correct => {
                runs.union(v, w);
            }
            EdgeClass::Split(a, b) => split_stats.entry(skeleton).or_default().push((a, b)),
            EdgeClass::Omitted | EdgeClass::Merged => {}
        }
    }

    let mut run_lengths: FxHashMap<usize, f64> = FxHashMap::default();
    for (&(_, v, _, class), &length) in classified.edges.iter().zip(&lengths) {
        if class == EdgeClass::Correct {
            *run_lengths.entry(runs.find(v)).or_default() += length;
        }
    }
    let squared: f64 = run_lengths.values().map(|r| r * r).sum();

    let total: f64 = classified
        .skeletons
        .iter()
        .map(|s| {
            skeleton_lengths
                .and_then(|given| given.get(s).copied())
                .or_else(|| measured.get(s).copied())
                .unwrap_or(0.0)
        })
        .sum();
    let erl = if total > 0.0 { squared / total } else { 0.0 };

    tracing::debug!(
        skeletons = classified.skeletons.len(),
        runs = run_lengths.len(),
        merged_segments = classified.merged.len(),
        erl,
        "expected run length"
    );
    Ok(RunLength {
        erl,
        merge_stats: classified.merged,
        split_stats,
    })
}

fn classify(
    graph: &AttrGraph,
    skeleton_id_attribute: &str,
    segments: &NodeSegments,
) -> Result<Classified> {
    let skeleton_of = skeleton_ids(graph, skeleton_id_attribute)?;

    let mut skeletons = Vec::new();
    let mut seen: FxHashSet<u64> = FxHashSet::default();
    for &s in &skeleton_of {
        if seen.insert(s) {
            skeletons.push(s);
        }
    }

    let segment_of: Vec<Option<u64>> = graph
        .nodes()
        .map(|id| segments.get(id).copied().filter(|&seg| seg != 0))
        .collect();

    let mut covered: FxHashMap<u64, FxHashSet<u64>> = FxHashMap::default();
    for (segment, &skeleton) in segment_of.iter().zip(&skeleton_of) {
        if let Some(segment) = segment {
            covered.entry(*segment).or_default().insert(skeleton);
        }
    }
    let mut merged: Vec<(u64, Vec<u64>)> = covered
        .into_iter()
        .filter(|(_, skeletons)| skeletons.len() > 1)
        .map(|(segment, skeletons)| {
            let mut skeletons: Vec<u64> = skeletons.into_iter().collect();
            skeletons.sort_unstable();
            (segment, skeletons)
        })
        .collect();
    merged.sort_unstable_by_key(|(segment, _)| *segment);
    let merged: IndexMap<u64, Vec<u64>> = merged.into_iter().collect();

    let mut edges = Vec::with_capacity(graph.edge_count());
    for (v, w, _) in graph.indexed_edges() {
        let skeleton = edge_skeleton(graph, &skeleton_of, v, w)?;
        let class = match (segment_of[v], segment_of[w]) {
            (Some(a), Some(b)) if a != b => EdgeClass::Split(a, b),
            (Some(a), Some(_)) if merged.contains_key(&a) => EdgeClass::Merged,
            (Some(_), Some(_)) => EdgeClass::Correct,
            _ => EdgeClass::Omitted,
        };
        edges.push((skeleton, v, w, class));
    }

    Ok(Classified {
        skeletons,
        edges,
        merged,
    })
}

/// Skeleton id of every node, in node order.
fn skeleton_ids(graph: &AttrGraph, attribute: &str) -> Result<Vec<u64>> {
    let mut ids = Vec::with_capacity(graph.node_count());
    for id in graph.nodes() {
        let Some(value) = graph.node(id).and_then(|attrs| attrs.get(attribute)) else {
            return Err(Error::MissingNodeAttribute {
                node: id.to_string(),
                attribute: attribute.to_string(),
            });
        };
        if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
            return Err(Error::InvalidSkeletonId {
                node: id.to_string(),
                value,
            });
        }
        ids.push(value as u64);
    }
    Ok(ids)
}

fn edge_skeleton(graph: &AttrGraph, skeleton_of: &[u64], v: usize, w: usize) -> Result<u64> {
    if skeleton_of[v] != skeleton_of[w] {
        let name = |ix: usize| graph.node_id(ix).unwrap_or_default().to_string();
        return Err(Error::CrossSkeletonEdge {
            v: name(v),
            w: name(w),
        });
    }
    Ok(skeleton_of[v])
}

fn edge_lengths<P: AsRef<str>>(graph: &AttrGraph, position_attributes: &[P]) -> Result<Vec<f64>> {
    if position_attributes.is_empty() {
        return Err(Error::NoPositionAttributes);
    }
    let positions = graph
        .nodes()
        .map(|id| read_position(graph, id, position_attributes))
        .collect::<Result<Vec<_>>>()?;
    Ok(graph
        .indexed_edges()
        .map(|(v, w, _)| (&positions[v] - &positions[w]).norm())
        .collect())
}
