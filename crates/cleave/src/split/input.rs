//! Validation of caller input and the consecutive-index representation the splitter runs on.
//!
//! Node `i` is the `i`-th node of the input graph in insertion order. Callers never see these
//! indices; results are mapped back to node ids.

use super::{PositionScope, SplitOptions};
use crate::error::{Error, Result};
use crate::graph::AttrGraph;
use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge {
    pub v: usize,
    pub w: usize,
    pub weight: f64,
}

impl WeightedEdge {
    pub fn other(&self, ix: usize) -> usize {
        if self.v == ix { self.w } else { self.v }
    }
}

#[derive(Debug)]
pub(crate) struct SplitGraph<'g> {
    ids: Vec<&'g str>,
    positions: Vec<Option<DVector<f64>>>,
    edges: Vec<WeightedEdge>,
    offsets: Vec<usize>,
    incident: Vec<usize>,
    groups: Vec<Vec<usize>>,
}

impl<'g> SplitGraph<'g> {
    pub(crate) fn build<G, S, P>(
        graph: &'g AttrGraph,
        groups: &[G],
        position_attributes: &[P],
        weight_attribute: &str,
        options: &SplitOptions,
    ) -> Result<Self>
    where
        G: AsRef<[S]>,
        S: AsRef<str>,
        P: AsRef<str>,
    {
        if position_attributes.is_empty() {
            return Err(Error::NoPositionAttributes);
        }

        let ids: Vec<&'g str> = graph.nodes().collect();
        let groups = resolve_groups(graph, groups)?;

        let mut needs_position = vec![options.positions == PositionScope::AllNodes; ids.len()];
        for &ix in groups.iter().flatten() {
            needs_position[ix] = true;
        }
        let positions = ids
            .iter()
            .zip(&needs_position)
            .map(|(&id, &needed)| {
                if needed {
                    read_position(graph, id, position_attributes).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut edges: Vec<WeightedEdge> = Vec::with_capacity(graph.edge_count());
        for (v, w, attrs) in graph.indexed_edges() {
            let Some(weight) = attrs.get(weight_attribute) else {
                return Err(Error::MissingWeight {
                    v: ids[v].to_string(),
                    w: ids[w].to_string(),
                    attribute: weight_attribute.to_string(),
                });
            };
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(Error::InvalidWeight {
                    v: ids[v].to_string(),
                    w: ids[w].to_string(),
                    weight,
                });
            }
            edges.push(WeightedEdge { v, w, weight });
        }

        // `edges[e]` is the graph's edge `e`, so the container's adjacency cache indexes it.
        // Self loops never cross a cut.
        let mut offsets = Vec::with_capacity(ids.len() + 1);
        let mut incident = Vec::with_capacity(2 * edges.len());
        offsets.push(0);
        for ix in 0..ids.len() {
            incident.extend(
                graph
                    .incident_edge_indices(ix)
                    .into_iter()
                    .filter(|&e| edges[e].v != edges[e].w),
            );
            offsets.push(incident.len());
        }
        Ok(Self {
            ids,
            positions,
            edges,
            offsets,
            incident,
            groups,
        })
    }

    pub(crate) fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn id(&self, ix: usize) -> &'g str {
        self.ids[ix]
    }

    pub(crate) fn position(&self, ix: usize) -> Result<&DVector<f64>> {
        self.positions
            .get(ix)
            .and_then(Option::as_ref)
            .ok_or(Error::DegenerateQuery {
                reason: "group node has no position",
            })
    }

    pub(crate) fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub(crate) fn incident_edges(&self, ix: usize) -> impl Iterator<Item = &WeightedEdge> {
        self.incident[self.offsets[ix]..self.offsets[ix + 1]]
            .iter()
            .map(|&e| &self.edges[e])
    }
}

fn resolve_groups<G, S>(graph: &AttrGraph, groups: &[G]) -> Result<Vec<Vec<usize>>>
where
    G: AsRef<[S]>,
    S: AsRef<str>,
{
    groups
        .iter()
        .enumerate()
        .map(|(group, members)| {
            let members = members.as_ref();
            if members.is_empty() {
                return Err(Error::EmptyGroup { group });
            }
            members
                .iter()
                .map(|id| {
                    let id = id.as_ref();
                    graph.node_ix(id).ok_or_else(|| Error::UnknownGroupNode {
                        group,
                        node: id.to_string(),
                    })
                })
                .collect()
        })
        .collect()
}

pub(crate) fn read_position<P: AsRef<str>>(
    graph: &AttrGraph,
    id: &str,
    position_attributes: &[P],
) -> Result<DVector<f64>> {
    let attrs = graph.node(id);
    let coords = position_attributes
        .iter()
        .map(|attribute| {
            let attribute = attribute.as_ref();
            let value = attrs.and_then(|a| a.get(attribute)).ok_or_else(|| {
                Error::MissingPosition {
                    node: id.to_string(),
                    attribute: attribute.to_string(),
                }
            })?;
            if !value.is_finite() {
                return Err(Error::NonFinitePosition {
                    node: id.to_string(),
                    attribute: attribute.to_string(),
                });
            }
            Ok(value)
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(DVector::from_vec(coords))
}
