//! Choice of the next two groups to separate and of the cut terminals.

use super::input::SplitGraph;
use crate::error::{Error, Result};
use crate::spatial::KdTree;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitPair {
    /// Positions of the chosen groups in the branch's group list, `(source, sink)`.
    pub(crate) groups: (usize, usize),
    pub(crate) source: usize,
    pub(crate) sink: usize,
    pub(crate) distance: f64,
}

/// Picks the two largest groups (the later one wins among equal sizes) and the spatially
/// closest pair of nodes between them.
///
/// The second-largest group is indexed and the largest one is queried; its node becomes the
/// sink. Among equally close pairs the first query node wins, then the lowest indexed node.
pub(crate) fn select_pair(groups: &[Vec<usize>], base: &SplitGraph<'_>) -> Result<SplitPair> {
    if groups.len() < 2 {
        return Err(Error::DegenerateQuery {
            reason: "fewer than two groups to separate",
        });
    }

    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by_key(|&g| groups[g].len());
    let (gu, gv) = (order[order.len() - 2], order[order.len() - 1]);
    let (members_u, members_v) = (&groups[gu], &groups[gv]);
    if members_u.is_empty() || members_v.is_empty() {
        return Err(Error::DegenerateQuery {
            reason: "group without active nodes",
        });
    }

    let indexed = members_u
        .iter()
        .map(|&ix| base.position(ix).cloned())
        .collect::<Result<Vec<_>>>()?;
    let tree = KdTree::build(indexed)?;

    let queries = members_v
        .iter()
        .map(|&ix| base.position(ix).cloned())
        .collect::<Result<Vec<_>>>()?;
    let hits = tree.nearest_each(&queries)?;

    let mut best = 0;
    for (i, hit) in hits.iter().enumerate() {
        if hit.distance < hits[best].distance {
            best = i;
        }
    }
    let hit = hits[best];
    Ok(SplitPair {
        groups: (gu, gv),
        source: members_u[hit.index],
        sink: members_v[best],
        distance: hit.distance,
    })
}
