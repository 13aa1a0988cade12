//! Adjacency cache used by [`Graph`](super::Graph).
//!
//! Neighbor queries would otherwise scan every edge.

#[derive(Debug, Clone)]
pub(in crate::graph) struct AdjCache {
    pub(in crate::graph) generation: u64,
    pub(in crate::graph) offsets: Vec<usize>,
    pub(in crate::graph) edges: Vec<usize>,
}

impl AdjCache {
    pub(in crate::graph) fn build(
        generation: u64,
        node_count: usize,
        endpoints: impl Iterator<Item = (usize, usize)> + Clone,
    ) -> Self {
        let mut degree = vec![0usize; node_count];
        for (v, w) in endpoints.clone() {
            degree[v] += 1;
            if v != w {
                degree[w] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        for d in &degree {
            let last = *offsets.last().unwrap_or(&0);
            offsets.push(last + d);
        }

        let mut fill = offsets.clone();
        let mut edges = vec![0usize; *offsets.last().unwrap_or(&0)];
        for (edge_ix, (v, w)) in endpoints.enumerate() {
            edges[fill[v]] = edge_ix;
            fill[v] += 1;
            if v != w {
                edges[fill[w]] = edge_ix;
                fill[w] += 1;
            }
        }

        Self {
            generation,
            offsets,
            edges,
        }
    }

    pub(in crate::graph) fn edges(&self, v_ix: usize) -> &[usize] {
        let start = self.offsets[v_ix];
        let end = self.offsets[v_ix + 1];
        &self.edges[start..end]
    }
}
