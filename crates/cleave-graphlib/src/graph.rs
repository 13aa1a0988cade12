//! Undirected graph container.
//!
//! Nodes and edges are stored in insertion order. Edge endpoints are canonicalized so that
//! `(v, w)` and `(w, v)` address the same edge; there are no multi-edges.

mod adj_cache;
mod edge_key;

use adj_cache::AdjCache;
use edge_key::EdgeKeyView;
use rustc_hash::FxBuildHasher;
use std::cell::RefCell;

pub use edge_key::EdgeKey;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone)]
struct NodeSlot<N> {
    id: String,
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeSlot<E> {
    key: EdgeKey,
    /// Insertion indices of `key.v` and `key.w`.
    ends: (usize, usize),
    label: E,
}

#[derive(Debug, Clone)]
pub struct Graph<N, E>
where
    N: Default,
    E: Default,
{
    nodes: Vec<NodeSlot<N>>,
    node_index: HashMap<String, usize>,

    edges: Vec<EdgeSlot<E>>,
    edge_index: HashMap<EdgeKey, usize>,

    // `neighbors` / `node_edges` are called per node by most consumers. The cache is rebuilt
    // lazily whenever the edge set changed since it was last built.
    //
    // Note: This uses interior mutability to keep query APIs on `&self`.
    adj_gen: u64,
    adj_cache: RefCell<Option<AdjCache>>,
}

impl<N, E> Default for Graph<N, E>
where
    N: Default,
    E: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E>
where
    N: Default,
    E: Default,
{
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            adj_gen: 0,
            adj_cache: RefCell::new(None),
        }
    }

    fn invalidate_adj(&mut self) {
        self.adj_gen = self.adj_gen.wrapping_add(1);
        *self.adj_cache.get_mut() = None;
    }

    fn with_adj<R>(&self, f: impl FnOnce(&AdjCache) -> R) -> R {
        let generation = self.adj_gen;
        let mut cache = self.adj_cache.borrow_mut();
        if cache.as_ref().is_some_and(|c| c.generation != generation) {
            *cache = None;
        }
        let adj = cache.get_or_insert_with(|| {
            AdjCache::build(
                generation,
                self.nodes.len(),
                self.edges.iter().map(|e| e.ends),
            )
        });
        f(adj)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            self.nodes[idx].label = label;
            return self;
        }
        self.invalidate_adj();
        let idx = self.nodes.len();
        self.nodes.push(NodeSlot {
            id: id.clone(),
            label,
        });
        self.node_index.insert(id, idx);
        self
    }

    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return self;
        }
        self.set_node(id, N::default())
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.node_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.nodes[idx].label)
    }

    /// Insertion index of `id`. Indices are consecutive, starting at 0.
    pub fn node_ix(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn node_id(&self, ix: usize) -> Option<&str> {
        self.nodes.get(ix).map(|n| n.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn for_each_node<F>(&self, mut f: F)
    where
        F: FnMut(&str, &N),
    {
        for n in &self.nodes {
            f(&n.id, &n.label);
        }
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut N),
    {
        for n in &mut self.nodes {
            f(&n.id, &mut n.label);
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter().map(|e| &e.key)
    }

    /// Edges as `(v_ix, w_ix, label)` using node insertion indices.
    pub fn indexed_edges(&self) -> impl Iterator<Item = (usize, usize, &E)> {
        self.edges.iter().map(|e| (e.ends.0, e.ends.1, &e.label))
    }

    pub fn for_each_edge<F>(&self, mut f: F)
    where
        F: FnMut(&EdgeKey, &E),
    {
        for e in &self.edges {
            f(&e.key, &e.label);
        }
    }

    pub fn for_each_edge_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&EdgeKey, &mut E),
    {
        for e in &mut self.edges {
            f(&e.key, &mut e.label);
        }
    }

    pub fn set_edge(&mut self, v: impl Into<String>, w: impl Into<String>) -> &mut Self {
        self.set_edge_inner(v.into(), w.into(), None)
    }

    pub fn set_edge_with_label(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
    ) -> &mut Self {
        self.set_edge_inner(v.into(), w.into(), Some(label))
    }

    fn set_edge_inner(&mut self, v: String, w: String, label: Option<E>) -> &mut Self {
        let key = EdgeKey::new(v, w);
        if let Some(&idx) = self.edge_index.get(&key) {
            if let Some(label) = label {
                self.edges[idx].label = label;
            }
            return self;
        }

        self.ensure_node(key.v.clone());
        self.ensure_node(key.w.clone());
        let ends = (
            self.node_index[key.v.as_str()],
            self.node_index[key.w.as_str()],
        );

        self.invalidate_adj();
        let idx = self.edges.len();
        self.edges.push(EdgeSlot {
            key: key.clone(),
            ends,
            label: label.unwrap_or_default(),
        });
        self.edge_index.insert(key, idx);
        self
    }

    pub fn set_path(&mut self, nodes: &[&str]) -> &mut Self {
        for pair in nodes.windows(2) {
            self.set_edge(pair[0], pair[1]);
        }
        self
    }

    pub fn has_edge(&self, v: &str, w: &str) -> bool {
        self.edge_index.contains_key(&EdgeKeyView::canonical(v, w))
    }

    pub fn edge(&self, v: &str, w: &str) -> Option<&E> {
        let idx = *self.edge_index.get(&EdgeKeyView::canonical(v, w))?;
        Some(&self.edges[idx].label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str) -> Option<&mut E> {
        let idx = *self.edge_index.get(&EdgeKeyView::canonical(v, w))?;
        Some(&mut self.edges[idx].label)
    }

    pub fn remove_edge(&mut self, v: &str, w: &str) -> bool {
        let Some(idx) = self.edge_index.remove(&EdgeKeyView::canonical(v, w)) else {
            return false;
        };
        self.invalidate_adj();
        self.edges.remove(idx);
        for i in idx..self.edges.len() {
            if let Some(slot) = self.edge_index.get_mut(&self.edges[i].key) {
                *slot = i;
            }
        }
        true
    }

    /// Adjacent node ids, in edge insertion order. A self loop lists the node itself once.
    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        let Some(&v_ix) = self.node_index.get(v) else {
            return Vec::new();
        };
        self.with_adj(|adj| {
            adj.edges(v_ix)
                .iter()
                .filter_map(|&edge_ix| self.edges[edge_ix].key.other(v))
                .collect()
        })
    }

    /// Indices, as yielded by [`indexed_edges`](Self::indexed_edges), of the edges incident to
    /// the node with insertion index `v_ix`. Same order as [`node_edges`](Self::node_edges).
    pub fn incident_edge_indices(&self, v_ix: usize) -> Vec<usize> {
        if v_ix >= self.nodes.len() {
            return Vec::new();
        }
        self.with_adj(|adj| adj.edges(v_ix).to_vec())
    }

    pub fn node_edges(&self, v: &str) -> Vec<EdgeKey> {
        let Some(&v_ix) = self.node_index.get(v) else {
            return Vec::new();
        };
        self.with_adj(|adj| {
            adj.edges(v_ix)
                .iter()
                .map(|&edge_ix| self.edges[edge_ix].key.clone())
                .collect()
        })
    }
}
