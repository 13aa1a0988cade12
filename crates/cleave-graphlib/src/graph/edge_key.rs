//! Edge key types.
//!
//! Edges are undirected, so keys are stored with `v <= w`.

use std::hash::{Hash, Hasher};

#[derive(Clone, Copy, Hash)]
pub(in crate::graph) struct EdgeKeyView<'a> {
    pub(in crate::graph) v: &'a str,
    pub(in crate::graph) w: &'a str,
}

impl<'a> EdgeKeyView<'a> {
    pub(in crate::graph) fn canonical(v: &'a str, w: &'a str) -> Self {
        if v <= w { Self { v, w } } else { Self { v: w, w: v } }
    }
}

impl<'a> hashbrown::Equivalent<EdgeKey> for EdgeKeyView<'a> {
    fn equivalent(&self, key: &EdgeKey) -> bool {
        key.v == self.v && key.w == self.w
    }
}

#[derive(Debug, Clone)]
pub struct EdgeKey {
    pub v: String,
    pub w: String,
}

impl EdgeKey {
    /// Builds a key in canonical orientation.
    pub fn new(v: impl Into<String>, w: impl Into<String>) -> Self {
        let (v, w) = (v.into(), w.into());
        if v <= w { Self { v, w } } else { Self { v: w, w: v } }
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint.
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.v == id {
            Some(self.w.as_str())
        } else if self.w == id {
            Some(self.v.as_str())
        } else {
            None
        }
    }
}

impl PartialEq for EdgeKey {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v && self.w == other.w
    }
}

impl Eq for EdgeKey {}

// Must agree with the derived `Hash` of `EdgeKeyView` for `Equivalent` lookups.
impl Hash for EdgeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.v.as_str().hash(state);
        self.w.as_str().hash(state);
    }
}
