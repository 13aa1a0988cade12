//! Undirected graph container used by `cleave`.
//!
//! Nodes are addressed by string ids and keep their insertion order, which callers can rely on
//! for consecutive numbering (see [`Graph::node_ix`]).

pub mod graph;

pub use graph::{EdgeKey, Graph};
