#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("at least one position attribute is required")]
    NoPositionAttributes,

    #[error("node {node} has no position attribute `{attribute}`")]
    MissingPosition { node: String, attribute: String },

    #[error("node {node} has a non-finite value for position attribute `{attribute}`")]
    NonFinitePosition { node: String, attribute: String },

    #[error("edge ({v}, {w}) has no weight attribute `{attribute}`")]
    MissingWeight {
        v: String,
        w: String,
        attribute: String,
    },

    #[error("edge ({v}, {w}) has weight {weight}; weights must be finite and non-negative")]
    InvalidWeight { v: String, w: String, weight: f64 },

    #[error("group {group} is empty")]
    EmptyGroup { group: usize },

    #[error("group {group} references node {node}, which is not in the graph")]
    UnknownGroupNode { group: usize, node: String },

    #[error("graph contains an edge with a missing endpoint: {edge}")]
    MissingEndpoint { edge: String },

    #[error("node {node} is declared more than once")]
    DuplicateNode { node: String },

    #[error("edge {edge} is declared more than once")]
    DuplicateEdge { edge: String },

    #[error("label arrays differ in length: truth has {truth} entries, test has {test}")]
    LengthMismatch { truth: usize, test: usize },

    #[error("labels hold {len} elements, which does not fit shape {shape:?}")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    #[error("voxel size has {len} entries for {dims} dimensions")]
    VoxelSizeMismatch { dims: usize, len: usize },

    #[error("node {node} has no attribute `{attribute}`")]
    MissingNodeAttribute { node: String, attribute: String },

    #[error("node {node} has skeleton id {value}; skeleton ids must be non-negative integers")]
    InvalidSkeletonId { node: String, value: f64 },

    #[error("edge ({v}, {w}) connects two different skeletons")]
    CrossSkeletonEdge { v: String, w: String },

    #[error("edge ({v}, {w}) has no length attribute `{attribute}`")]
    MissingEdgeLength {
        v: String,
        w: String,
        attribute: String,
    },

    #[error("edge ({v}, {w}) has length {length}; lengths must be finite and non-negative")]
    InvalidEdgeLength { v: String, w: String, length: f64 },

    #[error("node {node} was selected as both cut terminals; groups must be disjoint")]
    CoincidentTerminals { node: String },

    #[error("degenerate nearest-neighbor query: {reason}")]
    DegenerateQuery { reason: &'static str },

    #[error("min-cut returned an invalid partition: {reason}")]
    InvalidCut { reason: &'static str },

    #[error("node {node} did not receive a split label")]
    Unlabeled { node: String },
}

pub type Result<T> = std::result::Result<T, Error>;
