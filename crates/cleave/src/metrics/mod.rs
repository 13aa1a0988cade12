//! Agreement scores between a labeling and its ground truth.

mod detection;
mod rand_voi;
mod skeleton;

pub use detection::{Detection, DetectionOptions, DetectionScores, MatchingScore, detection_scores};
pub use rand_voi::{RandVoi, rand_voi};
pub use skeleton::{
    NodeSegments, RunLength, SkeletonScores, evaluate_skeletons, expected_run_length,
    skeleton_lengths, store_edge_lengths,
};
