//! Rand index and variation of information, split into their split and merge parts.
//!
//! With `p_ij` the number of positions labeled `i` in the truth and `j` in the test, `a_i` and
//! `b_j` the marginal counts:
//!
//! - `rand_split = sum(p_ij^2) / sum(b_j^2)`
//! - `rand_merge = sum(p_ij^2) / sum(a_i^2)`
//! - `voi_split = H(truth | test)`
//! - `voi_merge = H(test | truth)`
//!
//! Entropies are in bits. Truth label `0` marks background; those positions are ignored.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RandVoi {
    pub rand_split: f64,
    pub rand_merge: f64,
    pub voi_split: f64,
    pub voi_merge: f64,
}

impl RandVoi {
    /// Scores of two labelings that agree everywhere.
    pub const PERFECT: Self = Self {
        rand_split: 1.0,
        rand_merge: 1.0,
        voi_split: 0.0,
        voi_merge: 0.0,
    };
}

pub fn rand_voi(truth: &[u64], test: &[u64]) -> Result<RandVoi> {
    if truth.len() != test.len() {
        return Err(Error::LengthMismatch {
            truth: truth.len(),
            test: test.len(),
        });
    }

    let mut joint: FxHashMap<(u64, u64), u64> = FxHashMap::default();
    let mut truth_counts: FxHashMap<u64, u64> = FxHashMap::default();
    let mut test_counts: FxHashMap<u64, u64> = FxHashMap::default();
    let mut total = 0u64;
    for (&t, &s) in truth.iter().zip(test) {
        if t == 0 {
            continue;
        }
        *joint.entry((t, s)).or_default() += 1;
        *truth_counts.entry(t).or_default() += 1;
        *test_counts.entry(s).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return Ok(RandVoi::PERFECT);
    }

    let joint_sq = sum_sq(joint.values().copied());
    let truth_sq = sum_sq(truth_counts.values().copied());
    let test_sq = sum_sq(test_counts.values().copied());

    let n = total as f64;
    let h_joint = entropy(joint.values().copied(), n);
    let h_truth = entropy(truth_counts.values().copied(), n);
    let h_test = entropy(test_counts.values().copied(), n);

    Ok(RandVoi {
        rand_split: joint_sq / test_sq,
        rand_merge: joint_sq / truth_sq,
        voi_split: (h_joint - h_test).max(0.0),
        voi_merge: (h_joint - h_truth).max(0.0),
    })
}

fn sum_sq(counts: impl Iterator<Item = u64>) -> f64 {
    counts.map(|c| (c as f64) * (c as f64)).sum()
}

fn entropy(counts: impl Iterator<Item = u64>, total: f64) -> f64 {
    counts
        .map(|c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
