//! Detection scores between two label volumes.
//!
//! For every label id the face-connected components of that label are extracted from the
//! truth and from the test volume and matched one-to-one by an optimal assignment. Matched
//! pairs are true positives, unmatched test components false positives and unmatched truth
//! components false negatives.
//!
//! Volumes are flat slices in row-major order (the last axis varies fastest) together with
//! their shape.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;
use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Integer weights handed to the assignment solver span `[-WEIGHT_RANGE, WEIGHT_RANGE]`.
const WEIGHT_RANGE: f64 = 1e9;

/// How candidate pairs of components are scored for matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingScore {
    /// Number of shared elements.
    #[default]
    Overlap,
    /// Intersection over union.
    Iou,
    /// Euclidean distance between component centers, in voxel-size units.
    Distance,
}

impl MatchingScore {
    fn maximize(self) -> bool {
        !matches!(self, Self::Distance)
    }

    fn accepts(self, score: f64, threshold: f64) -> bool {
        if self.maximize() {
            score >= threshold
        } else {
            score <= threshold
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    pub matching_score: MatchingScore,
    /// Assigned pairs scoring worse than this are not counted as matches.
    pub matching_threshold: f64,
    /// Size of an element along each axis. Scales component centers and thus distances.
    pub voxel_size: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Detection {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    /// Mean center distance over matched pairs.
    pub avg_distance: f64,
    /// Mean intersection over union over matched pairs.
    pub avg_iou: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionScores {
    /// Counts summed over all labels. The averages run over all matched pairs and are NaN when
    /// nothing matched.
    pub total: Detection,
    /// Per label id, in the order the ids were given. Averages are `0` without matches.
    pub labels: IndexMap<u64, Detection>,
}

pub fn detection_scores(
    truth: &[u64],
    test: &[u64],
    shape: &[usize],
    label_ids: &[u64],
    options: &DetectionOptions,
) -> Result<DetectionScores> {
    if truth.len() != test.len() {
        return Err(Error::LengthMismatch {
            truth: truth.len(),
            test: test.len(),
        });
    }
    let grid = Grid::new(shape, truth.len())?;
    let scale = match &options.voxel_size {
        Some(size) if size.len() != shape.len() => {
            return Err(Error::VoxelSizeMismatch {
                dims: shape.len(),
                len: size.len(),
            });
        }
        Some(size) => size.clone(),
        None => vec![1.0; shape.len()],
    };

    let mut labels = IndexMap::with_capacity(label_ids.len());
    let mut total = Detection::default();
    let (mut distance_sum, mut iou_sum) = (0.0, 0.0);
    for &label in label_ids {
        if labels.contains_key(&label) {
            continue;
        }
        let scores = score_label(&grid, truth, test, label, &scale, options);
        tracing::debug!(
            label,
            tp = scores.tp,
            fp = scores.fp,
            fn_ = scores.fn_,
            "scored label"
        );
        total.tp += scores.tp;
        total.fp += scores.fp;
        total.fn_ += scores.fn_;
        distance_sum += scores.avg_distance * scores.tp as f64;
        iou_sum += scores.avg_iou * scores.tp as f64;
        labels.insert(label, scores);
    }

    if total.tp > 0 {
        total.avg_distance = distance_sum / total.tp as f64;
        total.avg_iou = iou_sum / total.tp as f64;
    } else {
        total.avg_distance = f64::NAN;
        total.avg_iou = f64::NAN;
    }
    Ok(DetectionScores { total, labels })
}

fn score_label(
    grid: &Grid,
    truth: &[u64],
    test: &[u64],
    label: u64,
    scale: &[f64],
    options: &DetectionOptions,
) -> Detection {
    let found = Components::extract(grid, |ix| test[ix] == label, scale);
    let expected = Components::extract(grid, |ix| truth[ix] == label, scale);
    let (n_test, n_true) = (found.count(), expected.count());

    // Row 0 and column 0 stand for background, so that a component may stay unmatched.
    let (rows, cols) = (n_test + 1, n_true + 1);
    let at = |a: usize, b: usize| a * cols + b;

    let mut overlaps = vec![0.0; rows * cols];
    for (&a, &b) in found.labels.iter().zip(&expected.labels) {
        if a > 0 && b > 0 {
            overlaps[at(a, b)] += 1.0;
        }
    }

    let mut ious = vec![0.0; rows * cols];
    for a in 1..rows {
        for b in 1..cols {
            let shared = overlaps[at(a, b)];
            if shared > 0.0 {
                let union = (found.sizes[a - 1] + expected.sizes[b - 1]) as f64 - shared;
                ious[at(a, b)] = shared / union;
            }
        }
    }

    let mut distances = vec![1.0; rows * cols];
    if n_test > 0 && n_true > 0 {
        let mut max = 0.0f64;
        for a in 1..rows {
            for b in 1..cols {
                let d = center_distance(&found.centers[a - 1], &expected.centers[b - 1]);
                distances[at(a, b)] = d;
                max = max.max(d);
            }
        }
        for a in 0..rows {
            distances[at(a, 0)] = max * 10.0;
        }
        for b in 1..cols {
            distances[at(0, b)] = max * 10.0;
        }
    }

    let score = options.matching_score;
    let scores = match score {
        MatchingScore::Overlap => &overlaps,
        MatchingScore::Iou => &ious,
        MatchingScore::Distance => &distances,
    };
    let matches: Vec<(usize, usize)> = assign(scores, rows, cols, score.maximize())
        .into_iter()
        .filter(|&(a, b)| {
            a > 0 && b > 0 && score.accepts(scores[at(a, b)], options.matching_threshold)
        })
        .collect();

    let tp = matches.len();
    let mean = |values: &[f64]| {
        if tp == 0 {
            0.0
        } else {
            matches.iter().map(|&(a, b)| values[at(a, b)]).sum::<f64>() / tp as f64
        }
    };
    Detection {
        tp,
        fp: n_test - tp,
        fn_: n_true - tp,
        avg_distance: mean(distances.as_slice()),
        avg_iou: mean(ious.as_slice()),
    }
}

/// Optimal one-to-one assignment on the `rows x cols` score matrix, as `(row, col)` pairs.
///
/// Scores are rescaled to integers for the solver, which needs at least as many columns as
/// rows; taller matrices are solved transposed.
fn assign(scores: &[f64], rows: usize, cols: usize, maximize: bool) -> Vec<(usize, usize)> {
    let peak = scores.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    let unit = if peak > 0.0 { WEIGHT_RANGE / peak } else { 1.0 };
    let weight = |s: f64| {
        let w = (s * unit).round() as i64;
        if maximize { w } else { -w }
    };

    let transposed = rows > cols;
    let (r, c) = if transposed { (cols, rows) } else { (rows, cols) };
    let mut weights = Matrix::new(r, c, 0i64);
    for i in 0..rows {
        for j in 0..cols {
            let cell = if transposed { (j, i) } else { (i, j) };
            weights[cell] = weight(scores[i * cols + j]);
        }
    }

    let (_, assignment) = kuhn_munkres(&weights);
    assignment
        .into_iter()
        .enumerate()
        .map(|(i, j)| if transposed { (j, i) } else { (i, j) })
        .collect()
}

fn center_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug)]
struct Grid {
    shape: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl Grid {
    fn new(shape: &[usize], len: usize) -> Result<Self> {
        if shape.is_empty() || shape.iter().product::<usize>() != len {
            return Err(Error::ShapeMismatch {
                shape: shape.to_vec(),
                len,
            });
        }
        let mut strides = vec![1; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Ok(Self {
            shape: shape.to_vec(),
            strides,
            len,
        })
    }

    fn coord(&self, ix: usize, axis: usize) -> usize {
        (ix / self.strides[axis]) % self.shape[axis]
    }
}

/// Face-connected components of a mask, numbered from 1 in scan order of their first element.
#[derive(Debug)]
struct Components {
    /// Component of every element, `0` outside the mask.
    labels: Vec<usize>,
    sizes: Vec<usize>,
    centers: Vec<Vec<f64>>,
}

impl Components {
    fn extract(grid: &Grid, mask: impl Fn(usize) -> bool, scale: &[f64]) -> Self {
        let mut sets = UnionFind::<usize>::new(grid.len);
        for ix in 0..grid.len {
            if !mask(ix) {
                continue;
            }
            for (axis, &stride) in grid.strides.iter().enumerate() {
                if grid.coord(ix, axis) > 0 && mask(ix - stride) {
                    sets.union(ix, ix - stride);
                }
            }
        }

        let dims = grid.shape.len();
        let mut by_root: FxHashMap<usize, usize> = FxHashMap::default();
        let mut labels = vec![0; grid.len];
        let mut sizes: Vec<usize> = Vec::new();
        let mut sums: Vec<Vec<f64>> = Vec::new();
        for (ix, label) in labels.iter_mut().enumerate() {
            if !mask(ix) {
                continue;
            }
            let next = sizes.len() + 1;
            let component = *by_root.entry(sets.find(ix)).or_insert(next);
            if component == next {
                sizes.push(0);
                sums.push(vec![0.0; dims]);
            }
            *label = component;
            sizes[component - 1] += 1;
            for (axis, sum) in sums[component - 1].iter_mut().enumerate() {
                *sum += grid.coord(ix, axis) as f64;
            }
        }

        let centers = sums
            .into_iter()
            .zip(&sizes)
            .map(|(sum, &size)| {
                sum.into_iter()
                    .zip(scale)
                    .map(|(s, &voxel)| s / size as f64 * voxel)
                    .collect()
            })
            .collect();
        Self {
            labels,
            sizes,
            centers,
        }
    }

    fn count(&self) -> usize {
        self.sizes.len()
    }
}
