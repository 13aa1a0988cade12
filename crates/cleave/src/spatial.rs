//! Nearest-neighbor search over node positions.
//!
//! A static k-d tree stored implicitly: every slice `order[lo..hi]` is a subtree whose root is
//! the median element `order[(lo + hi) / 2]`, split on axis `depth % dim`.

use crate::error::{Error, Result};
use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the point set the tree was built from.
    pub index: usize,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<DVector<f64>>,
    order: Vec<usize>,
    dim: usize,
}

impl KdTree {
    /// Builds a tree over `points`. All points must share the same, non-zero dimension.
    pub fn build(points: Vec<DVector<f64>>) -> Result<Self> {
        let Some(first) = points.first() else {
            return Err(Error::DegenerateQuery {
                reason: "cannot index an empty point set",
            });
        };
        let dim = first.len();
        if dim == 0 {
            return Err(Error::DegenerateQuery {
                reason: "points have no coordinates",
            });
        }
        if points.iter().any(|p| p.len() != dim) {
            return Err(Error::DegenerateQuery {
                reason: "points have different dimensions",
            });
        }

        let mut tree = Self {
            order: (0..points.len()).collect(),
            points,
            dim,
        };
        tree.build_range(0, tree.order.len(), 0);
        Ok(tree)
    }

    fn build_range(&mut self, lo: usize, hi: usize, depth: usize) {
        if hi - lo <= 1 {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let axis = depth % self.dim;
        let points = &self.points;
        self.order[lo..hi].select_nth_unstable_by(mid - lo, |&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        });
        self.build_range(lo, mid, depth + 1);
        self.build_range(mid + 1, hi, depth + 1);
    }

    /// The closest indexed point to `query`. Among equidistant points the lowest index wins.
    pub fn nearest(&self, query: &DVector<f64>) -> Result<Neighbor> {
        if query.len() != self.dim {
            return Err(Error::DegenerateQuery {
                reason: "query dimension does not match the index",
            });
        }
        let mut best = (usize::MAX, f64::INFINITY);
        self.search(0, self.order.len(), 0, query, &mut best);
        Ok(Neighbor {
            index: best.0,
            distance: best.1.sqrt(),
        })
    }

    /// [`nearest`](Self::nearest) for every query, in query order.
    pub fn nearest_each(&self, queries: &[DVector<f64>]) -> Result<Vec<Neighbor>> {
        if queries.is_empty() {
            return Err(Error::DegenerateQuery {
                reason: "no query points",
            });
        }
        queries.iter().map(|q| self.nearest(q)).collect()
    }

    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        query: &DVector<f64>,
        best: &mut (usize, f64),
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let ix = self.order[mid];
        let point = &self.points[ix];

        let d2 = squared_distance(point, query);
        if d2 < best.1 || (d2 == best.1 && ix < best.0) {
            *best = (ix, d2);
        }
        if hi - lo == 1 {
            return;
        }

        let axis = depth % self.dim;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };
        self.search(near.0, near.1, depth + 1, query, best);
        // `<=` keeps equidistant candidates reachable for the index tie-break.
        if diff * diff <= best.1 {
            self.search(far.0, far.1, depth + 1, query, best);
        }
    }
}

fn squared_distance(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
