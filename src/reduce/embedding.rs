use std::collections::BTreeMap;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::reduce::knn::{k_nearest, Neighbor};
use crate::reduce::{ensure_finite, rows_of, Projector};

const SMOOTH_K_ITERATIONS: usize = 64;
const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const GRADIENT_CLIP: f64 = 4.0;
const SPREAD: f64 = 1.0;
const INIT_EXTENT: f64 = 10.0;

/// 2D neighbor-graph embedding in the UMAP family.
///
/// A fuzzy k-nearest-neighbor graph is built in the input space, then a 2D
/// layout is optimized by SGD so that graph neighbors attract and random
/// pairs repel.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborEmbedding {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub epochs: usize,
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for NeighborEmbedding {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}

impl NeighborEmbedding {
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self {
            n_neighbors: config.n_neighbors,
            min_dist: config.min_dist,
            epochs: config.epochs,
            negative_samples: config.negative_samples,
            seed: config.seed,
        }
    }
}

/// Per-point (rho, sigma) so that the membership strengths of its neighbors
/// sum to `log2(k)`.
fn smooth_knn(neighbors: &[Neighbor]) -> (f64, f64) {
    let rho = neighbors
        .iter()
        .map(|n| n.distance)
        .find(|&d| d > 0.0)
        .unwrap_or(0.0);
    let target = (neighbors.len() as f64).log2();

    let (mut lo, mut hi, mut sigma) = (0.0, f64::INFINITY, 1.0);
    for _ in 0..SMOOTH_K_ITERATIONS {
        let psum: f64 = neighbors
            .iter()
            .map(|n| (-(n.distance - rho).max(0.0) / sigma).exp())
            .sum();
        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            sigma = if hi.is_infinite() { sigma * 2.0 } else { (lo + hi) / 2.0 };
        }
    }
    (rho, sigma.max(f64::MIN_POSITIVE))
}

/// Symmetric fuzzy graph as (i, j, weight) with i < j.
fn fuzzy_graph(knn: &[Vec<Neighbor>]) -> Vec<(usize, usize, f64)> {
    let mut directed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (i, neighbors) in knn.iter().enumerate() {
        let (rho, sigma) = smooth_knn(neighbors);
        for n in neighbors {
            let w = (-(n.distance - rho).max(0.0) / sigma).exp();
            directed.insert((i, n.index), w);
        }
    }

    // fuzzy union: a + b - a * b
    let mut undirected: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(i, j), &w) in &directed {
        let key = (i.min(j), i.max(j));
        undirected
            .entry(key)
            .and_modify(|acc| *acc = *acc + w - *acc * w)
            .or_insert(w);
    }
    undirected.into_iter().map(|((i, j), w)| (i, j, w)).collect()
}

/// Fit `1 / (1 + a * d^(2b))` to the target low-dimensional similarity curve.
fn fit_curve(min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (1..=300).map(|i| i as f64 * 3.0 * SPREAD / 300.0).collect();
    let target = |x: f64| {
        if x < min_dist {
            1.0
        } else {
            (-(x - min_dist) / SPREAD).exp()
        }
    };
    let mut best = (1.577, 0.895, f64::INFINITY);
    for ai in 1..=60 {
        let a = ai as f64 * 0.05;
        for bi in 1..=40 {
            let b = 0.3 + bi as f64 * 0.04;
            let err: f64 = xs
                .iter()
                .map(|&x| {
                    let y = 1.0 / (1.0 + a * x.powf(2.0 * b));
                    (y - target(x)).powi(2)
                })
                .sum();
            if err < best.2 {
                best = (a, b, err);
            }
        }
    }
    (best.0, best.1)
}

/// First two input columns rescaled to `[0, INIT_EXTENT]`, plus jitter.
fn initial_layout(data: &DMatrix<f64>, rng: &mut StdRng) -> Vec<[f64; 2]> {
    let n = data.nrows();
    let mut layout = vec![[0.0; 2]; n];
    for dim in 0..2 {
        if dim < data.ncols() {
            let col = data.column(dim);
            let (min, max) = (col.min(), col.max());
            let span = if max > min { max - min } else { 1.0 };
            for (i, p) in layout.iter_mut().enumerate() {
                p[dim] = (col[i] - min) / span * INIT_EXTENT;
            }
        } else {
            for p in layout.iter_mut() {
                p[dim] = rng.gen_range(0.0..INIT_EXTENT);
            }
        }
    }
    for p in layout.iter_mut() {
        p[0] += rng.gen_range(-1e-4..1e-4);
        p[1] += rng.gen_range(-1e-4..1e-4);
    }
    layout
}

#[inline]
fn clip(v: f64) -> f64 {
    v.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

impl NeighborEmbedding {
    fn optimize(
        &self,
        layout: &mut [[f64; 2]],
        edges: &[(usize, usize, f64)],
        (a, b): (f64, f64),
        rng: &mut StdRng,
    ) {
        let n = layout.len();
        let max_w = edges.iter().map(|e| e.2).fold(0.0, f64::max);
        if max_w <= 0.0 || self.epochs == 0 {
            return;
        }
        // weak edges would be sampled less than once over the whole run
        let edges: Vec<(usize, usize, f64)> = edges
            .iter()
            .copied()
            .filter(|e| e.2 >= max_w / self.epochs as f64)
            .collect();
        let per_sample: Vec<f64> = edges.iter().map(|e| max_w / e.2).collect();
        let mut next_sample = per_sample.clone();

        for epoch in 0..self.epochs {
            let alpha = 1.0 - epoch as f64 / self.epochs as f64;
            for (e, &(i, j, _)) in edges.iter().enumerate() {
                if next_sample[e] > (epoch + 1) as f64 {
                    continue;
                }
                next_sample[e] += per_sample[e];

                for (head, tail) in [(i, j), (j, i)] {
                    let diff = [layout[head][0] - layout[tail][0], layout[head][1] - layout[tail][1]];
                    let d2 = diff[0] * diff[0] + diff[1] * diff[1];
                    if d2 > 0.0 {
                        let coeff = -2.0 * a * b * d2.powf(b - 1.0) / (1.0 + a * d2.powf(b));
                        for k in 0..2 {
                            let g = clip(coeff * diff[k]) * alpha;
                            layout[head][k] += g;
                            layout[tail][k] -= g;
                        }
                    }

                    for _ in 0..self.negative_samples {
                        let other = rng.gen_range(0..n);
                        if other == head {
                            continue;
                        }
                        let diff = [
                            layout[head][0] - layout[other][0],
                            layout[head][1] - layout[other][1],
                        ];
                        let d2 = diff[0] * diff[0] + diff[1] * diff[1];
                        let coeff = if d2 > 0.0 {
                            2.0 * b / ((0.001 + d2) * (1.0 + a * d2.powf(b)))
                        } else {
                            0.0
                        };
                        for k in 0..2 {
                            let g = if coeff > 0.0 { clip(coeff * diff[k]) } else { GRADIENT_CLIP };
                            layout[head][k] += g * alpha;
                        }
                    }
                }
            }
        }
    }
}

impl Projector for NeighborEmbedding {
    fn project(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let n = data.nrows();
        if n <= 1 {
            return Ok(DMatrix::zeros(n, 2));
        }
        let knn = k_nearest(&rows_of(data), self.n_neighbors);
        let edges = fuzzy_graph(&knn);
        let curve = fit_curve(self.min_dist);
        debug!(edges = edges.len(), a = curve.0, b = curve.1, "fuzzy graph built");

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut layout = initial_layout(data, &mut rng);
        self.optimize(&mut layout, &edges, curve, &mut rng);

        let out = DMatrix::from_fn(n, 2, |i, k| layout[i][k]);
        ensure_finite("projection", &out)?;
        Ok(out)
    }
}
