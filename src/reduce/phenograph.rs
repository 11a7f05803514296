use std::collections::HashMap;

use nalgebra::DMatrix;
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::error::Result;
use crate::reduce::knn::k_nearest;
use crate::reduce::{rows_of, Clusterer};

const MAX_LEVELS: usize = 32;
const MAX_SWEEPS: usize = 100;
const MIN_GAIN: f64 = 1e-12;

/// Graph-community clustering in the Phenograph style.
///
/// kNN graph, Jaccard overlap of neighbor sets as edge weight, Louvain
/// modularity optimization. Labels are renumbered so that cluster 0 is the
/// largest.
#[derive(Debug, Clone, PartialEq)]
pub struct Phenograph {
    pub k: usize,
}

impl Default for Phenograph {
    fn default() -> Self {
        Self::from_config(&ClusteringConfig::default())
    }
}

impl Phenograph {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.k)
    }
}

/// Weighted undirected graph, symmetric adjacency lists.
/// A self loop `(i, i, w)` appears once in the list of `i`.
#[derive(Debug, Clone)]
struct Graph {
    adj: Vec<Vec<(usize, f64)>>,
}

impl Graph {
    fn n_nodes(&self) -> usize {
        self.adj.len()
    }

    fn degree(&self, node: usize) -> f64 {
        self.adj[node].iter().map(|&(_, w)| w).sum()
    }

    /// Jaccard-weighted kNN graph
    fn jaccard(data: &DMatrix<f64>, k: usize) -> Self {
        let n = data.nrows();
        let knn = k_nearest(&rows_of(data), k);
        // neighbor sets including the point itself, sorted
        let sets: Vec<Vec<usize>> = knn
            .iter()
            .enumerate()
            .map(|(i, neighbors)| {
                let mut s: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
                s.push(i);
                s.sort_unstable();
                s
            })
            .collect();

        let mut weights: HashMap<(usize, usize), f64> = HashMap::new();
        for (i, neighbors) in knn.iter().enumerate() {
            for n in neighbors {
                let j = n.index;
                let shared = intersection_len(&sets[i], &sets[j]);
                let union = sets[i].len() + sets[j].len() - shared;
                let w = shared as f64 / union as f64;
                if w > 0.0 {
                    // each direction contributes half, mutual neighbors sum to the mean
                    *weights.entry((i.min(j), i.max(j))).or_insert(0.0) += w / 2.0;
                }
            }
        }

        let mut adj = vec![Vec::new(); n];
        let mut edges: Vec<((usize, usize), f64)> = weights.into_iter().collect();
        edges.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for ((i, j), w) in edges {
            adj[i].push((j, w));
            adj[j].push((i, w));
        }
        Self { adj }
    }

    /// Collapse every community into one node.
    fn aggregate(&self, community: &[usize], n_communities: usize) -> Self {
        let mut merged: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n_communities];
        for (node, edges) in self.adj.iter().enumerate() {
            let c = community[node];
            for &(other, w) in edges {
                *merged[c].entry(community[other]).or_insert(0.0) += w;
            }
        }
        let adj = merged
            .into_iter()
            .map(|m| {
                let mut edges: Vec<(usize, f64)> = m.into_iter().collect();
                edges.sort_unstable_by_key(|e| e.0);
                edges
            })
            .collect();
        Self { adj }
    }
}

fn intersection_len(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

/// One level of local moves. Returns the dense community index of every node
/// and whether any node moved.
fn local_moves(graph: &Graph) -> (Vec<usize>, bool) {
    let n = graph.n_nodes();
    let degree: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let m2: f64 = degree.iter().sum();
    let mut community: Vec<usize> = (0..n).collect();
    if m2 <= 0.0 {
        return (community, false);
    }
    let mut total: Vec<f64> = degree.clone();
    let mut links: HashMap<usize, f64> = HashMap::new();
    let mut moved_any = false;

    for _ in 0..MAX_SWEEPS {
        let mut moved = false;
        for node in 0..n {
            let current = community[node];
            links.clear();
            for &(other, w) in &graph.adj[node] {
                if other != node {
                    *links.entry(community[other]).or_insert(0.0) += w;
                }
            }
            total[current] -= degree[node];

            let gain = |c: usize, k_in: f64| k_in - total[c] * degree[node] / m2;
            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
            let mut candidates: Vec<(usize, f64)> = links.iter().map(|(&c, &w)| (c, w)).collect();
            candidates.sort_unstable_by_key(|c| c.0);
            for (c, k_in) in candidates {
                let g = gain(c, k_in);
                if g > best_gain + MIN_GAIN {
                    best = c;
                    best_gain = g;
                }
            }

            total[best] += degree[node];
            if best != current {
                community[node] = best;
                moved = true;
            }
        }
        if !moved {
            break;
        }
        moved_any = true;
    }

    // renumber densely in first-seen order
    let mut remap: HashMap<usize, usize> = HashMap::new();
    for c in community.iter_mut() {
        let next = remap.len();
        *c = *remap.entry(*c).or_insert(next);
    }
    (community, moved_any)
}

/// Multilevel Louvain. Returns a community index per original node.
fn louvain(graph: Graph) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..graph.n_nodes()).collect();
    let mut graph = graph;
    for level in 0..MAX_LEVELS {
        let (community, moved) = local_moves(&graph);
        if !moved {
            break;
        }
        for m in membership.iter_mut() {
            *m = community[*m];
        }
        let n_communities = community.iter().max().map_or(0, |&c| c + 1);
        debug!(level, communities = n_communities, "louvain level");
        graph = graph.aggregate(&community, n_communities);
    }
    membership
}

/// Largest community first; ties go to the one whose first member comes first.
fn relabel_by_size(membership: &[usize]) -> Vec<usize> {
    let n_communities = membership.iter().max().map_or(0, |&c| c + 1);
    let mut size = vec![0usize; n_communities];
    let mut first = vec![usize::MAX; n_communities];
    for (node, &c) in membership.iter().enumerate() {
        size[c] += 1;
        first[c] = first[c].min(node);
    }
    let mut order: Vec<usize> = (0..n_communities).collect();
    order.sort_by(|&a, &b| size[b].cmp(&size[a]).then(first[a].cmp(&first[b])));
    let mut label = vec![0usize; n_communities];
    for (new, &old) in order.iter().enumerate() {
        label[old] = new;
    }
    membership.iter().map(|&c| label[c]).collect()
}

impl Clusterer for Phenograph {
    fn cluster(&self, data: &DMatrix<f64>) -> Result<Vec<usize>> {
        let n = data.nrows();
        if n <= 1 {
            return Ok(vec![0; n]);
        }
        let graph = Graph::jaccard(data, self.k);
        let labels = relabel_by_size(&louvain(graph));
        let n_clusters = labels.iter().max().map_or(0, |&c| c + 1);
        debug!(points = n, clusters = n_clusters, "phenograph done");
        Ok(labels)
    }
}
