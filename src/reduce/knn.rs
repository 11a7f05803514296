use rayon::prelude::*;

/// A neighbor and its Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

#[inline]
fn sq_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Exact k nearest neighbors of every row, self excluded.
///
/// Rows are searched in parallel; output order follows row order and each list
/// is sorted by (distance, index), so the result is deterministic.
/// `k` is clamped to `rows.len() - 1`.
pub fn k_nearest(rows: &[Vec<f64>], k: usize) -> Vec<Vec<Neighbor>> {
    let n = rows.len();
    let k = k.min(n.saturating_sub(1));
    (0..n)
        .into_par_iter()
        .map(|i| {
            if k == 0 {
                return Vec::new();
            }
            let mut cand: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (sq_distance(&rows[i], &rows[j]), j))
                .collect();
            let order = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
            if cand.len() > k {
                cand.select_nth_unstable_by(k - 1, order);
                cand.truncate(k);
            }
            cand.sort_unstable_by(order);
            cand.into_iter()
                .map(|(d2, index)| Neighbor {
                    index,
                    distance: d2.sqrt(),
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_on_a_line() {
        let rows: Vec<Vec<f64>> = [0.0, 1.0, 3.0, 7.0].iter().map(|&x| vec![x]).collect();
        let knn = k_nearest(&rows, 2);
        let idx: Vec<Vec<usize>> = knn.iter().map(|l| l.iter().map(|n| n.index).collect()).collect();
        assert_eq!(idx, vec![vec![1, 2], vec![0, 2], vec![1, 0], vec![2, 1]]);
        assert_eq!(knn[3][0].distance, 4.0);
    }

    #[test]
    fn ties_break_by_index_and_k_is_clamped() {
        let rows = vec![vec![0.0], vec![1.0], vec![-1.0]];
        let knn = k_nearest(&rows, 10);
        assert_eq!(knn[0].iter().map(|n| n.index).collect::<Vec<_>>(), vec![1, 2]);
        assert!(k_nearest(&rows[..1], 5)[0].is_empty());
    }
}
