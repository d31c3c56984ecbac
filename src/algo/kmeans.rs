/// Parameters for [`kmeans`].
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters.
    pub k: usize,
    /// Maximum Lloyd iterations per run.
    pub max_iter: usize,
    /// Independent k-means++ restarts; lowest inertia wins.
    pub n_init: usize,
    /// Convergence threshold, relative to the mean per-feature variance.
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iter: 300,
            n_init: 10,
            tolerance: 1e-4,
            seed: 7,
        }
    }
}

/// Result of k-means.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster of each point, numbered by first appearance (point 0 is in
    /// cluster 0, the next new cluster seen is 1, ...).
    pub labels: Vec<usize>,
    /// Centroids, indexed like `labels`.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Lloyd iterations of the winning run.
    pub iterations: usize,
}

/// Centroid-based partitioning (Lloyd's algorithm, k-means++ seeding).
///
/// Deterministic for a given `seed`. `k` is clamped to the number of points.
pub fn kmeans(points: &[Vec<f64>], config: &KMeansConfig) -> KMeansResult {
    let n = points.len();
    let k = config.k.min(n);
    if n == 0 || k == 0 {
        return KMeansResult {
            labels: vec![0; n],
            centroids: vec![],
            inertia: 0.0,
            iterations: 0,
        };
    }

    let tol = config.tolerance * mean_variance(points);
    let run = |r: usize| {
        let mut rng = LcgRng::new(config.seed.wrapping_add(r as u64));
        lloyd(points, kmeans_plus_plus(points, k, &mut rng), config.max_iter, tol)
    };

    let mut best = run(0);
    for r in 1..config.n_init {
        let candidate = run(r);
        if candidate.inertia < best.inertia {
            best = candidate;
        }
    }

    canonicalize(&mut best);
    best
}

fn lloyd(points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansResult {
    let k = centroids.len();
    let dim = points[0].len();
    let mut labels = assign(points, &centroids);
    let mut iterations = 0;

    for _ in 0..max_iter {
        iterations += 1;

        let mut sums = vec![vec![0.0f64; dim]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(&labels) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(p) {
                *s += x;
            }
        }

        let mut updated: Vec<Vec<f64>> = sums
            .into_iter()
            .zip(&counts)
            .map(|(s, &c)| {
                if c == 0 {
                    s
                } else {
                    s.into_iter().map(|x| x / c as f64).collect()
                }
            })
            .collect();
        relocate_empty(points, &labels, &centroids, &counts, &mut updated);

        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = updated;
        labels = assign(points, &centroids);

        if shift <= tol {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    KMeansResult {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Empty clusters take over the points farthest from their current centroid.
fn relocate_empty(
    points: &[Vec<f64>],
    labels: &[usize],
    old: &[Vec<f64>],
    counts: &[usize],
    updated: &mut [Vec<f64>],
) {
    let empty: Vec<usize> = (0..counts.len()).filter(|&c| counts[c] == 0).collect();
    if empty.is_empty() {
        return;
    }
    let mut far: Vec<(usize, f64)> = points
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (p, &l))| (i, squared_distance(p, &old[l])))
        .collect();
    far.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    for (cluster, (idx, _)) in empty.into_iter().zip(far) {
        updated[cluster] = points[idx].clone();
    }
}

fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut LcgRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    chosen.push(rng.next() as usize % n);
    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &points[chosen[0]]))
        .collect();

    while chosen.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.next_f64() * total;
            let mut acc = 0.0;
            let mut pick = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                acc += d;
                if acc > target && d > 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // Every point coincides with a center already.
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        };
        chosen.push(next);
        for (c, p) in closest.iter_mut().zip(points) {
            *c = c.min(squared_distance(p, &points[next]));
        }
    }

    chosen.into_iter().map(|i| points[i].clone()).collect()
}

/// Nearest centroid per point; ties go to the lower index.
fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = squared_distance(p, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

/// Renumber clusters by first appearance and drop centroids no point uses.
fn canonicalize(result: &mut KMeansResult) {
    let mut mapping: Vec<Option<usize>> = vec![None; result.centroids.len()];
    let mut order: Vec<usize> = Vec::new();
    for l in result.labels.iter_mut() {
        let new = *mapping[*l].get_or_insert_with(|| {
            order.push(*l);
            order.len() - 1
        });
        *l = new;
    }
    result.centroids = order.iter().map(|&old| result.centroids[old].clone()).collect();
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_variance(points: &[Vec<f64>]) -> f64 {
    let n = points.len() as f64;
    let dim = points[0].len();
    if dim == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for j in 0..dim {
        let mean = points.iter().map(|p| p[j]).sum::<f64>() / n;
        total += points.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dim as f64
}

/// Simple Linear Congruential Generator for deterministic seeding.
struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        Self { state: seed.wrapping_add(1) }
    }

    fn next(&mut self) -> u64 {
        // LCG constants from Numerical Recipes
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in [0, 1).
    fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.2],
            vec![-10.0, 10.0],
            vec![10.2, 9.9],
            vec![0.2, 0.1],
            vec![-9.8, 10.1],
            vec![9.9, 10.1],
            vec![-10.1, 9.9],
        ]
    }

    #[test]
    fn separates_three_blobs() {
        let r = kmeans(&blobs(), &KMeansConfig::default());
        assert_eq!(r.labels, vec![0, 1, 0, 2, 1, 0, 2, 1, 2]);
        assert_eq!(r.centroids.len(), 3);
        assert!(r.inertia < 1.0);
    }

    #[test]
    fn deterministic_for_seed() {
        let config = KMeansConfig {
            seed: 42,
            ..Default::default()
        };
        let a = kmeans(&blobs(), &config);
        let b = kmeans(&blobs(), &config);
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn labels_numbered_by_first_appearance() {
        let r = kmeans(&blobs(), &KMeansConfig::default());
        assert_eq!(r.labels[0], 0);
        let mut max_seen = 0;
        for &l in &r.labels {
            assert!(l <= max_seen + 1);
            max_seen = max_seen.max(l);
        }
    }

    #[test]
    fn identical_points_do_not_panic() {
        let points = vec![vec![1.0, 0.0]; 4];
        let r = kmeans(&points, &KMeansConfig::default());
        assert_eq!(r.labels.len(), 4);
        assert!(r.inertia.abs() < 1e-12);
    }

    #[test]
    fn k_clamped_to_point_count() {
        let points = vec![vec![0.0], vec![5.0]];
        let r = kmeans(&points, &KMeansConfig::default());
        assert_eq!(r.labels, vec![0, 1]);
    }

    #[test]
    fn empty_input() {
        let r = kmeans(&[], &KMeansConfig::default());
        assert!(r.labels.is_empty());
        assert!(r.centroids.is_empty());
    }

    #[test]
    fn single_cluster() {
        let config = KMeansConfig {
            k: 1,
            ..Default::default()
        };
        let r = kmeans(&blobs(), &config);
        assert!(r.labels.iter().all(|&l| l == 0));
    }
}
