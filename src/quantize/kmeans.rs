use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::quantize::params::ClusterOpts;

type Point = [f32; 3];

/// Representative colours produced by clustering one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Cluster centres rounded to 8-bit RGB, indexed by cluster label.
    pub colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// `true` when the palette has no entries.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the closest entry (squared RGB distance, ties resolve to the lowest index).
    pub fn nearest(&self, rgb: [u8; 3]) -> Option<usize> {
        let p = to_point(&rgb);
        let centers: Vec<Point> = self.colors.iter().map(to_point).collect();
        (!centers.is_empty()).then(|| nearest(&p, &centers).0)
    }
}

/// Result of the best k-means attempt.
#[derive(Clone, Debug)]
pub struct Clustering {
    /// Final palette.
    pub palette: Palette,
    /// Cluster label per input pixel.
    pub labels: Vec<u32>,
    /// Sum of squared distances from each pixel to its (unrounded) centre.
    pub compactness: f64,
}

/// Cluster packed RGB samples into at most `n_colors` colours.
///
/// Returns `None` when clustering is skipped: `n_colors == 0` or no pixels. `k` is clamped to the
/// pixel count.
pub fn cluster_rgb(rgb: &[u8], n_colors: u32, opts: &ClusterOpts) -> Option<Clustering> {
    let points: Vec<Point> = rgb
        .chunks_exact(3)
        .map(|c| [f32::from(c[0]), f32::from(c[1]), f32::from(c[2])])
        .collect();
    let k = (n_colors as usize).min(points.len());
    if k < 1 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut best: Option<Run> = None;
    for _ in 0..opts.attempts.max(1) {
        let run = run_once(&points, k, opts, &mut rng);
        if best.as_ref().is_none_or(|b| run.compactness < b.compactness) {
            best = Some(run);
        }
    }
    let best = best?;

    Some(Clustering {
        palette: Palette {
            colors: best.centers.iter().map(to_rgb8).collect(),
        },
        labels: best.labels,
        compactness: best.compactness,
    })
}

struct Run {
    centers: Vec<Point>,
    labels: Vec<u32>,
    compactness: f64,
}

fn run_once(points: &[Point], k: usize, opts: &ClusterOpts, rng: &mut StdRng) -> Run {
    let mut centers = init_plus_plus(points, k, rng);
    let mut labels = vec![0u32; points.len()];
    assign(points, &centers, &mut labels);

    for _ in 0..opts.max_iterations {
        let next = recompute_centers(points, &labels, &centers);
        let shift = centers
            .iter()
            .zip(&next)
            .map(|(a, b)| dist2(a, b))
            .fold(0.0f32, f32::max)
            .sqrt();
        centers = next;
        assign(points, &centers, &mut labels);
        if shift <= opts.epsilon {
            break;
        }
    }

    let compactness = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| f64::from(dist2(p, &centers[l as usize])))
        .sum();
    Run {
        centers,
        labels,
        compactness,
    }
}

/// k-means++ seeding: each new centre is drawn with probability proportional to its squared
/// distance from the closest existing centre.
fn init_plus_plus(points: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let n = points.len();
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.random_range(0..n)]);

    let mut d2: Vec<f64> = points
        .iter()
        .map(|p| f64::from(dist2(p, &centers[0])))
        .collect();

    while centers.len() < k {
        let total: f64 = d2.iter().sum();
        let idx = if total <= 0.0 {
            rng.random_range(0..n)
        } else {
            let mut target = rng.random::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in d2.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        };
        let c = points[idx];
        centers.push(c);
        for (d, p) in d2.iter_mut().zip(points) {
            *d = d.min(f64::from(dist2(p, &c)));
        }
    }
    centers
}

fn assign(points: &[Point], centers: &[Point], labels: &mut [u32]) {
    for (p, l) in points.iter().zip(labels.iter_mut()) {
        *l = nearest(p, centers).0 as u32;
    }
}

/// Mean of each cluster. An empty cluster takes over the point farthest from its current centre.
fn recompute_centers(points: &[Point], labels: &[u32], prev: &[Point]) -> Vec<Point> {
    let k = prev.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];
    for (p, &l) in points.iter().zip(labels) {
        let s = &mut sums[l as usize];
        s[0] += f64::from(p[0]);
        s[1] += f64::from(p[1]);
        s[2] += f64::from(p[2]);
        counts[l as usize] += 1;
    }

    let mut taken = vec![false; points.len()];
    let mut out = Vec::with_capacity(k);
    for j in 0..k {
        if counts[j] > 0 {
            let c = counts[j] as f64;
            out.push([
                (sums[j][0] / c) as f32,
                (sums[j][1] / c) as f32,
                (sums[j][2] / c) as f32,
            ]);
            continue;
        }

        let farthest = points
            .iter()
            .zip(labels)
            .enumerate()
            .filter(|(i, _)| !taken[*i])
            .map(|(i, (p, &l))| (i, dist2(p, &prev[l as usize])))
            .fold(None::<(usize, f32)>, |acc, cur| match acc {
                Some(a) if a.1 >= cur.1 => Some(a),
                _ => Some(cur),
            });
        match farthest {
            Some((i, _)) => {
                taken[i] = true;
                out.push(points[i]);
            }
            None => out.push(prev[j]),
        }
    }
    out
}

fn nearest(p: &Point, centers: &[Point]) -> (usize, f32) {
    let mut best = (0usize, f32::INFINITY);
    for (i, c) in centers.iter().enumerate() {
        let d = dist2(p, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn dist2(a: &Point, b: &Point) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn to_point(c: &[u8; 3]) -> Point {
    [f32::from(c[0]), f32::from(c[1]), f32::from(c[2])]
}

fn to_rgb8(c: &Point) -> [u8; 3] {
    c.map(|v| v.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
#[path = "../../tests/unit/quantize/kmeans.rs"]
mod tests;
