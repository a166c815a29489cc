//! Streaming quantile histogram.
//!
//! A bin-merging sketch in the style of Ben-Haim and Tom-Tov: at most
//! `max_bins` `(value, count)` centroids, merging the two closest centroids
//! by count-weighted averaging whenever an update would exceed the bound.
//! `uniform(n)` synthesizes approximately equi-count quantiles from the
//! centroid trapezoid; the grid uses those as per-axis bucket bounds.

/// One merged centroid.
#[derive(Debug, Clone, Copy)]
struct Centroid {
    value: f64,
    count: f64,
}

/// Bin-merging streaming histogram over a single axis.
#[derive(Debug, Clone)]
pub struct Histogram {
    max_bins: usize,
    // Sorted by value.
    bins: Vec<Centroid>,
    min: f64,
    max: f64,
    total: u64,
}

impl Histogram {
    pub fn with_max_bins(max_bins: usize) -> Histogram {
        Histogram {
            max_bins: max_bins.max(2),
            bins: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            total: 0,
        }
    }

    /// Observed minimum, or `None` before the first update.
    pub fn min(&self) -> Option<f64> {
        (self.total > 0).then_some(self.min)
    }

    /// Observed maximum, or `None` before the first update.
    pub fn max(&self) -> Option<f64> {
        (self.total > 0).then_some(self.max)
    }

    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Fold one observation into the sketch.
    pub fn update(&mut self, x: f64) {
        self.total += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        let idx = self.bins.partition_point(|c| c.value < x);
        if idx < self.bins.len() && self.bins[idx].value == x {
            self.bins[idx].count += 1.0;
            return;
        }
        self.bins.insert(
            idx,
            Centroid {
                value: x,
                count: 1.0,
            },
        );
        if self.bins.len() > self.max_bins {
            self.merge_closest();
        }
    }

    fn merge_closest(&mut self) {
        let mut best = 0;
        let mut best_gap = f64::INFINITY;
        for i in 0..self.bins.len() - 1 {
            let gap = self.bins[i + 1].value - self.bins[i].value;
            if gap < best_gap {
                best_gap = gap;
                best = i;
            }
        }
        let a = self.bins[best];
        let b = self.bins[best + 1];
        let count = a.count + b.count;
        self.bins[best] = Centroid {
            value: (a.value * a.count + b.value * b.count) / count,
            count,
        };
        self.bins.remove(best + 1);
    }

    /// `n` approximately equi-count quantiles: the values at cumulative
    /// frequencies `(j+1)/n` for `j in 0..n`. The result is non-decreasing
    /// and ends at the observed maximum.
    pub fn uniform(&self, n: usize) -> Vec<f64> {
        if n == 0 || self.total == 0 {
            return Vec::new();
        }
        if self.min == self.max || self.bins.len() == 1 {
            return vec![self.max; n];
        }

        // Centroid walk with zero-count sentinels pinned to the observed
        // extrema, so the trapezoid covers the full value range.
        let mut pts: Vec<Centroid> = Vec::with_capacity(self.bins.len() + 2);
        if self.bins[0].value > self.min {
            pts.push(Centroid {
                value: self.min,
                count: 0.0,
            });
        }
        pts.extend(self.bins.iter().copied());
        if pts.last().map(|c| c.value) < Some(self.max) {
            pts.push(Centroid {
                value: self.max,
                count: 0.0,
            });
        }

        // Cumulative mass at each centroid: everything before it plus half
        // of its own count.
        let mut cum = Vec::with_capacity(pts.len());
        let mut acc = 0.0;
        for c in &pts {
            cum.push(acc + c.count / 2.0);
            acc += c.count;
        }
        let total = acc;

        let mut out = Vec::with_capacity(n);
        let mut seg = 0;
        for j in 0..n {
            let target = total * (j as f64 + 1.0) / n as f64;
            if target >= cum[pts.len() - 1] {
                out.push(self.max);
                continue;
            }
            while seg + 1 < pts.len() && cum[seg + 1] < target {
                seg += 1;
            }
            let (a, b) = (pts[seg], pts[seg + 1]);
            let d = (target - cum[seg]).max(0.0);
            // Mass between the centroids grows as
            // c_a*z + (c_b-c_a)*z^2/2 for z in [0,1]; invert for z.
            let z = if (b.count - a.count).abs() < f64::EPSILON {
                if a.count <= 0.0 {
                    1.0
                } else {
                    d / a.count
                }
            } else {
                let disc = a.count * a.count + 2.0 * (b.count - a.count) * d;
                (disc.max(0.0).sqrt() - a.count) / (b.count - a.count)
            };
            let z = z.clamp(0.0, 1.0);
            let q = a.value + (b.value - a.value) * z;
            // Guard against floating jitter between segments.
            match out.last() {
                Some(&prev) if q < prev => out.push(prev),
                _ => out.push(q),
            }
        }
        out
    }
}
