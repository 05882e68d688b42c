//! ASCII histogram for terminal output.
//!
//! Fixed-size character grid, deterministic output (helpful for golden tests).
//!
//! Plot elements:
//! - bin counts: `#` bars, bottom-aligned
//! - optional marker (e.g. the median): `|` in empty cells above the bars

/// Binned counts over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin finite `values` into `bins` equal-width bins. The last bin is closed.
    ///
    /// Returns `None` if there are no finite values.
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        let bins = bins.max(1);
        let (min, max) = value_range(values)?;
        let (min, max) = if max > min { (min, max) } else { pad_range(min, max, 0.5) };

        let mut counts = vec![0usize; bins];
        for &v in values.iter().filter(|v| v.is_finite()) {
            counts[bin_index(v, min, max, bins)] += 1;
        }
        Some(Self { min, max, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `[lo, hi)` edges of bin `i`.
    pub fn bin_edges(&self, i: usize) -> (f64, f64) {
        let step = (self.max - self.min) / self.counts.len() as f64;
        (self.min + step * i as f64, self.min + step * (i + 1) as f64)
    }
}

/// Render a histogram of `values`.
pub fn render_histogram(values: &[f64], bins: usize, width: usize, height: usize, marker: Option<f64>) -> String {
    match Histogram::new(values, bins) {
        Some(hist) => render_grid(&hist, width, height, marker),
        None => "Histogram: no finite values\n".to_string(),
    }
}

fn render_grid(hist: &Histogram, width: usize, height: usize, marker: Option<f64>) -> String {
    let bins = hist.counts.len();
    let width = width.max(bins).max(10);
    let height = height.max(3);
    let max_count = hist.max_count().max(1);

    let mut grid = vec![vec![' '; width]; height];

    for x in 0..width {
        let count = hist.counts[x * bins / width];
        let bar = bar_height(count, max_count, height);
        for row in grid.iter_mut().skip(height - bar) {
            row[x] = '#';
        }
    }

    if let Some(m) = marker.filter(|m| m.is_finite()) {
        let x = map_x(m, hist.min, hist.max, width);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = '|';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Histogram: x=[{:.3}, {:.3}] | n={} | bins={} | max count={}\n",
        hist.min,
        hist.max,
        hist.total(),
        bins,
        hist.max_count()
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v.is_finite() && max_v.is_finite() {
        Some((min_v, max_v))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(0.5);
    (min - pad, max + pad)
}

fn bin_index(v: f64, min: f64, max: f64, bins: usize) -> usize {
    let u = ((v - min) / (max - min)).clamp(0.0, 1.0);
    ((u * bins as f64).floor() as usize).min(bins - 1)
}

fn bar_height(count: usize, max_count: usize, height: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let rows = (count as f64 / max_count as f64 * height as f64).round() as usize;
    rows.clamp(1, height)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}
