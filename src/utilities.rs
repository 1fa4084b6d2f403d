/// Numerical helpers shared by splines and cross section models

/// Index `i` of the interval with `x[i] <= x_new <= x[i + 1]`.
///
/// `x` must be sorted ascending with at least two points and `x_new` must lie
/// inside `[x[0], x[n-1]]`; callers check the domain first.
#[inline]
pub fn locate_interval(x: &[f64], x_new: f64) -> usize {
    let mut low = 0usize;
    let mut high = x.len() - 1; // invariant: target interval within [low, high]
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

/// Linear interpolation that refuses to extrapolate.
///
/// Returns `None` when `x_new` lies outside `[x[0], x[n-1]]` or fewer than
/// two points are given. Values at a grid point are returned exactly.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> Option<f64> {
    let n = x.len();
    if n < 2 || y.len() != n || !(x_new >= x[0] && x_new <= x[n - 1]) {
        return None;
    }
    if x_new == x[n - 1] {
        return Some(y[n - 1]);
    }
    let idx = locate_interval(x, x_new);
    let (x1, x2) = (x[idx], x[idx + 1]);
    let (y1, y2) = (y[idx], y[idx + 1]);
    if x_new == x1 {
        return Some(y1);
    }
    Some(y1 + (x_new - x1) * (y2 - y1) / (x2 - x1))
}

/// `n` points from `min` to `max` inclusive, evenly spaced.
pub fn linear_grid(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| min + step * i as f64).collect();
            grid[n - 1] = max;
            grid
        }
    }
}

/// `n` points from `min` to `max` inclusive, evenly spaced in log10.
/// Both ends must be positive.
pub fn log_grid(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let (lmin, lmax) = (min.log10(), max.log10());
            let step = (lmax - lmin) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n)
                .map(|i| 10f64.powf(lmin + step * i as f64))
                .collect();
            // pin the ends so the domain is exactly [min, max]
            grid[0] = min;
            grid[n - 1] = max;
            grid
        }
    }
}

/// Midpoint-rule integral of `f` over `[a, b]` with `n` panels.
pub fn integrate_midpoint<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, n: usize) -> f64 {
    if n == 0 || b <= a {
        return 0.0;
    }
    let h = (b - a) / n as f64;
    (0..n).map(|i| f(a + h * (i as f64 + 0.5))).sum::<f64>() * h
}
