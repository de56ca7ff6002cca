//! The discretized price axis.
//!
//! `M` evenly spaced points over [0, 1] inclusive. The same axis serves as the
//! set of quotable prices and the set of representable remaining budgets.
//! Every continuous price or budget is snapped to its nearest grid point
//! before it touches a state array.

/// Evenly spaced price grid over [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct PriceGrid {
    prices: Vec<f64>,
}

impl PriceGrid {
    /// Build a grid with `m` points. `m == 1` yields the single point 0.
    ///
    /// Callers validate `m >= 1`; a zero-point grid has no representable price.
    pub fn new(m: usize) -> Self {
        let prices = if m <= 1 {
            vec![0.0; m]
        } else {
            let div = (m - 1) as f64;
            (0..m).map(|k| k as f64 / div).collect()
        };
        Self { prices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    #[inline]
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    #[inline(always)]
    pub fn price(&self, k: usize) -> f64 {
        self.prices[k]
    }

    /// Nearest grid index to `p`.
    ///
    /// Total over all of f64: values outside [0, 1] clamp to the ends and NaN
    /// maps to index 0. An exact midpoint between two grid points resolves to
    /// the lower index, the first minimizer in grid order.
    #[inline(always)]
    pub fn get_index(&self, p: f64) -> usize {
        let m = self.prices.len();
        if m <= 1 {
            return 0;
        }
        let last = m - 1;
        let x = p * last as f64;
        if x.is_nan() {
            return 0;
        }
        // ceil(x - 0.5) rounds half down, so k.5 picks k.
        let k = (x - 0.5).ceil();
        if k <= 0.0 {
            0
        } else if k >= last as f64 {
            last
        } else {
            k as usize
        }
    }

    /// Linear-scan reference for [`get_index`](Self::get_index).
    pub fn get_index_scan(&self, p: f64) -> usize {
        let mut best = 0;
        let mut best_diff = f64::INFINITY;
        for (k, &price) in self.prices.iter().enumerate() {
            let diff = (price - p).abs();
            if diff < best_diff {
                best = k;
                best_diff = diff;
            }
        }
        best
    }
}
