//! Bounded one-dimensional maximization under a fixed evaluation budget.

use tracing::debug;

use crate::error::{EntropyError, Result};

/// `1/φ`, the golden-section shrink factor.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Best point observed by an optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optimum {
    pub x: f64,
    pub value: f64,
    /// Objective evaluations spent.
    pub evaluations: usize,
}

/// Maximizes a scalar objective on `[lower, upper]` within a finite budget.
pub trait BoundedOptimizer {
    fn maximize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64>,
        lower: f64,
        upper: f64,
    ) -> Result<Optimum>;
}

/// Evenly spaced exploration followed by golden-section refinement.
///
/// `init_points` samples span `[lower, upper]` (endpoints included); the
/// bracket around the best sample is then narrowed with `n_iter` further
/// evaluations. Returns the best point seen anywhere, not the final
/// bracket midpoint. Deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoldenSectionSearch {
    pub init_points: usize,
    pub n_iter: usize,
}

impl Default for GoldenSectionSearch {
    fn default() -> Self {
        Self {
            init_points: 5,
            n_iter: 20,
        }
    }
}

struct Tracker<'a> {
    objective: &'a mut dyn FnMut(f64) -> Result<f64>,
    best: Option<Optimum>,
    evaluations: usize,
}

impl Tracker<'_> {
    fn eval(&mut self, x: f64) -> Result<f64> {
        let value = (self.objective)(x)?;
        self.evaluations += 1;
        debug!(x, value, "objective evaluated");
        let better = match self.best {
            None => true,
            Some(best) => value > best.value,
        };
        if better {
            self.best = Some(Optimum {
                x,
                value,
                evaluations: 0,
            });
        }
        Ok(value)
    }
}

impl BoundedOptimizer for GoldenSectionSearch {
    fn maximize(
        &self,
        objective: &mut dyn FnMut(f64) -> Result<f64>,
        lower: f64,
        upper: f64,
    ) -> Result<Optimum> {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(EntropyError::InvalidParameter(format!(
                "invalid bounds [{lower}, {upper}]"
            )));
        }
        if self.init_points < 2 {
            return Err(EntropyError::InvalidParameter(
                "init_points must be at least 2".to_string(),
            ));
        }

        let mut tracker = Tracker {
            objective,
            best: None,
            evaluations: 0,
        };

        let step = (upper - lower) / (self.init_points - 1) as f64;
        let grid: Vec<f64> = (0..self.init_points)
            .map(|i| if i + 1 == self.init_points { upper } else { lower + step * i as f64 })
            .collect();
        let mut best_idx = 0;
        let mut best_val = f64::NEG_INFINITY;
        for (i, &x) in grid.iter().enumerate() {
            let v = tracker.eval(x)?;
            if v > best_val {
                best_val = v;
                best_idx = i;
            }
        }

        let mut a = grid[best_idx.saturating_sub(1)];
        let mut c = grid[(best_idx + 1).min(grid.len() - 1)];
        let mut remaining = self.n_iter;
        if remaining >= 2 {
            let mut x1 = c - INV_PHI * (c - a);
            let mut x2 = a + INV_PHI * (c - a);
            let mut f1 = tracker.eval(x1)?;
            let mut f2 = tracker.eval(x2)?;
            remaining -= 2;

            while remaining > 0 {
                if f1 >= f2 {
                    c = x2;
                    x2 = x1;
                    f2 = f1;
                    x1 = c - INV_PHI * (c - a);
                    f1 = tracker.eval(x1)?;
                } else {
                    a = x1;
                    x1 = x2;
                    f1 = f2;
                    x2 = a + INV_PHI * (c - a);
                    f2 = tracker.eval(x2)?;
                }
                remaining -= 1;
            }
        }

        let evaluations = tracker.evaluations;
        let best = tracker.best.ok_or_else(|| {
            EntropyError::InvalidParameter("optimizer made no evaluations".to_string())
        })?;
        Ok(Optimum { evaluations, ..best })
    }
}
