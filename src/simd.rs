//! Inner-loop vector operations.
//!
//! Plain slice loops written so the optimizer can auto-vectorize them; every
//! distance routine in the crate bottoms out here.
//!
//! ```rust
//! use kdentropy::simd::{dot, l2_distance, norm_squared};
//!
//! let a = [1.0_f64, 0.0, 0.0];
//! let b = [0.0_f64, 3.0, 4.0];
//!
//! assert_eq!(dot(&a, &b), 0.0);
//! assert_eq!(norm_squared(&b), 25.0);
//! assert!((l2_distance(&a, &b) - 26.0_f64.sqrt()).abs() < 1e-12);
//! ```

/// Dot product of two vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Squared L2 norm.
#[inline]
#[must_use]
pub fn norm_squared(v: &[f64]) -> f64 {
    dot(v, v)
}

/// L2 norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f64]) -> f64 {
    norm_squared(v).sqrt()
}

/// L2 (Euclidean) distance between two vectors.
#[inline]
#[must_use]
pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    l2_distance_squared(a, b).sqrt()
}

/// L2 distance squared (faster when only comparing distances).
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// `acc += v`, element-wise.
#[inline]
pub fn add_assign(acc: &mut [f64], v: &[f64]) {
    for (a, x) in acc.iter_mut().zip(v.iter()) {
        *a += x;
    }
}
