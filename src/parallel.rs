//! Job-count control for the data-parallel stages.

use crate::error::{EntropyError, Result};

/// Run `op` on a dedicated pool of `jobs` threads, or on the global rayon
/// pool when `jobs` is `None`.
///
/// Every `par_iter` inside `op` inherits the pool, so one setting bounds the
/// whole call tree.
pub fn with_jobs<R, OP>(jobs: Option<usize>, op: OP) -> Result<R>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match jobs {
        None => Ok(op()),
        Some(0) => Err(EntropyError::InvalidParameter(
            "jobs must be greater than 0".to_string(),
        )),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| EntropyError::InvalidParameter(format!("thread pool: {e}")))?;
            Ok(pool.install(op))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_size_is_respected() {
        let threads = with_jobs(Some(2), rayon::current_num_threads).unwrap();
        assert_eq!(threads, 2);
    }

    #[test]
    fn zero_jobs_rejected() {
        assert!(with_jobs(Some(0), || ()).is_err());
        assert_eq!(with_jobs(None, || 7).unwrap(), 7);
    }
}
