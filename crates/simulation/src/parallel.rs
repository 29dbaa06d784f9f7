//! Parallel execution helpers.
//!
//! The `cfg` switch between rayon and plain iterators lives here so call
//! sites stay the same with or without the `parallel` feature. Results keep
//! input order, so they never depend on how rayon splits the work.
//!
//! `force_sequential` disables rayon at runtime even when the feature is on.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Filter-map over a slice, potentially in parallel.
///
/// `Some` results are kept in input order.
#[inline]
pub fn filter_map_slice<T, F, R>(slice: &[T], f: F, force_sequential: bool) -> Vec<R>
where
    T: Sync,
    F: Fn(&T) -> Option<R> + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            slice.iter().filter_map(f).collect()
        } else {
            slice.par_iter().filter_map(f).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        slice.iter().filter_map(f).collect()
    }
}
