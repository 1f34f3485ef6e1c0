//! # docrag-index
//!
//! Keyed brute-force vector indexes behind the [`docrag_core::VectorIndex`]
//! seam.
//!
//! Two interchangeable implementations:
//!
//! - [`FlatIndex`]: file-backed; state is persisted as JSON with an atomic
//!   write-then-rename so a crash mid-flush leaves the previous state intact
//! - [`MemoryIndex`]: identical semantics without persistence, for tests and
//!   throwaway sessions
//!
//! Both allocate keys from a monotonically increasing high-water mark that
//! survives removals (and, for [`FlatIndex`], restarts), so a key observed by
//! any caller is never rebound to a different vector.

mod flat;
mod memory;

pub use flat::FlatIndex;
pub use memory::MemoryIndex;

use docrag_core::{IndexKey, SearchHit};

/// Brute-force k-nearest-neighbour scan under squared L2 distance.
///
/// Squared distance preserves the ordering of true L2 and skips the sqrt.
/// Hits come back ascending, best match first.
fn nearest<'a>(
    entries: impl Iterator<Item = (IndexKey, &'a [f32])>,
    query: &[f32],
    k: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = entries
        .map(|(key, vector)| SearchHit {
            key,
            score: query
                .iter()
                .zip(vector)
                .map(|(a, b)| (a - b) * (a - b))
                .sum(),
        })
        .collect();
    hits.sort_by(|a, b| a.score.total_cmp(&b.score));
    hits.truncate(k);
    hits
}
