use std::num::NonZeroUsize;

use super::format::{FlatIndex, NO_MATCH};
use crate::error::{RecipeError, RecipeResult};
use crate::models::Candidate;

/// k-nearest-neighbour query against a loaded index.
///
/// Returns at most `k` candidates ordered by non-decreasing distance, ranked
/// from 1. Empty `NO_MATCH` slots are dropped, so an index smaller than `k`
/// yields all of its vectors and nothing else.
pub fn search(index: &FlatIndex, query: &[f32], k: NonZeroUsize) -> RecipeResult<Vec<Candidate>> {
    if query.len() != index.dimension() {
        return Err(RecipeError::DimensionMismatch {
            expected: index.dimension(),
            actual: query.len(),
        });
    }

    let candidates = index
        .scan(query, k.get())
        .into_iter()
        .filter(|(id, _)| *id != NO_MATCH)
        .enumerate()
        .map(|(position, (id, distance))| Candidate {
            id,
            rank: position + 1,
            distance,
        })
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn line_index(n: i64) -> FlatIndex {
        let mut index = FlatIndex::new(2).unwrap();
        for id in 1..=n {
            index.add(id, &[id as f32, 0.0]).unwrap();
        }
        index
    }

    #[test]
    fn test_results_are_bounded_and_sorted() {
        let hits = search(&line_index(20), &[7.2, 0.0], k(10)).unwrap();
        assert_eq!(hits.len(), 10);
        assert_eq!(hits[0].id, 7);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(
            hits.iter().map(|c| c.rank).collect::<Vec<_>>(),
            (1..=10).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_small_index_returns_everything_without_padding() {
        let hits = search(&line_index(3), &[0.0, 0.0], k(10)).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|c| c.id != NO_MATCH));
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = FlatIndex::new(2).unwrap();
        assert!(search(&index, &[0.0, 0.0], k(5)).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let err = search(&line_index(3), &[1.0, 2.0, 3.0], k(2)).unwrap_err();
        assert!(matches!(
            err,
            RecipeError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_repeated_searches_are_identical() {
        let index = line_index(50);
        let first = search(&index, &[25.5, 0.0], k(10)).unwrap();
        let second = search(&index, &[25.5, 0.0], k(10)).unwrap();
        assert_eq!(first, second);
    }
}
