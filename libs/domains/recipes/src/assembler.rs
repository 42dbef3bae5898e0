use std::collections::HashMap;

use crate::models::{Candidate, RankedRecipe, Recipe};

/// Join candidates to their attributes in rank order.
///
/// Candidates without attributes are skipped; the rest keep their relative
/// order and their original rank. Nothing is re-sorted.
pub fn assemble(candidates: &[Candidate], mut attributes: HashMap<i64, Recipe>) -> Vec<RankedRecipe> {
    candidates
        .iter()
        .filter_map(|candidate| {
            attributes.remove(&candidate.id).map(|recipe| RankedRecipe {
                recipe,
                rank: candidate.rank,
                distance: candidate.distance,
            })
        })
        .collect()
}
