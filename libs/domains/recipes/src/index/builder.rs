use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::format::FlatIndex;
use super::key::{PreferenceKey, normalize_tag};
use crate::error::{RecipeError, RecipeResult};
use crate::models::EmbeddedRecipe;

/// Upper bound on distinct food types for `all_combinations` (2^12 - 1 files).
pub const MAX_FOOD_TYPES: usize = 12;

/// Index of every recipe whose food type is one of the key's tags.
///
/// Recipes without a food type, or with one that does not normalize, are
/// never part of any partition.
pub fn build_index(
    key: &PreferenceKey,
    rows: &[EmbeddedRecipe],
    dimension: usize,
) -> RecipeResult<FlatIndex> {
    let mut index = FlatIndex::new(dimension)?;
    for row in rows {
        let Some(food_type) = row.food_type.as_deref() else {
            continue;
        };
        match normalize_tag(food_type) {
            Ok(tag) if key.contains(&tag) => index.add(row.id, &row.embedding)?,
            _ => {}
        }
    }
    debug!(preference_key = %key, vectors = index.len(), "Built index");
    Ok(index)
}

/// Every non-empty subset of `food_types`, sorted by key.
pub fn all_combinations(food_types: &BTreeSet<String>) -> RecipeResult<Vec<PreferenceKey>> {
    if food_types.len() > MAX_FOOD_TYPES {
        return Err(RecipeError::Config(format!(
            "{} food types would produce too many combinations (max {MAX_FOOD_TYPES})",
            food_types.len()
        )));
    }

    let types: Vec<&String> = food_types.iter().collect();
    let mut keys = Vec::with_capacity((1usize << types.len()).saturating_sub(1));
    for mask in 1usize..(1 << types.len()) {
        let subset = types
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, tag)| tag.as_str());
        keys.push(PreferenceKey::from_tags(subset)?);
    }
    keys.sort();
    Ok(keys)
}

/// Write `index` into `dir` under the key's file name.
pub fn write_index(dir: &Path, key: &PreferenceKey, index: &FlatIndex) -> RecipeResult<PathBuf> {
    let path = dir.join(key.file_name());
    index.write_to(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, food_type: Option<&str>) -> EmbeddedRecipe {
        EmbeddedRecipe {
            id,
            food_type: food_type.map(str::to_string),
            embedding: vec![id as f32, 0.0],
        }
    }

    #[test]
    fn test_partition_follows_food_type() {
        let rows = vec![
            row(1, Some("vegan")),
            row(2, Some("Vegetarian")),
            row(3, Some("meat-based")),
            row(4, None),
            row(5, Some("low carb")),
        ];

        let vegan = build_index(&PreferenceKey::from_tags(["vegan"]).unwrap(), &rows, 2).unwrap();
        assert_eq!(vegan.ids(), &[1]);

        let both = build_index(
            &PreferenceKey::from_tags(["vegan", "vegetarian"]).unwrap(),
            &rows,
            2,
        )
        .unwrap();
        assert_eq!(both.ids(), &[1, 2]);
    }

    #[test]
    fn test_dimension_mismatch_aborts_build() {
        let mut rows = vec![row(1, Some("vegan"))];
        rows[0].embedding.push(1.0);
        let key = PreferenceKey::from_tags(["vegan"]).unwrap();
        assert!(matches!(
            build_index(&key, &rows, 2),
            Err(RecipeError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_all_combinations_is_power_set() {
        let types: BTreeSet<String> = ["vegan", "vegetarian", "meat-based"]
            .into_iter()
            .map(String::from)
            .collect();
        let keys = all_combinations(&types).unwrap();
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "meat-based",
                "meat-based_vegan",
                "meat-based_vegan_vegetarian",
                "meat-based_vegetarian",
                "vegan",
                "vegan_vegetarian",
                "vegetarian",
            ]
        );
    }

    #[test]
    fn test_all_combinations_caps_size() {
        let types: BTreeSet<String> = (0..13).map(|i| format!("type{i}")).collect();
        assert!(all_combinations(&types).is_err());
        assert!(all_combinations(&BTreeSet::new()).unwrap().is_empty());
    }

    #[test]
    fn test_write_index_uses_key_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let key = PreferenceKey::from_tags(["vegan"]).unwrap();
        let index = build_index(&key, &[row(1, Some("vegan"))], 2).unwrap();

        let path = write_index(dir.path(), &key, &index).unwrap();
        assert_eq!(path, dir.path().join("recipes_vegan.idx"));
        assert_eq!(FlatIndex::load(&path, 2).unwrap(), index);
    }
}
