//! Per-combination index generation from the recipe store.

use domain_recipes::index::{all_combinations, build_index, normalize_tag, write_index};
use domain_recipes::{EmbeddedRecipe, PreferenceKey, SqliteRecipeStore};
use eyre::{Result, WrapErr, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which combinations to build.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Every non-empty subset of the food types in the store
    All,
    Keys(Vec<PreferenceKey>),
}

impl Selection {
    /// `["vegan,vegetarian", "keto"]` → two keys. Empty input is an error.
    pub fn from_args(combinations: &[String], all: bool) -> Result<Self> {
        if all {
            return Ok(Selection::All);
        }
        if combinations.is_empty() {
            bail!("pass --all or at least one --combination");
        }
        let keys = combinations
            .iter()
            .map(|c| {
                PreferenceKey::from_tags(c.split(','))
                    .wrap_err_with(|| format!("invalid combination '{c}'"))
            })
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Selection::Keys(keys.into_iter().collect()))
    }
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub written: Vec<PathBuf>,
    pub recipes_read: usize,
    pub recipes_skipped: usize,
}

/// Distinct normalized food types; values that are not valid tags are skipped.
pub fn food_types(rows: &[EmbeddedRecipe]) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    for food_type in rows.iter().filter_map(|r| r.food_type.as_deref()) {
        match normalize_tag(food_type) {
            Ok(tag) => {
                types.insert(tag);
            }
            Err(_) => warn!(food_type, "Food type is not a valid preference tag, ignoring"),
        }
    }
    types
}

/// Read embeddings once and write one index file per selected combination.
pub async fn build_indices(
    store: &SqliteRecipeStore,
    out_dir: &Path,
    dimension: usize,
    selection: Selection,
) -> Result<BuildSummary> {
    let load = store.load_embeddings(dimension).await?;

    let keys = match selection {
        Selection::All => {
            let types = food_types(&load.rows);
            info!(?types, "Building every combination of food types");
            all_combinations(&types)?
        }
        Selection::Keys(keys) => keys,
    };

    std::fs::create_dir_all(out_dir)
        .wrap_err_with(|| format!("failed to create {}", out_dir.display()))?;

    let mut summary = BuildSummary {
        recipes_read: load.rows.len(),
        recipes_skipped: load.skipped,
        ..Default::default()
    };

    for key in &keys {
        let index = build_index(key, &load.rows, dimension)?;
        if index.is_empty() {
            warn!(preference_key = %key, "No recipes match this combination, writing empty index");
        }
        let path = write_index(out_dir, key, &index)?;
        info!(preference_key = %key, vectors = index.len(), path = %path.display(), "Wrote index");
        summary.written.push(path);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_recipes::FlatIndex;
    use domain_recipes::schema::CREATE_RECIPES_TABLE;
    use test_utils::TestDatabase;

    #[test]
    fn test_selection_from_args() {
        assert_eq!(Selection::from_args(&[], true).unwrap(), Selection::All);
        assert!(Selection::from_args(&[], false).is_err());

        let args = vec!["vegetarian,Vegan".to_string(), "vegan, vegetarian".to_string()];
        let Selection::Keys(keys) = Selection::from_args(&args, false).unwrap() else {
            panic!("expected keys");
        };
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "vegan_vegetarian");

        assert!(Selection::from_args(&["../x".to_string()], false).is_err());
    }

    #[tokio::test]
    async fn test_build_indices_partitions_by_food_type() {
        let db = TestDatabase::new().await;
        db.execute(CREATE_RECIPES_TABLE).await;
        db.execute(
            "INSERT INTO recipes (id, food_type, embedding) VALUES
                (1, 'vegan', '[1.0, 0.0]'),
                (2, 'vegetarian', '[0.0, 1.0]'),
                (3, 'Vegetarian', '[0.5, 0.5]'),
                (4, 'vegan', '[1.0]'),
                (5, 'low carb', '[0.2, 0.2]');",
        )
        .await;
        let store = SqliteRecipeStore::new(db.pool());
        let out = db.dir().join("indices");

        let summary = build_indices(&store, &out, 2, Selection::All).await.unwrap();
        assert_eq!(summary.recipes_read, 4);
        assert_eq!(summary.recipes_skipped, 1);
        assert_eq!(summary.written.len(), 3);

        let both = FlatIndex::load(&out.join("recipes_vegan_vegetarian.idx"), 2).unwrap();
        assert_eq!(both.ids(), &[1, 2, 3]);
        let vegetarian = FlatIndex::load(&out.join("recipes_vegetarian.idx"), 2).unwrap();
        assert_eq!(vegetarian.ids(), &[2, 3]);
    }

    #[tokio::test]
    async fn test_build_selected_combination_only() {
        let db = TestDatabase::new().await;
        db.execute(CREATE_RECIPES_TABLE).await;
        db.execute("INSERT INTO recipes (id, food_type, embedding) VALUES (7, 'vegan', '[1, 2]');")
            .await;
        let store = SqliteRecipeStore::new(db.pool());

        let selection = Selection::from_args(&["vegan".to_string()], false).unwrap();
        let summary = build_indices(&store, db.dir(), 2, selection).await.unwrap();

        assert_eq!(summary.written, vec![db.dir().join("recipes_vegan.idx")]);
    }
}
