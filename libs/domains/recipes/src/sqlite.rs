use async_trait::async_trait;
use database::sqlite::{SqlitePool, check_health};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::codec::{
    StoredEmbedding, decode_description, decode_nutrition, decode_string_list, join_steps,
};
use crate::error::{RecipeError, RecipeResult};
use crate::models::{EmbeddedRecipe, Recipe};
use crate::repository::RecipeStore;
use crate::schema::{
    CREATE_RECIPES_TABLE, DROP_RECIPES_TABLE, INSERT_RECIPE, RECIPE_COLUMNS, RecipeRecord,
};

/// Ids per `IN (...)` clause, below SQLite's bound-parameter limit.
const FETCH_CHUNK: usize = 500;

/// Embeddings read for index building.
#[derive(Debug, Default)]
pub struct EmbeddingLoad {
    pub rows: Vec<EmbeddedRecipe>,
    /// Rows whose embedding was missing or did not decode
    pub skipped: usize,
}

/// SQLite-backed attribute store.
#[derive(Debug, Clone)]
pub struct SqliteRecipeStore {
    pool: SqlitePool,
}

impl SqliteRecipeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Recreate the table and insert `records` in one transaction. Nothing is
    /// changed if any insert fails.
    pub async fn replace_all(&self, records: &[RecipeRecord]) -> RecipeResult<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(DROP_RECIPES_TABLE).execute(&mut *tx).await?;
        sqlx::query(CREATE_RECIPES_TABLE).execute(&mut *tx).await?;

        for record in records {
            sqlx::query(INSERT_RECIPE)
                .bind(record.id)
                .bind(&record.name)
                .bind(record.minutes)
                .bind(&record.tags)
                .bind(&record.nutrition)
                .bind(record.n_steps)
                .bind(&record.steps)
                .bind(&record.description)
                .bind(&record.ingredients)
                .bind(record.n_ingredients)
                .bind(&record.meal_type)
                .bind(&record.food_type)
                .bind(&record.embedding)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(count = records.len(), "Replaced recipes table");
        Ok(records.len())
    }

    /// Every row's id, food type and embedding, ordered by id.
    ///
    /// The storage class of the embedding value picks the decoder for that
    /// row. Rows that cannot be decoded to `dimension` values are skipped.
    pub async fn load_embeddings(&self, dimension: usize) -> RecipeResult<EmbeddingLoad> {
        let rows = sqlx::query("SELECT id, food_type, embedding FROM recipes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut load = EmbeddingLoad::default();
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            let stored = match stored_embedding(row) {
                Ok(Some(stored)) => stored,
                Ok(None) => {
                    warn!(recipe_id = id, "Recipe has no embedding, skipping");
                    load.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(recipe_id = id, error = %e, "Unreadable embedding, skipping");
                    load.skipped += 1;
                    continue;
                }
            };

            match stored.decode(dimension) {
                Ok(embedding) => load.rows.push(EmbeddedRecipe {
                    id,
                    food_type: row.try_get("food_type")?,
                    embedding,
                }),
                Err(e) => {
                    warn!(
                        recipe_id = id,
                        encoding = stored.kind(),
                        error = %e,
                        "Embedding does not decode, skipping"
                    );
                    load.skipped += 1;
                }
            }
        }

        info!(
            loaded = load.rows.len(),
            skipped = load.skipped,
            "Loaded recipe embeddings"
        );
        Ok(load)
    }
}

fn stored_embedding(row: &SqliteRow) -> Result<Option<StoredEmbedding>, sqlx::Error> {
    let raw = row.try_get_raw("embedding")?;
    if raw.is_null() {
        return Ok(None);
    }
    let storage_class = raw.type_info().name().to_string();
    match storage_class.as_str() {
        "BLOB" => Ok(Some(StoredEmbedding::RawBytes(row.try_get("embedding")?))),
        "TEXT" => Ok(Some(StoredEmbedding::DelimitedText(row.try_get("embedding")?))),
        _ => Ok(None),
    }
}

fn column<'r, T>(row: &'r SqliteRow, id: i64, field: &'static str) -> RecipeResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(field).map_err(|e| RecipeError::decode(id, field, e))
}

fn decode_recipe(row: &SqliteRow) -> RecipeResult<Recipe> {
    let id: i64 = row.try_get("id")?;

    let name: Option<String> = column(row, id, "name")?;
    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| RecipeError::decode(id, "name", "missing"))?;

    let ingredients: String = column(row, id, "ingredients")?;
    let nutrition: String = column(row, id, "nutrition")?;
    let steps: String = column(row, id, "steps")?;
    let tags: Option<String> = column(row, id, "tags")?;
    let description: Option<String> = column(row, id, "description")?;

    Ok(Recipe {
        id,
        name,
        minutes: column(row, id, "minutes")?,
        description: decode_description(id, description.as_deref())?,
        ingredients: decode_string_list(id, "ingredients", &ingredients)?,
        nutrition: decode_nutrition(id, &nutrition)?,
        instructions: join_steps(&decode_string_list(id, "steps", &steps)?),
        tags: match tags {
            Some(raw) => decode_string_list(id, "tags", &raw)?,
            None => Vec::new(),
        },
        food_type: column(row, id, "food_type")?,
        meal_type: column(row, id, "meal_type")?,
    })
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn fetch_by_ids(&self, ids: &[i64]) -> RecipeResult<HashMap<i64, Recipe>> {
        let unique: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut found = HashMap::with_capacity(unique.len());
        if unique.is_empty() {
            return Ok(found);
        }

        // Returned to the pool on drop, on every exit path.
        let mut conn = self.pool.acquire().await?;

        for chunk in unique.chunks(FETCH_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id IN ({placeholders})");

            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(*id);
            }

            for row in query.fetch_all(&mut *conn).await? {
                match decode_recipe(&row) {
                    Ok(recipe) => {
                        found.insert(recipe.id, recipe);
                    }
                    Err(RecipeError::Decode { id, field, reason }) => {
                        warn!(recipe_id = id, field, reason = %reason, "Dropping undecodable recipe");
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        debug!(requested = unique.len(), found = found.len(), "Fetched recipes");
        Ok(found)
    }

    async fn health_check(&self) -> RecipeResult<()> {
        check_health(&self.pool).await?;
        Ok(())
    }
}
