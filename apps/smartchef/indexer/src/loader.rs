//! Cleaned recipes CSV → `recipes` table rows.

use domain_recipes::schema::RecipeRecord;
use eyre::{Result, WrapErr, bail};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::literal;

/// One CSV row. List columns hold Python literals; unknown columns (such as
/// a leading dataframe index) are ignored.
#[derive(Debug, Deserialize)]
struct CsvRecipe {
    id: i64,
    name: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    minutes: Option<i64>,
    tags: String,
    nutrition: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    n_steps: Option<i64>,
    steps: String,
    #[serde(default)]
    description: Option<String>,
    ingredients: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    n_ingredients: Option<i64>,
    #[serde(default)]
    meal_type: Option<String>,
    #[serde(default)]
    food_type: Option<String>,
    embedding: String,
}

#[derive(Clone, Copy)]
enum ListKind {
    Strings,
    Numbers,
}

/// Convert one list column to JSON, checking its element type.
fn list_column(id: i64, field: &str, raw: &str, kind: ListKind) -> Result<String> {
    let value = literal::parse(raw)
        .wrap_err_with(|| format!("recipe {id}: column '{field}' is not a list literal"))?;

    let Value::Array(items) = &value else {
        bail!("recipe {id}: column '{field}' is not a list");
    };
    let well_typed = match kind {
        ListKind::Strings => items.iter().all(Value::is_string),
        ListKind::Numbers => items.iter().all(Value::is_number),
    };
    if !well_typed {
        bail!("recipe {id}: column '{field}' has elements of the wrong type");
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CsvRecipe {
    fn into_record(self) -> Result<RecipeRecord> {
        let id = self.id;
        let description = match non_blank(self.description) {
            Some(text) => Value::String(text).to_string(),
            None => Value::Null.to_string(),
        };

        Ok(RecipeRecord {
            id,
            name: self.name.trim().to_string(),
            minutes: self.minutes,
            tags: list_column(id, "tags", &self.tags, ListKind::Strings)?,
            nutrition: list_column(id, "nutrition", &self.nutrition, ListKind::Numbers)?,
            n_steps: self.n_steps,
            steps: list_column(id, "steps", &self.steps, ListKind::Strings)?,
            description,
            ingredients: list_column(id, "ingredients", &self.ingredients, ListKind::Strings)?,
            n_ingredients: self.n_ingredients,
            meal_type: non_blank(self.meal_type),
            food_type: non_blank(self.food_type),
            embedding: list_column(id, "embedding", &self.embedding, ListKind::Numbers)?,
        })
    }
}

/// Read every row of `path`. Any malformed row fails the whole load.
pub fn read_csv(path: &Path) -> Result<Vec<RecipeRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .wrap_err_with(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<CsvRecipe>().enumerate() {
        let row = row.wrap_err_with(|| format!("malformed CSV record {}", line + 1))?;
        records.push(row.into_record()?);
    }

    info!(count = records.len(), path = %path.display(), "Read recipes CSV");
    Ok(records)
}
