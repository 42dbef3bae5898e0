//! `recipes` table layout shared by the loader and the store.

/// Columns as produced by the recipe loader. List columns hold JSON arrays.
pub const CREATE_RECIPES_TABLE: &str = "\
CREATE TABLE recipes (
    id INTEGER PRIMARY KEY,
    name TEXT,
    minutes INTEGER,
    tags TEXT,
    nutrition TEXT,
    n_steps INTEGER,
    steps TEXT,
    description TEXT,
    ingredients TEXT,
    n_ingredients INTEGER,
    meal_type TEXT,
    food_type TEXT,
    embedding
)";

pub const DROP_RECIPES_TABLE: &str = "DROP TABLE IF EXISTS recipes";

pub const INSERT_RECIPE: &str = "\
INSERT INTO recipes (
    id, name, minutes, tags, nutrition, n_steps, steps, description,
    ingredients, n_ingredients, meal_type, food_type, embedding
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Columns read when serving a request. The embedding is never read here.
pub const RECIPE_COLUMNS: &str =
    "id, name, minutes, description, ingredients, nutrition, steps, tags, food_type, meal_type";

/// One row ready for insertion, list columns already encoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord {
    pub id: i64,
    pub name: String,
    pub minutes: Option<i64>,
    pub tags: String,
    pub nutrition: String,
    pub n_steps: Option<i64>,
    pub steps: String,
    pub description: String,
    pub ingredients: String,
    pub n_ingredients: Option<i64>,
    pub meal_type: Option<String>,
    pub food_type: Option<String>,
    pub embedding: String,
}
