use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Position of each value in the `nutrition` array (Food.com PDV layout).
pub const NUTRITION_FIELDS: [&str; 7] = [
    "calories",
    "total_fat",
    "sugar",
    "sodium",
    "protein",
    "saturated_fat",
    "carbohydrates",
];

/// A recipe as stored in the attribute store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    /// Total preparation time
    pub minutes: Option<i64>,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    /// Seven values, see [`NUTRITION_FIELDS`]
    pub nutrition: Vec<f64>,
    /// Steps joined into one paragraph
    pub instructions: String,
    pub tags: Vec<String>,
    pub food_type: Option<String>,
    pub meal_type: Option<String>,
}

/// A recipe in a result list, with its similarity position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// 1 for the nearest neighbour
    pub rank: usize,
    /// Squared L2 distance to the query embedding
    pub distance: f32,
}

/// One nearest-neighbour hit. Lives only for the duration of a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub rank: usize,
    pub distance: f32,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Body of `POST /api/get-recipes`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GetRecipesRequest {
    /// Free-text description of the dish
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "high protein breakfast")]
    pub query: String,

    /// Food-type tags; the exact combination selects the index
    #[validate(length(min = 1, message = "at least one dietary preference is required"))]
    #[schema(example = json!(["vegetarian"]))]
    pub dietary_preference: Vec<String>,
}

/// Result of a retrieval, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GetRecipesResponse {
    pub recipes: Vec<RankedRecipe>,
    /// Canonical key of the index that was searched
    pub preference_key: String,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GetRecipesResponse {
    pub const EMPTY_MESSAGE: &'static str =
        "No recipes matched your query for these dietary preferences";

    pub fn new(preference_key: String, recipes: Vec<RankedRecipe>) -> Self {
        let message = recipes
            .is_empty()
            .then(|| Self::EMPTY_MESSAGE.to_string());
        Self {
            count: recipes.len(),
            recipes,
            preference_key,
            message,
        }
    }
}

/// A preference combination that has a built index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PreferenceCombination {
    /// Canonical key, e.g. `vegan_vegetarian`
    pub key: String,
    pub tags: Vec<String>,
}

/// Body of `GET /api/preferences`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PreferencesResponse {
    pub combinations: Vec<PreferenceCombination>,
}

/// Recipe id, food type and decoded embedding, as read by the index builder.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedRecipe {
    pub id: i64,
    pub food_type: Option<String>,
    pub embedding: Vec<f32>,
}
