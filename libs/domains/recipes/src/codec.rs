//! Strict decoders for the structured columns of the `recipes` table.
//!
//! Every list column is a JSON document written by the loader. Each decoder
//! accepts exactly one shape and reports anything else as
//! [`RecipeError::Decode`] naming the record and the field.

use crate::error::{RecipeError, RecipeResult};
use crate::models::NUTRITION_FIELDS;

/// `["a", "b"]`; anything but an array of strings is rejected.
pub fn decode_string_list(id: i64, field: &'static str, raw: &str) -> RecipeResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| RecipeError::decode(id, field, e))
}

/// Exactly seven finite numbers.
pub fn decode_nutrition(id: i64, raw: &str) -> RecipeResult<Vec<f64>> {
    let values = serde_json::from_str::<[f64; NUTRITION_FIELDS.len()]>(raw)
        .map_err(|e| RecipeError::decode(id, "nutrition", e))?;

    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(RecipeError::decode(
            id,
            "nutrition",
            format!("{} is not a finite number", NUTRITION_FIELDS[pos]),
        ));
    }

    Ok(values.to_vec())
}

/// A JSON string, JSON `null`, or the bare `NaN` a dataframe export writes
/// for missing text. SQL `NULL` is also absent.
pub fn decode_description(id: i64, raw: Option<&str>) -> RecipeResult<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.trim() == "NaN" {
        return Ok(None);
    }

    serde_json::from_str::<Option<String>>(raw)
        .map(|text| text.filter(|t| !t.trim().is_empty()))
        .map_err(|e| RecipeError::decode(id, "description", e))
}

/// Steps joined by single spaces.
pub fn join_steps(steps: &[String]) -> String {
    steps
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a stored embedding could not be turned into a vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbeddingDecodeError {
    #[error("byte length {0} is not a multiple of 4")]
    Misaligned(usize),

    #[error("token '{0}' is not a number")]
    BadToken(String),

    #[error("value at position {0} is not finite")]
    NotFinite(usize),

    #[error("expected {expected} values, found {actual}")]
    WrongDimension { expected: usize, actual: usize },

    #[error("embedding is empty")]
    Empty,
}

/// The persisted embedding column, tagged by how it was stored.
///
/// The variant is picked once per row from the SQLite storage class, so the
/// decoder never guesses between encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredEmbedding {
    /// Little-endian `f32` values back to back
    RawBytes(Vec<u8>),
    /// Numbers separated by commas and/or whitespace, optionally wrapped in `[]`
    DelimitedText(String),
}

impl StoredEmbedding {
    pub fn kind(&self) -> &'static str {
        match self {
            StoredEmbedding::RawBytes(_) => "raw_bytes",
            StoredEmbedding::DelimitedText(_) => "delimited_text",
        }
    }

    /// Decode into a vector of exactly `dimension` finite values.
    pub fn decode(&self, dimension: usize) -> Result<Vec<f32>, EmbeddingDecodeError> {
        let values = match self {
            StoredEmbedding::RawBytes(bytes) => decode_raw(bytes)?,
            StoredEmbedding::DelimitedText(text) => decode_text(text)?,
        };

        if values.is_empty() {
            return Err(EmbeddingDecodeError::Empty);
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingDecodeError::NotFinite(pos));
        }
        if values.len() != dimension {
            return Err(EmbeddingDecodeError::WrongDimension {
                expected: dimension,
                actual: values.len(),
            });
        }
        Ok(values)
    }
}

fn decode_raw(bytes: &[u8]) -> Result<Vec<f32>, EmbeddingDecodeError> {
    if bytes.len() % 4 != 0 {
        return Err(EmbeddingDecodeError::Misaligned(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn decode_text(text: &str) -> Result<Vec<f32>, EmbeddingDecodeError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|_| EmbeddingDecodeError::BadToken(token.to_string()))
        })
        .collect()
}

/// Encode a vector the way [`StoredEmbedding::RawBytes`] expects.
pub fn encode_raw(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
