use std::collections::BTreeSet;
use std::fmt;

use crate::error::{RecipeError, RecipeResult};

const SEPARATOR: &str = "_";
const FILE_PREFIX: &str = "recipes_";
const FILE_SUFFIX: &str = ".idx";

/// Canonical identity of a set of dietary-preference tags.
///
/// Tags are trimmed, lowercased, de-duplicated, sorted and joined with `_`,
/// so any ordering or casing of the same set yields the same key. A tag may
/// only contain `a-z`, `0-9` and `-`; the key is used verbatim in a file
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreferenceKey(String);

impl PreferenceKey {
    pub fn from_tags<I, S>(tags: I) -> RecipeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = BTreeSet::new();
        for tag in tags {
            canonical.insert(normalize_tag(tag.as_ref())?);
        }

        if canonical.is_empty() {
            return Err(RecipeError::InvalidRequest(
                "at least one dietary preference is required".to_string(),
            ));
        }

        let joined = canonical.into_iter().collect::<Vec<_>>().join(SEPARATOR);
        Ok(Self(joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }

    /// `recipes_<key>.idx`
    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}{}{FILE_SUFFIX}", self.0)
    }

    /// Inverse of [`file_name`](Self::file_name); `None` for unrelated files.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let body = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        let key = Self::from_tags(body.split(SEPARATOR)).ok()?;
        (key.0 == body).then_some(key)
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and lowercase one tag, rejecting anything outside `[a-z0-9-]+`.
pub fn normalize_tag(raw: &str) -> RecipeResult<String> {
    let tag = raw.trim().to_ascii_lowercase();
    if tag.is_empty() {
        return Err(RecipeError::InvalidRequest(
            "dietary preferences must not be blank".to_string(),
        ));
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(RecipeError::InvalidRequest(format!(
            "invalid dietary preference '{}': only letters, digits and '-' are allowed",
            raw.trim()
        )));
    }
    Ok(tag)
}
