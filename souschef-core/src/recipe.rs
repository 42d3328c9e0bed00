//! Canonical recipe shape and the normalizer that repairs loosely shaped
//! backend output into it.
//!
//! Generation backends and the save endpoint both hand us JSON of uncertain
//! shape. [`normalize`] is the only place that inspects those raw payloads:
//! it coerces scalars into lists, fills in defaults, and rejects anything
//! missing a title, ingredients or instructions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

pub const DEFAULT_DESCRIPTION: &str = "A delicious homemade recipe";
pub const DEFAULT_COOKING_TIME: &str = "30 minutes";
pub const DEFAULT_SERVINGS: u32 = 4;

/// How hard a recipe is to cook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Parse one of the three exact labels. Anything else is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a generated recipe came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Identifier of the backend that produced the recipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Provenance {
    pub fn is_empty(&self) -> bool {
        self == &Provenance::default()
    }
}

/// A recipe in its canonical display shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub cooking_time: String,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

/// A candidate payload lacked one or more required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<&'static str>,
}

/// Turn an arbitrary decoded JSON value into a canonical [`Recipe`].
///
/// `title`, `ingredients` and `instructions` are required and never
/// fabricated. A bare string for either list is wrapped into a one-element
/// list, and blank entries are dropped before the emptiness check. The
/// remaining fields fall back to defaults instead of failing. Provenance
/// fields on the input are ignored; the caller stamps its own.
pub fn normalize(candidate: &Value) -> Result<Recipe, SchemaError> {
    let empty = Map::new();
    let fields = candidate.as_object().unwrap_or(&empty);

    let title = non_blank(lookup(fields, &["title"]));
    let ingredients = string_list(lookup(fields, &["ingredients"]));
    let instructions = string_list(lookup(fields, &["instructions"]));

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if ingredients.is_empty() {
        missing.push("ingredients");
    }
    if instructions.is_empty() {
        missing.push("instructions");
    }

    let Some(title) = title.filter(|_| missing.is_empty()) else {
        return Err(SchemaError { missing });
    };

    Ok(Recipe {
        title,
        description: non_blank(lookup(fields, &["description"]))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        cooking_time: non_blank(lookup(fields, &["cookingTime", "cooking_time"]))
            .unwrap_or_else(|| DEFAULT_COOKING_TIME.to_string()),
        servings: servings(lookup(fields, &["servings"])),
        difficulty: lookup(fields, &["difficulty"])
            .and_then(Value::as_str)
            .and_then(|label| Difficulty::from_label(label.trim()))
            .unwrap_or_default(),
        ingredients,
        instructions,
        provenance: Provenance::default(),
    })
}

/// First present, non-null value among `keys`. Storage rows use snake_case,
/// backends use camelCase, and we accept either.
fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| non_blank(Some(item)))
            .collect(),
        Some(scalar @ Value::String(_)) => non_blank(Some(scalar)).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn servings(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.round() as u32)
        .unwrap_or(DEFAULT_SERVINGS)
}
