//! Coerces whatever an extraction strategy produced into an [`ExtractedRecipe`].
//!
//! Total: every input, even a non-object, yields a record. No semantic checks
//! are made on the content itself.

use crate::model::{ExtractedRecipe, DEFAULT_NAME};
use serde_json::Value;

pub fn normalize(value: &Value) -> ExtractedRecipe {
    let field = |key: &str| value.get(key).map(coerce_text).unwrap_or_default();

    let name = match value.get("name") {
        None | Some(Value::Null) => DEFAULT_NAME.to_string(),
        Some(name) => coerce_text(name),
    };

    let image_url = value
        .get("image_url")
        .map(coerce_text)
        .filter(|url| !url.is_empty());

    ExtractedRecipe {
        name,
        ingredients: field("ingredients"),
        directions: field("directions"),
        prep_time: field("prep_time"),
        cook_time: field("cook_time"),
        servings: field("servings"),
        source: field("source"),
        source_url: field("source_url"),
        notes: field("notes"),
        image_url,
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null | Value::Object(_) => String::new(),
    }
}
