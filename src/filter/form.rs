//! Casting raw input into an [`ArticleFilter`].
//!
//! The heavy lifting is serde's: each recognized field is deserialized on its
//! own, and every failure is collected so the caller sees all bad fields at
//! once instead of the first. Unknown keys are ignored and JSON `null` counts
//! as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use super::ArticleFilter;

/// A single field that failed to cast, with serde's diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Raw input rejected. One entry per field that failed to cast; fields that
/// cast cleanly are not reported. No query is ever built from rejected input.
#[derive(Debug, thiserror::Error)]
#[error("invalid filter input: {}", failed_fields(.errors))]
pub struct InvalidFilter {
    pub errors: Vec<FieldError>,
}

fn failed_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.field)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cast a raw JSON object into a typed filter.
pub fn build_filter(raw: &Map<String, Json>) -> Result<ArticleFilter, InvalidFilter> {
    let mut errors = Vec::new();
    let filter = ArticleFilter {
        title_eq: cast(raw, "title_eq", &mut errors),
        summary_eq: cast(raw, "summary_eq", &mut errors),
        status_in: cast(raw, "status_in", &mut errors),
        author_first_name_eq: cast(raw, "author_first_name_eq", &mut errors),
        author_last_name_eq: cast(raw, "author_last_name_eq", &mut errors),
        most_relevant: cast(raw, "most_relevant", &mut errors),
    };
    if errors.is_empty() {
        Ok(filter)
    } else {
        Err(InvalidFilter { errors })
    }
}

fn cast<T: DeserializeOwned>(
    raw: &Map<String, Json>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match raw.get(field) {
        None | Some(Json::Null) => None,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(cast) => Some(cast),
            Err(err) => {
                errors.push(FieldError {
                    field,
                    message: err.to_string(),
                });
                None
            }
        },
    }
}
