//! Thin typed collaborators over the clinic REST endpoints
//!
//! Each module maps one resource family onto pipeline calls: DTOs, the
//! backend parameter spelling (`page`/`limit` become `offset`/`limit` where
//! the backend wants offsets, `search` becomes `q`, date ranges become
//! `from`/`to`), and nothing else. Tokens, refresh and teardown are entirely
//! the pipeline's business.

pub mod appointments;
pub mod patients;
pub mod records;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Paged list envelope.
///
/// Backends answer with `{data: [...]}`, `{items: [...], total}` or a bare
/// array depending on the endpoint; all three decode to this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

pub(crate) fn parse_page<T: DeserializeOwned>(value: Value) -> Result<Page<T>> {
    let (raw, total) = match value {
        Value::Array(raw) => {
            let total = raw.len() as u64;
            (raw, total)
        }
        Value::Object(mut map) => {
            let total_hint = map
                .get("total")
                .and_then(Value::as_u64)
                .or_else(|| {
                    map.get("pagination")
                        .and_then(|p| p.get("total"))
                        .and_then(Value::as_u64)
                });
            let raw = match map.remove("data").or_else(|| map.remove("items")) {
                Some(Value::Array(raw)) => raw,
                _ => {
                    return Err(ApiError::Decode(
                        "list payload has no data/items array".into(),
                    ));
                }
            };
            let total = total_hint.unwrap_or(raw.len() as u64);
            (raw, total)
        }
        other => {
            return Err(ApiError::Decode(format!(
                "unexpected list payload: {other}"
            )));
        }
    };

    let items = raw
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| ApiError::Decode(format!("list item: {e}")))?;
    Ok(Page { items, total })
}

/// Append query pairs to a path; no pairs leave the path untouched.
pub(crate) fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        query.append_pair(name, value);
    }
    format!("{path}?{}", query.finish())
}
