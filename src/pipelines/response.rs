//! Decoding of the generative service's free-form answers into JSON records.

use crate::error::IngestError;
use log::warn;
use serde_json::{Deserializer, Value};

const EXCERPT_CHARS: usize = 200;

/// Find the first balanced `{...}` or `[...]` span in `text` that parses as JSON.
///
/// Brackets inside string literals are skipped. When a candidate span does not
/// parse, the search resumes at the next opening bracket.
pub fn find_json_span(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(start, _)| {
            let end = balanced_end(&text[start..])?;
            let span = &text[start..start + end];
            serde_json::from_str::<Value>(span).is_ok().then_some(span)
        })
}

/// Byte length of the bracketed span at the start of `text`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse every JSON value in the answer.
///
/// The whole answer is first read as a stream of concatenated values, which
/// covers a lone object, an array, and several objects back to back. Anything
/// else falls back to the first JSON span embedded in surrounding prose.
pub fn parse_values(text: &str) -> Result<Vec<Value>, IngestError> {
    let trimmed = text.trim();
    let streamed: Result<Vec<Value>, _> = Deserializer::from_str(trimmed).into_iter().collect();
    match streamed {
        Ok(values) if !values.is_empty() => return Ok(values),
        _ => {}
    }

    let span = find_json_span(trimmed).ok_or_else(|| invalid(text))?;
    serde_json::from_str(span)
        .map(|value| vec![value])
        .map_err(|_| invalid(text))
}

/// Flatten arrays and `{"recipes": [...]}` wrappers into individual objects.
pub fn flatten_records(values: Vec<Value>) -> Vec<Value> {
    let mut records = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => records.extend(flatten_records(items)),
            Value::Object(mut map) => match map.remove("recipes") {
                Some(Value::Array(items)) if !map.contains_key("name") => {
                    records.extend(flatten_records(items))
                }
                Some(recipes) => {
                    map.insert("recipes".to_string(), recipes);
                    records.push(Value::Object(map));
                }
                None => records.push(Value::Object(map)),
            },
            _ => {}
        }
    }
    records
}

/// All recipe objects found in the answer; an error when there are none.
pub fn parse_records(text: &str) -> Result<Vec<Value>, IngestError> {
    let records = flatten_records(parse_values(text)?);
    if records.is_empty() {
        return Err(invalid(text));
    }
    Ok(records)
}

/// Exactly one recipe object. Extra objects are dropped with a warning.
pub fn parse_record(text: &str) -> Result<Value, IngestError> {
    let mut records = parse_records(text)?;
    if records.len() > 1 {
        warn!(
            "Expected one recipe but the answer held {}, keeping the first",
            records.len()
        );
    }
    Ok(records.swap_remove(0))
}

fn invalid(text: &str) -> IngestError {
    let excerpt: String = text.trim().chars().take(EXCERPT_CHARS).collect();
    IngestError::InvalidResponse(format!("no JSON recipe in answer: {excerpt}"))
}
