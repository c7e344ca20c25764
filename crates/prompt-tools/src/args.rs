//! Typed extraction of tool arguments from the raw MCP argument map.
//!
//! Every accessor either yields a typed value or a named [`ArgError`]; handlers build their
//! argument structs from these and never look at the untyped map afterwards.
//!
//! Conventions shared by all accessors:
//! - an explicit JSON `null` is the same as an absent key
//! - empty optional strings, arrays and objects are treated as absent (they are omitted upstream)
//! - optional integers treat `0` as absent and reject negatives
//! - scalars are coerced: numbers and booleans read as strings, numeric strings as integers

use rmcp::model::JsonObject;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A caller input problem. `Display` is the text returned to the caller after `invalid input: `.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("invalid array format: expected array of objects for argument \"{field}\" at index {index}")]
    ArrayElement { field: &'static str, index: usize },
    #[error("all {field} values must be strings: key \"{key}\" has type {found}")]
    MapValue {
        field: &'static str,
        key: String,
        found: &'static str,
    },
    #[error("{0} must be a positive integer")]
    NotPositive(&'static str),
}

pub type ArgResult<T> = std::result::Result<T, ArgError>;

/// Read-only view over a call's arguments.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    raw: &'a JsonObject,
}

impl<'a> Args<'a> {
    #[must_use]
    pub fn new(raw: &'a JsonObject) -> Self {
        Self { raw }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        match self.raw.get(field) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    /// A non-empty string.
    pub fn required_str(&self, field: &'static str) -> ArgResult<String> {
        self.optional_str(field)?.ok_or(ArgError::Required(field))
    }

    /// Numbers and booleans are accepted in their JSON text form, so `"prompt_id": 123` reads
    /// as `"123"`.
    pub fn optional_str(&self, field: &'static str) -> ArgResult<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(_) => Err(ArgError::WrongType {
                field,
                expected: "a string",
            }),
        }
    }

    /// A JSON object. An empty object is accepted: it is a valid (variable-free) value.
    pub fn required_object(&self, field: &'static str) -> ArgResult<JsonObject> {
        match self.get(field) {
            None => Err(ArgError::Required(field)),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ArgError::WrongType {
                field,
                expected: "an object",
            }),
        }
    }

    pub fn optional_object(&self, field: &'static str) -> ArgResult<Option<JsonObject>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) => Err(ArgError::WrongType {
                field,
                expected: "an object",
            }),
        }
    }

    /// An array whose every element is a JSON object.
    pub fn optional_object_array(&self, field: &'static str) -> ArgResult<Option<Vec<JsonObject>>> {
        let items = match self.get(field) {
            None => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ArgError::WrongType {
                    field,
                    expected: "an array of objects",
                });
            }
        };
        if items.is_empty() {
            return Ok(None);
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(obj) => Ok(obj.clone()),
                _ => Err(ArgError::ArrayElement { field, index }),
            })
            .collect::<ArgResult<Vec<_>>>()
            .map(Some)
    }

    /// An object whose values are all strings.
    pub fn optional_string_map(
        &self,
        field: &'static str,
    ) -> ArgResult<Option<BTreeMap<String, String>>> {
        let map = match self.get(field) {
            None => return Ok(None),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ArgError::WrongType {
                    field,
                    expected: "an object",
                });
            }
        };

        let mut out = BTreeMap::new();
        for (key, value) in map {
            let Value::String(s) = value else {
                return Err(ArgError::MapValue {
                    field,
                    key: key.clone(),
                    found: json_type_name(value),
                });
            };
            out.insert(key.clone(), s.clone());
        }
        Ok(Some(out))
    }

    /// A strictly positive integer. `0` reads as absent, negatives are rejected.
    ///
    /// Integral floats (`2.0`) and numeric strings (`"5"`) are accepted too.
    pub fn optional_positive_int(&self, field: &'static str) -> ArgResult<Option<u64>> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };
        let n = as_integer(value).ok_or(ArgError::WrongType {
            field,
            expected: "an integer",
        })?;
        match n {
            0 => Ok(None),
            n if n < 0 => Err(ArgError::NotPositive(field)),
            n => Ok(u64::try_from(n).ok()),
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n,
        Value::String(s) => return s.trim().parse().ok(),
        _ => return None,
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if let Some(u) = n.as_u64() {
        return i64::try_from(u).ok();
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
