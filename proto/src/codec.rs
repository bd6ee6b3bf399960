//! JSON codec for request and response bodies.
//!
//! A request body must be a JSON array of objects whose fields hold scalar
//! values. Responses are encoded without ASCII escaping so names such as
//! "Åsa Nilsson" round-trip unchanged.

use serde_json::Value as Json;
use thiserror::Error;

use crate::record::{Batch, Record};
use crate::value::Value;

/// Errors raised while decoding a request body into a [`Batch`]
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),

    #[error("record {index} is not a JSON object (found {found})")]
    NotAnObject { index: usize, found: &'static str },

    #[error("record {index} field '{field}' holds a nested {found}; only scalar values are supported")]
    NestedValue {
        index: usize,
        field: String,
        found: &'static str,
    },
}

/// Decode a JSON array of objects into a [`Batch`], preserving record and field order.
pub fn decode_batch(body: &[u8]) -> Result<Batch, DecodeError> {
    let json: Json = serde_json::from_slice(body)?;
    let items = match json {
        Json::Array(items) => items,
        other => return Err(DecodeError::NotAnArray(json_kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_record(index, item))
        .collect()
}

fn decode_record(index: usize, item: Json) -> Result<Record, DecodeError> {
    let object = match item {
        Json::Object(object) => object,
        other => {
            return Err(DecodeError::NotAnObject {
                index,
                found: json_kind(&other),
            })
        }
    };

    object
        .into_iter()
        .map(|(field, json)| match scalar(json) {
            Ok(value) => Ok((field, value)),
            Err(found) => Err(DecodeError::NestedValue {
                index,
                field,
                found,
            }),
        })
        .collect()
}

fn scalar(json: Json) -> Result<Value, &'static str> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::Number(n) => Ok(n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_u64().map(Value::UInt))
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null)),
        Json::String(s) => Ok(Value::Str(s)),
        other => Err(json_kind(&other)),
    }
}

const fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Encode records as a JSON array.
pub fn encode_batch(batch: &[Record]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(batch)
}
