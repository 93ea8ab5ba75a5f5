//! JSON reading: an array of objects or one object.

use serde_json::{Map, Value};

use crate::decode::decode_text;
use crate::error::{IngestError, Result};
use crate::format::{EncodingFallback, FormatSpec, TextEncoding};
use crate::source::SourceFile;

use super::{Projection, Rows};

fn parse(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<(Vec<Value>, TextEncoding)> {
    let decoded = decode_text(&file.name, &file.bytes, spec.encoding, fallback)?;
    let value: Value = serde_json::from_str(&decoded.text).map_err(|error| IngestError::Json {
        file: file.name.clone(),
        message: error.to_string(),
    })?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Err(IngestError::Json {
                file: file.name.clone(),
                message: "expected an array of objects or a single object".to_string(),
            });
        }
    };
    Ok((items, decoded.encoding))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn row(projection: &Projection, object: &Map<String, Value>) -> convert_model::RawRow {
    projection.row(|header| object.get(header.name.trim()).map(text_of))
}

pub(super) fn read(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
    projection: &Projection,
) -> Result<Rows> {
    let (items, encoding) = parse(file, spec, fallback)?;
    let projection = projection.clone();
    let name = file.name.clone();
    let rows = items
        .into_iter()
        .enumerate()
        .filter_map(move |(position, item)| match item {
            Value::Object(object) => Some(row(&projection, &object)),
            _ => {
                tracing::warn!(file = %name, position, "skipping JSON element that is not an object");
                None
            }
        });
    Ok(Rows::new(rows, Some(encoding)))
}

/// Keys of the first object.
pub(super) fn headers(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<Vec<String>> {
    let (items, _) = parse(file, spec, fallback)?;
    items
        .iter()
        .find_map(Value::as_object)
        .map(|object| object.keys().cloned().collect())
        .ok_or_else(|| IngestError::EmptyFile {
            file: file.name.clone(),
        })
}
