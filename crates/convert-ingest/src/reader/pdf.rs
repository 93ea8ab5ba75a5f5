//! PDF form reading: each page with widget annotations is one row.

use lopdf::{Dictionary, Document, Object};

use crate::error::{IngestError, Result};
use crate::source::SourceFile;

use super::{Projection, Rows};

/// Parent chains deeper than this are treated as cyclic.
const MAX_FIELD_DEPTH: usize = 32;

#[derive(Debug)]
struct FormField {
    full_name: String,
    leaf_name: String,
    value: String,
}

fn load(file: &SourceFile) -> Result<Document> {
    Document::load_mem(&file.bytes).map_err(|error| IngestError::Pdf {
        file: file.name.clone(),
        message: error.to_string(),
    })
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// PDF text strings are UTF-16BE with a byte order mark or PDFDocEncoding,
/// approximated here by windows-1252.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => encoding_rs::UTF_16BE
            .decode_without_bom_handling(utf16)
            .0
            .into_owned(),
        None => encoding_rs::WINDOWS_1252
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

fn object_text(document: &Document, object: &Object) -> String {
    match resolve(document, object) {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Integer(value) => value.to_string(),
        Object::Real(value) => value.to_string(),
        Object::Boolean(value) => value.to_string(),
        Object::Array(items) => items
            .iter()
            .map(|item| object_text(document, item))
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// Walks from a widget up its `/Parent` chain, collecting partial names and
/// the nearest `/V`.
fn form_field(document: &Document, widget: &Dictionary) -> Option<FormField> {
    let mut parts = Vec::new();
    let mut value = None;
    let mut current = Some(widget);
    let mut depth = 0;

    while let Some(node) = current {
        if let Ok(partial) = node.get(b"T") {
            parts.push(object_text(document, partial));
        }
        if value.is_none()
            && let Ok(found) = node.get(b"V")
        {
            value = Some(object_text(document, found));
        }
        depth += 1;
        if depth >= MAX_FIELD_DEPTH {
            break;
        }
        current = node
            .get(b"Parent")
            .ok()
            .and_then(|parent| resolve(document, parent).as_dict().ok());
    }

    let leaf_name = parts.first()?.clone();
    parts.reverse();
    Some(FormField {
        full_name: parts.join("."),
        leaf_name,
        value: value.unwrap_or_default(),
    })
}

fn page_fields(document: &Document, page_id: lopdf::ObjectId) -> Vec<FormField> {
    let Ok(page) = document.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Ok(annots) = page.get(b"Annots") else {
        return Vec::new();
    };
    let Ok(annots) = resolve(document, annots).as_array() else {
        return Vec::new();
    };
    annots
        .iter()
        .filter_map(|annot| resolve(document, annot).as_dict().ok())
        .filter(|annot| {
            annot
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|subtype| subtype == b"Widget")
        })
        .filter_map(|widget| form_field(document, widget))
        .collect()
}

fn form_pages(file: &SourceFile) -> Result<Vec<Vec<FormField>>> {
    let document = load(file)?;
    let mut pages = Vec::new();
    for (number, page_id) in document.get_pages() {
        let fields = page_fields(&document, page_id);
        if fields.is_empty() {
            tracing::debug!(file = %file.name, page = number, "skipping page without form fields");
            continue;
        }
        pages.push(fields);
    }
    Ok(pages)
}

/// Fields are matched by full dotted name first, then by leaf name.
fn record(fields: &[FormField]) -> Vec<(String, String)> {
    let full = fields
        .iter()
        .map(|field| (field.full_name.clone(), field.value.clone()));
    let leaf = fields
        .iter()
        .filter(|field| field.leaf_name != field.full_name)
        .map(|field| (field.leaf_name.clone(), field.value.clone()));
    full.chain(leaf).collect()
}

pub(super) fn read(file: &SourceFile, projection: &Projection) -> Result<Rows> {
    let pages = form_pages(file)?;
    if pages.is_empty() {
        tracing::warn!(file = %file.name, "PDF has no form fields");
    }
    let projection = projection.clone();
    let rows = pages
        .into_iter()
        .map(move |fields| projection.keyed_row(&record(&fields)));
    Ok(Rows::new(rows, None))
}

/// Full field names of the first page that has any.
pub(super) fn headers(file: &SourceFile) -> Result<Vec<String>> {
    form_pages(file)?
        .into_iter()
        .next()
        .map(|fields| fields.into_iter().map(|field| field.full_name).collect())
        .ok_or_else(|| IngestError::EmptyFile {
            file: file.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Taro"), "Taro");
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x5C, 0x71, 0x75, 0x30]), "山田");
    }
}
