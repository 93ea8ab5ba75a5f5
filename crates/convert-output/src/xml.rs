//! XML output: `<root><record><header>value</header>...</record></root>`.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{OutputError, Result};

/// Element name for a header; characters XML does not allow in names
/// become `_`, and a name that cannot start an element gets a `_` prefix.
pub fn element_name(header: &str) -> String {
    let mut name: String = header
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|ch| ch.is_alphabetic() || ch == '_');
    if !starts_ok || name.to_ascii_lowercase().starts_with("xml") {
        name.insert(0, '_');
    }
    name
}

fn xml_error(error: impl std::fmt::Display) -> OutputError {
    OutputError::Xml {
        message: error.to_string(),
    }
}

pub fn write_xml(rows: &[Vec<String>], headers: &[String]) -> Result<Vec<u8>> {
    let names: Vec<String> = headers.iter().map(|header| element_name(header)).collect();
    let mut xml = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    xml.write_event(Event::Start(BytesStart::new("root")))
        .map_err(xml_error)?;
    for row in rows {
        xml.write_event(Event::Start(BytesStart::new("record")))
            .map_err(xml_error)?;
        for (position, name) in names.iter().enumerate() {
            let value = row.get(position).map(String::as_str).unwrap_or_default();
            if value.is_empty() {
                xml.write_event(Event::Empty(BytesStart::new(name.as_str())))
                    .map_err(xml_error)?;
                continue;
            }
            xml.write_event(Event::Start(BytesStart::new(name.as_str())))
                .map_err(xml_error)?;
            xml.write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_error)?;
            xml.write_event(Event::End(BytesEnd::new(name.as_str())))
                .map_err(xml_error)?;
        }
        xml.write_event(Event::End(BytesEnd::new("record")))
            .map_err(xml_error)?;
    }
    xml.write_event(Event::End(BytesEnd::new("root")))
        .map_err(xml_error)?;

    Ok(xml.into_inner().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_name() {
        assert_eq!(element_name("氏名"), "氏名");
        assert_eq!(element_name("birth date"), "birth_date");
        assert_eq!(element_name("1st"), "_1st");
        assert_eq!(element_name("xml_id"), "_xml_id");
    }
}
