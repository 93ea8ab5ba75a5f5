//! XML reading: every `<record>` element is one row and its direct child
//! elements are the fields.

use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use crate::decode::decode_text;
use crate::error::{IngestError, Result};
use crate::format::{EncodingFallback, FormatSpec, TextEncoding};
use crate::source::SourceFile;

use super::{Projection, Rows};

const RECORD: &[u8] = b"record";

type Record = Vec<(String, String)>;

/// Streams records out of an XML document.
struct XmlRecords {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    file: String,
    finished: bool,
}

impl XmlRecords {
    fn new(file: &str, text: String) -> Self {
        Self {
            reader: Reader::from_reader(Cursor::new(text.into_bytes())),
            buf: Vec::new(),
            file: file.to_string(),
            finished: false,
        }
    }

    fn next_record(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }
        let mut record: Option<Record> = None;
        // Element depth below the open <record>.
        let mut depth = 0usize;
        let mut field: Option<(String, String)> = None;

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(error) => {
                    tracing::warn!(
                        file = %self.file,
                        position = self.reader.error_position(),
                        %error,
                        "stopping at malformed XML"
                    );
                    self.finished = true;
                    return None;
                }
            };

            match event {
                Event::Start(element) => {
                    if record.is_some() {
                        depth += 1;
                        if depth == 1 {
                            field = Some((element_name(element.local_name().as_ref()), String::new()));
                        }
                    } else if element.local_name().as_ref() == RECORD {
                        record = Some(Vec::new());
                        depth = 0;
                    }
                }
                Event::Empty(element) => match record.as_mut() {
                    Some(values) if depth == 0 => {
                        push_field(values, element_name(element.local_name().as_ref()), String::new());
                    }
                    Some(_) => {}
                    None if element.local_name().as_ref() == RECORD => return Some(Vec::new()),
                    None => {}
                },
                Event::End(_) => {
                    if let Some(values) = record.as_mut() {
                        if depth == 0 {
                            return record;
                        }
                        if depth == 1
                            && let Some((name, text)) = field.take()
                        {
                            push_field(values, name, text.trim().to_string());
                        }
                        depth -= 1;
                    }
                }
                Event::Text(text) if depth == 1 => {
                    if let Some((_, value)) = field.as_mut() {
                        let raw = String::from_utf8_lossy(&text);
                        match unescape(&raw) {
                            Ok(unescaped) => value.push_str(&unescaped),
                            Err(_) => value.push_str(&raw),
                        }
                    }
                }
                Event::CData(data) if depth == 1 => {
                    if let Some((_, value)) = field.as_mut() {
                        value.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::GeneralRef(reference) if depth == 1 => {
                    if let Some((_, value)) = field.as_mut() {
                        let name = String::from_utf8_lossy(&reference);
                        match resolve_entity(&name) {
                            Some(resolved) => value.push(resolved),
                            None => {
                                value.push('&');
                                value.push_str(&name);
                                value.push(';');
                            }
                        }
                    }
                }
                Event::Eof => {
                    if record.is_some() {
                        tracing::warn!(file = %self.file, "dropping unterminated XML record");
                    }
                    self.finished = true;
                    return None;
                }
                _ => {}
            }
        }
    }
}

fn element_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn push_field(values: &mut Record, name: String, text: String) {
    if !values.iter().any(|(existing, _)| *existing == name) {
        values.push((name, text));
    }
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Fails fast on documents with no root element or a broken prolog.
fn check_document(file: &str, text: &str) -> Result<()> {
    let mut reader = Reader::from_reader(text.as_bytes());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_) | Event::Empty(_)) => return Ok(()),
            Ok(Event::Eof) => {
                return Err(IngestError::EmptyFile {
                    file: file.to_string(),
                });
            }
            Ok(_) => buf.clear(),
            Err(error) => {
                return Err(IngestError::Xml {
                    file: file.to_string(),
                    message: error.to_string(),
                });
            }
        }
    }
}

fn open(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<(XmlRecords, TextEncoding)> {
    let decoded = decode_text(&file.name, &file.bytes, spec.encoding, fallback)?;
    check_document(&file.name, &decoded.text)?;
    Ok((XmlRecords::new(&file.name, decoded.text), decoded.encoding))
}

pub(super) fn read(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
    projection: Projection,
) -> Result<Rows> {
    let (mut records, encoding) = open(file, spec, fallback)?;
    let rows = std::iter::from_fn(move || records.next_record())
        .map(move |record| projection.keyed_row(&record));
    Ok(Rows::new(rows, Some(encoding)))
}

/// Field names of the first record, in document order.
pub(super) fn headers(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<Vec<String>> {
    let (mut records, _) = open(file, spec, fallback)?;
    records
        .next_record()
        .map(|record| record.into_iter().map(|(name, _)| name).collect())
        .ok_or_else(|| IngestError::EmptyFile {
            file: file.name.clone(),
        })
}
