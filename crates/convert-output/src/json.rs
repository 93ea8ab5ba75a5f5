//! JSON output: a pretty array of objects keyed by header, in header order.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{OutputError, Result};

struct Record<'a> {
    headers: &'a [String],
    row: &'a [String],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (position, header) in self.headers.iter().enumerate() {
            let value = self.row.get(position).map(String::as_str).unwrap_or_default();
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

struct Records<'a> {
    headers: &'a [String],
    rows: &'a [Vec<String>],
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&Record {
                headers: self.headers,
                row,
            })?;
        }
        seq.end()
    }
}

pub fn write_json(rows: &[Vec<String>], headers: &[String]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(&Records { headers, rows }).map_err(|source| OutputError::Json { source })
}
