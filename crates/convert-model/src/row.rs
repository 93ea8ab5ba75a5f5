use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::header::StageLayout;

/// Canonical row: index-addressed, position equals header descriptor index.
pub type Row = Vec<String>;

/// A row as produced by a reader or loaded from a stored batch.
///
/// Readers may hand out rows keyed by header name or rows addressed by
/// position. Everything downstream of ingestion works on [`Row`], obtained
/// through [`RawRow::into_positional`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRow {
    Positional(Vec<String>),
    Named(BTreeMap<String, String>),
}

impl RawRow {
    /// Value for the column at `index` of `layout`, if present.
    pub fn value_at<'a>(&'a self, index: usize, layout: &StageLayout) -> Option<&'a str> {
        match self {
            RawRow::Positional(values) => values.get(index).map(String::as_str),
            RawRow::Named(values) => layout
                .header_at(index)
                .and_then(|header| values.get(&header.name))
                .map(String::as_str),
        }
    }

    /// Converts to an index-addressed row exactly `layout.width()` long.
    ///
    /// Missing columns become empty strings; values outside the layout are
    /// dropped.
    pub fn into_positional(self, layout: &StageLayout) -> Row {
        let width = layout.width();
        match self {
            RawRow::Positional(mut values) => {
                values.resize(width, String::new());
                values
            }
            RawRow::Named(mut values) => {
                let mut row = vec![String::new(); width];
                for header in layout.headers() {
                    if let Some(value) = values.remove(&header.name) {
                        row[header.index] = value;
                    }
                }
                row
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawRow::Positional(values) => values.iter().all(String::is_empty),
            RawRow::Named(values) => values.values().all(String::is_empty),
        }
    }
}

impl From<Row> for RawRow {
    fn from(row: Row) -> Self {
        RawRow::Positional(row)
    }
}

/// Stored value of one batch: its rows plus the global index of the first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredBatch {
    pub start_row_index: u64,
    pub rows: Vec<RawRow>,
}

impl StoredBatch {
    pub fn new(start_row_index: u64, rows: Vec<RawRow>) -> Self {
        Self {
            start_row_index,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Global row indices covered by this batch.
    pub fn row_indices(&self) -> Range<u64> {
        self.start_row_index..self.start_row_index + self.rows.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderDescriptor;
    use crate::stage::Stage;

    fn layout() -> StageLayout {
        StageLayout::new(
            Stage::Input,
            vec![
                HeaderDescriptor::new("name", 0),
                HeaderDescriptor::new("birth", 1),
                HeaderDescriptor::new("zip", 3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn named_row_becomes_index_addressed() {
        let mut values = BTreeMap::new();
        values.insert("zip".to_string(), "1234567".to_string());
        values.insert("name".to_string(), "山田".to_string());
        values.insert("unrelated".to_string(), "x".to_string());
        let row = RawRow::Named(values).into_positional(&layout());
        assert_eq!(row, vec!["山田", "", "", "1234567"]);
    }

    #[test]
    fn positional_row_is_padded_and_truncated() {
        let short = RawRow::Positional(vec!["a".into()]).into_positional(&layout());
        assert_eq!(short, vec!["a", "", "", ""]);
        let long = RawRow::Positional((0..6).map(|i| i.to_string()).collect());
        assert_eq!(long.into_positional(&layout()).len(), 4);
    }

    #[test]
    fn value_at_resolves_names_through_layout() {
        let mut values = BTreeMap::new();
        values.insert("birth".to_string(), "S50.1.2".to_string());
        let row = RawRow::Named(values);
        assert_eq!(row.value_at(1, &layout()), Some("S50.1.2"));
        assert_eq!(row.value_at(2, &layout()), None);
    }

    #[test]
    fn stored_batch_serializes_both_row_shapes() {
        let batch = StoredBatch::new(
            4,
            vec![
                RawRow::Positional(vec!["a".into(), "b".into()]),
                RawRow::Named(BTreeMap::from([("k".to_string(), "v".to_string())])),
            ],
        );
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(
            json,
            r#"{"start_row_index":4,"rows":[["a","b"],{"k":"v"}]}"#
        );
        let back: StoredBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch);
        assert_eq!(back.row_indices(), 4..6);
    }
}
