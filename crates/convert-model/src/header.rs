//! Header descriptors and the ordered stage layouts built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ModelError, Result};
use crate::row::Row;
use crate::stage::Stage;

/// Metadata for one column of one stage.
///
/// Field aliases accept the names used by the external header configuration
/// store (`header_name`, `index_value`, `display`, `edit`, `format_value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDescriptor {
    #[serde(alias = "header_name")]
    pub name: String,
    /// Position of the column within the stage; not necessarily contiguous.
    #[serde(alias = "index_value")]
    pub index: usize,
    #[serde(default, alias = "edit", alias = "edit_value")]
    pub is_editable: bool,
    /// Value type hint such as `date` or `text`.
    #[serde(default, alias = "format_value")]
    pub rule_format: Option<String>,
    #[serde(
        default = "default_visible",
        alias = "display",
        deserialize_with = "deserialize_visibility"
    )]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Accepts either a boolean or the `SHOW` / `HIDDEN` / `ALL` markers.
fn deserialize_visibility<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Visibility {
        Flag(bool),
        Marker(String),
    }

    match Visibility::deserialize(deserializer)? {
        Visibility::Flag(flag) => Ok(flag),
        Visibility::Marker(marker) => match marker.trim().to_ascii_uppercase().as_str() {
            "SHOW" | "ALL" | "TRUE" | "1" => Ok(true),
            "HIDDEN" | "HIDE" | "FALSE" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "unknown visibility marker '{other}'"
            ))),
        },
    }
}

impl HeaderDescriptor {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            is_editable: false,
            rule_format: None,
            visible: true,
        }
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.is_editable = editable;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.rule_format = Some(format.into());
        self
    }
}

/// Headers of one stage, sorted by index with unique indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageLayout {
    stage: Stage,
    headers: Vec<HeaderDescriptor>,
}

impl StageLayout {
    pub fn new(stage: Stage, mut headers: Vec<HeaderDescriptor>) -> Result<Self> {
        headers.sort_by_key(|header| header.index);
        for pair in headers.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(ModelError::DuplicateHeaderIndex {
                    index: pair[0].index,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        Ok(Self { stage, headers })
    }

    /// Builds a layout with contiguous indices in the given order.
    pub fn from_names<I, S>(stage: Stage, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| HeaderDescriptor::new(name, index))
            .collect();
        Self { stage, headers }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn headers(&self) -> &[HeaderDescriptor] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of positions in an index-addressed row of this stage.
    pub fn width(&self) -> usize {
        self.headers.last().map_or(0, |header| header.index + 1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|header| header.name.as_str())
    }

    pub fn header_at(&self, index: usize) -> Option<&HeaderDescriptor> {
        self.headers
            .binary_search_by_key(&index, |header| header.index)
            .ok()
            .map(|position| &self.headers[position])
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.header_at(index).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .find(|header| header.name == name)
            .map(|header| header.index)
    }

    pub fn require_index_of(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| ModelError::HeaderNotFound {
            name: name.to_string(),
        })
    }

    pub fn visible(&self) -> impl Iterator<Item = &HeaderDescriptor> {
        self.headers.iter().filter(|header| header.visible)
    }

    pub fn empty_row(&self) -> Row {
        vec![String::new(); self.width()]
    }

    /// Values of an index-addressed row in header order.
    pub fn project(&self, row: &[String]) -> Vec<String> {
        self.headers
            .iter()
            .map(|header| row.get(header.index).cloned().unwrap_or_default())
            .collect()
    }

    /// Values keyed by header name.
    pub fn to_named(&self, row: &[String]) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|header| {
                (
                    header.name.clone(),
                    row.get(header.index).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}
