//! Header discovery from sample files.

use std::collections::BTreeMap;

use convert_model::{HeaderDescriptor, Stage, StageLayout};
use serde::Serialize;

use crate::detect::FormatDetector;
use crate::error::Result;
use crate::format::FileFormatId;
use crate::reader::RowReader;
use crate::source::SourceFile;

/// Header names of a sample file in file order.
pub fn discover_headers(file: &SourceFile, format_id: Option<FileFormatId>) -> Result<Vec<String>> {
    let detector = FormatDetector::default();
    let spec = detector.detect_file(file, format_id)?;
    let headers = RowReader::new(detector.fallback().clone()).headers(file, &spec)?;
    tracing::debug!(file = %file.name, headers = headers.len(), "discovered headers");
    Ok(headers)
}

/// Where a header sits in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderPlacement {
    pub index: usize,
    pub visible: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderEntry {
    pub name: String,
    pub placements: BTreeMap<Stage, HeaderPlacement>,
}

/// Headers seen across the input, display and system output samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderCatalog {
    entries: Vec<HeaderEntry>,
}

impl HeaderCatalog {
    /// Merges sample header lists; entries keep first-seen order and the
    /// index of a header in a stage is its position in that sample. Display
    /// headers are editable.
    pub fn from_samples(input: &[String], display: &[String], output: &[String]) -> Self {
        let mut catalog = Self::default();
        for (stage, names) in [
            (Stage::Input, input),
            (Stage::Display, display),
            (Stage::SystemOutput, output),
        ] {
            for (index, name) in names.iter().enumerate() {
                catalog.place(
                    name,
                    stage,
                    HeaderPlacement {
                        index,
                        visible: true,
                        editable: stage == Stage::Display,
                    },
                );
            }
        }
        catalog
    }

    fn place(&mut self, name: &str, stage: Stage, placement: HeaderPlacement) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.placements.entry(stage).or_insert(placement);
            }
            None => self.entries.push(HeaderEntry {
                name: name.to_string(),
                placements: BTreeMap::from([(stage, placement)]),
            }),
        }
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&HeaderEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layout of the headers placed in `stage`.
    pub fn layout(&self, stage: Stage) -> convert_model::Result<StageLayout> {
        let headers = self
            .entries
            .iter()
            .filter_map(|entry| {
                let placement = entry.placements.get(&stage)?;
                let header = HeaderDescriptor::new(entry.name.clone(), placement.index)
                    .editable(placement.editable);
                Some(if placement.visible { header } else { header.hidden() })
            })
            .collect();
        StageLayout::new(stage, headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn test_from_samples_merges_in_first_seen_order() {
        let catalog = HeaderCatalog::from_samples(
            &names(&["氏名", "生年月日"]),
            &names(&["生年月日", "氏名", "性別"]),
            &names(&["性別"]),
        );
        let order: Vec<_> = catalog.entries().iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(order, ["氏名", "生年月日", "性別"]);

        let birth = catalog.get("生年月日").unwrap();
        assert_eq!(birth.placements[&Stage::Input].index, 1);
        assert_eq!(birth.placements[&Stage::Display].index, 0);
        assert!(birth.placements[&Stage::Display].editable);
        assert!(!birth.placements.contains_key(&Stage::SystemOutput));
    }

    #[test]
    fn test_layout_per_stage() {
        let catalog =
            HeaderCatalog::from_samples(&names(&["A", "B"]), &names(&["B", "A"]), &[]);
        let display = catalog.layout(Stage::Display).unwrap();
        assert_eq!(display.names().collect::<Vec<_>>(), ["B", "A"]);
        assert!(catalog.layout(Stage::SystemOutput).unwrap().is_empty());
    }
}
