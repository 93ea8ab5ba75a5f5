//! Operations on the stored rows of one session: paging, cell edits,
//! export and cleanup.

use std::sync::Arc;

use convert_ingest::FileFormatId;
use convert_model::{BatchId, RawRow, Row, SessionId, StageLayout, StoredBatch};
use convert_output::{OutputArtifact, OutputWriter};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::store::BatchStore;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MIN_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedRow {
    pub row_index: u64,
    pub values: Row,
}

/// One page of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub rows: Vec<PagedRow>,
}

/// Handle on the batches of one session.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn BatchStore>,
    session_id: SessionId,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn BatchStore>, session_id: SessionId) -> Self {
        Self { store, session_id }
    }

    pub fn id(&self) -> &SessionId {
        &self.session_id
    }

    /// Readable batches of the stage of `layout`, in sequence order.
    fn batches(&self, layout: &StageLayout) -> Result<Vec<(BatchId, StoredBatch)>> {
        let mut batches = Vec::new();
        for id in self.store.list(&self.session_id, layout.stage())? {
            match self.store.get_batch(&id) {
                Ok(Some(batch)) => batches.push((id, batch)),
                Ok(None) => {}
                Err(error) => tracing::warn!(key = %id, %error, "skipping unreadable batch"),
            }
        }
        Ok(batches)
    }

    /// Every row of the stage with its global row index.
    pub fn rows(&self, layout: &StageLayout) -> Result<Vec<PagedRow>> {
        let mut rows = Vec::new();
        for (_, batch) in self.batches(layout)? {
            let start = batch.start_row_index;
            rows.extend(batch.rows.into_iter().enumerate().map(|(offset, row)| PagedRow {
                row_index: start + offset as u64,
                values: row.into_positional(layout),
            }));
        }
        Ok(rows)
    }

    /// Rows of page `page` (1-based); `page_size` is clamped to
    /// 10..=100 and defaults to 20.
    pub fn paginate(&self, layout: &StageLayout, page: usize, page_size: Option<usize>) -> Result<Page> {
        let page = page.max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        let first = (page - 1).saturating_mul(page_size);

        let mut total_rows = 0usize;
        let mut rows = Vec::new();
        for (_, batch) in self.batches(layout)? {
            let count = batch.len();
            let batch_first = total_rows;
            total_rows += count;
            if total_rows <= first || batch_first >= first + page_size {
                continue;
            }
            let skip = first.saturating_sub(batch_first);
            let take = page_size - rows.len();
            let start = batch.start_row_index;
            rows.extend(
                batch
                    .rows
                    .into_iter()
                    .enumerate()
                    .skip(skip)
                    .take(take)
                    .map(|(offset, row)| PagedRow {
                        row_index: start + offset as u64,
                        values: row.into_positional(layout),
                    }),
            );
        }

        Ok(Page {
            page,
            page_size,
            total_rows,
            total_pages: total_rows.div_ceil(page_size),
            rows,
        })
    }

    /// Replaces one cell, addressed by global row index and header name.
    pub fn update_cell(
        &self,
        layout: &StageLayout,
        row_index: u64,
        header: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let stage = layout.stage();
        let column = layout.index_of(header).ok_or_else(|| CoreError::HeaderNotFound {
            header: header.to_string(),
            stage,
        })?;

        for (id, mut batch) in self.batches(layout)? {
            if !batch.row_indices().contains(&row_index) {
                continue;
            }
            let offset = (row_index - batch.start_row_index) as usize;
            let mut row = std::mem::replace(&mut batch.rows[offset], RawRow::Positional(Vec::new()))
                .into_positional(layout);
            row[column] = value.into();
            batch.rows[offset] = RawRow::Positional(row);
            self.store.put_batch(&id, &batch)?;
            tracing::info!(key = %id, row_index, header, "updated cell");
            return Ok(());
        }
        Err(CoreError::RowNotFound { row_index, stage })
    }

    /// Writes every row of the stage in `format`, columns in header order.
    pub fn export(
        &self,
        layout: &StageLayout,
        writer: &OutputWriter,
        format: FileFormatId,
        stem: &str,
    ) -> Result<OutputArtifact> {
        let rows: Vec<Vec<String>> = self
            .rows(layout)?
            .into_iter()
            .map(|row| layout.project(&row.values))
            .collect();
        if rows.is_empty() {
            return Err(CoreError::NoData {
                stage: layout.stage(),
            });
        }
        let headers: Vec<String> = layout.names().map(str::to_string).collect();
        let artifact = writer.write_artifact(&rows, &headers, format, stem)?;
        tracing::info!(
            session_id = %self.session_id,
            stage = layout.stage().batch_name(),
            format = format.id(),
            rows = rows.len(),
            bytes = artifact.bytes.len(),
            "exported stage"
        );
        Ok(artifact)
    }

    /// Deletes every batch of the session.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.store.delete_session(&self.session_id)?;
        tracing::debug!(session_id = %self.session_id, removed, "cleared session");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBatchStore;
    use convert_model::{HeaderDescriptor, Stage};

    fn layout() -> StageLayout {
        StageLayout::new(
            Stage::Display,
            vec![HeaderDescriptor::new("A", 0), HeaderDescriptor::new("B", 1)],
        )
        .unwrap()
    }

    /// Three batches of 10, 15 and 5 rows; cell A holds the row index.
    fn session() -> Session {
        let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
        let session_id = SessionId::new("s1").unwrap();
        let mut start = 0u64;
        for (sequence, count) in [(1u64, 10u64), (2, 15), (3, 5)] {
            let rows = (start..start + count)
                .map(|index| RawRow::Positional(vec![index.to_string(), "b".into()]))
                .collect();
            store
                .put_batch(
                    &BatchId::new(session_id.clone(), Stage::Display, sequence),
                    &StoredBatch::new(start, rows),
                )
                .unwrap();
            start += count;
        }
        Session::new(store, session_id)
    }

    #[test]
    fn test_pages_span_batches() {
        let session = session();
        let page = session.paginate(&layout(), 1, None).unwrap();
        assert_eq!(page.page_size, 20);
        assert_eq!(page.total_rows, 30);
        assert_eq!(page.total_pages, 2);
        let indices: Vec<u64> = page.rows.iter().map(|row| row.row_index).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());

        let page = session.paginate(&layout(), 2, None).unwrap();
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.rows[0].values, ["20", "b"]);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let session = session();
        assert_eq!(session.paginate(&layout(), 1, Some(3)).unwrap().page_size, 10);
        let page = session.paginate(&layout(), 0, Some(500)).unwrap();
        assert_eq!((page.page, page.page_size, page.total_pages), (1, 100, 1));
        assert!(session.paginate(&layout(), 9, None).unwrap().rows.is_empty());
    }

    #[test]
    fn test_update_cell() {
        let session = session();
        session.update_cell(&layout(), 12, "B", "edited").unwrap();
        let rows = session.rows(&layout()).unwrap();
        assert_eq!(rows[12].values, ["12", "edited"]);
        assert_eq!(rows[11].values, ["11", "b"]);

        assert!(matches!(
            session.update_cell(&layout(), 30, "B", "x"),
            Err(CoreError::RowNotFound { row_index: 30, .. })
        ));
        assert!(matches!(
            session.update_cell(&layout(), 0, "C", "x"),
            Err(CoreError::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn test_export_and_clear() {
        let session = session();
        let artifact = session
            .export(&layout(), &OutputWriter::default(), FileFormatId::CsvCommaUtf8, "out")
            .unwrap();
        assert_eq!(artifact.file_name, "out.csv");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("A,B\r\n0,b\r\n1,b\r\n"));
        assert_eq!(text.lines().count(), 31);

        assert_eq!(session.clear().unwrap(), 3);
        assert!(matches!(
            session.export(&layout(), &OutputWriter::default(), FileFormatId::CsvCommaUtf8, "out"),
            Err(CoreError::NoData { .. })
        ));
    }
}
