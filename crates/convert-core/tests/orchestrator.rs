use std::sync::Arc;

use convert_core::{
    BatchOrchestrator, BatchStore, MemoryBatchStore, OrchestratorOptions, Session, StageRun,
};
use convert_ingest::{FileFormatId, SourceFile};
use convert_model::{
    BatchId, HeaderDescriptor, RawRow, RuleBinding, SessionId, Stage, StageLayout, StoredBatch,
    TenantId,
};
use convert_output::OutputWriter;
use convert_rules::{FixedRule, FixedValueCache, InMemoryFixedValues};
use proptest::prelude::*;

fn input_layout() -> StageLayout {
    StageLayout::new(
        Stage::Input,
        vec![
            HeaderDescriptor::new("氏名", 0),
            HeaderDescriptor::new("生年月日", 1),
            HeaderDescriptor::new("性別", 2),
            HeaderDescriptor::new("グループ", 3),
        ],
    )
    .unwrap()
}

fn display_layout() -> StageLayout {
    StageLayout::from_names(Stage::Display, ["性別", "氏名", "生年月日", "グループ"])
}

fn bindings() -> Vec<RuleBinding> {
    vec![
        RuleBinding::new("GENDER_MF", 2, 0),
        RuleBinding::new("NOT_CHANGE", 0, 1),
        RuleBinding::new("DATE1", 1, 2),
        RuleBinding::new("GROUP_NO", 3, 3),
    ]
}

fn orchestrator(store: Arc<dyn BatchStore>) -> BatchOrchestrator {
    let mut values = InMemoryFixedValues::new();
    values.insert(TenantId(1), FixedRule::GroupNo, "A", "G-01");
    BatchOrchestrator::with_options(
        store,
        Arc::new(FixedValueCache::new(Arc::new(values))),
        OrchestratorOptions {
            workers: Some(2),
            ..OrchestratorOptions::default()
        },
    )
    .unwrap()
}

fn session_id() -> SessionId {
    SessionId::new("upload-1").unwrap()
}

fn csv_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "first.csv",
            "氏名,生年月日,性別,グループ\n山田,令和5年4月1日,男性,A\n佐藤,2024-05-01,女,B\n",
        ),
        SourceFile::new("second.csv", "性別,氏名\n1,鈴木\n"),
    ]
}

#[test]
fn test_ingest_then_map_keeps_global_order() {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let orchestrator = orchestrator(Arc::clone(&store));
    let session_id = session_id();
    let (input, display) = (input_layout(), display_layout());

    let status = orchestrator.ingest(&session_id, &csv_files(), &input, None);
    assert!(status.is_success(), "{}", status.message);
    assert_eq!((status.batches_written, status.rows), (2, 3));
    let sequences: Vec<u64> = store
        .list(&session_id, Stage::Input)
        .unwrap()
        .into_iter()
        .map(|id| id.sequence)
        .collect();
    assert_eq!(sequences, [1, 2]);

    let status = orchestrator.run(&StageRun {
        session_id: &session_id,
        tenant_id: TenantId(1),
        bindings: &bindings(),
        before: &input,
        after: &display,
    });
    assert!(status.is_success(), "{}", status.message);
    assert_eq!(status.rows, 3);

    let rows = Session::new(Arc::clone(&store), session_id.clone())
        .rows(&display)
        .unwrap();
    let indices: Vec<u64> = rows.iter().map(|row| row.row_index).collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(rows[0].values, ["M", "山田", "2023/04/01", "G-01"]);
    // Lookup misses keep the raw value.
    assert_eq!(rows[1].values, ["F", "佐藤", "2024/05/01", "B"]);
    // Columns missing from the file map to empty strings.
    assert_eq!(rows[2].values, ["M", "鈴木", "", ""]);

    let second = store
        .get_batch(&BatchId::new(session_id, Stage::Display, 2))
        .unwrap()
        .unwrap();
    assert_eq!(second.start_row_index, 2);
}

#[test]
fn test_unreadable_file_is_skipped() {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let orchestrator = orchestrator(Arc::clone(&store));
    let mut files = csv_files();
    files.insert(0, SourceFile::new("empty.csv", ""));

    let status = orchestrator.ingest(&session_id(), &files, &input_layout(), None);
    assert!(status.is_success());
    assert_eq!((status.batches_written, status.batches_skipped), (2, 1));
    let sequences: Vec<u64> = store
        .list(&session_id(), Stage::Input)
        .unwrap()
        .into_iter()
        .map(|id| id.sequence)
        .collect();
    assert_eq!(sequences, [2, 3]);

    let status = orchestrator.ingest(
        &session_id(),
        &[SourceFile::new("empty.csv", "")],
        &input_layout(),
        Some(FileFormatId::CsvCommaUtf8),
    );
    assert!(!status.is_success());
}

#[test]
fn test_corrupt_batch_is_skipped() {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let orchestrator = orchestrator(Arc::clone(&store));
    let session_id = session_id();
    let input = input_layout();
    let id = |sequence| BatchId::new(session_id.clone(), Stage::Input, sequence);

    store
        .put_batch(
            &id(1),
            &StoredBatch::new(0, vec![RawRow::Positional(vec!["a".into(); 4])]),
        )
        .unwrap();
    store.put_raw(&id(2), b"{not json".to_vec()).unwrap();
    // A bare array is read as a batch.
    store
        .put_raw(&id(10), r#"[{"氏名": "b", "性別": "2"}]"#.as_bytes().to_vec())
        .unwrap();

    let status = orchestrator.run(&StageRun {
        session_id: &session_id,
        tenant_id: TenantId(1),
        bindings: &bindings(),
        before: &input,
        after: &display_layout(),
    });
    assert!(status.is_success(), "{}", status.message);
    assert_eq!(
        (status.batches_written, status.batches_skipped, status.rows),
        (2, 1, 2)
    );

    let mapped = store
        .get_batch(&BatchId::new(session_id.clone(), Stage::Display, 10))
        .unwrap()
        .unwrap();
    assert_eq!(mapped.start_row_index, 1);
    assert_eq!(
        mapped.rows,
        [RawRow::Positional(vec!["F".into(), "b".into(), String::new(), String::new()])]
    );
}

#[test]
fn test_configuration_errors_fail_the_run() {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let orchestrator = orchestrator(Arc::clone(&store));
    let session_id = session_id();
    let (input, display) = (input_layout(), display_layout());
    orchestrator.ingest(&session_id, &csv_files(), &input, None);

    let duplicate = [
        RuleBinding::new("NOT_CHANGE", 0, 1),
        RuleBinding::new("DATE1", 1, 1),
    ];
    let status = orchestrator.run(&StageRun {
        session_id: &session_id,
        tenant_id: TenantId(1),
        bindings: &duplicate,
        before: &input,
        after: &display,
    });
    assert!(!status.is_success());
    assert!(store.list(&session_id, Stage::Display).unwrap().is_empty());

    let status = orchestrator.run(&StageRun {
        session_id: &session_id,
        tenant_id: TenantId(1),
        bindings: &bindings(),
        before: &display,
        after: &display_layout(),
    });
    assert!(!status.is_success());
    assert_eq!(status.message, "no data found for display stage");
}

fn exported(batch_sizes: &[usize]) -> Vec<u8> {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let orchestrator = orchestrator(Arc::clone(&store));
    let session_id = session_id();
    let mut start = 0u64;
    for (position, size) in batch_sizes.iter().enumerate() {
        let rows = (0..*size)
            .map(|offset| {
                RawRow::Positional(vec![
                    format!("name-{start}-{offset}"),
                    "2024/01/02".into(),
                    if offset % 2 == 0 { "男" } else { "女" }.into(),
                    "A".into(),
                ])
            })
            .collect();
        let id = BatchId::new(session_id.clone(), Stage::Input, position as u64 + 1);
        store.put_batch(&id, &StoredBatch::new(start, rows)).unwrap();
        start += *size as u64;
    }

    let display = display_layout();
    let status = orchestrator.run(&StageRun {
        session_id: &session_id,
        tenant_id: TenantId(1),
        bindings: &bindings(),
        before: &input_layout(),
        after: &display,
    });
    assert!(status.is_success());
    assert_eq!(status.rows, start);
    Session::new(store, session_id)
        .export(&display, &OutputWriter::default(), FileFormatId::CsvCommaUtf8, "out")
        .unwrap()
        .bytes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_runs_are_deterministic(sizes in prop::collection::vec(1usize..40, 1..6)) {
        let first = exported(&sizes);
        prop_assert_eq!(&first, &exported(&sizes));
        let total: usize = sizes.iter().sum();
        prop_assert_eq!(String::from_utf8(first).unwrap().lines().count(), total + 1);
    }
}
