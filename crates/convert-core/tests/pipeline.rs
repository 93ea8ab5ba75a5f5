use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use convert_core::{
    BatchStore, ConversionPipeline, ConversionProfile, CoreError, FileBatchStore, MemoryBatchStore,
};
use convert_ingest::{FileFormatId, SourceFile};
use convert_model::{SessionId, Stage};
use tempfile::tempdir;

const PROFILE: &str = r#"
tenant_id = 1
workers = 2

[layouts]
input = [
    { header_name = "氏名", index_value = 0 },
    { header_name = "性別", index_value = 1 },
    { header_name = "郵便番号", index_value = 2 },
    { header_name = "グループ", index_value = 3 },
]
display = [
    { name = "氏名", index = 0, edit = true },
    { name = "性別", index = 1 },
    { name = "郵便番号", index = 2 },
    { name = "グループ", index = 3 },
]
system_output = [
    { name = "NAME", index = 0 },
    { name = "SEX", index = 1 },
    { name = "ZIP", index = 2 },
    { name = "GROUP", index = 3 },
]
agency_output = [{ name = "性別", index = 0 }, { name = "氏名", index = 1 }]

[rules]
display = [
    { rule = "NOT_CHANGE", source = 0, destination = 0 },
    { rule = "GENDER_KANJI", source = 1, destination = 1 },
    { rule = "POSTAL_FORMAT", source = 2, destination = 2 },
    { rule = "GROUP_NO", source = 3, destination = 3 },
]
system_output = [
    { rule = "NOT_CHANGE", source = 0, destination = 0 },
    { rule = "GENDER_12", source = 1, destination = 1 },
    { rule = "NOT_CHANGE", source = 2, destination = 2 },
    { rule = "NOT_CHANGE", source = 3, destination = 3 },
]
agency_output = [
    { rule = "GENDER_MF", source = 1, destination = 0 },
    { rule = "NOT_CHANGE", source = 0, destination = 1 },
]

[output]
system_format = "CSV_C_SJIS"
agency_format = "JSON"
archive = true

[[fixed_values]]
rule = "GROUP_NO"
before = "A"
after = "G-01"
"#;

fn profile(text: &str) -> ConversionProfile {
    ConversionProfile::parse(text, Path::new("profile.toml")).unwrap()
}

fn files() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "a.csv",
            "氏名,性別,郵便番号,グループ\n山田㋿,男性,1234567,A\n",
        ),
        SourceFile::new(
            "b.json",
            r#"[{"氏名": "佐藤", "性別": "F", "郵便番号": "〒123-4567", "グループ": "Z"}]"#,
        ),
    ]
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[test]
fn test_end_to_end_with_archive() {
    let store: Arc<dyn BatchStore> = Arc::new(MemoryBatchStore::default());
    let pipeline = ConversionPipeline::new(profile(PROFILE), Arc::clone(&store))
        .unwrap()
        .with_date(date());
    let session_id = SessionId::new("upload-1").unwrap();

    let report = pipeline.run(&session_id, &files()).unwrap();
    let stages: Vec<Stage> = report.stages.iter().map(|report| report.stage).collect();
    assert_eq!(
        stages,
        [Stage::Input, Stage::Display, Stage::SystemOutput, Stage::AgencyOutput]
    );
    assert_eq!(report.rows(Stage::SystemOutput), Some(2));

    let system = &report.artifacts[0];
    assert_eq!(system.file_name, "output.csv");
    assert_eq!(system.format, FileFormatId::CsvCommaSjis);
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&system.bytes);
    assert!(!had_errors);
    // ㋿ is not in Shift_JIS and goes through the substitution table.
    assert_eq!(
        text,
        "NAME,SEX,ZIP,GROUP\r\n山田令和,1,123-4567,G-01\r\n佐藤,2,123-4567,Z\r\n"
    );

    let agency = &report.artifacts[1];
    assert_eq!(agency.file_name, "output_agency.json");
    let json: serde_json::Value = serde_json::from_slice(&agency.bytes).unwrap();
    assert_eq!(json[0]["性別"], "M");
    assert_eq!(json[1]["氏名"], "佐藤");

    let archive = report.archive.as_ref().unwrap();
    assert_eq!(archive.name, "output.zip");
    let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.clone())).unwrap();
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    assert!(names.contains(&"20240501_output.csv".to_string()));
    assert!(names.contains(&"output_agency.json".to_string()));
    let mut entry = Vec::new();
    zip.by_name("20240501_output.csv")
        .unwrap()
        .read_to_end(&mut entry)
        .unwrap();
    assert_eq!(entry, system.bytes);

    for stage in Stage::ALL {
        assert!(store.list(&session_id, stage).unwrap().is_empty());
    }
}

#[test]
fn test_keep_batches_with_file_store() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn BatchStore> = Arc::new(FileBatchStore::new(dir.path()));
    let text = format!("keep_batches = true\n{PROFILE}");
    let pipeline = ConversionPipeline::new(profile(&text), Arc::clone(&store)).unwrap();
    let session_id = SessionId::new("upload-2").unwrap();

    pipeline.run(&session_id, &files()).unwrap();
    let session = pipeline.session(session_id.clone());
    let display = pipeline.profile().layout(Stage::Display).unwrap();
    let page = session.paginate(&display, 1, None).unwrap();
    assert_eq!(page.total_rows, 2);
    assert_eq!(page.rows[1].values, ["佐藤", "女", "123-4567", "Z"]);

    session.update_cell(&display, 1, "氏名", "佐藤花子").unwrap();
    assert_eq!(session.rows(&display).unwrap()[1].values[0], "佐藤花子");
    assert_eq!(session.clear().unwrap(), 8);
}

#[test]
fn test_failed_ingest_reports_the_stage() {
    let pipeline =
        ConversionPipeline::new(profile(PROFILE), Arc::new(MemoryBatchStore::default())).unwrap();
    let error = pipeline
        .run(
            &SessionId::new("upload-3").unwrap(),
            &[SourceFile::new("broken.json", "{")],
        )
        .unwrap_err();
    assert!(matches!(error, CoreError::RunFailed { stage: Stage::Input, .. }));
}
