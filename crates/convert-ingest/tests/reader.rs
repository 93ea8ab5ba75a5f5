use convert_ingest::{
    Container, FileFormatId, FormatDetector, IngestError, ReadMode, RowReader, SourceFile,
    TextEncoding, discover_headers,
};
use convert_model::{HeaderDescriptor, RawRow, Stage, StageLayout};
use rust_xlsxwriter::Workbook;

fn target() -> StageLayout {
    StageLayout::new(
        Stage::Input,
        vec![
            HeaderDescriptor::new("氏名", 0),
            HeaderDescriptor::new("性別", 1),
            HeaderDescriptor::new("郵便番号", 3),
        ],
    )
    .expect("layout")
}

fn read_positional(file: &SourceFile, format_id: Option<FileFormatId>) -> Vec<Vec<String>> {
    let spec = FormatDetector::default()
        .detect_file(file, format_id)
        .expect("detect");
    RowReader::default()
        .read(file, &spec, &target(), ReadMode::Positional)
        .expect("read")
        .map(|row| row.into_positional(&target()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[test]
fn csv_falls_back_to_shift_jis() {
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("氏名,性別,郵便番号\n山田太郎,男,1234567\n");
    let file = SourceFile::new("patients.csv", bytes.into_owned());

    let spec = FormatDetector::default().detect_file(&file, None).expect("detect");
    assert_eq!(spec.container, Container::Csv);
    assert_eq!(spec.encoding, TextEncoding::ShiftJis);

    let rows = RowReader::default()
        .read(&file, &spec, &target(), ReadMode::Positional)
        .expect("read");
    assert_eq!(rows.encoding(), Some(TextEncoding::ShiftJis));
    let rows: Vec<_> = rows.collect();
    assert_eq!(
        rows,
        vec![RawRow::Positional(strings(&["山田太郎", "男", "", "1234567"]))]
    );
}

#[test]
fn missing_headers_read_as_empty_and_extra_columns_are_dropped() {
    let file = SourceFile::new("tabs.tsv", "氏名\t備考\n佐藤\tmemo\n鈴木\n");
    let rows = read_positional(&file, Some(FileFormatId::CsvTabUtf8));
    assert_eq!(
        rows,
        vec![strings(&["佐藤", "", "", ""]), strings(&["鈴木", "", "", ""])]
    );
}

#[test]
fn named_mode_keys_rows_by_target_header() {
    let file = SourceFile::new("semi.csv", "性別;氏名\n女;田中\n");
    let spec = FormatDetector::default().detect_file(&file, None).expect("detect");
    assert_eq!(spec.delimiter, Some(b';'));

    let rows: Vec<_> = RowReader::default()
        .read(&file, &spec, &target(), ReadMode::Named)
        .expect("read")
        .collect();
    let RawRow::Named(values) = &rows[0] else {
        panic!("expected a named row");
    };
    assert_eq!(values["氏名"], "田中");
    assert_eq!(values["性別"], "女");
    assert_eq!(values["郵便番号"], "");
}

#[test]
fn json_array_and_single_object() {
    let array = SourceFile::new(
        "rows.json",
        r#"[{"氏名": "山田", "郵便番号": 1234567, "性別": null}, 5, {"氏名": "佐藤"}]"#,
    );
    assert_eq!(
        read_positional(&array, None),
        vec![
            strings(&["山田", "", "", "1234567"]),
            strings(&["佐藤", "", "", ""]),
        ]
    );

    let single = SourceFile::new("one.json", r#"{"性別": "女"}"#);
    assert_eq!(read_positional(&single, Some(FileFormatId::Json)), vec![strings(&["", "女", "", ""])]);
}

#[test]
fn json_scalar_document_is_an_error() {
    let file = SourceFile::new("bad.json", "42");
    let spec = FormatDetector::default().detect_file(&file, None).expect("detect");
    let error = RowReader::default()
        .read(&file, &spec, &target(), ReadMode::Named)
        .expect_err("scalar JSON");
    assert!(matches!(error, IngestError::Json { .. }));
}

#[test]
fn xml_records() {
    let file = SourceFile::new(
        "rows.xml",
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <record><氏名>山田</氏名><性別>男</性別></record>\n  <record><郵便番号>123-4567</郵便番号></record>\n</root>\n",
    );
    assert_eq!(
        read_positional(&file, None),
        vec![
            strings(&["山田", "男", "", ""]),
            strings(&["", "", "", "123-4567"]),
        ]
    );
    assert_eq!(
        discover_headers(&file, None).expect("headers"),
        strings(&["氏名", "性別"])
    );
}

#[test]
fn excel_first_sheet() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "郵便番号").expect("write");
    sheet.write_string(0, 1, "氏名").expect("write");
    sheet.write_number(1, 0, 1234567.0).expect("write");
    sheet.write_string(1, 1, "山田").expect("write");
    let bytes = workbook.save_to_buffer().expect("save");

    let file = SourceFile::new("patients.xlsx", bytes);
    assert_eq!(
        read_positional(&file, None),
        vec![strings(&["山田", "", "", "1234567"])]
    );
    assert_eq!(
        discover_headers(&file, None).expect("headers"),
        strings(&["郵便番号", "氏名"])
    );
}

#[test]
fn empty_csv_is_an_error() {
    let file = SourceFile::new("empty.csv", "");
    let spec = FormatDetector::default().detect_file(&file, None).expect("detect");
    let error = RowReader::default()
        .read(&file, &spec, &target(), ReadMode::Named)
        .expect_err("empty file");
    assert!(matches!(error, IngestError::EmptyFile { .. }));
}

#[test]
fn undecodable_text_is_an_error() {
    let file = SourceFile::new("bad.csv", vec![0x82, 0xA0, 0xFF, 0xFF]);
    let spec = FormatDetector::default()
        .detect_file(&file, Some(FileFormatId::CsvCommaUtf8))
        .expect("pinned format skips sniffing");
    let reader = RowReader::new(convert_ingest::EncodingFallback::new(vec![TextEncoding::Utf8]));
    let error = reader
        .read(&file, &spec, &target(), ReadMode::Named)
        .expect_err("no encoding fits");
    assert!(matches!(error, IngestError::UnsupportedEncoding { .. }));
}
