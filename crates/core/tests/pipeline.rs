//! End-to-end tests: upload, clean, visualize and convert.

use sweeper_core::{
    CellValue, Command, FileFormat, Session, Stage, Status, SweepError, Table, UploadedFile,
    ViewItem, DEFAULT_PREVIEW_ROWS,
};

const SALES: &str = "region,units,price\nnorth,3,2.5\nnorth,3,2.5\nsouth,,4.0\neast,5,\n";

fn upload(session: &mut Session, files: Vec<UploadedFile>) {
    session.upload(files).expect("upload should succeed");
}

#[test]
fn test_full_session_flow() {
    let mut session = Session::new();
    upload(&mut session, vec![UploadedFile::new("sales.csv", SALES)]);

    session
        .apply("sales.csv", Command::SetCleaning { enabled: true })
        .unwrap();
    assert_eq!(
        session.apply("sales.csv", Command::Deduplicate).unwrap(),
        Status::Deduplicated { removed: 1 }
    );
    assert_eq!(
        session.apply("sales.csv", Command::FillMissing).unwrap(),
        Status::MissingFilled { filled: 2 }
    );

    let table = session.get("sales.csv").unwrap().table().clone();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.get(1, 1).unwrap(), &CellValue::Float(4.0));
    assert_eq!(table.get(2, 2).unwrap(), &CellValue::Float(3.25));

    session
        .apply("sales.csv", Command::SetChart { enabled: true })
        .unwrap();
    session
        .apply(
            "sales.csv",
            Command::SelectFormat {
                format: FileFormat::Xlsx,
            },
        )
        .unwrap();
    let Status::Converted(download) = session
        .apply("sales.csv", Command::Convert { format: None })
        .unwrap()
    else {
        panic!("expected a download");
    };

    assert_eq!(download.file_name, "sales.xlsx");
    assert_eq!(
        download.mime_type,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let restored = Table::from_xlsx_bytes(&download.bytes).unwrap();
    assert_eq!(restored.columns(), table.columns());
    assert_eq!(restored.row_count(), 3);

    let file = session.get("sales.csv").unwrap();
    assert_eq!(file.stage(), Stage::Exported);
    let view = file.view(DEFAULT_PREVIEW_ROWS);
    assert!(view.items.iter().any(|item| matches!(item, ViewItem::Chart(_))));
    assert!(matches!(view.items.last(), Some(ViewItem::DownloadOffer { .. })));
}

#[test]
fn test_text_file_is_skipped_with_message() {
    let mut session = Session::new();
    let report = session
        .upload(vec![
            UploadedFile::new("data.txt", "a\n1\n"),
            UploadedFile::new("ok.csv", "a\n1\n"),
        ])
        .unwrap();

    assert_eq!(report.accepted, vec!["ok.csv"]);
    assert_eq!(report.rejected[0].error, "Unsupported file type: .txt");

    let view = session.view(DEFAULT_PREVIEW_ROWS);
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.footer, "All files processed successfully!");
}

#[test]
fn test_extensionless_file_is_skipped() {
    let mut session = Session::new();
    let report = session
        .upload(vec![UploadedFile::new("README", "hello")])
        .unwrap();
    assert_eq!(report.rejected[0].error, "Unsupported file type: (none)");
    assert!(session.is_empty());
}

#[test]
fn test_uppercase_extension_round_trip() {
    let mut session = Session::new();
    upload(&mut session, vec![UploadedFile::new("REPORT.CSV", "a,b\n1,x\n")]);

    let download = session
        .download("REPORT.CSV", Some(FileFormat::Xlsx))
        .unwrap();
    assert_eq!(download.file_name, "REPORT.xlsx");

    upload(
        &mut session,
        vec![UploadedFile::new("REPORT.xlsx", download.bytes.clone())],
    );
    let csv = session.download("REPORT.xlsx", Some(FileFormat::Csv)).unwrap();
    assert_eq!(csv.file_name, "REPORT.csv");
    assert_eq!(csv.bytes, b"a,b\n1,x\n");
}

#[test]
fn test_text_columns_are_left_alone() {
    let mut session = Session::new();
    upload(
        &mut session,
        vec![UploadedFile::new("names.csv", "name,city\nAnn,\nBob,Oslo\n")],
    );
    session
        .apply("names.csv", Command::SetCleaning { enabled: true })
        .unwrap();

    assert_eq!(
        session.apply("names.csv", Command::FillMissing).unwrap(),
        Status::MissingFilled { filled: 0 }
    );
    let table = session.get("names.csv").unwrap().table();
    assert!(table.get(0, 1).unwrap().is_null());

    session
        .apply("names.csv", Command::SetChart { enabled: true })
        .unwrap();
    let chart = session.get("names.csv").unwrap().chart().unwrap();
    assert!(chart.is_empty());
}

#[test]
fn test_unknown_file_is_not_found() {
    let mut session = Session::new();
    let err = session.apply("ghost.csv", Command::Deduplicate).unwrap_err();
    assert!(matches!(err, SweepError::FileNotFound(name) if name == "ghost.csv"));
}
