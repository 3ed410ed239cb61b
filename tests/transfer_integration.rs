//! End-to-end tests for export and import through files on disk.

// Integration tests use unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use usershare::io::{ExportService, Format, ImportService};
use usershare::storage::{FileStore, MemoryStore, UserStore};
use usershare::{Error, Snapshot, User};

fn sample_users() -> Vec<User> {
    vec![
        User::new("u1").with_display_name("Ann").with_visit_count(3),
        User::new("u2").with_display_name("Bob Smith"),
        User::new("u3").with_visit_count(12),
    ]
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_export_then_import_both_formats() {
    for format in Format::all().iter().copied() {
        let dir = TempDir::new().unwrap();
        let source = MemoryStore::with_users(&sample_users()).unwrap();

        let export = ExportService::new(dir.path())
            .export_store(&source, format)
            .unwrap();
        assert_eq!(export.exported, 3);
        assert_eq!(
            export.path.extension().and_then(|e| e.to_str()),
            Some(format.extension())
        );
        let name = export.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("exported_users_"), "unexpected name {name}");

        let import = ImportService::new().import_file(&export.path).unwrap();
        assert_eq!(import.format, format);
        assert_eq!(import.users, source.all_users().unwrap());
        assert!(import.source_removed);
        assert!(!export.path.exists());
    }
}

#[test]
fn test_import_into_file_store() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let mut store = FileStore::open(&data_dir).unwrap();
    store
        .upsert_users(&[User::new("u1").with_display_name("Old name")])
        .unwrap();

    let path = write(
        &dir,
        "incoming.ucsv",
        "numCoffees,userId,fullName\n7,u1,Ann\n1,u9,Zed\n",
    );
    let service = ImportService::new();
    let import = service.import_file(&path).unwrap();
    let summary = service.apply(&mut store, &import.users).unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 1);

    let reopened = FileStore::open(&data_dir).unwrap();
    assert_eq!(
        reopened.all_users().unwrap(),
        vec![
            User::new("u1").with_display_name("Ann").with_visit_count(7),
            User::new("u9").with_display_name("Zed").with_visit_count(1),
        ]
    );
}

#[test]
fn test_csv_document_shape() {
    let service = ExportService::new("unused");
    let snapshot =
        Snapshot::from_records(vec![User::new("u1").with_display_name("Ann").with_visit_count(3)]);

    let bytes = service.encode(&snapshot, Format::Csv).unwrap();
    assert_eq!(bytes, b"userId,fullName,numCoffees\nu1,Ann,3\n");
}

#[test]
fn test_empty_snapshot_round_trips() {
    let service = ExportService::new("unused");
    let importer = ImportService::new();
    let empty = Snapshot::from_records(Vec::new());

    let usrl = service.encode(&empty, Format::UserList).unwrap();
    let ucsv = service.encode(&empty, Format::Csv).unwrap();
    assert_eq!(usrl, b"[]");
    assert_eq!(ucsv, b"userId,fullName,numCoffees\n");

    assert!(importer.import_bytes(&usrl, Format::UserList).unwrap().is_empty());
    assert!(importer.import_bytes(&ucsv, Format::Csv).unwrap().is_empty());
}

#[test]
fn test_rejected_import_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryStore::with_users(&sample_users()).unwrap();
    let before = store.all_users().unwrap();

    let path = write(
        &dir,
        "bad.ucsv",
        "userId,fullName,numCoffees\nu7,Gil,2\nu8,Hal,many\n",
    );
    let service = ImportService::new();
    let err = service.import_file(&path).unwrap_err();

    assert!(matches!(
        err,
        Error::FieldCoercion { ref field, line: 3, .. } if field == "numCoffees"
    ));
    assert!(!path.exists());
    assert_eq!(store.all_users().unwrap(), before);
    assert_eq!(service.apply(&mut store, &[]).unwrap().total(), 0);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "foo.txt", "[]");

    let err = ImportService::new().import_file(&path).unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { .. }));
    assert_eq!(err.to_string(), "unsupported format: .txt");
    assert!(path.exists());
}

#[test]
fn test_structured_import_with_extra_fields() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "extra.usrl",
        r#"[{"userId":"u1","fullName":"Ann","numCoffees":3,"email":"ann@example.com"}]"#,
    );

    let import = ImportService::new()
        .with_remove_source(false)
        .import_file(&path)
        .unwrap();

    assert_eq!(
        import.users,
        vec![User::new("u1").with_display_name("Ann").with_visit_count(3)]
    );
    assert!(path.exists());
}
