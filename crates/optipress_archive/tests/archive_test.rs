//! Tests for streamed zip export.

use optipress_archive::{ExportEntry, export_zip};
use optipress_error::{ArchiveErrorKind, OptipressErrorKind};
use optipress_store::{ArtifactName, NamespaceDirs, NamespaceId, StoreRoot};
use std::collections::HashSet;
use std::io::{Cursor, Read};
use tempfile::TempDir;
use tokio_stream::StreamExt;
use zip::ZipArchive;

fn dirs_for(temp_dir: &TempDir) -> NamespaceDirs {
    let root = StoreRoot::new(temp_dir.path());
    let id = NamespaceId::parse("abc").unwrap();
    root.resolve(&id)
}

/// Put an artifact straight into the optimized tree under a synthetic digest.
async fn plant_optimized(dirs: &NamespaceDirs, digest_seed: u32, data: &[u8]) -> ArtifactName {
    dirs.ensure().await.unwrap();
    let name = ArtifactName::parse(&format!("{:032x}.png", digest_seed)).unwrap();
    tokio::fs::write(dirs.optimized_path(&name), data)
        .await
        .unwrap();
    name
}

async fn collect_zip(
    mut stream: tokio_stream::wrappers::ReceiverStream<std::io::Result<Vec<u8>>>,
) -> Vec<u8> {
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend(chunk.unwrap());
    }
    bytes
}

#[tokio::test]
async fn test_zip_round_trips_entries() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = dirs_for(&temp_dir);

    let first = plant_optimized(&dirs, 1, b"first artifact bytes").await;
    let second = plant_optimized(&dirs, 2, b"second artifact, different length").await;

    let entries = vec![
        ExportEntry {
            stored: first.to_string(),
            display: "one.png".to_string(),
        },
        ExportEntry {
            stored: second.to_string(),
            display: "two.png".to_string(),
        },
    ];

    let bytes = collect_zip(export_zip(&dirs, entries).await.unwrap()).await;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    let mut contents = Vec::new();
    archive
        .by_name("one.png")
        .unwrap()
        .read_to_end(&mut contents)
        .unwrap();
    assert_eq!(contents, b"first artifact bytes");

    contents.clear();
    archive
        .by_name("two.png")
        .unwrap()
        .read_to_end(&mut contents)
        .unwrap();
    assert_eq!(contents, b"second artifact, different length");
}

#[tokio::test]
async fn test_missing_and_unparseable_entries_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = dirs_for(&temp_dir);

    let real = plant_optimized(&dirs, 7, b"the only real one").await;

    let entries = vec![
        ExportEntry {
            stored: real.to_string(),
            display: "keep.png".to_string(),
        },
        ExportEntry {
            // Well-formed name, nothing on disk.
            stored: format!("{:032x}.png", 0xdead_u32),
            display: "ghost.png".to_string(),
        },
        ExportEntry {
            // Hostile name never touches the filesystem.
            stored: "../../etc/passwd".to_string(),
            display: "evil".to_string(),
        },
    ];

    let bytes = collect_zip(export_zip(&dirs, entries).await.unwrap()).await;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 1);
    assert!(archive.by_name("keep.png").is_ok());
}

#[tokio::test]
async fn test_duplicate_display_names_are_disambiguated() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = dirs_for(&temp_dir);

    let first = plant_optimized(&dirs, 1, b"aaaa").await;
    let second = plant_optimized(&dirs, 2, b"bbbb").await;

    let entries = vec![
        ExportEntry {
            stored: first.to_string(),
            display: "photo.png".to_string(),
        },
        ExportEntry {
            stored: second.to_string(),
            display: "photo.png".to_string(),
        },
    ];

    let bytes = collect_zip(export_zip(&dirs, entries).await.unwrap()).await;
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

    let names: HashSet<String> = archive.file_names().map(String::from).collect();
    assert_eq!(
        names,
        HashSet::from(["photo.png".to_string(), "photo_1.png".to_string()])
    );
}

#[tokio::test]
async fn test_absent_namespace_fails_before_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = dirs_for(&temp_dir); // Never ensured, no optimized dir

    let err = export_zip(&dirs, Vec::new()).await.unwrap_err();
    assert!(matches!(
        err.kind(),
        OptipressErrorKind::Archive(e)
            if matches!(e.kind, ArchiveErrorKind::NamespaceNotFound(_))
    ));
}

#[tokio::test]
async fn test_empty_selection_yields_empty_archive() {
    let temp_dir = TempDir::new().unwrap();
    let dirs = dirs_for(&temp_dir);
    dirs.ensure().await.unwrap();

    let bytes = collect_zip(export_zip(&dirs, Vec::new()).await.unwrap()).await;
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 0);
}
