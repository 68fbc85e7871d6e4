//! Tests for external-compressor dispatch.
//!
//! The tools under test are coreutils stand-ins wired through the same
//! command-template mechanism the real compressors use, so no image tooling
//! is needed on the test host.

use optipress_error::{OptimizeErrorKind, OptipressErrorKind};
use optipress_optimize::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER, Optimizer, ToolSpec};
use optipress_store::{ImageFormat, IngestedArtifact, NamespaceDirs, NamespaceId, StoreRoot, ingest_reader};
use tempfile::TempDir;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

async fn ingested_png(temp_dir: &TempDir) -> (NamespaceDirs, IngestedArtifact) {
    let root = StoreRoot::new(temp_dir.path());
    let id = NamespaceId::parse("abc").unwrap();
    let dirs = root.resolve(&id);

    let mut data = PNG_MAGIC.to_vec();
    data.extend_from_slice(b"payload");
    let artifact = ingest_reader(&dirs, "pic.png", data.as_slice()).await.unwrap();
    (dirs, artifact)
}

fn kind_of(err: &optipress_error::OptipressError) -> &OptimizeErrorKind {
    match err.kind() {
        OptipressErrorKind::Optimize(e) => &e.kind,
        other => panic!("expected an optimizer error, got {}", other),
    }
}

#[tokio::test]
async fn test_passthrough_tool_writes_optimized_copy() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    let copy = ToolSpec::new("cp", [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER]);
    let optimizer = Optimizer::from_tools([(ImageFormat::Png, copy)]);

    let optimized = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap();

    assert_eq!(optimized.path(), &dirs.optimized_path(artifact.name()));
    assert_eq!(*optimized.size(), *artifact.size());

    let original = tokio::fs::read(artifact.path()).await.unwrap();
    let copied = tokio::fs::read(optimized.path()).await.unwrap();
    assert_eq!(original, copied);
}

#[tokio::test]
async fn test_failing_tool_is_tool_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    let failing = ToolSpec::new("false", Vec::<String>::new());
    let optimizer = Optimizer::from_tools([(ImageFormat::Png, failing)]);

    let err = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), OptimizeErrorKind::ToolFailed(_)));
}

#[tokio::test]
async fn test_clean_exit_without_output_is_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    // Exits 0 but never writes the output file.
    let silent = ToolSpec::new("true", Vec::<String>::new());
    let optimizer = Optimizer::from_tools([(ImageFormat::Png, silent)]);

    let err = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), OptimizeErrorKind::NoOutput(_)));
}

#[tokio::test]
async fn test_zero_byte_output_is_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    let empty = ToolSpec::new("touch", [OUTPUT_PLACEHOLDER]);
    let optimizer = Optimizer::from_tools([(ImageFormat::Png, empty)]);

    let err = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), OptimizeErrorKind::EmptyOutput(_)));

    // The useless output must not linger where downloads could find it.
    assert!(!dirs.optimized_path(artifact.name()).exists());
}

#[tokio::test]
async fn test_missing_program_is_spawn_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    let ghost = ToolSpec::new("optipress-no-such-tool", Vec::<String>::new());
    let optimizer = Optimizer::from_tools([(ImageFormat::Png, ghost)]);

    let err = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), OptimizeErrorKind::Spawn(_)));
}

#[tokio::test]
async fn test_unregistered_format_is_failure() {
    let temp_dir = TempDir::new().unwrap();
    let (dirs, artifact) = ingested_png(&temp_dir).await;

    let optimizer = Optimizer::from_tools([]);
    let err = optimizer
        .optimize(&dirs, &artifact, ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), OptimizeErrorKind::ToolFailed(_)));
}
