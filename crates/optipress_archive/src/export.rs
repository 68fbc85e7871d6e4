//! Streamed zip export of optimized artifacts.

use crate::window::{SinkHandle, WindowSink, window_sink};
use chrono::{DateTime, Datelike, Local, Timelike};
use optipress_error::{ArchiveError, ArchiveErrorKind, OptipressResult};
use optipress_store::{ArtifactName, NamespaceDirs};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, instrument, warn};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

/// Buffered chunks between the zip task and the response body.
const CHANNEL_CAPACITY: usize = 8;

/// Read buffer for copying artifacts into the archive.
const COPY_CHUNK_LEN: usize = 8192;

/// One requested archive entry: which stored artifact, under what name.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    /// Stored `{digest}.{ext}` name inside the namespace.
    pub stored: String,
    /// Name the entry gets inside the archive.
    pub display: String,
}

/// Archive filename for a bundle produced at `moment`.
///
/// Components carry no zero padding, e.g.
/// `optimized_files__9-5-3__1_7_2026.zip`.
pub fn archive_file_name(moment: DateTime<Local>) -> String {
    format!(
        "optimized_files__{}-{}-{}__{}_{}_{}.zip",
        moment.hour(),
        moment.minute(),
        moment.second(),
        moment.day(),
        moment.month(),
        moment.year()
    )
}

/// Stream the selected optimized artifacts as one zip.
///
/// Entries whose stored name is unparseable or whose file is absent are
/// skipped; the archive holds exactly what was found. Fails up front with
/// `NamespaceNotFound` when the namespace has no optimized directory at all.
///
/// The zip bytes are produced by a blocking task writing through a bounded
/// window, so peak memory stays near one compressed entry regardless of how
/// many files are bundled. A consumer that goes away mid-stream ends the
/// task; completed artifacts on disk are untouched.
#[instrument(skip(dirs, entries), fields(namespace = %dirs.id(), requested = entries.len()))]
pub async fn export_zip(
    dirs: &NamespaceDirs,
    entries: Vec<ExportEntry>,
) -> OptipressResult<ReceiverStream<io::Result<Vec<u8>>>> {
    if !tokio::fs::try_exists(dirs.optimized()).await.unwrap_or(false) {
        return Err(ArchiveError::new(ArchiveErrorKind::NamespaceNotFound(
            dirs.id().to_string(),
        ))
        .into());
    }

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (sink, handle) = window_sink(tx);
    let dirs = dirs.clone();

    tokio::task::spawn_blocking(move || {
        if let Err(e) = write_archive(sink, &handle, &dirs, &entries) {
            warn!(namespace = %dirs.id(), error = %e, "Archive stream aborted");
            handle.fail(e);
        }
    });

    Ok(ReceiverStream::new(rx))
}

/// Blocking half: drive the zip writer over the window sink.
fn write_archive(
    sink: WindowSink,
    handle: &SinkHandle,
    dirs: &NamespaceDirs,
    entries: &[ExportEntry],
) -> io::Result<()> {
    let mut zip = ZipWriter::new(sink);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used_names = HashSet::new();

    for entry in entries {
        let Ok(name) = ArtifactName::parse(&entry.stored) else {
            debug!(stored = %entry.stored, "Skipping unparseable export entry");
            continue;
        };
        let path = dirs.optimized_path(&name);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(artifact = %name, "Skipping absent export entry");
                continue;
            }
            Err(e) => return Err(entry_read(&path, e)),
        };

        let mut wanted = entry.display.replace(['/', '\\'], "_");
        if wanted.is_empty() {
            wanted = name.to_string();
        }
        let display = unique_display_name(&mut used_names, &wanted);

        // Bytes before this entry's local header become final the moment
        // start_file has back-patched the previous entry's header.
        let boundary = handle.end_offset()?;
        zip.start_file(&display, options).map_err(zip_to_io)?;
        handle.ship(boundary).map_err(stream_closed)?;

        let mut buffer = [0u8; COPY_CHUNK_LEN];
        loop {
            let read = file.read(&mut buffer).map_err(|e| entry_read(&path, e))?;
            if read == 0 {
                break;
            }
            zip.write_all(&buffer[..read])?;
        }
        debug!(artifact = %name, entry = %display, "Added archive entry");
    }

    zip.finish().map_err(zip_to_io)?;
    handle.ship_all().map_err(stream_closed)
}

/// Disambiguate duplicate display names with a counter before the extension.
fn unique_display_name(used: &mut HashSet<String>, wanted: &str) -> String {
    if used.insert(wanted.to_string()) {
        return wanted.to_string();
    }
    let (stem, ext) = match wanted.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (wanted, None),
    };
    let mut counter = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn zip_to_io(error: zip::result::ZipError) -> io::Error {
    io::Error::other(ArchiveError::new(ArchiveErrorKind::Zip(error.to_string())))
}

fn entry_read(path: &Path, error: io::Error) -> io::Error {
    io::Error::new(
        error.kind(),
        ArchiveError::new(ArchiveErrorKind::EntryRead(format!(
            "{}: {}",
            path.display(),
            error
        ))),
    )
}

fn stream_closed(error: io::Error) -> io::Error {
    io::Error::new(
        error.kind(),
        ArchiveError::new(ArchiveErrorKind::StreamClosed(error.to_string())),
    )
}
