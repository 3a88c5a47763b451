use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::document::{DocumentFormat, RawDocument, RenderedDocument};

const OUTPUT_EXTENSION: &str = ".docx";
const PARTIAL_PREFIX: &str = ".partial-";

/// On-disk home for staged uploads and rendered outputs.
///
/// Staged uploads live only as long as their `NamedTempFile` guard. Outputs
/// are addressed by an opaque reference of the form `{uuid}_{file name}`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn open(
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        let store = Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        };
        std::fs::create_dir_all(&store.upload_dir)?;
        std::fs::create_dir_all(&store.output_dir)?;
        Ok(store)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes an upload to a uniquely named temp file. The file is removed
    /// when the returned guard drops.
    pub fn stage(&self, raw: &RawDocument, format: DocumentFormat) -> io::Result<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(format.extension())
            .tempfile_in(&self.upload_dir)?;
        staged.write_all(&raw.bytes)?;
        staged.flush()?;
        debug!(
            "Staged {} ({} bytes) at {}",
            raw.file_name,
            raw.bytes.len(),
            staged.path().display()
        );
        Ok(staged)
    }

    /// Stores a rendered document and returns its download reference.
    ///
    /// The bytes go to a hidden temp file first and are renamed into place
    /// without clobbering, so a reference never points at a partial file.
    pub fn persist(&self, rendered: &RenderedDocument) -> io::Result<String> {
        let reference = format!("{}_{}", Uuid::new_v4(), rendered.file_name);

        let mut partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.output_dir)?;
        partial.write_all(&rendered.bytes)?;
        partial.as_file().sync_all()?;
        partial
            .persist_noclobber(self.output_dir.join(&reference))
            .map_err(|e| e.error)?;

        info!("Stored {reference} ({} bytes)", rendered.bytes.len());
        Ok(reference)
    }

    /// Reads a stored output. Malformed or unknown references yield `None`.
    pub async fn load(&self, reference: &str) -> io::Result<Option<Vec<u8>>> {
        if !is_valid_reference(reference) {
            warn!("Rejected download reference {reference:?}");
            return Ok(None);
        }

        match tokio::fs::read(self.output_dir.join(reference)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deletes stored outputs, and partial writes left behind by an interrupted
    /// `persist`, last modified at least `max_age` ago. Returns how many files
    /// were removed.
    pub fn sweep(&self, max_age: Duration) -> io::Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let swept = name.ends_with(OUTPUT_EXTENSION) || name.starts_with(PARTIAL_PREFIX);
            if !swept || !entry.file_type()?.is_file() {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            if modified > cutoff {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        if removed > 0 {
            info!(
                "Swept {removed} files last modified before {}",
                DateTime::<Utc>::from(cutoff).to_rfc3339()
            );
        }
        Ok(removed)
    }
}

/// A reference must name a single file directly inside the output directory.
fn is_valid_reference(reference: &str) -> bool {
    let mut components = Path::new(reference).components();
    let single_file = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    single_file
        && !reference.starts_with('.')
        && !reference.contains('\\')
        && reference.ends_with(OUTPUT_EXTENSION)
}

/// The file name a reference should be downloaded as: the reference with its
/// uuid prefix removed.
pub fn download_name(reference: &str) -> &str {
    match reference.split_once('_') {
        Some((prefix, rest)) if Uuid::parse_str(prefix).is_ok() && !rest.is_empty() => rest,
        _ => reference,
    }
}
