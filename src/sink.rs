//! Where exported bytes go.
//!
//! An [`ExportSink`] receives one encoded file per selected format. Saves are
//! called from blocking export tasks, possibly several at once, so sinks must
//! be `Send + Sync` and handle concurrent calls.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Destination for encoded exports.
pub trait ExportSink: Send + Sync {
    /// Store `bytes` under `file_name`; returns where the file ended up.
    ///
    /// Blocking. Called from inside `spawn_blocking`.
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<String>;
}

/// Writes each export into a directory.
///
/// Writes are atomic (temp file + rename), so a reader never sees a
/// half-written file and a failed save leaves no partial output behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `file_name`; only its final component is used.
    fn target(&self, file_name: &str) -> io::Result<PathBuf> {
        let name = Path::new(file_name).file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{file_name}' is not a file name"),
            )
        })?;
        Ok(self.dir.join(name))
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, file_name: &str, _mime_type: &str, bytes: &[u8]) -> io::Result<String> {
        let path = self.target(file_name)?;
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, bytes)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!("Wrote {} bytes → {}", bytes.len(), path.display());
        Ok(path.display().to_string())
    }
}

/// One blob captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps exports in memory. Used by tests and by embedders that upload the
/// bytes elsewhere.
#[derive(Debug, Default)]
pub struct MemorySink {
    blobs: Mutex<Vec<SavedBlob>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every blob saved so far, in save order.
    pub fn blobs(&self) -> Vec<SavedBlob> {
        self.lock().clone()
    }

    /// The most recent blob saved under `file_name`.
    pub fn get(&self, file_name: &str) -> Option<SavedBlob> {
        self.lock()
            .iter()
            .rev()
            .find(|b| b.file_name == file_name)
            .cloned()
    }

    /// Saved file names, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().iter().map(|b| b.file_name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SavedBlob>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ExportSink for MemorySink {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<String> {
        self.lock().push(SavedBlob {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(format!("memory:{file_name}"))
    }
}
