//! Key-value string persistence with file locking.
//!
//! The history log is stored through a small get/set/remove interface so
//! the backing medium stays swappable. The file-backed implementation
//! uses shared/exclusive locks and atomic temp-file replacement to stay
//! safe against concurrent access from other processes.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// String key-value storage consumed by the history store.
///
/// Implementations do not get exclusive access: contents may change
/// between calls, so callers must re-read rather than cache.
pub trait StringStore {
    /// Fetch the value for a key; `Ok(None)` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set the value for a key, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// File-backed store: one file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StringStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)
            .map_err(|e| Error::Persistence(format!("open {path:?}: {e}")))?;

        // Shared lock for reading; other processes may hold it too
        file.lock_shared()
            .map_err(|e| Error::Persistence(format!("lock {path:?}: {e}")))?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();
        read.map_err(|e| Error::Persistence(format!("read {path:?}: {e}")))?;

        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Persistence(format!("create {:?}: {e}", self.dir)))?;

        let path = self.key_path(key);

        // Write to a locked temp file in the same directory, then rename
        // over the original so readers never see a partial write.
        let temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::Persistence(format!("temp file in {:?}: {e}", self.dir)))?;

        temp.as_file()
            .lock_exclusive()
            .map_err(|e| Error::Persistence(format!("lock temp file: {e}")))?;

        let write = (|| -> std::io::Result<()> {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
            temp.as_file().sync_all()
        })();
        let _ = temp.as_file().unlock();
        write.map_err(|e| Error::Persistence(format!("write {path:?}: {e}")))?;

        temp.persist(&path)
            .map_err(|e| Error::Persistence(format!("persist {path:?}: {}", e.error)))?;

        tracing::debug!("Wrote key {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed key {} at {:?}", key, path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Persistence(format!("remove {path:?}: {e}"))),
        }
    }
}

/// Ensure the directory for a [`FileStore`] exists up front.
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Persistence(format!("create {dir:?}: {e}")))
}
