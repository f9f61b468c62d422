use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Cache key for the chat transcript.
pub const MESSAGES_KEY: &str = "@form_builder_messages";
/// Cache key for the last loaded forms list.
pub const FORMS_KEY: &str = "@form_builder_forms";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cache directory missing or not writable: {0}")]
    CacheDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache entry {key} is not valid json: {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },
}

/// Ensure the cache directory exists; create if missing.
pub fn ensure_cache_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::CacheDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write bytes to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_cache_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Key/value JSON cache on disk, one file per key.
pub struct LocalCache {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf, PersistError> {
        let bytes = serde_json::to_vec(value).map_err(|source| PersistError::Json {
            key: key.to_string(),
            source,
        })?;
        let path = self.writer.write(&file_name(key), &bytes)?;
        engine_debug!("cached {} ({} bytes)", key, bytes.len());
        Ok(path)
    }

    /// `Ok(None)` when nothing was stored under `key` yet.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistError> {
        let bytes = match fs::read(self.dir.join(file_name(key))) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistError::Json {
                key: key.to_string(),
                source,
            })
    }

    pub fn remove(&self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.dir.join(file_name(key))) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn file_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{stem}.json")
}
