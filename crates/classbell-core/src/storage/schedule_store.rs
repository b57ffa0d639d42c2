//! Named schedule documents.
//!
//! Documents are addressed by name. The filesystem store keeps one
//! `<name>.json` per document under `<data_dir>/schedule/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{data_dir, write_atomic};
use crate::error::StoreError;
use crate::schedule::ScheduleDocument;

/// Reserved document holding the pre-override copy. Never listed.
pub const BACKUP_NAME: &str = "backup";

/// Load and persist schedule documents by name.
pub trait ScheduleStore {
    fn load(&self, name: &str) -> Result<ScheduleDocument, StoreError>;
    fn save(&mut self, name: &str, doc: &ScheduleDocument) -> Result<(), StoreError>;
    /// Document names, sorted, without the backup document.
    fn list_available(&self) -> Result<Vec<String>, StoreError>;
    /// Copy `from` over `to` unchanged, byte for byte.
    fn copy(&mut self, from: &str, to: &str) -> Result<(), StoreError>;
    fn exists(&self, name: &str) -> bool;
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

fn parse(name: &str, bytes: &[u8]) -> Result<ScheduleDocument, StoreError> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::ParseFailed {
        name: name.to_string(),
        source,
    })
}

fn render(name: &str, doc: &ScheduleDocument) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(doc).map_err(|source| StoreError::ParseFailed {
        name: name.to_string(),
        source,
    })
}

/// Documents stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FsScheduleStore {
    dir: PathBuf,
}

impl FsScheduleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `<data_dir>/schedule/`.
    pub fn open() -> std::io::Result<Self> {
        let dir = data_dir()?.join("schedule");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        std::fs::read(self.path_of(name)).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(name.to_string())
            } else {
                StoreError::ReadFailed {
                    name: name.to_string(),
                    source,
                }
            }
        })
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        write_atomic(&self.path_of(name), bytes).map_err(|source| StoreError::WriteFailed {
            name: name.to_string(),
            source,
        })
    }
}

impl ScheduleStore for FsScheduleStore {
    fn load(&self, name: &str) -> Result<ScheduleDocument, StoreError> {
        let bytes = self.read_bytes(name)?;
        parse(name, &bytes)
    }

    fn save(&mut self, name: &str, doc: &ScheduleDocument) -> Result<(), StoreError> {
        let bytes = render(name, doc)?;
        self.write_bytes(name, &bytes)?;
        debug!(name, "saved schedule document");
        Ok(())
    }

    fn list_available(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    name: self.dir.display().to_string(),
                    source,
                })
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|name| name != BACKUP_NAME)
            .collect();
        names.sort();
        Ok(names)
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let bytes = self.read_bytes(from)?;
        self.write_bytes(to, &bytes)?;
        debug!(from, to, "copied schedule document");
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_of(name).is_file()
    }
}

/// In-memory store keeping raw bytes, so copies are exact.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduleStore {
    docs: BTreeMap<String, Vec<u8>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one document already saved under `name`.
    pub fn with_document(name: &str, doc: &ScheduleDocument) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.save(name, doc)?;
        Ok(store)
    }

    /// Put raw bytes under `name`, bypassing serialization.
    pub fn insert_raw(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.docs.insert(name.to_string(), bytes.into());
    }

    pub fn raw(&self, name: &str) -> Option<&[u8]> {
        self.docs.get(name).map(Vec::as_slice)
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load(&self, name: &str) -> Result<ScheduleDocument, StoreError> {
        let bytes = self
            .docs
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        parse(name, bytes)
    }

    fn save(&mut self, name: &str, doc: &ScheduleDocument) -> Result<(), StoreError> {
        validate_name(name)?;
        let bytes = render(name, doc)?;
        self.docs.insert(name.to_string(), bytes);
        Ok(())
    }

    fn list_available(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .docs
            .keys()
            .filter(|name| name.as_str() != BACKUP_NAME)
            .cloned()
            .collect())
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        validate_name(to)?;
        let bytes = self
            .docs
            .get(from)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(from.to_string()))?;
        self.docs.insert(to.to_string(), bytes);
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.docs.contains_key(name)
    }
}
