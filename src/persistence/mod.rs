//! JSON Persistence Module
//!
//! Single-slot document storage for the settings record and the price
//! snapshot. Each document is read and written whole.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::debug;

use crate::error::StoreError;

/// One JSON document at a fixed path. A store replaces the previous value
/// entirely; readers see either the old or the new document, never a mix.
#[derive(Debug, Clone)]
pub struct JsonSlot<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Load the stored document, `None` if the file does not exist
    pub fn load(&self) -> Result<Option<T>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                path: self.path.display().to_string(),
                source,
            })
    }

    /// Replace the stored document. Writes a sibling temp file and renames
    /// it over the target; creates the parent directory when absent.
    pub fn store(&self, record: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }

        let json = serde_json::to_string_pretty(record).map_err(|source| {
            StoreError::Serialization {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|source| self.io_error(source))?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(source));
        }

        debug!(path = %self.path.display(), "Document stored");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        value: u32,
    }

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "metalpost_persistence_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = temp_data_dir("missing");
        let slot: JsonSlot<Record> = JsonSlot::new(dir.join("doc.json"));
        assert!(slot.load().unwrap().is_none());
    }

    #[test]
    fn store_creates_parent_and_replaces_previous_value() {
        let dir = temp_data_dir("replace");
        let slot = JsonSlot::new(dir.join("nested").join("doc.json"));

        slot.store(&Record {
            name: "first".to_string(),
            value: 1,
        })
        .unwrap();
        slot.store(&Record {
            name: "second".to_string(),
            value: 2,
        })
        .unwrap();

        let loaded = slot.load().unwrap().unwrap();
        assert_eq!(loaded.name, "second");
        assert_eq!(loaded.value, 2);

        let leftovers = fs::read_dir(dir.join("nested"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0, "temp files should be renamed away");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_corrupt_file_is_serialization_error() {
        let dir = temp_data_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("doc.json"), "{not json").unwrap();

        let slot: JsonSlot<Record> = JsonSlot::new(dir.join("doc.json"));
        assert!(matches!(
            slot.load(),
            Err(StoreError::Serialization { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
