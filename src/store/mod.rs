pub mod notes;
pub mod reminders;

use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory holding config.json, reminders.json and notes.json.
/// Falls back to the working directory when the platform has no config dir.
pub fn data_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("deskpet"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// A flat JSON file holding one serializable value.
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned + Default> JsonFile<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Read the file. A missing file is not an error and yields the default.
    pub fn load(&self) -> Result<T, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Like `load`, but logs failures and continues with the default.
    pub fn load_or_default(&self) -> T {
        match self.load() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{e}; starting from defaults");
                T::default()
            }
        }
    }

    /// Write pretty JSON, creating parent directories as needed.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Vec<u32>> = JsonFile::new(dir.path().join("nope.json"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Vec<u32>> = JsonFile::new(dir.path().join("a/b/c.json"));
        file.save(&vec![1, 2, 3]).unwrap();
        assert_eq!(file.load().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn corrupt_file_is_an_error_but_default_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let file: JsonFile<Vec<u32>> = JsonFile::new(path);
        assert!(matches!(file.load(), Err(StoreError::Json { .. })));
        assert!(file.load_or_default().is_empty());
    }
}
