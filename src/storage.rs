use crate::error::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const TASKS_KEY: &str = "tasks";
pub const LAST_CLEAR_DATE_KEY: &str = "lastClearDate";

/// String-valued durable storage. Values are opaque to the store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let write_err = |source| StoreError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write then rename so a crash never leaves half a value behind
        let tmp = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// In-memory store with switchable read and write failures, either for
    /// every key or for selected keys.
    #[derive(Debug, Default, Clone)]
    pub struct MemoryStore {
        pub values: HashMap<String, String>,
        pub fail_reads: bool,
        pub fail_writes: bool,
        pub fail_read_keys: HashSet<String>,
        pub fail_write_keys: HashSet<String>,
    }

    impl MemoryStore {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            MemoryStore {
                values: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    fn quota_error(key: &str) -> std::io::Error {
        std::io::Error::new(ErrorKind::Other, format!("quota exceeded for {}", key))
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_reads || self.fail_read_keys.contains(key) {
                return Err(StoreError::Read {
                    path: PathBuf::from(key),
                    source: quota_error(key),
                });
            }
            Ok(self.values.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_writes || self.fail_write_keys.contains(key) {
                return Err(StoreError::Write {
                    path: PathBuf::from(key),
                    source: quota_error(key),
                });
            }
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}
