use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keys under which session state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKey {
    Identity,
    Responses,
    Ideas,
}

impl StorageKey {
    pub const fn all() -> [Self; 3] {
        [Self::Identity, Self::Responses, Self::Ideas]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "sdgx.identity",
            Self::Responses => "sdgx.responses",
            Self::Ideas => "sdgx.ideas",
        }
    }
}

/// Durable key-value storage so the session can be exercised in isolation.
///
/// `load` returns `Ok(None)` for an absent key. Callers never assume a `save` landed.
pub trait AssessmentStore: Send + Sync {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StoreError>;
    fn save(&self, key: StorageKey, value: &Value) -> Result<(), StoreError>;
    fn clear(&self, key: StorageKey) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("stored value for {key} is not valid JSON: {source}")]
    Corrupt {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("storage io failure for {key}: {source}")]
    Io {
        key: &'static str,
        source: std::io::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store, used by tests and when no data directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StorageKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, Value>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

impl AssessmentStore for MemoryStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        Ok(self.guard()?.get(&key).cloned())
    }

    fn save(&self, key: StorageKey, value: &Value) -> Result<(), StoreError> {
        self.guard()?.insert(key, value.clone());
        Ok(())
    }

    fn clear(&self, key: StorageKey) -> Result<(), StoreError> {
        self.guard()?.remove(&key);
        Ok(())
    }
}

/// One pretty-printed JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: "data directory",
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl AssessmentStore for JsonFileStore {
    fn load(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        let raw = match std::fs::read(self.path_for(key)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.as_str(),
                    source,
                })
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.as_str(),
                source,
            })
    }

    fn save(&self, key: StorageKey, value: &Value) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
            key: key.as_str(),
            source,
        })?;

        // Write beside the target then rename so readers never see a torn file.
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        std::fs::write(&staging, payload)
            .and_then(|()| std::fs::rename(&staging, &target))
            .map_err(|source| StoreError::Io {
                key: key.as_str(),
                source,
            })
    }

    fn clear(&self, key: StorageKey) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.as_str(),
                source,
            }),
        }
    }
}
