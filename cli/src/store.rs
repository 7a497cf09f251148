//! Durable key-value storage for the terminal shell: one JSON file mapping
//! raw keys to hex-encoded values.

use std::collections::BTreeMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crux_kv::error::KeyValueError;
use crux_kv::value::Value;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};
use thiserror::Error;
use tokio::sync::Mutex;

pub const STORE_FILE_NAME: &str = "store.json";

/// Largest value a single `Set` may write.
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn execute(&self, operation: KeyValueOperation) -> KeyValueResult;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted store: {reason}")]
    Corrupted { reason: String },

    #[error("value for '{key}' is not valid hex")]
    InvalidValue { key: String },
}

impl From<StoreError> for KeyValueError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io) if io.kind() == IoErrorKind::TimedOut => KeyValueError::Timeout,
            StoreError::Io(io) => KeyValueError::Io {
                message: io.to_string(),
            },
            other => KeyValueError::Other {
                message: other.to_string(),
            },
        }
    }
}

type Entries = BTreeMap<String, String>;

pub struct FileKvStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Opens `store.json` inside `dir`, creating the directory if needed.
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self::new(dir.join(STORE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await?.get(key).map(|v| decode(key, v)).transpose()
    }

    /// Writes `value` under `key` and returns what it replaced.
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let previous = entries.insert(key.to_string(), hex::encode(value));
        self.save(&entries).await?;
        Ok(previous.and_then(|v| decode(key, &v).ok()))
    }

    async fn load(&self) -> Result<Entries, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.is_empty() {
            return Err(StoreError::Corrupted {
                reason: "empty file".to_string(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupted {
            reason: e.to_string(),
        })
    }

    async fn save(&self, entries: &Entries) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Corrupted {
            reason: e.to_string(),
        })?;

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn execute(&self, operation: KeyValueOperation) -> KeyValueResult {
        match self.apply(operation).await {
            Ok(response) => KeyValueResult::Ok { response },
            Err(error) => KeyValueResult::Err { error },
        }
    }
}

impl FileKvStore {
    async fn apply(&self, operation: KeyValueOperation) -> Result<KeyValueResponse, KeyValueError> {
        match operation {
            KeyValueOperation::Get { key } => {
                tracing::debug!(%key, "kv get");
                Ok(KeyValueResponse::Get {
                    value: into_value(self.get(&key).await?),
                })
            }
            KeyValueOperation::Set { key, value } => {
                tracing::debug!(%key, bytes = value.len(), "kv set");
                if value.len() > MAX_VALUE_SIZE {
                    return Err(KeyValueError::Other {
                        message: format!(
                            "value of {} bytes exceeds maximum of {MAX_VALUE_SIZE}",
                            value.len()
                        ),
                    });
                }
                Ok(KeyValueResponse::Set {
                    previous: into_value(self.set(&key, &value).await?),
                })
            }
            other => Err(KeyValueError::Other {
                message: format!("unsupported operation: {other:?}"),
            }),
        }
    }
}

fn decode(key: &str, value: &str) -> Result<Vec<u8>, StoreError> {
    hex::decode(value).map_err(|_| StoreError::InvalidValue {
        key: key.to_string(),
    })
}

fn into_value(bytes: Option<Vec<u8>>) -> Value {
    bytes.map_or(Value::None, Value::Bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TOKEN_KEY: &str = "token";

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();
        store.set(TOKEN_KEY, b"tok123").await.unwrap();

        let reopened = FileKvStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).await.unwrap(), Some(b"tok123".to_vec()));

        let raw = std::fs::read_to_string(dir.path().join(STORE_FILE_NAME)).unwrap();
        assert!(raw.contains("\"token\""));
        assert!(!raw.contains("tok123"));
    }

    #[tokio::test]
    async fn set_overwrites_and_returns_previous() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();
        assert_eq!(store.set(TOKEN_KEY, b"old").await.unwrap(), None);
        assert_eq!(store.set(TOKEN_KEY, b"new").await.unwrap(), Some(b"old".to_vec()));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::new(dir.path().join("nonexistent.json"));
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_tmp() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();
        store.set(TOKEN_KEY, b"tok").await.unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn corrupted_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileKvStore::new(path);
        let result = store
            .execute(KeyValueOperation::Get {
                key: TOKEN_KEY.to_string(),
            })
            .await;
        assert!(matches!(
            result,
            KeyValueResult::Err {
                error: KeyValueError::Other { ref message }
            } if message.starts_with("corrupted store")
        ));
    }

    #[tokio::test]
    async fn execute_maps_operations() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();

        let written = store
            .execute(KeyValueOperation::Set {
                key: TOKEN_KEY.to_string(),
                value: b"tok".to_vec(),
            })
            .await;
        assert!(matches!(
            written,
            KeyValueResult::Ok {
                response: KeyValueResponse::Set {
                    previous: Value::None
                }
            }
        ));

        let read = store
            .execute(KeyValueOperation::Get {
                key: TOKEN_KEY.to_string(),
            })
            .await;
        assert!(matches!(
            read,
            KeyValueResult::Ok {
                response: KeyValueResponse::Get {
                    value: Value::Bytes(ref bytes)
                }
            } if bytes == b"tok"
        ));

        let absent = store
            .execute(KeyValueOperation::Get {
                key: "other".to_string(),
            })
            .await;
        assert!(matches!(
            absent,
            KeyValueResult::Ok {
                response: KeyValueResponse::Get { value: Value::None }
            }
        ));

        let too_big = store
            .execute(KeyValueOperation::Set {
                key: TOKEN_KEY.to_string(),
                value: vec![0; MAX_VALUE_SIZE + 1],
            })
            .await;
        assert!(matches!(too_big, KeyValueResult::Err { .. }));
    }
}
