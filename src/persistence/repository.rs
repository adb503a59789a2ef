use std::collections::HashMap;

use thiserror::Error;

use crate::content::chapter::ChapterId;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    InvalidData(String),
}

/// Durable integer key/value storage backing checkpoints.
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>, CheckpointError>;
    fn set_int(&mut self, key: &str, value: i64) -> Result<(), CheckpointError>;
    fn remove(&mut self, key: &str) -> Result<(), CheckpointError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_int(&self, key: &str) -> Result<Option<i64>, CheckpointError> {
        (**self).get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), CheckpointError> {
        (**self).set_int(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), CheckpointError> {
        (**self).remove(key)
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>, CheckpointError> {
        Ok(self.values.get(key).copied())
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), CheckpointError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CheckpointError> {
        self.values.remove(key);
        Ok(())
    }
}

const CURRENT_CHAPTER_KEY: &str = "current_chapter";
const ATTEMPTS_KEY: &str = "attempts";

/// Last visited chapter and the attempt count, on top of a key/value store.
pub struct CheckpointStore {
    store: Box<dyn KeyValueStore>,
}

impl CheckpointStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    pub fn save(&mut self, chapter: ChapterId) -> Result<(), CheckpointError> {
        self.store.set_int(CURRENT_CHAPTER_KEY, chapter.0)
    }

    pub fn load(&self) -> Result<Option<ChapterId>, CheckpointError> {
        Ok(self.store.get_int(CURRENT_CHAPTER_KEY)?.map(ChapterId))
    }

    pub fn save_attempts(&mut self, attempts: u64) -> Result<(), CheckpointError> {
        let value = i64::try_from(attempts).map_err(|_| {
            CheckpointError::InvalidData(format!("attempt count {} does not fit", attempts))
        })?;
        self.store.set_int(ATTEMPTS_KEY, value)
    }

    pub fn load_attempts(&self) -> Result<u64, CheckpointError> {
        match self.store.get_int(ATTEMPTS_KEY)? {
            None => Ok(0),
            Some(value) => u64::try_from(value).map_err(|_| {
                CheckpointError::InvalidData(format!("negative attempt count {}", value))
            }),
        }
    }

    pub fn clear(&mut self) -> Result<(), CheckpointError> {
        self.store.remove(CURRENT_CHAPTER_KEY)?;
        self.store.remove(ATTEMPTS_KEY)
    }
}
