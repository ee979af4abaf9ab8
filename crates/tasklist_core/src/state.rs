use crate::error::AppError;
use crate::storage::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use tracing::{debug, warn};

/// A value mirrored into a [`KeyValueStore`] under a fixed key.
///
/// The stored value is read once on load. Every update is committed in memory
/// first and then written through to the store before the call returns.
pub struct PersistentState<T> {
    store: Rc<dyn KeyValueStore>,
    key: String,
    value: T,
}

impl<T> PersistentState<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Loads `key` from `store`, falling back to `initial` when the key is
    /// missing or its value does not parse.
    pub fn load(store: Rc<dyn KeyValueStore>, key: &str, initial: T) -> Result<Self, AppError> {
        let value = match store.get(key)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key, error = %err, "stored value is corrupt, using default");
                    initial
                }
            },
            None => {
                debug!(key, "no stored value, using default");
                initial
            }
        };

        Ok(Self {
            store,
            key: key.to_string(),
            value,
        })
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) -> Result<(), AppError> {
        self.value = value;
        self.persist()
    }

    pub fn update<F>(&mut self, updater: F) -> Result<(), AppError>
    where
        F: FnOnce(&T) -> T,
    {
        let next = updater(&self.value);
        self.set(next)
    }

    fn persist(&self) -> Result<(), AppError> {
        let serialized = serde_json::to_string(&self.value)?;
        self.store.set(&self.key, &serialized)
    }
}
