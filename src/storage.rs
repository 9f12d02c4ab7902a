//! This module provides a durable key-value store, and the adapter that persists task lists into it

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::task::Task;


/// A durable string key-value store, such as a browser `localStorage`
pub trait KeyValueStore {
    /// Returns the value stored for `key`, or `None` if nothing is stored yet
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>>;
    /// Overwrite the value stored for `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>>;
}


/// A store that keeps every entry in a JSON file inside a folder
#[derive(Debug, Clone, PartialEq)]
pub struct FileStore {
    backing_folder: PathBuf,
}

impl FileStore {
    /// Use a folder as backing storage. It will be created at the first write if it does not exist
    pub fn new(folder: &Path) -> Self {
        Self {
            backing_folder: PathBuf::from(folder),
        }
    }

    /// Use the folder from the [`config`](crate::config)
    pub fn from_config() -> Self {
        Self::new(&crate::config::data_folder())
    }

    pub fn folder(&self) -> &Path {
        &self.backing_folder
    }

    /// The file an entry is stored into
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let mut file_name = sanitize_filename::sanitize(key);
        file_name.push_str(".json");
        self.backing_folder.join(file_name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(format!("Unable to read file {:?}: {}", path, err).into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if let Err(err) = std::fs::create_dir_all(&self.backing_folder) {
            return Err(format!("Unable to create folder {:?}: {}", self.backing_folder, err).into());
        }
        let path = self.entry_path(key);
        if let Err(err) = std::fs::write(&path, value) {
            return Err(format!("Unable to save file {:?}: {}", path, err).into());
        }
        Ok(())
    }
}


/// A store that lives in memory only.
///
/// It can be given a quota (the maximum total size of its values, in bytes), so that writes past it fail,
/// just like a full `localStorage` would.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self { entries: HashMap::new(), quota: Some(quota) }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries.iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(format!("Quota exceeded while writing {:?} ({} bytes needed, {} allowed)", key, needed, quota).into());
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}



/// Reads and writes a whole task list under a single key of a [`KeyValueStore`]
#[derive(Debug)]
pub struct Persistence<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Persist under the key from the [`config`](crate::config)
    pub fn new(store: S) -> Self {
        Self::with_key(store, crate::config::storage_key())
    }

    pub fn with_key(store: S, key: String) -> Self {
        Self { store, key }
    }

    pub fn store(&self) -> &S { &self.store }
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn key(&self) -> &str { &self.key }

    /// Returns the stored tasks.
    ///
    /// Missing, unreadable or malformed content is reported as an empty list.
    pub fn load(&self) -> Vec<Task> {
        let content = match self.store.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                log::debug!("No saved tasks under {:?}", self.key);
                return Vec::new();
            },
            Err(err) => {
                log::warn!("Unable to read saved tasks: {}. Starting with an empty list", err);
                return Vec::new();
            },
        };

        match serde_json::from_str(&content) {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("Invalid saved tasks: {}. Starting with an empty list", err);
                Vec::new()
            },
        }
    }

    /// Overwrite the stored value with the whole list
    pub fn save(&mut self, tasks: &[Task]) -> Result<(), Box<dyn Error>> {
        let content = serde_json::to_string(tasks)?;
        self.store.set(&self.key, &content)
    }
}
