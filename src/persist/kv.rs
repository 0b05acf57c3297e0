use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{LuminaError, LuminaResult};

/// Durable string key-value storage.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> LuminaResult<Option<String>>;
    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> LuminaResult<()>;
    /// Delete `key`. Deleting an absent key is not an error.
    fn remove(&mut self, key: &str) -> LuminaResult<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FsKeyValueStore {
    root: PathBuf,
}

impl FsKeyValueStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the key files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> LuminaResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(LuminaError::storage(format!(
                "invalid storage key '{key}' (expected [A-Za-z0-9._-])"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FsKeyValueStore {
    fn get(&self, key: &str) -> LuminaResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LuminaError::storage(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> LuminaResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create storage dir '{}'", self.root.display()))?;

        // Readers never observe a partially written payload.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LuminaResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LuminaError::storage(format!(
                "remove '{}': {e}",
                path.display()
            ))),
        }
    }
}

/// Volatile in-process store.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> LuminaResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> LuminaResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LuminaResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/kv.rs"]
mod tests;
