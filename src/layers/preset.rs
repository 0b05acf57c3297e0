use crate::foundation::error::{LuminaError, LuminaResult};
use crate::layers::model::{Layer, Stack};
use crate::persist::kv::KeyValueStore;

/// Storage key under which the preset library is persisted.
pub const PRESETS_KEY: &str = "lumina-presets";

/// Named, timestamped snapshot of a whole stack. Never mutated once saved.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Preset {
    /// Unique identifier within a library.
    pub id: String,
    /// User-facing name.
    pub name: String,
    /// Save time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Layers in paint order.
    pub layers: Vec<Layer>,
}

impl Preset {
    /// Capture `stack` as a preset.
    pub fn capture(
        id: impl Into<String>,
        name: impl Into<String>,
        timestamp_ms: u64,
        stack: &Stack,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            timestamp_ms,
            layers: stack.iter().cloned().collect(),
        }
    }

    /// Capture `stack` under a user-entered name. The name is trimmed and must not end up empty.
    pub fn named(
        id: impl Into<String>,
        name: &str,
        timestamp_ms: u64,
        stack: &Stack,
    ) -> LuminaResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LuminaError::validation("preset name must not be empty"));
        }
        Ok(Self::capture(id, name, timestamp_ms, stack))
    }

    /// Fresh stack copy of this preset; every layer starts pending.
    pub fn instantiate(&self) -> Stack {
        Stack::from(self.layers.clone()).with_pending_loads()
    }
}

/// Ordered collection of presets, most recently saved last.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl PresetLibrary {
    /// Load the library stored under `key`.
    ///
    /// Missing, unreadable or corrupt payloads yield an empty library; the problem is logged and
    /// never returned to the caller.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Self {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(err) => {
                tracing::warn!(key, error = %err, "preset storage unreadable; using empty library");
                return Self::default();
            }
        };

        match serde_json::from_str::<PresetLibrary>(&raw) {
            Ok(lib) => lib,
            Err(err) => {
                tracing::warn!(key, error = %err, "corrupt preset payload; using empty library");
                Self::default()
            }
        }
    }

    /// Persist the whole library under `key`.
    pub fn save(&self, store: &mut dyn KeyValueStore, key: &str) -> LuminaResult<()> {
        let raw = serde_json::to_string(self)?;
        store.put(key, &raw)
    }

    /// Presets in save order.
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Number of presets.
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Return `true` when no presets are stored.
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Preset with `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Append a preset. A preset with the same id is replaced rather than edited.
    pub fn insert(&mut self, preset: Preset) {
        self.presets.retain(|p| p.id != preset.id);
        self.presets.push(preset);
    }

    /// Remove the preset with `id`. Returns `true` when something was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        self.presets.len() != before
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/preset.rs"]
mod tests;
