// File: ./src/visibility.rs
// Which categories are shown: the persisted preference and how it lands on items
use crate::dom::HostDocument;
use crate::model::{Category, CategoryMap, Partition};
use crate::storage::{KeyValueStore, StoreError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{info, warn};

/// Key the preference is stored under by default.
pub const DEFAULT_STORAGE_KEY: &str = "gtfShow";

/// Per-category visibility. Always holds every category; default all visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityConfig {
    shown: CategoryMap<bool>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            shown: CategoryMap::from_fn(&Category::ALL, |_| true),
        }
    }
}

impl VisibilityConfig {
    pub fn is_visible(&self, category: Category) -> bool {
        self.shown.get(category).copied().unwrap_or(true)
    }

    pub fn set(&mut self, category: Category, visible: bool) {
        self.shown.insert(category, visible);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, bool)> + '_ {
        self.shown.iter().map(|(c, v)| (c, *v))
    }

    /// Overlays persisted values. Unknown keys and non-boolean values are
    /// skipped. Returns how many entries were taken from `value`.
    pub fn merge_json(&mut self, value: &Value) -> usize {
        let Some(object) = value.as_object() else {
            return 0;
        };
        let mut applied = 0;
        for (key, raw) in object {
            if let (Some(category), Some(visible)) = (Category::from_key(key), raw.as_bool()) {
                self.set(category, visible);
                applied += 1;
            }
        }
        applied
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(c, v)| (c.key().to_string(), Value::Bool(v)))
                .collect(),
        )
    }
}

impl Serialize for VisibilityConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.shown.len()))?;
        for (category, visible) in self.iter() {
            map.serialize_entry(category.key(), &visible)?;
        }
        map.end()
    }
}

/// Toggles the hidden marker on every item according to its category.
/// Items already in the right state are left alone. Returns the number changed.
pub fn apply_visibility<D: HostDocument>(
    doc: &mut D,
    partition: &Partition<D::Node>,
    config: &VisibilityConfig,
    hidden_class: &str,
) -> usize {
    let mut changed = 0;
    for (category, items) in partition.iter() {
        let hide = !config.is_visible(category);
        for item in items {
            if doc.set_class(*item, hidden_class, hide) {
                changed += 1;
            }
        }
    }
    changed
}

/// Owns the visibility preference and its persisted copy.
pub struct VisibilityStore<S: KeyValueStore> {
    backend: S,
    key: String,
    config: VisibilityConfig,
}

impl<S: KeyValueStore> VisibilityStore<S> {
    /// Reads the persisted preference over the defaults.
    /// A failed read is logged and leaves the defaults in place.
    pub fn load(backend: S, key: &str) -> Self {
        let mut config = VisibilityConfig::default();
        match backend.get(key) {
            Ok(Some(value)) => {
                let applied = config.merge_json(&value);
                info!(key, applied, "loaded visibility preference");
            }
            Ok(None) => info!(key, "no stored visibility preference, showing everything"),
            Err(e) => warn!(key, error = %e, "failed to load visibility preference, using defaults"),
        }
        Self {
            backend,
            key: key.to_string(),
            config,
        }
    }

    /// Updates memory first, then persists. On a failed write the new value
    /// stays in memory and the error is handed back.
    pub fn set(&mut self, category: Category, visible: bool) -> Result<(), StoreError> {
        self.config.set(category, visible);
        let result = self.backend.set(&self.key, self.config.to_json());
        if let Err(e) = &result {
            warn!(%category, visible, error = %e, "failed to persist visibility preference");
        }
        result
    }

    pub fn current(&self) -> VisibilityConfig {
        self.config.clone()
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    pub fn is_visible(&self, category: Category) -> bool {
        self.config.is_visible(category)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}
