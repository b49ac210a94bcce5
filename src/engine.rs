// File: ./src/engine.rs
// Wires store, registry and panel together behind the calls a host makes
use crate::dialect::Profiles;
use crate::dom::{HostDocument, MutationRecord};
use crate::model::{Category, CategoryMap};
use crate::panel::FilterPanel;
use crate::registry::{BatchReport, ContainerRegistry};
use crate::storage::{KeyValueStore, StoreError};
use crate::visibility::{VisibilityConfig, VisibilityStore};
use crate::watcher::FilterContext;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::info;

pub const DEFAULT_HIDDEN_CLASS: &str = "gtf-hidden";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Class toggled on items of hidden categories.
    pub hidden_class: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            hidden_class: DEFAULT_HIDDEN_CLASS.to_string(),
        }
    }
}

pub struct Engine<N, S: KeyValueStore> {
    store: VisibilityStore<S>,
    registry: ContainerRegistry<N>,
    panel: FilterPanel<N>,
    profiles: Profiles,
    options: EngineOptions,
}

impl<N, S> Engine<N, S>
where
    N: Copy + Eq + Hash + Debug,
    S: KeyValueStore,
{
    /// Takes an already loaded store, so nothing is shown or hidden before
    /// the preference is known. Mounts the panel and picks up the containers
    /// the document already has.
    pub fn start<D>(doc: &mut D, store: VisibilityStore<S>, profiles: Profiles, options: EngineOptions) -> Self
    where
        D: HostDocument<Node = N>,
    {
        let mut engine = Self {
            store,
            registry: ContainerRegistry::new(),
            panel: FilterPanel::new(),
            profiles,
            options,
        };
        engine.panel.mount(doc, engine.store.config());
        let found = engine.registry.scan(
            doc,
            FilterContext {
                profiles: &engine.profiles,
                visibility: engine.store.config(),
                hidden_class: &engine.options.hidden_class,
            },
        );
        engine
            .panel
            .refresh(doc, &engine.registry, engine.store.config());
        info!(containers = found, "timeline filter started");
        engine
    }

    /// Feeds one batch of document-wide structural changes through the registry.
    pub fn handle_mutations<D>(&mut self, doc: &mut D, batch: &[MutationRecord<N>]) -> BatchReport
    where
        D: HostDocument<Node = N>,
    {
        if batch.is_empty() {
            return BatchReport::default();
        }
        let report = self.registry.handle(
            doc,
            batch,
            FilterContext {
                profiles: &self.profiles,
                visibility: self.store.config(),
                hidden_class: &self.options.hidden_class,
            },
        );
        if !report.is_noop() {
            self.panel.refresh(doc, &self.registry, self.store.config());
        }
        report
    }

    /// A user edit from the panel. Returns how many items changed state.
    pub fn toggle<D>(&mut self, doc: &mut D, category: Category, visible: bool) -> Result<usize, StoreError>
    where
        D: HostDocument<Node = N>,
    {
        self.panel.toggle(
            doc,
            category,
            visible,
            &mut self.store,
            &self.registry,
            &self.options.hidden_class,
        )
    }

    pub fn counts(&self) -> CategoryMap<usize> {
        self.registry.counts()
    }

    /// Containers with an active watcher, in activation order.
    pub fn live_containers(&self) -> Vec<N> {
        self.registry.watchers().map(|w| w.container()).collect()
    }

    pub fn visibility(&self) -> &VisibilityConfig {
        self.store.config()
    }

    pub fn store(&self) -> &VisibilityStore<S> {
        &self.store
    }

    pub fn registry(&self) -> &ContainerRegistry<N> {
        &self.registry
    }

    pub fn panel(&self) -> &FilterPanel<N> {
        &self.panel
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}
