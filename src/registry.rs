// File: ./src/registry.rs
// Keeps exactly one live watcher per timeline container present in the document
use crate::dom::{HostDocument, MutationRecord};
use crate::model::{Category, CategoryMap};
use crate::visibility::VisibilityConfig;
use crate::watcher::{ContainerWatcher, FilterContext};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// What one batch did to the registry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub activated: usize,
    pub destroyed: usize,
    pub rescanned: usize,
}

impl BatchReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct ContainerRegistry<N> {
    watchers: IndexMap<N, ContainerWatcher<N>>,
}

impl<N: Copy + Eq + Hash + Debug> Default for ContainerRegistry<N> {
    fn default() -> Self {
        Self {
            watchers: IndexMap::new(),
        }
    }
}

impl<N: Copy + Eq + Hash + Debug> ContainerRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates a watcher for every container already in the document.
    pub fn scan<D>(&mut self, doc: &mut D, ctx: FilterContext<'_>) -> usize
    where
        D: HostDocument<Node = N>,
    {
        let body = doc.body();
        let containers = ctx.profiles.containers_within(doc, body);
        containers
            .into_iter()
            .filter(|container| self.activate(doc, *container, ctx))
            .count()
    }

    /// Handles one batch of document-wide structural changes.
    ///
    /// Records are processed in arrival order, removals before additions
    /// within a record. Watchers that survived the lifecycle pass and whose
    /// subtree was touched rescan once, however many records hit them.
    pub fn handle<D>(
        &mut self,
        doc: &mut D,
        batch: &[MutationRecord<N>],
        ctx: FilterContext<'_>,
    ) -> BatchReport
    where
        D: HostDocument<Node = N>,
    {
        let mut report = BatchReport::default();
        let mut fresh: Vec<N> = Vec::new();

        for record in batch {
            for removed in &record.removed {
                for container in ctx.profiles.containers_within(doc, *removed) {
                    if self.destroy(container) {
                        report.destroyed += 1;
                        fresh.retain(|c| *c != container);
                    }
                }
            }
            for added in &record.added {
                for container in ctx.profiles.containers_within(doc, *added) {
                    if self.activate(doc, container, ctx) {
                        report.activated += 1;
                        fresh.push(container);
                    }
                }
            }
        }

        for (container, watcher) in self.watchers.iter_mut() {
            if fresh.contains(container) {
                continue;
            }
            if watcher.notify(doc, batch, ctx) {
                report.rescanned += 1;
            }
        }

        if !report.is_noop() {
            debug!(?report, live = self.watchers.len(), "processed mutation batch");
        }
        report
    }

    /// Pushes a new visibility preference to every live container.
    pub fn reapply_all<D>(&self, doc: &mut D, visibility: &VisibilityConfig, hidden_class: &str) -> usize
    where
        D: HostDocument<Node = N>,
    {
        self.watchers
            .values()
            .map(|watcher| watcher.reapply(doc, visibility, hidden_class))
            .sum()
    }

    pub fn watchers(&self) -> impl Iterator<Item = &ContainerWatcher<N>> {
        self.watchers.values()
    }

    pub fn watcher(&self, container: N) -> Option<&ContainerWatcher<N>> {
        self.watchers.get(&container)
    }

    pub fn contains(&self, container: N) -> bool {
        self.watchers.contains_key(&container)
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Item counts summed over every live container.
    pub fn counts(&self) -> CategoryMap<usize> {
        let mut total = CategoryMap::default();
        for partition in self.watchers.values().filter_map(|w| w.partition()) {
            total.accumulate(&partition.counts());
        }
        total
    }

    /// Categories the live containers' dialects define, in canonical order.
    pub fn active_categories(&self) -> Vec<Category> {
        let counts = self.counts();
        Category::ALL
            .into_iter()
            .filter(|c| counts.contains(*c))
            .collect()
    }

    fn activate<D>(&mut self, doc: &mut D, container: N, ctx: FilterContext<'_>) -> bool
    where
        D: HostDocument<Node = N>,
    {
        if self.watchers.contains_key(&container) {
            return false;
        }
        let mut watcher = ContainerWatcher::new(container);
        watcher.activate(doc, ctx);
        self.watchers.insert(container, watcher);
        true
    }

    fn destroy(&mut self, container: N) -> bool {
        match self.watchers.shift_remove(&container) {
            Some(mut watcher) => {
                watcher.destroy();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Profiles;
    use crate::dom::{ElementSpec, Tree};

    fn discussion() -> ElementSpec {
        ElementSpec::new("div").class("js-discussion").child(
            ElementSpec::new("div")
                .class("js-timeline-item")
                .child(ElementSpec::new("div").class("js-comment-container")),
        )
    }

    fn ctx<'a>(profiles: &'a Profiles, visibility: &'a VisibilityConfig) -> FilterContext<'a> {
        FilterContext {
            profiles,
            visibility,
            hidden_class: "gtf-hidden",
        }
    }

    #[test]
    fn activates_containers_nested_in_added_nodes_once() {
        let mut tree = Tree::new();
        let profiles = Profiles::default();
        let visibility = VisibilityConfig::default();
        let mut registry = ContainerRegistry::new();

        let page = ElementSpec::new("main").child(discussion());
        tree.insert(tree.body(), &page);
        let batch = tree.take_records();
        let report = registry.handle(&mut tree, &batch, ctx(&profiles, &visibility));
        assert_eq!(report.activated, 1);
        assert_eq!(registry.len(), 1);

        // The same notification again must not double-activate.
        let report = registry.handle(&mut tree, &batch, ctx(&profiles, &visibility));
        assert_eq!(report.activated, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn removing_an_ancestor_destroys_the_watcher() {
        let mut tree = Tree::with_content(&[ElementSpec::new("main").child(discussion())]);
        let profiles = Profiles::default();
        let visibility = VisibilityConfig::default();
        let mut registry = ContainerRegistry::new();
        assert_eq!(registry.scan(&mut tree, ctx(&profiles, &visibility)), 1);

        let main = tree.children(tree.body())[0];
        tree.remove(main);
        let batch = tree.take_records();
        let report = registry.handle(&mut tree, &batch, ctx(&profiles, &visibility));
        assert_eq!(report.destroyed, 1);
        assert!(registry.is_empty());
        assert!(registry.counts().is_empty());
    }

    #[test]
    fn floods_are_coalesced_into_one_rescan() {
        let mut tree = Tree::with_content(&[discussion()]);
        let profiles = Profiles::default();
        let visibility = VisibilityConfig::default();
        let mut registry = ContainerRegistry::new();
        registry.scan(&mut tree, ctx(&profiles, &visibility));

        let container = tree.children(tree.body())[0];
        for _ in 0..50 {
            tree.insert(
                container,
                &ElementSpec::new("div").class("js-timeline-item"),
            );
        }
        let batch = tree.take_records();
        assert_eq!(batch.len(), 50);
        let report = registry.handle(&mut tree, &batch, ctx(&profiles, &visibility));
        assert_eq!(report.rescanned, 1);
        assert_eq!(registry.counts().get(Category::Others), Some(&50));
    }

    #[test]
    fn counts_sum_across_containers() {
        let mut tree = Tree::with_content(&[discussion(), discussion()]);
        let profiles = Profiles::default();
        let visibility = VisibilityConfig::default();
        let mut registry = ContainerRegistry::new();
        registry.scan(&mut tree, ctx(&profiles, &visibility));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.counts().get(Category::Comments), Some(&2));
        assert!(registry.active_categories().contains(&Category::Reviews));
        assert!(!registry.active_categories().contains(&Category::Deployments));
    }
}
