// File: ./src/panel.rs
// Toggle panel state and the markup it maintains in the host document
use crate::dom::HostDocument;
use crate::model::{Category, CategoryMap};
use crate::registry::ContainerRegistry;
use crate::storage::{KeyValueStore, StoreError};
use crate::visibility::{VisibilityConfig, VisibilityStore};
use std::fmt::Debug;
use std::hash::Hash;

pub const ROOT_CLASS: &str = "gtf";
pub const ROOT_HIDDEN_CLASS: &str = "gtf--hidden";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub category: Category,
    pub checked: bool,
    pub count: usize,
}

impl Toggle {
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    pub fn title(&self) -> &'static str {
        self.category.title()
    }
}

#[derive(Debug, Clone, Copy)]
struct Control<N> {
    label: N,
    checkbox: N,
}

#[derive(Debug)]
pub struct FilterPanel<N> {
    root: Option<N>,
    controls: CategoryMap<Control<N>>,
    toggles: Vec<Toggle>,
    hidden: bool,
}

impl<N: Copy + Eq + Hash + Debug> Default for FilterPanel<N> {
    fn default() -> Self {
        Self {
            root: None,
            controls: CategoryMap::default(),
            toggles: vec![],
            hidden: true,
        }
    }
}

impl<N: Copy + Eq + Hash + Debug> FilterPanel<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<N> {
        self.root
    }

    /// Toggles for the categories of the live containers' dialects.
    pub fn toggles(&self) -> &[Toggle] {
        &self.toggles
    }

    pub fn toggle_for(&self, category: Category) -> Option<&Toggle> {
        self.toggles.iter().find(|t| t.category == category)
    }

    pub fn total(&self) -> usize {
        self.toggles.iter().map(|t| t.count).sum()
    }

    /// Hidden whenever no live container holds any item.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Appends the panel root to the body, hidden until there is something
    /// to count. Mounting twice is a no-op.
    pub fn mount<D>(&mut self, doc: &mut D, visibility: &VisibilityConfig) -> N
    where
        D: HostDocument<Node = N>,
    {
        if let Some(root) = self.root {
            return root;
        }
        let root = doc.create_element("div");
        doc.set_attribute(root, "class", &format!("{} {}", ROOT_CLASS, ROOT_HIDDEN_CLASS));

        for category in Category::ALL {
            let key = category.key();
            let input_id = format!("gtf-{}", key);

            let label = doc.create_element("label");
            doc.set_attribute(label, "for", &input_id);
            doc.set_attribute(label, "title", category.title());
            doc.set_attribute(label, "data-type", key);
            doc.set_attribute(label, "data-count", "0");
            doc.set_attribute(label, "class", "gtf__item");
            doc.set_text(label, category.label());

            let checkbox = doc.create_element("input");
            doc.set_attribute(checkbox, "type", "checkbox");
            doc.set_attribute(checkbox, "id", &input_id);
            doc.set_attribute(checkbox, "name", "gtf");
            doc.set_attribute(checkbox, "class", "gtf__checkbox");
            doc.set_attribute(checkbox, "data-type", key);
            if visibility.is_visible(category) {
                doc.set_attribute(checkbox, "checked", "");
            }

            doc.append_child(label, checkbox);
            doc.append_child(root, label);
            self.controls.insert(category, Control { label, checkbox });
        }

        let body = doc.body();
        doc.append_child(body, root);
        self.root = Some(root);
        root
    }

    /// Rebuilds toggles from the registry's latest partitions and mirrors
    /// counts, checked state and panel visibility into the markup.
    pub fn refresh<D>(&mut self, doc: &mut D, registry: &ContainerRegistry<N>, visibility: &VisibilityConfig)
    where
        D: HostDocument<Node = N>,
    {
        let counts = registry.counts();
        self.toggles = registry
            .active_categories()
            .into_iter()
            .map(|category| Toggle {
                category,
                checked: visibility.is_visible(category),
                count: counts.get(category).copied().unwrap_or(0),
            })
            .collect();
        self.hidden = self.total() == 0;

        for (category, control) in self.controls.iter() {
            let toggle = self.toggles.iter().find(|t| t.category == category);
            let count = toggle.map_or(0, |t| t.count);
            doc.set_attribute(control.label, "data-count", &count.to_string());
            if toggle.is_some() {
                doc.remove_attribute(control.label, "hidden");
            } else {
                doc.set_attribute(control.label, "hidden", "");
            }
            if visibility.is_visible(category) {
                doc.set_attribute(control.checkbox, "checked", "");
            } else {
                doc.remove_attribute(control.checkbox, "checked");
            }
        }
        if let Some(root) = self.root {
            doc.set_class(root, ROOT_HIDDEN_CLASS, self.hidden);
        }
    }

    /// A user edit: persist, then re-apply visibility everywhere without
    /// reclassifying. Items and panel are updated even when persisting fails;
    /// the failure is returned afterwards.
    pub fn toggle<D, S>(
        &mut self,
        doc: &mut D,
        category: Category,
        visible: bool,
        store: &mut VisibilityStore<S>,
        registry: &ContainerRegistry<N>,
        hidden_class: &str,
    ) -> Result<usize, StoreError>
    where
        D: HostDocument<Node = N>,
        S: KeyValueStore,
    {
        let persisted = store.set(category, visible);
        let changed = registry.reapply_all(doc, store.config(), hidden_class);
        self.refresh(doc, registry, store.config());
        persisted.map(|()| changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Profiles;
    use crate::dom::{ElementSpec, NodeId, Tree};
    use crate::storage::MemoryStore;
    use crate::watcher::FilterContext;

    fn count_attr(tree: &Tree, panel: &FilterPanel<NodeId>, category: Category) -> String {
        let label = panel.controls.get(category).unwrap().label;
        tree.attribute(label, "data-count").unwrap().to_string()
    }

    #[test]
    fn empty_container_keeps_panel_hidden() {
        let mut tree = Tree::with_content(&[ElementSpec::new("div").class("js-discussion")]);
        let profiles = Profiles::default();
        let visibility = VisibilityConfig::default();
        let mut registry = ContainerRegistry::new();
        registry.scan(
            &mut tree,
            FilterContext {
                profiles: &profiles,
                visibility: &visibility,
                hidden_class: "gtf-hidden",
            },
        );

        let mut panel = FilterPanel::new();
        let root = panel.mount(&mut tree, &visibility);
        panel.refresh(&mut tree, &registry, &visibility);

        assert_eq!(panel.total(), 0);
        assert!(panel.is_hidden());
        assert!(tree.has_class(root, ROOT_HIDDEN_CLASS));
        assert_eq!(panel.toggles().len(), 6);
    }

    #[test]
    fn mount_builds_one_control_per_category() {
        let mut tree = Tree::new();
        let mut visibility = VisibilityConfig::default();
        visibility.set(Category::Commits, false);
        let mut panel = FilterPanel::new();
        let root = panel.mount(&mut tree, &visibility);
        assert_eq!(panel.mount(&mut tree, &visibility), root);

        assert_eq!(tree.children(tree.body()), vec![root]);
        let labels = tree.children(root);
        assert_eq!(labels.len(), Category::ALL.len());
        let commits = panel.controls.get(Category::Commits).unwrap();
        assert_eq!(tree.attribute(commits.label, "title"), Some("Commits"));
        assert_eq!(tree.attribute(commits.checkbox, "checked"), None);
        let comments = panel.controls.get(Category::Comments).unwrap();
        assert_eq!(tree.attribute(comments.checkbox, "checked"), Some(""));
        assert_eq!(tree.attribute(comments.checkbox, "id"), Some("gtf-comments"));
    }

    #[test]
    fn toggle_hides_items_and_updates_markup() {
        let mut tree = Tree::with_content(&[ElementSpec::new("div").class("js-discussion").child(
            ElementSpec::new("div")
                .class("js-timeline-item")
                .child(ElementSpec::new("div").class("js-comment-container")),
        )]);
        let profiles = Profiles::default();
        let mut store = VisibilityStore::load(MemoryStore::new(), "gtfShow");
        let mut registry = ContainerRegistry::new();
        registry.scan(
            &mut tree,
            FilterContext {
                profiles: &profiles,
                visibility: store.config(),
                hidden_class: "gtf-hidden",
            },
        );
        let mut panel = FilterPanel::new();
        panel.mount(&mut tree, store.config());
        panel.refresh(&mut tree, &registry, store.config());
        assert!(!panel.is_hidden());
        assert_eq!(count_attr(&tree, &panel, Category::Comments), "1");

        let changed = panel
            .toggle(&mut tree, Category::Comments, false, &mut store, &registry, "gtf-hidden")
            .unwrap();
        assert_eq!(changed, 1);

        let container = tree.children(tree.body())[0];
        let item = tree.children(container)[0];
        assert!(tree.has_class(item, "gtf-hidden"));
        assert!(!panel.toggle_for(Category::Comments).unwrap().checked);
        let checkbox = panel.controls.get(Category::Comments).unwrap().checkbox;
        assert_eq!(tree.attribute(checkbox, "checked"), None);

        // Deployments is not part of the legacy dialect.
        let deployments = panel.controls.get(Category::Deployments).unwrap().label;
        assert_eq!(tree.attribute(deployments, "hidden"), Some(""));
    }
}
