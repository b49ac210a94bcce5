use crate::dom::{ElementSpec, HostDocument, NodeId, Tree};
use crate::engine::Engine;
use crate::model::Category;
use crate::storage::KeyValueStore;
use crate::tui::action::Action;
use ratatui::widgets::ListState;

/// Copies appended per "load more".
const PAGE_SIZE: usize = 3;

pub struct Row {
    pub category: Category,
    pub text: String,
    pub hidden: bool,
}

pub struct AppState<S: KeyValueStore> {
    pub tree: Tree,
    pub engine: Engine<NodeId, S>,
    /// Body content as loaded, used to bring the timeline back after navigating.
    pub fixture: Vec<ElementSpec>,
    pub rows: Vec<Row>,
    pub list_state: ListState,
    pub panel_state: ListState,
    pub message: String,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(tree: Tree, engine: Engine<NodeId, S>) -> Self {
        let body = tree.body();
        let fixture = tree
            .children(body)
            .into_iter()
            .filter(|n| Some(*n) != engine.panel().root())
            .map(|n| tree.to_spec(n))
            .collect();
        let mut p_state = ListState::default();
        p_state.select(Some(0));
        let mut state = Self {
            tree,
            engine,
            fixture,
            rows: vec![],
            list_state: ListState::default(),
            panel_state: p_state,
            message: "1-7: Toggle | p: Load more | n: Navigate | q: Quit".to_string(),
        };
        state.recalculate_view();
        state
    }

    /// Rebuilds the item rows from the latest partitions, in document order.
    pub fn recalculate_view(&mut self) {
        let hidden_class = self.engine.options().hidden_class.clone();
        let mut rows = Vec::new();
        for watcher in self.engine.registry().watchers() {
            let Some(partition) = watcher.partition() else {
                continue;
            };
            for node in self.tree.descendants(watcher.container()) {
                if let Some(category) = partition.category_of(node) {
                    let text = self.tree.text_content(node);
                    rows.push(Row {
                        category,
                        text: if text.is_empty() { format!("{:?}", node) } else { text },
                        hidden: self.tree.has_class(node, &hidden_class),
                    });
                }
            }
        }
        self.rows = rows;
        if self.rows.is_empty() {
            self.list_state.select(None);
        } else if self.list_state.selected().is_none_or(|i| i >= self.rows.len()) {
            self.list_state.select(Some(0));
        }
        let toggles = self.engine.panel().toggles().len();
        if toggles == 0 {
            self.panel_state.select(None);
        } else if self.panel_state.selected().is_none_or(|i| i >= toggles) {
            self.panel_state.select(Some(0));
        }
    }

    /// Applies one action. Returns false when the app should exit.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::ToggleIndex(i) => self.toggle_at(i),
            Action::ToggleSelected => {
                if let Some(i) = self.panel_state.selected() {
                    self.toggle_at(i);
                }
            }
            Action::ShowAll => {
                let hidden: Vec<Category> = self
                    .engine
                    .panel()
                    .toggles()
                    .iter()
                    .filter(|t| !t.checked)
                    .map(|t| t.category)
                    .collect();
                for category in hidden {
                    self.set_category(category, true);
                }
            }
            Action::NextToggle => step(&mut self.panel_state, self.engine.panel().toggles().len(), true),
            Action::PreviousToggle => {
                step(&mut self.panel_state, self.engine.panel().toggles().len(), false)
            }
            Action::ScrollDown => step(&mut self.list_state, self.rows.len(), true),
            Action::ScrollUp => step(&mut self.list_state, self.rows.len(), false),
            Action::Paginate => self.paginate(),
            Action::Navigate => self.navigate(),
        }
        self.recalculate_view();
        true
    }

    fn toggle_at(&mut self, index: usize) {
        let Some(toggle) = self.engine.panel().toggles().get(index) else {
            return;
        };
        let (category, checked) = (toggle.category, toggle.checked);
        self.panel_state.select(Some(index));
        self.set_category(category, !checked);
    }

    fn set_category(&mut self, category: Category, visible: bool) {
        match self.engine.toggle(&mut self.tree, category, visible) {
            Ok(changed) => {
                let verb = if visible { "Showing" } else { "Hiding" };
                self.message = format!("{} {} ({} items changed)", verb, category.label(), changed);
            }
            Err(e) => {
                self.message = format!("Error: preference not saved: {}", e);
            }
        }
    }

    fn pump(&mut self) -> String {
        let batch = self.tree.take_records();
        let report = self.engine.handle_mutations(&mut self.tree, &batch);
        format!(
            "{} activated, {} destroyed, {} rescanned",
            report.activated, report.destroyed, report.rescanned
        )
    }

    fn paginate(&mut self) {
        let Some(watcher) = self.engine.registry().watchers().next() else {
            self.message = "Nothing to paginate".to_string();
            return;
        };
        let container = watcher.container();
        let Some(partition) = watcher.partition() else {
            return;
        };
        let mut items: Vec<NodeId> = self
            .tree
            .descendants(container)
            .into_iter()
            .filter(|n| partition.category_of(*n).is_some())
            .collect();
        items.truncate(PAGE_SIZE);
        let Some(parent) = items.first().and_then(|n| self.tree.parent(*n)) else {
            self.message = "Timeline is empty".to_string();
            return;
        };
        let copies: Vec<ElementSpec> = items.iter().map(|n| self.tree.to_spec(*n)).collect();
        for copy in &copies {
            self.tree.insert(parent, copy);
        }
        self.message = format!("Loaded {} more: {}", copies.len(), self.pump());
    }

    fn navigate(&mut self) {
        let panel_root = self.engine.panel().root();
        let body = self.tree.body();
        for node in self.tree.children(body) {
            if Some(node) != panel_root {
                self.tree.remove(node);
            }
        }
        let away = self.pump();
        for spec in &self.fixture {
            self.tree.insert(body, spec);
        }
        let back = self.pump();
        self.message = format!("Away: {} | Back: {}", away, back);
    }
}

fn step(state: &mut ListState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}
