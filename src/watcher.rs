// File: ./src/watcher.rs
// One classify-and-filter loop bound to one timeline container
use crate::classifier::classify_container;
use crate::dialect::{Dialect, Profiles};
use crate::dom::{HostDocument, MutationRecord, SubtreeSubscription};
use crate::model::Partition;
use crate::visibility::{VisibilityConfig, apply_visibility};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Read-only inputs every watcher needs on each pass.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub profiles: &'a Profiles,
    pub visibility: &'a VisibilityConfig,
    pub hidden_class: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Inactive,
    Active,
    Destroyed,
}

#[derive(Debug)]
pub struct ContainerWatcher<N> {
    container: N,
    state: WatcherState,
    dialect: Option<Dialect>,
    partition: Option<Partition<N>>,
    subscription: Option<SubtreeSubscription<N>>,
}

impl<N: Copy + Eq + Hash + Debug> ContainerWatcher<N> {
    pub fn new(container: N) -> Self {
        Self {
            container,
            state: WatcherState::Inactive,
            dialect: None,
            partition: None,
            subscription: None,
        }
    }

    pub fn container(&self) -> N {
        self.container
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Latest partition, present only while active.
    pub fn partition(&self) -> Option<&Partition<N>> {
        self.partition.as_ref()
    }

    /// Inactive -> Active: detect the dialect, classify, apply, subscribe.
    /// Returns the number of items whose marker changed. No-op in other states.
    pub fn activate<D>(&mut self, doc: &mut D, ctx: FilterContext<'_>) -> usize
    where
        D: HostDocument<Node = N>,
    {
        if self.state != WatcherState::Inactive {
            return 0;
        }
        self.dialect = ctx.profiles.detect(doc, self.container);
        if self.dialect.is_none() {
            debug!(container = ?self.container, "dialect not recognised, items fall back to others");
        }
        self.state = WatcherState::Active;
        self.subscription = Some(SubtreeSubscription::new(self.container));
        debug!(container = ?self.container, dialect = ?self.dialect, "watcher activated");
        self.rescan(doc, ctx)
    }

    /// Active -> Active: rescan when the batch touched this container.
    /// Returns whether a rescan ran.
    pub fn notify<D>(
        &mut self,
        doc: &mut D,
        batch: &[MutationRecord<N>],
        ctx: FilterContext<'_>,
    ) -> bool
    where
        D: HostDocument<Node = N>,
    {
        let wanted = self
            .subscription
            .as_ref()
            .is_some_and(|sub| sub.wants(doc, batch));
        if !wanted {
            return false;
        }
        self.rescan(doc, ctx);
        true
    }

    /// Re-applies visibility to the current partition without reclassifying.
    pub fn reapply<D>(&self, doc: &mut D, visibility: &VisibilityConfig, hidden_class: &str) -> usize
    where
        D: HostDocument<Node = N>,
    {
        match &self.partition {
            Some(partition) => apply_visibility(doc, partition, visibility, hidden_class),
            None => 0,
        }
    }

    /// Active -> Destroyed: drop the subscription and the partition.
    pub fn destroy(&mut self) {
        if self.state == WatcherState::Destroyed {
            return;
        }
        self.subscription = None;
        self.partition = None;
        self.state = WatcherState::Destroyed;
        debug!(container = ?self.container, "watcher destroyed");
    }

    fn rescan<D>(&mut self, doc: &mut D, ctx: FilterContext<'_>) -> usize
    where
        D: HostDocument<Node = N>,
    {
        let partition = classify_container(doc, self.container, self.dialect, ctx.profiles);
        let changed = apply_visibility(doc, &partition, ctx.visibility, ctx.hidden_class);
        self.partition = Some(partition);
        changed
    }
}
