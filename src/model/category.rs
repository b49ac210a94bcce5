// File: ./src/model/category.rs
// The closed set of timeline categories and an ordered map keyed by them
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Comments,
    Commits,
    Pulls,
    Issues,
    Reviews,
    Deployments,
    Others,
}

impl Category {
    /// Canonical order, used for the panel and the persisted object.
    pub const ALL: [Category; 7] = [
        Category::Comments,
        Category::Commits,
        Category::Pulls,
        Category::Issues,
        Category::Reviews,
        Category::Deployments,
        Category::Others,
    ];

    /// Storage and markup key (`data-type`, `gtf-<key>`).
    pub fn key(self) -> &'static str {
        match self {
            Category::Comments => "comments",
            Category::Commits => "commits",
            Category::Pulls => "pulls",
            Category::Issues => "issues",
            Category::Reviews => "reviews",
            Category::Deployments => "deployments",
            Category::Others => "others",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Short label shown next to the checkbox.
    pub fn label(self) -> &'static str {
        match self {
            Category::Comments => "Comments",
            Category::Commits => "Commits",
            Category::Pulls => "Pulls",
            Category::Issues => "Issues",
            Category::Reviews => "Reviews",
            Category::Deployments => "Deployments",
            Category::Others => "Others",
        }
    }

    /// Longer description used as the tooltip.
    pub fn title(self) -> &'static str {
        match self {
            Category::Comments => "Comments",
            Category::Commits => "Commits",
            Category::Pulls => "Cross reference in pull request",
            Category::Issues => "Cross reference in issues",
            Category::Reviews => "Reviews",
            Category::Deployments => "Deployments",
            Category::Others => "Other (labels, assignment, projects, …)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered mapping from category to value. Iteration follows insertion order,
/// which callers set to the dialect's rule order or to `Category::ALL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap<T> {
    entries: IndexMap<Category, T>,
}

impl<T> Default for CategoryMap<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> CategoryMap<T> {
    pub fn from_fn<F>(categories: &[Category], mut f: F) -> Self
    where
        F: FnMut(Category) -> T,
    {
        Self {
            entries: categories.iter().map(|c| (*c, f(*c))).collect(),
        }
    }

    pub fn get(&self, category: Category) -> Option<&T> {
        self.entries.get(&category)
    }

    pub fn get_mut(&mut self, category: Category) -> Option<&mut T> {
        self.entries.get_mut(&category)
    }

    /// Replaces the value in place, or appends a new entry at the end.
    pub fn insert(&mut self, category: Category, value: T) -> Option<T> {
        self.entries.insert(category, value)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.entries.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        self.entries.iter().map(|(c, v)| (*c, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CategoryMap<usize> {
    /// Adds `other`'s counts into `self`, appending categories it lacks.
    pub fn accumulate(&mut self, other: &CategoryMap<usize>) {
        for (category, count) in other.iter() {
            *self.entries.entry(category).or_insert(0) += count;
        }
    }

    pub fn total(&self) -> usize {
        self.entries.values().sum()
    }
}
