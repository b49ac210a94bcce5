// File: ./src/model/partition.rs
// Result of one classification run
use crate::model::category::{Category, CategoryMap};

/// Every category of the dialect mapped to its items, in item order.
/// Built fresh on each run and never shared between containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<N> {
    buckets: CategoryMap<Vec<N>>,
}

impl<N: Copy + PartialEq> Partition<N> {
    /// All `categories` present and empty. `Others` is always added.
    pub fn empty(categories: &[Category]) -> Self {
        let mut buckets = CategoryMap::from_fn(categories, |_| Vec::new());
        if !buckets.contains(Category::Others) {
            buckets.insert(Category::Others, Vec::new());
        }
        Self { buckets }
    }

    pub(crate) fn extend(&mut self, category: Category, items: Vec<N>) {
        match self.buckets.get_mut(category) {
            Some(bucket) => bucket.extend(items),
            None => {
                self.buckets.insert(category, items);
            }
        }
    }

    pub fn items(&self, category: Category) -> &[N] {
        self.buckets.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn category_of(&self, item: N) -> Option<Category> {
        self.buckets
            .iter()
            .find(|(_, items)| items.contains(&item))
            .map(|(category, _)| category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.buckets.categories()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[N])> {
        self.buckets.iter().map(|(c, items)| (c, items.as_slice()))
    }

    pub fn counts(&self) -> CategoryMap<usize> {
        let categories: Vec<Category> = self.categories().collect();
        CategoryMap::from_fn(&categories, |c| self.items(c).len())
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, items)| items.len()).sum()
    }
}
