// File: ./src/classifier.rs
// Ordered rule elimination over timeline items
use crate::dialect::{Dialect, Profiles, Rule};
use crate::dom::HostDocument;
use crate::model::{Category, Partition};
use tracing::debug;

/// Buckets `items` by the first rule they satisfy, in rule order.
/// Whatever no rule claims lands in `Others`, so every item is placed exactly once.
pub fn classify<D: HostDocument>(doc: &D, items: &[D::Node], rules: &[Rule]) -> Partition<D::Node> {
    let mut categories: Vec<Category> = Vec::new();
    for rule in rules {
        if !categories.contains(&rule.category) {
            categories.push(rule.category);
        }
    }
    let mut partition = Partition::empty(&categories);

    let mut remaining: Vec<D::Node> = items.to_vec();
    for rule in rules {
        if remaining.is_empty() {
            break;
        }
        let (matched, rest): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|item| rule.predicate.evaluate(doc, *item));
        partition.extend(rule.category, matched);
        remaining = rest;
    }
    partition.extend(Category::Others, remaining);
    partition
}

/// Collects the container's items and classifies them with the dialect's rules.
/// An unknown dialect yields a partition where everything is `Others`.
pub fn classify_container<D: HostDocument>(
    doc: &D,
    container: D::Node,
    dialect: Option<Dialect>,
    profiles: &Profiles,
) -> Partition<D::Node> {
    let partition = match dialect {
        Some(dialect) => {
            let profile = profiles.get(dialect);
            let items = profile.item.query_all(doc, container);
            classify(doc, &items, &profile.rules)
        }
        None => {
            let items = profiles.any_items(doc, container);
            classify(doc, &items, &[])
        }
    };
    debug!(
        ?container,
        ?dialect,
        total = partition.total(),
        "classified timeline"
    );
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DialectProfile, EVENT_ID_ATTR, Predicate};
    use crate::dom::{ElementSpec, Tree};
    use crate::selector::Selector;

    const ITEM_CLASS: &str = "LayoutHelpers-module__timelineElement__abc12";

    fn current_item(event_id: &str) -> ElementSpec {
        ElementSpec::new("div")
            .class(ITEM_CLASS)
            .child(ElementSpec::new("div").attr(EVENT_ID_ATTR, event_id))
    }

    fn with_link(spec: ElementSpec, url: &str) -> ElementSpec {
        spec.child(ElementSpec::new("a").attr("data-hovercard-url", url))
    }

    fn current_tree(items: Vec<ElementSpec>) -> Tree {
        let mut container =
            ElementSpec::new("div").attr("data-testid", "issue-viewer-container");
        container.children = items;
        Tree::with_content(&[container])
    }

    #[test]
    fn current_dialect_scenario() {
        let tree = current_tree(vec![
            current_item("IC_1"),
            current_item("REFE_9"),
            with_link(current_item("CRE_3"), "/octo/repo/pull/3/hovercard"),
        ]);
        let container = tree.children(tree.body())[0];
        let profiles = Profiles::default();
        let partition = classify_container(&tree, container, Some(Dialect::Current), &profiles);
        let items = tree.children(container);

        assert_eq!(partition.items(Category::Comments), &[items[0]]);
        assert_eq!(partition.items(Category::Commits), &[items[1]]);
        assert_eq!(partition.items(Category::Pulls), &[items[2]]);
        assert!(partition.items(Category::Issues).is_empty());
        assert!(partition.items(Category::Others).is_empty());
        assert_eq!(
            partition.categories().collect::<Vec<_>>(),
            DialectProfile::current().categories()
        );
    }

    #[test]
    fn cross_reference_without_link_is_other() {
        let tree = current_tree(vec![
            with_link(current_item("CRE_1"), "/octo/repo/issues/7/hovercard"),
            current_item("CRE_2"),
            current_item("LE_5"),
        ]);
        let container = tree.children(tree.body())[0];
        let partition =
            classify_container(&tree, container, Some(Dialect::Current), &Profiles::default());
        let items = tree.children(container);

        assert_eq!(partition.items(Category::Issues), &[items[0]]);
        assert_eq!(partition.items(Category::Others), &[items[1], items[2]]);
    }

    #[test]
    fn legacy_review_is_not_a_comment() {
        let item = |child: ElementSpec| {
            ElementSpec::new("div")
                .class("js-timeline-item")
                .child(child)
        };
        let tree = Tree::with_content(&[ElementSpec::new("div")
            .class("js-discussion")
            .child(item(ElementSpec::new("div").class("js-comment-container")))
            .child(item(
                ElementSpec::new("div")
                    .class("js-comment-container")
                    .child(ElementSpec::new("div").id("pullrequestreview-42")),
            ))
            .child(item(ElementSpec::new("div").id("commits-pushed-abc")))
            .child(item(
                ElementSpec::new("a").attr("data-hovercard-type", "issue"),
            ))
            .child(item(ElementSpec::new("span").text("added a label")))]);
        let container = tree.children(tree.body())[0];
        let partition =
            classify_container(&tree, container, Some(Dialect::Legacy), &Profiles::default());
        let items = tree.children(container);

        assert_eq!(partition.items(Category::Comments), &[items[0]]);
        assert_eq!(partition.items(Category::Reviews), &[items[1]]);
        assert_eq!(partition.items(Category::Commits), &[items[2]]);
        assert_eq!(partition.items(Category::Issues), &[items[3]]);
        assert_eq!(partition.items(Category::Others), &[items[4]]);
        assert!(partition.items(Category::Pulls).is_empty());
    }

    #[test]
    fn higher_priority_rule_wins_regardless_of_neighbours() {
        // Matches both the commit rule and the pull rule.
        let both = ElementSpec::new("div")
            .class("js-timeline-item")
            .child(ElementSpec::new("div").id("commits-pushed-1"))
            .child(ElementSpec::new("a").attr("data-hovercard-type", "pull_request"));
        let pull = ElementSpec::new("div")
            .class("js-timeline-item")
            .child(ElementSpec::new("a").attr("data-hovercard-type", "pull_request"));

        for order in [vec![both.clone(), pull.clone()], vec![pull.clone(), both.clone()]] {
            let tree = Tree::with_content(&order);
            let nodes = tree.children(tree.body());
            let both_node = if order[0] == both { nodes[0] } else { nodes[1] };
            let partition = classify(&tree, &nodes, &DialectProfile::legacy().rules);
            assert_eq!(partition.category_of(both_node), Some(Category::Commits));
        }

        // Current markup: a cross reference linking both a pull and an issue.
        let both = with_link(
            with_link(current_item("CRE_1"), "/octo/repo/issues/4/hovercard"),
            "/octo/repo/pull/5/hovercard",
        );
        let issue = with_link(current_item("CRE_2"), "/octo/repo/issues/6/hovercard");
        for order in [vec![both.clone(), issue.clone()], vec![issue.clone(), both.clone()]] {
            let tree = current_tree(order.clone());
            let container = tree.children(tree.body())[0];
            let nodes = tree.children(container);
            let (both_node, issue_node) = if order[0] == both {
                (nodes[0], nodes[1])
            } else {
                (nodes[1], nodes[0])
            };
            let partition = classify(&tree, &nodes, &DialectProfile::current().rules);
            assert_eq!(partition.category_of(both_node), Some(Category::Pulls));
            assert_eq!(partition.category_of(issue_node), Some(Category::Issues));
        }
    }

    #[test]
    fn reordering_rules_changes_the_outcome() {
        let tree = Tree::with_content(&[ElementSpec::new("div")
            .child(ElementSpec::new("i").class("a"))
            .child(ElementSpec::new("i").class("b"))]);
        let nodes = tree.children(tree.body());
        let a = Rule::new(Category::Comments, Predicate::Has(Selector::class("a")));
        let b = Rule::new(Category::Commits, Predicate::Has(Selector::class("b")));

        let first = classify(&tree, &nodes, &[a.clone(), b.clone()]);
        let second = classify(&tree, &nodes, &[b, a]);
        assert_eq!(first.category_of(nodes[0]), Some(Category::Comments));
        assert_eq!(second.category_of(nodes[0]), Some(Category::Commits));
    }

    #[test]
    fn unknown_dialect_puts_everything_in_others() {
        let tree = Tree::with_content(&[ElementSpec::new("div")
            .class("js-discussion")
            .attr("data-testid", "issue-viewer-container")
            .child(
                ElementSpec::new("div")
                    .class("js-timeline-item")
                    .child(ElementSpec::new("div").class("js-comment-container")),
            )
            .child(current_item("IC_2"))]);
        let container = tree.children(tree.body())[0];
        let partition = classify_container(&tree, container, None, &Profiles::default());

        assert_eq!(partition.categories().collect::<Vec<_>>(), vec![Category::Others]);
        assert_eq!(partition.items(Category::Others).len(), 2);
    }

    #[test]
    fn classification_is_idempotent() {
        let tree = current_tree(vec![
            current_item("IC_1"),
            current_item("DE_7"),
            current_item("XYZ_1"),
        ]);
        let container = tree.children(tree.body())[0];
        let profiles = Profiles::default();
        let first = classify_container(&tree, container, Some(Dialect::Current), &profiles);
        let second = classify_container(&tree, container, Some(Dialect::Current), &profiles);
        assert_eq!(first, second);
        assert_eq!(first.items(Category::Deployments).len(), 1);
    }

    mod totality {
        use super::*;
        use proptest::prelude::*;

        const PREFIXES: [&str; 6] = ["IC_", "REFE_", "CRE_", "DE_", "LE_", ""];
        const LINKS: [Option<&str>; 3] = [None, Some("/o/r/pull/1"), Some("/o/r/issues/2")];

        proptest! {
            #[test]
            fn every_item_lands_in_exactly_one_category(
                shapes in proptest::collection::vec((0usize..6, 0usize..3), 0..40)
            ) {
                let items: Vec<ElementSpec> = shapes
                    .iter()
                    .enumerate()
                    .map(|(i, (p, l))| {
                        let spec = current_item(&format!("{}{}", PREFIXES[*p], i));
                        match LINKS[*l] {
                            Some(url) => with_link(spec, url),
                            None => spec,
                        }
                    })
                    .collect();
                let tree = current_tree(items);
                let container = tree.children(tree.body())[0];
                let nodes = tree.children(container);

                for rules in [DialectProfile::current().rules, DialectProfile::legacy().rules] {
                    let partition = classify(&tree, &nodes, &rules);
                    prop_assert_eq!(partition.total(), nodes.len());
                    for node in &nodes {
                        let hits = partition
                            .iter()
                            .filter(|(_, items)| items.contains(node))
                            .count();
                        prop_assert_eq!(hits, 1);
                    }
                }
            }
        }
    }
}
