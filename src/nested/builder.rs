//! Construction of nested sets.

use std::collections::HashSet;
use std::hash::Hash;

use super::node::{NestedSet, Node};
use super::order::Order;
use super::pending::InterruptStrategy;
use crate::error::FlattenError;

/// Builder of a [`NestedSet`]: an order, insertion-ordered deduplicated
/// direct elements, and identity-deduplicated transitive members.
///
/// Mixing orders is a programming error and panics, except that
/// [`Order::Stable`] mixes with everything.
pub struct NestedSetBuilder<E> {
    order: Order,
    direct: Vec<E>,
    direct_seen: HashSet<E>,
    transitive: Vec<NestedSet<E>>,
    transitive_seen: HashSet<Node<E>>,
}

impl<E: Eq + Hash + Clone> NestedSetBuilder<E> {
    pub fn new(order: Order) -> Self {
        NestedSetBuilder {
            order,
            direct: Vec::new(),
            direct_seen: HashSet::new(),
            transitive: Vec::new(),
            transitive_seen: HashSet::new(),
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// True when nothing has been added yet; building then yields the
    /// canonical empty set.
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.transitive.is_empty()
    }

    /// Add one direct element. Duplicates are ignored, keeping the first
    /// insertion position.
    pub fn add(&mut self, element: E) -> &mut Self {
        if self.direct_seen.insert(element.clone()) {
            self.direct.push(element);
        }
        self
    }

    pub fn add_all(&mut self, elements: impl IntoIterator<Item = E>) -> &mut Self {
        for element in elements {
            self.add(element);
        }
        self
    }

    /// Add a transitive member. Empty subsets are dropped; a subset added
    /// twice (by node identity) is kept once.
    pub fn add_transitive(&mut self, subset: NestedSet<E>) -> &mut Self {
        assert!(
            self.order.is_compatible(subset.order()),
            "order mismatch: cannot add a {:?} set to a {:?} builder",
            subset.order(),
            self.order
        );
        if subset.is_empty() {
            return self;
        }
        if self.transitive_seen.insert(subset.to_node()) {
            self.transitive.push(subset);
        }
        self
    }

    /// Build the set. Blocks on transitive members that are still
    /// materializing and crashes the process if interrupted while doing so.
    pub fn build(&self) -> NestedSet<E> {
        match NestedSet::from_parts(
            self.order,
            &self.direct,
            &self.transitive,
            InterruptStrategy::Crash,
        ) {
            Ok(set) => set,
            Err(_) => unreachable!("crash strategy does not propagate"),
        }
    }

    /// Like [`build`], but surfaces an interruption of a pending transitive
    /// member to the caller.
    ///
    /// [`build`]: NestedSetBuilder::build
    pub fn build_interruptibly(&self) -> Result<NestedSet<E>, FlattenError> {
        NestedSet::from_parts(
            self.order,
            &self.direct,
            &self.transitive,
            InterruptStrategy::Propagate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_yields_canonical_empty() {
        let builder: NestedSetBuilder<String> = NestedSetBuilder::new(Order::Compile);
        assert!(builder.is_empty());
        let set = builder.build();
        assert!(set.is_empty());
        assert_eq!(set.order(), Order::Compile);
    }

    #[test]
    fn test_add_preserves_first_insertion_position() {
        let set = NestedSetBuilder::new(Order::Stable)
            .add("b".to_string())
            .add("a".to_string())
            .add("b".to_string())
            .build();
        assert_eq!(set.to_list(), vec!["b", "a"]);
    }

    #[test]
    fn test_add_all() {
        let set = NestedSetBuilder::new(Order::Stable)
            .add_all(["x", "y", "x"].map(String::from))
            .build();
        assert_eq!(set.to_list(), vec!["x", "y"]);
    }

    #[test]
    fn test_transitive_identity_dedup() {
        let inner = NestedSet::wrap(Order::Stable, ["c", "d"].map(String::from));
        let set = NestedSetBuilder::new(Order::Stable)
            .add("a".to_string())
            .add_transitive(inner.clone())
            .add_transitive(inner)
            .build();
        assert_eq!(set.to_list(), vec!["c", "d", "a"]);
    }

    #[test]
    fn test_empty_transitive_is_dropped() {
        let set = NestedSetBuilder::new(Order::Stable)
            .add("a".to_string())
            .add_transitive(NestedSet::empty(Order::Stable))
            .build();
        assert!(set.is_singleton());
    }

    #[test]
    fn test_stable_mixes_with_other_orders() {
        let link = NestedSet::wrap(Order::Link, ["l"].map(String::from));
        let set = NestedSetBuilder::new(Order::Stable)
            .add_transitive(link)
            .add("a".to_string())
            .build();
        assert_eq!(set.to_list(), vec!["l", "a"]);
    }

    #[test]
    #[should_panic(expected = "order mismatch")]
    fn test_incompatible_orders_panic() {
        let compile = NestedSet::wrap(Order::Compile, ["c"].map(String::from));
        NestedSetBuilder::new(Order::Link).add_transitive(compile);
    }

    #[test]
    fn test_build_is_repeatable() {
        let mut builder = NestedSetBuilder::new(Order::Stable);
        builder.add("a".to_string());
        let first = builder.build();
        builder.add("b".to_string());
        let second = builder.build();
        assert_eq!(first.to_list(), vec!["a"]);
        assert_eq!(second.to_list(), vec!["a", "b"]);
    }
}
