//! Traversal orders for nested sets.

/// Iteration order of a nested set.
///
/// The order is fixed at construction and determines how direct elements
/// interleave with transitive members, and whether the flattened list is
/// reversed before being returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Transitive members first, direct elements last; no reversal.
    Stable,
    /// Same interleaving as [`Order::Stable`]; named for compile-input sets.
    Compile,
    /// Direct elements first, then transitive members.
    NaiveLink,
    /// Construction inputs are iterated in reverse and the flattened list is
    /// reversed again, yielding right-to-left link order.
    Link,
}

impl Order {
    /// True if direct elements are inserted before transitive members.
    pub(crate) fn preorder(self) -> bool {
        matches!(self, Order::NaiveLink)
    }

    /// True if construction iterates its input collections in reverse.
    pub(crate) fn reverse_on_build(self) -> bool {
        matches!(self, Order::Link)
    }

    /// True if the flattened list is reversed before being returned.
    pub(crate) fn reverse_on_flatten(self) -> bool {
        matches!(self, Order::Link)
    }

    /// Whether sets of this order may absorb sets of `other`.
    /// [`Order::Stable`] mixes with everything; all other orders only with
    /// themselves.
    pub fn is_compatible(self, other: Order) -> bool {
        self == other || self == Order::Stable || other == Order::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preorder_only_for_naive_link() {
        assert!(Order::NaiveLink.preorder());
        assert!(!Order::Stable.preorder());
        assert!(!Order::Compile.preorder());
        assert!(!Order::Link.preorder());
    }

    #[test]
    fn test_link_reverses_twice() {
        assert!(Order::Link.reverse_on_build());
        assert!(Order::Link.reverse_on_flatten());
        assert!(!Order::Stable.reverse_on_build());
        assert!(!Order::NaiveLink.reverse_on_flatten());
    }

    #[test]
    fn test_compatibility() {
        assert!(Order::Stable.is_compatible(Order::Link));
        assert!(Order::Link.is_compatible(Order::Stable));
        assert!(Order::Compile.is_compatible(Order::Compile));
        assert!(!Order::Compile.is_compatible(Order::Link));
        assert!(!Order::Link.is_compatible(Order::NaiveLink));
    }
}
