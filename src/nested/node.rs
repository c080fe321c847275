//! The nested set node representation and its traversals.
//!
//! A [`NestedSet`] is an immutable ordered set of elements of type `E`.
//! Conceptually the values form a directed acyclic graph: each leaf node is
//! a set containing a single element, there is one distinguished empty node,
//! and every non-leaf node is the union of the sets represented by its
//! successors. Building a union is cheap and shares structure; enumerating
//! the elements requires flattening the DAG, which eliminates duplicates
//! with an ephemeral hash table and is memoized per node.
//!
//! A non-leaf node always has at least two logical successors: if a union
//! would wrap exactly one element or one other set, the result reuses that
//! successor's node directly.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::order::Order;
use super::pending::{ChildrenPromise, InterruptStrategy, PendingCell};
use crate::error::{exit_code, FlattenError};

/// Flattened lists longer than this are truncated by the `Debug` rendering.
const MAX_ELEMENTS_TO_DEBUG: usize = 1_000_000;

/// One successor slot of a branch node.
#[derive(Clone)]
pub(crate) enum Child<E> {
    Leaf(E),
    Branch(Arc<BranchNode<E>>),
}

impl<E> Child<E> {
    fn depth(&self) -> usize {
        match self {
            Child::Leaf(_) => 1,
            Child::Branch(node) => node.depth,
        }
    }
}

/// A non-leaf DAG node: the graph depth plus at least two successors.
pub(crate) struct BranchNode<E> {
    depth: usize,
    children: Box<[Child<E>]>,
    /// True when every successor is a leaf. Flattening then needs no memo:
    /// construction already deduplicated the elements.
    all_leaves: bool,
    /// Descend bitfield plus distinct-element count. Computed by the first
    /// flatten, immutable after publication; later flattens replay it
    /// without locking or duplicate elimination.
    memo: OnceLock<Memo>,
}

struct Memo {
    bits: Box<[u8]>,
    size: usize,
}

#[inline]
fn bit_set(bits: &[u8], pos: usize) -> bool {
    bits.get(pos >> 3).is_some_and(|byte| byte & (1 << (pos & 7)) != 0)
}

/// Append-only bitfield used while recording a traversal.
struct BitWriter {
    bytes: Vec<u8>,
}

impl BitWriter {
    fn with_edge_hint(edges: usize) -> BitWriter {
        // Start small on the optimistic assumption that trailing bits are
        // all zero (redundant successors) and need no explicit storage.
        BitWriter {
            bytes: vec![0; edges.div_ceil(8).clamp(1, 8)],
        }
    }

    fn set(&mut self, pos: usize) {
        let index = pos >> 3;
        if index >= self.bytes.len() {
            self.bytes.resize((index + 1).next_power_of_two(), 0);
        }
        self.bytes[index] |= 1 << (pos & 7);
    }

    fn into_bits(mut self, edges_walked: usize) -> Box<[u8]> {
        self.bytes.truncate(edges_walked.div_ceil(8).max(1));
        self.bytes.into_boxed_slice()
    }
}

impl<E: Eq + Hash + Clone> BranchNode<E> {
    fn new(children: Vec<Child<E>>, depth: usize, all_leaves: bool) -> Arc<Self> {
        debug_assert!(children.len() >= 2);
        Arc::new(BranchNode {
            depth,
            children: children.into_boxed_slice(),
            all_leaves,
            memo: OnceLock::new(),
        })
    }

    /// Flatten this node into the list of its distinct reachable elements.
    fn expand(&self) -> Vec<E> {
        if self.all_leaves {
            return self
                .children
                .iter()
                .map(|child| match child {
                    Child::Leaf(element) => element.clone(),
                    Child::Branch(_) => unreachable!("all-leaf node holds a branch"),
                })
                .collect();
        }
        if let Some(memo) = self.memo.get() {
            return self.replay(memo);
        }
        let mut first_walk = None;
        let memo = self.memo.get_or_init(|| {
            let (memo, members) = self.walk_all();
            first_walk = Some(members);
            memo
        });
        match first_walk {
            Some(members) => members,
            // Another thread won the initialization race; replay its memo.
            None => self.replay(memo),
        }
    }

    fn memoized_size(&self) -> usize {
        if self.all_leaves {
            return self.children.len();
        }
        match self.memo.get() {
            Some(memo) => memo.size,
            None => self.expand().len(),
        }
    }

    /// Depth-first traversal computing the memo: one bit per visited
    /// successor edge, set when the edge contributes at least one element
    /// not seen earlier in the traversal.
    fn walk_all(&self) -> (Memo, Vec<E>) {
        let mut visited: HashSet<*const BranchNode<E>> = HashSet::new();
        let mut seen: HashSet<E> = HashSet::new();
        let mut members: Vec<E> = Vec::new();
        let mut bits = BitWriter::with_edge_hint(self.children.len());
        visited.insert(self as *const BranchNode<E>);
        let edges = Self::walk(
            &self.children,
            &mut visited,
            &mut seen,
            &mut members,
            &mut bits,
            0,
        );
        let size = members.len();
        (
            Memo {
                bits: bits.into_bits(edges),
                size,
            },
            members,
        )
    }

    fn walk(
        children: &[Child<E>],
        visited: &mut HashSet<*const BranchNode<E>>,
        seen: &mut HashSet<E>,
        members: &mut Vec<E>,
        bits: &mut BitWriter,
        mut pos: usize,
    ) -> usize {
        for child in children {
            match child {
                Child::Branch(node) => {
                    if visited.insert(Arc::as_ptr(node)) {
                        let edge_pos = pos;
                        let size_before = members.len();
                        pos = Self::walk(&node.children, visited, seen, members, bits, pos + 1);
                        if members.len() > size_before {
                            bits.set(edge_pos);
                        } else {
                            // The subgraph contributed nothing new. Rewind:
                            // no bits below this edge were set, so replay
                            // will skip the whole subgraph.
                            pos = edge_pos + 1;
                        }
                    } else {
                        pos += 1;
                    }
                }
                Child::Leaf(element) => {
                    if seen.insert(element.clone()) {
                        members.push(element.clone());
                        bits.set(pos);
                    }
                    pos += 1;
                }
            }
        }
        pos
    }

    /// Repeat a traversal previously recorded in `memo`, emitting elements
    /// in the same positions without duplicate tracking.
    fn replay(&self, memo: &Memo) -> Vec<E> {
        let mut out = Vec::with_capacity(memo.size);
        Self::replay_into(&mut out, &self.children, &memo.bits, 0);
        out
    }

    fn replay_into(out: &mut Vec<E>, children: &[Child<E>], bits: &[u8], mut pos: usize) -> usize {
        for child in children {
            if bit_set(bits, pos) {
                match child {
                    Child::Branch(node) => {
                        pos = Self::replay_into(out, &node.children, bits, pos + 1);
                    }
                    Child::Leaf(element) => {
                        out.push(element.clone());
                        pos += 1;
                    }
                }
            } else {
                pos += 1;
            }
        }
        pos
    }
}

/// The physical representation of a set handle.
#[derive(Clone)]
pub(crate) enum Repr<E> {
    Empty,
    Leaf(E),
    Branch(Arc<BranchNode<E>>),
    Pending(Arc<PendingCell<E>>),
}

/// The shape of a set's contents once any pending materialization is done.
#[derive(Clone)]
pub(crate) enum Resolved<E> {
    Empty,
    Leaf(E),
    Branch(Arc<BranchNode<E>>),
}

impl<E: fmt::Debug> fmt::Debug for Resolved<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Empty => write!(f, "Resolved::Empty"),
            Resolved::Leaf(element) => write!(f, "Resolved::Leaf({:?})", element),
            Resolved::Branch(_) => write!(f, "Resolved::Branch(..)"),
        }
    }
}

/// An immutable ordered set of elements, represented as a node in a DAG
/// with structural sharing. See the module documentation.
#[derive(Clone)]
pub struct NestedSet<E> {
    order: Order,
    repr: Repr<E>,
}

impl<E> NestedSet<E> {
    /// The canonical empty set for the given order. O(1).
    pub fn empty(order: Order) -> Self {
        NestedSet {
            order,
            repr: Repr::Empty,
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// True if the set is empty. O(1); does not flatten.
    pub fn is_empty(&self) -> bool {
        matches!(self.repr, Repr::Empty)
    }

    /// True if the set holds exactly one element directly. Sets still being
    /// materialized are never singletons.
    pub fn is_singleton(&self) -> bool {
        matches!(self.repr, Repr::Leaf(_))
    }

    /// True if this set's contents come from storage.
    pub fn is_from_storage(&self) -> bool {
        matches!(self.repr, Repr::Pending(_))
    }

    /// The single element; only valid when [`is_singleton`] is true.
    ///
    /// [`is_singleton`]: NestedSet::is_singleton
    pub fn get_single(&self) -> &E {
        match &self.repr {
            Repr::Leaf(element) => element,
            _ => panic!("get_single called on a non-singleton nested set"),
        }
    }
}

impl<E: Clone> NestedSet<E> {
    /// A set whose contents arrive later, together with the single-use
    /// promise that will publish them.
    pub fn pending(order: Order) -> (NestedSet<E>, ChildrenPromise<E>) {
        let cell = PendingCell::new();
        (
            NestedSet {
                order,
                repr: Repr::Pending(cell.clone()),
            },
            ChildrenPromise::new(cell, order),
        )
    }

    /// True if the contents are available in memory, i.e. the set is not
    /// from storage or has finished materializing.
    pub fn is_ready(&self) -> bool {
        match &self.repr {
            Repr::Pending(cell) => cell.is_resolved(),
            _ => true,
        }
    }

    pub(crate) fn into_resolved(self) -> Resolved<E> {
        match self.repr {
            Repr::Empty => Resolved::Empty,
            Repr::Leaf(element) => Resolved::Leaf(element),
            Repr::Branch(node) => Resolved::Branch(node),
            Repr::Pending(_) => panic!("pending set has no resolved contents"),
        }
    }

    pub(crate) fn resolved_with(
        &self,
        strategy: InterruptStrategy,
    ) -> Result<Resolved<E>, FlattenError> {
        match &self.repr {
            Repr::Empty => Ok(Resolved::Empty),
            Repr::Leaf(element) => Ok(Resolved::Leaf(element.clone())),
            Repr::Branch(node) => Ok(Resolved::Branch(node.clone())),
            Repr::Pending(cell) => match cell.wait() {
                Ok(resolved) => Ok(resolved),
                Err(e) => match strategy {
                    InterruptStrategy::Propagate => Err(e),
                    InterruptStrategy::Crash => crash_on_interrupt(),
                },
            },
        }
    }

    fn resolved_uninterruptibly(&self) -> Resolved<E> {
        match self.resolved_with(InterruptStrategy::Crash) {
            Ok(resolved) => resolved,
            Err(_) => unreachable!("crash strategy does not propagate"),
        }
    }

    /// Depth of the DAG under this node: the empty set has depth zero, a
    /// singleton depth one, a non-leaf node one more than its deepest
    /// successor. O(1) once contents are materialized.
    pub fn depth(&self) -> usize {
        match self.resolved_uninterruptibly() {
            Resolved::Empty => 0,
            Resolved::Leaf(_) => 1,
            Resolved::Branch(node) => node.depth,
        }
    }

    /// An opaque reference to the logical DAG node this set represents.
    /// Nodes support only identity comparison; two distinct sets may hold
    /// equal elements without their nodes being equal.
    pub fn to_node(&self) -> Node<E> {
        Node(self.repr.clone())
    }
}

impl<E: Eq + Hash + Clone> NestedSet<E> {
    /// A set of the given direct elements, deduplicated, with no transitive
    /// members.
    pub fn wrap(order: Order, elements: impl IntoIterator<Item = E>) -> NestedSet<E> {
        let mut seen = HashSet::new();
        let direct: Vec<E> = elements
            .into_iter()
            .filter(|element| seen.insert(element.clone()))
            .collect();
        match Self::from_parts(order, &direct, &[], InterruptStrategy::Crash) {
            Ok(set) => set,
            Err(_) => unreachable!("no transitive members to wait for"),
        }
    }

    /// Core construction: two insertion passes keyed on the order's
    /// direct/transitive interleaving, hoisting singleton transitive members
    /// into leaves and adopting branch nodes by reference.
    pub(crate) fn from_parts(
        order: Order,
        direct: &[E],
        transitive: &[NestedSet<E>],
        strategy: InterruptStrategy,
    ) -> Result<NestedSet<E>, FlattenError> {
        let mut children: Vec<Child<E>> = Vec::with_capacity(direct.len() + transitive.len());
        let mut inserted_leaves: HashSet<E> = HashSet::new();
        let mut depth = 2usize;
        let mut all_leaves = true;
        let preorder = order.preorder();
        let reverse = order.reverse_on_build();

        for pass in 0..2 {
            if (pass == 0) == preorder {
                let mut insert = |element: &E| {
                    if inserted_leaves.insert(element.clone()) {
                        children.push(Child::Leaf(element.clone()));
                    }
                };
                if reverse {
                    direct.iter().rev().for_each(&mut insert);
                } else {
                    direct.iter().for_each(&mut insert);
                }
            } else {
                let mut insert = |subset: &NestedSet<E>| -> Result<(), FlattenError> {
                    match subset.resolved_with(strategy)? {
                        Resolved::Empty => {}
                        Resolved::Leaf(element) => {
                            // Hoist one-element subsets into plain leaves so
                            // the flattening fast path never sees duplicates.
                            if inserted_leaves.insert(element.clone()) {
                                children.push(Child::Leaf(element));
                            }
                        }
                        Resolved::Branch(node) => {
                            depth = depth.max(1 + node.depth);
                            all_leaves = false;
                            children.push(Child::Branch(node));
                        }
                    }
                    Ok(())
                };
                if reverse {
                    for subset in transitive.iter().rev() {
                        insert(subset)?;
                    }
                } else {
                    for subset in transitive {
                        insert(subset)?;
                    }
                }
            }
        }

        let repr = match children.len() {
            0 => Repr::Empty,
            // A union with exactly one successor is that successor.
            1 => match children.pop() {
                Some(Child::Leaf(element)) => Repr::Leaf(element),
                Some(Child::Branch(node)) => Repr::Branch(node),
                None => unreachable!(),
            },
            _ => Repr::Branch(BranchNode::new(children, depth, all_leaves)),
        };
        Ok(NestedSet { order, repr })
    }

    /// All distinct elements reachable from this node, in the order
    /// determined by [`Order`]. The first call on a node computes its
    /// traversal memo; later calls replay it without duplicate tracking.
    /// Crashes the process if interrupted while materializing contents.
    pub fn to_list(&self) -> Vec<E> {
        self.resolved_to_list(self.resolved_uninterruptibly())
    }

    /// Like [`to_list`], but surfaces an interruption of a pending
    /// materialization to the caller.
    ///
    /// [`to_list`]: NestedSet::to_list
    pub fn to_list_interruptibly(&self) -> Result<Vec<E>, FlattenError> {
        Ok(self.resolved_to_list(self.resolved_with(InterruptStrategy::Propagate)?))
    }

    /// Like [`to_list_interruptibly`], but also bounds the wait for pending
    /// contents. The timeout covers only the materialization wait, not the
    /// flattening itself.
    ///
    /// [`to_list_interruptibly`]: NestedSet::to_list_interruptibly
    pub fn to_list_with_timeout(&self, timeout: Duration) -> Result<Vec<E>, FlattenError> {
        let resolved = match &self.repr {
            Repr::Pending(cell) => cell.wait_timeout(timeout)?,
            _ => self.resolved_with(InterruptStrategy::Propagate)?,
        };
        Ok(self.resolved_to_list(resolved))
    }

    fn resolved_to_list(&self, resolved: Resolved<E>) -> Vec<E> {
        let mut list = match resolved {
            Resolved::Empty => Vec::new(),
            Resolved::Leaf(element) => vec![element],
            Resolved::Branch(node) => node.expand(),
        };
        if self.order.reverse_on_flatten() {
            list.reverse();
        }
        list
    }

    /// All distinct reachable elements as a hash set.
    pub fn to_set(&self) -> HashSet<E> {
        self.to_list().into_iter().collect()
    }

    /// The number of distinct reachable elements. Flattens (and memoizes)
    /// on first use; O(1) afterwards.
    pub fn memoized_flatten_and_get_size(&self) -> usize {
        match self.resolved_uninterruptibly() {
            Resolved::Empty => 0,
            Resolved::Leaf(_) => 1,
            Resolved::Branch(node) => node.memoized_size(),
        }
    }

    /// Apply `visitor` to every element reachable through nodes accepted by
    /// `descend`. `descend` is consulted for every node including leaves;
    /// returning false prunes the walk there. Allocates no memo.
    pub fn for_each_element(
        &self,
        mut descend: impl FnMut(&Node<E>) -> bool,
        mut visitor: impl FnMut(&E),
    ) {
        let root = Node(match self.resolved_uninterruptibly() {
            Resolved::Empty => Repr::Empty,
            Resolved::Leaf(element) => Repr::Leaf(element),
            Resolved::Branch(node) => Repr::Branch(node),
        });
        Self::for_each_node(&root, &mut descend, &mut visitor);
    }

    fn for_each_node(
        node: &Node<E>,
        descend: &mut impl FnMut(&Node<E>) -> bool,
        visitor: &mut impl FnMut(&E),
    ) {
        if !descend(node) {
            return;
        }
        match &node.0 {
            Repr::Branch(branch) => {
                for child in branch.children.iter() {
                    let child_node = Node(match child {
                        Child::Leaf(element) => Repr::Leaf(element.clone()),
                        Child::Branch(node) => Repr::Branch(node.clone()),
                    });
                    Self::for_each_node(&child_node, descend, visitor);
                }
            }
            Repr::Leaf(element) => visitor(element),
            Repr::Empty => {}
            Repr::Pending(_) => unreachable!("walk starts from resolved contents"),
        }
    }

    /// The elements reached by following at most one edge from this node.
    pub fn get_leaves(&self) -> Vec<E> {
        match self.resolved_uninterruptibly() {
            Resolved::Empty => Vec::new(),
            Resolved::Leaf(element) => vec![element],
            Resolved::Branch(node) => node
                .children
                .iter()
                .filter_map(|child| match child {
                    Child::Leaf(element) => Some(element.clone()),
                    Child::Branch(_) => None,
                })
                .collect(),
        }
    }

    /// This node's immediate successors that are themselves non-leaf nodes.
    pub fn get_non_leaves(&self) -> Vec<NestedSet<E>> {
        match self.resolved_uninterruptibly() {
            Resolved::Branch(node) => node
                .children
                .iter()
                .filter_map(|child| match child {
                    Child::Branch(branch) => Some(NestedSet {
                        order: self.order,
                        repr: Repr::Branch(branch.clone()),
                    }),
                    Child::Leaf(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// An equivalent set represented by a graph node whose out-degree does
    /// not exceed `max_degree` (at least 2). Shallow: successors are chunked
    /// and only the root is rebuilt recursively. The resulting set's
    /// iteration order is unspecified.
    pub fn split_if_exceeds_max_degree(&self, max_degree: usize) -> NestedSet<E> {
        assert!(max_degree >= 2, "max_degree must be at least 2");
        let node = match self.resolved_uninterruptibly() {
            Resolved::Branch(node) => node,
            _ => return self.clone(),
        };
        if node.children.len() <= max_degree {
            return self.clone();
        }

        let piece_count = node.children.len().div_ceil(max_degree);
        let mut pieces: Vec<Child<E>> = Vec::with_capacity(piece_count);
        for chunk in node.children.chunks(max_degree) {
            if chunk.len() == 1 {
                // A one-node final piece is inlined rather than wrapped.
                pieces.push(chunk[0].clone());
                continue;
            }
            let depth = 1 + chunk.iter().map(Child::depth).max().unwrap_or(1);
            let all_leaves = chunk.iter().all(|child| matches!(child, Child::Leaf(_)));
            pieces.push(Child::Branch(BranchNode::new(
                chunk.to_vec(),
                depth,
                all_leaves,
            )));
        }

        // The root's depth comes from the pieces, not from the node being
        // split: a deep successor inlined from a one-node chunk keeps its
        // own depth and must not be counted as if it had been wrapped.
        let root_depth = 1 + pieces.iter().map(Child::depth).max().unwrap_or(1);
        let split = NestedSet {
            order: self.order,
            repr: Repr::Branch(BranchNode::new(pieces, root_depth, false)),
        };
        // There may still be more than max_degree pieces; the recursion only
        // ever rebuilds the root.
        split.split_if_exceeds_max_degree(max_degree)
    }
}

impl<E: PartialEq> NestedSet<E> {
    /// Equality over the top-level representation: equal orders and equal
    /// successor vectors, comparing non-leaf successors by node identity.
    /// Coarser than deep set equality and strictly faster: it may fail to
    /// equate sets holding the same elements, but never equates sets that
    /// differ.
    pub fn shallow_equals(&self, other: &NestedSet<E>) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.order == other.order && repr_shallow_eq(&self.repr, &other.repr)
    }
}

impl<E: Hash> NestedSet<E> {
    /// A hash consistent with [`shallow_equals`].
    ///
    /// [`shallow_equals`]: NestedSet::shallow_equals
    pub fn shallow_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.order.hash(&mut hasher);
        hash_repr(&self.repr, &mut hasher);
        hasher.finish()
    }
}

fn repr_shallow_eq<E: PartialEq>(a: &Repr<E>, b: &Repr<E>) -> bool {
    match (a, b) {
        (Repr::Empty, Repr::Empty) => true,
        (Repr::Leaf(x), Repr::Leaf(y)) => x == y,
        (Repr::Pending(x), Repr::Pending(y)) => Arc::ptr_eq(x, y),
        (Repr::Branch(x), Repr::Branch(y)) => {
            Arc::ptr_eq(x, y)
                || (x.children.len() == y.children.len()
                    && x.children.iter().zip(y.children.iter()).all(
                        |(cx, cy)| match (cx, cy) {
                            (Child::Leaf(ex), Child::Leaf(ey)) => ex == ey,
                            (Child::Branch(bx), Child::Branch(by)) => Arc::ptr_eq(bx, by),
                            _ => false,
                        },
                    ))
        }
        _ => false,
    }
}

fn hash_repr<E: Hash, H: Hasher>(repr: &Repr<E>, hasher: &mut H) {
    match repr {
        Repr::Empty => 0u8.hash(hasher),
        Repr::Leaf(element) => {
            1u8.hash(hasher);
            element.hash(hasher);
        }
        Repr::Branch(node) => {
            2u8.hash(hasher);
            for child in node.children.iter() {
                match child {
                    Child::Leaf(element) => element.hash(hasher),
                    Child::Branch(branch) => (Arc::as_ptr(branch) as usize).hash(hasher),
                }
            }
        }
        Repr::Pending(cell) => {
            3u8.hash(hasher);
            (Arc::as_ptr(cell) as usize).hash(hasher);
        }
    }
}

fn crash_on_interrupt() -> ! {
    eprintln!("interrupted while materializing nested set contents, exiting abruptly");
    std::process::exit(exit_code::INTERRUPTED);
}

impl<E: fmt::Debug + Eq + Hash + Clone> fmt::Debug for NestedSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Leaf(element) => write!(f, "[{:?}]", element),
            Repr::Pending(cell) if !cell.is_resolved() => {
                write!(f, "NestedSet(still materializing)")
            }
            _ => {
                let elements = self.to_list();
                if elements.len() <= MAX_ELEMENTS_TO_DEBUG {
                    write!(f, "{:?}", elements)
                } else {
                    write!(
                        f,
                        "{:?} (truncated, full size {})",
                        &elements[..MAX_ELEMENTS_TO_DEBUG],
                        elements.len()
                    )
                }
            }
        }
    }
}

/// An opaque reference to a logical node of the nested-set DAG.
///
/// The only supported operations are equality and hashing: non-leaf nodes
/// are equal when they refer to the same graph node, leaf nodes when their
/// elements are equal. Provided so clients can implement their own
/// traversals and detect subgraphs they have already visited.
pub struct Node<E>(pub(crate) Repr<E>);

impl<E: PartialEq> PartialEq for Node<E> {
    fn eq(&self, other: &Node<E>) -> bool {
        match (&self.0, &other.0) {
            (Repr::Empty, Repr::Empty) => true,
            (Repr::Leaf(x), Repr::Leaf(y)) => x == y,
            (Repr::Branch(x), Repr::Branch(y)) => Arc::ptr_eq(x, y),
            (Repr::Pending(x), Repr::Pending(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl<E: Eq> Eq for Node<E> {}

impl<E: Hash> Hash for Node<E> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        hash_repr(&self.0, hasher);
    }
}

impl<E> Clone for Node<E>
where
    E: Clone,
{
    fn clone(&self) -> Self {
        Node(self.0.clone())
    }
}

impl<E> fmt::Debug for Node<E> {
    // Intentionally opaque: printing contents would defeat the
    // identity-only contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NestedSet::Node")
    }
}
