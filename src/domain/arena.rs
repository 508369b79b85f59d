//! Arena-backed forest produced by the classifier.

use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::instrument;

use crate::domain::entities::TreeElement;

/// Classification of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// No parent. Root-ness does not depend on having children.
    Root,
    /// Has a parent and at least one child.
    Internal,
    /// Has a parent and no children.
    Leaf,
}

impl Role {
    pub fn is_leaf(self) -> bool {
        matches!(self, Role::Leaf)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Root => "root",
            Role::Internal => "internal",
            Role::Leaf => "leaf",
        };
        f.write_str(name)
    }
}

/// Tree node in the arena. `parent` and `children` are indices, not owners.
#[derive(Debug)]
pub struct Node<T> {
    /// Own position in the arena
    pub index: Index,
    /// The wrapped source element
    pub data: T,
    pub role: Role,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes, in source order
    pub children: Vec<Index>,
}

impl<T: TreeElement> Node<T> {
    pub fn id(&self) -> i64 {
        self.data.element_id()
    }

    pub fn label(&self) -> &str {
        self.data.label()
    }
}

/// Why a source element did not make it into the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetachReason {
    /// No element carries the referenced parent id.
    MissingParent,
    /// The parent exists but was itself detached.
    DetachedAncestor,
    /// The parent chain loops without reaching a root.
    Cycle,
}

impl fmt::Display for DetachReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DetachReason::MissingParent => "parent not found",
            DetachReason::DetachedAncestor => "ancestor detached",
            DetachReason::Cycle => "parent chain is cyclic",
        };
        f.write_str(text)
    }
}

/// Diagnostic record for a dropped element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Detached {
    pub id: i64,
    pub parent_id: i64,
    pub reason: DetachReason,
}

/// Complete result of one classification run.
///
/// Roots and the flat list are views over the same arena. The flat list
/// carries the display order; child lists keep source order.
#[derive(Debug)]
pub struct Forest<T> {
    arena: Arena<Node<T>>,
    roots: Vec<Index>,
    flat: Vec<Index>,
    detached: Vec<Detached>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            arena: Arena::with_capacity(n),
            roots: Vec::new(),
            flat: Vec::with_capacity(n),
            detached: Vec::new(),
        }
    }

    /// Inserts a node and links it below `parent`.
    ///
    /// A parent that gains its first child turns from Leaf into Internal.
    /// The node is not added to the flat list; see [`Forest::push_flat`].
    #[instrument(level = "trace", skip(self, data))]
    pub(crate) fn insert_node(&mut self, data: T, parent: Option<Index>) -> Index {
        let role = if parent.is_some() {
            Role::Leaf
        } else {
            Role::Root
        };
        let node_idx = self.arena.insert_with(|index| Node {
            index,
            data,
            role,
            parent,
            children: Vec::new(),
        });

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
                if parent.role == Role::Leaf {
                    parent.role = Role::Internal;
                }
            }
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    pub(crate) fn push_flat(&mut self, idx: Index) {
        self.flat.push(idx);
    }

    pub(crate) fn record_detached(&mut self, detached: Detached) {
        self.detached.push(detached);
    }

    /// Stable sort of the flat list. Child lists are left untouched.
    pub(crate) fn sort_flat_by<K, F>(&mut self, key: F, descending: bool)
    where
        K: Ord,
        F: Fn(&Node<T>) -> K,
    {
        let arena = &self.arena;
        let sorted = self
            .flat
            .iter()
            .copied()
            .sorted_by(|&a, &b| {
                let ordering = key(&arena[a]).cmp(&key(&arena[b]));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .collect();
        self.flat = sorted;
    }

    pub fn get(&self, idx: Index) -> Option<&Node<T>> {
        self.arena.get(idx)
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Root nodes in source order.
    pub fn roots(&self) -> impl Iterator<Item = &Node<T>> + '_ {
        self.roots.iter().filter_map(|&idx| self.arena.get(idx))
    }

    pub fn root_indices(&self) -> &[Index] {
        &self.roots
    }

    /// All nodes in flat-list order.
    pub fn iter(&self) -> impl Iterator<Item = &Node<T>> + '_ {
        self.flat.iter().filter_map(|&idx| self.arena.get(idx))
    }

    /// Elements dropped during classification.
    pub fn detached(&self) -> &[Detached] {
        &self.detached
    }

    /// Direct children as stored; empty for leaves and unknown indices.
    #[instrument(level = "trace", skip(self))]
    pub fn children_of(&self, idx: Index) -> Vec<&Node<T>> {
        self.arena
            .get(idx)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&child| self.arena.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every node below `idx` in pre-order, excluding `idx` itself.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants_of(&self, idx: Index) -> Vec<&Node<T>> {
        self.iter_descendants(idx).collect()
    }

    pub fn iter_descendants(&self, idx: Index) -> Descendants<'_, T> {
        Descendants::new(self, idx)
    }

    pub fn parent_of(&self, idx: Index) -> Option<&Node<T>> {
        self.arena
            .get(idx)
            .and_then(|node| node.parent)
            .and_then(|parent| self.arena.get(parent))
    }

    /// Ancestors of `idx` ordered from its root down to its parent.
    pub fn ancestors_of(&self, idx: Index) -> Vec<&Node<T>> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(idx);
        while let Some(node) = current {
            ancestors.push(node);
            current = self.parent_of(node.index);
        }
        ancestors.reverse();
        ancestors
    }

    /// Pre-order walk over all trees, roots in source order.
    pub fn iter_preorder(&self) -> PreOrder<'_, T> {
        PreOrder::new(self)
    }

    /// Number of levels in the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(node_idx, 1)];
        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.arena.get(idx) {
                max_depth = max_depth.max(depth);
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
        max_depth
    }

    /// Leaf nodes in pre-order.
    pub fn leaves(&self) -> Vec<&Node<T>> {
        self.iter_preorder()
            .filter(|node| node.role.is_leaf())
            .collect()
    }
}

impl<T: TreeElement> Forest<T> {
    /// First node in pre-order whose element id equals `id`.
    pub fn find(&self, id: i64) -> Option<&Node<T>> {
        self.iter_preorder().find(|node| node.id() == id)
    }
}

pub struct Descendants<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<Index>,
}

impl<'a, T> Descendants<'a, T> {
    fn new(forest: &'a Forest<T>, idx: Index) -> Self {
        let stack = forest
            .get(idx)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Self { forest, stack }
    }
}

impl<'a, T> Iterator for Descendants<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}

pub struct PreOrder<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<Index>,
}

impl<'a, T> PreOrder<'a, T> {
    fn new(forest: &'a Forest<T>) -> Self {
        Self {
            forest,
            stack: forest.roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get(current_idx) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}
