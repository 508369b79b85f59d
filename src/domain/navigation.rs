//! Drill-down navigation state over a classified forest.
//!
//! Holds the "current node" a bubble view is showing, the tap mode, and the
//! last selection. Rendering is left to the caller.

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{Forest, Node};
use crate::domain::entities::TreeElement;

/// How a tap on a non-leaf node is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Roots and internal nodes are entered, leaves are selected.
    #[default]
    Navigation,
    /// Every tapped node is selected.
    Selection,
}

/// Outcome of [`Navigator::tap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    Entered(Index),
    Selected(Index),
    /// Index does not belong to the forest.
    Ignored,
}

#[derive(Debug)]
pub struct Navigator<'a, T> {
    forest: &'a Forest<T>,
    current: Option<Index>,
    mode: Mode,
    selected: Option<Index>,
}

impl<'a, T: TreeElement> Navigator<'a, T> {
    pub fn new(forest: &'a Forest<T>) -> Self {
        Self {
            forest,
            current: None,
            mode: Mode::default(),
            selected: None,
        }
    }

    /// None while at top level.
    pub fn current(&self) -> Option<&'a Node<T>> {
        self.current.and_then(|idx| self.forest.get(idx))
    }

    pub fn selected(&self) -> Option<&'a Node<T>> {
        self.selected.and_then(|idx| self.forest.get(idx))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = match self.mode {
            Mode::Navigation => Mode::Selection,
            Mode::Selection => Mode::Navigation,
        };
        self.mode
    }

    /// Back to top level; keeps the selection.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Bubbles shown without a search: roots at top level, otherwise the
    /// children of the current node. Sorted by label.
    pub fn visible(&self) -> Vec<&'a Node<T>> {
        let nodes = match self.current {
            None => self.forest.roots().collect::<Vec<_>>(),
            Some(idx) => self.forest.children_of(idx),
        };
        sort_by_label(nodes)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn tap(&mut self, idx: Index) -> Tap {
        let Some(node) = self.forest.get(idx) else {
            return Tap::Ignored;
        };
        if node.role.is_leaf() || self.mode == Mode::Selection {
            self.selected = Some(idx);
            debug!(id = node.id(), "selected");
            Tap::Selected(idx)
        } else {
            self.current = Some(idx);
            debug!(id = node.id(), "entered");
            Tap::Entered(idx)
        }
    }

    /// Moves to the parent of the current node and returns it.
    ///
    /// Leaving a root returns to top level (None). No-op at top level.
    pub fn go_up(&mut self) -> Option<&'a Node<T>> {
        let current = self.current?;
        self.current = self.forest.parent_of(current).map(|parent| parent.index);
        self.current()
    }

    /// Path from the root down to the current node, inclusive.
    pub fn breadcrumbs(&self) -> Vec<&'a Node<T>> {
        match self.current() {
            None => Vec::new(),
            Some(node) => {
                let mut path = self.forest.ancestors_of(node.index);
                path.push(node);
                path
            }
        }
    }

    /// Case-insensitive label search scoped to the current position.
    ///
    /// At top level the whole flat list is searched, inside a node only its
    /// descendants. The first `limit` matches are returned in reverse order.
    /// An empty query lists the unfiltered scope sorted by label instead.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, query: &str, limit: usize) -> Vec<&'a Node<T>> {
        let needle = query.to_uppercase();
        match (self.current, needle.is_empty()) {
            (None, true) => self.visible(),
            (Some(idx), true) => sort_by_label(
                self.forest
                    .iter_descendants(idx)
                    .take(limit)
                    .collect(),
            ),
            (scope, false) => {
                let candidates: Box<dyn Iterator<Item = &'a Node<T>> + 'a> = match scope {
                    None => Box::new(self.forest.iter()),
                    Some(idx) => Box::new(self.forest.iter_descendants(idx)),
                };
                let mut hits: Vec<&'a Node<T>> = candidates
                    .filter(|node| node.label().to_uppercase().contains(&needle))
                    .take(limit)
                    .collect();
                hits.reverse();
                hits
            }
        }
    }

    /// Search box hint for the current position.
    pub fn placeholder(&self, on_root: &str, within: &str) -> String {
        match self.current() {
            None => on_root.to_string(),
            Some(node) => format!("{}{}", within, node.label()),
        }
    }
}

fn sort_by_label<T: TreeElement>(nodes: Vec<&Node<T>>) -> Vec<&Node<T>> {
    nodes.into_iter().sorted_by(|a, b| a.label().cmp(b.label())).collect()
}
