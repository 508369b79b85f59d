//! Classifier turning a flat, parent-linked element list into a [`Forest`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::arena::{DetachReason, Detached, Forest, Node};
use crate::domain::entities::TreeElement;
use crate::domain::error::{DomainError, DomainResult};

/// What to do with elements whose parent chain never reaches a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Drop silently.
    Ignore,
    /// Drop and log a warning.
    #[default]
    Warn,
    /// Fail the classification.
    Reject,
}

/// Ordering applied to the flat list after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForestOrder {
    #[default]
    Construction,
    Label,
    LabelDesc,
    Id,
    IdDesc,
}

impl fmt::Display for ForestOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForestOrder::Construction => "construction",
            ForestOrder::Label => "label",
            ForestOrder::LabelDesc => "label-desc",
            ForestOrder::Id => "id",
            ForestOrder::IdDesc => "id-desc",
        };
        f.write_str(name)
    }
}

enum Frame {
    Enter { pos: usize, parent: Index },
    Exit(Index),
}

/// Builds forests from element lists.
#[derive(Debug, Clone, Default)]
pub struct TreeClassifier {
    policy: UnresolvedPolicy,
    order: ForestOrder,
}

impl TreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_order(mut self, order: ForestOrder) -> Self {
        self.order = order;
        self
    }

    pub fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    pub fn order(&self) -> ForestOrder {
        self.order
    }

    /// Classify `items` and apply the configured [`ForestOrder`].
    ///
    /// With [`ForestOrder::Construction`] the flat list holds each root
    /// followed by its subtree, where every non-root node comes after its own
    /// descendants.
    #[instrument(level = "debug", skip(self, items))]
    pub fn classify<T, I>(&self, items: I) -> DomainResult<Forest<T>>
    where
        T: TreeElement,
        I: IntoIterator<Item = T>,
    {
        let mut forest = self.build(items)?;
        match self.order {
            ForestOrder::Construction => {}
            ForestOrder::Label => forest.sort_flat_by(|n| n.label().to_owned(), false),
            ForestOrder::LabelDesc => forest.sort_flat_by(|n| n.label().to_owned(), true),
            ForestOrder::Id => forest.sort_flat_by(Node::id, false),
            ForestOrder::IdDesc => forest.sort_flat_by(Node::id, true),
        }
        Ok(forest)
    }

    /// Classify `items` and stably sort the flat list by `key`.
    ///
    /// Overrides the configured order. Child lists keep source order.
    #[instrument(level = "debug", skip(self, items, key))]
    pub fn classify_by<T, I, K, F>(&self, items: I, key: F, descending: bool) -> DomainResult<Forest<T>>
    where
        T: TreeElement,
        I: IntoIterator<Item = T>,
        K: Ord,
        F: Fn(&Node<T>) -> K,
    {
        let mut forest = self.build(items)?;
        forest.sort_flat_by(key, descending);
        Ok(forest)
    }

    fn build<T, I>(&self, items: I) -> DomainResult<Forest<T>>
    where
        T: TreeElement,
        I: IntoIterator<Item = T>,
    {
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        let ids: Vec<i64> = slots.iter().flatten().map(|e| e.element_id()).collect();
        let parents: Vec<Option<i64>> = slots.iter().flatten().map(|e| e.parent_id()).collect();

        let mut first_pos: HashMap<i64, usize> = HashMap::with_capacity(ids.len());
        for (pos, &id) in ids.iter().enumerate() {
            first_pos.entry(id).or_insert(pos);
        }

        // Pending children per parent id, in source order. The first node built
        // with a given id claims all of them, so unreachable duplicates never do.
        let mut pending: HashMap<i64, Vec<usize>> = HashMap::new();
        for (pos, &parent) in parents.iter().enumerate() {
            if let Some(parent_id) = parent {
                pending.entry(parent_id).or_default().push(pos);
            }
        }

        let mut forest = Forest::with_capacity(ids.len());
        let root_positions: Vec<usize> = (0..ids.len()).filter(|&pos| parents[pos].is_none()).collect();

        for root_pos in root_positions {
            let data = take_slot(&mut slots, root_pos, &ids)?;
            let root_idx = forest.insert_node(data, None);
            forest.push_flat(root_idx);

            let mut stack: Vec<Frame> = claim_children(&mut pending, ids[root_pos])
                .into_iter()
                .rev()
                .map(|pos| Frame::Enter { pos, parent: root_idx })
                .collect();

            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter { pos, parent } => {
                        let data = take_slot(&mut slots, pos, &ids)?;
                        let node_idx = forest.insert_node(data, Some(parent));
                        stack.push(Frame::Exit(node_idx));
                        stack.extend(
                            claim_children(&mut pending, ids[pos])
                                .into_iter()
                                .rev()
                                .map(|child| Frame::Enter { pos: child, parent: node_idx }),
                        );
                    }
                    Frame::Exit(node_idx) => forest.push_flat(node_idx),
                }
            }
        }

        let detached: Vec<Detached> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .filter_map(|(pos, _)| {
                parents[pos].map(|parent_id| Detached {
                    id: ids[pos],
                    parent_id,
                    reason: detach_reason(pos, &parents, &first_pos),
                })
            })
            .collect();

        self.report(&mut forest, detached)?;

        debug!(
            nodes = forest.len(),
            roots = forest.root_indices().len(),
            detached = forest.detached().len(),
            "classified"
        );
        Ok(forest)
    }

    fn report<T>(&self, forest: &mut Forest<T>, detached: Vec<Detached>) -> DomainResult<()> {
        if self.policy == UnresolvedPolicy::Reject {
            // Detached ancestors always have a root cause elsewhere in the list
            let cause = detached.iter().find_map(|d| match d.reason {
                DetachReason::MissingParent => Some(DomainError::UnresolvedParent {
                    id: d.id,
                    parent_id: d.parent_id,
                }),
                DetachReason::Cycle => Some(DomainError::CycleDetected(d.id)),
                DetachReason::DetachedAncestor => None,
            });
            if let Some(err) = cause {
                return Err(err);
            }
        }

        for d in detached {
            if self.policy == UnresolvedPolicy::Warn {
                warn!(id = d.id, parent_id = d.parent_id, "dropping element: {}", d.reason);
            }
            forest.record_detached(d);
        }
        Ok(())
    }
}

fn claim_children(pending: &mut HashMap<i64, Vec<usize>>, id: i64) -> Vec<usize> {
    pending.remove(&id).unwrap_or_default()
}

fn take_slot<T>(slots: &mut [Option<T>], pos: usize, ids: &[i64]) -> DomainResult<T> {
    slots[pos].take().ok_or(DomainError::CycleDetected(ids[pos]))
}

/// Walks the parent chain of an element that was never reached from a root.
///
/// No element carrying the parent id was built, otherwise it would have
/// claimed this one, so following the first of them is enough.
fn detach_reason(pos: usize, parents: &[Option<i64>], first_pos: &HashMap<i64, usize>) -> DetachReason {
    let mut seen = HashSet::from([pos]);
    let mut current = pos;
    loop {
        let Some(parent_id) = parents[current] else {
            // Unreachable for detached elements: their chain never hits a root
            return DetachReason::DetachedAncestor;
        };
        match first_pos.get(&parent_id) {
            None if current == pos => return DetachReason::MissingParent,
            None => return DetachReason::DetachedAncestor,
            Some(&parent_pos) if !seen.insert(parent_pos) => {
                return if parent_pos == pos {
                    DetachReason::Cycle
                } else {
                    DetachReason::DetachedAncestor
                };
            }
            Some(&parent_pos) => current = parent_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::BubbleItem;

    fn ids<T: TreeElement>(nodes: &[&Node<T>]) -> Vec<i64> {
        nodes.iter().map(|n| n.id()).collect()
    }

    #[test]
    fn given_branching_tree_when_classifying_then_flat_list_is_root_then_postorder() {
        let items = vec![
            BubbleItem::root(1, "R"),
            BubbleItem::child(2, 1, "A"),
            BubbleItem::child(3, 2, "A1"),
            BubbleItem::child(4, 2, "A2"),
            BubbleItem::child(5, 1, "B"),
            BubbleItem::root(6, "S"),
        ];

        let forest = TreeClassifier::new().classify(items).unwrap();

        let flat: Vec<i64> = forest.iter().map(|n| n.id()).collect();
        assert_eq!(flat, vec![1, 3, 4, 2, 5, 6]);
    }

    #[test]
    fn given_self_parent_when_classifying_then_reported_as_cycle() {
        let items = vec![BubbleItem::root(1, "R"), BubbleItem::child(2, 2, "Loop")];

        let forest = TreeClassifier::new()
            .with_policy(UnresolvedPolicy::Ignore)
            .classify(items)
            .unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest.detached()[0].reason, DetachReason::Cycle);
    }

    #[test]
    fn given_hanger_on_cycle_when_classifying_then_reported_as_detached_ancestor() {
        let items = vec![
            BubbleItem::child(1, 2, "A"),
            BubbleItem::child(2, 1, "B"),
            BubbleItem::child(3, 1, "Hanger"),
        ];

        let forest = TreeClassifier::new().classify(items).unwrap();

        let reasons: Vec<DetachReason> = forest.detached().iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![DetachReason::Cycle, DetachReason::Cycle, DetachReason::DetachedAncestor]
        );
    }

    #[test]
    fn given_unreachable_duplicate_first_when_classifying_then_child_attaches_to_built_duplicate() {
        let items = vec![
            BubbleItem::child(1, 99, "Ghost"),
            BubbleItem::root(1, "R"),
            BubbleItem::child(2, 1, "C"),
        ];

        let forest = TreeClassifier::new().classify(items).unwrap();

        let flat: Vec<i64> = forest.iter().map(|n| n.id()).collect();
        assert_eq!(flat, vec![1, 2]);
        assert_eq!(forest.detached().len(), 1);
        assert_eq!(forest.detached()[0].reason, DetachReason::MissingParent);
    }

    #[test]
    fn given_id_order_when_classifying_then_flat_list_sorted_by_id() {
        let items = vec![
            BubbleItem::root(5, "e"),
            BubbleItem::child(3, 5, "c"),
            BubbleItem::root(1, "a"),
        ];

        let forest = TreeClassifier::new()
            .with_order(ForestOrder::IdDesc)
            .classify(items)
            .unwrap();

        let flat: Vec<i64> = forest.iter().map(|n| n.id()).collect();
        assert_eq!(flat, vec![5, 3, 1]);
        let root = forest.find(5).unwrap();
        assert_eq!(ids(&forest.children_of(root.index)), vec![3]);
    }
}
