use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Forest, Node, TreeElement};

/// Text of one node in tree output: `label [id]`.
pub fn node_text<T: TreeElement>(node: &Node<T>) -> String {
    format!("{} [{}]", node.label(), node.id())
}

pub trait TreeNodeConvert<T> {
    /// One display tree per root, roots in source order.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;

    /// Like [`to_tree_strings`](Self::to_tree_strings) with custom node text.
    fn to_tree_strings_with<F>(&self, text: F) -> Vec<Tree<String>>
    where
        F: Fn(&Node<T>) -> String;

    /// Display tree rooted at `idx`, None for an unknown index.
    fn subtree_string(&self, idx: Index) -> Option<Tree<String>>;
}

impl<T: TreeElement> TreeNodeConvert<T> for Forest<T> {
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        self.to_tree_strings_with(node_text)
    }

    #[instrument(level = "debug", skip(self, text))]
    fn to_tree_strings_with<F>(&self, text: F) -> Vec<Tree<String>>
    where
        F: Fn(&Node<T>) -> String,
    {
        self.root_indices()
            .iter()
            .filter_map(|&root| build_subtree(self, root, &text))
            .collect()
    }

    fn subtree_string(&self, idx: Index) -> Option<Tree<String>> {
        build_subtree(self, idx, &node_text)
    }
}

fn build_subtree<T, F>(forest: &Forest<T>, idx: Index, text: &F) -> Option<Tree<String>>
where
    T: TreeElement,
    F: Fn(&Node<T>) -> String,
{
    fn build_tree<T, F>(forest: &Forest<T>, node_idx: Index, parent_tree: &mut Tree<String>, text: &F)
    where
        T: TreeElement,
        F: Fn(&Node<T>) -> String,
    {
        for child in forest.children_of(node_idx) {
            let mut child_tree = Tree::new(text(child));
            build_tree(forest, child.index, &mut child_tree, text);
            parent_tree.push(child_tree);
        }
    }

    let node = forest.get(idx)?;
    let mut tree = Tree::new(text(node));
    build_tree(forest, idx, &mut tree, text);
    Some(tree)
}
