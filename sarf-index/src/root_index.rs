//! AVL-balanced ordered index of Arabic roots.
//!
//! Every node owns the derived words recorded for its root. Rotations keep
//! the tree height logarithmic in the number of roots, and the in-order walk
//! yields roots in the order defined by the index's [`RootOrder`].

use crate::{CodePointOrder, DerivedWord, DerivedWords, RootOrder, RootRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RootIndexError {
    #[error("root '{0}' already exists")]
    AlreadyExists(String),

    #[error("root '{0}' not found")]
    NotFound(String),

    #[error("root '{0}' must be exactly 3 characters")]
    InvalidLength(String),

    #[error("new root '{0}' is the same as the old root")]
    Unchanged(String),
}

type Link = Option<Box<AvlNode>>;

#[derive(Debug, Clone)]
pub struct AvlNode {
    root: String,
    height: usize,
    left: Link,
    right: Link,
    derived_words: DerivedWords,
}

impl AvlNode {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            height: 1,
            left: None,
            right: None,
            derived_words: DerivedWords::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Height of the subtree rooted here; a leaf has height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn left(&self) -> Option<&AvlNode> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&AvlNode> {
        self.right.as_deref()
    }

    pub fn derived_words(&self) -> &DerivedWords {
        &self.derived_words
    }

    /// Frequency of `word` for this root, 0 when it was never recorded.
    pub fn frequency(&self, word: &str) -> u64 {
        self.derived_words
            .get(word)
            .map_or(0, |entry| entry.frequency)
    }

    pub fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }

    fn add_derived_word(&mut self, word: &str, template: &str) {
        self.derived_words
            .entry(word.to_string())
            .and_modify(|entry| entry.frequency += 1)
            .or_insert_with(|| DerivedWord::new(template));
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }
}

fn height(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.height)
}

/// Promotes the left child.
fn rotate_right(mut node: Box<AvlNode>) -> Box<AvlNode> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

/// Promotes the right child.
fn rotate_left(mut node: Box<AvlNode>) -> Box<AvlNode> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restores the AVL property at `node`, assuming both subtrees already hold it.
///
/// The child's own balance factor picks between a single and a double
/// rotation. After an insertion the heavy child is never perfectly balanced,
/// so this covers the insertion cases as well as the deletion ones.
fn rebalance(mut node: Box<AvlNode>) -> Box<AvlNode> {
    node.update_height();
    let balance = node.balance_factor();

    let node = if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        rotate_right(node)
    } else if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        rotate_left(node)
    } else {
        node
    };

    debug_assert!(
        node.balance_factor().abs() <= 1,
        "root '{}' left unbalanced after rebalance",
        node.root
    );
    node
}

fn insert_node<O: RootOrder>(
    order: &O,
    link: Link,
    root: &str,
    inserted: &mut bool,
) -> Box<AvlNode> {
    let Some(mut node) = link else {
        *inserted = true;
        return Box::new(AvlNode::new(root));
    };

    match order.compare(root, &node.root) {
        Ordering::Less => node.left = Some(insert_node(order, node.left.take(), root, inserted)),
        Ordering::Greater => {
            node.right = Some(insert_node(order, node.right.take(), root, inserted))
        }
        Ordering::Equal => return node,
    }

    rebalance(node)
}

fn delete_node<O: RootOrder>(
    order: &O,
    link: Link,
    root: &str,
    removed: &mut Option<DerivedWords>,
) -> Link {
    let mut node = link?;

    match order.compare(root, &node.root) {
        Ordering::Less => node.left = delete_node(order, node.left.take(), root, removed),
        Ordering::Greater => node.right = delete_node(order, node.right.take(), root, removed),
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, child) | (child, None) => {
                *removed = Some(std::mem::take(&mut node.derived_words));
                return child;
            }
            (Some(left), Some(right)) => {
                // The in-order successor moves up together with its words.
                let (rest, successor) = detach_min(right);
                let AvlNode {
                    root: successor_root,
                    derived_words,
                    ..
                } = *successor;
                node.root = successor_root;
                *removed = Some(std::mem::replace(&mut node.derived_words, derived_words));
                node.left = Some(left);
                node.right = rest;
            }
        },
    }

    Some(rebalance(node))
}

/// Splits off the minimum node of a subtree, rebalancing every ancestor on
/// the way back up.
fn detach_min(mut node: Box<AvlNode>) -> (Link, Box<AvlNode>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = detach_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

/// Ordered set of roots backed by an AVL tree.
#[derive(Debug, Clone)]
pub struct RootIndex<O: RootOrder = CodePointOrder> {
    root: Link,
    size: usize,
    order: O,
}

impl Default for RootIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl RootIndex {
    pub fn new() -> Self {
        Self::with_order(CodePointOrder)
    }
}

impl<O: RootOrder> RootIndex<O> {
    pub fn with_order(order: O) -> Self {
        Self {
            root: None,
            size: 0,
            order,
        }
    }

    pub fn insert(&mut self, root: &str) -> Result<(), RootIndexError> {
        let mut inserted = false;
        let tree = self.root.take();
        self.root = Some(insert_node(&self.order, tree, root, &mut inserted));
        if inserted {
            self.size += 1;
            Ok(())
        } else {
            Err(RootIndexError::AlreadyExists(root.to_string()))
        }
    }

    pub fn search(&self, root: &str) -> bool {
        self.get_node(root).is_some()
    }

    pub fn get_node(&self, root: &str) -> Option<&AvlNode> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match self.order.compare(root, &node.root) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        None
    }

    fn get_node_mut(&mut self, root: &str) -> Option<&mut AvlNode> {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            cursor = match self.order.compare(root, &node.root) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
            };
        }
        None
    }

    /// Removes `root` and hands back the derived words it owned.
    pub fn delete(&mut self, root: &str) -> Result<DerivedWords, RootIndexError> {
        let mut removed = None;
        let tree = self.root.take();
        self.root = delete_node(&self.order, tree, root, &mut removed);
        match removed {
            Some(words) => {
                self.size -= 1;
                Ok(words)
            }
            None => Err(RootIndexError::NotFound(root.to_string())),
        }
    }

    /// Renames `old_root` to `new_root`, carrying its derived words over.
    pub fn update(&mut self, old_root: &str, new_root: &str) -> Result<(), RootIndexError> {
        if new_root.chars().count() != 3 {
            return Err(RootIndexError::InvalidLength(new_root.to_string()));
        }
        if !self.search(old_root) {
            return Err(RootIndexError::NotFound(old_root.to_string()));
        }
        if old_root != new_root && self.search(new_root) {
            return Err(RootIndexError::AlreadyExists(new_root.to_string()));
        }
        if old_root == new_root {
            return Err(RootIndexError::Unchanged(new_root.to_string()));
        }

        let words = self.delete(old_root)?;
        self.insert(new_root)?;
        if let Some(node) = self.get_node_mut(new_root) {
            node.derived_words = words;
        }
        Ok(())
    }

    /// Records `word` under `root`, bumping its frequency when already known.
    pub fn add_derived_word(
        &mut self,
        root: &str,
        word: &str,
        template: &str,
    ) -> Result<(), RootIndexError> {
        let node = self
            .get_node_mut(root)
            .ok_or_else(|| RootIndexError::NotFound(root.to_string()))?;
        node.add_derived_word(word, template);
        Ok(())
    }

    pub fn get_derived_words(&self, root: &str) -> Option<&DerivedWords> {
        self.get_node(root).map(AvlNode::derived_words)
    }

    /// Bulk-load entry point: inserts `root` when missing and replaces its
    /// derived words. Returns whether the root was newly inserted.
    pub fn restore(&mut self, root: &str, derived_words: DerivedWords) -> bool {
        let inserted = self.insert(root).is_ok();
        if let Some(node) = self.get_node_mut(root) {
            node.derived_words = derived_words;
        }
        inserted
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_deref())
    }

    pub fn in_order(&self) -> Vec<String> {
        self.iter().map(|node| node.root.clone()).collect()
    }

    pub fn dump_with_words(&self) -> Vec<RootRecord> {
        self.iter()
            .map(|node| RootRecord {
                root: node.root.clone(),
                derived_words: node.derived_words.clone(),
            })
            .collect()
    }

    pub fn root_node(&self) -> Option<&AvlNode> {
        self.root.as_deref()
    }

    pub fn structure(&self) -> Option<TreeNodeView> {
        self.root_node().map(TreeNodeView::from)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Tree height, 0 for an empty index.
    pub fn height(&self) -> usize {
        height(&self.root)
    }
}

impl<'a, O: RootOrder> IntoIterator for &'a RootIndex<O> {
    type Item = &'a AvlNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the nodes of a [`RootIndex`].
pub struct Iter<'a> {
    stack: Vec<&'a AvlNode>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a AvlNode>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut cursor: Option<&'a AvlNode>) {
        while let Some(node) = cursor {
            self.stack.push(node);
            cursor = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a AvlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(node)
    }
}

/// Serializable snapshot of the tree shape for visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNodeView {
    pub root: String,
    pub height: usize,
    pub balance: isize,
    pub word_count: usize,
    pub left: Option<Box<TreeNodeView>>,
    pub right: Option<Box<TreeNodeView>>,
}

impl From<&AvlNode> for TreeNodeView {
    fn from(node: &AvlNode) -> Self {
        Self {
            root: node.root.clone(),
            height: node.height,
            balance: node.balance_factor(),
            word_count: node.derived_words.len(),
            left: node.left().map(|child| Box::new(Self::from(child))),
            right: node.right().map(|child| Box::new(Self::from(child))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_avl(node: Option<&AvlNode>) -> usize {
        let Some(node) = node else {
            return 0;
        };
        let left = assert_avl(node.left());
        let right = assert_avl(node.right());
        assert!(
            (left as isize - right as isize).abs() <= 1,
            "unbalanced at {}",
            node.root()
        );
        assert_eq!(node.height(), 1 + left.max(right));
        node.height()
    }

    fn index_of(roots: &[&str]) -> RootIndex {
        let mut index = RootIndex::new();
        for root in roots {
            index.insert(root).unwrap();
        }
        index
    }

    #[test]
    fn insert_then_search() {
        let mut index = RootIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.height(), 0);

        index.insert("كتب").unwrap();
        assert!(index.search("كتب"));
        assert!(!index.search("علم"));
        assert_eq!(index.size(), 1);
        assert_eq!(index.height(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut index = index_of(&["كتب"]);
        let err = index.insert("كتب").unwrap_err();
        assert_eq!(err, RootIndexError::AlreadyExists("كتب".into()));
        assert_eq!(err.to_string(), "root 'كتب' already exists");
        assert_eq!(index.size(), 1);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let roots = ["a", "b", "c", "d", "e", "f", "g"];
        let index = index_of(&roots);
        assert_eq!(index.height(), 3);
        assert_eq!(index.root_node().unwrap().root(), "d");
        assert_avl(index.root_node());
    }

    #[test]
    fn double_rotations() {
        // left-right
        let index = index_of(&["c", "a", "b"]);
        assert_eq!(index.root_node().unwrap().root(), "b");
        assert_avl(index.root_node());

        // right-left
        let index = index_of(&["a", "c", "b"]);
        assert_eq!(index.root_node().unwrap().root(), "b");
        assert_avl(index.root_node());
    }

    #[test]
    fn in_order_is_sorted_by_code_point() {
        let index = index_of(&["علم", "كتب", "درس", "فهم", "سمع"]);
        let roots = index.in_order();
        assert_eq!(roots, vec!["درس", "سمع", "علم", "فهم", "كتب"]);
    }

    #[test]
    fn delete_leaf_single_child_and_two_children() {
        let mut index = index_of(&["d", "b", "f", "a", "c", "e", "g", "h"]);

        index.delete("a").unwrap();
        assert_avl(index.root_node());
        assert!(!index.search("a"));

        // "g" has a single right child "h"
        index.delete("g").unwrap();
        assert_avl(index.root_node());
        assert_eq!(index.in_order(), vec!["b", "c", "d", "e", "f", "h"]);

        // root "d" has two children
        index.delete("d").unwrap();
        assert_avl(index.root_node());
        assert_eq!(index.in_order(), vec!["b", "c", "e", "f", "h"]);
        assert_eq!(index.size(), 5);
    }

    #[test]
    fn delete_missing_root_fails() {
        let mut index = index_of(&["كتب"]);
        assert_eq!(
            index.delete("علم"),
            Err(RootIndexError::NotFound("علم".into()))
        );
        assert_eq!(index.size(), 1);
    }

    #[test]
    fn delete_two_children_moves_successor_words() {
        let mut index = index_of(&["b", "a", "c"]);
        index.add_derived_word("c", "cword", "t1").unwrap();
        index.add_derived_word("b", "bword", "t2").unwrap();

        let removed = index.delete("b").unwrap();
        assert!(removed.contains_key("bword"));

        let node = index.root_node().unwrap();
        assert_eq!(node.root(), "c");
        assert_eq!(node.frequency("cword"), 1);
        assert!(!node.derived_words().contains_key("bword"));
    }

    #[test]
    fn deletion_rebalances_every_ancestor() {
        let mut index = RootIndex::new();
        for i in 0..64u32 {
            index.insert(&format!("{i:03}")).unwrap();
        }
        for i in (0..64u32).step_by(3) {
            index.delete(&format!("{i:03}")).unwrap();
            assert_avl(index.root_node());
        }
        assert_eq!(index.size(), 64 - 22);
    }

    #[test]
    fn add_derived_word_tracks_frequency() {
        let mut index = index_of(&["كتب"]);
        index.add_derived_word("كتب", "كاتب", "فَاعِل").unwrap();
        index.add_derived_word("كتب", "كاتب", "فَاعِل").unwrap();

        let words = index.get_derived_words("كتب").unwrap();
        assert_eq!(words["كاتب"].frequency, 2);
        assert_eq!(words["كاتب"].template, "فَاعِل");

        assert!(index.add_derived_word("علم", "عالم", "فَاعِل").is_err());
        assert!(index.get_derived_words("علم").is_none());
    }

    #[test]
    fn update_carries_derived_words() {
        let mut index = index_of(&["كتب", "درس", "علم"]);
        index.add_derived_word("كتب", "كاتب", "فَاعِل").unwrap();
        let before = index.get_derived_words("كتب").unwrap().clone();

        index.update("كتب", "قرأ").unwrap();
        assert!(!index.search("كتب"));
        assert_eq!(index.get_derived_words("قرأ"), Some(&before));
        assert_eq!(index.size(), 3);
        assert_avl(index.root_node());
    }

    #[test]
    fn update_failures() {
        let mut index = index_of(&["كتب", "علم"]);
        assert_eq!(
            index.update("كتب", "كتبة"),
            Err(RootIndexError::InvalidLength("كتبة".into()))
        );
        assert_eq!(
            index.update("درس", "فهم"),
            Err(RootIndexError::NotFound("درس".into()))
        );
        assert_eq!(
            index.update("كتب", "علم"),
            Err(RootIndexError::AlreadyExists("علم".into()))
        );
        assert_eq!(
            index.update("كتب", "كتب"),
            Err(RootIndexError::Unchanged("كتب".into()))
        );
        assert_eq!(index.in_order(), vec!["علم", "كتب"]);
    }

    #[test]
    fn restore_replaces_words() {
        let mut index = RootIndex::new();
        let mut words = DerivedWords::new();
        words.insert(
            "كاتب".into(),
            DerivedWord {
                template: "فَاعِل".into(),
                frequency: 4,
            },
        );
        assert!(index.restore("كتب", words.clone()));
        assert!(!index.restore("كتب", words));
        assert_eq!(index.size(), 1);
        assert_eq!(index.get_node("كتب").unwrap().frequency("كاتب"), 4);
    }

    #[test]
    fn dump_with_words_is_ordered() {
        let mut index = index_of(&["c", "a", "b"]);
        index.add_derived_word("a", "x", "t").unwrap();
        let dump = index.dump_with_words();
        let roots: Vec<_> = dump.iter().map(|record| record.root.as_str()).collect();
        assert_eq!(roots, vec!["a", "b", "c"]);
        assert_eq!(dump[0].derived_words["x"].frequency, 1);
    }

    #[test]
    fn custom_order_reverses_traversal() {
        #[derive(Debug)]
        struct Descending;

        impl RootOrder for Descending {
            fn compare(&self, a: &str, b: &str) -> Ordering {
                b.cmp(a)
            }
        }

        let mut index = RootIndex::with_order(Descending);
        for root in ["a", "c", "b"] {
            index.insert(root).unwrap();
        }
        assert_eq!(index.in_order(), vec!["c", "b", "a"]);
        assert!(index.search("b"));
    }

    #[test]
    fn structure_mirrors_tree() {
        let index = index_of(&["b", "a", "c"]);
        let view = index.structure().unwrap();
        assert_eq!(view.root, "b");
        assert_eq!(view.height, 2);
        assert_eq!(view.balance, 0);
        assert_eq!(view.left.as_ref().unwrap().root, "a");
        assert_eq!(view.right.as_ref().unwrap().root, "c");
        assert!(RootIndex::new().structure().is_none());
    }
}
