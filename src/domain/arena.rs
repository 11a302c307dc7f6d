use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::{IdGenerator, ROOT_ID};

/// Persisted payload of a mind-map node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Opaque id, unique within one map
    pub id: String,
    /// Display label, may contain any characters
    pub text: String,
    /// Children hidden from layout when set
    pub folded: bool,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Tree node in the arena-based mind map.
#[derive(Debug)]
pub struct MapNode {
    data: NodeData,
    /// Index of parent node in the arena, None for the root
    parent: Option<Index>,
    /// Indices of child nodes in sibling order
    children: Vec<Index>,
}

impl MapNode {
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn is_folded(&self) -> bool {
        self.data.folded
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena-based mind-map tree with a whole-tree id index.
///
/// Parents own their children through `children`; `parent` is a navigation
/// link only. The root always exists and is never removed, so a `MindMap`
/// is never empty.
#[derive(Debug)]
pub struct MindMap {
    arena: Arena<MapNode>,
    root: Index,
    index: HashMap<String, Index>,
    ids: IdGenerator,
}

impl MindMap {
    /// Fresh single-node map whose root has the well-known id `root`.
    pub fn new(root_text: impl Into<String>) -> Self {
        Self::with_root(ROOT_ID, root_text, false)
    }

    /// Map whose root carries the given id, used when building from documents.
    pub fn with_root(id: impl Into<String>, text: impl Into<String>, folded: bool) -> Self {
        let data = NodeData {
            id: id.into(),
            text: text.into(),
            folded,
        };
        let mut arena = Arena::new();
        let mut index = HashMap::new();
        let key = data.id.clone();
        let root = arena.insert(MapNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        index.insert(key, root);
        Self {
            arena,
            root,
            index,
            ids: IdGenerator::new(),
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&MapNode> {
        self.arena.get(idx)
    }

    /// Like [`MindMap::get`], but a stale index is an error.
    pub fn node(&self, idx: Index) -> DomainResult<&MapNode> {
        self.arena.get(idx).ok_or(DomainError::StaleIndex)
    }

    fn node_mut(&mut self, idx: Index) -> DomainResult<&mut MapNode> {
        self.arena.get_mut(idx).ok_or(DomainError::StaleIndex)
    }

    pub fn lookup(&self, id: &str) -> Option<Index> {
        self.index.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&MapNode> {
        self.lookup(id).and_then(|idx| self.get(idx))
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.get(idx).and_then(|n| n.parent)
    }

    /// Children of `idx` in sibling order; empty for stale indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.get(idx).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn position_in_parent(&self, idx: Index) -> Option<usize> {
        let parent = self.parent(idx)?;
        self.children(parent).iter().position(|&c| c == idx)
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Allocate a detached node with a fresh id and register it in the index.
    ///
    /// The caller attaches it to `parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub fn create_node(&mut self, text: &str, parent: Index) -> Index {
        let id = self.fresh_id();
        self.register(id, text.to_string(), false, parent)
    }

    /// Id not present in this map.
    pub fn fresh_id(&self) -> String {
        loop {
            let id = self.ids.next_id();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn register(&mut self, id: String, text: String, folded: bool, parent: Index) -> Index {
        let key = id.clone();
        let idx = self.arena.insert(MapNode {
            data: NodeData { id, text, folded },
            parent: Some(parent),
            children: Vec::new(),
        });
        self.index.insert(key, idx);
        idx
    }

    /// Append a node with a known id under `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_with_id(
        &mut self,
        id: &str,
        text: &str,
        folded: bool,
        parent: Index,
    ) -> DomainResult<Index> {
        self.node(parent)?;
        if self.index.contains_key(id) {
            return Err(DomainError::DuplicateId(id.to_string()));
        }
        let idx = self.register(id.to_string(), text.to_string(), folded, parent);
        self.node_mut(parent)?.children.push(idx);
        Ok(idx)
    }

    /// Append a new child to `parent` and unfold `parent` so it shows.
    #[instrument(level = "debug", skip(self))]
    pub fn add_child(&mut self, parent: Index, text: &str) -> DomainResult<Index> {
        self.node(parent)?;
        let child = self.create_node(text, parent);
        let parent_node = self.node_mut(parent)?;
        parent_node.children.push(child);
        parent_node.data.folded = false;
        Ok(child)
    }

    /// Insert a new node right after `node` in its parent's children.
    ///
    /// Returns `None` for the root, which cannot have siblings.
    #[instrument(level = "debug", skip(self))]
    pub fn add_sibling(&mut self, node: Index, text: &str) -> DomainResult<Option<Index>> {
        let Some(parent) = self.node(node)?.parent else {
            debug!("add_sibling: root has no siblings");
            return Ok(None);
        };
        let position = self
            .position_in_parent(node)
            .ok_or(DomainError::StaleIndex)?;
        let sibling = self.create_node(text, parent);
        self.node_mut(parent)?.children.insert(position + 1, sibling);
        Ok(Some(sibling))
    }

    /// Remove `node` and its whole subtree from the tree and the id index.
    ///
    /// Returns the number of removed nodes, or `None` for the root.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, node: Index) -> DomainResult<Option<usize>> {
        let Some(parent) = self.node(node)?.parent else {
            debug!("remove_subtree: root is never removed");
            return Ok(None);
        };
        self.node_mut(parent)?.children.retain(|&c| c != node);

        let doomed: Vec<Index> = self.iter_from(node).map(|(idx, _)| idx).collect();
        for idx in &doomed {
            if let Some(removed) = self.arena.remove(*idx) {
                self.index.remove(&removed.data.id);
            }
        }
        Ok(Some(doomed.len()))
    }

    /// Flip `folded` if the node has children.
    ///
    /// Returns whether the flag changed.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_fold(&mut self, node: Index) -> DomainResult<bool> {
        let target = self.node_mut(node)?;
        if target.children.is_empty() {
            debug!("toggle_fold: leaf stays unfolded");
            return Ok(false);
        }
        target.data.folded = !target.data.folded;
        Ok(true)
    }

    pub(crate) fn set_folded(&mut self, node: Index, folded: bool) -> DomainResult<()> {
        self.node_mut(node)?.data.folded = folded;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_text(&mut self, node: Index, text: &str) -> DomainResult<()> {
        self.node_mut(node)?.data.text = text.to_string();
        Ok(())
    }

    /// Pre-order traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(self.root))
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    pub fn iter_from(&self, start: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(start))
    }

    /// Post-order traversal from the root (children before parents).
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels, counting the root as one.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((idx, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(self.children(idx).iter().map(|&c| (c, level + 1)));
        }
        deepest
    }

    /// True when the id index covers exactly the nodes reachable from the root.
    pub fn is_consistent(&self) -> bool {
        let mut reachable = 0;
        for (idx, node) in self.iter() {
            reachable += 1;
            if self.index.get(node.id()) != Some(&idx) {
                return false;
            }
            if node.children.iter().any(|&c| self.parent(c) != Some(idx)) {
                return false;
            }
        }
        reachable == self.index.len() && reachable == self.arena.len()
    }
}

pub struct TreeIterator<'a> {
    map: &'a MindMap,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(map: &'a MindMap, start: Option<Index>) -> Self {
        Self {
            map,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a MapNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.map.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    map: &'a MindMap,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(map: &'a MindMap) -> Self {
        Self {
            map,
            stack: vec![(map.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a MapNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.map.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(map: &MindMap, parent: Index) -> Vec<String> {
        map.children(parent)
            .iter()
            .map(|&c| map.get(c).unwrap().text().to_string())
            .collect()
    }

    #[test]
    fn test_new_map_has_single_root() {
        let map = MindMap::new("New Mindmap");
        let root = map.get(map.root()).unwrap();
        assert_eq!(root.id(), "root");
        assert!(root.is_root());
        assert_eq!(map.node_count(), 1);
        assert_eq!(map.depth(), 1);
        assert!(map.is_consistent());
    }

    #[test]
    fn test_add_sibling_inserts_after_node_not_at_end() {
        let mut map = MindMap::new("r");
        let root = map.root();
        let a = map.add_child(root, "A").unwrap();
        map.add_child(root, "C").unwrap();
        let b = map.add_sibling(a, "B").unwrap().unwrap();
        assert_eq!(texts(&map, root), vec!["A", "B", "C"]);
        assert_eq!(map.position_in_parent(b), Some(1));
    }

    #[test]
    fn test_remove_subtree_drops_descendants_from_index() {
        let mut map = MindMap::new("r");
        let root = map.root();
        let a = map.add_child(root, "A").unwrap();
        let a1 = map.add_child(a, "A1").unwrap();
        map.add_child(a1, "A1x").unwrap();
        let a1_id = map.get(a1).unwrap().id().to_string();

        assert_eq!(map.remove_subtree(a).unwrap(), Some(3));
        assert!(map.lookup(&a1_id).is_none());
        assert_eq!(map.node_count(), 1);
        assert!(map.is_consistent());
    }

    #[test]
    fn test_postorder_visits_children_before_parent() {
        let mut map = MindMap::new("r");
        let root = map.root();
        let a = map.add_child(root, "A").unwrap();
        map.add_child(a, "A1").unwrap();
        map.add_child(root, "B").unwrap();
        let order: Vec<&str> = map.iter_postorder().map(|(_, n)| n.text()).collect();
        assert_eq!(order, vec!["A1", "A", "B", "r"]);
    }

    #[test]
    fn test_depth_of_long_chain_does_not_recurse() {
        let mut map = MindMap::new("r");
        let mut parent = map.root();
        for i in 0..100_000 {
            parent = map
                .insert_with_id(&format!("n{}", i), "x", false, parent)
                .unwrap();
        }
        assert_eq!(map.depth(), 100_001);
    }

    #[test]
    fn test_insert_with_id_rejects_duplicates() {
        let mut map = MindMap::new("r");
        let root = map.root();
        map.insert_with_id("x", "X", false, root).unwrap();
        let err = map.insert_with_id("x", "again", false, root).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateId(id) if id == "x"));
    }
}
