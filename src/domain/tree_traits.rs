use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::MindMap;

const FOLD_MARKER: &str = "[+]";

pub trait MapTreeConvert {
    /// Render as a terminal tree; folded subtrees are collapsed unless `expand_all`.
    fn to_tree_string(&self, expand_all: bool) -> Tree<String>;
}

impl MapTreeConvert for MindMap {
    /// Built bottom-up from the post-order walk, so deep maps need no recursion.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, expand_all: bool) -> Tree<String> {
        let mut built: HashMap<Index, Tree<String>> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let collapsed = node.is_folded() && node.has_children();
            let label = if collapsed {
                format!("{} ({}) {}", node.text(), node.id(), FOLD_MARKER)
            } else {
                format!("{} ({})", node.text(), node.id())
            };
            let mut tree = Tree::new(label);
            for child in node.children() {
                if let Some(subtree) = built.remove(child) {
                    if !collapsed || expand_all {
                        tree.push(subtree);
                    }
                }
            }
            built.insert(idx, tree);
        }
        built
            .remove(&self.root())
            .unwrap_or_else(|| Tree::new(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folded_subtree_is_collapsed() {
        let mut map = MindMap::new("R");
        let root = map.root();
        let x = map.insert_with_id("x", "X", false, root).unwrap();
        map.insert_with_id("y", "Y", false, x).unwrap();
        map.toggle_fold(x).unwrap();

        let collapsed = map.to_tree_string(false).to_string();
        assert!(collapsed.contains("X (x) [+]"));
        assert!(!collapsed.contains("Y (y)"));

        let expanded = map.to_tree_string(true).to_string();
        assert!(expanded.contains("Y (y)"));
    }
}
