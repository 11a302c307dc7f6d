//! Map builder: parses the primary document into a tree and merges sidecar
//! view state by node id.

use std::collections::HashMap;

use generational_arena::Index;
use roxmltree::{Document, Node};
use tracing::{debug, instrument, warn};

use crate::domain::arena::MindMap;
use crate::domain::error::{DocumentKind, DomainError, DomainResult};
use crate::domain::ids::IdGenerator;

const MAP_TAG: &str = "map";
const NODE_TAG: &str = "node";
const ATTR_ID: &str = "ID";
const ATTR_TEXT: &str = "TEXT";
const ATTR_FOLDED: &str = "FOLDED";

/// Constructs a [`MindMap`] from a primary document and an optional sidecar.
#[derive(Debug, Default, Clone)]
pub struct MapBuilder {
    require_ids: bool,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat nodes without an id, or with a repeated id, as parse failures
    /// instead of assigning fresh ids.
    pub fn require_ids(mut self, require: bool) -> Self {
        self.require_ids = require;
        self
    }

    /// Parse the primary document and, if given, merge fold state from the sidecar.
    #[instrument(level = "debug", skip_all, fields(has_sidecar = sidecar.is_some()))]
    pub fn build(&self, primary: &str, sidecar: Option<&str>) -> DomainResult<MindMap> {
        let mut map = self.parse_primary(primary)?;
        if let Some(sidecar) = sidecar {
            self.apply_sidecar(&mut map, sidecar);
        }
        Ok(map)
    }

    /// Build the tree from the primary document.
    #[instrument(level = "debug", skip_all)]
    pub fn parse_primary(&self, primary: &str) -> DomainResult<MindMap> {
        let doc = parse_xml(primary, DocumentKind::Primary)?;
        let root_el = map_root_node(&doc).ok_or(DomainError::MissingRoot {
            document: DocumentKind::Primary,
        })?;

        let root_id = match non_empty_id(root_el) {
            Some(id) => id.to_string(),
            None => self.fallback_id(root_el, IdGenerator::new().next_id())?,
        };
        let mut map = MindMap::with_root(root_id, node_text(root_el), is_folded(root_el));

        let mut stack: Vec<(Node, Index)> = child_nodes(root_el)
            .rev()
            .map(|el| (el, map.root()))
            .collect();

        while let Some((el, parent_idx)) = stack.pop() {
            let id = self.resolve_id(&map, el)?;
            let idx = map.insert_with_id(&id, node_text(el), is_folded(el), parent_idx)?;
            stack.extend(child_nodes(el).rev().map(|child| (child, idx)));
        }

        debug!("parse_primary: {} nodes", map.node_count());
        Ok(map)
    }

    /// Merge `FOLDED="true"` from the sidecar onto matching nodes.
    ///
    /// A sidecar that fails to parse is ignored. Returns the number of nodes
    /// the sidecar folded.
    #[instrument(level = "debug", skip_all)]
    pub fn apply_sidecar(&self, map: &mut MindMap, sidecar: &str) -> usize {
        let folds = match parse_sidecar(sidecar) {
            Ok(folds) => folds,
            Err(e) => {
                warn!("ignoring sidecar: {}", e);
                return 0;
            }
        };

        let targets: Vec<Index> = map
            .iter()
            .filter(|(_, node)| folds.get(node.id()).copied().unwrap_or(false))
            .map(|(idx, _)| idx)
            .collect();
        for &idx in &targets {
            // Indices come straight from the traversal above
            let _ = map.set_folded(idx, true);
        }
        debug!("apply_sidecar: folded {} nodes", targets.len());
        targets.len()
    }

    fn resolve_id(&self, map: &MindMap, el: Node) -> DomainResult<String> {
        match non_empty_id(el) {
            Some(id) if !map.contains_id(id) => Ok(id.to_string()),
            Some(id) => {
                if self.require_ids {
                    return Err(DomainError::DuplicateId(id.to_string()));
                }
                let fresh = map.fresh_id();
                warn!("duplicate node id {:?} replaced by {}", id, fresh);
                Ok(fresh)
            }
            None => self.fallback_id(el, map.fresh_id()),
        }
    }

    fn fallback_id(&self, el: Node, fresh: String) -> DomainResult<String> {
        if self.require_ids {
            return Err(DomainError::MissingId {
                text: node_text(el).to_string(),
            });
        }
        warn!("node {:?} has no ID, assigned {}", node_text(el), fresh);
        Ok(fresh)
    }
}

/// Fold flags per id from a sidecar document; the first entry for an id wins.
pub fn parse_sidecar(sidecar: &str) -> DomainResult<HashMap<String, bool>> {
    let doc = parse_xml(sidecar, DocumentKind::Sidecar)?;
    let mut folds = HashMap::new();
    for el in doc.descendants().filter(|n| n.has_tag_name(NODE_TAG)) {
        if let Some(id) = el.attribute(ATTR_ID) {
            folds.entry(id.to_string()).or_insert_with(|| is_folded(el));
        }
    }
    Ok(folds)
}

fn parse_xml(text: &str, document: DocumentKind) -> DomainResult<Document<'_>> {
    Document::parse(text).map_err(|e| DomainError::MalformedXml {
        document,
        reason: e.to_string(),
    })
}

fn map_root_node<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let map_el = doc.root_element();
    if !map_el.has_tag_name(MAP_TAG) {
        return None;
    }
    child_nodes(map_el).next()
}

fn child_nodes<'a, 'input>(
    el: Node<'a, 'input>,
) -> impl DoubleEndedIterator<Item = Node<'a, 'input>> {
    el.children()
        .filter(|n| n.is_element() && n.has_tag_name(NODE_TAG))
}

fn non_empty_id<'a>(el: Node<'a, '_>) -> Option<&'a str> {
    el.attribute(ATTR_ID).filter(|id| !id.is_empty())
}

fn node_text<'a>(el: Node<'a, '_>) -> &'a str {
    el.attribute(ATTR_TEXT).unwrap_or_default()
}

fn is_folded(el: Node) -> bool {
    el.attribute(ATTR_FOLDED) == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_keeps_child_order() {
        let xml = r#"<map version="1.0.1">
  <node ID="root" TEXT="R">
    <node ID="a" TEXT="A"><node ID="a1" TEXT="A1"/></node>
    <node ID="b" TEXT="B"/>
    <node ID="c" TEXT="C"/>
  </node>
</map>"#;
        let map = MapBuilder::new().parse_primary(xml).unwrap();
        let order: Vec<&str> = map.iter().map(|(_, n)| n.id()).collect();
        assert_eq!(order, vec!["root", "a", "a1", "b", "c"]);
        assert!(map.is_consistent());
    }

    #[test]
    fn test_parse_primary_skips_non_node_elements() {
        let xml = r#"<map><node ID="r" TEXT="R"><icon BUILTIN="idea"/><node ID="x"/></node></map>"#;
        let map = MapBuilder::new().parse_primary(xml).unwrap();
        assert_eq!(map.node_count(), 2);
        assert_eq!(map.node_by_id("x").unwrap().text(), "");
    }

    #[test]
    fn test_parse_sidecar_first_entry_wins() {
        let folds =
            parse_sidecar(r#"<map><node ID="a" FOLDED="true"/><node ID="a"/></map>"#).unwrap();
        assert_eq!(folds.get("a"), Some(&true));
    }
}
