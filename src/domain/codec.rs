//! Writing the primary (`.mm`) and sidecar (`.mmx`) documents.
//!
//! Both documents share the `<map><node>...</node></map>` nesting and the
//! same ids; they differ only in which attributes each node carries.

use std::borrow::Cow;

use generational_arena::Index;
use tracing::{instrument, warn};

use crate::domain::arena::MindMap;
use crate::domain::error::DocumentKind;

/// FreeMind map format version written to the `<map>` element.
pub const MAP_VERSION: &str = "1.0.1";

const INDENT: &str = "  ";

/// The two serialized documents of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocuments {
    pub primary: String,
    pub sidecar: String,
}

/// Characters XML 1.0 does not allow anywhere in a document, not even as
/// character references.
fn is_xml_illegal(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

/// Escape an attribute value.
///
/// Tabs and line breaks become character references because attribute-value
/// normalization would otherwise read them back as spaces. Characters XML
/// cannot carry at all are replaced by U+FFFD.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| {
        matches!(c, '&' | '<' | '>' | '\'' | '"' | '\n' | '\r' | '\t') || is_xml_illegal(c)
    }) {
        return Cow::Borrowed(value);
    }
    if value.chars().any(is_xml_illegal) {
        warn!("replacing non-XML characters in {:?}", value);
    }
    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c if is_xml_illegal(c) => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Serialize `map` as both documents.
pub fn serialize(map: &MindMap) -> MapDocuments {
    MapDocuments {
        primary: write_document(map, DocumentKind::Primary),
        sidecar: write_document(map, DocumentKind::Sidecar),
    }
}

/// Serialize `map` as one document, using the default map version.
pub fn write_document(map: &MindMap, kind: DocumentKind) -> String {
    write_document_with_version(map, kind, MAP_VERSION)
}

#[instrument(level = "debug", skip(map))]
pub fn write_document_with_version(map: &MindMap, kind: DocumentKind, version: &str) -> String {
    let mut xml = format!("<map version=\"{}\">\n", escape_attr(version));
    write_nodes(map, kind, &mut xml);
    xml.push_str("</map>");
    xml
}

enum Step {
    Open(Index, usize),
    Close(usize),
}

/// Pre-order walk with an explicit stack; closing tags are queued below the
/// children they wrap.
fn write_nodes(map: &MindMap, kind: DocumentKind, xml: &mut String) {
    let mut stack = vec![Step::Open(map.root(), 1)];
    while let Some(step) = stack.pop() {
        let (idx, depth) = match step {
            Step::Open(idx, depth) => (idx, depth),
            Step::Close(depth) => {
                push_indent(xml, depth);
                xml.push_str("</node>\n");
                continue;
            }
        };
        let Some(node) = map.get(idx) else {
            continue;
        };

        push_indent(xml, depth);
        xml.push_str("<node ID=\"");
        xml.push_str(&escape_attr(node.id()));
        xml.push('"');
        match kind {
            DocumentKind::Primary => {
                xml.push_str(" TEXT=\"");
                xml.push_str(&escape_attr(node.text()));
                xml.push('"');
            }
            DocumentKind::Sidecar => {
                if node.is_folded() {
                    xml.push_str(" FOLDED=\"true\"");
                }
            }
        }

        if !node.has_children() {
            xml.push_str("/>\n");
            continue;
        }
        xml.push_str(">\n");
        stack.push(Step::Close(depth));
        stack.extend(
            node.children()
                .iter()
                .rev()
                .map(|&child| Step::Open(child, depth + 1)),
        );
    }
}

fn push_indent(xml: &mut String, depth: usize) {
    for _ in 0..depth {
        xml.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attr_replaces_markup_characters() {
        assert_eq!(
            escape_attr(r#"a<b>&'c'"d""#),
            "a&lt;b&gt;&amp;&apos;c&apos;&quot;d&quot;"
        );
        assert!(matches!(escape_attr("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_attr_replaces_non_xml_characters() {
        assert_eq!(escape_attr("a\u{0}b\u{1F}c\u{FFFF}"), "a\u{FFFD}b\u{FFFD}c\u{FFFD}");
        assert_eq!(escape_attr("a\u{B}<"), "a\u{FFFD}&lt;");
    }

    #[test]
    fn test_escape_attr_keeps_line_breaks_as_char_refs() {
        assert_eq!(escape_attr("a\nb\tc"), "a&#10;b&#9;c");
    }

    #[test]
    fn test_single_node_self_closes() {
        let map = MindMap::new("New Mindmap");
        assert_eq!(
            write_document(&map, DocumentKind::Primary),
            "<map version=\"1.0.1\">\n  <node ID=\"root\" TEXT=\"New Mindmap\"/>\n</map>"
        );
        assert_eq!(
            write_document(&map, DocumentKind::Sidecar),
            "<map version=\"1.0.1\">\n  <node ID=\"root\"/>\n</map>"
        );
    }

    #[test]
    fn test_nested_nodes_wrap_children_and_fold_only_in_sidecar() {
        let mut map = MindMap::new("r");
        let root = map.root();
        let a = map.insert_with_id("a", "A", false, root).unwrap();
        map.insert_with_id("a1", "A1", false, a).unwrap();
        map.toggle_fold(a).unwrap();

        let docs = serialize(&map);
        assert_eq!(
            docs.primary,
            concat!(
                "<map version=\"1.0.1\">\n",
                "  <node ID=\"root\" TEXT=\"r\">\n",
                "    <node ID=\"a\" TEXT=\"A\">\n",
                "      <node ID=\"a1\" TEXT=\"A1\"/>\n",
                "    </node>\n",
                "  </node>\n",
                "</map>"
            )
        );
        assert!(docs.sidecar.contains("<node ID=\"a\" FOLDED=\"true\">"));
        assert!(!docs.primary.contains("FOLDED"));
    }
}
