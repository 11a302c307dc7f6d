//! Horizontal tree layout: measure subtrees, then place nodes and connectors.
//!
//! Every call recomputes from scratch; measurements live in a side table owned
//! by the call and are never written back to the tree.

use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::MindMap;

/// Geometry constants for measurement and placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Height of a leaf or folded node
    pub row_height: f64,
    /// Monospaced width estimate per character
    pub char_width: f64,
    /// Added to the text estimate to get the node width
    pub text_padding: f64,
    /// Gap between a parent's right edge and its children
    pub horizontal_gap: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            row_height: 30.0,
            char_width: 9.0,
            text_padding: 75.0,
            horizontal_gap: 50.0,
            origin_x: 50.0,
            origin_y: 400.0,
        }
    }
}

impl LayoutSettings {
    pub fn node_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width + self.text_padding
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A visible node with its absolute position and styling flags.
///
/// `(x, y)` is the left edge at the vertical centre of the node box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub subtree_height: f64,
    pub is_root: bool,
    pub is_selected: bool,
    /// Folded and has hidden children
    pub is_folded: bool,
}

/// Cubic curve from a parent's right edge to a child's left edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub from: String,
    pub to: String,
    pub start: LayoutPoint,
    pub control1: LayoutPoint,
    pub control2: LayoutPoint,
    pub end: LayoutPoint,
}

impl Connector {
    /// Horizontal S-curve: both control points sit halfway across, each at
    /// its own endpoint's height.
    pub fn s_curve(from: String, to: String, start: LayoutPoint, end: LayoutPoint) -> Self {
        let mid_x = start.x + (end.x - start.x) / 2.0;
        Self {
            from,
            to,
            control1: LayoutPoint::new(mid_x, start.y),
            control2: LayoutPoint::new(mid_x, end.y),
            start,
            end,
        }
    }

    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Visible nodes in pre-order
    pub nodes: Vec<PositionedNode>,
    pub connectors: Vec<Connector>,
    pub bounds: Option<Bounds>,
}

impl RenderOutput {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn connector(&self, from: &str, to: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.from == from && c.to == to)
    }
}

#[derive(Debug, Clone, Copy)]
struct Measure {
    width: f64,
    height: f64,
}

/// Lays out a [`MindMap`] with fixed settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    settings: LayoutSettings,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Measure and place every visible node of `map`.
    #[instrument(level = "debug", skip(self, map))]
    pub fn render(&self, map: &MindMap, selected: Option<Index>) -> RenderOutput {
        let measures = self.measure(map);
        self.place(map, &measures, selected)
    }

    /// Pass 1: post-order subtree measurement.
    ///
    /// Children of folded nodes are still visited but never read.
    fn measure(&self, map: &MindMap) -> HashMap<Index, Measure> {
        let mut measures: HashMap<Index, Measure> = HashMap::with_capacity(map.node_count());
        for (idx, node) in map.iter_postorder() {
            let width = self.settings.node_width(node.text());
            let height = if node.is_folded() || !node.has_children() {
                self.settings.row_height
            } else {
                node.children()
                    .iter()
                    .filter_map(|c| measures.get(c))
                    .map(|m| m.height)
                    .sum()
            };
            measures.insert(idx, Measure { width, height });
        }
        measures
    }

    /// Pass 2: pre-order placement with vertically centred child blocks.
    fn place(
        &self,
        map: &MindMap,
        measures: &HashMap<Index, Measure>,
        selected: Option<Index>,
    ) -> RenderOutput {
        let mut nodes = Vec::new();
        let mut connectors = Vec::new();
        let mut stack = vec![(map.root(), self.settings.origin_x, self.settings.origin_y)];

        while let Some((idx, x, y)) = stack.pop() {
            let (Some(node), Some(m)) = (map.get(idx), measures.get(&idx)) else {
                continue;
            };
            nodes.push(PositionedNode {
                id: node.id().to_string(),
                text: node.text().to_string(),
                x,
                y,
                width: m.width,
                height: self.settings.row_height,
                subtree_height: m.height,
                is_root: node.is_root(),
                is_selected: selected == Some(idx),
                is_folded: node.is_folded() && node.has_children(),
            });
            if node.is_folded() {
                continue;
            }

            let child_x = x + m.width + self.settings.horizontal_gap;
            let mut slot_start = y - m.height / 2.0;
            let mut placed = Vec::with_capacity(node.children().len());
            for &child in node.children() {
                let Some(child_measure) = measures.get(&child) else {
                    continue;
                };
                let child_y = slot_start + child_measure.height / 2.0;
                if let Some(child_node) = map.get(child) {
                    connectors.push(Connector::s_curve(
                        node.id().to_string(),
                        child_node.id().to_string(),
                        LayoutPoint::new(x + m.width, y),
                        LayoutPoint::new(child_x, child_y),
                    ));
                }
                placed.push((child, child_x, child_y));
                slot_start += child_measure.height;
            }
            // Reverse so the first child is popped (and emitted) first
            stack.extend(placed.into_iter().rev());
        }

        let half = self.settings.row_height / 2.0;
        let bounds = Bounds::from_points(nodes.iter().flat_map(|n| {
            [(n.x, n.y - half), (n.x + n.width, n.y + half)]
        }));
        RenderOutput {
            nodes,
            connectors,
            bounds,
        }
    }
}
