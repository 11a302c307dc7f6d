//! Editor session: the document context the UI layer drives.
//!
//! A session owns one [`MindMap`], the active node and the interaction mode.
//! New-document and load produce a new session; the caller swaps it in
//! wholesale, so a failed load never touches the current one.

use generational_arena::Index;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::CodecSettings;
use crate::domain::codec;
use crate::domain::{
    DocumentKind, DomainError, LayoutEngine, LayoutSettings, MapBuilder, MapDocuments, MapNode,
    MindMap, RenderOutput,
};

/// Root label of a new map.
pub const NEW_MAP_TEXT: &str = "New Mindmap";
/// Label of nodes created by add-child / add-sibling.
pub const NEW_NODE_TEXT: &str = "New Node";

/// What keyboard-style input currently means.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Browsing,
    /// The label of the node with this id is being edited
    EditingNode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug)]
pub struct Session {
    map: MindMap,
    active: Index,
    mode: InteractionMode,
    engine: LayoutEngine,
}

impl Session {
    /// Single-node map with the root selected.
    pub fn new_document(layout: LayoutSettings) -> Self {
        Self::from_map(MindMap::new(NEW_MAP_TEXT), layout)
    }

    pub fn from_map(map: MindMap, layout: LayoutSettings) -> Self {
        let active = map.root();
        Self {
            map,
            active,
            mode: InteractionMode::Browsing,
            engine: LayoutEngine::new(layout),
        }
    }

    /// Build a session from document text; the sidecar is optional.
    #[instrument(level = "debug", skip_all, fields(has_sidecar = sidecar.is_some()))]
    pub fn load(
        primary: &str,
        sidecar: Option<&str>,
        codec: &CodecSettings,
        layout: LayoutSettings,
    ) -> ApplicationResult<Self> {
        let map = MapBuilder::new()
            .require_ids(codec.require_ids)
            .build(primary, sidecar)?;
        info!("loaded map with {} nodes", map.node_count());
        Ok(Self::from_map(map, layout))
    }

    pub fn map(&self) -> &MindMap {
        &self.map
    }

    pub fn active(&self) -> Index {
        self.active
    }

    pub fn active_node(&self) -> Option<&MapNode> {
        self.map.get(self.active)
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, InteractionMode::EditingNode(_))
    }

    fn blocked_by_edit(&self, op: &str) -> bool {
        if self.is_editing() {
            debug!("{}: ignored while editing", op);
            return true;
        }
        false
    }

    /// Make the node with `id` active; leaves editing mode without committing.
    pub fn select(&mut self, id: &str) -> ApplicationResult<Index> {
        let idx = self
            .map
            .lookup(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        if self.is_editing() {
            self.cancel_edit();
        }
        self.active = idx;
        Ok(idx)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn add_child(&mut self) -> ApplicationResult<Index> {
        if self.blocked_by_edit("add_child") {
            return Ok(self.active);
        }
        self.active = self.map.add_child(self.active, NEW_NODE_TEXT)?;
        Ok(self.active)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn add_sibling(&mut self) -> ApplicationResult<Index> {
        if self.blocked_by_edit("add_sibling") {
            return Ok(self.active);
        }
        if let Some(sibling) = self.map.add_sibling(self.active, NEW_NODE_TEXT)? {
            self.active = sibling;
        }
        Ok(self.active)
    }

    /// Delete the active subtree; the node now at its position, or else the
    /// parent, becomes active.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_active(&mut self) -> ApplicationResult<Index> {
        if self.blocked_by_edit("delete") {
            return Ok(self.active);
        }
        let (Some(parent), Some(position)) = (
            self.map.parent(self.active),
            self.map.position_in_parent(self.active),
        ) else {
            debug!("delete: root stays");
            return Ok(self.active);
        };

        self.map.remove_subtree(self.active)?;
        let siblings = self.map.children(parent);
        self.active = match siblings.len() {
            0 => parent,
            n => siblings[position.min(n - 1)],
        };
        Ok(self.active)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn toggle_fold(&mut self) -> ApplicationResult<Index> {
        if self.blocked_by_edit("toggle_fold") {
            return Ok(self.active);
        }
        self.map.toggle_fold(self.active)?;
        Ok(self.active)
    }

    /// Replace the active node's label.
    pub fn edit_text(&mut self, text: &str) -> ApplicationResult<Index> {
        self.map.set_text(self.active, text)?;
        Ok(self.active)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn navigate(&mut self, direction: Direction) -> Index {
        if self.blocked_by_edit("navigate") {
            return self.active;
        }
        let target = match direction {
            Direction::Left => self.map.parent(self.active),
            Direction::Right => self
                .map
                .get(self.active)
                .filter(|n| !n.is_folded())
                .and_then(|n| n.children().first().copied()),
            Direction::Up | Direction::Down => self.neighbour(direction),
        };
        if let Some(idx) = target {
            self.active = idx;
        }
        self.active
    }

    fn neighbour(&self, direction: Direction) -> Option<Index> {
        let parent = self.map.parent(self.active)?;
        let position = self.map.position_in_parent(self.active)?;
        let siblings = self.map.children(parent);
        match direction {
            Direction::Up => position.checked_sub(1).map(|p| siblings[p]),
            _ => siblings.get(position + 1).copied(),
        }
    }

    /// Enter editing mode for the active node.
    pub fn begin_edit(&mut self) -> ApplicationResult<()> {
        let id = self
            .active_node()
            .map(|n| n.id().to_string())
            .ok_or(ApplicationError::Domain(DomainError::StaleIndex))?;
        debug!("begin_edit: {}", id);
        self.mode = InteractionMode::EditingNode(id);
        Ok(())
    }

    /// Write `text` to the node being edited and return to browsing.
    ///
    /// Outside editing mode this is a no-op.
    pub fn commit_edit(&mut self, text: &str) -> ApplicationResult<Index> {
        let InteractionMode::EditingNode(id) = std::mem::take(&mut self.mode) else {
            debug!("commit_edit: not editing");
            return Ok(self.active);
        };
        let idx = self
            .map
            .lookup(&id)
            .ok_or(DomainError::NodeNotFound(id))?;
        self.map.set_text(idx, text)?;
        Ok(idx)
    }

    pub fn cancel_edit(&mut self) {
        debug!("cancel_edit");
        self.mode = InteractionMode::Browsing;
    }

    pub fn render(&self) -> RenderOutput {
        self.engine.render(&self.map, Some(self.active))
    }

    /// Serialize with the given `<map version>`.
    pub fn save_with_version(&self, version: &str) -> MapDocuments {
        MapDocuments {
            primary: codec::write_document_with_version(&self.map, DocumentKind::Primary, version),
            sidecar: codec::write_document_with_version(&self.map, DocumentKind::Sidecar, version),
        }
    }

    pub fn save(&self) -> MapDocuments {
        codec::serialize(&self.map)
    }
}
