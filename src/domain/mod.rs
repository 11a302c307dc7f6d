//! Domain layer: tree model, layout engine and document codec
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod codec;
pub mod error;
pub mod ids;
pub mod layout;
pub mod tree_traits;

pub use arena::{MapNode, MindMap, NodeData};
pub use builder::MapBuilder;
pub use codec::{escape_attr, serialize, write_document, MapDocuments};
pub use error::{DocumentKind, DomainError, DomainResult};
pub use layout::{
    Bounds, Connector, LayoutEngine, LayoutPoint, LayoutSettings, PositionedNode, RenderOutput,
};
pub use tree_traits::MapTreeConvert;
