//! Application layer: editor session and document services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod services;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use session::{Direction, InteractionMode, Session, NEW_MAP_TEXT, NEW_NODE_TEXT};
