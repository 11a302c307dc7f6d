//! Mind-map editor core.
//!
//! - [`domain`]: arena tree model, layout engine, `.mm`/`.mmx` codec
//! - [`application`]: editor session and document file service
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: the `mmx` command-line driver

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
