//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Mind-map editor core: FreeMind .mm maps with .mmx fold-state sidecars
#[derive(Parser, Debug)]
#[command(name = "mmx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a new single-node map (and its sidecar)
    New {
        /// Primary map file (.mm)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Root label
        #[arg(short, long, default_value = crate::application::NEW_MAP_TEXT)]
        title: String,
    },

    /// Show the map as a tree
    Tree {
        /// Primary map file (.mm); the .mmx next to it is merged if present
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Expand folded nodes
        #[arg(short, long)]
        all: bool,
    },

    /// Print node positions and connectors
    Layout {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a child (or sibling) to a node and save
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Id of the node to add to
        id: String,
        /// Label of the new node
        #[arg(short, long, default_value = crate::application::NEW_NODE_TEXT)]
        text: String,
        /// Insert after the node instead of under it
        #[arg(short, long)]
        sibling: bool,
    },

    /// Delete a node with its subtree and save
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: String,
    },

    /// Toggle fold state of a node and save
    Fold {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: String,
    },

    /// Change the label of a node and save
    Rename {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: String,
        text: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show {
        /// Directory whose .mmx.toml is layered on top
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
    /// Show global config file location
    Path,
    /// Print a commented config template
    Template,
}
