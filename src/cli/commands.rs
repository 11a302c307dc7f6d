//! Command dispatch: each subcommand loads a map, applies one session
//! operation and saves or prints the result.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::Session;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{MapTreeConvert, RenderOutput};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::New { file, title }) => _new(file, title),
        Some(Commands::Tree { file, all }) => _tree(file, *all),
        Some(Commands::Layout { file, json }) => _layout(file, *json),
        Some(Commands::Add {
            file,
            id,
            text,
            sibling,
        }) => _add(file, id, text, *sibling),
        Some(Commands::Remove { file, id }) => _remove(file, id),
        Some(Commands::Fold { file, id }) => _fold(file, id),
        Some(Commands::Rename { file, id, text }) => _rename(file, id, text),
        Some(Commands::Config { command }) => _config(command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Services configured for maps living in `file`'s directory.
fn container_for(file: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(file.parent())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn open(file: &Path) -> CliResult<(ServiceContainer, Session)> {
    let services = container_for(file)?;
    let session = services.documents.open(file, services.settings.layout)?;
    Ok((services, session))
}

fn select(session: &mut Session, id: &str) -> CliResult<()> {
    session
        .select(id)
        .map_err(|_| CliError::Usage(format!("no node with id {:?}", id)))?;
    Ok(())
}

fn active_label(session: &Session) -> String {
    session
        .active_node()
        .map(|n| format!("{} ({})", n.text(), n.id()))
        .unwrap_or_default()
}

#[instrument]
fn _new(file: &Path, title: &str) -> CliResult<()> {
    let services = container_for(file)?;
    let mut session = Session::new_document(services.settings.layout);
    session.edit_text(title)?;
    let written = services.documents.save(&session, file)?;
    output::success(&format!("created {}", written.primary.display()));
    Ok(())
}

#[instrument]
fn _tree(file: &Path, all: bool) -> CliResult<()> {
    let (_, session) = open(file)?;
    output::info(&session.map().to_tree_string(all));
    Ok(())
}

#[instrument]
fn _layout(file: &Path, json: bool) -> CliResult<()> {
    let (_, session) = open(file)?;
    let render = session.render();
    if json {
        let text = serde_json::to_string_pretty(&render)
            .map_err(|e| CliError::Usage(format!("cannot encode layout: {}", e)))?;
        output::info(&text);
    } else {
        print_layout(&render);
    }
    Ok(())
}

fn print_layout(render: &RenderOutput) {
    output::header("nodes");
    for node in &render.nodes {
        let flags = [
            (node.is_root, "root"),
            (node.is_selected, "selected"),
            (node.is_folded, "folded"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .join(",");
        output::detail(&format!(
            "{:<24} x={:<8} y={:<8} w={:<6} {}",
            node.id, node.x, node.y, node.width, flags
        ));
    }
    output::header("connectors");
    for c in &render.connectors {
        output::detail(&format!("{} -> {}: {}", c.from, c.to, c.svg_path()));
    }
    if let Some(b) = &render.bounds {
        output::header("bounds");
        output::detail(&format!(
            "({}, {}) .. ({}, {})  {}x{}",
            b.min_x,
            b.min_y,
            b.max_x,
            b.max_y,
            b.width(),
            b.height()
        ));
    }
}

#[instrument]
fn _add(file: &Path, id: &str, text: &str, sibling: bool) -> CliResult<()> {
    let (services, mut session) = open(file)?;
    select(&mut session, id)?;
    let before = session.active();
    let created = if sibling {
        session.add_sibling()?
    } else {
        session.add_child()?
    };
    if created == before {
        return Err(CliError::Usage("the root node cannot have siblings".into()));
    }
    session.edit_text(text)?;
    services.documents.save(&session, file)?;
    output::action("added", &active_label(&session));
    Ok(())
}

#[instrument]
fn _remove(file: &Path, id: &str) -> CliResult<()> {
    let (services, mut session) = open(file)?;
    select(&mut session, id)?;
    if session.active() == session.map().root() {
        return Err(CliError::Usage("the root node cannot be removed".into()));
    }
    session.delete_active()?;
    services.documents.save(&session, file)?;
    output::action("removed", id);
    Ok(())
}

#[instrument]
fn _fold(file: &Path, id: &str) -> CliResult<()> {
    let (services, mut session) = open(file)?;
    select(&mut session, id)?;
    if !session.active_node().is_some_and(|n| n.has_children()) {
        return Err(CliError::Usage(format!("node {:?} has no children to fold", id)));
    }
    session.toggle_fold()?;
    let folded = session.active_node().is_some_and(|n| n.is_folded());
    services.documents.save(&session, file)?;
    output::action(if folded { "folded" } else { "unfolded" }, &active_label(&session));
    Ok(())
}

#[instrument]
fn _rename(file: &Path, id: &str, text: &str) -> CliResult<()> {
    let (services, mut session) = open(file)?;
    select(&mut session, id)?;
    session.begin_edit()?;
    session.commit_edit(text)?;
    services.documents.save(&session, file)?;
    output::action("renamed", &active_label(&session));
    Ok(())
}

#[instrument]
fn _config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => return Err(CliError::Usage("no config directory on this system".into())),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
