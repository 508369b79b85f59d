//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{BubbleItem, DomainError, Forest, Index, Navigator, Tap, TreeClassifier, UnresolvedPolicy};
use crate::infrastructure::ServiceContainer;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree) => _tree(cli),
        Some(Commands::Roots) => _roots(cli),
        Some(Commands::List) => _list(cli),
        Some(Commands::Children { id }) => _children(cli, *id),
        Some(Commands::Descendants { id }) => _descendants(cli, *id),
        Some(Commands::Search { query, within, limit }) => _search(cli, query, *within, *limit),
        Some(Commands::Browse {
            taps,
            select,
            up,
            query,
        }) => _browse(cli, taps, *select, *up, query.as_deref()),
        Some(Commands::Check) => _check(cli),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Settings are layered with the local config next to the catalog in use.
fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load_for_catalog(cli.catalog.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

fn load_forest(cli: &Cli) -> CliResult<(ServiceContainer, Forest<BubbleItem>)> {
    let container = container(cli)?;
    let path = container.catalog_path(cli.catalog.as_ref())?;
    let forest = container.catalog.build_forest(&path, &container.settings)?;
    debug!("forest: {} nodes, {} roots", forest.len(), forest.root_indices().len());
    Ok((container, forest))
}

fn node_index(forest: &Forest<BubbleItem>, id: i64) -> CliResult<Index> {
    forest
        .find(id)
        .map(|node| node.index)
        .ok_or_else(|| DomainError::UnknownElement(id).into())
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli) -> CliResult<()> {
    let (_, forest) = load_forest(cli)?;
    for tree in forest.to_tree_strings_with(output::tree_label) {
        output::info(&tree);
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _roots(cli: &Cli) -> CliResult<()> {
    let (_, forest) = load_forest(cli)?;
    forest.roots().for_each(output::node);
    Ok(())
}

#[instrument(skip(cli))]
fn _list(cli: &Cli) -> CliResult<()> {
    let (_, forest) = load_forest(cli)?;
    forest.iter().for_each(output::node);
    Ok(())
}

#[instrument(skip(cli))]
fn _children(cli: &Cli, id: i64) -> CliResult<()> {
    let (_, forest) = load_forest(cli)?;
    let idx = node_index(&forest, id)?;
    forest.children_of(idx).into_iter().for_each(output::node);
    Ok(())
}

#[instrument(skip(cli))]
fn _descendants(cli: &Cli, id: i64) -> CliResult<()> {
    let (_, forest) = load_forest(cli)?;
    let idx = node_index(&forest, id)?;
    forest.descendants_of(idx).into_iter().for_each(output::node);
    Ok(())
}

#[instrument(skip(cli))]
fn _search(cli: &Cli, query: &str, within: Option<i64>, limit: Option<usize>) -> CliResult<()> {
    let (container, forest) = load_forest(cli)?;
    let mut nav = Navigator::new(&forest);
    if let Some(id) = within {
        let idx = node_index(&forest, id)?;
        if !matches!(nav.tap(idx), Tap::Entered(_)) {
            return Err(CliError::InvalidArgs(format!("element {id} has no children to search")));
        }
    }
    let limit = limit.unwrap_or(container.settings.search.limit);
    nav.search(query, limit).into_iter().for_each(output::node);
    Ok(())
}

#[instrument(skip(cli))]
fn _browse(cli: &Cli, taps: &[i64], select: bool, up: usize, query: Option<&str>) -> CliResult<()> {
    let (container, forest) = load_forest(cli)?;
    let search = &container.settings.search;
    let mut nav = Navigator::new(&forest);
    if select {
        nav.toggle_mode();
    }

    for &id in taps {
        let idx = node_index(&forest, id)?;
        match nav.tap(idx) {
            Tap::Entered(_) => debug!("browse: entered {id}"),
            Tap::Selected(_) => debug!("browse: selected {id}"),
            Tap::Ignored => return Err(DomainError::UnknownElement(id).into()),
        }
    }
    for _ in 0..up {
        nav.go_up();
    }

    let crumbs = nav
        .breadcrumbs()
        .iter()
        .map(|node| node.label().to_string())
        .collect::<Vec<_>>();
    if crumbs.is_empty() {
        output::header("/");
    } else {
        output::header(&crumbs.join(" / "));
    }
    output::detail(&nav.placeholder(&search.root_placeholder, &search.within_placeholder));

    let bubbles = match query {
        Some(q) => nav.search(q, search.limit),
        None => nav.visible(),
    };
    bubbles.into_iter().for_each(output::node);

    if let Some(node) = nav.selected() {
        output::success(&format!("selected: {} [{}]", node.label(), node.id()));
    }
    Ok(())
}

/// Classifies without the configured policy so every detached element is listed.
#[instrument(skip(cli))]
fn _check(cli: &Cli) -> CliResult<()> {
    let container = container(cli)?;
    let path = container.catalog_path(cli.catalog.as_ref())?;
    let items = container.catalog.load(&path)?;
    let total = items.len();
    let forest = TreeClassifier::new()
        .with_policy(UnresolvedPolicy::Ignore)
        .classify(items)?;

    let detached = forest.detached();
    if detached.is_empty() {
        output::success(&format!("{}: {} elements, all attached", path.display(), total));
        return Ok(());
    }
    for d in detached {
        output::warning(&format!("element {} (parent {}): {}", d.id, d.parent_id, d.reason));
    }
    Err(CliError::Detached(detached.len()))
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let container = container(cli)?;
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config locations:");
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", path.display())),
                None => output::detail(&"global: (no home directory)"),
            }
            let container = container(cli)?;
            let catalog = container.catalog_path(cli.catalog.as_ref()).ok();
            if let Some(dir) = catalog.as_deref().and_then(Path::parent) {
                output::detail(&format!("local:  {}", local_config_path(dir).display()));
            }
        }
    }
    Ok(())
}
