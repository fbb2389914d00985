//! Command execution implementations

use super::Commands;
use super::definitions::{ErfCommands, GffCommands, KeyCommands, TlkCommands, TwoDaCommands};
use super::{archive, gff, resolve, tlk, twoda};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Gff { command } => command.execute(),
            Commands::Tlk { command } => command.execute(),
            Commands::TwoDa { command } => command.execute(),
            Commands::Erf { command } => command.execute(),
            Commands::Key { command } => command.execute(),
            Commands::Resolve {
                resource,
                install,
                config,
                module,
                hak,
                output,
            } => resolve::execute(
                &resource.0,
                install.as_deref(),
                config.as_deref(),
                module.as_deref(),
                hak,
                output.as_deref(),
            ),
        }
    }
}

impl GffCommands {
    /// Execute the selected GFF command.
    ///
    /// # Errors
    /// Returns an error if the underlying GFF operation fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            GffCommands::Dump { path, output } => gff::dump(path, output.as_deref()),
            GffCommands::Verify { paths, quiet } => gff::verify(paths, *quiet),
            GffCommands::FromJson { source, destination } => gff::from_json(source, destination),
        }
    }
}

impl TlkCommands {
    /// Execute the selected talk table command.
    ///
    /// # Errors
    /// Returns an error if the underlying talk table operation fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            TlkCommands::Get { path, strrefs, custom } => tlk::get(path, strrefs, custom.as_deref()),
            TlkCommands::Info { path } => tlk::info(path),
        }
    }
}

impl TwoDaCommands {
    /// Execute the selected 2DA command.
    ///
    /// # Errors
    /// Returns an error if the underlying 2DA operation fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            TwoDaCommands::Get {
                path,
                row,
                column,
                resolve,
            } => twoda::get(path, row, column, *resolve),
            TwoDaCommands::Columns { path } => twoda::columns(path),
        }
    }
}

impl ErfCommands {
    /// Execute the selected archive command.
    ///
    /// # Errors
    /// Returns an error if the underlying archive operation fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            ErfCommands::List { source, filter, count } => archive::list_erf(source, filter.as_deref(), *count),
            ErfCommands::Extract { source, destination } => archive::extract_erf(source, destination),
        }
    }
}

impl KeyCommands {
    /// Execute the selected KEY command.
    ///
    /// # Errors
    /// Returns an error if the underlying KEY operation fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            KeyCommands::List { source, filter, bifs } => archive::list_key(source, filter.as_deref(), *bifs),
        }
    }
}
