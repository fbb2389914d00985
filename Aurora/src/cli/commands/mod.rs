use clap::Subcommand;
use std::path::PathBuf;
use std::str::FromStr;

use crate::formats::common::ResourceKey;

pub mod archive;
pub mod definitions;
pub mod execute;
pub mod gff;
pub mod resolve;
pub mod tlk;
pub mod twoda;

pub use definitions::{ErfCommands, GffCommands, KeyCommands, TlkCommands, TwoDaCommands};

/// A resource given as `name.ext`, e.g. `nw_chicken.utc`
#[derive(Debug, Clone)]
pub struct ResourceArg(pub ResourceKey);

impl FromStr for ResourceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKey::from_file_name(s)
            .map(ResourceArg)
            .ok_or_else(|| format!("Invalid resource '{s}'. Expected name.ext with a known extension, e.g. nw_chicken.utc"))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// GFF document commands
    Gff {
        #[command(subcommand)]
        command: GffCommands,
    },

    /// Talk table commands
    Tlk {
        #[command(subcommand)]
        command: TlkCommands,
    },

    /// 2DA table commands
    #[command(name = "2da")]
    TwoDa {
        #[command(subcommand)]
        command: TwoDaCommands,
    },

    /// ERF/HAK/MOD archive commands
    Erf {
        #[command(subcommand)]
        command: ErfCommands,
    },

    /// KEY/BIF commands
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Find a resource through module, override, HAK and base layers
    Resolve {
        /// Resource as name.ext
        resource: ResourceArg,

        /// Game install directory (override, KEYs and dialog.tlk)
        #[arg(short, long)]
        install: Option<PathBuf>,

        /// Resolver configuration JSON (replaces --install)
        #[arg(short, long, conflicts_with = "install")]
        config: Option<PathBuf>,

        /// Module directory probed first
        #[arg(short, long)]
        module: Option<PathBuf>,

        /// Additional HAK file(s), highest priority first
        #[arg(long)]
        hak: Vec<PathBuf>,

        /// Write the resolved bytes to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
