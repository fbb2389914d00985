//! Subcommand enum definitions for CLI

use clap::Subcommand;
use std::path::PathBuf;

/// GFF document commands
#[derive(Subcommand)]
pub enum GffCommands {
    /// Print a GFF file as JSON
    Dump {
        /// GFF file (UTC, UTI, DLG, IFO...)
        path: PathBuf,

        /// Output to JSON file (prints to CLI if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that files survive decode and re-encode byte for byte
    Verify {
        /// GFF file(s)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only report failures
        #[arg(short, long)]
        quiet: bool,
    },

    /// Build a GFF file from JSON written by `gff dump`
    #[command(name = "from-json")]
    FromJson {
        /// JSON source
        source: PathBuf,

        /// GFF destination
        destination: PathBuf,
    },
}

/// Talk table commands
#[derive(Subcommand)]
pub enum TlkCommands {
    /// Look up StrRef(s)
    Get {
        /// Primary talk table (dialog.tlk)
        path: PathBuf,

        /// StrRef(s), decimal or 0x-prefixed hex
        #[arg(required = true)]
        strrefs: Vec<String>,

        /// Custom talk table for StrRefs >= 0x01000000
        #[arg(short, long)]
        custom: Option<PathBuf>,
    },

    /// Show talk table statistics
    Info {
        /// Talk table
        path: PathBuf,
    },
}

/// 2DA table commands
#[derive(Subcommand)]
pub enum TwoDaCommands {
    /// Print one cell
    Get {
        /// 2DA file
        path: PathBuf,

        /// Row index or row label
        row: String,

        /// Column name (case-insensitive)
        column: String,

        /// Substitute the table DEFAULT for DEFAULT cells
        #[arg(short, long)]
        resolve: bool,
    },

    /// List column names
    Columns {
        /// 2DA file
        path: PathBuf,
    },
}

/// ERF/HAK/MOD archive commands
#[derive(Subcommand)]
pub enum ErfCommands {
    /// List archive contents
    List {
        /// Archive file
        source: PathBuf,

        /// Filter by glob pattern on name.ext (e.g., "*.utc")
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Only show count of matching resources
        #[arg(short, long)]
        count: bool,
    },

    /// Extract every resource to a directory
    Extract {
        /// Archive file
        source: PathBuf,

        /// Output directory
        destination: PathBuf,
    },
}

/// KEY/BIF commands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// List resources indexed by a KEY file
    List {
        /// KEY file
        source: PathBuf,

        /// Filter by glob pattern on name.ext (e.g., "*.2da")
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// List the BIF files instead of resources
        #[arg(short, long)]
        bifs: bool,
    },
}
