//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sigoff_core::CONFIG_FILE;

use crate::commands::hex_utils::parse_hex_address;

#[derive(Parser)]
#[command(name = "sigoff")]
#[command(version, about = "Signature-driven offset updater")]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve annotated signatures and rewrite the offsets file
    Update(UpdateArgs),
    /// List every match of a signature in the code section
    Scan(ScanArgs),
}

/// Where the code section comes from
#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
    /// Executable (PE/ELF/Mach-O), or a raw section dump with --raw
    pub image: PathBuf,

    /// Section to scan (default from config, usually .text)
    #[arg(long)]
    pub section: Option<String>,

    /// Treat IMAGE as a raw dump of the code section
    #[arg(long, requires = "base")]
    pub raw: bool,

    /// Address the raw dump is mapped at (hex)
    #[arg(long, value_parser = parse_hex_address, requires = "raw")]
    pub base: Option<u64>,

    /// Module base for a raw dump (hex, defaults to --base)
    #[arg(long, value_parser = parse_hex_address, requires = "raw")]
    pub module_base: Option<u64>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Annotated offsets file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Rewritten offsets file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Build tag written into rewritten lines, e.g. 1_5_97
    #[arg(short = 't', long, env = "SIGOFF_VERSION_TAG")]
    pub version_tag: Option<String>,

    /// JSON id-to-offset table enabling TableSig annotations
    #[arg(long)]
    pub address_table: Option<PathBuf>,

    /// Save a JSON report of every annotation
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with an error if any annotation failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Signature, e.g. "48 8B ?? ?? 90"
    pub signature: String,

    /// Also follow the rel32 operand at each match
    #[arg(long)]
    pub indirect: bool,

    /// Maximum number of matches to print
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}
