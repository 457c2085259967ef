//! nestconf cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; nestconf ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a configuration and print it as plain data
    ///
    /// Reads from stdin unless a file is provided (via --input-file)
    Dump(DumpCommand),

    /// Validate a configuration against a schema file and print the result
    ///
    /// Reads from stdin unless a file is provided (via --input-file)
    Check(CheckCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct DumpCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Schema file, itself written in the configuration language
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,

    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a file
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,

    /// How deep includes may nest
    #[clap(long = "max-include-depth", default_value_t = 32)]
    pub max_include_depth: usize,

    /// How deep sections may nest
    #[clap(long = "max-nesting", default_value_t = 128)]
    pub max_nesting: usize,

    /// Fail when an include pattern matches no file
    #[clap(long = "strict-includes")]
    pub strict_includes: bool,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
    /// the configuration language
    Conf,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Conf => f.write_str("conf"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[command(subcommand)]
    pub command: DevSubCommand,

    #[clap(flatten)]
    pub input: InputArgs,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Tokens of the input (includes are not expanded)
    Tokens,
    /// Raw parse tree
    Tree,
}
