//! CLI argument parsing for tutorial extraction.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "drape-guide",
    version,
    about = "Recover draping tutorials from generative model output",
    after_help = "Commands:\n  extract [--input <file>]      Run the pipeline on saved model text\n  analyze --image <file>        Ask the model about an image, then extract\n  tables                        Print the built-in pipeline tables\n\nExamples:\n  drape-guide extract --input reply.txt --report\n  cat reply.txt | drape-guide extract\n  drape-guide analyze --image dress.jpg --raw-out raw.txt\n  drape-guide tables > tables.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Extract(ExtractArgs),
    Analyze(AnalyzeArgs),
    Tables(TablesArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Extract a canonical tutorial from raw model text")]
pub struct ExtractArgs {
    /// Raw model output; `-` or absent reads stdin
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// JSON tables overriding the built-in defaults
    #[arg(long, value_name = "PATH")]
    pub tables: Option<PathBuf>,

    /// Emit `{tier, salvaged, document}` instead of the bare document
    #[arg(long)]
    pub report: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Generate a tutorial for an image via the Messages API")]
pub struct AnalyzeArgs {
    /// Image of the draped garment
    #[arg(long, value_name = "PATH")]
    pub image: PathBuf,

    /// Media type of the image (inferred from the extension when omitted)
    #[arg(long, value_name = "TYPE")]
    pub media_type: Option<String>,

    /// JSON tables overriding the built-in defaults
    #[arg(long, value_name = "PATH")]
    pub tables: Option<PathBuf>,

    /// Save the model's raw text before extraction
    #[arg(long, value_name = "PATH")]
    pub raw_out: Option<PathBuf>,

    /// Print status and headers along with the body
    #[arg(long)]
    pub envelope: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the built-in pipeline tables as JSON")]
pub struct TablesArgs {}
