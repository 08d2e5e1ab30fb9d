use anyhow::Result;
use clap::{Parser, Subcommand};
use fine_grained_deps::cli;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Build, inspect and convert fine-grained dependency files.
#[derive(Parser, Debug)]
#[command(name = "depgraph-tool", version, about, long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a deps file from a JSON declaration manifest
    Build {
        manifest: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Also write <deps_name>.dot
        #[arg(long)]
        emit_dot: bool,
    },
    /// Convert a deps file to YAML
    ToYaml {
        #[arg(long = "input-filename")]
        input: PathBuf,
        #[arg(long = "output-filename")]
        output: PathBuf,
    },
    /// Convert YAML back to a deps file
    FromYaml {
        #[arg(long = "input-filename")]
        input: PathBuf,
        #[arg(long = "output-filename")]
        output: PathBuf,
    },
    /// Print every node and its dependencies
    Dump { deps: PathBuf },
    /// Render a deps file with Graphviz
    Dot {
        deps: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        no_externals: bool,
        #[arg(long)]
        no_implementations: bool,
    },
    /// Check structural invariants
    Verify { deps: PathBuf },
    /// Compare two deps files of the same source file
    Diff {
        old: PathBuf,
        new: PathBuf,
        /// Exit with failure when the graphs differ
        #[arg(long)]
        check: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            manifest,
            output,
            emit_dot,
        } => cli::build_from_manifest(&manifest, &output, emit_dot),
        Command::ToYaml { input, output } => cli::convert_to_yaml(&input, &output),
        Command::FromYaml { input, output } => cli::convert_from_yaml(&input, &output),
        Command::Dump { deps } => cli::dump_graph(&deps),
        Command::Dot {
            deps,
            output,
            no_externals,
            no_implementations,
        } => cli::emit_dot(&deps, &output, !no_externals, !no_implementations),
        Command::Verify { deps } => cli::verify_graph(&deps),
        Command::Diff { old, new, check } => cli::diff(&old, &new, check),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
