use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use critfix::core::OutputFormat;
use critfix::rules::RuleKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "critfix")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Batch source rewriting with write-once backups",
    long_about = "Scans a directory of source files, applies textual fix-up rules \
                  (DateTime.Now -> DateTime.UtcNow by default), keeps a write-once \
                  backup of every file it touches and reports per-rule statistics."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, markdown)
    #[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Config file (defaults to ./critfix.toml, then ~/.config/critfix/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the enabled rules to every source file in a directory
    Run {
        /// Directory to process
        path: PathBuf,

        /// Show what would change without writing files or backups
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Enable a rule on top of the configured ones
        #[arg(short, long, value_enum)]
        enable: Vec<RuleKind>,

        /// Disable a rule that the configuration enables
        #[arg(short, long, value_enum)]
        disable: Vec<RuleKind>,
    },

    /// Put files back the way their backups recorded them
    Restore {
        /// Directory containing backups
        path: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Actually overwrite files (otherwise only list them)
        #[arg(long)]
        yes: bool,
    },

    /// Write a default config file
    Init {
        /// Where to write it
        #[arg(default_value = "critfix.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

/// RUST_LOG wins when it parses; otherwise `--verbose` picks the level
fn log_filter(verbose: bool, from_env: Option<&str>) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "critfix=debug" } else { "critfix=info" }))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let filter = log_filter(cli.verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ok = match cli.command {
        Commands::Run {
            path,
            dry_run,
            recursive,
            enable,
            disable,
        } => commands::run::run(
            commands::run::RunOptions {
                path,
                dry_run,
                recursive,
                enable,
                disable,
                config: cli.config,
                verbose: cli.verbose,
            },
            cli.format,
        )?,
        Commands::Restore {
            path,
            recursive,
            yes,
        } => commands::restore::run(path, recursive, yes, cli.config, cli.format)?,
        Commands::Init { path, force } => commands::init::run(path, force)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "critfix", &mut std::io::stdout());
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults() {
        assert_eq!(log_filter(false, None).to_string(), "critfix=info");
        assert_eq!(log_filter(true, None).to_string(), "critfix=debug");
    }

    #[test]
    fn test_log_filter_honours_env() {
        assert_eq!(log_filter(false, Some("critfix=trace")).to_string(), "critfix=trace");
        assert_eq!(log_filter(true, Some("critfix=loud")).to_string(), "critfix=debug");
    }
}
