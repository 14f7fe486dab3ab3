//! Crosslink CLI - cross-site documentation link resolver.
//!
//! Provides commands for:
//! - `rewrite`: Resolve pseudo-links in a built site's HTML pages
//! - `migrate`: Convert legacy `@name:path` links in Markdown sources
//! - `lookup`: Show which files a query resolves to in a site
//! - `sites`: List the configured sites

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{LookupArgs, MigrateArgs, RewriteArgs, SitesArgs};
use output::Output;

/// Crosslink - link between documentation sites.
#[derive(Parser)]
#[command(name = "crosslink", version, about)]
struct Cli {
    /// Enable INFO logging (otherwise RUST_LOG applies).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite pseudo-links in the HTML pages of a built site.
    Rewrite(RewriteArgs),
    /// Migrate legacy links in Markdown sources.
    Migrate(MigrateArgs),
    /// Look up the files a query resolves to.
    Lookup(LookupArgs),
    /// List configured sites.
    Sites(SitesArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Rewrite(args) => args.execute(),
        Commands::Migrate(args) => args.execute(),
        Commands::Lookup(args) => args.execute(),
        Commands::Sites(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
