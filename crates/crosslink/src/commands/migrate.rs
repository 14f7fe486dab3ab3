//! `crosslink migrate` command implementation.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use crosslink_links::{LinkMigrator, Protocol};

use super::{ConfigArgs, collect_files, current_protocol, elapsed_ms, index_sites};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the migrate command.
#[derive(Args)]
pub(crate) struct MigrateArgs {
    /// Markdown files or directories to migrate (default: the local docs directory).
    paths: Vec<PathBuf>,

    /// Report files that would change without writing them.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

impl MigrateArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let start = Instant::now();

        let config = self.config.load()?;
        let legacy = Protocol::new(
            &config.migrate.legacy_prefix,
            &config.migrate.legacy_suffix,
        );
        let migrator = LinkMigrator::new(index_sites(&config)?, legacy, current_protocol(&config));

        let roots = if self.paths.is_empty() {
            vec![config.local_resolved.docs_dir.clone()]
        } else {
            self.paths
        };
        let mut files = Vec::new();
        for root in &roots {
            files.extend(collect_files(root, "md")?);
        }

        let mut changed = 0;
        for file in &files {
            let updated = if self.dry_run {
                let markdown = fs::read_to_string(file)?;
                migrator.migrate(&file.display().to_string(), &markdown) != markdown
            } else {
                migrator.migrate_file(file)?
            };
            if updated {
                changed += 1;
                output.info(&format!("  {}", file.display()));
            }
        }

        let elapsed = elapsed_ms(start);
        if self.dry_run {
            output.highlight(&format!(
                "[DRY RUN] {changed} of {} files would be migrated ({elapsed:.1}ms)",
                files.len()
            ));
        } else {
            output.success(&format!(
                "Migrated {changed} of {} files in {elapsed:.1}ms",
                files.len()
            ));
        }
        Ok(())
    }
}
