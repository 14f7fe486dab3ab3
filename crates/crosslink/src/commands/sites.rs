//! `crosslink sites` command implementation.

use clap::Args;
use crosslink_config::SiteRegistry;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the sites command.
#[derive(Args)]
pub(crate) struct SitesArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

impl SitesArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.config.load()?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }
        let registry = SiteRegistry::from_config(&config)?;

        for site in &registry {
            output.highlight(&format!(
                "\n{}{}{}",
                config.prefix, site.name, config.suffix
            ));
            output.detail("source", &site.source_dir.display().to_string());
            output.detail("target", &site.target_url);
            output.detail(
                "urls",
                if site.use_directory_urls {
                    "directory (page.md -> page/)"
                } else {
                    "file (page.md -> page.html)"
                },
            );
        }

        output.success(&format!("\n{} site(s) configured", registry.len()));
        Ok(())
    }
}
