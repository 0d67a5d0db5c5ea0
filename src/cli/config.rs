use std::path::{Path, PathBuf};

use clap::Parser;
use reqpub::PublishConfig;
use tracing::instrument;

use super::{CONFIG_FILE, load_config, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Show or initialise the publishing configuration")]
pub struct Config {
    /// Configuration file to show (defaults to `reqpub.toml` in the root)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the default configuration to `reqpub.toml` in the root
    #[arg(long)]
    init: bool,
}

impl Config {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        if self.init {
            let path = root.join(CONFIG_FILE);
            anyhow::ensure!(!path.exists(), "{} already exists", path.display());
            PublishConfig::default()
                .save(&path)
                .map_err(anyhow::Error::msg)?;
            println!("{} {}", "created".success(), path.display());
            return Ok(());
        }

        let config = load_config(root, self.config.as_deref())?;
        print!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }
}
