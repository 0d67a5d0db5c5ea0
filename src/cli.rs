use std::path::{Path, PathBuf};

mod config;
mod convert;
mod matrix;
mod publish;
mod summary;
mod terminal;

use clap::ArgAction;
use config::Config;
use convert::Convert;
use matrix::Matrix;
use publish::Publish;
use reqpub::{PublishConfig, Tree};
use summary::Summary;

/// The configuration file looked up in the root when `--config` is not given.
const CONFIG_FILE: &str = "reqpub.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the doorstop project
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Summary(Summary::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // stdout carries converted output
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show the documents of the tree and their item counts (default)
    Summary(Summary),

    /// Publish every document as Markdown or LaTeX
    Publish(Publish),

    /// Write the traceability matrix
    Matrix(Matrix),

    /// Convert a Markdown text body to LaTeX
    ///
    /// Reads the file given, or standard input, and prints the LaTeX.
    Convert(Convert),

    /// Show or initialise the publishing configuration
    Config(Config),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Summary(command) => command.run(root)?,
            Self::Publish(command) => command.run(root)?,
            Self::Matrix(command) => command.run(root)?,
            Self::Convert(command) => command.run()?,
            Self::Config(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Publishing toggles that override the configuration file.
#[derive(Debug, Default, clap::Args)]
pub struct Overrides {
    /// Turn item links into hyperlinks
    #[arg(long, overrides_with = "no_linkify")]
    linkify: bool,

    /// Publish item links as plain text
    #[arg(long, overrides_with = "linkify")]
    no_linkify: bool,

    /// Locate `ref` keywords and references in the project files
    #[arg(long)]
    check_ref: bool,
}

impl Overrides {
    fn apply(&self, config: &mut PublishConfig) {
        if self.linkify {
            config.linkify = true;
        }
        if self.no_linkify {
            config.linkify = false;
        }
        if self.check_ref {
            config.check_ref = true;
        }
    }
}

/// Loads the publishing configuration.
///
/// An explicit path must exist. Otherwise `reqpub.toml` in the root is used
/// if present, falling back to the defaults.
fn load_config(root: &Path, path: Option<&Path>) -> anyhow::Result<PublishConfig> {
    if let Some(path) = path {
        return PublishConfig::load(path).map_err(anyhow::Error::msg);
    }

    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!("no {CONFIG_FILE} in {}, using defaults", root.display());
        return Ok(PublishConfig::default());
    }
    PublishConfig::load(&path).map_err(anyhow::Error::msg)
}

fn load_tree(root: &Path) -> anyhow::Result<Tree> {
    let tree = reqpub::load_tree(root)?;
    if tree.is_empty() {
        tracing::warn!("no documents found below {}", root.display());
    }
    Ok(tree)
}
