use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use reqpub::{Context, Format, Template, publish_tree};
use tracing::instrument;

use super::{Overrides, load_config, load_tree, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Publish every document of the tree")]
pub struct Publish {
    /// Directory to publish into
    out: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Publishing configuration file
    ///
    /// Defaults to `reqpub.toml` in the root, if present.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// Start Markdown documents with a table of contents
    #[arg(long)]
    toc: bool,

    /// Skip the traceability matrix
    #[arg(long)]
    no_matrix: bool,

    /// LaTeX template data file
    ///
    /// The template is named after the file, so `custom.yml` uses the
    /// document class `template/custom.cls`.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Latex,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => Self::Markdown,
            OutputFormat::Latex => Self::Latex,
        }
    }
}

impl Publish {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut config = load_config(root, self.config.as_deref())?;
        self.overrides.apply(&mut config);
        if self.toc {
            config.toc = true;
        }
        if self.no_matrix {
            config.matrix = false;
        }

        let template = match &self.template {
            Some(path) => Template::load(path)?,
            None => Template::default(),
        };

        let tree = load_tree(root)?;
        let context = Context::new(config, root);
        let written = publish_tree(&tree, &self.out, self.format.into(), &context, &template)
            .with_context(|| format!("failed to publish to {}", self.out.display()))?;

        for path in &written {
            println!("{} {}", "published".success(), path.display());
        }
        Ok(())
    }
}
