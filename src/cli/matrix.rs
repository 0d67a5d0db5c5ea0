use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::Parser;
use reqpub::publish::matrix;
use tracing::instrument;

use super::{Overrides, load_config, load_tree, publish::OutputFormat, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Write the traceability matrix as CSV and Markdown or LaTeX")]
pub struct Matrix {
    /// Directory to write the matrix into
    out: PathBuf,

    /// Format of the matrix written alongside the CSV
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Publishing configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

impl Matrix {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut config = load_config(root, self.config.as_deref())?;
        self.overrides.apply(&mut config);

        let tree = load_tree(root)?;
        fs::create_dir_all(&self.out)
            .with_context(|| format!("failed to create {}", self.out.display()))?;

        let written = matrix::write(&tree, &self.out, self.format.into(), &config)?;
        for path in &written {
            println!("{} {}", "written".success(), path.display());
        }
        Ok(())
    }
}
