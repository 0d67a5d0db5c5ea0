use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::Parser;
use reqpub::convert::render;
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Convert a Markdown text body to LaTeX")]
pub struct Convert {
    /// Markdown file to convert (reads standard input when omitted)
    file: Option<PathBuf>,
}

impl Convert {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let input = match &self.file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .context("failed to read standard input")?;
                input
            }
        };

        let mut stdout = io::stdout().lock();
        for line in render(input.lines()) {
            writeln!(stdout, "{}", line?)?;
        }
        Ok(())
    }
}
