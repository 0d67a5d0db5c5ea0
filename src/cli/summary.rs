use std::path::Path;

use clap::Parser;
use reqpub::{ItemView, Tree};
use tracing::instrument;

use super::{load_tree, terminal::Colorize};

#[derive(Debug, Parser, Default)]
#[command(about = "Show the documents of the tree and their item counts")]
pub struct Summary {
    /// Also print the rows of the traceability matrix
    #[arg(long)]
    matrix: bool,
}

impl Summary {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let tree = load_tree(root)?;

        if tree.documents().is_empty() {
            println!(
                "No documents found. Each document lives in a directory with a '.doorstop.yml' file."
            );
            return Ok(());
        }

        Self::print_documents(&tree);

        let rows = tree.traceability();
        if tree.documents().len() > 1 {
            let unlinked = rows
                .iter()
                .filter(|row| row.iter().flatten().count() == 1)
                .count();
            println!();
            if unlinked == 0 {
                println!("{}", "Every requirement is linked".success());
            } else {
                println!(
                    "{}",
                    format!("{unlinked} requirement(s) without links").warning()
                );
            }
        }

        if self.matrix {
            println!();
            Self::print_matrix(&tree);
        }
        Ok(())
    }

    fn print_documents(tree: &Tree) {
        println!("{}", "Documents".info());
        println!("{}", "─────────".dim());
        println!("{:<12} {:<12} {:>6} {:>6}", "Prefix", "Parent", "Items", "Active");
        for document in tree.documents() {
            let parent = document
                .parent
                .as_ref()
                .map_or_else(|| "–".dim(), ToString::to_string);
            println!(
                "{:<12} {:<12} {:>6} {:>6}",
                document.prefix().as_str(),
                parent,
                document.items().len(),
                document.active_items().count()
            );
        }
        println!("Total: {}", tree.len());
    }

    fn print_matrix(tree: &Tree) {
        let header: Vec<&str> = tree
            .documents()
            .iter()
            .map(|document| document.prefix().as_str())
            .collect();
        println!("{}", header.join("\t").info());
        for row in tree.traceability() {
            let cells: Vec<String> = row.iter().copied().map(cell).collect();
            println!("{}", cells.join("\t"));
        }
    }
}

fn cell(view: Option<ItemView<'_>>) -> String {
    view.map_or_else(|| "–".dim(), |view| view.item.uid().to_string())
}
