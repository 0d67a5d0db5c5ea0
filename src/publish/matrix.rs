//! The traceability matrix, as CSV, Markdown and LaTeX.

use std::path::{Path, PathBuf};

use super::{Format, MarkdownPublisher, PublishError, Publisher, write_lines};
use crate::{
    convert::convert,
    domain::{PublishConfig, TraceRow, Tree},
};

/// File name of the CSV matrix.
pub const CSV_FILE: &str = "traceability.csv";
/// File name of the Markdown matrix.
pub const MARKDOWN_FILE: &str = "traceability.md";
/// File name of the LaTeX matrix, included by the wrapper document.
pub const LATEX_FILE: &str = "traceability.tex";

/// Writes the CSV matrix and the matrix in the output format into `dir`.
///
/// # Errors
///
/// Fails if a file cannot be written.
pub fn write(
    tree: &Tree,
    dir: &Path,
    format: Format,
    config: &PublishConfig,
) -> Result<Vec<PathBuf>, PublishError> {
    let rows = tree.traceability();

    let csv_path = dir.join(CSV_FILE);
    write_csv(tree, &rows, &csv_path)?;

    let (name, lines) = match format {
        Format::Markdown => (MARKDOWN_FILE, markdown_lines(tree, &rows, config)),
        Format::Latex => (LATEX_FILE, latex_lines(tree, &rows)),
    };
    let path = dir.join(name);
    write_lines(&path, &lines)?;

    Ok(vec![csv_path, path])
}

/// Writes the matrix as CSV, with a header row of document prefixes.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_csv(tree: &Tree, rows: &[TraceRow<'_>], path: &Path) -> Result<(), PublishError> {
    let error = |source| PublishError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(error)?;
    writer
        .write_record(tree.documents().iter().map(|document| document.prefix().as_str()))
        .map_err(error)?;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.map_or("", |view| view.item.uid().as_str())))
            .map_err(error)?;
    }
    writer.flush().map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("published {}", path.display());
    Ok(())
}

/// The matrix as a Markdown table of item links.
#[must_use]
pub fn markdown_lines(tree: &Tree, rows: &[TraceRow<'_>], config: &PublishConfig) -> Vec<String> {
    let documents = tree.documents();
    let header: Vec<String> = documents
        .iter()
        .map(|document| format!("[{prefix}]({prefix}.md)", prefix = document.prefix()))
        .collect();

    let mut lines = vec![
        "# Traceability Matrix".to_string(),
        String::new(),
        table_row(&header),
        format!("|{}", " --- |".repeat(documents.len())),
    ];
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                cell.map(|view| MarkdownPublisher.format_item_link(view, config))
                    .unwrap_or_default()
            })
            .collect();
        lines.push(table_row(&cells));
    }
    lines
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// The matrix as a LaTeX `longtable` of hyperlinks.
#[must_use]
pub fn latex_lines(tree: &Tree, rows: &[TraceRow<'_>]) -> Vec<String> {
    let documents = tree.documents();
    let columns = documents.len();
    let head = documents
        .iter()
        .map(|document| format!(r"\textbf{{{}}}", convert(document.prefix())))
        .collect::<Vec<_>>()
        .join(" & ");

    let mut lines = vec![
        format!(r"\begin{{longtable}}{{{}|}}", "|l".repeat(columns)),
        r"\caption{Traceability matrix.}\label{tbl:trace}\zlabel{tbl:trace}\\".to_string(),
        format!(r"{head}\\ \hline"),
        r"\endfirsthead".to_string(),
        r"\caption{\textit{(Continued)} Traceability matrix.}\\ \hline".to_string(),
        format!(r"{head}\\ \hline"),
        r"\endhead".to_string(),
        format!(r"\multicolumn{{{columns}}}{{r}}{{\textit{{Continued on next page.}}}}\\"),
        r"\endfoot".to_string(),
        r"\endlastfoot".to_string(),
    ];
    for row in rows {
        let cells = row
            .iter()
            .map(|cell| {
                cell.map_or_else(
                    || " ".to_string(),
                    |view| {
                        let uid = view.item.uid();
                        format!(r"\hyperref[{uid}]{{{}}}", convert(uid))
                    },
                )
            })
            .collect::<Vec<_>>()
            .join(" & ");
        lines.push(format!(r"{cells}\\ \hline"));
    }
    lines.push(r"\end{longtable}".to_string());
    lines
}
