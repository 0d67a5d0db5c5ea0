//! Markdown to LaTeX conversion of item text.
//!
//! Item bodies are written in a small Markdown dialect: emphasis, links,
//! images, inline and fenced code, `PlantUML` diagrams, `$$` math, pipe tables
//! and nested lists. [`render`] turns such a body into LaTeX one line at a
//! time, and [`convert`] handles the inline markup of a single line.

mod inline;
pub use inline::convert;

mod list;
pub use list::{ListKind, ListLine, ListRenderer, MAX_LIST_DEPTH};

mod pipeline;
pub use pipeline::{Render, render, render_to_vec};

mod span;

/// Errors that abort the conversion of a text body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// A `PlantUML` diagram was opened without a `title="..."` attribute.
    #[error("plantuml diagram has no title attribute: {line}")]
    MissingTitle {
        /// The offending opening line.
        line: String,
    },

    /// More than one `$$ ... $$` pair on a single line.
    #[error("only one math environment is supported per line: {line}")]
    MultipleMathEnvironments {
        /// The offending line.
        line: String,
    },
}
