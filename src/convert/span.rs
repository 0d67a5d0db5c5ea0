//! State machines for constructs that span several lines.
//!
//! Code blocks and diagrams are verbatim blocks and can never be open at the
//! same time, which [`Block`] encodes directly. Math and tables are tracked
//! separately because an escaped table row may also contain math.

use std::sync::LazyLock;

use regex::Regex;

use super::{ConvertError, inline::convert};

static DIAGRAM_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`*plantuml(?:\s|$)").expect("valid diagram regex"));

static DIAGRAM_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="([^"]*)""#).expect("valid title regex"));

static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?\s*$").expect("valid separator regex")
});

/// The marker closing a diagram description.
const DIAGRAM_CLOSE: &str = "@enduml";

pub(super) const DIAGRAM_END: &str = r"\end{plantuml}";
pub(super) const CODE_END: &str = r"\end{lstlisting}";
pub(super) const TABLE_END: &str = r"\end{longtable}";
pub(super) const HARD_BREAK: &str = r"\\";

/// The verbatim block the cursor is currently in.
#[derive(Debug, Default)]
pub(super) enum Block {
    #[default]
    Prose,
    Code,
    Diagram(Diagram),
}

/// An open `PlantUML` diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Diagram {
    number: usize,
    title: String,
    slug: String,
}

impl Diagram {
    /// Whether `line` opens a diagram.
    pub(super) fn opens(line: &str) -> bool {
        DIAGRAM_OPEN.is_match(line)
    }

    /// Whether `line` closes a diagram.
    pub(super) fn closes(line: &str) -> bool {
        line.contains(DIAGRAM_CLOSE)
    }

    /// Parses the opening line of the `number`th diagram.
    pub(super) fn open(line: &str, number: usize) -> Result<Self, ConvertError> {
        let title = DIAGRAM_TITLE
            .captures(line)
            .map(|caps| caps[1].to_owned())
            .ok_or_else(|| ConvertError::MissingTitle {
                line: line.to_owned(),
            })?;
        let slug = title.split_whitespace().collect::<Vec<_>>().join("-");

        Ok(Self {
            number,
            title,
            slug,
        })
    }

    /// Forward reference to the figure the diagram will be rendered into.
    pub(super) fn reference(&self) -> String {
        format!(r"\hyperref[fig:plant{}]{{{}}}", self.number, convert(&self.title))
    }

    pub(super) fn begin(&self) -> String {
        format!(r"\begin{{plantuml}}{{{}}}", self.slug)
    }

    /// The directive rendering the finished diagram as a numbered figure.
    pub(super) fn process(&self) -> String {
        format!(
            r"\process{{{}}}{{0.8\textwidth}}{{{}}}{{{}}}",
            self.slug,
            convert(&self.title),
            self.number
        )
    }

    #[cfg(test)]
    pub(super) fn slug(&self) -> &str {
        &self.slug
    }
}

/// Returns the language tag (possibly empty) if `line` is a code fence.
pub(super) fn code_fence(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("```").map(str::trim)
}

pub(super) fn code_begin(language: &str) -> String {
    if language.is_empty() {
        r"\begin{lstlisting}".to_owned()
    } else {
        format!(r"\begin{{lstlisting}}[language={language}]")
    }
}

/// Display math delimited by `$$`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) enum Math {
    #[default]
    Closed,
    Open,
}

impl Math {
    pub(super) const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Converts one line, toggling the math state on a lone `$$`.
    ///
    /// Text outside of math is escaped, math content is passed through.
    pub(super) fn apply(&mut self, line: &str) -> Result<String, ConvertError> {
        let segments: Vec<&str> = line.split("$$").collect();

        let converted = match (segments.as_slice(), *self) {
            ([text], Self::Closed) => convert(text),
            ([math], Self::Open) => (*math).to_owned(),
            ([math, text], Self::Open) => {
                *self = Self::Closed;
                format!("{math}${}", convert(text))
            }
            ([text, math], Self::Closed) => {
                *self = Self::Open;
                format!("{}${math}", convert(text))
            }
            ([before, math, after], _) => {
                format!("{}${math}${}", convert(before), convert(after))
            }
            _ => {
                return Err(ConvertError::MultipleMathEnvironments {
                    line: line.to_owned(),
                });
            }
        };

        Ok(converted)
    }
}

/// A Markdown pipe table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) enum Table {
    #[default]
    Outside,
    /// The header row has been emitted, the separator row is next.
    HeaderPending { columns: usize },
    Body { columns: usize },
}

impl Table {
    /// Processes one (already escaped) line.
    ///
    /// Any line containing a pipe is treated as a table row. The first line
    /// without one ends the table, and the closing line is pushed to `out`
    /// before the returned line.
    pub(super) fn feed(
        &mut self,
        line: String,
        next: Option<&str>,
        out: &mut Vec<String>,
    ) -> String {
        if !line.contains('|') {
            self.close(out);
            return line;
        }

        match *self {
            Self::Outside => {
                let header = cells(&line);
                let columns = header.len();
                let alignments = next.and_then(alignments).unwrap_or_default();
                let spec: String = (0..columns)
                    .map(|i| alignments.get(i).copied().unwrap_or('l'))
                    .collect();

                tracing::debug!("opening table with {columns} columns");
                out.push(format!(r"\begin{{longtable}}{{{spec}}}"));
                *self = Self::HeaderPending { columns };

                let header: Vec<String> = header
                    .into_iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            String::new()
                        } else {
                            format!(r"\textbf{{{cell}}}")
                        }
                    })
                    .collect();
                row(&header, columns)
            }
            Self::HeaderPending { columns } => {
                *self = Self::Body { columns };
                r"\hline".to_owned()
            }
            Self::Body { columns } => row(&cells(&line), columns),
        }
    }

    /// Ends the table if one is open.
    pub(super) fn close(&mut self, out: &mut Vec<String>) {
        if *self != Self::Outside {
            tracing::debug!("closing table");
            out.push(TABLE_END.to_owned());
            *self = Self::Outside;
        }
    }
}

/// Splits a row into trimmed cells, ignoring leading and trailing pipes.
fn cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn row<S: AsRef<str>>(cells: &[S], columns: usize) -> String {
    let mut cells: Vec<&str> = cells.iter().map(|cell| cell.as_ref()).collect();
    if cells.len() < columns {
        cells.resize(columns, "");
    }
    format!(r"{} \\", cells.join(" & "))
}

/// Column alignments from a separator row such as `| :-- | :-: | --: |`.
fn alignments(separator: &str) -> Option<Vec<char>> {
    if !TABLE_SEPARATOR.is_match(separator) {
        return None;
    }

    let alignments = cells(separator)
        .into_iter()
        .map(|cell| match (cell.starts_with(':'), cell.ends_with(':')) {
            (true, true) => 'c',
            (false, true) => 'r',
            _ => 'l',
        })
        .collect();
    Some(alignments)
}
