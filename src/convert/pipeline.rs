//! The line-stream driver.
//!
//! Each input line runs through a fixed sequence of stages. A stage either
//! consumes the line ([`Step::Done`]) or hands it, possibly rewritten and
//! annotated, to the next stage ([`Step::Next`]). Whatever survives the last
//! stage is appended to the output.

use std::{collections::VecDeque, iter::Peekable, sync::LazyLock};

use regex::Regex;

use super::{
    ConvertError,
    inline::convert,
    list::ListRenderer,
    span::{
        Block, CODE_END, DIAGRAM_END, Diagram, HARD_BREAK, Math, Table, code_begin, code_fence,
    },
};

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code regex"));

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]*)\)").expect("valid image regex"));

/// Stands in for an escaped backtick while inline code is rewritten.
const ESCAPED_BACKTICK: &str = "\u{0}BACKTICK\u{0}";

/// Renders the lines of a text body as LaTeX.
///
/// The returned iterator is lazy and single-pass. All conversion state lives
/// in the iterator, so separate calls never share anything. Spans that are
/// still open after the last line (code, diagrams, tables and lists) are
/// closed; an unterminated math span is not.
///
/// After yielding an error the iterator is exhausted.
pub fn render<I>(lines: I) -> Render<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Render {
        lines: lines.into_iter().peekable(),
        previous: None,
        converter: Converter::default(),
        pending: VecDeque::new(),
        done: false,
    }
}

/// Renders a text body, collecting the output lines.
///
/// # Errors
///
/// Returns the first [`ConvertError`] raised by the text.
pub fn render_to_vec<I>(lines: I) -> Result<Vec<String>, ConvertError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    render(lines).collect()
}

/// Iterator over rendered lines, created by [`render`].
pub struct Render<I: Iterator> {
    lines: Peekable<I>,
    previous: Option<String>,
    converter: Converter,
    pending: VecDeque<String>,
    done: bool,
}

impl<I> Iterator for Render<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<String, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.done {
                return None;
            }

            let Some(line) = self.lines.next() else {
                self.done = true;
                return None;
            };
            let line = line.as_ref();
            let next = self.lines.peek().map(|next| next.as_ref().to_owned());

            let cursor = Cursor {
                previous: self.previous.as_deref(),
                next: next.as_deref(),
            };
            let mut out = Vec::new();
            if let Err(error) = self.converter.feed(line, &cursor, &mut out) {
                self.done = true;
                return Some(Err(error));
            }
            if next.is_none() {
                self.converter.finish(&mut out);
                self.done = true;
            }

            self.pending.extend(out);
            self.previous = Some(line.to_owned());
        }
    }
}

impl<I> std::iter::FusedIterator for Render<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

/// The raw lines around the one being converted.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    previous: Option<&'a str>,
    next: Option<&'a str>,
}

impl Cursor<'_> {
    fn next_is_blank(&self) -> bool {
        self.next.is_some_and(|next| next.trim().is_empty())
    }
}

/// A line travelling through the pipeline, with the annotations earlier
/// stages attached to it.
#[derive(Debug)]
struct Line {
    text: String,
    /// Set by the list stage for lines inside a list.
    suppress_break: bool,
    /// Lines to emit directly after this one.
    trailing: Vec<String>,
}

enum Step {
    /// The line has been fully handled.
    Done,
    /// Pass the line on to the next stage.
    Next(Line),
}

type Stage = fn(&mut Converter, Line, &Cursor<'_>, &mut Vec<String>) -> Result<Step, ConvertError>;

/// The stages, in priority order.
const STAGES: [Stage; 8] = [
    Converter::diagram,
    Converter::code,
    Converter::inline_code,
    Converter::image,
    Converter::math,
    Converter::list,
    Converter::table,
    Converter::hard_break,
];

/// Conversion state for a single text body.
#[derive(Debug, Default)]
struct Converter {
    block: Block,
    math: Math,
    table: Table,
    lists: ListRenderer,
    diagrams: usize,
}

// Every stage shares the `Stage` signature, whether or not it needs all of it.
#[allow(clippy::unnecessary_wraps, clippy::unused_self)]
impl Converter {
    fn feed(
        &mut self,
        raw: &str,
        cursor: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<(), ConvertError> {
        let mut line = Line {
            text: raw.to_owned(),
            suppress_break: false,
            trailing: Vec::new(),
        };

        for stage in STAGES {
            match stage(self, line, cursor, out)? {
                Step::Done => return Ok(()),
                Step::Next(next) => line = next,
            }
        }

        out.push(line.text);
        out.append(&mut line.trailing);
        Ok(())
    }

    /// Closes everything still open at the end of the text.
    fn finish(&mut self, out: &mut Vec<String>) {
        match std::mem::take(&mut self.block) {
            Block::Prose => {}
            Block::Code => out.push(CODE_END.to_owned()),
            Block::Diagram(diagram) => {
                tracing::debug!("closing unterminated diagram");
                out.push(DIAGRAM_END.to_owned());
                out.push(diagram.process());
            }
        }
        self.table.close(out);
        out.extend(self.lists.finish());
    }

    fn diagram(
        &mut self,
        line: Line,
        _: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        if matches!(self.block, Block::Prose) && Diagram::opens(&line.text) {
            let diagram = Diagram::open(&line.text, self.diagrams + 1)?;
            self.diagrams += 1;
            tracing::debug!("opening diagram {}", self.diagrams);
            self.table.close(out);
            out.push(diagram.reference());
            out.push(diagram.begin());
            self.block = Block::Diagram(diagram);
            return Ok(Step::Done);
        }

        let Block::Diagram(diagram) = &self.block else {
            return Ok(Step::Next(line));
        };

        let closes = Diagram::closes(&line.text);
        out.push(line.text);
        if closes {
            out.push(DIAGRAM_END.to_owned());
            out.push(diagram.process());
            self.block = Block::Prose;
        }
        Ok(Step::Done)
    }

    fn code(
        &mut self,
        line: Line,
        cursor: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        if let Some(language) = code_fence(&line.text) {
            // The fence that closed the diagram.
            if cursor.previous.is_some_and(Diagram::closes) {
                return Ok(Step::Done);
            }

            if matches!(self.block, Block::Code) {
                out.push(CODE_END.to_owned());
                self.block = Block::Prose;
            } else {
                self.table.close(out);
                out.push(code_begin(language));
                self.block = Block::Code;
            }
            return Ok(Step::Done);
        }

        if matches!(self.block, Block::Code) {
            out.push(line.text);
            return Ok(Step::Done);
        }
        Ok(Step::Next(line))
    }

    fn inline_code(
        &mut self,
        mut line: Line,
        _: &Cursor<'_>,
        _: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        if line.text.contains('`') {
            let text = line.text.replace(r"\`", ESCAPED_BACKTICK);
            let text = INLINE_CODE.replace_all(&text, r"\lstinline`${1}`");
            line.text = text.replace(ESCAPED_BACKTICK, r"\`{}");
        }
        Ok(Step::Next(line))
    }

    fn image(
        &mut self,
        mut line: Line,
        _: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        if !IMAGE.is_match(&line.text) {
            return Ok(Step::Next(line));
        }

        for caps in IMAGE.captures_iter(&line.text) {
            let (caption, path) = (&caps[1], &caps[2]);
            out.push(r"\begin{figure}[h!]".to_owned());
            out.push(r"\centering".to_owned());
            out.push(format!(r"\includegraphics[width=0.8\textwidth]{{{path}}}"));
            if !caption.is_empty() {
                out.push(format!(r"\caption{{{}}}", convert(caption)));
            }
            out.push(format!(r"\label{{fig:{path}}}"));
            out.push(r"\end{figure}".to_owned());
        }

        let rest = IMAGE.replace_all(&line.text, "").into_owned();
        if rest.trim().is_empty() {
            return Ok(Step::Done);
        }
        line.text = rest;
        Ok(Step::Next(line))
    }

    fn math(
        &mut self,
        mut line: Line,
        _: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        line.text = self.math.apply(&line.text)?;
        if self.math.is_open() {
            self.table.close(out);
            line.text.push_str(HARD_BREAK);
            out.push(line.text);
            return Ok(Step::Done);
        }
        Ok(Step::Next(line))
    }

    fn list(
        &mut self,
        mut line: Line,
        cursor: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        // A pipe-less line ends the table before any list boundary.
        if !line.text.contains('|') {
            self.table.close(out);
        }
        let rendered = self.lists.process(&line.text, cursor.next);
        out.extend(rendered.before);
        line.text = rendered.line;
        line.suppress_break |= rendered.suppress_break;
        line.trailing.extend(rendered.after);
        Ok(Step::Next(line))
    }

    fn table(
        &mut self,
        mut line: Line,
        cursor: &Cursor<'_>,
        out: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        line.text = self.table.feed(line.text, cursor.next, out);
        Ok(Step::Next(line))
    }

    fn hard_break(
        &mut self,
        mut line: Line,
        cursor: &Cursor<'_>,
        _: &mut Vec<String>,
    ) -> Result<Step, ConvertError> {
        if cursor.next_is_blank() && !line.suppress_break && takes_break(&line.text) {
            line.text.push_str(HARD_BREAK);
        }
        Ok(Step::Next(line))
    }
}

/// Whether a hard line break may end `line`.
///
/// Empty lines, lines that start with a macro or environment and lines that
/// already end in a break are left alone.
fn takes_break(line: &str) -> bool {
    !line.trim().is_empty() && !line.trim_start().starts_with('\\') && !line.ends_with(HARD_BREAK)
}
