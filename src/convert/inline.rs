//! Inline markup conversion for a single line of text.
//!
//! The converter walks the line left to right and rewrites the small Markdown
//! dialect used in item bodies (emphasis, links, line breaks and backslash
//! escapes) into LaTeX, escaping reserved characters on the way.

use std::sync::LazyLock;

use regex::Regex;

/// Inline code that has already been rewritten by the line pipeline.
///
/// Its content is verbatim and must not be escaped again.
static VERBATIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\lstinline`[^`]*`").expect("valid verbatim regex"));

/// A Markdown link anchored at the current position.
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]\(([^)\s]*)\)").expect("valid link regex"));

/// Convert a single line of Markdown text into LaTeX.
///
/// Reserved characters (`& % $ # _ ~ ^`) are escaped, `[label](target)`
/// becomes `\href{target}{label}`, `**strong**` and `*emphasis*` become
/// `\textbf` and `\textit`, and `<br>` becomes `\par`.
///
/// Backslash escapes for Markdown punctuation (`\*`, `\[`, `\]`) yield the
/// literal character, characters that are already escaped for LaTeX (`\_`,
/// `\#`, ...) are kept as they are, and any other backslash passes through so
/// that authors can write LaTeX macros directly.
///
/// The conversion is *not* idempotent. Converting already converted output
/// can corrupt it, so every logical line must be converted exactly once.
#[must_use]
pub fn convert(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / 4);
    let mut last = 0;
    for verbatim in VERBATIM.find_iter(line) {
        convert_text(&line[last..verbatim.start()], &mut out);
        out.push_str(verbatim.as_str());
        last = verbatim.end();
    }
    convert_text(&line[last..], &mut out);
    out
}

fn convert_text(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let consumed = match c {
            '\\' => backslash(rest, out),
            '*' => emphasis(rest, out),
            '[' => link(rest, out),
            '<' if rest.starts_with("<br>") => {
                out.push_str(r"\par ");
                "<br>".len()
            }
            _ => {
                push_escaped(c, out);
                c.len_utf8()
            }
        };
        rest = &rest[consumed..];
    }
}

/// Handles a backslash at the start of `rest`, returning the bytes consumed.
fn backslash(rest: &str, out: &mut String) -> usize {
    match rest[1..].chars().next() {
        Some(c @ ('*' | '[' | ']')) => {
            out.push(c);
            1 + c.len_utf8()
        }
        Some(c @ ('&' | '%' | '$' | '#' | '_' | '{' | '}')) => {
            out.push('\\');
            out.push(c);
            1 + c.len_utf8()
        }
        _ => {
            out.push('\\');
            1
        }
    }
}

/// Handles `**strong**` and `*emphasis*` at the start of `rest`.
fn emphasis(rest: &str, out: &mut String) -> usize {
    if let Some(inner) = rest.strip_prefix("**") {
        if let Some(end) = inner.find("**").filter(|&end| opens_span(&inner[..end])) {
            out.push_str(r"\textbf{");
            convert_text(&inner[..end], out);
            out.push('}');
            return 2 + end + 2;
        }
    }

    let inner = &rest[1..];
    if let Some(end) = inner.find('*').filter(|&end| opens_span(&inner[..end])) {
        out.push_str(r"\textit{");
        convert_text(&inner[..end], out);
        out.push('}');
        return 1 + end + 1;
    }

    out.push('*');
    1
}

/// Emphasis needs content that does not start with whitespace, so list
/// markers such as `* item` are left untouched.
fn opens_span(inner: &str) -> bool {
    inner.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Handles `[label](target)` at the start of `rest`.
fn link(rest: &str, out: &mut String) -> usize {
    let Some(caps) = LINK.captures(rest) else {
        out.push('[');
        return 1;
    };

    out.push_str(r"\href{");
    for c in caps[2].chars() {
        if matches!(c, '#' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("}{");
    convert_text(&caps[1], out);
    out.push('}');

    caps[0].len()
}

fn push_escaped(c: char, out: &mut String) {
    match c {
        '&' | '%' | '$' | '#' | '_' => {
            out.push('\\');
            out.push(c);
        }
        '~' => out.push_str(r"\textasciitilde{}"),
        '^' => out.push_str(r"\textasciicircum{}"),
        _ => out.push(c),
    }
}
