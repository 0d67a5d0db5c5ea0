//! Markdown list rendering.
//!
//! Lists are tracked by indentation. Every distinct indentation opens a new
//! nested environment; LaTeX only supports four levels out of the box, so the
//! published template defines `itemizeDeep` and `enumerateDeep` with nine.

use std::sync::LazyLock;

use regex::Regex;

/// The deepest list nesting the LaTeX template defines styles for.
pub const MAX_LIST_DEPTH: usize = 9;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:([*+-])|\d+\.)\s(.*)$").expect("valid list marker regex")
});

/// The kind of a (nested) list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `-`, `*` or `+` markers.
    Unordered,
    /// `1.`, `2.`, ... markers.
    Ordered,
}

impl ListKind {
    /// The line opening a nested environment of this kind.
    #[must_use]
    pub const fn begin(self) -> &'static str {
        match self {
            Self::Unordered => r"\begin{itemizeDeep}",
            Self::Ordered => r"\begin{enumerateDeep}",
        }
    }

    /// The line closing a nested environment of this kind.
    #[must_use]
    pub const fn end(self) -> &'static str {
        match self {
            Self::Unordered => r"\end{itemizeDeep}",
            Self::Ordered => r"\end{enumerateDeep}",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Level {
    kind: ListKind,
    indent: usize,
}

/// The result of passing one line through the [`ListRenderer`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListLine {
    /// Environment boundaries to emit before the line.
    pub before: Vec<String>,
    /// The (possibly rewritten) line itself.
    pub line: String,
    /// Environment boundaries to emit after the line.
    pub after: Vec<String>,
    /// Whether the line is part of a list, in which case no hard line break
    /// may be appended to it.
    pub suppress_break: bool,
}

/// Rewrites Markdown list items into nested LaTeX list environments.
#[derive(Debug, Default)]
pub struct ListRenderer {
    levels: Vec<Level>,
}

impl ListRenderer {
    /// Creates a renderer with no open lists.
    #[must_use]
    pub const fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// The current nesting depth (0 when outside of any list).
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Processes one line.
    ///
    /// `next_line` is the raw line that follows, or `None` at the end of the
    /// text. A list ends at the first blank line, so a blank (or missing) next
    /// line closes every open level after this one.
    pub fn process(&mut self, line: &str, next_line: Option<&str>) -> ListLine {
        let mut before = Vec::new();

        let line = if let Some(caps) = MARKER.captures(line) {
            let indent = caps[1].chars().count();
            let kind = if caps.get(2).is_some() {
                ListKind::Unordered
            } else {
                ListKind::Ordered
            };
            self.enter(kind, indent, &mut before);
            format!(r"\item {}", caps[3].trim_start())
        } else if self.levels.is_empty() {
            return ListLine {
                line: line.to_owned(),
                ..ListLine::default()
            };
        } else {
            // continuation of the current item
            line.to_owned()
        };

        let after = if next_line.is_none_or(|next| next.trim().is_empty()) {
            self.finish()
        } else {
            Vec::new()
        };

        ListLine {
            before,
            line,
            after,
            suppress_break: true,
        }
    }

    /// Closes every open level, innermost first.
    pub fn finish(&mut self) -> Vec<String> {
        self.levels
            .drain(..)
            .rev()
            .map(|level| level.kind.end().to_owned())
            .collect()
    }

    fn enter(&mut self, kind: ListKind, indent: usize, before: &mut Vec<String>) {
        loop {
            let Some(&top) = self.levels.last() else {
                self.open(kind, indent, before);
                return;
            };

            if indent > top.indent {
                if self.levels.len() < MAX_LIST_DEPTH {
                    self.open(kind, indent, before);
                } else {
                    tracing::warn!(
                        "lists nest deeper than {MAX_LIST_DEPTH} levels, keeping item at level \
                         {MAX_LIST_DEPTH}"
                    );
                }
                return;
            }

            if indent < top.indent {
                self.levels.pop();
                before.push(top.kind.end().to_owned());
                continue;
            }

            if top.kind != kind {
                self.levels.pop();
                before.push(top.kind.end().to_owned());
                self.open(kind, indent, before);
            }
            return;
        }
    }

    fn open(&mut self, kind: ListKind, indent: usize, before: &mut Vec<String>) {
        self.levels.push(Level { kind, indent });
        before.push(kind.begin().to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds every line through a renderer, flattening the output.
    fn render(lines: &[&str]) -> Vec<String> {
        let mut renderer = ListRenderer::new();
        let mut out = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let rendered = renderer.process(line, lines.get(i + 1).copied());
            out.extend(rendered.before);
            out.push(rendered.line);
            out.extend(rendered.after);
        }
        out.extend(renderer.finish());
        out
    }

    #[test]
    fn nested_unordered_list() {
        assert_eq!(
            render(&["- a", "  - b", "- c"]),
            [
                r"\begin{itemizeDeep}",
                r"\item a",
                r"\begin{itemizeDeep}",
                r"\item b",
                r"\end{itemizeDeep}",
                r"\item c",
                r"\end{itemizeDeep}",
            ]
        );
    }

    #[test]
    fn ordered_list() {
        assert_eq!(
            render(&["1. first", "2. second"]),
            [
                r"\begin{enumerateDeep}",
                r"\item first",
                r"\item second",
                r"\end{enumerateDeep}",
            ]
        );
    }

    #[test]
    fn kind_change_at_same_depth_reopens() {
        assert_eq!(
            render(&["- a", "1. b"]),
            [
                r"\begin{itemizeDeep}",
                r"\item a",
                r"\end{itemizeDeep}",
                r"\begin{enumerateDeep}",
                r"\item b",
                r"\end{enumerateDeep}",
            ]
        );
    }

    #[test]
    fn blank_line_ends_the_list() {
        let mut renderer = ListRenderer::new();
        let first = renderer.process("* a", Some(""));
        assert_eq!(first.before, [r"\begin{itemizeDeep}"]);
        assert_eq!(first.line, r"\item a");
        assert_eq!(first.after, [r"\end{itemizeDeep}"]);
        assert_eq!(renderer.depth(), 0);
    }

    #[test]
    fn continuation_lines_stay_in_the_item() {
        let mut renderer = ListRenderer::new();
        renderer.process("+ item", Some("continued"));
        let continued = renderer.process("continued", Some("more"));
        assert!(continued.before.is_empty());
        assert_eq!(continued.line, "continued");
        assert!(continued.suppress_break);
        assert_eq!(renderer.depth(), 1);
    }

    #[test]
    fn text_outside_lists_is_untouched() {
        let mut renderer = ListRenderer::new();
        let line = renderer.process("just text", None);
        assert_eq!(line.line, "just text");
        assert!(line.before.is_empty());
        assert!(line.after.is_empty());
        assert!(!line.suppress_break);
    }

    #[test]
    fn dedent_closes_several_levels() {
        let out = render(&["- a", "  - b", "    - c", "- d"]);
        let closes_before_d = out
            .iter()
            .skip_while(|line| *line != r"\item c")
            .skip(1)
            .take_while(|line| *line != r"\item d")
            .count();
        assert_eq!(closes_before_d, 2);
    }

    #[test]
    fn nesting_stops_at_nine_levels() {
        let lines: Vec<String> = (0..12)
            .map(|depth| format!("{}- level {depth}", "  ".repeat(depth)))
            .collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

        let mut renderer = ListRenderer::new();
        for (i, line) in lines.iter().enumerate() {
            renderer.process(line, lines.get(i + 1).copied().or(Some("x")));
        }
        assert_eq!(renderer.depth(), MAX_LIST_DEPTH);
        assert_eq!(renderer.finish().len(), MAX_LIST_DEPTH);
    }
}
