//! LaTeX output.
//!
//! Item text goes through the line-stream driver in [`crate::convert`].
//! Headings, labels and links are built here.

use super::{
    Context, ExternalRef, PublishError, Publisher, Subsections, capitalize, document_level,
};
use crate::{
    convert::{convert, render_to_vec},
    domain::{Document, Item, ItemView, PublishConfig, Tree, references::Location},
};

/// Publishes documents as LaTeX, to be included by the wrapper document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexPublisher;

impl Publisher for LatexPublisher {
    fn lines(
        &self,
        document: &Document,
        tree: &Tree,
        context: &Context,
    ) -> Result<Vec<String>, PublishError> {
        let config = context.config();
        let mut lines = Vec::new();
        let mut subsections = Subsections::default();

        for (index, item) in document.active_items().enumerate() {
            if index == 0 {
                lines.push(format!(
                    r"\section{{Level- {}}}",
                    document_level(document, item)
                ));
            } else {
                lines.push(r"\vspace{0.8cm}".to_string());
            }
            if let Some((category, subcategory)) = subsections.enter(item.uid()) {
                lines.push(format!(r"\subsection{{{category}- {subcategory}}}"));
            }

            let render = |text: &[&str]| {
                render_to_vec(text).map_err(|source| PublishError::Convert {
                    uid: item.uid().clone(),
                    source,
                })
            };

            if item.is_heading() {
                let mut text: Vec<&str> = item.lines().collect();
                if !item.header.is_empty() {
                    text.insert(0, &item.header);
                }
                let title = text.first().map_or_else(String::new, |line| convert(line));
                lines.push(format!(
                    r"\subsubsection{{{title}}}{}",
                    self.format_attr_list(item, true)
                ));
                lines.extend(render(text.get(1..).unwrap_or_default())?);
            } else {
                lines.push(format!(
                    r"\subsubsection{{{}}}{}",
                    body_label(item, config),
                    self.format_attr_list(item, true)
                ));

                if !item.text.is_empty() {
                    let text: Vec<&str> = item.lines().collect();
                    lines.push(String::new());
                    lines.extend(render(&text)?);
                    lines.push(String::new());
                }

                for name in &document.publish {
                    if let Some(value) = item.attribute(name) {
                        let value: Vec<&str> = value.lines().collect();
                        lines.push(format!(r"\textbf{{{}: }}", capitalize(name)));
                        lines.extend(render(&value)?);
                        lines.push(String::new());
                    }
                }

                if let Some(reference) = context.item_ref(item)? {
                    lines.push(self.format_ref(&reference));
                }
                let references = context.item_references(item)?;
                lines.extend(self.format_references(&references));

                lines.extend(self.link_lines(item, tree, config));
            }
            lines.push(String::new());
        }
        lines.push(String::new());
        Ok(lines)
    }

    fn format_attr_list(&self, item: &Item, linkify: bool) -> String {
        if linkify {
            format!(r"\label{{{uid}}}\zlabel{{{uid}}}", uid = item.uid())
        } else {
            String::new()
        }
    }

    fn format_ref(&self, reference: &ExternalRef) -> String {
        match reference {
            ExternalRef::Located(Location {
                path,
                line: Some(line),
            }) => format!(r"\begin{{quote}} \verb|{path}| (line {line})\end{{quote}}"),
            ExternalRef::Located(Location { path, line: None })
            | ExternalRef::Unchecked(path) => {
                format!(r"\begin{{quote}} \verb|{path}|\end{{quote}}")
            }
        }
    }

    fn format_item_link(&self, item: ItemView<'_>, config: &PublishConfig) -> String {
        let uid = item.uid();
        if config.linkify {
            format!(r"\hyperref[{uid}]{{{}}}", convert(uid))
        } else {
            convert(uid)
        }
    }

    fn format_label_links(&self, label: &str, links: &str, linkify: bool) -> String {
        if linkify {
            format!(r"\textbf{{{label}}} {links}")
        } else {
            format!(r"\textbf{{{label} {links}}}")
        }
    }
}

/// The section title of a body item.
///
/// With headers enabled this is the header followed by the identifier or,
/// failing that, the identifier followed by the short name.
fn body_label(item: &Item, config: &PublishConfig) -> String {
    let uid = convert(item.uid());
    if !config.enable_headers {
        return uid;
    }
    if !item.header.is_empty() {
        return format!("{}{{ - {uid}}}", convert(&item.header));
    }
    let short_name = item.short_name().map(convert).unwrap_or_default();
    format!(r"{{{uid}- }}\small\textit{{{short_name}}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        convert::ConvertError,
        publish::tests::{context, sample_tree},
    };

    fn publish(prefix: &str, config: PublishConfig) -> Vec<String> {
        let tree = sample_tree();
        let document = tree.document(prefix).unwrap();
        LatexPublisher
            .lines(document, &tree, &context(config))
            .unwrap()
    }

    #[test]
    fn publishes_document() {
        let lines = publish("REQ", PublishConfig::default());
        assert_eq!(lines[0], r"\section{Level- 1.0}");
        assert_eq!(lines[1], r"\subsubsection{Overview}\label{REQ000}\zlabel{REQ000}");
        assert!(lines.contains(&r"\vspace{0.8cm}".to_string()));
        assert!(lines.contains(
            &r"\subsubsection{Login{ - REQ001}}\label{REQ001}\zlabel{REQ001}".to_string()
        ));
        assert!(lines.contains(&r"Users \textit{shall} log in.".to_string()));
        assert!(lines.contains(&r"\textbf{Owner: }".to_string()));
        assert!(lines.contains(&r"\textbf{Child links:} \hyperref[SYS001]{SYS001}".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some(""));
    }

    #[test]
    fn body_items_without_header_use_short_name() {
        let lines = publish("REQ", PublishConfig::default());
        assert!(lines.contains(
            &r"\subsubsection{{REQ002- }\small\textit{}}\label{REQ002}\zlabel{REQ002}".to_string()
        ));

        let plain = publish(
            "REQ",
            PublishConfig {
                enable_headers: false,
                ..PublishConfig::default()
            },
        );
        assert!(plain.contains(&r"\subsubsection{REQ002}\label{REQ002}\zlabel{REQ002}".to_string()));
    }

    #[test]
    fn publishes_references_and_escapes_text() {
        let lines = publish("SYS", PublishConfig::default());
        assert!(lines.contains(&r"\begin{quote} \verb|KEYWORD|\end{quote}".to_string()));
        assert!(lines.contains(&r"\begin{quote} \verb|src/hash.c|\end{quote}".to_string()));
        assert!(lines.contains(&r"Hash passwords\_1.".to_string()));
        assert!(lines.contains(&r"\textbf{Parent links:} \hyperref[REQ001]{REQ001}".to_string()));
    }

    #[test]
    fn unlinked_output() {
        let lines = publish(
            "SYS",
            PublishConfig {
                linkify: false,
                ..PublishConfig::default()
            },
        );
        assert!(lines.contains(&r"\textbf{Parent links: REQ001}".to_string()));
    }

    #[test]
    fn located_reference_includes_line() {
        let reference = ExternalRef::Located(Location {
            path: "src/a.c".into(),
            line: Some(12),
        });
        assert_eq!(
            LatexPublisher.format_ref(&reference),
            r"\begin{quote} \verb|src/a.c| (line 12)\end{quote}"
        );
    }

    #[test]
    fn conversion_errors_name_the_item() {
        let mut document = Document::new("REQ".parse().unwrap(), None);
        let mut item = Item::new("REQ001".parse().unwrap(), "1.1".parse().unwrap());
        item.text = "```plantuml\n@startuml\n@enduml\n```".to_string();
        document.extend([item]);
        let tree = Tree::new(vec![document]).unwrap();

        let error = LatexPublisher
            .lines(
                tree.document("REQ").unwrap(),
                &tree,
                &context(PublishConfig::default()),
            )
            .unwrap_err();
        assert!(matches!(
            error,
            PublishError::Convert {
                source: ConvertError::MissingTitle { .. },
                ..
            }
        ));
    }
}
