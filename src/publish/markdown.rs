//! Markdown output.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    Context, ExternalRef, PublishError, Publisher, Subsections, capitalize, document_level,
};
use crate::domain::{Document, Item, ItemView, PublishConfig, Tree, references::Location};

static LEADING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#*\s*").expect("valid leading hashes regex"));

static NOT_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid anchor regex"));

const SEPARATOR_WIDTH: usize = 72;

/// Publishes documents as Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownPublisher;

impl MarkdownPublisher {
    /// The heading line of an item, without its attribute list.
    ///
    /// Item links are built from this text, so the anchors they point at
    /// match the headings of the published documents.
    #[must_use]
    pub fn heading(item: &Item, config: &PublishConfig) -> String {
        let hashes = "#".repeat(item.depth());
        let level = item.level.format();
        let (label, show_level) = if item.is_heading() {
            (heading_title(item).to_string(), config.publish_heading_levels)
        } else {
            (body_label(item, config), config.publish_body_levels)
        };
        if show_level {
            format!("{hashes} {level} {label}")
        } else {
            format!("{hashes} {label}")
        }
    }

    /// A table of contents for a document.
    #[must_use]
    pub fn table_of_contents(document: &Document, config: &PublishConfig) -> Vec<String> {
        let mut lines = vec!["# Table of Contents".to_string(), String::new()];
        for item in document.active_items() {
            let indent = if item.depth() == 1 {
                " * ".to_string()
            } else {
                format!("{}* ", "    ".repeat(item.depth() - 1))
            };
            let heading = if item.is_heading() {
                item.title().to_string()
            } else if item.header.is_empty() {
                item.uid().to_string()
            } else {
                format!("{}- _{}_", item.header, item.uid())
            };
            let label = if config.publish_heading_levels {
                format!("{} {heading}", item.level.format())
            } else {
                heading
            };
            if config.linkify {
                let anchor = clean_link(&Self::heading(item, config));
                lines.push(format!("{indent}[{label}](#{anchor})"));
            } else {
                lines.push(format!("{indent}{label}"));
            }
        }
        lines.extend([String::new(), "-".repeat(18), String::new()]);
        lines
    }
}

impl Publisher for MarkdownPublisher {
    fn lines(
        &self,
        document: &Document,
        tree: &Tree,
        context: &Context,
    ) -> Result<Vec<String>, PublishError> {
        let config = context.config();
        let mut lines = Vec::new();
        if config.toc {
            lines.extend(Self::table_of_contents(document, config));
        }

        let mut subsections = Subsections::default();
        for (index, item) in document.active_items().enumerate() {
            if index == 0 {
                lines.push(format!("# *Level- {}*", document_level(document, item)));
                lines.push(String::new());
                lines.push("-".repeat(SEPARATOR_WIDTH));
                lines.push(String::new());
            }
            if let Some((category, subcategory)) = subsections.enter(item.uid()) {
                lines.push(format!("## *{category}- {subcategory}*"));
                lines.push(String::new());
            }

            let mut heading = Self::heading(item, config);
            if item.is_heading() {
                heading.push_str(&self.format_attr_list(item, config.linkify));
            }
            lines.push(heading);

            let text: Vec<&str> = if item.is_heading() && item.header.is_empty() {
                item.lines().skip(1).collect()
            } else {
                item.lines().collect()
            };
            if !text.is_empty() {
                lines.push(String::new());
                lines.extend(text.into_iter().map(str::to_string));
            }

            if !item.is_heading() {
                lines.extend(self.body_details(document, item, tree, context)?);
            }
            lines.push(String::new());
        }
        Ok(lines)
    }

    fn format_attr_list(&self, item: &Item, linkify: bool) -> String {
        if linkify {
            format!(" {{#{}}}", item.uid())
        } else {
            String::new()
        }
    }

    fn format_ref(&self, reference: &ExternalRef) -> String {
        match reference {
            ExternalRef::Located(Location {
                path,
                line: Some(line),
            }) => format!("> `{path}` (line {line})"),
            ExternalRef::Located(Location { path, line: None }) => format!("> `{path}`"),
            ExternalRef::Unchecked(reference) => format!("> '{reference}'"),
        }
    }

    fn format_item_link(&self, item: ItemView<'_>, config: &PublishConfig) -> String {
        let anchor = clean_link(&Self::heading(item.item, config));
        let prefix = item.document.prefix();
        if config.linkify && !item.header.is_empty() {
            format!("[{} {}]({prefix}.md#{anchor})", item.uid(), item.header)
        } else {
            format!("[{}]({prefix}.md#{anchor})", item.uid())
        }
    }

    fn format_label_links(&self, label: &str, links: &str, linkify: bool) -> String {
        if linkify {
            format!("*{label}* {links}")
        } else {
            format!("*{label} {links}*")
        }
    }
}

impl MarkdownPublisher {
    /// Published attributes, references and links of a body item.
    fn body_details(
        &self,
        document: &Document,
        item: &Item,
        tree: &Tree,
        context: &Context,
    ) -> Result<Vec<String>, PublishError> {
        let mut lines = Vec::new();

        if !document.publish.is_empty() {
            for name in &document.publish {
                if let Some(value) = item.attribute(name) {
                    lines.push(String::new());
                    lines.push(format!("{}: {value}", capitalize(name)));
                }
            }
            lines.push(String::new());
        }

        if let Some(reference) = context.item_ref(item)? {
            lines.push(String::new());
            lines.push(self.format_ref(&reference));
        }

        let references = context.item_references(item)?;
        if !references.is_empty() {
            lines.push(String::new());
            lines.extend(self.format_references(&references));
        }

        let links = self.link_lines(item, tree, context.config());
        if !links.is_empty() {
            lines.push(String::new());
            lines.extend(links);
        }
        Ok(lines)
    }
}

/// The title of a heading item: its header if set, else its first line.
fn heading_title(item: &Item) -> &str {
    if item.header.is_empty() {
        item.title()
    } else {
        &item.header
    }
}

fn body_label(item: &Item, config: &PublishConfig) -> String {
    if config.enable_headers && !item.header.is_empty() {
        format!("{}- _{}_", item.header, item.uid())
    } else {
        item.uid().to_string()
    }
}

/// Turns a heading into the anchor Markdown renderers generate for it.
///
/// Leading `#`s and spaces are stripped, the rest is lower-cased, spaces
/// become hyphens and anything else outside `[a-z0-9-]` is dropped.
#[must_use]
pub fn clean_link(heading: &str) -> String {
    let stripped = LEADING_HASHES.replace(heading, "");
    let lowered = stripped.to_lowercase().replace(' ', "-");
    NOT_ANCHOR.replace_all(&lowered, "").into_owned()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::publish::tests::{context, sample_tree};

    #[test_case("## 1.2 Login- _REQ001_", "12-login--req001"; "body heading")]
    #[test_case("# Overview", "overview"; "plain heading")]
    #[test_case("REQ001", "req001"; "bare uid")]
    #[test_case("#   Spaced (Out)!", "spaced-out"; "punctuation")]
    fn anchors(heading: &str, expected: &str) {
        assert_eq!(clean_link(heading), expected);
    }

    fn publish(config: PublishConfig) -> Vec<String> {
        let tree = sample_tree();
        let document = tree.document("REQ").unwrap();
        MarkdownPublisher
            .lines(document, &tree, &context(config))
            .unwrap()
    }

    #[test]
    fn publishes_document() {
        let lines = publish(PublishConfig::default());
        let separator = "-".repeat(72);
        let expected = [
            "# *Level- 1.0*",
            "",
            separator.as_str(),
            "",
            "# 1.0 Overview {#REQ000}",
            "",
            "The system.",
            "",
            "## 1.1 Login- _REQ001_",
            "",
            "Users *shall* log in.",
            "",
            "Owner: alice",
            "",
            "",
            "*Child links:* [SYS001](SYS.md#11-sys001)",
            "",
            "## 1.2 REQ002",
            "",
            "Logs are kept.",
            "",
            "",
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn publishes_references_and_parent_links() {
        let tree = sample_tree();
        let document = tree.document("SYS").unwrap();
        let lines = MarkdownPublisher
            .lines(document, &tree, &context(PublishConfig::default()))
            .unwrap();

        assert!(lines.contains(&"> 'KEYWORD'".to_string()));
        assert!(lines.contains(&"> 'src/hash.c'".to_string()));
        assert!(lines.contains(&"*Parent links:* [REQ001 Login](REQ.md#11-login--req001)".to_string()));
    }

    #[test]
    fn plain_output_without_levels_or_links() {
        let config = PublishConfig {
            linkify: false,
            publish_heading_levels: false,
            publish_body_levels: false,
            enable_headers: false,
            publish_child_links: false,
            ..PublishConfig::default()
        };
        let lines = publish(config);
        assert!(lines.contains(&"# Overview".to_string()));
        assert!(lines.contains(&"## REQ001".to_string()));
        assert!(!lines.iter().any(|line| line.contains("links")));
    }

    #[test]
    fn unlinked_labels_wrap_the_links() {
        assert_eq!(
            MarkdownPublisher.format_label_links("Parent links:", "[A](B.md#a)", false),
            "*Parent links: [A](B.md#a)*"
        );
    }

    #[test]
    fn formats_located_references() {
        let located = ExternalRef::Located(Location {
            path: "src/main.c".into(),
            line: Some(3),
        });
        let file = ExternalRef::Located(Location {
            path: "src/main.c".into(),
            line: None,
        });
        assert_eq!(MarkdownPublisher.format_ref(&located), "> `src/main.c` (line 3)");
        assert_eq!(MarkdownPublisher.format_ref(&file), "> `src/main.c`");
    }

    #[test]
    fn table_of_contents_links_headings() {
        let tree = sample_tree();
        let document = tree.document("REQ").unwrap();
        let toc = MarkdownPublisher::table_of_contents(document, &PublishConfig::default());
        assert_eq!(
            toc,
            [
                "# Table of Contents",
                "",
                " * [1.0 Overview](#10-overview)",
                "    * [1.1 Login- _REQ001_](#11-login--req001)",
                "    * [1.2 REQ002](#12-req002)",
                "",
                "------------------",
                "",
            ]
        );
    }

    #[test]
    fn toc_is_optional() {
        let with = publish(PublishConfig {
            toc: true,
            ..PublishConfig::default()
        });
        assert_eq!(with[0], "# Table of Contents");
        assert_eq!(publish(PublishConfig::default())[0], "# *Level- 1.0*");
    }

    #[test]
    fn four_part_uids_start_subsections() {
        let mut document = Document::new("L1".parse().unwrap(), None);
        document.extend([
            Item::new("L1-SRD-UI-001".parse().unwrap(), "1.1".parse().unwrap()),
            Item::new("L1-SRD-UI-002".parse().unwrap(), "1.2".parse().unwrap()),
        ]);
        let tree = Tree::new(vec![document]).unwrap();
        let lines = MarkdownPublisher
            .lines(
                tree.document("L1").unwrap(),
                &tree,
                &context(PublishConfig::default()),
            )
            .unwrap();
        assert_eq!(
            lines.iter().filter(|line| *line == "## *SRD- UI*").count(),
            1
        );
        assert_eq!(lines[0], "# *Level- 1.1*");
    }
}
