use std::collections::BTreeMap;

use crate::domain::{Level, Uid};

/// A single requirement, heading or informative item of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    uid: Uid,

    /// Position of the item in the document outline.
    pub level: Level,

    /// The item body, written in Markdown.
    pub text: String,

    /// An optional short title shown next to the identifier.
    pub header: String,

    /// Inactive items are not published.
    pub active: bool,

    /// Whether the item is a requirement (as opposed to informative text).
    pub normative: bool,

    /// Whether the item is intentionally without a parent.
    pub derived: bool,

    /// Identifiers of the parent items.
    pub links: Vec<Uid>,

    /// A keyword locating the item in an external file.
    pub reference: String,

    /// External files the item refers to.
    pub references: Vec<Reference>,

    /// Any other (custom) attributes, rendered as strings.
    pub attributes: BTreeMap<String, String>,
}

/// A reference from an item to an external file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Path of the file, relative to the project root.
    pub path: String,

    /// Optional keyword to look for inside the file.
    pub keyword: Option<String>,
}

impl Item {
    /// Creates an active, normative item with an empty body.
    #[must_use]
    pub fn new(uid: Uid, level: Level) -> Self {
        Self {
            uid,
            level,
            text: String::new(),
            header: String::new(),
            active: true,
            normative: true,
            derived: false,
            links: Vec::new(),
            reference: String::new(),
            references: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// The identifier of the item.
    #[must_use]
    pub const fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Whether the item is a heading rather than a body item.
    #[must_use]
    pub const fn is_heading(&self) -> bool {
        self.level.is_heading()
    }

    /// The outline depth of the item.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.level.depth()
    }

    /// Looks up a custom attribute, treating empty values as missing.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// A short name for body items, from the `short_name` attribute.
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.attribute("short_name")
    }

    /// The body split into lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// The first line of the body, used as the title of heading items.
    #[must_use]
    pub fn title(&self) -> &str {
        self.lines().next().unwrap_or_default()
    }
}
