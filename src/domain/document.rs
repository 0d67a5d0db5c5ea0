use crate::domain::{Item, Prefix};

/// A document: an ordered collection of items sharing a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    prefix: Prefix,

    /// The prefix of the parent document, if this is not the root.
    pub parent: Option<Prefix>,

    /// Custom attributes to publish with every item.
    pub publish: Vec<String>,

    /// Attributes describing the document itself.
    pub attributes: DocumentAttributes,

    items: Vec<Item>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new(prefix: Prefix, parent: Option<Prefix>) -> Self {
        let attributes = DocumentAttributes::new(&prefix);
        Self {
            prefix,
            parent,
            publish: Vec::new(),
            attributes,
            items: Vec::new(),
        }
    }

    /// The document prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// All items, ordered by level and then identifier.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The items that are published.
    pub fn active_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.active)
    }

    /// Adds items, keeping the outline order.
    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
        self.items
            .sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.uid().cmp(b.uid())));
    }

    /// The file stem the document is published under.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.prefix.as_str()
    }
}

/// Descriptive attributes of a document, taken from its `doc` defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAttributes {
    /// Document name, `doc-<PREFIX>` unless set.
    pub name: String,
    /// Document title.
    pub title: String,
    /// Document reference.
    pub reference: String,
    /// Author.
    pub by: String,
    /// Major issue.
    pub major: String,
    /// Minor issue.
    pub minor: String,
    /// Copyright notice.
    pub copyright: String,
}

impl DocumentAttributes {
    /// The defaults for a document with the given prefix.
    #[must_use]
    pub fn new(prefix: &Prefix) -> Self {
        Self {
            name: format!("doc-{prefix}"),
            title: "Pearl Requirements".to_string(),
            reference: "GitLab".to_string(),
            by: "-".to_string(),
            major: "-".to_string(),
            minor: String::new(),
            copyright: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Uid;

    fn item(uid: &str, level: &str) -> Item {
        Item::new(uid.parse::<Uid>().unwrap(), level.parse().unwrap())
    }

    #[test]
    fn items_are_kept_in_outline_order() {
        let mut document = Document::new("REQ".parse().unwrap(), None);
        document.extend([
            item("REQ003", "1.2"),
            item("REQ001", "1.0"),
            item("REQ002", "1.1"),
        ]);
        let uids: Vec<&str> = document.items().iter().map(|i| i.uid().as_str()).collect();
        assert_eq!(uids, ["REQ001", "REQ002", "REQ003"]);
    }

    #[test]
    fn inactive_items_are_skipped() {
        let mut document = Document::new("REQ".parse().unwrap(), None);
        let mut inactive = item("REQ002", "1.2");
        inactive.active = false;
        document.extend([item("REQ001", "1.1"), inactive]);
        assert_eq!(document.active_items().count(), 1);
    }

    #[test]
    fn default_attributes_use_prefix() {
        let document = Document::new("SYS".parse().unwrap(), Some("REQ".parse().unwrap()));
        assert_eq!(document.attributes.name, "doc-SYS");
        assert_eq!(document.attributes.by, "-");
        assert!(document.attributes.copyright.is_empty());
    }
}
