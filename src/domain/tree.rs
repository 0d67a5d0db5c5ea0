//! The in-memory requirements tree
//!
//! A [`Tree`] owns every [`Document`] of a project, ordered parent first, and
//! indexes the links between their items in a graph. It knows nothing about
//! the filesystem.

use std::{collections::HashMap, ops::Deref};

use petgraph::{
    Direction,
    algo::{is_cyclic_directed, toposort},
    graphmap::DiGraphMap,
};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{Document, Item, Prefix, Uid};

/// Position of an item inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Node {
    document: usize,
    item: usize,
}

/// A borrowed item together with the document it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ItemView<'a> {
    /// The item.
    pub item: &'a Item,
    /// The document containing the item.
    pub document: &'a Document,
}

impl Deref for ItemView<'_> {
    type Target = Item;

    fn deref(&self) -> &Self::Target {
        self.item
    }
}

/// One row of the traceability matrix, with a cell per document.
pub type TraceRow<'a> = Vec<Option<ItemView<'a>>>;

/// A validated set of documents and the links between their items.
#[derive(Debug, Default)]
pub struct Tree {
    documents: Vec<Document>,
    index: HashMap<Uid, Node>,
    /// Edges point from child to parent.
    graph: DiGraphMap<Node, ()>,
}

/// Errors that can occur when assembling a tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Two documents share a prefix.
    #[error("duplicate document prefix {0}")]
    DuplicatePrefix(Prefix),
    /// A document names a parent that does not exist.
    #[error("document {document} has unknown parent {parent}")]
    UnknownParent {
        /// The child document.
        document: Prefix,
        /// The missing parent.
        parent: Prefix,
    },
    /// The documents' parent relationships form a cycle.
    #[error("documents form a cycle through {0}")]
    DocumentCycle(Prefix),
    /// Two items share an identifier.
    #[error("duplicate item {0}")]
    DuplicateUid(Uid),
    /// Item links form a cycle.
    #[error("item links form a cycle")]
    LinkCycle,
}

impl Tree {
    /// Builds a tree from a set of documents.
    ///
    /// Links to unknown items are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Fails if prefixes or identifiers are duplicated, if a parent document
    /// is missing, or if documents or item links form a cycle.
    #[instrument(level = "debug", skip(documents))]
    pub fn new(documents: Vec<Document>) -> Result<Self, TreeError> {
        let documents = order_documents(documents)?;

        let mut index = HashMap::new();
        let mut graph = DiGraphMap::new();
        for (d, document) in documents.iter().enumerate() {
            for (i, item) in document.items().iter().enumerate() {
                let node = Node {
                    document: d,
                    item: i,
                };
                if index.insert(item.uid().clone(), node).is_some() {
                    return Err(TreeError::DuplicateUid(item.uid().clone()));
                }
                graph.add_node(node);
            }
        }

        for (d, document) in documents.iter().enumerate() {
            for (i, item) in document.items().iter().enumerate() {
                let child = Node {
                    document: d,
                    item: i,
                };
                for link in &item.links {
                    match index.get(link) {
                        Some(&parent) => {
                            graph.add_edge(child, parent, ());
                        }
                        None => tracing::warn!("{} links to unknown item {link}", item.uid()),
                    }
                }
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(TreeError::LinkCycle);
        }

        Ok(Self {
            documents,
            index,
            graph,
        })
    }

    /// The documents, parents before their children.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Looks up a document by prefix.
    #[must_use]
    pub fn document(&self, prefix: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|document| document.prefix().as_str() == prefix)
    }

    /// The total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the tree contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks up an item by identifier.
    #[must_use]
    pub fn find(&self, uid: &Uid) -> Option<ItemView<'_>> {
        self.index.get(uid).map(|&node| self.view(node))
    }

    /// The items `uid` links to, sorted by identifier.
    #[must_use]
    pub fn parent_items(&self, uid: &Uid) -> Vec<ItemView<'_>> {
        self.neighbours(uid, Direction::Outgoing)
    }

    /// The items linking to `uid`, sorted by identifier.
    #[must_use]
    pub fn child_items(&self, uid: &Uid) -> Vec<ItemView<'_>> {
        self.neighbours(uid, Direction::Incoming)
    }

    /// Builds the traceability matrix.
    ///
    /// Every active normative item is followed up through its parents and,
    /// failing that, down through its children. Each path yields a row with
    /// one cell per document. Rows that are contained in another row are
    /// dropped and the rest are sorted by their identifiers, empty cells
    /// last.
    #[must_use]
    pub fn traceability(&self) -> Vec<TraceRow<'_>> {
        let mut rows: Vec<TraceRow<'_>> = Vec::new();
        for (d, document) in self.documents.iter().enumerate() {
            for (i, item) in document.items().iter().enumerate() {
                if !item.active || !item.normative || item.is_heading() {
                    continue;
                }
                let node = Node {
                    document: d,
                    item: i,
                };
                let row = vec![None; self.documents.len()];
                for found in self.rows(node, true, true, row) {
                    if !rows.iter().any(|existing| covers(existing, &found)) {
                        rows.retain(|existing| !covers(&found, existing));
                        rows.push(found);
                    }
                }
            }
        }

        rows.sort_by_cached_key(|row| {
            row.iter()
                .map(|cell| cell.map(|view| view.item.uid().clone()))
                .map(|uid| (uid.is_none(), uid))
                .collect::<Vec<_>>()
        });
        rows
    }

    fn rows<'a>(
        &'a self,
        node: Node,
        parents: bool,
        children: bool,
        mut row: TraceRow<'a>,
    ) -> Vec<TraceRow<'a>> {
        row[node.document] = Some(self.view(node));

        let directions = [
            (parents, Direction::Outgoing),
            (children, Direction::Incoming),
        ];
        for (enabled, direction) in directions {
            if !enabled {
                continue;
            }
            let next = self.active(node, direction);
            if !next.is_empty() {
                let up = direction == Direction::Outgoing;
                return next
                    .into_iter()
                    .flat_map(|next| self.rows(next, up, !up, row.clone()))
                    .collect();
            }
        }

        vec![row]
    }

    fn active(&self, node: Node, direction: Direction) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .graph
            .neighbors_directed(node, direction)
            .filter(|&n| self.view(n).item.active)
            .collect();
        nodes.sort_by(|a, b| self.view(*a).item.uid().cmp(self.view(*b).item.uid()));
        nodes
    }

    fn neighbours(&self, uid: &Uid, direction: Direction) -> Vec<ItemView<'_>> {
        self.index.get(uid).map_or_else(Vec::new, |&node| {
            self.active(node, direction)
                .into_iter()
                .map(|n| self.view(n))
                .collect()
        })
    }

    fn view(&self, node: Node) -> ItemView<'_> {
        let document = &self.documents[node.document];
        ItemView {
            item: &document.items()[node.item],
            document,
        }
    }
}

/// Whether every filled cell of `b` holds the same item in `a`.
fn covers(a: &TraceRow<'_>, b: &TraceRow<'_>) -> bool {
    a.iter().zip(b).all(|(a, b)| {
        b.is_none_or(|b| a.is_some_and(|a| a.item.uid() == b.item.uid()))
    })
}

/// Sorts documents so that every parent precedes its children.
fn order_documents(documents: Vec<Document>) -> Result<Vec<Document>, TreeError> {
    let mut positions: HashMap<Prefix, usize> = HashMap::new();
    for (i, document) in documents.iter().enumerate() {
        if positions.insert(document.prefix().clone(), i).is_some() {
            return Err(TreeError::DuplicatePrefix(document.prefix().clone()));
        }
    }

    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for (i, document) in documents.iter().enumerate() {
        graph.add_node(i);
        if let Some(parent) = &document.parent {
            let &p = positions
                .get(parent)
                .ok_or_else(|| TreeError::UnknownParent {
                    document: document.prefix().clone(),
                    parent: parent.clone(),
                })?;
            graph.add_edge(p, i, ());
        }
    }

    let order = toposort(&graph, None)
        .map_err(|cycle| TreeError::DocumentCycle(documents[cycle.node_id()].prefix().clone()))?;

    let mut slots: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Item;

    fn item(uid: &str, level: &str, links: &[&str]) -> Item {
        let mut item = Item::new(uid.parse().unwrap(), level.parse().unwrap());
        item.links = links.iter().map(|link| link.parse().unwrap()).collect();
        item
    }

    fn document(prefix: &str, parent: Option<&str>, items: Vec<Item>) -> Document {
        let mut document = Document::new(
            prefix.parse().unwrap(),
            parent.map(|parent| parent.parse().unwrap()),
        );
        document.extend(items);
        document
    }

    fn sample() -> Tree {
        Tree::new(vec![
            document(
                "TST",
                Some("SYS"),
                vec![item("TST001", "1.1", &["SYS001"])],
            ),
            document(
                "SYS",
                Some("REQ"),
                vec![
                    item("SYS001", "1.1", &["REQ001"]),
                    item("SYS002", "1.2", &["REQ001"]),
                ],
            ),
            document(
                "REQ",
                None,
                vec![
                    item("REQ000", "1.0", &[]),
                    item("REQ001", "1.1", &[]),
                    item("REQ002", "1.2", &[]),
                ],
            ),
        ])
        .unwrap()
    }

    fn uids<'a>(row: &TraceRow<'a>) -> Vec<Option<&'a str>> {
        row.iter()
            .map(|cell| cell.map(|view| view.item.uid().as_str()))
            .collect()
    }

    #[test]
    fn documents_are_ordered_parent_first() {
        let tree = sample();
        let prefixes: Vec<&str> = tree
            .documents()
            .iter()
            .map(|d| d.prefix().as_str())
            .collect();
        assert_eq!(prefixes, ["REQ", "SYS", "TST"]);
    }

    #[test]
    fn parents_and_children() {
        let tree = sample();
        let req001: Uid = "REQ001".parse().unwrap();
        let child_items = tree.child_items(&req001);
        let children: Vec<&str> = child_items
            .iter()
            .map(|view| view.uid().as_str())
            .collect();
        assert_eq!(children, ["SYS001", "SYS002"]);

        let parents = tree.parent_items(&"TST001".parse().unwrap());
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].document.prefix().as_str(), "SYS");
    }

    #[test]
    fn traceability_rows() {
        let tree = sample();
        let rows: Vec<_> = tree.traceability().iter().map(uids).collect();
        assert_eq!(
            rows,
            [
                vec![Some("REQ001"), Some("SYS001"), Some("TST001")],
                vec![Some("REQ001"), Some("SYS002"), None],
                vec![Some("REQ002"), None, None],
            ]
        );
    }

    #[test]
    fn unknown_links_are_ignored() {
        let tree = Tree::new(vec![document(
            "REQ",
            None,
            vec![item("REQ001", "1", &["NOPE1"])],
        )])
        .unwrap();
        assert!(tree.parent_items(&"REQ001".parse().unwrap()).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn duplicate_uids_are_rejected() {
        let error = Tree::new(vec![
            document("REQ", None, vec![item("REQ001", "1", &[])]),
            document("SYS", Some("REQ"), vec![item("REQ001", "1", &[])]),
        ])
        .unwrap_err();
        assert_eq!(error, TreeError::DuplicateUid("REQ001".parse().unwrap()));
    }

    #[test]
    fn unknown_parent_document_is_rejected() {
        let error = Tree::new(vec![document("SYS", Some("REQ"), Vec::new())]).unwrap_err();
        assert!(matches!(error, TreeError::UnknownParent { .. }));
    }

    #[test]
    fn document_cycles_are_rejected() {
        let error = Tree::new(vec![
            document("A", Some("B"), Vec::new()),
            document("B", Some("A"), Vec::new()),
        ])
        .unwrap_err();
        assert!(matches!(error, TreeError::DocumentCycle(_)));
    }

    #[test]
    fn link_cycles_are_rejected() {
        let error = Tree::new(vec![document(
            "REQ",
            None,
            vec![item("REQ001", "1", &["REQ002"]), item("REQ002", "2", &["REQ001"])],
        )])
        .unwrap_err();
        assert_eq!(error, TreeError::LinkCycle);
    }

    #[test]
    fn find_returns_document() {
        let tree = sample();
        let view = tree.find(&"SYS002".parse().unwrap()).unwrap();
        assert_eq!(view.document.prefix().as_str(), "SYS");
        assert_eq!(view.level.to_string(), "1.2");
        assert!(tree.find(&"SYS999".parse().unwrap()).is_none());
    }
}
