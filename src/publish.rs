//! Publishing documents as Markdown or LaTeX.
//!
//! A [`Publisher`] turns each document of a [`Tree`] into lines of text.
//! [`publish_tree`] writes one file per document, along with the
//! traceability matrix and, for LaTeX, the wrapper document and compile
//! script.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    convert::ConvertError,
    domain::{
        Document, Item, ItemView, PublishConfig, Tree, Uid,
        references::{Location, ReferenceError, Resolver},
    },
    storage::Template,
};

pub mod latex;
pub mod markdown;
pub mod matrix;
pub mod wrapper;

pub use latex::LatexPublisher;
pub use markdown::MarkdownPublisher;

/// The output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// GitHub flavoured Markdown.
    #[default]
    Markdown,
    /// LaTeX, compiled with the generated wrapper.
    Latex,
}

impl Format {
    /// The file extension of published documents.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Latex => "tex",
        }
    }

    fn publisher(self) -> &'static dyn Publisher {
        match self {
            Self::Markdown => &MarkdownPublisher,
            Self::Latex => &LatexPublisher,
        }
    }
}

/// Errors that abort publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// An output file could not be written.
    #[error("failed to write {}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The CSV matrix could not be written.
    #[error("failed to write {}", path.display())]
    Csv {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: csv::Error,
    },

    /// An item's text could not be converted.
    #[error("failed to convert the text of {uid}")]
    Convert {
        /// The item being converted.
        uid: Uid,
        /// The underlying error.
        source: ConvertError,
    },

    /// An external reference could not be found.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// An external reference, ready to be formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalRef {
    /// A reference found in the project files.
    Located(Location),
    /// A reference published as written.
    Unchecked(String),
}

/// Everything the publishers need besides the tree itself.
#[derive(Debug)]
pub struct Context {
    config: PublishConfig,
    resolver: Option<Resolver>,
}

impl Context {
    /// Creates a context.
    ///
    /// When references are checked, the files below `root` are indexed.
    #[must_use]
    pub fn new(config: PublishConfig, root: &Path) -> Self {
        let resolver = config.check_ref.then(|| Resolver::new(root));
        Self { config, resolver }
    }

    /// The publishing configuration.
    #[must_use]
    pub const fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// The item's `ref` keyword, located when references are checked.
    ///
    /// # Errors
    ///
    /// Fails if references are checked and the keyword is not found.
    pub fn item_ref(&self, item: &Item) -> Result<Option<ExternalRef>, ReferenceError> {
        if item.reference.is_empty() {
            return Ok(None);
        }
        let reference = match &self.resolver {
            Some(resolver) => ExternalRef::Located(resolver.find(&item.reference)?),
            None => ExternalRef::Unchecked(item.reference.clone()),
        };
        Ok(Some(reference))
    }

    /// The item's file references, located when references are checked.
    ///
    /// # Errors
    ///
    /// Fails if references are checked and a file or keyword is missing.
    pub fn item_references(&self, item: &Item) -> Result<Vec<ExternalRef>, ReferenceError> {
        item.references
            .iter()
            .map(|reference| match &self.resolver {
                Some(resolver) => resolver.locate(reference).map(ExternalRef::Located),
                None => Ok(ExternalRef::Unchecked(reference.path.replace('\\', "/"))),
            })
            .collect()
    }
}

/// Formats documents in one output format.
pub trait Publisher {
    /// Yields the lines of a published document.
    ///
    /// # Errors
    ///
    /// Fails if an item's text cannot be converted or a reference cannot be
    /// found.
    fn lines(
        &self,
        document: &Document,
        tree: &Tree,
        context: &Context,
    ) -> Result<Vec<String>, PublishError>;

    /// The attribute list making a heading a link target.
    #[must_use]
    fn format_attr_list(&self, item: &Item, linkify: bool) -> String;

    /// Formats one external reference.
    #[must_use]
    fn format_ref(&self, reference: &ExternalRef) -> String;

    /// Formats several external references, one per line.
    #[must_use]
    fn format_references(&self, references: &[ExternalRef]) -> Vec<String> {
        references
            .iter()
            .map(|reference| self.format_ref(reference))
            .collect()
    }

    /// Formats a link to another item.
    #[must_use]
    fn format_item_link(&self, item: ItemView<'_>, config: &PublishConfig) -> String;

    /// Formats a list of links to other items.
    #[must_use]
    fn format_links(&self, items: &[ItemView<'_>], config: &PublishConfig) -> String {
        items
            .iter()
            .map(|&item| self.format_item_link(item, config))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Joins a label and its links.
    #[must_use]
    fn format_label_links(&self, label: &str, links: &str, linkify: bool) -> String;

    /// The parent links of an item and, if enabled, its child links.
    #[must_use]
    fn link_lines(&self, item: &Item, tree: &Tree, config: &PublishConfig) -> Vec<String> {
        let mut lines = Vec::new();
        let parents = tree.parent_items(item.uid());
        if !parents.is_empty() {
            let links = self.format_links(&parents, config);
            lines.push(self.format_label_links("Parent links:", &links, config.linkify));
        }
        if config.publish_child_links {
            let children = tree.child_items(item.uid());
            if !children.is_empty() {
                let links = self.format_links(&children, config);
                lines.push(self.format_label_links("Child links:", &links, config.linkify));
            }
        }
        lines
    }
}

/// The `category` and `subcategory` of a four part identifier such as
/// `L1-SRD-UI-004`.
pub(crate) fn subsection(uid: &Uid) -> Option<(&str, &str)> {
    let segments: Vec<&str> = uid.segments().collect();
    match segments.as_slice() {
        [_, category, subcategory, _] => Some((category, subcategory)),
        _ => None,
    }
}

/// Tracks which subsection headers have been emitted for a document.
#[derive(Debug, Default)]
pub(crate) struct Subsections<'a> {
    category: Option<&'a str>,
    subcategory: Option<&'a str>,
}

impl<'a> Subsections<'a> {
    /// Returns the `(category, subcategory)` header to emit before `uid`, if
    /// it starts a new subsection.
    pub(crate) fn enter(&mut self, uid: &'a Uid) -> Option<(&'a str, &'a str)> {
        let (category, subcategory) = subsection(uid)?;
        if self.category == Some(category) && self.subcategory == Some(subcategory) {
            return None;
        }
        self.category = Some(category);
        self.subcategory = Some(subcategory);
        Some((category, subcategory))
    }
}

/// The level shown in a document's title: the level of its first item, or
/// `0` for `L0` documents.
pub(crate) fn document_level(document: &Document, first: &Item) -> String {
    if document.prefix().starts_with("L0") {
        "0".to_string()
    } else {
        first.level.format()
    }
}

/// Capitalises the first letter of an attribute name.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Publishes every document of `tree` into `out`.
///
/// Returns the paths of the files written, documents first.
///
/// # Errors
///
/// Fails on the first document that cannot be published or file that cannot
/// be written. Files already written are left in place.
#[instrument(level = "debug", skip(tree, context, template))]
pub fn publish_tree(
    tree: &Tree,
    out: &Path,
    format: Format,
    context: &Context,
    template: &Template,
) -> Result<Vec<PathBuf>, PublishError> {
    let dir = output_dir(out, format);
    fs::create_dir_all(&dir).map_err(|source| PublishError::Io {
        path: dir.clone(),
        source,
    })?;

    let publisher = format.publisher();
    let mut written = Vec::new();
    for document in tree.documents() {
        let lines = publisher.lines(document, tree, context)?;
        let path = dir.join(format!("{}.{}", document.file_stem(), format.extension()));
        write_lines(&path, &lines)?;
        written.push(path);
    }

    if context.config().matrix && !tree.is_empty() {
        written.extend(matrix::write(tree, &dir, format, context.config())?);
    }

    if format == Format::Latex {
        written.extend(wrapper::write(tree, &dir, template)?);
    }

    Ok(written)
}

/// The directory to publish into.
///
/// Documents are always named after their prefix, so a file name given as
/// the output is replaced by its parent directory.
fn output_dir(out: &Path, format: Format) -> PathBuf {
    if out.extension().is_some_and(|ext| ext == format.extension()) {
        tracing::warn!(
            "custom file names are not supported, publishing into the parent directory of {}",
            out.display()
        );
        return out.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    out.to_path_buf()
}

/// Writes `lines` to `path`, each terminated by a newline.
pub(crate) fn write_lines(path: &Path, lines: &[String]) -> Result<(), PublishError> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("published {}", path.display());
    Ok(())
}
