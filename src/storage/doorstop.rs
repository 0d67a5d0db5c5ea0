//! Loading a doorstop requirements tree from disk
//!
//! Every directory containing a `.doorstop.yml` file is a document. The other
//! `*.yml` files directly inside it are the document's items, named after
//! their identifiers.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Deserialize;
use tracing::instrument;
use walkdir::WalkDir;

use crate::domain::{
    Document, InvalidIdError, InvalidLevelError, Item, Level, Prefix, Reference, Tree, TreeError,
    Uid,
};

/// The file marking a directory as a document.
pub const DOCUMENT_FILE: &str = ".doorstop.yml";

/// Errors that can occur when loading a tree.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A file is not valid YAML, or does not have the expected shape.
    #[error("failed to parse {}", path.display())]
    Yaml {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// An item file name is not a valid identifier.
    #[error("invalid item file name {}", path.display())]
    InvalidUid {
        /// The item file.
        path: PathBuf,
        /// The underlying error.
        source: InvalidIdError,
    },

    /// An item has a malformed level.
    #[error("invalid level in {}", path.display())]
    InvalidLevel {
        /// The item file.
        path: PathBuf,
        /// The underlying error.
        source: InvalidLevelError,
    },

    /// The documents do not form a valid tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Loads every document below `root` and assembles them into a tree.
///
/// Item files are parsed in parallel.
///
/// # Errors
///
/// Fails if any document or item file cannot be read or parsed, or if the
/// documents do not form a valid tree.
#[instrument(level = "debug")]
pub fn load_tree(root: &Path) -> Result<Tree, LoadError> {
    let mut documents = Vec::new();
    for dir in document_dirs(root) {
        documents.push(load_document(&dir)?);
    }
    tracing::debug!("loaded {} documents", documents.len());

    Ok(Tree::new(documents)?)
}

/// Loads a single document and its items from `dir`.
///
/// # Errors
///
/// Fails if the document settings or any item cannot be read or parsed.
pub fn load_document(dir: &Path) -> Result<Document, LoadError> {
    let settings_path = dir.join(DOCUMENT_FILE);
    let file: DocumentFile = read_yaml(&settings_path)?;

    let mut document = Document::new(file.settings.prefix, file.settings.parent);
    document.publish = file.attributes.publish;
    file.attributes.defaults.doc.apply(&mut document);

    let items = item_paths(dir)?
        .into_par_iter()
        .map(|path| load_item(&path))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("{}: {} items", document.prefix(), items.len());
    document.extend(items);

    Ok(document)
}

fn document_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_type().is_dir() || !is_hidden(entry.file_name())
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name() == DOCUMENT_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn item_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file()
            && path.extension() == Some(OsStr::new("yml"))
            && path.file_name() != Some(OsStr::new(DOCUMENT_FILE))
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_item(path: &Path) -> Result<Item, LoadError> {
    let uid = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let uid = Uid::new(uid).map_err(|source| LoadError::InvalidUid {
        path: path.to_path_buf(),
        source,
    })?;

    let file: ItemFile = read_yaml(path)?;
    file.into_item(uid).map_err(|source| LoadError::InvalidLevel {
        path: path.to_path_buf(),
        source,
    })
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct DocumentFile {
    settings: Settings,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct Settings {
    prefix: Prefix,
    #[serde(default)]
    parent: Option<Prefix>,
}

#[derive(Debug, Default, Deserialize)]
struct Attributes {
    #[serde(default)]
    defaults: Defaults,
    #[serde(default)]
    publish: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Defaults {
    #[serde(default)]
    doc: DocDefaults,
}

#[derive(Debug, Default, Deserialize)]
struct DocDefaults {
    name: Option<String>,
    title: Option<String>,
    #[serde(rename = "ref")]
    reference: Option<String>,
    by: Option<String>,
    major: Option<String>,
    minor: Option<String>,
    copyright: Option<String>,
}

impl DocDefaults {
    fn apply(self, document: &mut Document) {
        let attributes = &mut document.attributes;
        if let Some(name) = self.name.filter(|name| !name.is_empty()) {
            attributes.name = name;
        }
        let fields = [
            (self.title, &mut attributes.title),
            (self.reference, &mut attributes.reference),
            (self.by, &mut attributes.by),
            (self.major, &mut attributes.major),
            (self.minor, &mut attributes.minor),
            (self.copyright, &mut attributes.copyright),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    #[serde(default = "yes")]
    active: bool,
    #[serde(default)]
    derived: bool,
    #[serde(default)]
    header: String,
    #[serde(default)]
    level: LevelValue,
    #[serde(default)]
    links: Vec<LinkEntry>,
    #[serde(default = "yes")]
    normative: bool,
    #[serde(default, rename = "ref")]
    reference: String,
    #[serde(default)]
    references: Option<Vec<ReferenceEntry>>,
    #[serde(default)]
    text: String,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

const fn yes() -> bool {
    true
}

impl ItemFile {
    fn into_item(self, uid: Uid) -> Result<Item, InvalidLevelError> {
        let mut item = Item::new(uid, self.level.parse()?);
        item.active = self.active;
        item.derived = self.derived;
        item.header = self.header;
        item.normative = self.normative;
        item.reference = self.reference;
        item.text = self.text;
        item.links = self.links.into_iter().flat_map(LinkEntry::into_uids).collect();
        item.references = self
            .references
            .unwrap_or_default()
            .into_iter()
            .map(|entry| Reference {
                path: entry.path,
                keyword: entry.keyword,
            })
            .collect();
        item.attributes = self
            .extra
            .into_iter()
            .filter_map(|(key, value)| scalar(value).map(|value| (key, value)))
            .collect();
        Ok(item)
    }
}

fn scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Levels are written as numbers (`1.2`) or strings (`1.2.10`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LevelValue {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Default for LevelValue {
    fn default() -> Self {
        Self::Text("1.0".to_string())
    }
}

impl LevelValue {
    fn parse(&self) -> Result<Level, InvalidLevelError> {
        match self {
            Self::Int(n) => n.to_string().parse(),
            Self::Float(f) => format!("{f:?}").parse(),
            Self::Text(s) => s.parse(),
        }
    }
}

/// A link, either bare or with the parent's fingerprint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Bare(Uid),
    Stamped(BTreeMap<Uid, Option<serde_yaml::Value>>),
}

impl LinkEntry {
    fn into_uids(self) -> Vec<Uid> {
        match self {
            Self::Bare(uid) => vec![uid],
            Self::Stamped(map) => map.into_keys().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    path: String,
    #[serde(default)]
    keyword: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let reqs = tmp.path().join("reqs");
        let sys = reqs.join("sys");

        write(
            &reqs,
            DOCUMENT_FILE,
            "settings:\n  digits: 3\n  prefix: REQ\n  sep: ''\nattributes:\n  defaults:\n    \
             doc:\n      name: ''\n      title: Top Level\n      by: QA\n  publish:\n    - \
             owner\n",
        );
        write(&reqs, "REQ000.yml", "level: 1.0\ntext: Introduction\n");
        write(
            &reqs,
            "REQ001.yml",
            "active: true\nlevel: 1.1\nheader: Login\nowner: alice\npriority: 2\ntext: |\n  The \
             system shall log in.\n\n  Securely.\nreferences:\n- path: src/login.c\n  type: \
             file\n  keyword: LOGIN\n",
        );
        write(&sys, DOCUMENT_FILE, "settings:\n  prefix: SYS\n  parent: REQ\n");
        write(
            &sys,
            "SYS001.yml",
            "level: '1.10'\nlinks:\n- REQ001: abc123\nref: SYS-KEYWORD\ntext: Hash passwords.\n",
        );
        write(&sys, "SYS002.yml", "level: 2\nlinks:\n- REQ001\nactive: false\n");
        write(&tmp.path().join(".hidden"), DOCUMENT_FILE, "not: [valid");
        tmp
    }

    #[test]
    fn loads_documents_and_items() {
        let tmp = project();
        let tree = load_tree(tmp.path()).unwrap();

        let prefixes: Vec<&str> = tree.documents().iter().map(|d| d.prefix().as_str()).collect();
        assert_eq!(prefixes, ["REQ", "SYS"]);
        assert_eq!(tree.len(), 4);

        let req = tree.document("REQ").unwrap();
        assert_eq!(req.attributes.name, "doc-REQ");
        assert_eq!(req.attributes.title, "Top Level");
        assert_eq!(req.attributes.by, "QA");
        assert_eq!(req.publish, ["owner"]);
    }

    #[test]
    fn parses_item_fields() {
        let tmp = project();
        let tree = load_tree(tmp.path()).unwrap();

        let heading = tree.find(&"REQ000".parse().unwrap()).unwrap();
        assert!(heading.is_heading());

        let req = tree.find(&"REQ001".parse().unwrap()).unwrap();
        assert_eq!(req.header, "Login");
        assert_eq!(req.text, "The system shall log in.\n\nSecurely.\n");
        assert_eq!(req.attribute("owner"), Some("alice"));
        assert_eq!(req.attribute("priority"), Some("2"));
        assert_eq!(req.references[0].keyword.as_deref(), Some("LOGIN"));

        let sys = tree.find(&"SYS001".parse().unwrap()).unwrap();
        assert_eq!(sys.level.to_string(), "1.10");
        assert_eq!(sys.reference, "SYS-KEYWORD");
        assert_eq!(sys.links, ["REQ001".parse::<Uid>().unwrap()]);

        let inactive = tree.find(&"SYS002".parse().unwrap()).unwrap();
        assert!(!inactive.active);
        assert_eq!(inactive.links.len(), 1);
    }

    #[test]
    fn children_are_linked() {
        let tmp = project();
        let tree = load_tree(tmp.path()).unwrap();
        let children = tree.child_items(&"REQ001".parse().unwrap());
        let uids: Vec<&str> = children.iter().map(|c| c.uid().as_str()).collect();
        assert_eq!(uids, ["SYS001"]);
    }

    #[test]
    fn invalid_item_is_reported_with_path() {
        let tmp = project();
        write(&tmp.path().join("reqs"), "REQ002.yml", "level: one\n");

        let error = load_tree(tmp.path()).unwrap_err();
        match error {
            LoadError::InvalidLevel { path, .. } => assert!(path.ends_with("REQ002.yml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let tmp = project();
        write(&tmp.path().join("reqs"), "REQ003.yml", "text: [unclosed\n");
        assert!(matches!(
            load_tree(tmp.path()),
            Err(LoadError::Yaml { .. })
        ));
    }

    #[test]
    fn empty_directory_is_an_empty_tree() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_tree(tmp.path()).unwrap().is_empty());
    }
}
