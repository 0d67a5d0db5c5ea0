//! Locating external references in the project files.

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::domain::Reference;

/// A located reference: a project-relative path and an optional 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path relative to the project root, always with `/` separators.
    pub path: String,
    /// The line the keyword was found on, if it was found inside the file.
    pub line: Option<usize>,
}

/// Errors raised while resolving references.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// No project file mentions the keyword.
    #[error("external reference not found: {0}")]
    KeywordNotFound(String),

    /// A referenced file does not exist.
    #[error("referenced file not found: {0}")]
    FileNotFound(String),

    /// The keyword does not occur in the referenced file.
    #[error("keyword '{keyword}' not found in {path}")]
    KeywordNotInFile {
        /// The referenced file.
        path: String,
        /// The missing keyword.
        keyword: String,
    },
}

/// Searches the files of a project for item references.
///
/// Hidden files and directories, and the YAML files doorstop keeps items in,
/// are never searched.
#[derive(Debug)]
pub struct Resolver {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Resolver {
    /// Indexes the files below `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension() != Some(OsStr::new("yml")))
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();
        tracing::debug!("indexed {} files for references", files.len());

        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    /// Finds the first file whose name or content mentions `keyword`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::KeywordNotFound`] if no file matches.
    pub fn find(&self, keyword: &str) -> Result<Location, ReferenceError> {
        for path in &self.files {
            let relative = self.relative(path);
            if relative.contains(keyword) {
                return Ok(Location {
                    path: relative,
                    line: None,
                });
            }
            if let Some(line) = line_of(path, keyword) {
                return Ok(Location {
                    path: relative,
                    line: Some(line),
                });
            }
        }
        Err(ReferenceError::KeywordNotFound(keyword.to_string()))
    }

    /// Checks a file reference, locating its keyword when it has one.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or does not contain the keyword.
    pub fn locate(&self, reference: &Reference) -> Result<Location, ReferenceError> {
        let path = self.root.join(&reference.path);
        if !path.is_file() {
            return Err(ReferenceError::FileNotFound(reference.path.clone()));
        }

        let relative = self.relative(&path);
        let Some(keyword) = &reference.keyword else {
            return Ok(Location {
                path: relative,
                line: None,
            });
        };

        line_of(&path, keyword)
            .map(|line| Location {
                path: relative.clone(),
                line: Some(line),
            })
            .ok_or_else(|| ReferenceError::KeywordNotInFile {
                path: relative,
                keyword: keyword.clone(),
            })
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// The 1-based line of the first occurrence of `keyword`, skipping files that
/// are not valid UTF-8.
fn line_of(path: &Path, keyword: &str) -> Option<usize> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .position(|line| line.contains(keyword))
        .map(|index| index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/main.c"), "int x;\n// REF-LOGIN\n").unwrap();
        fs::write(dir.path().join("src/login_test.py"), "pass\n").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "REF-HIDDEN\n").unwrap();
        fs::write(dir.path().join("REQ001.yml"), "ref: REF-LOGIN\n").unwrap();
        dir
    }

    #[test]
    fn finds_keyword_in_content() {
        let dir = project();
        let location = Resolver::new(dir.path()).find("REF-LOGIN").unwrap();
        assert_eq!(
            location,
            Location {
                path: "src/main.c".into(),
                line: Some(2),
            }
        );
    }

    #[test]
    fn finds_keyword_in_file_name() {
        let dir = project();
        let location = Resolver::new(dir.path()).find("login_test").unwrap();
        assert_eq!(location.path, "src/login_test.py");
        assert_eq!(location.line, None);
    }

    #[test]
    fn hidden_files_are_not_searched() {
        let dir = project();
        let error = Resolver::new(dir.path()).find("REF-HIDDEN").unwrap_err();
        assert!(matches!(error, ReferenceError::KeywordNotFound(_)));
    }

    #[test]
    fn locates_file_references() {
        let dir = project();
        let resolver = Resolver::new(dir.path());

        let plain = Reference {
            path: "src/main.c".into(),
            keyword: None,
        };
        assert_eq!(resolver.locate(&plain).unwrap().line, None);

        let keyed = Reference {
            path: "src/main.c".into(),
            keyword: Some("REF-LOGIN".into()),
        };
        assert_eq!(resolver.locate(&keyed).unwrap().line, Some(2));

        let missing = Reference {
            path: "src/nope.c".into(),
            keyword: None,
        };
        assert!(matches!(
            resolver.locate(&missing),
            Err(ReferenceError::FileNotFound(_))
        ));

        let absent = Reference {
            path: "src/main.c".into(),
            keyword: Some("NOT-THERE".into()),
        };
        assert!(matches!(
            resolver.locate(&absent),
            Err(ReferenceError::KeywordNotInFile { .. })
        ));
    }
}
