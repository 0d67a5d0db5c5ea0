//! LaTeX template data.
//!
//! A template is a document class `template/<name>.cls` together with a
//! `<name>.yml` file describing how the wrapper document uses it.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Keys every template data file must define.
pub const REQUIRED_KEYS: [&str; 5] = [
    "documentclass",
    "usepackage",
    "before_begin_document",
    "after_begin_document",
    "tracability_matrix",
];

/// The name of the built-in template.
pub const DEFAULT_TEMPLATE: &str = "doorstop";

/// A LaTeX template: its name and the data read from `<name>.yml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The template name, used as the document class.
    pub name: String,
    /// The template configuration.
    pub data: TemplateData,
}

/// The contents of a template data file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateData {
    /// Options passed to the document class.
    pub documentclass: Vec<String>,

    /// Packages to load, with their options, in file order.
    #[serde(deserialize_with = "packages")]
    pub usepackage: Vec<(String, Vec<String>)>,

    /// Lines inserted before `\begin{document}`.
    pub before_begin_document: Vec<String>,

    /// Lines inserted after `\begin{document}`.
    pub after_begin_document: Vec<String>,

    /// Graphics to include after the documents, with their section titles.
    #[serde(default, deserialize_with = "graphics")]
    pub include_graphics: Option<Vec<(String, Option<String>)>>,

    /// Whether the wrapper includes the traceability matrix.
    pub tracability_matrix: bool,
}

/// Errors raised while loading a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template data file could not be read.
    #[error("failed to read template data {}", path.display())]
    Io {
        /// The data file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The template data file is not valid YAML.
    #[error("failed to parse template data {}", path.display())]
    Yaml {
        /// The data file.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// A required key is missing.
    #[error("template data {} is missing required key '{key}'", path.display())]
    MissingKey {
        /// The data file.
        path: PathBuf,
        /// The missing key.
        key: &'static str,
    },
}

impl Template {
    /// Loads the template data from `path`, naming the template after the
    /// file stem.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or lacks a required key.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let name = path
            .file_stem()
            .map_or_else(|| DEFAULT_TEMPLATE.to_string(), |s| s.to_string_lossy().into_owned());
        tracing::info!("loading template data from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let yaml_error = |source| TemplateError::Yaml {
            path: path.to_path_buf(),
            source,
        };

        let value: serde_yaml::Value = serde_yaml::from_str(&content).map_err(yaml_error)?;
        check_keys(&value, path)?;
        let data = serde_yaml::from_value(value).map_err(yaml_error)?;

        Ok(Self { name, data })
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            name: DEFAULT_TEMPLATE.to_string(),
            data: TemplateData {
                documentclass: vec!["a4paper".to_string(), "twoside".to_string()],
                usepackage: vec![
                    ("inputenc".to_string(), vec!["utf8".to_string()]),
                    ("amsmath".to_string(), Vec::new()),
                    ("graphicx".to_string(), Vec::new()),
                    ("longtable".to_string(), Vec::new()),
                    ("listings".to_string(), Vec::new()),
                    ("plantuml".to_string(), Vec::new()),
                    ("hyperref".to_string(), Vec::new()),
                    ("zref-user".to_string(), Vec::new()),
                    ("zref-xr".to_string(), Vec::new()),
                ],
                before_begin_document: Vec::new(),
                after_begin_document: vec![r"\tableofcontents".to_string(), r"\newpage".to_string()],
                include_graphics: None,
                tracability_matrix: true,
            },
        }
    }
}

fn check_keys(value: &serde_yaml::Value, path: &Path) -> Result<(), TemplateError> {
    for key in REQUIRED_KEYS {
        if value.get(key).is_none() {
            return Err(TemplateError::MissingKey {
                path: path.to_path_buf(),
                key,
            });
        }
    }
    Ok(())
}

/// Reads an ordered mapping of package names to (optional) option lists.
fn packages<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<String>)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
    mapping
        .into_iter()
        .map(|(name, options)| {
            let name: String = serde_yaml::from_value(name).map_err(serde::de::Error::custom)?;
            let options: Option<Vec<String>> =
                serde_yaml::from_value(options).map_err(serde::de::Error::custom)?;
            Ok((name, options.unwrap_or_default()))
        })
        .collect()
}

/// Reads an ordered mapping of graphics files to optional section titles.
///
/// Titles may be given as a string or as a one-element list.
fn graphics<'de, D>(deserializer: D) -> Result<Option<Vec<(String, Option<String>)>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(mapping) = Option::<serde_yaml::Mapping>::deserialize(deserializer)? else {
        return Ok(None);
    };
    mapping
        .into_iter()
        .map(|(file, label)| {
            let file: String = serde_yaml::from_value(file).map_err(serde::de::Error::custom)?;
            let label = match label {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Sequence(items) => items
                    .into_iter()
                    .find_map(|item| item.as_str().map(str::to_string)),
                _ => None,
            };
            Ok((file, label))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r"documentclass:
  - a4paper
  - twoside
usepackage:
  geometry:
    - margin=2cm
  hyperref:
  xcolor: []
before_begin_document:
  - \title{Requirements}
after_begin_document:
  - \maketitle
include_graphics:
  overview.png: Overview
  detail.png:
    - Detail View
tracability_matrix: true
";

    fn write(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_template_data() {
        let (_dir, path) = write(FULL);
        let template = Template::load(&path).unwrap();

        assert_eq!(template.name, "custom");
        assert_eq!(template.data.documentclass, ["a4paper", "twoside"]);
        assert_eq!(
            template.data.usepackage,
            [
                ("geometry".to_string(), vec!["margin=2cm".to_string()]),
                ("hyperref".to_string(), Vec::new()),
                ("xcolor".to_string(), Vec::new()),
            ]
        );
        assert_eq!(template.data.after_begin_document, [r"\maketitle"]);
        assert_eq!(
            template.data.include_graphics,
            Some(vec![
                ("overview.png".to_string(), Some("Overview".to_string())),
                ("detail.png".to_string(), Some("Detail View".to_string())),
            ])
        );
        assert!(template.data.tracability_matrix);
    }

    #[test]
    fn missing_key_is_reported() {
        let (_dir, path) = write(&FULL.replace("tracability_matrix: true\n", ""));
        let error = Template::load(&path).unwrap_err();
        assert!(matches!(
            error,
            TemplateError::MissingKey {
                key: "tracability_matrix",
                ..
            }
        ));
    }

    #[test]
    fn graphics_are_optional() {
        let start = FULL.find("include_graphics").unwrap();
        let end = FULL.find("tracability_matrix").unwrap();
        let without = format!("{}{}", &FULL[..start], &FULL[end..]);
        let (_dir, path) = write(&without);
        assert_eq!(Template::load(&path).unwrap().data.include_graphics, None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Template::load(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(error, TemplateError::Io { .. }));
    }

    #[test]
    fn default_template_includes_matrix() {
        let template = Template::default();
        assert_eq!(template.name, DEFAULT_TEMPLATE);
        assert!(template.data.tracability_matrix);
    }
}
