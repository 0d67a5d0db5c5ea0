use std::path::Path;

use serde::{Deserialize, Serialize};

/// Settings that control how documents are published.
///
/// The configuration is an immutable value handed to the publishers; nothing
/// reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublishConfig {
    /// Whether item identifiers become hyperlinks and link targets.
    pub linkify: bool,

    /// Whether external references are looked up in the project files.
    ///
    /// When `false`, references are published as written.
    pub check_ref: bool,

    /// Whether heading items show their level.
    pub publish_heading_levels: bool,

    /// Whether body items show their level.
    pub publish_body_levels: bool,

    /// Whether item headers are shown next to the identifier.
    pub enable_headers: bool,

    /// Whether child links are published in addition to parent links.
    pub publish_child_links: bool,

    /// Whether Markdown documents start with a table of contents.
    pub toc: bool,

    /// Whether a traceability matrix is published with the documents.
    pub matrix: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            linkify: true,
            check_ref: false,
            publish_heading_levels: true,
            publish_body_levels: true,
            enable_headers: true,
            publish_child_links: true,
            toc: false,
            matrix: true,
        }
    }
}

impl PublishConfig {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }
}

const fn yes() -> bool {
    true
}

/// The serialized versions of the configuration.
///
/// New versions can be added here without breaking existing files.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "yes")]
        linkify: bool,

        #[serde(default)]
        check_ref: bool,

        #[serde(default = "yes")]
        publish_heading_levels: bool,

        #[serde(default = "yes")]
        publish_body_levels: bool,

        #[serde(default = "yes")]
        enable_headers: bool,

        #[serde(default = "yes")]
        publish_child_links: bool,

        #[serde(default)]
        toc: bool,

        #[serde(default = "yes")]
        matrix: bool,
    },
}

impl From<Versions> for PublishConfig {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                linkify,
                check_ref,
                publish_heading_levels,
                publish_body_levels,
                enable_headers,
                publish_child_links,
                toc,
                matrix,
            } => Self {
                linkify,
                check_ref,
                publish_heading_levels,
                publish_body_levels,
                enable_headers,
                publish_child_links,
                toc,
                matrix,
            },
        }
    }
}

impl From<PublishConfig> for Versions {
    fn from(config: PublishConfig) -> Self {
        Self::V1 {
            linkify: config.linkify,
            check_ref: config.check_ref,
            publish_heading_levels: config.publish_heading_levels,
            publish_body_levels: config.publish_body_levels,
            enable_headers: config.enable_headers,
            publish_child_links: config.publish_child_links,
            toc: config.toc,
            matrix: config.matrix,
        }
    }
}
