//! Domain models for requirements publishing.
//!
//! This module contains the items, documents and trees being published, the
//! identifiers and levels that order them, and the publishing configuration.

mod config;
pub use config::PublishConfig;

mod document;
pub use document::{Document, DocumentAttributes};

mod item;
pub use item::{Item, Reference};

mod level;
pub use level::{InvalidLevelError, Level};

/// Locating external references in project files.
pub mod references;

mod tree;
pub use tree::{ItemView, TraceRow, Tree, TreeError};

mod uid;
pub use uid::{InvalidIdError, Prefix, Uid};
