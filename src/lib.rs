//! Publishing doorstop requirements trees
//!
//! A doorstop project is a tree of documents, each a directory of YAML item
//! files. This crate loads the tree, converts item text from Markdown to
//! LaTeX and publishes every document, with a traceability matrix, as
//! Markdown or LaTeX.

pub mod convert;

pub mod domain;
pub use domain::{Document, Item, ItemView, Level, Prefix, PublishConfig, Tree, Uid};

pub mod publish;
pub use publish::{Context, Format, PublishError, Publisher, publish_tree};

/// Loading doorstop trees and LaTeX templates from disk.
pub mod storage;
pub use storage::{LoadError, Template, load_tree};
