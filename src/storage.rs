pub mod doorstop;
pub mod template;

pub use doorstop::{LoadError, load_document, load_tree};
pub use template::{Template, TemplateData, TemplateError};
