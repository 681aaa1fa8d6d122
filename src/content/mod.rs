//! Content module - documents, front-matter, fences and permalinks

mod document;
mod error;
pub mod fences;
pub mod frontmatter;
pub mod loader;
pub mod permalink;

pub use document::{find_sections, Document, DocumentKind, Section};
pub use error::ContentError;
pub use fences::CodeBlock;
pub use frontmatter::FrontMatter;
pub use permalink::Permalink;
