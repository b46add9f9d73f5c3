//! docref: cross-document reference resolution for linked JSON/YAML trees
//!
//! Documents reference each other through relative links of the form
//! `resource#/pointer/path`. This crate resolves both halves in one
//! operation:
//! - A caching [`DocumentLoader`] indexes parsed trees by canonical
//!   location and by a declared `$id` identifier
//! - [`Pointer`] and [`Reference`] perform type-checked descent/ascent
//!   through a tree with precise error locations
//! - [`resolver::resolve`] interprets the three syntactic forms of a
//!   relative reference, crossing documents through the loader
//!
//! The JSON/YAML parsers (serde_json, serde_yaml) and the byte-stream
//! opener are external collaborators; the opener is pluggable via the
//! [`Opener`] trait. Everything is synchronous and single-threaded.
//!
//! ```no_run
//! use docref::{DocumentLoader, Expect};
//!
//! # fn main() -> docref::Result<()> {
//! let mut loader = DocumentLoader::with_file_opener();
//! let root = loader.load_root("file:///etc/app/pipeline.json")?;
//! let stage = loader.resolve(&root, "stages.yaml#/deploy")?;
//! let name = stage.child_typed("name", Expect::STRING)?;
//! println!("{}", name);
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod loader;
pub mod pointer;
pub mod reference;
pub mod resolver;
pub mod tree;

// Re-export the working surface
pub use document::Document;
pub use error::{ResolveError, Result};
pub use loader::{looks_like_yaml, DocumentLoader, FileOpener, OpenedResource, Opener};
pub use pointer::Pointer;
pub use reference::Reference;
pub use resolver::resolve;
pub use tree::{Expect, NodeKind};
