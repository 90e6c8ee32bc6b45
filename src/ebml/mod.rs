//! Generic EBML parsing over a random-access byte source.
//!
//! The reader decodes variable-length ids and sizes, classifies elements
//! through the static [`registry`], and materializes typed payloads. Master
//! elements are never descended implicitly; callers iterate their byte
//! range explicitly via [`Reader::iter`] or search it by id with a
//! [`Searcher`].

pub mod element;
pub mod reader;
pub mod registry;

pub use element::{Element, ElementId, ElementKind, ElementValue};
pub use reader::{ElementIter, ElementRange, Reader, Searcher};
