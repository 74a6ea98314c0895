//! Core of the TypeWriterPro editor: bidirectional Markdown rendering with a
//! per-character map from preview text back to source columns, and the
//! controller that keeps editor and preview positions in step.

pub mod align;
pub mod direction;
pub mod outline;
pub mod render;
pub mod snippets;
pub mod source;
pub mod stats;
pub mod store;
pub mod sync;

// Re-export key types for easier usage
pub use direction::{Direction, TextDirection, classify, classify_dominant};
pub use outline::{Heading, extract_headings, heading_id};
pub use render::{CharMap, RenderError, RenderOutput, RenderPath, render};
pub use source::SourceDocument;
pub use store::{DocumentStore, MemoryStore, StoreError, StoredDocument};
pub use sync::{CaretTarget, EditorHost, PreviewHost, SyncController, SyncOptions};
