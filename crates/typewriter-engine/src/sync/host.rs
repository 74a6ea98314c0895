//! Interfaces to the editor and preview widgets.
//!
//! The sync controller only talks to its environment through these traits,
//! so the same logic drives a browser DOM, a native view or a test fake.

/// Error raised by a host operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Host operation failed: {0}")]
pub struct HostError(pub String);

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError(s.to_string())
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError(s)
    }
}

/// A caret position, both fields 1-based. `column` counts chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaretPosition {
    pub line: usize,
    pub column: usize,
}

impl CaretPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A source range between two caret positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start: CaretPosition,
    pub end: CaretPosition,
}

impl SourceRange {
    pub fn collapsed(at: CaretPosition) -> Self {
        Self { start: at, end: at }
    }
}

/// Vertical extent of a preview element, in scroll-content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f64,
    pub height: f64,
}

/// A text position under a point: the child-index path of the hit node in
/// the rendered fragment and a char offset into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextHit {
    pub path: Vec<usize>,
    pub offset: usize,
}

/// The source editor.
pub trait EditorHost {
    fn cursor(&self) -> CaretPosition;

    fn set_cursor(&mut self, position: CaretPosition) -> Result<(), HostError>;

    /// Scroll position as a percentage (0 to 100) of the scrollable range.
    fn scroll_percent(&self) -> f64;

    fn set_scroll_percent(&mut self, percent: f64) -> Result<(), HostError>;

    fn insert_text(&mut self, range: SourceRange, text: &str) -> Result<(), HostError>;
}

/// The rendered preview pane.
pub trait PreviewHost {
    fn scroll_top(&self) -> f64;

    fn set_scroll_top(&mut self, top: f64) -> Result<(), HostError>;

    fn scroll_height(&self) -> f64;

    fn client_height(&self) -> f64;

    /// Rect of the element holding the anchor for `line`, if it is laid out.
    fn anchor_rect(&self, line: usize) -> Option<ElementRect>;

    /// The text position under a point, if any.
    fn caret_from_point(&self, x: f64, y: f64) -> Option<TextHit>;
}
