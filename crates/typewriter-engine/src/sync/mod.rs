//! # Position Sync
//!
//! Keeps the editor and the preview pointing at the same place.
//!
//! - **Cursor → preview**: [`SyncController::sync_preview_to_cursor`] centres
//!   the preview on the block holding the caret line, offset into the block
//!   by how far along its line the caret is.
//! - **Click → cursor**: [`SyncController::handle_preview_click`] maps a
//!   clicked character back to a source line and column.
//! - **Scroll mirroring**: scroll percentages are copied between panes. Each
//!   pane has its own [`ScrollGuard`], armed only when the controller scrolls
//!   that pane, so the echo is swallowed while the user's own scrolling in the
//!   other pane keeps flowing.
//!
//! Time is passed in by the caller, which keeps the controller synchronous
//! and deterministic under test.
//!
//! ## Modules
//!
//! - **`host`**: editor and preview traits
//! - **`click`**: click resolution
//! - **`guard`**: echo suppression window

pub mod click;
pub mod guard;
pub mod host;

use std::time::{Duration, Instant};

use crate::outline::Heading;
use crate::render::{RenderOutput, render};
use crate::source::SourceDocument;

pub use click::{CaretTarget, Precision, resolve_click};
pub use guard::ScrollGuard;
pub use host::{CaretPosition, EditorHost, ElementRect, HostError, PreviewHost, SourceRange, TextHit};

/// Default echo suppression window.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub echo_window: Duration,
    pub auto_direction: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            echo_window: DEFAULT_ECHO_WINDOW,
            auto_direction: true,
        }
    }
}

/// How the preview position for the caret was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// The caret line has its own anchor.
    Exact(usize),
    /// The closest earlier anchored line.
    NearestEarlier(usize),
    /// No laid-out anchor; the preview scrolled by document fraction.
    Proportional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSync {
    pub target: ScrollTarget,
    pub scroll_top: f64,
}

/// Scroll position as a percentage of the scrollable range, 0 when the pane
/// does not scroll.
pub fn scroll_percent(scroll_top: f64, scroll_height: f64, client_height: f64) -> f64 {
    if scroll_height > client_height {
        scroll_top / (scroll_height - client_height) * 100.0
    } else {
        0.0
    }
}

/// Inverse of [`scroll_percent`].
pub fn scroll_top_for_percent(percent: f64, scroll_height: f64, client_height: f64) -> f64 {
    if scroll_height > client_height {
        percent / 100.0 * (scroll_height - client_height)
    } else {
        0.0
    }
}

/// How far along its line the caret is, from 0 to 1.
pub fn column_fraction(column: usize, line_len: usize) -> f64 {
    let fraction = column.saturating_sub(1) as f64 / line_len.max(1) as f64;
    fraction.clamp(0.0, 1.0)
}

pub struct SyncController<E, P> {
    editor: E,
    preview: P,
    source: SourceDocument,
    render: RenderOutput,
    /// Armed when the controller scrolls the preview.
    preview_guard: ScrollGuard,
    /// Armed when the controller scrolls the editor.
    editor_guard: ScrollGuard,
    options: SyncOptions,
}

impl<E: EditorHost, P: PreviewHost> SyncController<E, P> {
    pub fn new(editor: E, preview: P, options: SyncOptions) -> Self {
        Self {
            editor,
            preview,
            source: SourceDocument::default(),
            render: render("", options.auto_direction),
            preview_guard: ScrollGuard::new(options.echo_window),
            editor_guard: ScrollGuard::new(options.echo_window),
            options,
        }
    }

    /// Re-renders `source`, replacing the previous render.
    pub fn refresh(&mut self, source: &str) -> &RenderOutput {
        self.source = SourceDocument::new(source);
        self.render = render(source, self.options.auto_direction);
        &self.render
    }

    pub fn render_output(&self) -> &RenderOutput {
        &self.render
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn preview(&self) -> &P {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut P {
        &mut self.preview
    }

    pub fn into_parts(self) -> (E, P) {
        (self.editor, self.preview)
    }

    /// Scrolls the preview so the caret's position is centred.
    pub fn sync_preview_to_cursor(&mut self, now: Instant) -> Result<PreviewSync, HostError> {
        let caret = self.editor.cursor();
        let client = self.preview.client_height();
        let max_scroll = (self.preview.scroll_height() - client).max(0.0);

        let anchored = self
            .render
            .is_anchored(caret.line)
            .then(|| self.preview.anchor_rect(caret.line).map(|r| (ScrollTarget::Exact(caret.line), r)))
            .flatten()
            .or_else(|| self.nearest_earlier_rect(caret.line));

        let (target, wanted) = match anchored {
            Some((target, rect)) => {
                let fraction = column_fraction(caret.column, self.source.line_len_chars(caret.line));
                (target, rect.top + fraction * rect.height - client / 2.0)
            }
            None => {
                let lines = self.source.line_count().saturating_sub(1).max(1);
                let fraction = (caret.line.saturating_sub(1) as f64 / lines as f64).clamp(0.0, 1.0);
                (ScrollTarget::Proportional, fraction * max_scroll)
            }
        };
        let scroll_top = wanted.clamp(0.0, max_scroll);

        self.preview_guard.suppress(now);
        self.preview.set_scroll_top(scroll_top)?;
        log::debug!(
            "preview synced to {}:{} via {target:?}, scroll_top {scroll_top:.1}",
            caret.line,
            caret.column
        );
        Ok(PreviewSync { target, scroll_top })
    }

    fn nearest_earlier_rect(&self, line: usize) -> Option<(ScrollTarget, ElementRect)> {
        self.render
            .anchored_lines
            .range(..line)
            .rev()
            .find_map(|&l| Some((ScrollTarget::NearestEarlier(l), self.preview.anchor_rect(l)?)))
    }

    /// Mirrors a preview scroll into the editor unless it is our own echo.
    ///
    /// Returns whether the editor was scrolled.
    pub fn on_preview_scrolled(&mut self, now: Instant) -> Result<bool, HostError> {
        if self.preview_guard.is_suppressed(now) {
            log::trace!("preview scroll echo ignored");
            return Ok(false);
        }
        let percent = scroll_percent(
            self.preview.scroll_top(),
            self.preview.scroll_height(),
            self.preview.client_height(),
        );
        self.editor_guard.suppress(now);
        self.editor.set_scroll_percent(percent)?;
        Ok(true)
    }

    /// Mirrors an editor scroll into the preview unless it is our own echo.
    pub fn on_editor_scrolled(&mut self, now: Instant) -> Result<bool, HostError> {
        if self.editor_guard.is_suppressed(now) {
            log::trace!("editor scroll echo ignored");
            return Ok(false);
        }
        let top = scroll_top_for_percent(
            self.editor.scroll_percent(),
            self.preview.scroll_height(),
            self.preview.client_height(),
        );
        self.preview_guard.suppress(now);
        self.preview.set_scroll_top(top)?;
        Ok(true)
    }

    /// Moves the editor caret to the clicked source position.
    ///
    /// Returns `None` when the click landed on nothing that maps to a line.
    pub fn handle_preview_click(&mut self, x: f64, y: f64) -> Result<Option<CaretTarget>, HostError> {
        let Some(hit) = self.preview.caret_from_point(x, y) else {
            return Ok(None);
        };
        let Some(target) = resolve_click(&self.render, &self.source, &hit) else {
            log::debug!("click at ({x}, {y}) maps to no source line");
            return Ok(None);
        };
        self.editor
            .set_cursor(CaretPosition::new(target.line, target.column))?;
        log::debug!("click mapped to {}:{} ({:?})", target.line, target.column, target.precision);
        Ok(Some(target))
    }

    /// Puts the caret at the start of `heading` and brings it into view.
    pub fn jump_to_heading(&mut self, heading: &Heading, now: Instant) -> Result<PreviewSync, HostError> {
        self.editor.set_cursor(CaretPosition::new(heading.line, 1))?;
        self.sync_preview_to_cursor(now)
    }

    /// Inserts `text` at the caret.
    pub fn insert_snippet(&mut self, text: &str) -> Result<(), HostError> {
        let at = self.editor.cursor();
        self.editor.insert_text(SourceRange::collapsed(at), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::extract_headings;
    use crate::render::tree::find_text_path;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeEditor {
        cursor: Option<CaretPosition>,
        scroll_percent: f64,
        inserted: Vec<(SourceRange, String)>,
    }

    impl EditorHost for FakeEditor {
        fn cursor(&self) -> CaretPosition {
            self.cursor.unwrap_or(CaretPosition::new(1, 1))
        }

        fn set_cursor(&mut self, position: CaretPosition) -> Result<(), HostError> {
            self.cursor = Some(position);
            Ok(())
        }

        fn scroll_percent(&self) -> f64 {
            self.scroll_percent
        }

        fn set_scroll_percent(&mut self, percent: f64) -> Result<(), HostError> {
            self.scroll_percent = percent;
            Ok(())
        }

        fn insert_text(&mut self, range: SourceRange, text: &str) -> Result<(), HostError> {
            self.inserted.push((range, text.to_string()));
            Ok(())
        }
    }

    struct FakePreview {
        scroll_top: f64,
        scroll_height: f64,
        client_height: f64,
        rects: HashMap<usize, ElementRect>,
        hit: Option<TextHit>,
    }

    impl Default for FakePreview {
        fn default() -> Self {
            Self {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                client_height: 400.0,
                rects: HashMap::new(),
                hit: None,
            }
        }
    }

    impl PreviewHost for FakePreview {
        fn scroll_top(&self) -> f64 {
            self.scroll_top
        }

        fn set_scroll_top(&mut self, top: f64) -> Result<(), HostError> {
            self.scroll_top = top;
            Ok(())
        }

        fn scroll_height(&self) -> f64 {
            self.scroll_height
        }

        fn client_height(&self) -> f64 {
            self.client_height
        }

        fn anchor_rect(&self, line: usize) -> Option<ElementRect> {
            self.rects.get(&line).copied()
        }

        fn caret_from_point(&self, _x: f64, _y: f64) -> Option<TextHit> {
            self.hit.clone()
        }
    }

    fn controller(source: &str) -> SyncController<FakeEditor, FakePreview> {
        let mut c = SyncController::new(FakeEditor::default(), FakePreview::default(), SyncOptions::default());
        c.refresh(source);
        c
    }

    #[test]
    fn cursor_on_anchored_line_centres_its_block() {
        let mut c = controller("# Title\n\nabcdefghij");
        c.preview_mut().rects.insert(3, ElementRect { top: 1000.0, height: 100.0 });
        c.editor_mut().cursor = Some(CaretPosition::new(3, 6));

        let sync = c.sync_preview_to_cursor(Instant::now()).unwrap();
        assert_eq!(sync.target, ScrollTarget::Exact(3));
        // 1000 + 0.5 * 100 - 400 / 2
        assert_eq!(sync.scroll_top, 850.0);
        assert_eq!(c.preview().scroll_top, 850.0);
    }

    #[test]
    fn cursor_inside_code_uses_nearest_earlier_anchor() {
        let mut c = controller("intro\n\n```\ncode\n```");
        c.preview_mut().rects.insert(1, ElementRect { top: 300.0, height: 20.0 });
        c.editor_mut().cursor = Some(CaretPosition::new(4, 1));

        let sync = c.sync_preview_to_cursor(Instant::now()).unwrap();
        assert_eq!(sync.target, ScrollTarget::NearestEarlier(1));
        assert_eq!(sync.scroll_top, 100.0);
    }

    #[test]
    fn scroll_is_clamped_to_range() {
        let mut c = controller("# a\n\nb");
        c.preview_mut().rects.insert(1, ElementRect { top: 10.0, height: 10.0 });
        c.preview_mut().rects.insert(3, ElementRect { top: 5000.0, height: 10.0 });

        assert_eq!(c.sync_preview_to_cursor(Instant::now()).unwrap().scroll_top, 0.0);
        c.editor_mut().cursor = Some(CaretPosition::new(3, 1));
        assert_eq!(c.sync_preview_to_cursor(Instant::now()).unwrap().scroll_top, 1600.0);
    }

    #[test]
    fn without_rects_scroll_is_proportional() {
        let mut c = controller("a\nb\nc\nd\ne");
        c.editor_mut().cursor = Some(CaretPosition::new(3, 1));
        let sync = c.sync_preview_to_cursor(Instant::now()).unwrap();
        assert_eq!(sync.target, ScrollTarget::Proportional);
        assert_eq!(sync.scroll_top, 800.0);
    }

    #[test]
    fn programmatic_scroll_echo_is_ignored() {
        let mut c = controller("# a\n\nb");
        let start = Instant::now();
        c.sync_preview_to_cursor(start).unwrap();

        assert!(!c.on_preview_scrolled(start + Duration::from_millis(100)).unwrap());
        assert!(c.on_preview_scrolled(start + Duration::from_millis(300)).unwrap());
    }

    #[test]
    fn scroll_percentages_are_mirrored() {
        let mut c = controller("text");
        let start = Instant::now();
        c.preview_mut().scroll_top = 400.0;
        assert!(c.on_preview_scrolled(start).unwrap());
        assert_eq!(c.editor().scroll_percent, 25.0);

        c.editor_mut().scroll_percent = 50.0;
        // echo of the editor scroll we just caused
        assert!(!c.on_editor_scrolled(start + Duration::from_millis(10)).unwrap());
        assert!(c.on_editor_scrolled(start + Duration::from_millis(500)).unwrap());
        assert_eq!(c.preview().scroll_top, 800.0);
    }

    #[test]
    fn repeated_user_scroll_in_one_pane_keeps_mirroring() {
        let mut c = controller("text");
        let start = Instant::now();
        c.preview_mut().scroll_top = 400.0;
        assert!(c.on_preview_scrolled(start).unwrap());
        c.preview_mut().scroll_top = 800.0;
        assert!(c.on_preview_scrolled(start + Duration::from_millis(50)).unwrap());
        assert_eq!(c.editor().scroll_percent, 50.0);
    }

    #[test]
    fn cursor_sync_leaves_editor_scroll_live() {
        let mut c = controller("# a\n\nb");
        let start = Instant::now();
        c.sync_preview_to_cursor(start).unwrap();
        c.editor_mut().scroll_percent = 25.0;
        assert!(c.on_editor_scrolled(start + Duration::from_millis(10)).unwrap());
        assert_eq!(c.preview().scroll_top, 400.0);
    }

    #[test]
    fn click_moves_caret() {
        let mut c = controller("\n\n#### Hello World");
        let path = find_text_path(&c.render_output().fragment, "Hello World").unwrap();
        c.preview_mut().hit = Some(TextHit { path, offset: 4 });

        let target = c.handle_preview_click(10.0, 10.0).unwrap().unwrap();
        assert_eq!((target.line, target.column), (3, 10));
        assert_eq!(c.editor().cursor, Some(CaretPosition::new(3, 10)));
    }

    #[test]
    fn click_on_nothing_leaves_caret() {
        let mut c = controller("text");
        assert_eq!(c.handle_preview_click(0.0, 0.0).unwrap(), None);
        assert_eq!(c.editor().cursor, None);
    }

    #[test]
    fn outline_jump_moves_caret_and_preview() {
        let source = "# One\n\ntext\n\n## Two";
        let mut c = controller(source);
        c.preview_mut().rects.insert(5, ElementRect { top: 900.0, height: 40.0 });
        let heading = extract_headings(source).nth(1).unwrap();

        let sync = c.jump_to_heading(&heading, Instant::now()).unwrap();
        assert_eq!(c.editor().cursor, Some(CaretPosition::new(5, 1)));
        assert_eq!(sync.target, ScrollTarget::Exact(5));
        assert_eq!(sync.scroll_top, 700.0);
    }

    #[test]
    fn snippet_goes_in_at_caret() {
        let mut c = controller("abc");
        c.editor_mut().cursor = Some(CaretPosition::new(1, 2));
        c.insert_snippet("**").unwrap();
        assert_eq!(
            c.editor().inserted,
            vec![(SourceRange::collapsed(CaretPosition::new(1, 2)), "**".to_string())]
        );
    }

    #[test]
    fn refresh_replaces_render() {
        let mut c = controller("one");
        assert!(c.render_output().is_anchored(1));
        c.refresh("");
        assert!(c.render_output().html.is_empty());
        assert!(!c.render_output().is_anchored(1));
    }

    #[test]
    fn fractions() {
        assert_eq!(column_fraction(1, 10), 0.0);
        assert_eq!(column_fraction(6, 10), 0.5);
        assert_eq!(column_fraction(50, 10), 1.0);
        assert_eq!(column_fraction(1, 0), 0.0);
        assert_eq!(scroll_percent(10.0, 100.0, 200.0), 0.0);
    }
}
