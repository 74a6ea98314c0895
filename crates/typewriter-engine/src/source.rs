/// Source text split into lines, addressed the way the editor addresses them.
///
/// Lines are split on `\n` only; a trailing `\r` stays part of its line.
/// Line numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines; an empty document has one empty line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The text of 1-based line `n`, without its terminating `\n`.
    pub fn line(&self, n: usize) -> Option<&str> {
        let start = *self.line_starts.get(n.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(n)
            .map_or(self.text.len(), |next| next - 1);
        Some(&self.text[start..end])
    }

    /// Length of line `n` in chars, 0 for lines past the end.
    pub fn line_len_chars(&self, n: usize) -> usize {
        self.line(n).map_or(0, |l| l.chars().count())
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        (1..=self.line_count()).filter_map(|n| self.line(n).map(|l| (n, l)))
    }
}
