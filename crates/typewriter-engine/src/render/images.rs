//! Recovering the Markdown behind an image placeholder, so an image editor
//! can rewrite exactly the snippet the user wrote.

use super::preprocess::IMAGE_COMMENT_PREFIX;

/// The `![alt](url)` source text of placeholder `image_id` in rendered html.
pub fn find_image_markdown(html: &str, image_id: &str) -> Option<String> {
    let marker = format!(r#"data-image-id="{image_id}" />{IMAGE_COMMENT_PREFIX}"#);
    let start = html.find(&marker)? + marker.len();
    let len = html[start..].find("-->")?;
    urlencoding::decode(&html[start..start + len])
        .ok()
        .map(|s| s.into_owned())
}

/// Replaces the first occurrence of `original` in `source`.
///
/// Returns `None` when the snippet is no longer in the source.
pub fn replace_image_markdown(source: &str, original: &str, replacement: &str) -> Option<String> {
    if original.is_empty() || !source.contains(original) {
        return None;
    }
    Some(source.replacen(original, replacement, 1))
}
