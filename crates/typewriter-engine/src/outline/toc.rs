use super::Heading;

/// Markdown table of contents, one bullet per heading, indented by level.
///
/// Returns an empty string when there are no headings.
pub fn toc_markdown(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut md = String::from("## Table of Contents\n\n");
    for h in headings {
        let indent = "  ".repeat(usize::from(h.level.saturating_sub(1)));
        md.push_str(&format!("{indent}- [{}](#{})\n", h.text, h.id));
    }
    md
}

/// HTML table of contents as a flat `<nav>` list; nesting is expressed
/// through `toc-level-N` classes.
pub fn toc_html(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut html = String::from(
        r#"<nav class="toc" aria-label="Table of contents"><h2>Table of Contents</h2><ul>"#,
    );
    for h in headings {
        html.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
            h.level,
            html_escape::encode_double_quoted_attribute(&h.id),
            html_escape::encode_text(&h.text),
        ));
    }
    html.push_str("</ul></nav>");
    html
}
