//! # Insertable Snippets
//!
//! Generators behind the Markdown helper tools. Each returns text ready to
//! insert at the caret, ending in a blank line so the next block starts
//! cleanly.
//!
//! Values are inserted as given. Callers pass text the user typed for their
//! own document, so nothing is escaped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }

    /// `justify-content` value placing flex content on this side.
    pub fn as_flex(self) -> &'static str {
        match self {
            TextAlign::Left => "flex-start",
            TextAlign::Center => "center",
            TextAlign::Right => "flex-end",
        }
    }
}

/// `# text` for levels 1 to 6; levels outside the range are clamped.
pub fn heading(level: u8, text: &str) -> String {
    format!("{} {text}\n\n", "#".repeat(usize::from(level.clamp(1, 6))))
}

pub fn code_block(language: &str, code: &str) -> String {
    format!("```{language}\n{code}\n```\n\n")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnippet {
    pub rows: usize,
    pub columns: usize,
    pub header_bg_color: String,
    pub cell_bg_color: String,
    pub border_color: String,
    pub border_width: u32,
    pub text_align: TextAlign,
    pub font_size: u32,
    pub font_family: String,
}

/// An HTML table with numbered header and data placeholders.
pub fn table(config: &TableSnippet) -> String {
    let cell_style = format!(
        "border: {}px solid {}; padding: 8px; text-align: {};",
        config.border_width,
        config.border_color,
        config.text_align.as_css()
    );
    let mut out = format!(
        "<table style=\"width: 100%; border-collapse: collapse; font-family: {}; font-size: {}px;\">\n",
        config.font_family, config.font_size
    );

    out.push_str(&format!(
        "  <tr style=\"background-color: {};\">\n",
        config.header_bg_color
    ));
    for col in 1..=config.columns {
        out.push_str(&format!("    <th style=\"{cell_style}\">عنوان {col}</th>\n"));
    }
    out.push_str("  </tr>\n");

    for row in 1..=config.rows {
        out.push_str(&format!(
            "  <tr style=\"background-color: {};\">\n",
            config.cell_bg_color
        ));
        for col in 1..=config.columns {
            out.push_str(&format!("    <td style=\"{cell_style}\">داده {row}-{col}</td>\n"));
        }
        out.push_str("  </tr>\n");
    }

    out.push_str("</table>\n\n");
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterSnippet {
    pub text: String,
    pub page_number: bool,
    pub align: TextAlign,
    pub font_size: u32,
    pub color: String,
    pub font_family: String,
}

/// Placeholder replaced with the page number at export time.
pub const PAGE_PLACEHOLDER: &str = "{page}";

pub fn footer(config: &FooterSnippet) -> String {
    let page = if config.page_number {
        format!(" - صفحه {PAGE_PLACEHOLDER}")
    } else {
        String::new()
    };
    format!(
        "<footer style=\"display: flex; justify-content: {}; font-size: {}px; color: {}; \
         font-family: {}; padding: 1rem; margin-top: 2rem; border-top: 1px solid #ccc;\">\n  \
         {}{page}\n</footer>\n\n",
        config.align.as_flex(),
        config.font_size,
        config.color,
        config.font_family,
        config.text,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSnippet {
    pub content: String,
    pub background_color: String,
    pub text_color: String,
    pub font_size: u32,
    pub font_family: String,
    pub border_width: u32,
    pub border_color: String,
    pub border_radius: u32,
    pub padding: u32,
    pub text_align: TextAlign,
}

pub fn styled_box(config: &BoxSnippet) -> String {
    format!(
        "<div style=\"background-color: {}; color: {}; font-size: {}px; font-family: {}; \
         border: {}px solid {}; border-radius: {}px; padding: {}px; text-align: {}; \
         line-height: 1.6;\">\n  {}\n</div>\n\n",
        config.background_color,
        config.text_color,
        config.font_size,
        config.font_family,
        config.border_width,
        config.border_color,
        config.border_radius,
        config.padding,
        config.text_align.as_css(),
        config.content,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParagraphFont {
    Nazanin,
    Vazirmatn,
    IranSans,
    Inter,
    JetBrainsMono,
    Monospace,
}

impl ParagraphFont {
    pub fn css_family(self) -> &'static str {
        match self {
            ParagraphFont::Nazanin => "'B Nazanin', serif",
            ParagraphFont::Vazirmatn => "'Vazirmatn', sans-serif",
            ParagraphFont::IranSans => "'Iran Sans', sans-serif",
            ParagraphFont::Inter => "'Inter', sans-serif",
            ParagraphFont::JetBrainsMono => "'JetBrains Mono', monospace",
            ParagraphFont::Monospace => "monospace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphSnippet {
    pub content: String,
    pub farsi_font: ParagraphFont,
    pub english_font: ParagraphFont,
    pub font_size: u32,
    pub color: String,
    pub background_color: Option<String>,
    pub line_height: f32,
    /// Pixels.
    pub letter_spacing: f32,
    /// `left`, `right`, `center` or `justify`.
    pub text_align: String,
}

/// A `dir="auto"` paragraph with the Farsi font first and the English font as
/// fallback.
pub fn paragraph(config: &ParagraphSnippet) -> String {
    let (background, padding) = match &config.background_color {
        Some(color) => (format!("background-color: {color};"), "padding: 1rem;"),
        None => (String::new(), ""),
    };
    format!(
        "<p dir=\"auto\" style=\"font-family: {}, {}; font-size: {}px; color: {}; \
         line-height: {}; letter-spacing: {}px; text-align: {}; {background} {padding} \
         margin: 1rem 0;\">\n  {}\n</p>\n\n",
        config.farsi_font.css_family(),
        config.english_font.css_family(),
        config.font_size,
        config.color,
        config.line_height,
        config.letter_spacing,
        config.text_align,
        config.content,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderTemplate {
    pub title: String,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub title_font: String,
    pub meta_font: String,
    pub title_size: u32,
    pub meta_size: u32,
    pub title_color: String,
}

pub fn header_template(config: &HeaderTemplate) -> String {
    let meta: String = [&config.subject, &config.date]
        .into_iter()
        .flatten()
        .map(|m| format!("<span>{m}</span>"))
        .collect();
    format!(
        "<header dir=\"auto\" style=\"padding: 1rem 0; margin-bottom: 1rem;\">\n  \
         <h1 style=\"font-family: {}; font-size: {}px; color: {}; margin: 0 0 0.5rem;\">{}</h1>\n  \
         <div style=\"font-family: {}; font-size: {}px; color: #666; display: flex; gap: 1rem;\">{meta}</div>\n\
         </header>\n\n",
        config.title_font,
        config.title_size,
        config.title_color,
        config.title,
        config.meta_font,
        config.meta_size,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Double,
}

impl BorderStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            BorderStyle::Solid => "solid",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderSnippet {
    pub style: BorderStyle,
    pub color: String,
    pub width: u32,
    pub radius: u32,
    pub padding: u32,
}

/// Wraps existing HTML in a bordered `<div>`.
pub fn border_wrapper(content_html: &str, config: &BorderSnippet) -> String {
    format!(
        "<div style=\"border: {}px {} {}; border-radius: {}px; padding: {}px;\">\n{content_html}\n</div>\n\n",
        config.width,
        config.style.as_css(),
        config.color,
        config.radius,
        config.padding,
    )
}
