//! # Preview Tree
//!
//! A small owned HTML tree. The renderer builds it from parser events,
//! annotates it, then serialises it once. Hosts that mirror the serialised
//! HTML in a DOM can address nodes by child-index paths into the same tree.
//!
//! Serialisation writes no whitespace between nodes, so the child indices a
//! DOM reports for the parsed output match the indices here, as long as the
//! tree carries no [`Node::Raw`] fragments that parse into several nodes.

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Elements written as `<tag ... />` with no children.
const VOID_ELEMENTS: [&str; 4] = ["br", "hr", "img", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// HTML passed through verbatim (raw HTML blocks, image placeholders).
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub styles: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    #[must_use]
    pub fn with_style(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_style(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        set_pair(&mut self.attrs, name, value.into());
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        set_pair(&mut self.styles, name, value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        get_pair(&self.attrs, name)
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        get_pair(&self.styles, name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(value));
            out.push('"');
        }
        if !self.styles.is_empty() {
            let css = self
                .styles
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(" style=\"");
            out.push_str(&encode_double_quoted_attribute(&css));
            out.push('"');
        }
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            out.push_str(" />");
            return;
        }
        out.push('>');
        write_nodes(&self.children, out);
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn set_pair(pairs: &mut Vec<(String, String)>, name: &str, value: String) {
    match pairs.iter_mut().find(|(k, _)| k == name) {
        Some((_, v)) => *v = value,
        None => pairs.push((name.to_string(), value)),
    }
}

fn get_pair<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(e) => &e.children,
            _ => &[],
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Element(e) => e.text_content(),
            Node::Text(t) => t.clone(),
            Node::Raw(_) => String::new(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_html(out),
            Node::Text(t) => out.push_str(&encode_text(t)),
            Node::Raw(html) => out.push_str(html),
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(e) => collect_text(&e.children, out),
            Node::Text(t) => out.push_str(t),
            Node::Raw(_) => {}
        }
    }
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node.write_html(out);
    }
}

/// Serialises a fragment.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

/// The node at a child-index path, the first index selecting a root node.
pub fn node_at_path<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.get(*first)?;
    for i in rest {
        node = node.children().get(*i)?;
    }
    Some(node)
}

/// Path of the first text node containing `needle`, in document order.
pub fn find_text_path(nodes: &[Node], needle: &str) -> Option<Vec<usize>> {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Text(t) if t.contains(needle) => return Some(vec![i]),
            Node::Element(e) => {
                if let Some(mut rest) = find_text_path(&e.children, needle) {
                    rest.insert(0, i);
                    return Some(rest);
                }
            }
            _ => {}
        }
    }
    None
}
