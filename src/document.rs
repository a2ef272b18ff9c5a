//! Style-bearing documents the browser pass operates on.
//!
//! A document is seen only through its `<style>` elements, in document
//! order. [`StyleSheetDocument`] keeps them in memory (the shape an embedding
//! DOM binding would adapt to); [`HtmlPage`] extracts them from static HTML
//! with scraper and splices the rewritten text back into the source.

use log::warn;
use scraper::{Html, Selector};

/// One `<style>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNode {
    pub id: Option<String>,
    pub text: String,
    // Text as left by the last pass that handled this node
    pub(crate) rewritten: Option<String>,
}

impl StyleNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), rewritten: None }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: Some(id.into()), text: text.into(), rewritten: None }
    }

    /// Markup whose parsed text is exactly `text`
    pub fn to_markup(&self) -> String {
        match &self.id {
            Some(id) => format!("<style id=\"{}\">{}</style>\n", id, self.text),
            None => format!("<style>{}</style>\n", self.text),
        }
    }
}

/// Access to a document's style elements
pub trait StyleDocument {
    fn styles(&self) -> &[StyleNode];

    fn styles_mut(&mut self) -> &mut [StyleNode];

    /// Append a style element at the end of the head
    fn append_style(&mut self, node: StyleNode);

    /// Index of the style element carrying `id`
    fn find_style(&self, id: &str) -> Option<usize> {
        self.styles().iter().position(|s| s.id.as_deref() == Some(id))
    }
}

/// In-memory list of style elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheetDocument {
    styles: Vec<StyleNode>,
}

impl StyleSheetDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_styles<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            styles: styles.into_iter().map(StyleNode::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl StyleDocument for StyleSheetDocument {
    fn styles(&self) -> &[StyleNode] {
        &self.styles
    }

    fn styles_mut(&mut self) -> &mut [StyleNode] {
        &mut self.styles
    }

    fn append_style(&mut self, node: StyleNode) {
        self.styles.push(node);
    }
}

/// A static HTML page whose inline styles can be rewritten in place
#[derive(Debug, Clone)]
pub struct HtmlPage {
    source: String,
    // Text of each parsed element as found in `source`
    originals: Vec<String>,
    doc: StyleSheetDocument,
}

impl HtmlPage {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let document = Html::parse_document(&source);
        let style_sel = Selector::parse("style").unwrap();

        let styles: Vec<StyleNode> = document
            .select(&style_sel)
            .map(|node| StyleNode {
                id: node.value().attr("id").map(|s| s.to_string()),
                text: node.text().collect::<String>(),
                rewritten: None,
            })
            .collect();
        let originals = styles.iter().map(|s| s.text.clone()).collect();

        Self {
            source,
            originals,
            doc: StyleSheetDocument { styles },
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Serialize the page with the current style texts and appended elements
    pub fn render(&self) -> String {
        let html = &self.source;
        let lower = html.to_ascii_lowercase();
        let styles = self.doc.styles();

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        let mut idx = 0;
        while idx < self.originals.len() {
            let Some(open) = lower[cursor..].find("<style").map(|p| cursor + p) else {
                break;
            };
            let Some(start) = lower[open..].find('>').map(|p| open + p + 1) else {
                break;
            };
            let Some(end) = lower[start..].find("</style").map(|p| start + p) else {
                break;
            };
            // The parser normalises line endings inside raw text
            out.push_str(&html[cursor..start]);
            let raw = &html[start..end];
            if raw.replace("\r\n", "\n").replace('\r', "\n") == self.originals[idx] {
                if styles[idx].text == self.originals[idx] {
                    out.push_str(raw);
                } else {
                    out.push_str(&styles[idx].text);
                }
                idx += 1;
                cursor = end;
            } else {
                // "<style" inside a script or comment; resume after its '>'
                cursor = start;
            }
        }
        out.push_str(&html[cursor..]);
        if idx < self.originals.len() {
            warn!("{} style elements could not be located in the source", self.originals.len() - idx);
        }

        let appended: String = styles[self.originals.len()..]
            .iter()
            .map(StyleNode::to_markup)
            .collect();
        if appended.is_empty() {
            return out;
        }
        match out.to_ascii_lowercase().find("</head") {
            Some(pos) => out.insert_str(pos, &appended),
            None => out.push_str(&appended),
        }
        out
    }
}

impl StyleDocument for HtmlPage {
    fn styles(&self) -> &[StyleNode] {
        self.doc.styles()
    }

    fn styles_mut(&mut self) -> &mut [StyleNode] {
        self.doc.styles_mut()
    }

    fn append_style(&mut self, node: StyleNode) {
        self.doc.append_style(node);
    }
}
