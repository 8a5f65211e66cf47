//! Document capability consumed by the extractor.
//!
//! The traits describe exactly what the extraction logic reads from a page:
//! CSS-style queries in document order, attributes, class markers, text and
//! child nodes. [`HtmlDocument`] implements them over `scraper`.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ExtractError;

/// A child of an element: either raw text or another element.
#[derive(Debug, Clone)]
pub enum DomNode<E> {
    Text(String),
    Element(E),
}

pub trait PageElement: Clone {
    /// Lowercase tag name.
    fn tag_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn has_class(&self, class: &str) -> bool;

    /// First capture group of `pattern` applied to the element's class string.
    fn class_capture(&self, pattern: &Regex) -> Option<String>;

    /// Concatenated text of all descendant text nodes, like DOM `textContent`.
    fn text_content(&self) -> String;

    fn child_nodes(&self) -> Vec<DomNode<Self>>;

    fn element_children(&self) -> Vec<Self>;

    /// First matching descendant (the element itself is never matched).
    fn query_first(&self, selector: &str) -> Result<Option<Self>, ExtractError>;

    /// All matching descendants in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<Self>, ExtractError>;
}

pub trait PageDocument {
    type Element<'a>: PageElement
    where
        Self: 'a;

    /// Parse a serialized document into a fresh, independent document.
    fn from_html(html: &str) -> Self
    where
        Self: Sized;

    /// Title with whitespace collapsed, `None` when absent or blank.
    fn title(&self) -> Option<String>;

    fn query_all(&self, selector: &str) -> Result<Vec<Self::Element<'_>>, ExtractError>;

    /// Full serialization of the root element.
    fn outer_html(&self) -> String;
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// A parsed HTML snapshot.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

impl PageDocument for HtmlDocument {
    type Element<'a> = HtmlElement<'a>;

    fn from_html(html: &str) -> Self {
        Self::parse(html)
    }

    fn title(&self) -> Option<String> {
        let selector = parse_selector("title").ok()?;
        let title = self.html.select(&selector).next()?;
        let collapsed = title.text().collect::<String>();
        let collapsed = collapsed.split_whitespace().collect::<Vec<_>>().join(" ");
        (!collapsed.is_empty()).then_some(collapsed)
    }

    fn query_all(&self, selector: &str) -> Result<Vec<HtmlElement<'_>>, ExtractError> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).map(HtmlElement::new).collect())
    }

    fn outer_html(&self) -> String {
        self.html.root_element().html()
    }
}

/// Borrowed element inside an [`HtmlDocument`].
#[derive(Clone, Copy, Debug)]
pub struct HtmlElement<'a> {
    inner: ElementRef<'a>,
}

impl<'a> HtmlElement<'a> {
    fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }
}

impl PageElement for HtmlElement<'_> {
    fn tag_name(&self) -> String {
        self.inner.value().name().to_ascii_lowercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.inner.value().attr(name).map(str::to_owned)
    }

    fn has_class(&self, class: &str) -> bool {
        self.inner.value().classes().any(|c| c == class)
    }

    fn class_capture(&self, pattern: &Regex) -> Option<String> {
        let classes = self.inner.value().attr("class")?;
        pattern
            .captures(classes)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn text_content(&self) -> String {
        self.inner.text().collect()
    }

    fn child_nodes(&self) -> Vec<DomNode<Self>> {
        self.inner
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => {
                    let text: &str = text;
                    Some(DomNode::Text(text.to_owned()))
                }
                Node::Element(_) => {
                    ElementRef::wrap(child).map(|el| DomNode::Element(Self::new(el)))
                }
                _ => None,
            })
            .collect()
    }

    fn element_children(&self) -> Vec<Self> {
        self.inner
            .children()
            .filter_map(ElementRef::wrap)
            .map(Self::new)
            .collect()
    }

    fn query_first(&self, selector: &str) -> Result<Option<Self>, ExtractError> {
        let selector = parse_selector(selector)?;
        Ok(self.inner.select(&selector).next().map(Self::new))
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Self>, ExtractError> {
        let selector = parse_selector(selector)?;
        Ok(self.inner.select(&selector).map(Self::new).collect())
    }
}
