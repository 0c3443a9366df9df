//! A small owned XML element tree.
//!
//! Documents are parsed with `quick-xml` into [`Element`] values that keep
//! attribute and child order, so nodes can be copied verbatim from one
//! document into another. The same type is used to build output documents:
//!
//! ```
//! use boostfeed_registry::Element;
//!
//! let archive = Element::new("archive")
//!     .attr("href", "http://example.com/a.zip")
//!     .attr("type", "application/zip");
//! let feed = Element::new("interface").child(Element::new("name").text("foo")).child(archive);
//!
//! assert_eq!(feed.find_text("name").as_deref(), Some("foo"));
//! assert!(feed.render().contains(r#"<archive href="http://example.com/a.zip" type="application/zip"/>"#));
//! ```

use std::fmt::{self, Write};

use quick_xml::{
    escape::escape,
    events::{BytesStart, Event},
    Reader,
};

use crate::error::{RegistryError, Result};

const INDENT: &str = "  ";

/// A child of an [`Element`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, replacing any previous value while keeping its position.
    pub fn attr<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn child(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn extend<I: IntoIterator<Item = Element>>(&mut self, elements: I) {
        self.children
            .extend(elements.into_iter().map(Node::Element));
    }

    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| {
            match node {
                Node::Element(element) => Some(element),
                Node::Text(_) => None,
            }
        })
    }

    /// Direct child elements named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.name == name)
    }

    /// Finds the first element matching a `/`-separated path of child names.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let start: Vec<&Element> = self.elements().filter(|e| e.name == first).collect();

        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            return start.into_iter().next();
        }

        let rest = rest.join("/");
        start.into_iter().find_map(|element| element.find(&rest))
    }

    /// Text of the first element matching `path`, or `None` if there is no such element.
    pub fn find_text(&self, path: &str) -> Option<String> {
        self.find(path).map(Element::text_content)
    }

    /// Concatenated text of the direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| {
                match node {
                    Node::Text(text) => Some(text.as_str()),
                    Node::Element(_) => None,
                }
            })
            .collect()
    }

    /// Parses a document and returns its root element.
    ///
    /// Whitespace-only text is dropped; comments, processing instructions and
    /// the XML declaration are ignored.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref start) => stack.push(Element::from_start(start)?),
                Event::Empty(ref start) => {
                    let element = Element::from_start(start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        RegistryError::Malformed("closing tag without opening tag".into())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref text) => {
                    let text = text.unescape()?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                        None => {
                            return Err(RegistryError::Malformed(
                                "text outside of the root element".into(),
                            ))
                        }
                    }
                }
                Event::CData(ref data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::Text(String::from_utf8_lossy(data.as_ref()).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(RegistryError::Malformed(format!(
                "element `{}` is never closed",
                open.name
            )));
        }

        root.ok_or_else(|| RegistryError::Malformed("document has no root element".into()))
    }

    fn from_start(start: &BytesStart) -> Result<Element> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));

        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    /// Renders the element as an indented document with an XML declaration.
    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        // Writing into a String cannot fail.
        let _ = self.write_indented(&mut out, 0);
        out
    }

    fn write_indented<W: Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        write!(out, "{pad}<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(out, " {key}=\"{}\"", escape(value.as_str()))?;
        }

        if self.children.is_empty() {
            return writeln!(out, "/>");
        }

        let text_only = self
            .children
            .iter()
            .all(|node| matches!(node, Node::Text(_)));

        if text_only {
            return writeln!(
                out,
                ">{}</{}>",
                escape(self.text_content().as_str()),
                self.name
            );
        }

        writeln!(out, ">")?;
        for node in &self.children {
            match node {
                Node::Element(element) => element.write_indented(out, depth + 1)?,
                Node::Text(text) => {
                    writeln!(out, "{pad}{INDENT}{}", escape(text.trim()))?;
                }
            }
        }
        writeln!(out, "{pad}</{}>", self.name)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => {
            Err(RegistryError::Malformed(
                "document has more than one root element".into(),
            ))
        }
    }
}
