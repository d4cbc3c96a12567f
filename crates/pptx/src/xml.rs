//! Minimal mutable XML tree for OOXML parts.
//!
//! Parts are small enough to hold fully in memory, and slide surgery
//! (cloning shapes, rewriting table cells, dropping relationships) is far
//! simpler on a tree than on an event stream. Element and attribute names
//! keep their namespace prefixes verbatim, so a part written back out is
//! equivalent to the one read in.

use deck_core::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified name, e.g. `a:tbl`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// The `<?xml ...?>` declaration of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// A whole XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    declaration: Option<Declaration>,
    pub root: Element,
}

fn xml_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::XmlError(format!("{}: {}", context, e))
}

/// Strip the namespace prefix from a qualified name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Direct children with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(local))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.elements_mut().filter(move |e| e.is(local))
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(local))
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Descendants (excluding `self`) with the given local name, depth-first.
    pub fn descendants_named<'a>(&'a self, local: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_named(self, local, &mut found);
        found
    }

    /// The `n`-th descendant with the given local name, depth-first.
    pub fn nth_descendant_mut(&mut self, local: &str, n: usize) -> Option<&mut Element> {
        let mut remaining = n;
        nth_named_mut(self, local, &mut remaining)
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Apply `f` to every text node below this element.
    pub fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        for child in &mut self.children {
            match child {
                Node::Element(e) => e.for_each_text_mut(f),
                Node::Text(t) | Node::CData(t) => f(t),
            }
        }
    }

    /// Remove every descendant element for which `pred` holds. Matching
    /// elements are not searched further. Returns how many were removed.
    pub fn remove_descendants(&mut self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if pred(e)));
        let mut removed = before - self.children.len();
        for child in self.elements_mut() {
            removed += child.remove_descendants(pred);
        }
        removed
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(name);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| xml_error("bad attribute", e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error("bad attribute value", e))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| xml_error("write failed", e));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| xml_error("write failed", e))?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) => writer
                    .write_event(Event::Text(BytesText::new(t)))
                    .map_err(|e| xml_error("write failed", e))?,
                Node::CData(t) => writer
                    .write_event(Event::CData(BytesCData::new(t.as_str())))
                    .map_err(|e| xml_error("write failed", e))?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| xml_error("write failed", e))
    }
}

fn collect_named<'a>(element: &'a Element, local: &str, found: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.is(local) {
            found.push(child);
        }
        collect_named(child, local, found);
    }
}

fn nth_named_mut<'a>(
    element: &'a mut Element,
    local: &str,
    remaining: &mut usize,
) -> Option<&'a mut Element> {
    for child in element.elements_mut() {
        if child.is(local) {
            if *remaining == 0 {
                return Some(child);
            }
            *remaining -= 1;
        }
        if let Some(found) = nth_named_mut(child, local, remaining) {
            return Some(found);
        }
    }
    None
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Element(e) => collect_text(e, out),
            Node::Text(t) | Node::CData(t) => out.push_str(t),
        }
    }
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Some(Declaration {
                version: "1.0".to_string(),
                encoding: Some("UTF-8".to_string()),
                standalone: Some("yes".to_string()),
            }),
            root,
        }
    }

    /// Parse a complete XML part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut declaration = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                xml_error(
                    &format!("parse error at byte {}", reader.buffer_position()),
                    e,
                )
            })?;

            match event {
                Event::Decl(decl) => {
                    declaration = Some(Declaration {
                        version: decl_field(decl.version())?,
                        encoding: decl.encoding().map(decl_field).transpose()?,
                        standalone: decl.standalone().map(decl_field).transpose()?,
                    });
                }
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| xml_error("bad text", e))?
                            .into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::CData(text));
                    }
                }
                Event::Eof => break,
                // Comments, processing instructions and doctypes carry no
                // content we edit.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("unclosed element at end of part".to_string()));
        }
        let root = root.ok_or_else(|| Error::XmlError("part has no root element".to_string()))?;

        Ok(Self { declaration, root })
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(|e| xml_error("part is not UTF-8", e))?;
        Self::parse(xml.trim_start_matches('\u{feff}'))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| xml_error("write failed", e))?;
            writer
                .write_event(Event::Text(BytesText::from_escaped("\r\n")))
                .map_err(|e| xml_error("write failed", e))?;
        }
        self.root.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    pub fn to_string_lossy(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.to_bytes()?).into_owned())
    }
}

fn decl_field(value: quick_xml::Result<Cow<'_, [u8]>>) -> Result<String> {
    value
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .map_err(|e| xml_error("bad declaration", e))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::XmlError("multiple root elements".to_string())),
    }
    Ok(())
}
