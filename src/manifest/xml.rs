// src/manifest/xml.rs

//! Minimal element tree over `quick-xml` events
//!
//! Cartridge descriptors are small, so they are read into a tree and queried
//! by local name. Namespace prefixes are dropped: `blti:title` and `title`
//! are the same element here.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Child node of an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with namespace-stripped names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Direct children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// All descendants with the given local name, in document order
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// First descendant with the given local name
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Trimmed text of the first descendant with this name, if non-empty
    pub fn find_text(&self, name: &str) -> Option<String> {
        self.find(name)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn strip_prefix(name: &[u8]) -> String {
    let local = match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    };
    String::from_utf8_lossy(local).into_owned()
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = strip_prefix(attr.key.as_ref());
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name: strip_prefix(start.name().as_ref()),
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Parse an XML document into its root element
pub fn parse_document(xml: &str) -> Result<XmlElement> {
    let xml = xml.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    // Descriptors in the wild carry HTML entities like &nbsp;
                    // that XML does not define; keep those verbatim.
                    let value = text
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    parent.children.push(XmlNode::Text(value));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    parent.children.push(XmlNode::Text(value));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::XmlError("unexpected end of document".to_string()));
    }

    root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_namespace_prefixes() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <cartridge_basiclti_link xmlns:blti="http://www.imsglobal.org/xsd/imsbasiclti_v1p0">
              <blti:title>BLTI Test</blti:title>
              <blti:launch_url>http://example.com/tool.php</blti:launch_url>
            </cartridge_basiclti_link>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "cartridge_basiclti_link");
        assert_eq!(doc.find_text("title").as_deref(), Some("BLTI Test"));
        assert_eq!(
            doc.find_text("launch_url").as_deref(),
            Some("http://example.com/tool.php")
        );
    }

    #[test]
    fn test_attributes_and_descendants() {
        let doc = parse_document(
            r#"<resources>
                 <resource identifier="w1" type="webcontent">
                   <file href="w1/w1.html"/>
                   <file href="w1/w2.html"/>
                 </resource>
               </resources>"#,
        )
        .unwrap();

        let resource = doc.child("resource").unwrap();
        assert_eq!(resource.attr("identifier"), Some("w1"));
        let files: Vec<_> = doc
            .descendants("file")
            .iter()
            .filter_map(|f| f.attr("href"))
            .collect();
        assert_eq!(files, vec!["w1/w1.html", "w1/w2.html"]);
    }

    #[test]
    fn test_escaped_html_text_and_cdata() {
        let doc = parse_document(
            "<topic><text texttype=\"text/html\">&lt;p&gt;hi&lt;/p&gt;</text><raw><![CDATA[<b>x</b>]]></raw></topic>",
        )
        .unwrap();

        assert_eq!(doc.find_text("text").as_deref(), Some("<p>hi</p>"));
        assert_eq!(doc.find_text("raw").as_deref(), Some("<b>x</b>"));
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(parse_document("<manifest><resources></manifest>").is_err());
        assert!(parse_document("").is_err());
    }
}
