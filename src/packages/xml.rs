// src/packages/xml.rs

//! Owned XML element tree shared by manifest and class-definition parsing

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// A parsed XML element with its attributes, children and text content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of a direct child, `None` when missing or blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Parse a complete document and return its root element
///
/// Empty input, missing root, mismatched or unclosed tags, and multiple root
/// elements are all reported as errors.
pub fn parse_document(xml: &str) -> Result<XmlElement, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element_from(&e)?),
            Ok(Event::Empty(e)) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without an open element".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }

    root.ok_or_else(|| "document has no root element".to_string())
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.insert(key, value.into_owned());
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(format!("second root element <{}>", element.name))
    } else {
        *root = Some(element);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
            <package version="3.5.2">
              <name>blog</name>
              <languages><language>eng-GB</language><language>nor-NO</language></languages>
              <install><item type="ezcontentclass" filename="class-article"/></install>
            </package>"#,
        )
        .unwrap();

        assert_eq!(root.name, "package");
        assert_eq!(root.attribute("version"), Some("3.5.2"));
        assert_eq!(root.child_text("name"), Some("blog"));
        let languages: Vec<_> = root
            .child("languages")
            .unwrap()
            .children_named("language")
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(languages, vec!["eng-GB", "nor-NO"]);
        let item = root.child("install").unwrap().child("item").unwrap();
        assert_eq!(item.attribute("filename"), Some("class-article"));
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_document("<a><b>x &amp; y</b><c><![CDATA[<raw>]]></c></a>").unwrap();
        assert_eq!(root.child_text("b"), Some("x & y"));
        assert_eq!(root.child_text("c"), Some("<raw>"));
    }

    #[test]
    fn test_rejects_broken_documents() {
        assert!(parse_document("").is_err());
        assert!(parse_document("   ").is_err());
        assert!(parse_document("<package><name>x</package>").is_err());
        assert!(parse_document("<package><name>x</name>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }
}
