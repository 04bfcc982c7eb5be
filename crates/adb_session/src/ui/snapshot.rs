//! Parsed UI hierarchy snapshots
//!
//! A snapshot is an immutable tree parsed from one `uiautomator dump`. It is
//! replaced wholesale by the next refresh; queries against it are as of the
//! dump it was parsed from.

use crate::error::{AdbError, Result};
use crate::ui::{Bounds, Selector, SelectorAttr};

/// One element of the dumped UI hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiNode {
    pub class: String,
    pub text: String,
    pub content_desc: String,
    pub resource_id: String,
    pub bounds: Option<Bounds>,
    pub children: Vec<UiNode>,
}

impl UiNode {
    fn from_attrs(attrs: &[(String, String)]) -> Result<Self> {
        let mut node = UiNode::default();
        for (name, value) in attrs {
            match name.as_str() {
                "class" => node.class = unescape_xml(value),
                "text" => node.text = unescape_xml(value),
                "content-desc" => node.content_desc = unescape_xml(value),
                "resource-id" => node.resource_id = unescape_xml(value),
                "bounds" if !value.is_empty() => node.bounds = Some(Bounds::parse(value)?),
                _ => {}
            }
        }
        Ok(node)
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector.attr {
            SelectorAttr::Text => self.text == selector.value,
            SelectorAttr::ContentDesc => self.content_desc == selector.value,
            SelectorAttr::ResourceId => self.resource_id == selector.value,
            SelectorAttr::Class => self.class == selector.value,
            SelectorAttr::Bounds => self
                .bounds
                .map_or(false, |b| b.to_string() == selector.value),
        }
    }

    fn find<'a>(&'a self, selector: &Selector) -> Option<&'a UiNode> {
        if self.matches(selector) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(selector))
    }
}

/// Immutable tree of [`UiNode`]s parsed from one XML dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    root: UiNode,
}

impl UiSnapshot {
    /// Parse a uiautomator XML dump into a snapshot.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = parse_hierarchy(xml)?;
        Ok(Self { root })
    }

    /// First node matching the selector, in document order.
    pub fn find(&self, selector: &Selector) -> Option<&UiNode> {
        // The synthetic hierarchy root is not a queryable node
        self.root.children.iter().find_map(|c| c.find(selector))
    }

    pub fn exists(&self, selector: &Selector) -> bool {
        self.find(selector).is_some()
    }

    /// The matching node's `text` attribute, or absent when no node matches.
    pub fn text(&self, selector: &Selector) -> Option<&str> {
        self.find(selector).map(|n| n.text.as_str())
    }

    /// The matching node's `content-desc` attribute, or absent.
    pub fn content_desc(&self, selector: &Selector) -> Option<&str> {
        self.find(selector).map(|n| n.content_desc.as_str())
    }

    /// The matching node's bounds. Unlike the text queries this is an error
    /// when the node is missing, since callers tap on the result.
    pub fn bounds(&self, selector: &Selector) -> Result<Bounds> {
        self.find(selector)
            .and_then(|n| n.bounds)
            .ok_or_else(|| AdbError::ElementNotFound(selector.to_string()))
    }
}

fn unescape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (replacement, consumed) = if rest.starts_with("&amp;") {
            ("&", 5)
        } else if rest.starts_with("&lt;") {
            ("<", 4)
        } else if rest.starts_with("&gt;") {
            (">", 4)
        } else if rest.starts_with("&quot;") {
            ("\"", 6)
        } else if rest.starts_with("&#39;") || rest.starts_with("&apos;") {
            ("'", if rest.starts_with("&#39;") { 5 } else { 6 })
        } else if rest.starts_with("&#10;") {
            ("\n", 5)
        } else {
            ("&", 1)
        };
        out.push_str(replacement);
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Walk the raw XML and build the node tree. uiautomator dumps are one
/// `<hierarchy>` element containing nested `<node>` elements with quoted
/// attributes only, so a full XML library is not required.
fn parse_hierarchy(xml: &str) -> Result<UiNode> {
    let bytes = xml.as_bytes();
    let mut index = 0usize;
    let mut stack: Vec<UiNode> = Vec::new();
    let mut roots: Vec<UiNode> = Vec::new();

    while index < bytes.len() {
        if bytes[index] != b'<' {
            index += 1;
            continue;
        }
        if index + 1 >= bytes.len() {
            return Err(AdbError::Parse("truncated dump".into()));
        }
        match bytes[index + 1] {
            b'/' => {
                // Closing tag: pop the element and attach it to its parent
                index += 2;
                while index < bytes.len() && bytes[index] != b'>' {
                    index += 1;
                }
                index = (index + 1).min(bytes.len());
                let node = stack
                    .pop()
                    .ok_or_else(|| AdbError::Parse("unbalanced closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => roots.push(node),
                }
            }
            b'?' | b'!' => {
                // XML declaration or comment
                index += 2;
                while index < bytes.len() && bytes[index] != b'>' {
                    index += 1;
                }
                index = (index + 1).min(bytes.len());
            }
            _ => {
                let start = index + 1;
                let mut cursor = start;
                while cursor < bytes.len() {
                    let ch = bytes[cursor];
                    if ch == b'/' || ch == b'>' || ch.is_ascii_whitespace() {
                        break;
                    }
                    cursor += 1;
                }
                let (attrs, self_closing, next) = parse_attrs(xml, cursor)?;
                index = next;

                let node = UiNode::from_attrs(&attrs)?;
                if self_closing {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                } else {
                    stack.push(node);
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(AdbError::Parse("unclosed element in dump".into()));
    }
    match roots.len() {
        1 => Ok(roots.remove(0)),
        n => Err(AdbError::Parse(format!("expected one root element, found {}", n))),
    }
}

fn parse_attrs(xml: &str, mut cursor: usize) -> Result<(Vec<(String, String)>, bool, usize)> {
    let bytes = xml.as_bytes();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if cursor >= bytes.len() {
            return Err(AdbError::Parse("truncated element".into()));
        }
        match bytes[cursor] {
            b'>' => {
                cursor += 1;
                break;
            }
            b'/' => {
                self_closing = true;
                cursor += 1;
                if cursor < bytes.len() && bytes[cursor] == b'>' {
                    cursor += 1;
                }
                break;
            }
            _ => {
                let name_start = cursor;
                while cursor < bytes.len()
                    && bytes[cursor] != b'='
                    && !bytes[cursor].is_ascii_whitespace()
                {
                    cursor += 1;
                }
                let name_end = cursor;
                while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                    cursor += 1;
                }
                if cursor >= bytes.len() || bytes[cursor] != b'=' {
                    return Err(AdbError::Parse("attribute without value".into()));
                }
                cursor += 1;
                while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                    cursor += 1;
                }
                if cursor >= bytes.len() || (bytes[cursor] != b'"' && bytes[cursor] != b'\'') {
                    return Err(AdbError::Parse("unquoted attribute value".into()));
                }
                let quote = bytes[cursor];
                cursor += 1;
                let value_start = cursor;
                while cursor < bytes.len() && bytes[cursor] != quote {
                    cursor += 1;
                }
                if cursor >= bytes.len() {
                    return Err(AdbError::Parse("unterminated attribute value".into()));
                }
                attrs.push((
                    xml[name_start..name_end].to_string(),
                    xml[value_start..cursor].to_string(),
                ));
                cursor += 1;
            }
        }
    }

    Ok((attrs, self_closing, cursor))
}
