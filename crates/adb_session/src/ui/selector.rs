//! XPath-subset selectors over UI snapshots
//!
//! Supported form: `.//node[@attribute='value']` (a `*` tag is also
//! accepted). This mirrors the selector strings the device-side
//! uiautomator dumps are queried with.

use crate::error::{AdbError, Result};
use crate::ui::Bounds;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref SELECTOR_RE: Regex =
        Regex::new(r"^\.//(\*|[A-Za-z][\w.]*)\[@([\w-]+)\s*=\s*'([^']*)'\s*\]$").unwrap();
}

/// Node attribute a selector can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorAttr {
    Text,
    ContentDesc,
    ResourceId,
    Bounds,
    Class,
}

impl SelectorAttr {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "content-desc" => Some(Self::ContentDesc),
            "resource-id" => Some(Self::ResourceId),
            "bounds" => Some(Self::Bounds),
            "class" => Some(Self::Class),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ContentDesc => "content-desc",
            Self::ResourceId => "resource-id",
            Self::Bounds => "bounds",
            Self::Class => "class",
        }
    }
}

/// A parsed selector: one attribute-equality predicate over `node` elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub attr: SelectorAttr,
    pub value: String,
}

impl Selector {
    /// Parse an XPath-subset string of the form `.//node[@attr='value']`.
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = SELECTOR_RE
            .captures(raw.trim())
            .ok_or_else(|| AdbError::Parse(format!("unsupported selector: {:?}", raw)))?;
        let attr = SelectorAttr::from_name(&caps[2])
            .ok_or_else(|| AdbError::Parse(format!("unknown selector attribute: {:?}", &caps[2])))?;
        Ok(Self {
            attr,
            value: caps[3].to_string(),
        })
    }

    /// Selector matching a node by exact text equality.
    pub fn text(text: &str) -> Self {
        Self {
            attr: SelectorAttr::Text,
            value: text.to_string(),
        }
    }

    /// Selector matching a node by resource id.
    pub fn resource_id(id: &str) -> Self {
        Self {
            attr: SelectorAttr::ResourceId,
            value: id.to_string(),
        }
    }

    /// Selector matching a node by its bounds rectangle.
    pub fn bounds(bounds: &Bounds) -> Self {
        Self {
            attr: SelectorAttr::Bounds,
            value: bounds.to_string(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".//node[@{}='{}']", self.attr.name(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_selector() {
        let sel = Selector::parse(".//node[@text='Sign in']").unwrap();
        assert_eq!(sel.attr, SelectorAttr::Text);
        assert_eq!(sel.value, "Sign in");
    }

    #[test]
    fn test_parse_wildcard_tag() {
        let sel = Selector::parse(".//*[@bounds='[0,0][100,200]']").unwrap();
        assert_eq!(sel.attr, SelectorAttr::Bounds);
        assert_eq!(sel.value, "[0,0][100,200]");
    }

    #[test]
    fn test_parse_rejects_unknown_attribute() {
        assert!(matches!(
            Selector::parse(".//node[@checkable='true']"),
            Err(AdbError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Selector::parse("//node[@text='x']").is_err());
        assert!(Selector::parse(".//node[text='x']").is_err());
        assert!(Selector::parse(".//node[@text=x]").is_err());
    }

    #[test]
    fn test_constructors_round_trip() {
        let sel = Selector::resource_id("com.app:id/login");
        let reparsed = Selector::parse(&sel.to_string()).unwrap();
        assert_eq!(sel, reparsed);

        let bounds = Bounds::parse("[10,20][30,40]").unwrap();
        let sel = Selector::bounds(&bounds);
        assert_eq!(sel.value, "[10,20][30,40]");
    }
}
