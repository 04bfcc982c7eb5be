//! On-screen element rectangles in the uiautomator `[x1,y1][x2,y2]` form

use crate::error::{AdbError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref COORD_RE: Regex = Regex::new(r"-?\d+").unwrap();
}

/// Rectangle describing an element's extent. Invariant: `x1 <= x2` and
/// `y1 <= y2`, enforced at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Bounds {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        if x1 > x2 || y1 > y2 {
            return Err(AdbError::Parse(format!(
                "inverted bounds [{},{}][{},{}]",
                x1, y1, x2, y2
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Parse the `[x1,y1][x2,y2]` attribute form produced by uiautomator.
    pub fn parse(raw: &str) -> Result<Self> {
        let coords: Vec<i32> = COORD_RE
            .find_iter(raw)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        if coords.len() != 4 {
            return Err(AdbError::Parse(format!("malformed bounds: {:?}", raw)));
        }
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Integer midpoint of the rectangle (truncating division).
    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}][{},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_center() {
        let bounds = Bounds::parse("[10,20][30,40]").unwrap();
        assert_eq!(bounds, Bounds { x1: 10, y1: 20, x2: 30, y2: 40 });
        assert_eq!(bounds.center(), (20, 30));
    }

    #[test]
    fn test_center_truncates() {
        let bounds = Bounds::parse("[0,0][5,5]").unwrap();
        assert_eq!(bounds.center(), (2, 2));
    }

    #[test]
    fn test_display_round_trip() {
        let raw = "[0,96][1080,2208]";
        let bounds = Bounds::parse(raw).unwrap();
        assert_eq!(bounds.to_string(), raw);
    }

    #[test]
    fn test_inverted_rejected() {
        assert!(matches!(
            Bounds::parse("[30,20][10,40]"),
            Err(AdbError::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(Bounds::parse("[10,20][30]").is_err());
        assert!(Bounds::parse("no coordinates").is_err());
    }

    #[test]
    fn test_negative_coords_allowed() {
        let bounds = Bounds::parse("[-10,0][10,20]").unwrap();
        assert_eq!(bounds.center(), (0, 10));
    }
}
