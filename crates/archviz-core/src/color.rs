//! Color values accepted in diagram styling.
//!
//! [`Color`] wraps the `DynamicColor` type from the color crate so that any
//! CSS color string ("#ff0000", "rgb(255, 0, 0)", "firebrick", ...) can be
//! used for fills, fonts and edges. Graphviz understands a narrower set of
//! names, so colors are always handed to the renderer in hex form.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{DynamicColor, Srgb};

/// A parsed CSS color.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_hex().hash(state);
    }
}

impl Color {
    /// Parses a CSS color string.
    ///
    /// # Examples
    ///
    /// ```
    /// use archviz_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// assert_eq!(red.to_hex(), "#ff0000");
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns the color as `#rrggbb`, or `#rrggbbaa` when it is not opaque.
    pub fn to_hex(&self) -> String {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        if rgba.a == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
        }
    }

    /// Returns the alpha component between 0.0 and 1.0.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_parse_valid_and_invalid() {
        assert!(Color::new("#2d3436").is_ok());
        assert!(Color::new("rgb(10, 20, 30)").is_ok());
        assert!(Color::new("firebrick").is_ok());
        assert!(Color::new("not-a-color").is_err());
    }

    #[test]
    fn test_to_hex_named() {
        let color = Color::new("white").unwrap();
        assert_eq!(color.to_hex(), "#ffffff");
    }

    #[test]
    fn test_to_hex_with_alpha() {
        let color = Color::new("rgba(255, 0, 0, 0.5)").unwrap();
        let hex = color.to_hex();
        assert!(hex.starts_with("#ff0000"));
        assert_eq!(hex.len(), 9);
    }

    #[test]
    fn test_error_mentions_input() {
        let err = Color::new("blurple").unwrap_err();
        assert!(err.contains("blurple"));
    }

    #[test]
    fn test_eq_and_hash() {
        let a = Color::new("#ff0000").unwrap();
        let b = Color::new("#ff0000").unwrap();
        let c = Color::new("blue").unwrap();

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
