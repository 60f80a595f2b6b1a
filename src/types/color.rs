// ABOUTME: Validated rolling color tokens and the configured blue/green pair.
// ABOUTME: Colors are the suffix tokens that distinguish interchangeable worker instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("color token cannot be empty")]
    Empty,

    #[error("invalid character in color token '{token}': '{found}'")]
    InvalidChar { token: String, found: char },

    #[error("exactly two colors are required, got {0}")]
    WrongCount(usize),

    #[error("colors must be distinct, got '{0}' twice")]
    Duplicate(String),
}

/// A single color token such as `blue`.
///
/// Tokens are lowercase ASCII alphanumerics so they can never contain one of
/// the name separators (`-`, `_`) used by the rolling-name parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: &str) -> Result<Self, ColorError> {
        if value.is_empty() {
            return Err(ColorError::Empty);
        }

        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() {
                return Err(ColorError::InvalidChar {
                    token: value.to_string(),
                    found: c,
                });
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::new(&s).map_err(serde::de::Error::custom)
    }
}

/// The two configured colors. The first one is the default active color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<Color>")]
pub struct ColorPair {
    first: Color,
    second: Color,
}

impl ColorPair {
    pub fn new(first: Color, second: Color) -> Result<Self, ColorError> {
        if first == second {
            return Err(ColorError::Duplicate(first.0));
        }
        Ok(Self { first, second })
    }

    pub fn from_tokens(tokens: &[&str]) -> Result<Self, ColorError> {
        match tokens {
            [a, b] => Self::new(Color::new(a)?, Color::new(b)?),
            other => Err(ColorError::WrongCount(other.len())),
        }
    }

    pub fn first(&self) -> &Color {
        &self.first
    }

    pub fn second(&self) -> &Color {
        &self.second
    }

    pub fn contains(&self, color: &Color) -> bool {
        &self.first == color || &self.second == color
    }

    /// The opposite color of the pair, or `None` if `color` is not configured.
    pub fn other(&self, color: &Color) -> Option<&Color> {
        if color == &self.first {
            Some(&self.second)
        } else if color == &self.second {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Resolve a raw token to a configured color.
    pub fn lookup(&self, token: &str) -> Option<&Color> {
        self.iter().find(|c| c.as_str() == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        [&self.first, &self.second].into_iter()
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        Self {
            first: Color("blue".to_string()),
            second: Color("green".to_string()),
        }
    }
}

impl From<ColorPair> for Vec<Color> {
    fn from(pair: ColorPair) -> Self {
        vec![pair.first, pair.second]
    }
}

impl<'de> Deserialize<'de> for ColorPair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let colors: Vec<Color> = Vec::deserialize(deserializer)?;
        match <[Color; 2]>::try_from(colors) {
            Ok([first, second]) => ColorPair::new(first, second).map_err(serde::de::Error::custom),
            Err(colors) => Err(serde::de::Error::custom(ColorError::WrongCount(
                colors.len(),
            ))),
        }
    }
}

impl fmt::Display for ColorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_accepts_lowercase_alphanumerics() {
        assert_eq!(Color::new("blue").unwrap().as_str(), "blue");
        assert_eq!(Color::new("v2").unwrap().as_str(), "v2");
    }

    #[test]
    fn color_rejects_separators_and_uppercase() {
        assert_eq!(Color::new(""), Err(ColorError::Empty));
        assert!(matches!(
            Color::new("dark-blue"),
            Err(ColorError::InvalidChar { found: '-', .. })
        ));
        assert!(matches!(
            Color::new("Blue"),
            Err(ColorError::InvalidChar { found: 'B', .. })
        ));
    }

    #[test]
    fn pair_requires_two_distinct_colors() {
        assert!(ColorPair::from_tokens(&["blue", "green"]).is_ok());
        assert_eq!(
            ColorPair::from_tokens(&["blue"]),
            Err(ColorError::WrongCount(1))
        );
        assert_eq!(
            ColorPair::from_tokens(&["blue", "blue"]),
            Err(ColorError::Duplicate("blue".to_string()))
        );
    }

    #[test]
    fn other_returns_opposite_color() {
        let pair = ColorPair::default();
        let blue = Color::new("blue").unwrap();
        let green = Color::new("green").unwrap();
        let red = Color::new("red").unwrap();

        assert_eq!(pair.other(&blue), Some(&green));
        assert_eq!(pair.other(&green), Some(&blue));
        assert_eq!(pair.other(&red), None);
        assert_eq!(pair.first(), &blue);
    }

    #[test]
    fn pair_deserializes_from_yaml_list() {
        let pair: ColorPair = serde_yaml::from_str("[red, black]").unwrap();
        assert_eq!(pair.first().as_str(), "red");
        assert_eq!(pair.second().as_str(), "black");

        let err = serde_yaml::from_str::<ColorPair>("[red, black, white]").unwrap_err();
        assert!(err.to_string().contains("exactly two colors"));
    }
}
