//! Foundation primitives shared by every layer: element identifiers,
//! 2D points, and the small string helpers the index and display code use.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// IDS
// ============================================================================

/// Unique identifier for a model element, relation, set, diagram, or view.
///
/// Ids come from the serialized project or are sampled at random for
/// synthesized elements (see [`ElementId::random`]). They are compared and
/// hashed as plain strings; cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Arc<str>);

impl ElementId {
    /// Create an ID from an existing string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Sample a fresh alphanumeric ID of the given length.
    pub fn random(length: usize) -> Self {
        const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                      abcdefghijklmnopqrstuvwxyz\
                                      0123456789";
        let mut rng = rand::thread_rng();
        let id: String = (0..length)
            .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
            .collect();
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// A point on a diagram canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// STRING HELPERS
// ============================================================================

/// Normalize a concept name for catalog indexing: lowercase, alphanumerics
/// only. `"Health Care Provider"` becomes `"healthcareprovider"`.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Uppercase the first character of a cleaned name.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Shift a `#RRGGBB` color by the given per-channel offset, clamping to the
/// valid range. Used to shade the object color for role/phase/subkind nodes.
/// Inputs that are not 7-character hex strings are returned unchanged.
pub fn shade(hex_color: &str, offset: i32) -> String {
    let digits = hex_color.strip_prefix('#').unwrap_or(hex_color);
    if digits.len() != 6 {
        return hex_color.to_string();
    }
    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        match u8::from_str_radix(&digits[2 * i..2 * i + 2], 16) {
            Ok(value) => *channel = (value as i32 + offset).clamp(0, 255) as u8,
            Err(_) => return hex_color.to_string(),
        }
    }
    format!("#{:02X}{:02X}{:02X}", channels[0], channels[1], channels[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_have_requested_length() {
        let id = ElementId::random(16);
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(ElementId::random(16), ElementId::random(16));
    }

    #[test]
    fn clean_name_strips_everything_but_alphanumerics() {
        assert_eq!(clean_name("Health Care Provider"), "healthcareprovider");
        assert_eq!(clean_name("e-mail (2)"), "email2");
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn shade_clamps_channels() {
        assert_eq!(shade("#000000", -20), "#000000");
        assert_eq!(shade("#FFFFFF", 20), "#FFFFFF");
        assert_eq!(shade("#102030", 16), "#203040");
        assert_eq!(shade("not-a-color", 16), "not-a-color");
    }
}
