//! Beaver color palette and the policy used to pick from it.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The fixed palette new beavers are colored from: `(name, hex)`.
pub const PALETTE: [(&str, &str); 8] = [
    ("Brown", "#8B4513"),
    ("Sienna", "#A0522D"),
    ("Peru", "#CD853F"),
    ("Chocolate", "#D2691E"),
    ("DarkGoldenrod", "#B8860B"),
    ("Goldenrod", "#DAA520"),
    ("SandyBrown", "#F4A460"),
    ("RosyBrown", "#BC8F8F"),
];

/// A display color, encoded as a CSS hex string (`#RRGGBB`).
///
/// Records coming back from the service are not re-validated, so a `Color`
/// may hold a value outside [`PALETTE`]; use [`Color::is_in_palette`] to check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Palette entry at `index` (wraps around).
    pub fn from_palette(index: usize) -> Self {
        Self(PALETTE[index % PALETTE.len()].1.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_in_palette(&self) -> bool {
        PALETTE.iter().any(|(_, hex)| *hex == self.0)
    }

    /// Human-readable palette name, if this color is a palette entry.
    pub fn palette_name(&self) -> Option<&'static str> {
        PALETTE
            .iter()
            .find(|(_, hex)| *hex == self.0)
            .map(|(name, _)| *name)
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chooses the color of a newly created beaver.
pub trait ColorPicker: Send + Sync {
    fn pick(&self) -> Color;
}

/// Uniform pick over [`PALETTE`]. No weighting, no collision avoidance.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomColorPicker;

impl ColorPicker for RandomColorPicker {
    fn pick(&self) -> Color {
        let idx = rand::rng().random_range(0..PALETTE.len());
        Color::from_palette(idx)
    }
}

/// Always picks the same palette entry. Useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedColorPicker(pub usize);

impl ColorPicker for FixedColorPicker {
    fn pick(&self) -> Color {
        Color::from_palette(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn palette_has_eight_distinct_entries() {
        let hexes: HashSet<_> = PALETTE.iter().map(|(_, hex)| *hex).collect();
        assert_eq!(hexes.len(), 8);
    }

    #[test]
    fn random_picker_stays_inside_palette() {
        let picker = RandomColorPicker;
        for _ in 0..500 {
            assert!(picker.pick().is_in_palette());
        }
    }

    #[test]
    fn random_picker_reaches_more_than_one_color() {
        let picker = RandomColorPicker;
        let seen: HashSet<_> = (0..500).map(|_| picker.pick()).collect();
        assert!(seen.len() > 1);
    }

    #[test]
    fn fixed_picker_wraps_around() {
        assert_eq!(FixedColorPicker(8).pick(), Color::new("#8B4513"));
        assert_eq!(FixedColorPicker(3).pick().palette_name(), Some("Chocolate"));
    }

    #[test]
    fn foreign_color_is_not_in_palette() {
        let c = Color::new("#000000");
        assert!(!c.is_in_palette());
        assert_eq!(c.palette_name(), None);
    }
}
