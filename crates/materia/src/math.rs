//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) so users don't need to depend on
//! it directly. On top of that this module defines the small value types that
//! appear in scene documents: [`Size`], [`Rect`] and [`Color`].
//!
//! ## Document encoding
//!
//! Scene documents are authored by tools that write vectors as `{ "x", "y" }`
//! objects, while glam's own serde support writes `[x, y]` arrays. Fields of
//! type [`Vec2`] use [`vec2_xy`] so the document stays in object form, and both
//! shapes are accepted when reading.

pub use glam::Vec2;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Size ─────────────────────────────────────────────────────────────────

/// A width/height pair, used for UI sizes and reference resolutions.
///
/// Older documents store sizes as `{ "x", "y" }`; both spellings are read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    #[serde(alias = "x")]
    pub width: f32,
    #[serde(alias = "y")]
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}

impl From<Vec2> for Size {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

// ── Rect ─────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle in Y-down screen space: `(x, y)` is the top-left
/// corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// The zero-sized rectangle at the origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle of the given size whose center sits at `center`.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Half-open: the left and top edges are inside, the right and bottom
    /// edges are not, so rectangles that share an edge never both contain a
    /// point on it.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

// ── Color ────────────────────────────────────────────────────────────────

/// An 8-bit RGBA color, stored in documents as a `#rrggbb` hex string
/// (`#rrggbbaa` when not fully opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 => {
                let mut channels = digits.chars().map(|c| c.to_digit(16).map(|v| (v * 17) as u8));
                Some(Self::rgb(channels.next()??, channels.next()??, channels.next()??))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawColor {
            Hex(String),
            Channels {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: u8,
            },
        }

        fn opaque() -> u8 {
            255
        }

        Ok(match RawColor::deserialize(deserializer)? {
            RawColor::Hex(hex) => Color::from_hex(&hex).unwrap_or_else(|| {
                log::warn!("Unparsable color '{hex}', falling back to white");
                Color::WHITE
            }),
            RawColor::Channels { r, g, b, a } => Color::rgba(r, g, b, a),
        })
    }
}

// ── Serde helpers ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVec2 {
    Object {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Array([f32; 2]),
}

impl From<RawVec2> for Vec2 {
    fn from(raw: RawVec2) -> Self {
        match raw {
            RawVec2::Object { x, y } => Vec2::new(x, y),
            RawVec2::Array([x, y]) => Vec2::new(x, y),
        }
    }
}

#[derive(Serialize)]
struct Xy {
    x: f32,
    y: f32,
}

/// `#[serde(with = "vec2_xy")]` for [`Vec2`] fields.
pub mod vec2_xy {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        Xy { x: v.x, y: v.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        RawVec2::deserialize(deserializer).map(Vec2::from)
    }
}

/// `#[serde(with = "vec2_xy_list")]` for `Vec<Vec2>` fields.
pub mod vec2_xy_list {
    use super::*;

    pub fn serialize<S: Serializer>(list: &[Vec2], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(list.iter().map(|v| Xy { x: v.x, y: v.y }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec2>, D::Error> {
        let raw = Vec::<RawVec2>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(Vec2::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "vec2_xy")]
        v: Vec2,
    }

    #[test]
    fn color_hex_forms() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#00000080"), Some(Color::rgba(0, 0, 0, 128)));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::rgb(26, 26, 42).to_hex(), "#1a1a2a");
        assert_eq!(Color::rgba(0, 0, 0, 128).to_hex(), "#00000080");
    }

    #[test]
    fn garbage_color_falls_back_to_white() {
        let c: Color = serde_json::from_value(serde_json::json!("not a color")).unwrap();
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn vec2_written_as_object_read_from_either_shape() {
        let json = serde_json::to_value(Holder { v: Vec2::new(1.5, -2.0) }).unwrap();
        assert_eq!(json, serde_json::json!({ "v": { "x": 1.5, "y": -2.0 } }));

        let from_array: Holder = serde_json::from_value(serde_json::json!({ "v": [3.0, 4.0] })).unwrap();
        assert_eq!(from_array.v, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn size_reads_legacy_xy_spelling() {
        let s: Size = serde_json::from_value(serde_json::json!({ "x": 200, "y": 150 })).unwrap();
        assert_eq!(s, Size::new(200.0, 150.0));
        let partial: Size = serde_json::from_value(serde_json::json!({ "width": 10 })).unwrap();
        assert_eq!(partial, Size::new(10.0, 100.0));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(29.9, 19.9)));
        assert!(!r.contains(Vec2::new(30.0, 15.0)));
        assert!(!r.contains(Vec2::new(15.0, 20.0)));
        assert!(!Rect::new(0.0, 0.0, 0.0, 0.0).contains(Vec2::ZERO));
        assert_eq!(Rect::from_center_size(Vec2::ZERO, Vec2::new(4.0, 2.0)), Rect::new(-2.0, -1.0, 4.0, 2.0));
    }
}
