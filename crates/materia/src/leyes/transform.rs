//! Spatial components: the world [`Transform`] every materia starts with, and
//! the rectangle-anchored [`UITransform`] used by the layout engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::math::{Size, Vec2, vec2_xy};

/// Position, rotation (degrees) and scale of a materia in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    #[serde(with = "vec2_xy")]
    pub position: Vec2,
    pub rotation: f32,
    #[serde(with = "vec2_xy")]
    pub scale: Vec2,
}

impl Transform {
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Default::default()
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Unit vector pointing along the local +X axis.
    pub fn right(&self) -> Vec2 {
        Vec2::from_angle(self.rotation.to_radians())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

// ── Anchor presets ───────────────────────────────────────────────────────

/// Where a UI element is attached inside its parent's rectangle.
///
/// Documents store the preset by name (`"top-right"`). Very old documents
/// store a row-major index from the top-left corner:
///
/// ```text
/// 0 top-left     1 top-center     2 top-right
/// 3 middle-left  4 middle-center  5 middle-right
/// 6 bottom-left  7 bottom-center  8 bottom-right
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorPreset {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    #[default]
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl AnchorPreset {
    pub const ALL: [AnchorPreset; 9] = [
        AnchorPreset::TopLeft,
        AnchorPreset::TopCenter,
        AnchorPreset::TopRight,
        AnchorPreset::MiddleLeft,
        AnchorPreset::MiddleCenter,
        AnchorPreset::MiddleRight,
        AnchorPreset::BottomLeft,
        AnchorPreset::BottomCenter,
        AnchorPreset::BottomRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnchorPreset::TopLeft => "top-left",
            AnchorPreset::TopCenter => "top-center",
            AnchorPreset::TopRight => "top-right",
            AnchorPreset::MiddleLeft => "middle-left",
            AnchorPreset::MiddleCenter => "middle-center",
            AnchorPreset::MiddleRight => "middle-right",
            AnchorPreset::BottomLeft => "bottom-left",
            AnchorPreset::BottomCenter => "bottom-center",
            AnchorPreset::BottomRight => "bottom-right",
        }
    }

    /// Parse a preset name. The single-axis names (`"top"`, `"left"`,
    /// `"center"` ...) collapse onto the centered preset of that edge.
    pub fn from_name(name: &str) -> Option<Self> {
        let preset = match name.trim().to_ascii_lowercase().as_str() {
            "top-left" => AnchorPreset::TopLeft,
            "top-center" | "top" => AnchorPreset::TopCenter,
            "top-right" => AnchorPreset::TopRight,
            "middle-left" | "left" => AnchorPreset::MiddleLeft,
            "middle-center" | "center" | "middle" => AnchorPreset::MiddleCenter,
            "middle-right" | "right" => AnchorPreset::MiddleRight,
            "bottom-left" => AnchorPreset::BottomLeft,
            "bottom-center" | "bottom" => AnchorPreset::BottomCenter,
            "bottom-right" => AnchorPreset::BottomRight,
            _ => return None,
        };
        Some(preset)
    }

    pub fn from_index(index: u64) -> Option<Self> {
        Self::ALL.get(usize::try_from(index).ok()?).copied()
    }

    /// Normalized anchor point in Y-up logical space: `x` runs left (0) to
    /// right (1), `y` runs bottom (0) to top (1).
    pub fn anchor(self) -> Vec2 {
        let index = self as usize;
        let x = (index % 3) as f32 * 0.5;
        let y = 1.0 - (index / 3) as f32 * 0.5;
        Vec2::new(x, y)
    }
}

impl Serialize for AnchorPreset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for AnchorPreset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPreset {
            Name(String),
            Index(u64),
        }

        let preset = match RawPreset::deserialize(deserializer)? {
            RawPreset::Name(name) => AnchorPreset::from_name(&name).ok_or(name),
            RawPreset::Index(index) => AnchorPreset::from_index(index).ok_or(index.to_string()),
        };
        Ok(preset.unwrap_or_else(|raw| {
            log::warn!("Unknown anchor preset '{raw}', using middle-center");
            AnchorPreset::MiddleCenter
        }))
    }
}

// ── UITransform ──────────────────────────────────────────────────────────

/// Rectangle-anchored placement of a UI element inside its parent.
///
/// `position` is the offset of the pivot from the anchor point, with `+y`
/// pointing up. `pivot` is normalized within the element's own rectangle,
/// measured from its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UITransform {
    pub anchor_preset: AnchorPreset,
    #[serde(with = "vec2_xy")]
    pub pivot: Vec2,
    #[serde(with = "vec2_xy")]
    pub position: Vec2,
    pub size: Size,
}

impl UITransform {
    /// A transform anchored at `preset` with the matching natural pivot.
    pub fn anchored(preset: AnchorPreset, size: Size) -> Self {
        Self {
            anchor_preset: preset,
            pivot: crate::layout::pivot_for_preset(preset),
            position: Vec2::ZERO,
            size,
        }
    }
}

impl Default for UITransform {
    fn default() -> Self {
        Self {
            anchor_preset: AnchorPreset::MiddleCenter,
            pivot: Vec2::splat(0.5),
            position: Vec2::ZERO,
            size: Size::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preset_anchor_points() {
        assert_eq!(AnchorPreset::TopLeft.anchor(), Vec2::new(0.0, 1.0));
        assert_eq!(AnchorPreset::TopRight.anchor(), Vec2::new(1.0, 1.0));
        assert_eq!(AnchorPreset::MiddleCenter.anchor(), Vec2::new(0.5, 0.5));
        assert_eq!(AnchorPreset::BottomCenter.anchor(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn preset_from_name_index_and_alias() {
        let p: AnchorPreset = serde_json::from_value(json!("top-right")).unwrap();
        assert_eq!(p, AnchorPreset::TopRight);
        let p: AnchorPreset = serde_json::from_value(json!(6)).unwrap();
        assert_eq!(p, AnchorPreset::BottomLeft);
        let p: AnchorPreset = serde_json::from_value(json!("left")).unwrap();
        assert_eq!(p, AnchorPreset::MiddleLeft);
        let p: AnchorPreset = serde_json::from_value(json!("diagonal")).unwrap();
        assert_eq!(p, AnchorPreset::MiddleCenter);
        assert_eq!(serde_json::to_value(AnchorPreset::BottomRight).unwrap(), json!("bottom-right"));
    }

    #[test]
    fn ui_transform_document_shape() {
        let t = UITransform {
            anchor_preset: AnchorPreset::TopLeft,
            pivot: Vec2::ZERO,
            position: Vec2::new(5.0, -5.0),
            size: Size::new(50.0, 20.0),
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            json!({
                "anchorPreset": "top-left",
                "pivot": { "x": 0.0, "y": 0.0 },
                "position": { "x": 5.0, "y": -5.0 },
                "size": { "width": 50.0, "height": 20.0 }
            })
        );

        // Partial legacy record: missing fields take defaults, size in x/y form.
        let legacy: UITransform =
            serde_json::from_value(json!({ "anchorPreset": 2, "size": { "x": 50, "y": 50 } })).unwrap();
        assert_eq!(legacy.anchor_preset, AnchorPreset::TopRight);
        assert_eq!(legacy.pivot, Vec2::splat(0.5));
        assert_eq!(legacy.size, Size::new(50.0, 50.0));
    }

    #[test]
    fn transform_defaults() {
        let t: Transform = serde_json::from_value(json!({ "position": [3.0, 4.0] })).unwrap();
        assert_eq!(t.position, Vec2::new(3.0, 4.0));
        assert_eq!(t.scale, Vec2::ONE);
        assert!((Transform::default().right() - Vec2::X).length() < 0.001);
    }
}
