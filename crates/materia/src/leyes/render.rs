//! Rendering-facing components: camera, sprites and 2D lights.
//!
//! None of these draw anything; they are the data a renderer reads. Sprite
//! images are resolved during hydration and kept out of the document.

use serde::{Deserialize, Serialize};

use crate::asset::{LoadedImage, ResourceState};
use crate::math::{Color, Vec2, vec2_xy_list};

// ── Camera ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClearFlags {
    #[default]
    SolidColor,
    Skybox,
    DontClear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Camera {
    /// Render order; higher depth draws on top.
    pub depth: i32,
    pub projection: Projection,
    pub fov: f32,
    pub orthographic_size: f32,
    pub near_clip_plane: f32,
    pub far_clip_plane: f32,
    pub clear_flags: ClearFlags,
    pub background_color: Color,
    /// Layer bitmask; `-1` means every layer.
    pub culling_mask: i32,
    /// Editor viewport zoom. Not part of the scene data.
    #[serde(skip)]
    pub zoom: f32,
}

impl Camera {
    pub fn sees_layer(&self, layer: i32) -> bool {
        (0..32).contains(&layer) && self.culling_mask & (1 << layer) != 0
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            depth: 0,
            projection: Projection::Perspective,
            fov: 60.0,
            orthographic_size: 5.0,
            near_clip_plane: 0.1,
            far_clip_plane: 1000.0,
            clear_flags: ClearFlags::SolidColor,
            background_color: Color::rgb(0x1e, 0x29, 0x3b),
            culling_mask: -1,
            zoom: 1.0,
        }
    }
}

// ── SpriteRenderer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteRenderer {
    /// Project-relative image path.
    pub source: String,
    /// Tint.
    pub color: Color,
    pub sorting_layer: String,
    pub order_in_layer: i32,
    #[serde(skip)]
    pub image: ResourceState<LoadedImage>,
    /// Frame currently shown, when an [`Animator`](super::Animator) drives
    /// this sprite. `None` shows `source`.
    #[serde(skip)]
    pub displayed_frame: Option<String>,
}

impl SpriteRenderer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// The image path a renderer should draw right now.
    pub fn current_source(&self) -> &str {
        self.displayed_frame.as_deref().unwrap_or(&self.source)
    }

    pub(crate) fn reset_runtime(&mut self) {
        self.image = ResourceState::Unloaded;
        self.displayed_frame = None;
    }
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            source: String::new(),
            color: Color::WHITE,
            sorting_layer: "Default".into(),
            order_in_layer: 0,
            image: ResourceState::Unloaded,
            displayed_frame: None,
        }
    }
}

// ── Lights ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight2D {
    pub color: Color,
    pub intensity: f32,
    pub radius: f32,
}

impl Default for PointLight2D {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            radius: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLight2D {
    pub color: Color,
    pub intensity: f32,
    pub radius: f32,
    /// Cone angle in degrees.
    pub angle: f32,
}

impl Default for SpotLight2D {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            radius: 300.0,
            angle: 45.0,
        }
    }
}

/// A light shaped by a polygon, vertices relative to the owner's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeformLight2D {
    pub color: Color,
    pub intensity: f32,
    #[serde(with = "vec2_xy_list")]
    pub vertices: Vec<Vec2>,
}

impl Default for FreeformLight2D {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            vertices: vec![
                Vec2::new(-50.0, -50.0),
                Vec2::new(50.0, -50.0),
                Vec2::new(50.0, 50.0),
                Vec2::new(-50.0, 50.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteLight2D {
    pub source: String,
    pub color: Color,
    pub intensity: f32,
    #[serde(skip)]
    pub image: ResourceState<LoadedImage>,
}

impl Default for SpriteLight2D {
    fn default() -> Self {
        Self {
            source: String::new(),
            color: Color::WHITE,
            intensity: 1.0,
            image: ResourceState::Unloaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camera_zoom_stays_out_of_the_document() {
        let mut cam = Camera::default();
        cam.zoom = 3.0;
        let json = serde_json::to_value(&cam).unwrap();
        assert!(json.get("zoom").is_none());
        assert_eq!(json["backgroundColor"], json!("#1e293b"));
        assert_eq!(json["projection"], json!("Perspective"));

        let back: Camera = serde_json::from_value(json).unwrap();
        assert_eq!(back.zoom, 1.0);
        assert!(back.sees_layer(5));
    }

    #[test]
    fn sprite_runtime_state_is_not_serialized() {
        let mut sprite = SpriteRenderer::new("Assets/hero.png");
        sprite.displayed_frame = Some("Assets/hero_1.png".into());
        assert_eq!(sprite.current_source(), "Assets/hero_1.png");

        let json = serde_json::to_value(&sprite).unwrap();
        assert_eq!(
            json,
            json!({
                "source": "Assets/hero.png",
                "color": "#ffffff",
                "sortingLayer": "Default",
                "orderInLayer": 0
            })
        );

        sprite.reset_runtime();
        assert_eq!(sprite.current_source(), "Assets/hero.png");
    }

    #[test]
    fn freeform_vertices_round_trip() {
        let light = FreeformLight2D::default();
        let json = serde_json::to_value(&light).unwrap();
        assert_eq!(json["vertices"][0], json!({ "x": -50.0, "y": -50.0 }));
        let back: FreeformLight2D = serde_json::from_value(json).unwrap();
        assert_eq!(back, light);
    }
}
