//! UI components. Placement comes from [`UITransform`](super::UITransform)
//! and the layout engine in [`crate::layout`]; these hold what is drawn and
//! how it reacts to the pointer.

use serde::{Deserialize, Serialize};

use crate::asset::{LoadedImage, ResourceState};
use crate::ecs::EntityId;
use crate::math::{Color, Size};

// ── Canvas ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Laid out against the render target, letterboxed from the reference
    /// resolution.
    #[default]
    #[serde(rename = "Screen Space", alias = "ScreenSpaceOverlay")]
    ScreenSpace,
    /// A rectangle of `size` placed in the world at the canvas' transform.
    #[serde(rename = "World Space")]
    WorldSpace,
}

/// Root of a UI tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Canvas {
    pub render_mode: RenderMode,
    /// World-space size. Ignored in screen space.
    pub size: Size,
    pub reference_resolution: Size,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::ScreenSpace,
            size: Size::new(800.0, 600.0),
            reference_resolution: Size::new(800.0, 600.0),
        }
    }
}

// ── Image / Text ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UIImage {
    pub source: String,
    pub color: Color,
    #[serde(skip)]
    pub image: ResourceState<LoadedImage>,
}

impl Default for UIImage {
    fn default() -> Self {
        Self {
            source: String::new(),
            color: Color::WHITE,
            image: ResourceState::Unloaded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UIText {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub alignment: TextAlignment,
}

impl Default for UIText {
    fn default() -> Self {
        Self {
            text: "New Text".into(),
            font_size: 16.0,
            color: Color::WHITE,
            alignment: TextAlignment::Left,
        }
    }
}

// ── Button ───────────────────────────────────────────────────────────────

/// A function to call on a target materia's script when a button is clicked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonEvent {
    #[serde(alias = "targetMateriaId")]
    pub target_id: Option<EntityId>,
    pub function_name: String,
    /// Which script on the target, when it has several. Empty means the first.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub script_name: String,
}

impl ButtonEvent {
    pub fn is_complete(&self) -> bool {
        self.target_id.is_some() && !self.function_name.is_empty()
    }
}

/// Pointer interaction state. Runtime only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Normal,
    Hover,
    Pressed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Button {
    pub interactable: bool,
    pub normal_color: Color,
    pub hover_color: Color,
    pub pressed_color: Color,
    pub disabled_color: Color,
    pub on_click: Vec<ButtonEvent>,
    #[serde(skip)]
    pub state: ButtonState,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            interactable: true,
            normal_color: Color::WHITE,
            hover_color: Color::rgb(0xe0, 0xe0, 0xe0),
            pressed_color: Color::rgb(0xc0, 0xc0, 0xc0),
            disabled_color: Color::rgba(0xc8, 0xc8, 0xc8, 0x80),
            on_click: Vec::new(),
            state: ButtonState::Normal,
        }
    }
}

impl Button {
    /// Tint for the current state.
    pub fn current_color(&self) -> Color {
        if !self.interactable {
            return self.disabled_color;
        }
        match self.state {
            ButtonState::Normal => self.normal_color,
            ButtonState::Hover => self.hover_color,
            ButtonState::Pressed => self.pressed_color,
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.state != ButtonState::Normal
    }
}
