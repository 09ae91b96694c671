//! Physics data. Simulation lives outside this crate; these components only
//! describe bodies and shapes.

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, vec2_xy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    #[default]
    Dynamic,
    Static,
    Kinematic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rigidbody2D {
    pub body_type: BodyType,
    pub mass: f32,
    pub gravity_scale: f32,
    #[serde(with = "vec2_xy")]
    pub velocity: Vec2,
}

impl Default for Rigidbody2D {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            mass: 1.0,
            gravity_scale: 1.0,
            velocity: Vec2::ZERO,
        }
    }
}

impl Rigidbody2D {
    pub fn is_simulated(&self) -> bool {
        self.body_type != BodyType::Static
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoxCollider2D {
    #[serde(with = "vec2_xy")]
    pub size: Vec2,
    #[serde(with = "vec2_xy")]
    pub offset: Vec2,
    pub is_trigger: bool,
}

impl Default for BoxCollider2D {
    fn default() -> Self {
        Self {
            size: Vec2::ONE,
            offset: Vec2::ZERO,
            is_trigger: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapsuleDirection {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapsuleCollider2D {
    #[serde(with = "vec2_xy")]
    pub size: Vec2,
    #[serde(with = "vec2_xy")]
    pub offset: Vec2,
    pub direction: CapsuleDirection,
    pub is_trigger: bool,
}

impl Default for CapsuleCollider2D {
    fn default() -> Self {
        Self {
            size: Vec2::new(1.0, 2.0),
            offset: Vec2::ZERO,
            direction: CapsuleDirection::Vertical,
            is_trigger: false,
        }
    }
}

impl CapsuleCollider2D {
    /// Radius of the rounded ends.
    pub fn radius(&self) -> f32 {
        match self.direction {
            CapsuleDirection::Vertical => self.size.x / 2.0,
            CapsuleDirection::Horizontal => self.size.y / 2.0,
        }
    }
}
