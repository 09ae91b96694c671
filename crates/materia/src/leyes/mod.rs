//! # Leyes — Components
//!
//! A *ley* is a typed module of data and behavior attached to one
//! [`Materia`](crate::ecs::Materia). The set of built-in kinds is closed:
//! [`Ley`] is a sum type with one variant per kind, plus
//! [`CustomComponent`] for behavior described by data instead of code.
//!
//! ## Typed Access
//!
//! Every component type implements [`LeyVariant`], which ties it to its
//! variant and to the stable name used in documents and the registry:
//!
//! ```ignore
//! let sprite: Option<&SpriteRenderer> = materia.get::<SpriteRenderer>();
//! assert_eq!(SpriteRenderer::TYPE, "SpriteRenderer");
//! ```
//!
//! ## Ownership
//!
//! A ley has no pointer back to its owner. It lives in its owner's `leyes`
//! list, so "the owner" is always the materia holding it, and a detached ley
//! simply has none.

mod animation;
mod physics;
mod render;
mod script;
mod tilemap;
mod transform;
mod ui;

pub use animation::{AnimationAsset, AnimationClip, Animator, AnimatorController, AnimatorState};
pub use physics::{BodyType, BoxCollider2D, CapsuleCollider2D, CapsuleDirection, Rigidbody2D};
pub use render::{
    Camera, ClearFlags, FreeformLight2D, PointLight2D, Projection, SpotLight2D, SpriteLight2D,
    SpriteRenderer,
};
pub use script::{
    CreativeScript, CustomComponent, CustomComponentDefinition, CustomDefinitionTable, PublicVar,
    ScriptSource, parse_public_vars,
};
pub use tilemap::{
    BakedTilemap, Tile, TileCollider, TileCoord, Tilemap, TilemapCollider2D, TilemapLayer,
    TilemapRenderer, coord_pairs,
};
pub use transform::{AnchorPreset, Transform, UITransform};
pub use ui::{Button, ButtonEvent, ButtonState, Canvas, RenderMode, TextAlignment, UIImage, UIText};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A concrete component type that is one variant of [`Ley`].
pub trait LeyVariant: Clone + Default + Serialize + DeserializeOwned + 'static {
    /// Stable name used in documents and the registry.
    const TYPE: &'static str;

    fn from_ley(ley: &Ley) -> Option<&Self>;
    fn from_ley_mut(ley: &mut Ley) -> Option<&mut Self>;
    fn into_ley(self) -> Ley;
}

macro_rules! leyes {
    ($($kind:ident),* $(,)?) => {
        /// A component attached to a materia.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Ley {
            $($kind($kind),)*
        }

        impl Ley {
            /// Stable type name, as written in documents.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Ley::$kind(_) => <$kind as LeyVariant>::TYPE,)*
                }
            }

            /// Structural encoding of the component's saved fields.
            pub fn properties(&self) -> Result<serde_json::Value, serde_json::Error> {
                match self {
                    $(Ley::$kind(inner) => serde_json::to_value(inner),)*
                }
            }
        }

        $(
            impl LeyVariant for $kind {
                const TYPE: &'static str = stringify!($kind);

                fn from_ley(ley: &Ley) -> Option<&Self> {
                    match ley {
                        Ley::$kind(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn from_ley_mut(ley: &mut Ley) -> Option<&mut Self> {
                    match ley {
                        Ley::$kind(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn into_ley(self) -> Ley {
                    Ley::$kind(self)
                }
            }

            impl From<$kind> for Ley {
                fn from(inner: $kind) -> Self {
                    Ley::$kind(inner)
                }
            }
        )*

        /// Names of every built-in component type.
        pub const BUILTIN_TYPES: &[&str] = &[$(stringify!($kind),)*];
    };
}

leyes! {
    Transform,
    UITransform,
    Camera,
    SpriteRenderer,
    Tilemap,
    TilemapRenderer,
    TilemapCollider2D,
    Animator,
    AnimatorController,
    Rigidbody2D,
    BoxCollider2D,
    CapsuleCollider2D,
    Canvas,
    UIImage,
    UIText,
    Button,
    PointLight2D,
    SpotLight2D,
    FreeformLight2D,
    SpriteLight2D,
    CreativeScript,
    CustomComponent,
}

impl Ley {
    /// Per-frame hook. Most components are pure data.
    pub fn update(&mut self, dt: f32) {
        if let Ley::Animator(animator) = self {
            animator.update(dt);
        }
    }

    /// A copy for a duplicated materia: saved fields are kept, resources
    /// loaded at runtime are dropped and must be hydrated again.
    pub fn duplicate(&self) -> Ley {
        let mut copy = self.clone();
        match &mut copy {
            Ley::SpriteRenderer(sprite) => sprite.reset_runtime(),
            Ley::SpriteLight2D(light) => light.image = Default::default(),
            Ley::UIImage(image) => image.image = Default::default(),
            Ley::Animator(animator) => animator.reset_runtime(),
            Ley::CreativeScript(script) => script.reset_runtime(),
            Ley::TilemapRenderer(renderer) => renderer.mark_dirty(),
            Ley::Button(button) => button.state = ButtonState::Normal,
            _ => {}
        }
        copy
    }

    /// Invalidate caches derived from other saved data.
    ///
    /// Returns true if the component had such a cache.
    pub fn mark_derived_dirty(&mut self) -> bool {
        match self {
            Ley::TilemapRenderer(renderer) => {
                renderer.mark_dirty();
                true
            }
            _ => false,
        }
    }

    /// Project path of the external resource this component needs, if any.
    pub fn resource_path(&self) -> Option<&str> {
        let path = match self {
            Ley::SpriteRenderer(sprite) => &sprite.source,
            Ley::SpriteLight2D(light) => &light.source,
            Ley::UIImage(image) => &image.source,
            Ley::CreativeScript(script) => &script.script_name,
            Ley::Animator(animator) => &animator.controller_path,
            _ => return None,
        };
        (!path.is_empty()).then_some(path.as_str())
    }

    pub fn is<T: LeyVariant>(&self) -> bool {
        T::from_ley(self).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_match_variants() {
        assert_eq!(Ley::from(Transform::default()).type_name(), "Transform");
        assert_eq!(TilemapCollider2D::TYPE, "TilemapCollider2D");
        assert_eq!(CustomComponent::TYPE, "CustomComponent");
        assert_eq!(BUILTIN_TYPES.len(), 22);
    }

    #[test]
    fn typed_access() {
        let mut ley = SpriteRenderer::new("a.png").into_ley();
        assert!(ley.is::<SpriteRenderer>());
        assert!(!ley.is::<Camera>());
        assert!(Camera::from_ley(&ley).is_none());

        SpriteRenderer::from_ley_mut(&mut ley).unwrap().order_in_layer = 3;
        assert_eq!(SpriteRenderer::from_ley(&ley).unwrap().order_in_layer, 3);
    }

    #[test]
    fn duplicate_drops_runtime_state() {
        let mut sprite = SpriteRenderer::new("a.png");
        sprite.image = crate::asset::ResourceState::Unavailable("missing".into());
        let copy = Ley::from(sprite).duplicate();
        let copy = SpriteRenderer::from_ley(&copy).unwrap();
        assert_eq!(copy.source, "a.png");
        assert_eq!(copy.image, crate::asset::ResourceState::Unloaded);
    }

    #[test]
    fn resource_paths() {
        assert_eq!(Ley::from(CreativeScript::new("s.ces")).resource_path(), Some("s.ces"));
        assert_eq!(Ley::from(SpriteRenderer::default()).resource_path(), None);
        assert_eq!(Ley::from(Camera::default()).resource_path(), None);
    }

    #[test]
    fn only_tilemap_renderer_has_a_derived_cache() {
        let mut renderer = Ley::from(TilemapRenderer::default());
        assert!(renderer.mark_derived_dirty());
        assert!(!Ley::from(Tilemap::default()).mark_derived_dirty());
    }
}
