//! Convenience re-exports: `use materia::prelude::*` for the common items.

pub use crate::ambiente::Ambiente;
pub use crate::asset::{FsResourceLoader, MemoryResourceLoader, ResourceLoader, ResourceState};
pub use crate::ecs::{EntityId, Materia, Scene, Subtree};
pub use crate::error::{Result, SceneError};
pub use crate::layout::{
    LayoutCache, Letterbox, LetterboxedCanvas, RenderTarget, UiPointer, calculate_letterbox,
    get_absolute_rect, hit_test,
};
pub use crate::leyes::{
    AnchorPreset, Animator, AnimatorController, BoxCollider2D, Button, ButtonEvent, Camera, Canvas,
    CreativeScript, CustomComponent, CustomComponentDefinition, CustomDefinitionTable, Ley,
    LeyVariant, RenderMode, Rigidbody2D, SpriteRenderer, Tilemap, TilemapRenderer, Transform,
    UIImage, UIText, UITransform,
};
pub use crate::math::{Color, Rect, Size, Vec2};
pub use crate::registry::ComponentRegistry;
pub use crate::scene::{
    LoadReport, LoadedScene, SceneDocument, SceneLoader, load_scene_from_file, save_scene,
    save_scene_to_file,
};
