//! # Anchor Layout — Absolute Rectangles for UI
//!
//! Resolves the on-screen rectangle of a UI materia from its ancestors,
//! parents first, memoized in a [`LayoutCache`] for one layout pass.
//!
//! ```ignore
//! let mut cache = LayoutCache::new();
//! let target = RenderTarget::new(1280.0, 720.0);
//! let rect = get_absolute_rect(&scene, button, &mut cache, target);
//! ```
//!
//! ## Rules
//!
//! | Node                              | Rectangle                                   |
//! |-----------------------------------|---------------------------------------------|
//! | `Canvas`, screen space            | `{0, 0, target.width, target.height}`       |
//! | `Canvas`, world space             | `size`, centered on its `Transform`         |
//! | `UITransform` with a parent       | anchored inside the parent's rectangle      |
//! | no `UITransform`, with a parent   | the parent's rectangle                      |
//! | anything else                     | `Rect::ZERO`                                |
//!
//! Layout never fails: it runs every frame, so a node that cannot be placed
//! gets the zero rectangle.
//!
//! ## Coordinates
//!
//! Anchors are in Y-up logical space (`bottom = 0`, `top = 1`) and
//! `UITransform::position.y` points up. Pivots and the resulting rectangles
//! are in Y-down screen space, pivot `(0, 0)` being the top-left corner:
//!
//! ```text
//! x = parent.x + parent.width  * anchor.x        + offset.x - width  * pivot.x
//! y = parent.y + parent.height * (1 - anchor.y)  - offset.y - height * pivot.y
//! ```
//!
//! ## Letterboxing
//!
//! A screen-space canvas is authored against a reference resolution.
//! [`LetterboxedCanvas`] lays its subtree out against that virtual rectangle
//! and maps the result into the real target with one uniform scale and a
//! centering offset ([`calculate_letterbox`]).

use std::collections::HashMap;

use crate::ecs::{EntityId, Materia, Scene};
use crate::leyes::{AnchorPreset, Button, ButtonEvent, ButtonState, Canvas, RenderMode, Transform, UITransform};
use crate::math::{Rect, Size, Vec2};

/// Size of the surface screen-space canvases are laid out on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub width: f32,
    pub height: f32,
}

impl RenderTarget {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl From<Size> for RenderTarget {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Resolved rectangles for one layout pass.
///
/// Entries are never invalidated: clear the cache (or use a new one) once
/// the tree or any layout data changes.
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    rects: HashMap<EntityId, Rect>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<Rect> {
        self.rects.get(&id).copied()
    }

    /// Fix the rectangle of `id`, e.g. to lay a subtree out against a
    /// virtual canvas.
    pub fn seed(&mut self, id: EntityId, rect: Rect) {
        self.rects.insert(id, rect);
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// The natural pivot for an anchor preset: the corner or edge the element
/// is attached at, in Y-down pivot space.
pub fn pivot_for_preset(preset: AnchorPreset) -> Vec2 {
    let anchor = preset.anchor();
    Vec2::new(anchor.x, 1.0 - anchor.y)
}

/// Absolute rectangle of `id`. Results (including every ancestor resolved
/// along the way) are memoized in `cache`.
pub fn get_absolute_rect(
    scene: &Scene,
    id: EntityId,
    cache: &mut LayoutCache,
    target: RenderTarget,
) -> Rect {
    if let Some(rect) = cache.get(id) {
        return rect;
    }
    let Some(materia) = scene.get(id) else {
        return Rect::ZERO;
    };

    let rect = match materia.get::<Canvas>() {
        Some(canvas) => canvas_rect(materia, canvas, target),
        None => {
            let parent_rect = materia
                .parent()
                .map(|parent| get_absolute_rect(scene, parent, cache, target));
            match (materia.get::<UITransform>(), parent_rect) {
                (Some(ui), Some(parent_rect)) => anchored_rect(ui, parent_rect),
                (None, Some(parent_rect)) => parent_rect,
                (_, None) => Rect::ZERO,
            }
        }
    };
    cache.seed(id, rect);
    rect
}

fn canvas_rect(materia: &Materia, canvas: &Canvas, target: RenderTarget) -> Rect {
    match canvas.render_mode {
        RenderMode::ScreenSpace => target.rect(),
        RenderMode::WorldSpace => {
            let center = materia
                .get::<Transform>()
                .map_or(Vec2::ZERO, |t| t.position);
            Rect::from_center_size(center, canvas.size.as_vec2())
        }
    }
}

/// Place `ui` inside `parent`.
pub fn anchored_rect(ui: &UITransform, parent: Rect) -> Rect {
    let anchor = ui.anchor_preset.anchor();
    let size = ui.size;
    let x = parent.x + parent.width * anchor.x + ui.position.x - size.width * ui.pivot.x;
    let y = parent.y + parent.height * (1.0 - anchor.y) - ui.position.y - size.height * ui.pivot.y;
    Rect::new(x, y, size.width, size.height)
}

// ── Letterboxing ─────────────────────────────────────────────────────────

/// A uniform scale followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub offset: Vec2,
}

impl Letterbox {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    pub fn apply(&self, rect: Rect) -> Rect {
        let min = self.apply_point(rect.min());
        Rect::new(min.x, min.y, rect.width * self.scale, rect.height * self.scale)
    }

    pub fn apply_point(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }

    /// Map a target-space point back into reference space.
    pub fn invert_point(&self, point: Vec2) -> Vec2 {
        if self.scale == 0.0 {
            return Vec2::ZERO;
        }
        (point - self.offset) / self.scale
    }
}

/// Fit `reference` inside `target` keeping its aspect ratio, centered.
///
/// `scale = min(target.width / reference.width, target.height / reference.height)`;
/// the leftover space on the other axis is split evenly. A degenerate
/// reference resolution yields the identity.
pub fn calculate_letterbox(reference: Size, target: Rect) -> Letterbox {
    if reference.width <= 0.0 || reference.height <= 0.0 {
        log::warn!(
            "Reference resolution {}x{} cannot be letterboxed",
            reference.width,
            reference.height
        );
        return Letterbox::IDENTITY;
    }
    let scale = (target.width / reference.width).min(target.height / reference.height);
    let offset = Vec2::new(
        target.x + (target.width - reference.width * scale) / 2.0,
        target.y + (target.height - reference.height * scale) / 2.0,
    );
    Letterbox { scale, offset }
}

/// Layout of one screen-space canvas against its reference resolution.
///
/// Used for the game view (target = the render target) and for the editor
/// preview of a canvas (target = the canvas' rectangle in the scene view).
#[derive(Debug, Clone)]
pub struct LetterboxedCanvas {
    canvas: EntityId,
    reference: Size,
    letterbox: Letterbox,
    cache: LayoutCache,
}

impl LetterboxedCanvas {
    /// `None` if `canvas` has no [`Canvas`] component.
    pub fn new(scene: &Scene, canvas: EntityId, target: Rect) -> Option<Self> {
        let reference = scene.get(canvas)?.get::<Canvas>()?.reference_resolution;
        let mut cache = LayoutCache::new();
        cache.seed(canvas, Rect::new(0.0, 0.0, reference.width, reference.height));
        Some(Self {
            canvas,
            reference,
            letterbox: calculate_letterbox(reference, target),
            cache,
        })
    }

    pub fn canvas(&self) -> EntityId {
        self.canvas
    }

    pub fn letterbox(&self) -> Letterbox {
        self.letterbox
    }

    /// Rectangle of `id` in reference-resolution space.
    pub fn virtual_rect(&mut self, scene: &Scene, id: EntityId) -> Rect {
        get_absolute_rect(scene, id, &mut self.cache, RenderTarget::from(self.reference))
    }

    /// Rectangle of `id` in target space.
    pub fn screen_rect(&mut self, scene: &Scene, id: EntityId) -> Rect {
        let rect = self.virtual_rect(scene, id);
        self.letterbox.apply(rect)
    }

    /// Top-most button under a target-space point, within this canvas.
    pub fn hit_test(&mut self, scene: &Scene, point: Vec2) -> Option<EntityId> {
        let point = self.letterbox.invert_point(point);
        let candidates = scene.descendants(self.canvas);
        let target = RenderTarget::from(self.reference);
        hit_test_among(scene, candidates, point, &mut self.cache, target)
    }
}

// ── Hit testing ──────────────────────────────────────────────────────────

/// Top-most active button under `point`: of all active materias with a
/// [`Button`] and a [`UITransform`] whose rectangle contains the point, the
/// last one in traversal order.
pub fn hit_test(
    scene: &Scene,
    point: Vec2,
    cache: &mut LayoutCache,
    target: RenderTarget,
) -> Option<EntityId> {
    hit_test_among(scene, scene.all_entities(), point, cache, target)
}

fn hit_test_among(
    scene: &Scene,
    candidates: Vec<EntityId>,
    point: Vec2,
    cache: &mut LayoutCache,
    target: RenderTarget,
) -> Option<EntityId> {
    candidates
        .into_iter()
        .filter(|&id| {
            scene
                .get(id)
                .is_some_and(|m| m.has::<Button>() && m.has::<UITransform>())
        })
        .filter(|&id| is_active_in_hierarchy(scene, id))
        .filter(|&id| get_absolute_rect(scene, id, cache, target).contains(point))
        .last()
}

fn is_active_in_hierarchy(scene: &Scene, id: EntityId) -> bool {
    let active = |id| scene.get(id).is_some_and(|m| m.active);
    active(id) && scene.ancestors(id).into_iter().all(active)
}

/// Pointer interaction with buttons across frames.
///
/// Feed it the hit-tested materia and the pointer button each frame; it
/// keeps every [`Button::state`] current and reports clicks. A click is a
/// release over the same interactable button the press started on.
#[derive(Debug, Clone, Default)]
pub struct UiPointer {
    pressed_on: Option<EntityId>,
    was_down: bool,
}

impl UiPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the complete `onClick` events of a clicked button.
    pub fn update(&mut self, scene: &mut Scene, hovered: Option<EntityId>, down: bool) -> Vec<ButtonEvent> {
        let pressed_now = down && !self.was_down;
        let released_now = !down && self.was_down;
        self.was_down = down;

        if pressed_now {
            self.pressed_on = hovered;
        }

        let mut fired = Vec::new();
        if released_now {
            let pressed_on = self.pressed_on.take();
            if let Some(id) = hovered.filter(|&h| Some(h) == pressed_on) {
                if let Some(button) = scene.get(id).and_then(|m| m.get::<Button>()) {
                    if button.interactable {
                        log::debug!("Button {id} clicked");
                        fired = button.on_click.iter().filter(|e| e.is_complete()).cloned().collect();
                    }
                }
            }
        }

        for id in scene.find_all_with::<Button>() {
            let Some(button) = scene.get_mut(id).and_then(|m| m.get_mut::<Button>()) else {
                continue;
            };
            button.state = if Some(id) != hovered || !button.interactable {
                ButtonState::Normal
            } else if down && self.pressed_on == Some(id) {
                ButtonState::Pressed
            } else {
                ButtonState::Hover
            };
        }
        fired
    }
}
