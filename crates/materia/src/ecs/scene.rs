//! # Scene — The Materia Forest
//!
//! A [`Scene`] owns every [`Materia`] in an arena keyed by [`EntityId`], the
//! ordered list of roots, the [`Ambiente`] settings, and the id allocator.
//!
//! ```text
//! roots: [#1, #4]
//!
//! #1 Scene            materias: { #1 → Materia { parent: None,     children: [#2, #3] },
//! ├── #2 Main Camera              #2 → Materia { parent: Some(#1), children: [] },
//! └── #3 Player                   #3 → Materia { parent: Some(#1), children: [] },
//! #4 Canvas                       #4 → Materia { parent: None,     children: [] } }
//! ```
//!
//! Traversal always starts from `roots` and follows `children`; the arena is
//! storage, not a second source of truth. [`Scene::all_entities`] therefore
//! yields each reachable node exactly once, parents before children.
//!
//! Structural edits (re-parenting, detaching, removal) live in
//! [`hierarchy`](super::hierarchy).

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ambiente::Ambiente;
use crate::ecs::{EntityId, IdAllocator, Materia};
use crate::error::{Result, SceneError};
use crate::leyes::{Camera, LeyVariant};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a scene instance.
///
/// Work started against one scene (such as resource hydration) compares
/// tokens before applying results, so a scene that was replaced in the
/// meantime never receives stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneToken(u64);

impl SceneToken {
    fn next() -> Self {
        SceneToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Scene {
    pub(crate) materias: HashMap<EntityId, Materia>,
    pub(crate) roots: Vec<EntityId>,
    pub ambiente: Ambiente,
    pub(crate) allocator: IdAllocator,
    engine_api: Option<Rc<dyn Any>>,
    token: SceneToken,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            materias: HashMap::new(),
            roots: Vec::new(),
            ambiente: Ambiente::default(),
            allocator: IdAllocator::new(),
            engine_api: None,
            token: SceneToken::next(),
        }
    }

    /// The starting scene for a new project: a `Scene` root with a
    /// `Main Camera` child.
    pub fn with_default_camera() -> Self {
        let mut scene = Self::new();
        let Ok(root) = scene.spawn("Scene") else {
            return scene;
        };
        if let Ok(camera) = scene.spawn_child(root, "Main Camera") {
            if let Some(m) = scene.get_mut(camera) {
                m.add(Camera::default());
            }
        }
        scene
    }

    pub fn token(&self) -> SceneToken {
        self.token
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create a root materia with a default transform.
    ///
    /// Fails with [`SceneError::IdsExhausted`] once every id has been used.
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<EntityId> {
        let id = self.allocate_id()?;
        self.materias.insert(id, Materia::new(id, name));
        self.roots.push(id);
        log::debug!("Spawned {id}");
        Ok(id)
    }

    /// Create a materia with a default transform under `parent`.
    pub fn spawn_child(&mut self, parent: EntityId, name: impl Into<String>) -> Result<EntityId> {
        if !self.contains(parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        let id = self.spawn(name)?;
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Insert a loader-built root under its own id. The allocator moves past
    /// that id. Fails if the id is taken.
    pub(crate) fn insert_root(&mut self, mut materia: Materia) -> Result<EntityId> {
        let id = materia.id();
        if self.materias.contains_key(&id) {
            return Err(SceneError::MalformedDocument(format!("duplicate materia id {}", id.0)));
        }
        materia.parent = None;
        materia.children.clear();
        self.allocator.reserve(id);
        self.materias.insert(id, materia);
        self.roots.push(id);
        Ok(id)
    }

    /// The id the next spawned materia will get, if any is left.
    pub fn next_id(&self) -> Option<EntityId> {
        self.allocator.peek()
    }

    pub(crate) fn allocate_id(&mut self) -> Result<EntityId> {
        self.allocator.allocate().ok_or_else(|| {
            log::warn!("Entity ids exhausted");
            SceneError::IdsExhausted
        })
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn get(&self, id: EntityId) -> Option<&Materia> {
        self.materias.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Materia> {
        self.materias.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.materias.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.materias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materias.is_empty()
    }

    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Every materia reachable from the roots, depth-first, parents first.
    pub fn all_entities(&self) -> Vec<EntityId> {
        let mut out = Vec::with_capacity(self.materias.len());
        let mut stack: Vec<EntityId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(materia) = self.materias.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(materia.children.iter().rev().copied());
        }
        out
    }

    /// [`all_entities`](Self::all_entities), resolved.
    pub fn iter(&self) -> impl Iterator<Item = &Materia> {
        self.all_entities().into_iter().filter_map(|id| self.materias.get(&id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.iter().find(|m| m.name == name).map(Materia::id)
    }

    pub fn find_by_flag(&self, key: &str, value: &serde_json::Value) -> Option<EntityId> {
        self.iter().find(|m| m.flag(key) == Some(value)).map(Materia::id)
    }

    /// Every materia carrying a `T`, in traversal order.
    pub fn find_all_with<T: LeyVariant>(&self) -> Vec<EntityId> {
        self.iter().filter(|m| m.has::<T>()).map(Materia::id).collect()
    }

    /// Like [`find_all_with`](Self::find_all_with), by document type name.
    pub fn find_all_with_type_name(&self, type_name: &str) -> Vec<EntityId> {
        self.iter()
            .filter(|m| m.get_by_type_name(type_name).is_some())
            .map(Materia::id)
            .collect()
    }

    pub fn find_first_camera(&self) -> Option<EntityId> {
        self.iter().find(|m| m.has::<Camera>()).map(Materia::id)
    }

    pub fn find_all_cameras(&self) -> Vec<EntityId> {
        self.find_all_with::<Camera>()
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Advance the day cycle, then update active materias depth-first. An
    /// inactive materia's whole subtree is skipped.
    pub fn update(&mut self, dt: f32) {
        self.ambiente.update(dt);
        let mut stack: Vec<EntityId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(materia) = self.materias.get_mut(&id) else {
                continue;
            };
            if !materia.active {
                continue;
            }
            materia.update(dt);
            stack.extend(materia.children.iter().rev().copied());
        }
    }

    // ── Engine API ───────────────────────────────────────────────────

    /// Attach the handle runtime scripts use to reach the engine. The core
    /// never looks inside it.
    pub fn set_engine_api<T: Any>(&mut self, api: Rc<T>) {
        self.engine_api = Some(api);
    }

    pub fn engine_api<T: Any>(&self) -> Option<Rc<T>> {
        self.engine_api.clone()?.downcast::<T>().ok()
    }

    // ── Duplication ──────────────────────────────────────────────────

    /// Copy `id` (without its children) under a new id, next to the
    /// original: same parent, or a new root.
    pub fn duplicate(&mut self, id: EntityId) -> Result<EntityId> {
        if !self.contains(id) {
            return Err(SceneError::EntityNotFound(id));
        }
        let new_id = self.allocate_id()?;
        let source = self.get(id).ok_or(SceneError::EntityNotFound(id))?;
        let parent = source.parent;
        let copy = source.duplicate(new_id);
        self.materias.insert(new_id, copy);
        self.roots.push(new_id);
        if let Some(parent) = parent {
            self.add_child(parent, new_id)?;
        }
        Ok(new_id)
    }

    /// Copy `id` and its whole subtree. Returns the id of the new top node.
    pub fn duplicate_recursive(&mut self, id: EntityId) -> Result<EntityId> {
        let top = self.duplicate(id)?;
        let children = self.get(id).map(|m| m.children.clone()).unwrap_or_default();
        for child in children {
            let copy = self.duplicate_recursive(child)?;
            self.add_child(top, copy)?;
        }
        Ok(top)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// A structural copy: same ids, tree and component data, under a new
/// [`SceneToken`]. The engine API handle is shared.
impl Clone for Scene {
    fn clone(&self) -> Self {
        Self {
            materias: self
                .materias
                .iter()
                .map(|(id, m)| (*id, m.clone_preserving_links()))
                .collect(),
            roots: self.roots.clone(),
            ambiente: self.ambiente.clone(),
            allocator: self.allocator.clone(),
            engine_api: self.engine_api.clone(),
            token: SceneToken::next(),
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("token", &self.token)
            .field("roots", &self.roots)
            .field("materias", &self.materias.len())
            .field("ambiente", &self.ambiente)
            .finish()
    }
}
