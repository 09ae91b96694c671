//! # Materia — Scene Nodes
//!
//! A [`Materia`] is one node of the scene tree: identity, a few metadata
//! fields, an ordered list of [`Ley`] components, and id links to its parent
//! and children.
//!
//! Tree links are owned by the [`Scene`](super::Scene), which keeps them
//! consistent (see [`hierarchy`](super::hierarchy)). A materia on its own
//! only exposes them read-only.
//!
//! ## Components
//!
//! Lookup is a linear scan returning the first match, so callers should not
//! attach two components of a kind that is meant to be singular. Nothing
//! stops them; [`get`](Materia::get) will just never see the second one.
//!
//! ## Duplication
//!
//! [`Materia::duplicate`] copies the node's own state and components under a
//! new id, with no parent and **no children**. Whether to copy a subtree is
//! the caller's decision ([`Scene::duplicate`](super::Scene::duplicate)).

use std::collections::BTreeMap;

use crate::ecs::EntityId;
use crate::leyes::{Animator, Ley, LeyVariant, SpriteRenderer, Transform};

pub struct Materia {
    pub(crate) id: EntityId,
    pub name: String,
    /// Inactive nodes, and everything below them, are skipped by updates and
    /// hit tests.
    pub active: bool,
    pub layer: i32,
    pub tag: String,
    /// Ad hoc markers set by tools and scripts.
    pub flags: BTreeMap<String, serde_json::Value>,
    pub leyes: Vec<Ley>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl Materia {
    /// A node with a default [`Transform`].
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        let mut materia = Self::bare(id, name);
        materia.add(Transform::default());
        materia
    }

    /// A node with no components, as built by the loader.
    pub fn bare(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            layer: 0,
            tag: String::new(),
            flags: BTreeMap::new(),
            leyes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    // ── Components ───────────────────────────────────────────────────

    /// Append a component. No duplicate check is made.
    pub fn add(&mut self, ley: impl Into<Ley>) -> &mut Self {
        self.leyes.push(ley.into());
        self
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, ley: impl Into<Ley>) -> Self {
        self.add(ley);
        self
    }

    pub fn get<T: LeyVariant>(&self) -> Option<&T> {
        self.leyes.iter().find_map(T::from_ley)
    }

    pub fn get_mut<T: LeyVariant>(&mut self) -> Option<&mut T> {
        self.leyes.iter_mut().find_map(T::from_ley_mut)
    }

    /// Every component of type `T`, in order.
    pub fn get_all<T: LeyVariant>(&self) -> impl Iterator<Item = &T> {
        self.leyes.iter().filter_map(T::from_ley)
    }

    pub fn has<T: LeyVariant>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// First component with the given document type name.
    pub fn get_by_type_name(&self, type_name: &str) -> Option<&Ley> {
        self.leyes.iter().find(|ley| ley.type_name() == type_name)
    }

    /// Remove and return the first component of type `T`.
    pub fn remove<T: LeyVariant>(&mut self) -> Option<T> {
        let index = self.leyes.iter().position(|ley| ley.is::<T>())?;
        let ley = self.leyes.remove(index);
        T::from_ley(&ley).cloned()
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub fn set_flag(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.flags.insert(key.into(), value);
    }

    pub fn flag(&self, key: &str) -> Option<&serde_json::Value> {
        self.flags.get(key)
    }

    pub fn remove_flag(&mut self, key: &str) -> Option<serde_json::Value> {
        self.flags.remove(key)
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Run every component's update, then let an [`Animator`] drive the
    /// frame shown by the sibling [`SpriteRenderer`].
    pub fn update(&mut self, dt: f32) {
        for ley in &mut self.leyes {
            ley.update(dt);
        }

        let frame = self
            .get::<Animator>()
            .and_then(|animator| animator.current_frame_source())
            .map(str::to_owned);
        if let Some(frame) = frame {
            if let Some(sprite) = self.get_mut::<SpriteRenderer>() {
                sprite.displayed_frame = Some(frame);
            }
        }
    }

    /// Copy this node under `id`: same name, flags and component data, no
    /// parent, no children. Runtime-loaded resources are not copied.
    pub fn duplicate(&self, id: EntityId) -> Materia {
        Materia {
            id,
            name: self.name.clone(),
            active: self.active,
            layer: self.layer,
            tag: self.tag.clone(),
            flags: self.flags.clone(),
            leyes: self.leyes.iter().map(Ley::duplicate).collect(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Exact structural copy, links and ids included. Used when cloning a
    /// whole scene.
    pub(crate) fn clone_preserving_links(&self) -> Materia {
        Materia {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
            layer: self.layer,
            tag: self.tag.clone(),
            flags: self.flags.clone(),
            leyes: self.leyes.clone(),
            parent: self.parent,
            children: self.children.clone(),
        }
    }
}

impl std::fmt::Debug for Materia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Materia")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field(
                "leyes",
                &self.leyes.iter().map(Ley::type_name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leyes::{AnimationClip, AnimatorController, Camera};
    use std::collections::HashMap;

    #[test]
    fn new_materia_has_a_transform() {
        let m = Materia::new(EntityId(1), "Player");
        assert!(m.has::<Transform>());
        assert_eq!(m.leyes.len(), 1);
        assert!(Materia::bare(EntityId(2), "Empty").leyes.is_empty());
    }

    #[test]
    fn get_returns_first_match_and_remove_takes_it() {
        let mut m = Materia::bare(EntityId(1), "Cams");
        m.add(Camera { depth: 1, ..Default::default() });
        m.add(Camera { depth: 2, ..Default::default() });
        assert_eq!(m.get::<Camera>().unwrap().depth, 1);
        assert_eq!(m.get_all::<Camera>().count(), 2);

        let removed = m.remove::<Camera>().unwrap();
        assert_eq!(removed.depth, 1);
        assert_eq!(m.get::<Camera>().unwrap().depth, 2);
        assert!(m.get_by_type_name("Camera").is_some());
        assert!(m.get_by_type_name("Transform").is_none());
    }

    #[test]
    fn flags() {
        let mut m = Materia::bare(EntityId(1), "Flagged");
        m.set_flag("spawn", serde_json::json!("north"));
        assert_eq!(m.flag("spawn"), Some(&serde_json::json!("north")));
        assert!(m.remove_flag("spawn").is_some());
        assert!(m.flag("spawn").is_none());
    }

    #[test]
    fn duplicate_has_new_id_same_data_no_children() {
        let mut m = Materia::new(EntityId(1), "Parent");
        m.get_mut::<Transform>().unwrap().position.x = 42.0;
        m.tag = "enemy".into();
        m.children.push(EntityId(2));
        m.parent = Some(EntityId(9));

        let copy = m.duplicate(EntityId(10));
        assert_eq!(copy.id(), EntityId(10));
        assert_eq!(copy.name, "Parent");
        assert_eq!(copy.tag, "enemy");
        assert_eq!(copy.leyes, m.leyes);
        assert!(copy.children().is_empty());
        assert!(copy.parent().is_none());
    }

    #[test]
    fn animator_drives_sibling_sprite() {
        let mut animator = Animator::new("hero.ceanim");
        animator.install(
            AnimatorController {
                entry_state: "idle".into(),
                states: Vec::new(),
            },
            HashMap::from([(
                "idle".to_string(),
                AnimationClip {
                    frames: vec!["i0.png".into(), "i1.png".into()],
                    ..Default::default()
                },
            )]),
        );
        let mut m = Materia::new(EntityId(1), "Hero")
            .with(SpriteRenderer::new("hero.png"))
            .with(animator);

        m.update(0.0);
        assert_eq!(m.get::<SpriteRenderer>().unwrap().current_source(), "i0.png");
        m.update(0.2);
        assert_eq!(m.get::<SpriteRenderer>().unwrap().current_source(), "i1.png");
    }
}
