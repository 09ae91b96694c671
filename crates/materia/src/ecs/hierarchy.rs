//! # Hierarchy — Parent/Child Ownership
//!
//! Every materia is in exactly one place: the scene's root list, or one
//! parent's `children`. The operations here are the only ones that move
//! materias between those places, and each keeps that rule intact.
//!
//! ```ignore
//! let menu = scene.spawn("Menu")?;
//! let button = scene.spawn("Play")?;
//! scene.add_child(menu, button)?;        // leaves the root list
//! scene.add_child(button, menu);         // Err(CyclicOwnership), nothing changed
//!
//! let subtree = scene.remove_child(menu, button)?;   // out of the scene
//! scene.insert_subtree(subtree, None)?;              // back as a root
//! ```
//!
//! ## Cycles
//!
//! [`Scene::add_child`] walks up from the new parent before touching
//! anything. If the child is found on that path (or is the parent itself)
//! the call fails with [`SceneError::CyclicOwnership`] and the scene is left
//! exactly as it was.

use std::collections::HashMap;

use crate::ecs::{EntityId, Materia, Scene};
use crate::error::{Result, SceneError};
use crate::leyes::Ley;

/// A materia and all its descendants, removed from a scene.
///
/// `materias` is in pre-order, so `materias[0]` is the top node.
#[derive(Debug)]
pub struct Subtree {
    root: EntityId,
    materias: Vec<Materia>,
}

impl Subtree {
    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.materias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materias.is_empty()
    }

    pub fn materias(&self) -> &[Materia] {
        &self.materias
    }
}

impl Scene {
    /// Ids from `id`'s parent up to its root, nearest first.
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(Materia::parent);
        while let Some(parent) = current {
            // A broken arena must not hang the walk.
            if out.contains(&parent) {
                log::warn!("Parent chain of {id} loops at {parent}");
                break;
            }
            out.push(parent);
            current = self.get(parent).and_then(Materia::parent);
        }
        out
    }

    /// Whether `ancestor` is above `id` in the tree.
    pub fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// `id` and everything below it, pre-order.
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(materia) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(materia.children.iter().rev().copied());
        }
        out
    }

    /// Make `child` the last child of `parent`, detaching it from wherever it
    /// was. Fails without changing anything if either id is unknown or if
    /// `child` is `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<()> {
        if !self.contains(parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::EntityNotFound(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::CyclicOwnership { parent, child });
        }

        self.unlink(child);
        if let Some(c) = self.materias.get_mut(&child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.materias.get_mut(&parent) {
            p.children.push(child);
        }
        Ok(())
    }

    /// Move `id` to the end of the root list.
    pub fn make_root(&mut self, id: EntityId) -> Result<()> {
        if !self.contains(id) {
            return Err(SceneError::EntityNotFound(id));
        }
        self.unlink(id);
        self.roots.push(id);
        Ok(())
    }

    /// Detach `child` (and its subtree) from `parent` and take it out of the
    /// scene.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) -> Result<Subtree> {
        let is_child = self
            .get(child)
            .is_some_and(|c| c.parent == Some(parent));
        if !is_child {
            return Err(SceneError::EntityNotFound(child));
        }
        Ok(self.take_subtree(child))
    }

    /// Remove a materia and its descendants, wherever it is.
    pub fn remove_materia(&mut self, id: EntityId) -> Result<Subtree> {
        if !self.contains(id) {
            log::warn!("Materia {id} not found for removal");
            return Err(SceneError::EntityNotFound(id));
        }
        Ok(self.take_subtree(id))
    }

    /// Put a removed subtree back, under `parent` or as a root.
    ///
    /// If any of its ids is already used in this scene (it came from another
    /// scene, or ids were spawned since), the whole subtree gets fresh ids and
    /// button targets inside it are remapped. Returns the top node's id, or
    /// [`SceneError::IdsExhausted`] if no fresh ids are left.
    pub fn insert_subtree(&mut self, subtree: Subtree, parent: Option<EntityId>) -> Result<EntityId> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::EntityNotFound(parent));
            }
        }

        let Subtree { root, mut materias } = subtree;
        let clash = materias.iter().any(|m| self.contains(m.id()));
        let root = if clash {
            let remap = materias
                .iter()
                .map(|m| self.allocate_id().map(|fresh| (m.id(), fresh)))
                .collect::<Result<HashMap<EntityId, EntityId>>>()?;
            for m in &mut materias {
                remap_links(m, &remap);
            }
            remap.get(&root).copied().unwrap_or(root)
        } else {
            for m in &materias {
                self.allocator.reserve(m.id());
            }
            root
        };

        for mut m in materias {
            if m.id() == root {
                m.parent = None;
            }
            self.materias.insert(m.id(), m);
        }
        self.roots.push(root);

        if let Some(parent) = parent {
            self.add_child(parent, root)?;
        }
        Ok(root)
    }

    /// Remove `id` from its parent's children or from the root list.
    /// Leaves `id` itself with no parent.
    fn unlink(&mut self, id: EntityId) {
        let old_parent = self.materias.get_mut(&id).and_then(|m| m.parent.take());
        match old_parent {
            Some(p) => {
                if let Some(parent) = self.materias.get_mut(&p) {
                    parent.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
    }

    fn take_subtree(&mut self, id: EntityId) -> Subtree {
        let ids = self.descendants(id);
        self.unlink(id);
        let materias = ids
            .iter()
            .filter_map(|i| self.materias.remove(i))
            .collect();
        log::debug!("Detached subtree at {id} ({} materias)", ids.len());
        Subtree { root: id, materias }
    }
}

fn remap_links(materia: &mut Materia, remap: &HashMap<EntityId, EntityId>) {
    let map = |id: EntityId| remap.get(&id).copied().unwrap_or(id);
    materia.id = map(materia.id);
    materia.parent = materia.parent.map(map);
    for child in &mut materia.children {
        *child = map(*child);
    }
    for ley in &mut materia.leyes {
        if let Ley::Button(button) = ley {
            for event in &mut button.on_click {
                event.target_id = event.target_id.map(map);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leyes::{Button, ButtonEvent};

    /// Root exclusivity: parent is None exactly for ids in the root list, and
    /// every node is listed once across roots and children lists.
    fn assert_tree_consistent(scene: &Scene) {
        let mut listed = Vec::new();
        for &r in scene.roots() {
            assert!(scene.get(r).unwrap().parent().is_none(), "root {r} has a parent");
            listed.push(r);
        }
        for m in scene.materias.values() {
            for &c in m.children() {
                assert_eq!(scene.get(c).unwrap().parent(), Some(m.id()));
                listed.push(c);
            }
            if m.parent().is_none() {
                assert!(scene.roots().contains(&m.id()), "{} is parentless but not a root", m.id());
            }
        }
        listed.sort();
        let mut all: Vec<_> = scene.materias.keys().copied().collect();
        all.sort();
        assert_eq!(listed, all);
    }

    fn chain() -> (Scene, EntityId, EntityId, EntityId) {
        let mut scene = Scene::new();
        let a = scene.spawn("a").unwrap();
        let b = scene.spawn_child(a, "b").unwrap();
        let c = scene.spawn_child(b, "c").unwrap();
        (scene, a, b, c)
    }

    #[test]
    fn add_child_moves_out_of_roots() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent").unwrap();
        let child = scene.spawn("child").unwrap();
        assert_eq!(scene.roots().len(), 2);

        scene.add_child(parent, child).unwrap();
        assert_eq!(scene.roots(), &[parent]);
        assert_eq!(scene.get(child).unwrap().parent(), Some(parent));
        assert_tree_consistent(&scene);
    }

    #[test]
    fn reparent_detaches_from_old_parent() {
        let (mut scene, a, b, c) = chain();
        scene.add_child(a, c).unwrap();
        assert!(scene.get(b).unwrap().children().is_empty());
        assert_eq!(scene.get(a).unwrap().children(), &[b, c]);
        assert_tree_consistent(&scene);
    }

    #[test]
    fn cycles_are_rejected_without_changes() {
        let (mut scene, a, b, c) = chain();
        let before = scene.all_entities();

        let err = scene.add_child(c, a).unwrap_err();
        assert!(matches!(err, SceneError::CyclicOwnership { parent, child } if parent == c && child == a));
        assert!(matches!(scene.add_child(b, b), Err(SceneError::CyclicOwnership { .. })));

        assert_eq!(scene.all_entities(), before);
        assert_eq!(scene.get(a).unwrap().parent(), None);
        for id in scene.all_entities() {
            assert!(!scene.ancestors(id).contains(&id));
        }
        assert_tree_consistent(&scene);
    }

    #[test]
    fn ancestry_queries() {
        let (scene, a, b, c) = chain();
        assert_eq!(scene.ancestors(c), vec![b, a]);
        assert!(scene.is_ancestor(a, c));
        assert!(!scene.is_ancestor(c, a));
        assert_eq!(scene.descendants(a), vec![a, b, c]);
    }

    #[test]
    fn remove_child_takes_the_whole_subtree() {
        let (mut scene, a, b, c) = chain();
        let subtree = scene.remove_child(a, b).unwrap();
        assert_eq!(subtree.root(), b);
        assert_eq!(subtree.len(), 2);
        assert!(!scene.contains(b));
        assert!(!scene.contains(c));
        assert!(scene.get(a).unwrap().children().is_empty());
        assert_tree_consistent(&scene);

        // Not a child of that parent.
        assert!(matches!(scene.remove_child(a, a), Err(SceneError::EntityNotFound(_))));

        let back = scene.insert_subtree(subtree, Some(a)).unwrap();
        assert_eq!(back, b);
        assert_eq!(scene.descendants(a), vec![a, b, c]);
        assert_tree_consistent(&scene);
    }

    #[test]
    fn remove_materia_removes_roots_too() {
        let (mut scene, a, _, _) = chain();
        let other = scene.spawn("other").unwrap();
        scene.remove_materia(a).unwrap();
        assert_eq!(scene.roots(), &[other]);
        assert_eq!(scene.len(), 1);
        assert!(scene.remove_materia(a).is_err());
        assert_tree_consistent(&scene);
    }

    #[test]
    fn make_root_promotes() {
        let (mut scene, a, b, _) = chain();
        scene.make_root(b).unwrap();
        assert_eq!(scene.roots(), &[a, b]);
        assert_tree_consistent(&scene);
    }

    #[test]
    fn foreign_subtree_gets_fresh_ids() {
        let (mut source, a, b, c) = chain();
        if let Some(m) = source.get_mut(b) {
            m.add(Button {
                on_click: vec![ButtonEvent {
                    target_id: Some(c),
                    function_name: "go".into(),
                    script_name: String::new(),
                }],
                ..Default::default()
            });
        }
        let subtree = source.remove_child(a, b).unwrap();

        let (mut target, ..) = chain();
        let new_root = target.insert_subtree(subtree, None).unwrap();
        assert_ne!(new_root, b);
        let kids = target.get(new_root).unwrap().children().to_vec();
        assert_eq!(kids.len(), 1);
        let button = target.get(new_root).unwrap().get::<Button>().unwrap();
        assert_eq!(button.on_click[0].target_id, Some(kids[0]));
        assert_eq!(target.len(), 5);
        assert_tree_consistent(&target);
    }

    #[test]
    fn clashing_subtree_is_refused_when_ids_run_out() {
        let (mut source, a, b, _) = chain();
        let subtree = source.remove_child(a, b).unwrap();

        let (mut target, ..) = chain();
        target.allocator.reserve(EntityId(u32::MAX));
        let err = target.insert_subtree(subtree, None).unwrap_err();
        assert!(matches!(err, SceneError::IdsExhausted));
        assert_eq!(target.len(), 3);
        assert_tree_consistent(&target);
    }
}
