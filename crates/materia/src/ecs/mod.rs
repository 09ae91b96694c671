//! # ECS — Materias and Scenes
//!
//! The entity side of the runtime. A [`Scene`] owns [`Materia`] nodes in an
//! arena keyed by [`EntityId`]; each materia carries its components and id
//! links to its parent and children.
//!
//! ## Module Overview
//!
//! | Module      | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `entity`    | `EntityId` and the per-scene id allocator           |
//! | `materia`   | A single node: metadata and component list          |
//! | `scene`     | The arena, root list, lookups and frame update      |
//! | `hierarchy` | Re-parenting, removal and subtree re-insertion      |

mod entity;
mod hierarchy;
mod materia;
mod scene;

pub use entity::EntityId;
pub(crate) use entity::IdAllocator;
pub use hierarchy::Subtree;
pub use materia::Materia;
pub use scene::{Scene, SceneToken};
