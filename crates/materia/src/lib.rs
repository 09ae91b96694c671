//! # Materia — 2D Scene Runtime
//!
//! Scene graph, component model and UI layout for 2D scenes authored as
//! JSON documents. A scene is a tree of [`Materia`](ecs::Materia) nodes,
//! each carrying typed components ("leyes"). Documents load in three
//! passes: create every node, link the tree, then hydrate images, scripts
//! and animations concurrently.
//!
//! Start with `use materia::prelude::*`.
//!
//! ## Module Overview
//!
//! | Module     | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | `ecs`      | `EntityId`, `Materia`, `Scene`, hierarchy operations     |
//! | `leyes`    | Built-in component types and the `Ley` sum type          |
//! | `registry` | Type-name → constructor table for document loading       |
//! | `scene`    | Document format, save, load and hydration                |
//! | `layout`   | Anchor/pivot UI layout, letterboxing, hit testing        |
//! | `ambiente` | Scene-wide lighting and day cycle                        |
//! | `asset`    | Resource loaders and load states                         |
//! | `math`     | `Vec2`, `Size`, `Rect`, `Color`                          |
//! | `error`    | `SceneError`                                             |

pub mod ambiente;
pub mod asset;
pub mod ecs;
pub mod error;
pub mod layout;
pub mod leyes;
pub mod math;
pub mod prelude;
pub mod registry;
pub mod scene;

pub use error::{Result, SceneError};
