//! # Scene Documents — Save, Load, Hydrate
//!
//! Converts a [`Scene`] to and from its persisted JSON document.
//!
//! ## Quick Start
//!
//! ```ignore
//! use materia::prelude::*;
//!
//! // Save.
//! let document = save_scene(&scene)?;
//! save_scene_to_file(&scene, "Assets/Scenes/level.ceScene")?;
//!
//! // Load: create + link, then hydrate resources from the project folder.
//! let document = SceneDocument::from_file("Assets/Scenes/level.ceScene")?;
//! let loaded = SceneLoader::new().load_blocking(&document, &FsResourceLoader::new("."))?;
//! if !loaded.report.is_clean() {
//!     log::warn!("{} problems while loading", loaded.report.len());
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module     | Purpose                                                |
//! |------------|--------------------------------------------------------|
//! | `document` | `SceneDocument` and its records, decoded leniently     |
//! | `save`     | Scene → document, in traversal order                   |
//! | `load`     | Create and link passes, `SceneLoader` builder          |
//! | `hydrate`  | Concurrent resource loading with staleness checks      |

mod document;
mod hydrate;
mod load;
mod save;

pub use document::{LeyRecord, MateriaRecord, RejectedRecord, SceneDocument};
pub use hydrate::{HydrationPlan, HydrationResults, hydrate_scene, plan_hydration};
pub use load::{SceneLoader, build_scene, load_scene_from_file};
pub use save::{save_scene, save_scene_to_file};

use crate::ecs::Scene;
use crate::error::SceneError;

/// Problems a load recovered from, in the order they happened.
#[derive(Debug, Default)]
pub struct LoadReport {
    warnings: Vec<SceneError>,
}

impl LoadReport {
    /// True when nothing had to be skipped.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneError> {
        self.warnings.iter()
    }

    pub fn into_warnings(self) -> Vec<SceneError> {
        self.warnings
    }

    pub(crate) fn push(&mut self, warning: SceneError) {
        self.warnings.push(warning);
    }

    pub(crate) fn extend(&mut self, warnings: impl IntoIterator<Item = SceneError>) {
        self.warnings.extend(warnings);
    }
}

/// A fully loaded scene and what went wrong along the way.
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: Scene,
    pub report: LoadReport,
}
