//! Document → scene.
//!
//! ```text
//! 1. create   every record becomes a root materia under its saved id;
//!             components are resolved through the registry
//! 2. link     parentId edges are applied with Scene::add_child, so forward
//!             references work and cycles are refused
//! 3. hydrate  derived caches are marked dirty (sync), then resource paths
//!             are loaded (async, optional)
//! ```
//!
//! Passes 1 and 2 never fail on a single bad entity or component: the
//! problem is logged, recorded in the [`LoadReport`] and skipped. Records the
//! document could not decode are reported first. Only a duplicate id fails
//! the whole load, as a malformed document.

use std::path::Path;

use crate::asset::ResourceLoader;
use crate::ecs::{EntityId, Materia, Scene};
use crate::error::{Result, SceneError};
use crate::leyes::{CustomDefinitionTable, Ley};
use crate::registry::{self, ComponentRegistry};
use crate::scene::document::{LeyRecord, MateriaRecord, SceneDocument};
use crate::scene::hydrate::hydrate_scene;
use crate::scene::{LoadReport, LoadedScene};

/// Run the create and link passes, and mark derived caches dirty.
pub fn build_scene(
    document: &SceneDocument,
    registry: &ComponentRegistry,
    definitions: &CustomDefinitionTable,
) -> Result<(Scene, LoadReport)> {
    let mut scene = Scene::new();
    scene.ambiente = document.ambiente.clone();
    let mut report = LoadReport::default();
    report.extend(document.rejected.iter().map(|r| SceneError::InvalidEntityRecord {
        index: r.index,
        message: r.message.clone(),
    }));

    // Pass 1: create.
    for record in &document.materias {
        let materia = create_materia(record, registry, definitions, &mut report);
        scene.insert_root(materia)?;
    }

    // Pass 2: link.
    for record in &document.materias {
        let Some(parent) = record.parent_id else {
            continue;
        };
        match scene.add_child(parent, record.id) {
            Ok(()) => {}
            Err(SceneError::EntityNotFound(_)) => {
                log::warn!("{}: parent {parent} does not exist, kept as a root", record.id);
                report.push(SceneError::EntityNotFound(parent));
            }
            Err(err @ SceneError::CyclicOwnership { .. }) => {
                log::warn!("{err}; {} kept as a root", record.id);
                report.push(err);
            }
            Err(err) => return Err(err),
        }
    }

    // Pass 3, synchronous half.
    let ids = scene.all_entities();
    for id in ids {
        if let Some(materia) = scene.get_mut(id) {
            for ley in &mut materia.leyes {
                ley.mark_derived_dirty();
            }
        }
    }

    log::info!(
        "Built scene: {} materias, {} roots, {} warnings",
        scene.len(),
        scene.roots().len(),
        report.len()
    );
    Ok((scene, report))
}

fn create_materia(
    record: &MateriaRecord,
    registry: &ComponentRegistry,
    definitions: &CustomDefinitionTable,
    report: &mut LoadReport,
) -> Materia {
    let mut materia = Materia::bare(record.id, record.name.clone());
    materia.tag = record.tag.clone();
    materia.active = record.is_active;
    materia.layer = record.layer;
    materia.flags = record.flags.clone();

    for ley_record in &record.leyes {
        match create_ley(record.id, ley_record, registry, definitions) {
            Ok(ley) => {
                materia.add(ley);
            }
            Err(err) => {
                log::warn!("{err}; component skipped");
                report.push(err);
            }
        }
    }
    log::debug!("Created {} '{}' with {} leyes", record.id, record.name, materia.leyes.len());
    materia
}

fn create_ley(
    entity: EntityId,
    record: &LeyRecord,
    registry: &ComponentRegistry,
    definitions: &CustomDefinitionTable,
) -> Result<Ley> {
    if record.type_name.is_empty() {
        return Err(SceneError::InvalidComponentData {
            entity,
            type_name: String::new(),
            message: "component record has no type".into(),
        });
    }
    let properties = record.merged_properties();
    let mut ley = registry
        .create(&record.type_name, &properties)
        .ok_or_else(|| SceneError::UnknownComponentType {
            entity,
            type_name: record.type_name.clone(),
        })?
        .map_err(|e| SceneError::InvalidComponentData {
            entity,
            type_name: record.type_name.clone(),
            message: e.to_string(),
        })?;

    if let Ley::CustomComponent(custom) = &mut ley {
        let definition = definitions.get(&custom.definition_name).ok_or_else(|| {
            SceneError::UnresolvedCustomComponentDefinition {
                entity,
                definition: custom.definition_name.clone(),
            }
        })?;
        custom.definition = Some(definition);
    }
    Ok(ley)
}

// ── SceneLoader ──────────────────────────────────────────────────────────

/// Builder for the full three-pass load.
///
/// ```ignore
/// let loaded = SceneLoader::new()
///     .definitions(&definitions)
///     .load_blocking(&document, &FsResourceLoader::new("my_game"))?;
/// for warning in loaded.report.iter() {
///     eprintln!("{warning}");
/// }
/// ```
///
/// Without [`registry`](Self::registry) a snapshot of
/// [`registry::global`] is used, so types registered there at runtime load.
pub struct SceneLoader<'a> {
    registry: Option<&'a ComponentRegistry>,
    definitions: Option<&'a CustomDefinitionTable>,
    hydrate: bool,
}

impl<'a> SceneLoader<'a> {
    pub fn new() -> Self {
        Self {
            registry: None,
            definitions: None,
            hydrate: true,
        }
    }

    pub fn registry(mut self, registry: &'a ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn definitions(mut self, definitions: &'a CustomDefinitionTable) -> Self {
        self.definitions = Some(definitions);
        self
    }

    /// Whether to load resources after building. On by default.
    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }

    pub async fn load(
        &self,
        document: &SceneDocument,
        loader: &impl ResourceLoader,
    ) -> Result<LoadedScene> {
        let snapshot;
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                snapshot = global_snapshot();
                &snapshot
            }
        };
        let no_definitions = CustomDefinitionTable::new();
        let definitions = self.definitions.unwrap_or(&no_definitions);

        let (mut scene, mut report) = build_scene(document, registry, definitions)?;
        if self.hydrate {
            let failures = hydrate_scene(&mut scene, loader).await;
            report.extend(failures);
        }
        Ok(LoadedScene { scene, report })
    }

    /// [`load`](Self::load), driven to completion on the current thread.
    pub fn load_blocking(
        &self,
        document: &SceneDocument,
        loader: &impl ResourceLoader,
    ) -> Result<LoadedScene> {
        pollster::block_on(self.load(document, loader))
    }
}

fn global_snapshot() -> ComponentRegistry {
    let guard = registry::global().read().unwrap_or_else(|poisoned| {
        log::warn!("Component registry lock was poisoned, reading it anyway");
        poisoned.into_inner()
    });
    guard.clone()
}

impl Default for SceneLoader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a scene file and load it, resolving resources with `loader`.
pub fn load_scene_from_file(
    path: impl AsRef<Path>,
    loader: &impl ResourceLoader,
) -> Result<LoadedScene> {
    let document = SceneDocument::from_file(path)?;
    SceneLoader::new().load_blocking(&document, loader)
}
