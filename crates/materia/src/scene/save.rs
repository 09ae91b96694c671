//! Scene → document.

use std::path::Path;

use serde_json::{Map, Value};

use crate::ecs::{Materia, Scene};
use crate::error::{Result, SceneError};
use crate::leyes::{CustomComponent, Ley, LeyVariant};
use crate::scene::document::{LeyRecord, MateriaRecord, SceneDocument};

/// Flatten a scene into a document, in traversal order (parents before
/// children, siblings in order).
pub fn save_scene(scene: &Scene) -> Result<SceneDocument> {
    let materias = scene
        .iter()
        .map(materia_record)
        .collect::<Result<Vec<_>>>()?;
    log::info!("Saved scene: {} materias", materias.len());
    Ok(SceneDocument::new(scene.ambiente.clone(), materias))
}

/// Save a scene as pretty-printed JSON.
pub fn save_scene_to_file(scene: &Scene, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = save_scene(scene)?.to_json_string_pretty()?;
    std::fs::write(path, json)?;
    log::info!("Wrote scene to {}", path.display());
    Ok(())
}

fn materia_record(materia: &Materia) -> Result<MateriaRecord> {
    let leyes = materia
        .leyes
        .iter()
        .map(|ley| ley_record(materia, ley))
        .collect::<Result<Vec<_>>>()?;
    Ok(MateriaRecord {
        id: materia.id(),
        name: materia.name.clone(),
        tag: materia.tag.clone(),
        parent_id: materia.parent(),
        is_active: materia.active,
        layer: materia.layer,
        flags: materia.flags.clone(),
        leyes,
    })
}

fn ley_record(materia: &Materia, ley: &Ley) -> Result<LeyRecord> {
    if let Ley::CustomComponent(custom) = ley {
        return Ok(custom_record(custom));
    }
    let properties = ley.properties().map_err(|e| SceneError::InvalidComponentData {
        entity: materia.id(),
        type_name: ley.type_name().to_string(),
        message: e.to_string(),
    })?;
    Ok(LeyRecord::new(ley.type_name(), properties))
}

/// Custom components are saved by definition name, with their public
/// variables, next to `type`.
fn custom_record(custom: &CustomComponent) -> LeyRecord {
    let mut inline = Map::new();
    inline.insert("definitionName".into(), Value::String(custom.definition_name.clone()));
    inline.insert("publicVars".into(), Value::Object(custom.public_vars.clone()));
    LeyRecord {
        type_name: CustomComponent::TYPE.to_string(),
        properties: Value::Object(Map::new()),
        inline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leyes::{Camera, Tile, Tilemap, TilemapCollider2D, TilemapRenderer, Transform};
    use serde_json::json;

    #[test]
    fn records_follow_traversal_order() {
        let mut scene = Scene::with_default_camera();
        let root = scene.roots()[0];
        let player = scene.spawn_child(root, "Player").unwrap();
        scene.get_mut(player).unwrap().tag = "player".into();

        let doc = save_scene(&scene).unwrap();
        let names: Vec<_> = doc.materias.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Scene", "Main Camera", "Player"]);
        assert_eq!(doc.materias[0].parent_id, None);
        assert_eq!(doc.materias[2].parent_id, Some(root));
        assert_eq!(doc.materias[2].tag, "player");

        let camera = &doc.materias[1].leyes;
        assert_eq!(camera[0].type_name, Transform::TYPE);
        assert_eq!(camera[1].type_name, Camera::TYPE);
    }

    #[test]
    fn tile_grids_are_written_as_sorted_pairs() {
        let mut tilemap = Tilemap::default();
        tilemap.set_tile(0, 2, 0, Tile::new("grass.png"));
        tilemap.set_tile(0, -1, 3, Tile::new("rock.png"));
        let mut collider = TilemapCollider2D::default();
        collider.generate(&tilemap);

        let mut scene = Scene::new();
        let id = scene.spawn("Map").unwrap();
        scene
            .get_mut(id)
            .unwrap()
            .add(tilemap)
            .add(TilemapRenderer::default())
            .add(collider);

        let doc = save_scene(&scene).unwrap();
        let leyes = &doc.materias[0].leyes;
        assert_eq!(
            leyes[1].properties["layers"][0]["tiles"],
            json!([["-1,3", { "sprite": "rock.png" }], ["2,0", { "sprite": "grass.png" }]])
        );
        // Renderer caches are not saved.
        assert_eq!(leyes[2].properties, json!({ "sortingLayer": "Default", "orderInLayer": 0 }));
        assert!(leyes[3].properties["meshCache"].is_array());
    }

    #[test]
    fn custom_components_are_saved_by_definition_name() {
        let mut custom = CustomComponent::default();
        custom.definition_name = "Health".into();
        custom.public_vars.insert("max".into(), json!(10));

        let mut scene = Scene::new();
        let id = scene.spawn("Hero").unwrap();
        scene.get_mut(id).unwrap().add(custom);

        let value = save_scene(&scene).unwrap().to_value().unwrap();
        assert_eq!(
            value["materias"][0]["leyes"][1],
            json!({ "type": "CustomComponent", "definitionName": "Health", "publicVars": { "max": 10 } })
        );
    }
}
