//! Third load pass: resolve resource paths into loaded resources.
//!
//! Hydration is split so nothing borrows the scene while requests are in
//! flight:
//!
//! ```text
//! plan_hydration(&scene)   → HydrationPlan      (paths + scene token)
//! plan.fetch(&loader).await → HydrationResults  (no scene access)
//! results.apply(&mut scene) → Vec<SceneError>   (token checked first)
//! ```
//!
//! Every request is independent: requests run concurrently and a failure
//! only marks its own component [`ResourceState::Unavailable`].
//! [`hydrate_scene`] runs all three steps.

use std::collections::HashMap;

use futures::future::join_all;

use crate::asset::{LoadedImage, ResourceLoader, ResourceState, load_image};
use crate::ecs::{EntityId, Scene, SceneToken};
use crate::error::SceneError;
use crate::leyes::{
    AnimationAsset, AnimationClip, AnimatorController, Ley, LeyVariant, ScriptSource,
};

/// What a single request loads.
#[derive(Debug, Clone, PartialEq)]
enum RequestKind {
    Image,
    Script,
    /// `inline` is the materia's own [`AnimatorController`] component, used
    /// when the animator names no controller file.
    Animator { inline: Option<AnimatorController> },
}

#[derive(Debug, Clone, PartialEq)]
struct Request {
    entity: EntityId,
    /// Position of the component in the materia's `leyes`.
    index: usize,
    type_name: &'static str,
    path: String,
    kind: RequestKind,
}

/// The hydration work for one scene, detached from it.
#[derive(Debug, Clone)]
pub struct HydrationPlan {
    token: SceneToken,
    requests: Vec<Request>,
}

/// Collect one request per component that references an external resource.
/// Components with an empty path are left alone.
pub fn plan_hydration(scene: &Scene) -> HydrationPlan {
    let mut requests = Vec::new();
    for materia in scene.iter() {
        let inline = materia.get::<AnimatorController>().cloned();
        for (index, ley) in materia.leyes.iter().enumerate() {
            let kind = match ley {
                Ley::SpriteRenderer(_) | Ley::SpriteLight2D(_) | Ley::UIImage(_) => RequestKind::Image,
                Ley::CreativeScript(_) => RequestKind::Script,
                Ley::Animator(_) => RequestKind::Animator {
                    inline: inline.clone(),
                },
                _ => continue,
            };
            let path = ley.resource_path().unwrap_or_default().to_string();
            let has_source = match &kind {
                RequestKind::Animator { inline } => !path.is_empty() || inline.is_some(),
                _ => !path.is_empty(),
            };
            if !has_source {
                continue;
            }
            requests.push(Request {
                entity: materia.id(),
                index,
                type_name: ley.type_name(),
                path,
                kind,
            });
        }
    }
    HydrationPlan {
        token: scene.token(),
        requests,
    }
}

impl HydrationPlan {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn token(&self) -> SceneToken {
        self.token
    }

    /// Run every request concurrently.
    pub async fn fetch(self, loader: &impl ResourceLoader) -> HydrationResults {
        let outcomes = join_all(self.requests.iter().map(|r| fetch_one(r, loader))).await;
        HydrationResults {
            token: self.token,
            results: self.requests.into_iter().zip(outcomes).collect(),
        }
    }
}

#[derive(Debug)]
enum Outcome {
    Image(Result<LoadedImage, String>),
    Script(Result<ScriptSource, String>),
    Animator {
        controller: Result<(AnimatorController, HashMap<String, AnimationClip>), String>,
        /// Clips that failed while the controller itself loaded.
        clip_failures: Vec<SceneError>,
    },
}

async fn fetch_one(request: &Request, loader: &impl ResourceLoader) -> Outcome {
    match &request.kind {
        RequestKind::Image => Outcome::Image(load_image(loader, &request.path).await),
        RequestKind::Script => Outcome::Script(
            loader
                .load_text_asset(&request.path)
                .await
                .map(ScriptSource::new)
                .ok_or_else(|| "asset not found".to_string()),
        ),
        RequestKind::Animator { inline } => fetch_animator(request, inline.as_ref(), loader).await,
    }
}

async fn fetch_animator(
    request: &Request,
    inline: Option<&AnimatorController>,
    loader: &impl ResourceLoader,
) -> Outcome {
    let controller = if request.path.is_empty() {
        inline.cloned().ok_or_else(|| "no controller".to_string())
    } else {
        load_json::<AnimatorController>(loader, &request.path).await
    };
    let controller = match controller {
        Ok(controller) => controller,
        Err(reason) => {
            return Outcome::Animator {
                controller: Err(reason),
                clip_failures: Vec::new(),
            };
        }
    };

    let loads = controller.states.iter().map(|state| async move {
        let clip = load_json::<AnimationAsset>(loader, &state.animation_asset)
            .await
            .and_then(|asset| {
                asset
                    .animations
                    .into_iter()
                    .next()
                    .ok_or_else(|| "asset has no animations".to_string())
            });
        (state, clip)
    });

    let mut clips = HashMap::new();
    let mut clip_failures = Vec::new();
    for (state, clip) in join_all(loads).await {
        match clip {
            Ok(clip) => {
                clips.insert(state.name.clone(), clip);
            }
            Err(reason) => clip_failures.push(SceneError::ResourceLoadFailure {
                entity: request.entity,
                path: state.animation_asset.clone(),
                reason,
            }),
        }
    }
    Outcome::Animator {
        controller: Ok((controller, clips)),
        clip_failures,
    }
}

async fn load_json<T: serde::de::DeserializeOwned>(
    loader: &impl ResourceLoader,
    path: &str,
) -> Result<T, String> {
    let text = loader
        .load_text_asset(path)
        .await
        .ok_or_else(|| "asset not found".to_string())?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))
}

/// Fetched resources waiting to be applied.
#[derive(Debug)]
pub struct HydrationResults {
    token: SceneToken,
    results: Vec<(Request, Outcome)>,
}

impl HydrationResults {
    pub fn token(&self) -> SceneToken {
        self.token
    }

    /// Store the results in `scene` and return the failures.
    ///
    /// If `scene` is not the scene the plan was made from, nothing is applied
    /// and the results are dropped. A component that moved or changed path
    /// since planning is skipped.
    pub fn apply(self, scene: &mut Scene) -> Vec<SceneError> {
        if scene.token() != self.token {
            log::warn!(
                "Discarding {} hydration results for a scene that is no longer current",
                self.results.len()
            );
            return Vec::new();
        }

        let mut failures = Vec::new();
        for (request, outcome) in self.results {
            let Some(ley) = scene
                .get_mut(request.entity)
                .and_then(|m| m.leyes.get_mut(request.index))
            else {
                log::debug!("{} was removed before hydration finished", request.entity);
                continue;
            };
            if ley.type_name() != request.type_name
                || ley.resource_path().unwrap_or_default() != request.path
            {
                log::debug!("{} {} changed before hydration finished", request.entity, request.type_name);
                continue;
            }
            apply_one(ley, &request, outcome, &mut failures);
        }

        for failure in &failures {
            log::warn!("{failure}");
        }
        failures
    }
}

fn apply_one(ley: &mut Ley, request: &Request, outcome: Outcome, failures: &mut Vec<SceneError>) {
    match (ley, outcome) {
        (Ley::SpriteRenderer(sprite), Outcome::Image(result)) => {
            sprite.image = resource_state(result, request, failures);
        }
        (Ley::SpriteLight2D(light), Outcome::Image(result)) => {
            light.image = resource_state(result, request, failures);
        }
        (Ley::UIImage(image), Outcome::Image(result)) => {
            image.image = resource_state(result, request, failures);
        }
        (Ley::CreativeScript(script), Outcome::Script(result)) => {
            if let Ok(source) = &result {
                log::debug!(
                    "Loaded script '{}' ({} public vars)",
                    script.script_name,
                    source.public_vars.len()
                );
            }
            script.source = resource_state(result, request, failures);
        }
        (Ley::Animator(animator), Outcome::Animator { controller, clip_failures }) => {
            failures.extend(clip_failures);
            match controller {
                Ok((controller, clips)) => animator.install(controller, clips),
                Err(reason) => {
                    failures.push(failure(request, &reason));
                    animator.controller = ResourceState::Unavailable(reason);
                }
            }
        }
        (ley, _) => log::debug!("No hydration for {}", ley.type_name()),
    }
}

fn resource_state<T>(
    result: Result<T, String>,
    request: &Request,
    failures: &mut Vec<SceneError>,
) -> ResourceState<T> {
    match result {
        Ok(value) => ResourceState::Loaded(value),
        Err(reason) => {
            failures.push(failure(request, &reason));
            ResourceState::Unavailable(reason)
        }
    }
}

fn failure(request: &Request, reason: &str) -> SceneError {
    SceneError::ResourceLoadFailure {
        entity: request.entity,
        path: if request.path.is_empty() {
            AnimatorController::TYPE.to_string()
        } else {
            request.path.clone()
        },
        reason: reason.to_string(),
    }
}

/// Plan, fetch and apply in one go. Returns the per-component failures.
pub async fn hydrate_scene(scene: &mut Scene, loader: &impl ResourceLoader) -> Vec<SceneError> {
    let plan = plan_hydration(scene);
    if plan.is_empty() {
        return Vec::new();
    }
    log::debug!("Hydrating {} components", plan.len());
    plan.fetch(loader).await.apply(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryResourceLoader;
    use crate::asset::tests::tiny_png;
    use crate::leyes::{Animator, AnimatorState, CreativeScript, SpriteRenderer, UIImage};
    use serde_json::json;

    fn controller_json() -> String {
        json!({
            "entryState": "idle",
            "states": [
                { "name": "idle", "animationAsset": "Anim/idle.cea" },
                { "name": "run", "animationAsset": "Anim/run.cea" }
            ]
        })
        .to_string()
    }

    fn clip_json(frames: &[&str]) -> String {
        json!({ "animations": [ { "name": "clip", "frames": frames, "speed": 10, "loop": true } ] })
            .to_string()
    }

    #[test]
    fn loads_images_scripts_and_animators() {
        let loader = MemoryResourceLoader::new()
            .with_bytes("Sprites/hero.png", tiny_png())
            .with_text("Scripts/hero.ces", "public int speed;\npublic Materia target;")
            .with_text("Anim/hero.ceanim", &controller_json())
            .with_text("Anim/idle.cea", &clip_json(&["i0.png", "i1.png"]))
            .with_text("Anim/run.cea", &clip_json(&["r0.png"]));

        let mut scene = Scene::new();
        let hero = scene.spawn("Hero").unwrap();
        scene
            .get_mut(hero)
            .unwrap()
            .add(SpriteRenderer::new("Sprites/hero.png"))
            .add(CreativeScript::new("Scripts/hero.ces"))
            .add(Animator::new("Anim/hero.ceanim"));

        let failures = pollster::block_on(hydrate_scene(&mut scene, &loader));
        assert!(failures.is_empty(), "{failures:?}");

        let m = scene.get(hero).unwrap();
        assert!(m.get::<SpriteRenderer>().unwrap().image.is_loaded());
        let vars = m.get::<CreativeScript>().unwrap().public_vars();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1].name, "target");
        let animator = m.get::<Animator>().unwrap();
        assert_eq!(animator.current_state(), Some("idle"));
        assert_eq!(animator.current_frame_source(), Some("i0.png"));
    }

    #[test]
    fn failures_are_per_component() {
        let loader = MemoryResourceLoader::new().with_bytes("ok.png", tiny_png());

        let mut scene = Scene::new();
        let a = scene.spawn("A").unwrap();
        scene
            .get_mut(a)
            .unwrap()
            .add(SpriteRenderer::new("ok.png"))
            .add(UIImage { source: "missing.png".into(), ..Default::default() })
            .add(CreativeScript::new("missing.ces"));

        let failures = pollster::block_on(hydrate_scene(&mut scene, &loader));
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|f| matches!(f, SceneError::ResourceLoadFailure { entity, .. } if *entity == a)));

        let m = scene.get(a).unwrap();
        assert!(m.get::<SpriteRenderer>().unwrap().image.is_loaded());
        assert!(m.get::<UIImage>().unwrap().image.is_unavailable());
        assert!(m.get::<CreativeScript>().unwrap().source.is_unavailable());
    }

    #[test]
    fn missing_clip_does_not_block_the_others() {
        let loader = MemoryResourceLoader::new()
            .with_text("Anim/hero.ceanim", &controller_json())
            .with_text("Anim/idle.cea", &clip_json(&["i0.png"]));

        let mut scene = Scene::new();
        let hero = scene.spawn("Hero").unwrap();
        scene.get_mut(hero).unwrap().add(Animator::new("Anim/hero.ceanim"));

        let failures = pollster::block_on(hydrate_scene(&mut scene, &loader));
        assert_eq!(failures.len(), 1);
        assert!(matches!(&failures[0], SceneError::ResourceLoadFailure { path, .. } if path == "Anim/run.cea"));

        let animator = scene.get_mut(hero).unwrap().get_mut::<Animator>().unwrap();
        assert_eq!(animator.current_state(), Some("idle"));
        assert!(!animator.play("run"));
    }

    #[test]
    fn animator_falls_back_to_sibling_controller() {
        let loader = MemoryResourceLoader::new().with_text("Anim/walk.cea", &clip_json(&["w0.png"]));

        let mut scene = Scene::new();
        let npc = scene.spawn("Npc").unwrap();
        scene
            .get_mut(npc)
            .unwrap()
            .add(AnimatorController {
                entry_state: "walk".into(),
                states: vec![AnimatorState { name: "walk".into(), animation_asset: "Anim/walk.cea".into() }],
            })
            .add(Animator::default());

        let failures = pollster::block_on(hydrate_scene(&mut scene, &loader));
        assert!(failures.is_empty(), "{failures:?}");
        let animator = scene.get(npc).unwrap().get::<Animator>().unwrap();
        assert_eq!(animator.current_frame_source(), Some("w0.png"));
    }

    #[test]
    fn empty_paths_are_not_requested() {
        let mut scene = Scene::new();
        let id = scene.spawn("Blank").unwrap();
        scene
            .get_mut(id)
            .unwrap()
            .add(SpriteRenderer::default())
            .add(Animator::default());
        assert!(plan_hydration(&scene).is_empty());
    }

    #[test]
    fn results_for_a_replaced_scene_are_discarded() {
        let loader = MemoryResourceLoader::new().with_bytes("hero.png", tiny_png());

        let mut scene = Scene::new();
        let hero = scene.spawn("Hero").unwrap();
        scene.get_mut(hero).unwrap().add(SpriteRenderer::new("hero.png"));

        let plan = plan_hydration(&scene);
        // The editor swapped in another scene while the load was in flight.
        let mut replacement = scene.clone();
        let results = pollster::block_on(plan.fetch(&loader));

        assert!(results.apply(&mut replacement).is_empty());
        let sprite = replacement.get(hero).unwrap().get::<SpriteRenderer>().unwrap();
        assert_eq!(sprite.image, ResourceState::Unloaded);
    }

    #[test]
    fn edited_components_are_skipped() {
        let loader = MemoryResourceLoader::new().with_bytes("a.png", tiny_png());

        let mut scene = Scene::new();
        let id = scene.spawn("A").unwrap();
        scene.get_mut(id).unwrap().add(SpriteRenderer::new("a.png"));

        let plan = plan_hydration(&scene);
        let results = pollster::block_on(plan.fetch(&loader));
        scene.get_mut(id).unwrap().get_mut::<SpriteRenderer>().unwrap().source = "b.png".into();

        assert!(results.apply(&mut scene).is_empty());
        let sprite = scene.get(id).unwrap().get::<SpriteRenderer>().unwrap();
        assert_eq!(sprite.image, ResourceState::Unloaded);
    }
}
