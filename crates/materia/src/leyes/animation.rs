//! Frame animation: [`AnimatorController`] state graphs and the
//! [`Animator`] that plays them on a sibling sprite.
//!
//! ```text
//! Animator { controllerPath: "Assets/hero.ceanim" }
//!     │  hydration
//!     ▼
//! AnimatorController { entryState: "idle", states: [{ name, animationAsset }] }
//!     │  one .cea per state, first animation taken
//!     ▼
//! clips: { "idle" → AnimationClip { frames, speed, loop }, ... }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::asset::ResourceState;

/// A sequence of frame images played at `speed` frames per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationClip {
    pub name: String,
    pub frames: Vec<String>,
    pub speed: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            name: "New Animation".into(),
            frames: Vec::new(),
            speed: 10.0,
            looping: true,
        }
    }
}

/// The contents of an animation asset file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationAsset {
    pub animations: Vec<AnimationClip>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimatorState {
    pub name: String,
    /// Project path of the animation asset played in this state.
    pub animation_asset: String,
}

/// A named set of animation states. Used both as a component and as the
/// format of controller asset files.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimatorController {
    pub entry_state: String,
    pub states: Vec<AnimatorState>,
}

impl AnimatorController {
    pub fn state(&self, name: &str) -> Option<&AnimatorState> {
        self.states.iter().find(|s| s.name == name)
    }
}

// ── Animator ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Animator {
    /// Project path of the controller asset. Empty means "use the
    /// [`AnimatorController`] component on the same materia".
    pub controller_path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    pub controller: ResourceState<AnimatorController>,
    #[serde(skip)]
    clips: HashMap<String, AnimationClip>,
    #[serde(skip)]
    current_state: Option<String>,
    #[serde(skip)]
    current_frame: usize,
    #[serde(skip)]
    frame_timer: f32,
}

impl Animator {
    pub fn new(controller_path: impl Into<String>) -> Self {
        Self {
            controller_path: controller_path.into(),
            ..Default::default()
        }
    }

    /// Install a hydrated controller and its clips, then enter the entry
    /// state.
    pub fn install(&mut self, controller: AnimatorController, clips: HashMap<String, AnimationClip>) {
        let entry = controller.entry_state.clone();
        self.controller = ResourceState::Loaded(controller);
        self.clips = clips;
        self.current_state = None;
        if !entry.is_empty() {
            self.play(&entry);
        }
    }

    /// Switch to `state`, restarting at frame 0. Returns false if no clip is
    /// loaded for that state. Playing the current state again is a no-op.
    pub fn play(&mut self, state: &str) -> bool {
        if !self.clips.contains_key(state) {
            return false;
        }
        if self.current_state.as_deref() != Some(state) {
            log::debug!("Animator state changed to: {state}");
            self.current_state = Some(state.to_string());
            self.current_frame = 0;
            self.frame_timer = 0.0;
        }
        true
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    fn current_clip(&self) -> Option<&AnimationClip> {
        self.clips.get(self.current_state.as_deref()?)
    }

    /// Image path of the frame being shown, if a clip is playing.
    pub fn current_frame_source(&self) -> Option<&str> {
        let clip = self.current_clip()?;
        clip.frames.get(self.current_frame).map(String::as_str)
    }

    pub fn update(&mut self, dt: f32) {
        let Some(clip) = self.current_clip() else {
            return;
        };
        let frame_count = clip.frames.len();
        if frame_count == 0 {
            return;
        }
        let speed = if clip.speed > 0.0 { clip.speed } else { 10.0 };
        let looping = clip.looping;

        self.frame_timer += dt;
        if self.frame_timer >= 1.0 / speed {
            self.frame_timer = 0.0;
            self.current_frame += 1;
            if self.current_frame >= frame_count {
                self.current_frame = if looping { 0 } else { frame_count - 1 };
            }
        }
    }

    pub(crate) fn reset_runtime(&mut self) {
        self.controller = ResourceState::Unloaded;
        self.clips.clear();
        self.current_state = None;
        self.current_frame = 0;
        self.frame_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn walking() -> Animator {
        let controller = AnimatorController {
            entry_state: "walk".into(),
            states: vec![AnimatorState {
                name: "walk".into(),
                animation_asset: "Assets/walk.cea".into(),
            }],
        };
        let clip = AnimationClip {
            name: "walk".into(),
            frames: vec!["w0.png".into(), "w1.png".into(), "w2.png".into()],
            speed: 10.0,
            looping: true,
        };
        let mut animator = Animator::new("Assets/hero.ceanim");
        animator.install(controller, HashMap::from([("walk".to_string(), clip)]));
        animator
    }

    #[test]
    fn install_enters_entry_state() {
        let animator = walking();
        assert_eq!(animator.current_state(), Some("walk"));
        assert_eq!(animator.current_frame_source(), Some("w0.png"));
    }

    #[test]
    fn update_advances_and_loops() {
        let mut animator = walking();
        animator.update(0.05);
        assert_eq!(animator.current_frame(), 0);
        animator.update(0.06);
        assert_eq!(animator.current_frame(), 1);
        animator.update(0.1);
        animator.update(0.1);
        assert_eq!(animator.current_frame(), 0);
    }

    #[test]
    fn non_looping_clip_holds_last_frame() {
        let mut animator = walking();
        if let Some(clip) = animator.clips.get_mut("walk") {
            clip.looping = false;
        }
        for _ in 0..10 {
            animator.update(0.2);
        }
        assert_eq!(animator.current_frame_source(), Some("w2.png"));
    }

    #[test]
    fn play_unknown_state_is_rejected() {
        let mut animator = walking();
        assert!(!animator.play("jump"));
        assert_eq!(animator.current_state(), Some("walk"));
    }

    #[test]
    fn only_controller_path_is_saved() {
        let animator = walking();
        let json = serde_json::to_value(&animator).unwrap();
        assert_eq!(json, json!({ "controllerPath": "Assets/hero.ceanim" }));

        let mut copy = animator.clone();
        copy.reset_runtime();
        assert!(copy.current_state().is_none());
        assert_eq!(copy.controller, ResourceState::Unloaded);
    }

    #[test]
    fn animation_asset_format() {
        let asset: AnimationAsset = serde_json::from_value(json!({
            "animations": [{ "name": "idle", "frames": ["a.png"], "speed": 4, "loop": false }]
        }))
        .unwrap();
        assert_eq!(asset.animations[0].speed, 4.0);
        assert!(!asset.animations[0].looping);
    }
}
