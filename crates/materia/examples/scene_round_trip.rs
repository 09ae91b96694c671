//! Scene Round Trip — build, save, reload and lay out a small UI scene.
//!
//! Builds a scene with a camera, a sprite and a letterboxed menu canvas,
//! writes it to the system temp directory, loads it back (hydrating from
//! that directory) and clicks the menu's button through the layout engine.
//!
//! Run with: `RUST_LOG=info cargo run -p materia --example scene_round_trip`

use materia::prelude::*;

fn build_scene() -> Result<Scene> {
    let mut scene = Scene::with_default_camera();
    let root = scene.roots()[0];

    let hero = scene.spawn_child(root, "Hero")?;
    if let Some(hero) = scene.get_mut(hero) {
        hero.tag = "player".into();
        hero.add(SpriteRenderer {
            source: "Assets/Sprites/hero.png".into(),
            ..Default::default()
        });
    }

    let canvas = scene.spawn_child(root, "Menu")?;
    if let Some(canvas) = scene.get_mut(canvas) {
        canvas.add(Canvas::default());
    }

    let play = scene.spawn_child(canvas, "Play")?;
    if let Some(play) = scene.get_mut(play) {
        play.add(UITransform::anchored(AnchorPreset::BottomRight, Size::new(160.0, 48.0)))
            .add(UIText {
                text: "Play".into(),
                ..Default::default()
            })
            .add(Button {
                on_click: vec![ButtonEvent {
                    target_id: Some(root),
                    function_name: "start_game".into(),
                    script_name: String::new(),
                }],
                ..Default::default()
            });
    }
    Ok(scene)
}

fn main() -> Result<()> {
    env_logger::init();

    let dir = std::env::temp_dir().join("materia_round_trip");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("menu.ceScene");

    save_scene_to_file(&build_scene()?, &path)?;

    // The hero sprite does not exist on disk: it is reported, not fatal.
    let loaded = load_scene_from_file(&path, &FsResourceLoader::new(&dir))?;
    for warning in loaded.report.iter() {
        log::warn!("{warning}");
    }
    let mut scene = loaded.scene;
    println!("Loaded {} materias from {}", scene.len(), path.display());

    let Some(canvas) = scene.find_by_name("Menu") else {
        return Ok(());
    };
    let Some(play) = scene.find_by_name("Play") else {
        return Ok(());
    };

    // A 1280x720 window showing the 800x600 canvas.
    let Some(mut view) = LetterboxedCanvas::new(&scene, canvas, Rect::new(0.0, 0.0, 1280.0, 720.0))
    else {
        return Ok(());
    };
    let on_screen = view.screen_rect(&scene, play);
    println!("'Play' is drawn at {on_screen:?} (letterbox {:?})", view.letterbox());

    let pointer_at = Vec2::new(on_screen.x + 10.0, on_screen.y + 10.0);
    let hovered = view.hit_test(&scene, pointer_at);

    let mut pointer = UiPointer::new();
    pointer.update(&mut scene, hovered, true);
    for event in pointer.update(&mut scene, hovered, false) {
        println!("Clicked: call '{}' on {:?}", event.function_name, event.target_id);
    }
    Ok(())
}
