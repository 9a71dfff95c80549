// Headless scene-script tests: compile and run Rhai scenes against a
// FrameCanvas without a window, and inspect the recorded commands.

use std::path::PathBuf;

use animake::canvas::{DrawCommand, FrameCanvas};
use animake::scene::SceneScript;

fn write_scene(dir: &tempfile::TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("scene.rhai");
    std::fs::write(&path, source).unwrap();
    path
}

fn canvas_for_frame(frame: u64) -> FrameCanvas {
    FrameCanvas::new(400.0, 300.0, frame, frame as f32 / 60.0, 1.0 / 60.0)
}

#[test]
fn state_map_persists_across_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn setup() {
            #{ size: 1.0 }
        }
        fn frame(ani) {
            ani.circle(10.0, 10.0, this.size);
            this.size += 1.0;
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();

    let mut radii = Vec::new();
    for frame in 0..3 {
        let mut canvas = canvas_for_frame(frame);
        scene.run_frame(&mut canvas).unwrap();
        match canvas.commands() {
            [DrawCommand::Circle { radius, .. }] => radii.push(*radius),
            other => panic!("unexpected commands: {:?}", other),
        }
    }
    assert_eq!(radii, vec![1.0, 2.0, 3.0]);
}

#[test]
fn scripts_without_setup_start_from_an_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            ani.line(0, 0, ani.width, ani.height);
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    scene.run_frame(&mut canvas).unwrap();
    assert_eq!(canvas.commands().len(), 1);
}

#[test]
fn integer_arguments_coerce_to_floats() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            ani.line(0, 0, 10, 20);
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    scene.run_frame(&mut canvas).unwrap();
    match &canvas.commands()[0] {
        DrawCommand::Line { from, to, .. } => {
            assert_eq!((from.x, from.y), (0.0, 0.0));
            assert_eq!((to.x, to.y), (10.0, 20.0));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn frame_metadata_is_visible_to_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            ani.point(ani.width, ani.height);
            ani.circle(0.0, 0.0, ani.dt * 60.0);
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(5);
    scene.run_frame(&mut canvas).unwrap();
    match &canvas.commands()[0] {
        DrawCommand::Dot { at, .. } => assert_eq!((at.x, at.y), (400.0, 300.0)),
        other => panic!("unexpected command: {:?}", other),
    }
    match &canvas.commands()[1] {
        DrawCommand::Circle { radius, .. } => assert!((radius - 1.0).abs() < 1e-5),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn point_lists_accept_flat_and_paired_forms() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            ani.lines([0, 0, 100, 0, 100, 100], true);
            ani.polygon([[0, 0], [50, 0], [25, 40]]);
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    scene.run_frame(&mut canvas).unwrap();
    match &canvas.commands()[0] {
        DrawCommand::Polyline { points, closed, .. } => {
            assert_eq!(points.len(), 3);
            assert!(closed);
        }
        other => panic!("unexpected command: {:?}", other),
    }
    match &canvas.commands()[1] {
        DrawCommand::Polygon { points, .. } => assert_eq!(points.len(), 3),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn odd_flat_point_list_is_a_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            ani.lines([0, 0, 100]);
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    assert!(scene.run_frame(&mut canvas).is_err());
    assert!(scene.is_broken());
}

#[test]
fn missing_frame_function_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(&dir, "fn setup() { #{} }");
    let err = SceneScript::load(&path)
        .err()
        .expect("a script without frame() must fail to load");
    assert!(err.to_string().contains("frame(ani)"));
}

#[test]
fn syntax_errors_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(&dir, "fn frame(ani) { this is not rhai");
    assert!(SceneScript::load(&path).is_err());
}

#[test]
fn runtime_errors_break_the_script_until_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r#"
        fn frame(ani) {
            nonexistent_function();
        }
        "#,
    );
    let mut scene = SceneScript::load(&path).unwrap();

    let mut canvas = canvas_for_frame(0);
    assert!(scene.run_frame(&mut canvas).is_err());
    assert!(scene.is_broken());

    // Broken scripts are skipped, not re-run
    let mut canvas = canvas_for_frame(1);
    assert!(scene.run_frame(&mut canvas).is_ok());
    assert!(canvas.commands().is_empty());

    // Reloading the (fixed) file clears the broken state
    std::fs::write(&path, "fn frame(ani) { ani.point(1, 1); }").unwrap();
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    scene.run_frame(&mut canvas).unwrap();
    assert_eq!(canvas.commands().len(), 1);
}

#[test]
fn paint_state_flows_from_script_to_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r##"
        fn frame(ani) {
            ani.no_stroke();
            ani.fill(255, 0, 0);
            ani.circle(10, 10, 5);

            ani.color("#00ff00");
            ani.size(3.0);
            ani.line(0, 0, 1, 1);
        }
        "##,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    scene.run_frame(&mut canvas).unwrap();

    match &canvas.commands()[0] {
        DrawCommand::Circle { paint, .. } => {
            assert!(paint.stroke.is_none());
            let fill = paint.fill.expect("fill should be set");
            assert!((fill.color.red - 1.0).abs() < 1e-6);
            assert_eq!(fill.color.green, 0.0);
        }
        other => panic!("unexpected command: {:?}", other),
    }
    match &canvas.commands()[1] {
        DrawCommand::Line { paint, .. } => {
            assert_eq!(paint.weight, 3.0);
            let stroke = paint.stroke.expect("stroke should be set");
            assert!((stroke.color.green - 1.0).abs() < 1e-6);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn invalid_hex_color_is_a_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scene(
        &dir,
        r##"
        fn frame(ani) {
            ani.color("#zzz");
        }
        "##,
    );
    let mut scene = SceneScript::load(&path).unwrap();
    let mut canvas = canvas_for_frame(0);
    assert!(scene.run_frame(&mut canvas).is_err());
}

#[test]
fn bundled_scenes_run() {
    for name in ["scenes/example.rhai", "scenes/bounce.rhai", "scenes/lissajous.rhai"] {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name);
        let mut scene =
            SceneScript::load(&path).unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
        for frame in 0..3 {
            let mut canvas = canvas_for_frame(frame);
            scene
                .run_frame(&mut canvas)
                .unwrap_or_else(|e| panic!("{name} failed at frame {frame}: {e}"));
            assert!(
                !canvas.commands().is_empty(),
                "{name} drew nothing at frame {frame}"
            );
        }
    }
}
