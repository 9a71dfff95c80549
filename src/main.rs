// src/main.rs
use nannou::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use animake::{
    canvas::{self, color, FrameCanvas},
    config::Config,
    scene::SceneScript,
    services::{ScriptWatcher, VideoExporter},
};

/// Host life cycle: wall-clock playback, deterministic export, or both
/// stopped while the encoder drains on the way out.
enum RunMode {
    Live,
    Exporting { frame: u32, total: u32 },
}

struct Model {
    config: Config,
    background: Rgba,

    // Scene script + live reload
    scene: SceneScript,
    scene_path: PathBuf,
    watcher: ScriptWatcher,
    pending_reload: bool,

    // Life cycle
    mode: RunMode,
    exporter: Option<VideoExporter>,
    exit_requested: bool,

    // Clock
    frame_no: u64,
    start_time: Instant,
    last_time: Instant,

    // Rendering components
    texture: wgpu::Texture,
    draw: nannou::Draw,
    draw_renderer: nannou::draw::Renderer,
    texture_reshaper: wgpu::TextureReshaper,

    // Debug overlay
    debug_flag: bool,
    fps: f32,
}

fn main() {
    nannou::app(model).update(update).exit(on_exit).run();
}

// The window X button ends the event loop without passing through the
// Q drain path, so any in-flight export is finalized here. join() blocks
// until the worker has flushed the queue and ffmpeg has closed the
// container, so no truncated file is left behind.
fn on_exit(_app: &App, model: Model) {
    if let Some(exporter) = model.exporter {
        println!(
            "Window closed mid-export, finalizing {} frames",
            exporter.frames_sent()
        );
        report_export_result(exporter);
    }
}

fn model(app: &App) -> Model {
    // Load config
    let config = Config::load().expect("Failed to load config file");
    let background =
        color::parse_hex(&config.style.background).expect("Invalid style.background color");

    // Load the scene script; a CLI argument overrides the configured path
    let scene_path = scene_path_from_args(&config);
    let scene = SceneScript::load(&scene_path).expect("Failed to load scene script");
    let watcher = ScriptWatcher::watch(&scene_path).expect("Failed to watch scene script");

    // Create window
    let window_id = app
        .new_window()
        .title(format!("animake — {}", scene_path.display()))
        .size(config.window.width, config.window.height)
        .msaa_samples(1)
        .view(view)
        .key_pressed(key_pressed)
        .build()
        .unwrap();
    let window = app.window(window_id).unwrap();

    // Set up render texture. Rgba8UnormSrgb keeps the capture path a
    // plain copy: no MSAA resolve, bytes go straight to the encoder.
    let device = window.device();
    let draw = nannou::Draw::new();
    let texture = wgpu::TextureBuilder::new()
        .size([
            config.rendering.texture_width,
            config.rendering.texture_height,
        ])
        .usage(
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )
        .sample_count(1)
        .format(wgpu::TextureFormat::Rgba8UnormSrgb)
        .build(device);

    // Set up rendering pipeline
    let draw_renderer = nannou::draw::RendererBuilder::new()
        .build_from_texture_descriptor(device, texture.descriptor());

    // Create the texture reshaper that scales the canvas into the window.
    let texture_view = texture.view().build();
    let texture_reshaper = wgpu::TextureReshaper::new(
        device,
        &texture_view,
        texture.sample_count(),
        texture.sample_type(),
        window.msaa_samples(),
        Frame::TEXTURE_FORMAT,
    );

    let now = Instant::now();
    Model {
        config,
        background,

        scene,
        scene_path,
        watcher,
        pending_reload: false,

        mode: RunMode::Live,
        exporter: None,
        exit_requested: false,

        frame_no: 0,
        start_time: now,
        last_time: now,

        texture,
        draw,
        draw_renderer,
        texture_reshaper,

        debug_flag: false,
        fps: 0.0,
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    match key {
        Key::E => start_export(app, model),
        Key::Escape => cancel_export(model),
        Key::R => {
            model.pending_reload = true;
        }
        Key::P => {
            model.debug_flag = !model.debug_flag;
        }
        // Graceful quit that waits for the encoder to finish
        Key::Q => {
            if matches!(model.mode, RunMode::Exporting { .. }) {
                if let Some(exporter) = model.exporter.as_mut() {
                    println!(
                        "Quit requested mid-export, finalizing {} frames",
                        exporter.frames_sent()
                    );
                    exporter.finish();
                }
                model.mode = RunMode::Live;
            }
            model.exit_requested = true;
        }
        _ => (),
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let now = Instant::now();
    let wall_dt = (now - model.last_time).as_secs_f32();
    model.last_time = now;
    if model.debug_flag {
        model.fps = 1.0 / wall_dt.max(1e-6);
    }

    // Pick up a finished encoder from an earlier export
    if !matches!(model.mode, RunMode::Exporting { .. }) {
        let done = model.exporter.as_ref().map(|e| e.is_done()).unwrap_or(false);
        if done {
            if let Some(exporter) = model.exporter.take() {
                report_export_result(exporter);
            }
        }
    }

    // Live reload: collapse watcher events, apply outside of exports
    if model.watcher.take_change() {
        model.pending_reload = true;
    }
    if model.pending_reload && matches!(model.mode, RunMode::Live) {
        model.pending_reload = false;
        reload_scene(model, now);
    }

    model.draw.reset();

    // Encoder drain progress on the way out
    if model.exit_requested {
        handle_exit_state(app, model);
        return; // Important: return here to not continue with normal rendering
    }

    model.draw.background().color(model.background);

    /**********************  Run the scene script  **********************/
    let export_progress = match model.mode {
        RunMode::Live => {
            let time = (now - model.start_time).as_secs_f32();
            run_scene_frame(model, model.frame_no, time, wall_dt);
            model.frame_no += 1;
            if model.debug_flag {
                draw_debug_overlay(model);
            }
            None
        }
        RunMode::Exporting { frame, total } => {
            // Deterministic timebase: wall clock does not leak into the video
            let fps = model.config.playback.fps as f32;
            run_scene_frame(model, frame as u64, frame as f32 / fps, 1.0 / fps);
            Some((frame, total))
        }
    };
    /********************************************************************/

    render_and_capture(app, model);

    // The progress overlay goes on screen only, never into the capture,
    // so it is rendered in a second pass after the frame was read back.
    if let Some((frame, total)) = export_progress {
        draw_export_overlay(model, frame, total);
        render_progress(app, model);
    }
}

// Draw the state of Model into the given Frame
fn view(_app: &App, model: &Model, frame: Frame) {
    // resize texture to screen
    let mut encoder = frame.command_encoder();
    model
        .texture_reshaper
        .encode_render_pass(frame.texture_view(), &mut encoder);
}

// ******************************* Scene frames *******************************

fn run_scene_frame(model: &mut Model, frame: u64, time: f32, dt: f32) {
    let mut canvas = FrameCanvas::new(
        model.config.rendering.texture_width as f32,
        model.config.rendering.texture_height as f32,
        frame,
        time,
        dt,
    )
    .with_weight(model.config.style.default_stroke_weight);

    if let Err(e) = model.scene.run_frame(&mut canvas) {
        eprintln!("{e}");
        eprintln!("Scene paused until the script is fixed and reloaded");
    }

    canvas::render(&model.draw, &canvas, model.config.playback.centered);
}

fn reload_scene(model: &mut Model, now: Instant) {
    match SceneScript::load(&model.scene_path) {
        Ok(scene) => {
            model.scene = scene;
            // Restart semantics: reloaded scripts begin at frame 0
            model.frame_no = 0;
            model.start_time = now;
            model.last_time = now;
            println!("Scene reloaded: {}", model.scene_path.display());
        }
        Err(e) => {
            eprintln!("Reload failed, keeping the previous scene: {e}");
        }
    }
}

// ******************************* Export control *******************************

fn start_export(app: &App, model: &mut Model) {
    if !matches!(model.mode, RunMode::Live) {
        return;
    }
    if model.exporter.is_some() {
        println!("Previous export is still encoding, try again shortly");
        return;
    }

    let window = app.main_window();
    let device = window.device();
    let output_dir = model.config.resolve_output_dir();
    match VideoExporter::start(
        device,
        &model.texture,
        &output_dir,
        model.config.playback.fps,
    ) {
        Ok(exporter) => {
            let total = model.config.export_frame_count();
            println!(
                "Recording {} frames at {} fps",
                total, model.config.playback.fps
            );
            model.exporter = Some(exporter);
            model.mode = RunMode::Exporting { frame: 0, total };
        }
        Err(e) => eprintln!("Export not available: {e}"),
    }
}

fn cancel_export(model: &mut Model) {
    if !matches!(model.mode, RunMode::Exporting { .. }) {
        return;
    }
    if let Some(exporter) = model.exporter.take() {
        exporter.cancel();
    }
    model.mode = RunMode::Live;
    model.last_time = Instant::now();
    println!("Export cancelled");
}

// ******************************* Rendering and Capture *******************************

fn render_and_capture(app: &App, model: &mut Model) {
    let window = app.main_window();
    let device = window.device();
    let ce_desc = wgpu::CommandEncoderDescriptor {
        label: Some("Texture renderer"),
    };
    let mut encoder = device.create_command_encoder(&ce_desc);
    let texture_view = model.texture.view().build();

    model.draw_renderer.encode_render_pass(
        device,
        &mut encoder,
        &model.draw,
        1.0,
        model.texture.size(),
        &texture_view,
        None,
    );

    let exporting = matches!(model.mode, RunMode::Exporting { .. });
    if exporting {
        if let Some(exporter) = model.exporter.as_ref() {
            exporter.capture(&mut encoder, &model.texture);
        }
    }

    window.queue().submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);

    if let RunMode::Exporting { frame, total } = model.mode {
        advance_export(model, device, frame, total);
    }
}

fn advance_export(model: &mut Model, device: &wgpu::Device, frame: u32, total: u32) {
    let Some(exporter) = model.exporter.as_mut() else {
        model.mode = RunMode::Live;
        return;
    };

    if let Err(e) = exporter.read_and_send(device) {
        eprintln!("Export failed: {e}");
        if let Some(exporter) = model.exporter.take() {
            exporter.cancel();
        }
        model.mode = RunMode::Live;
        model.last_time = Instant::now();
        return;
    }

    let next = frame + 1;
    if next >= total {
        exporter.finish();
        println!("All {total} frames captured, waiting for the encoder");
        model.mode = RunMode::Live;
        model.last_time = Instant::now();
    } else {
        model.mode = RunMode::Exporting { frame: next, total };
    }
}

// ******************************* Exit State Handling *******************************

fn handle_exit_state(app: &App, model: &mut Model) {
    let pending = model
        .exporter
        .as_ref()
        .map(|e| !e.is_done())
        .unwrap_or(false);

    if pending {
        draw_drain_screen(model);
        render_progress(app, model);
        std::thread::sleep(std::time::Duration::from_millis(200));
    } else {
        if let Some(exporter) = model.exporter.take() {
            report_export_result(exporter);
        }
        app.quit(); // quit only once the encoder is finished
    }
}

fn report_export_result(exporter: VideoExporter) {
    match exporter.join() {
        Ok(path) => println!("Export finished! Saved to {}", path.display()),
        Err(e) => eprintln!("{e}"),
    }
}

fn draw_drain_screen(model: &mut Model) {
    let draw = &model.draw;
    draw.background().color(BLACK);

    let (encoded, sent) = match model.exporter.as_ref() {
        Some(e) => (e.frames_encoded(), e.frames_sent() as usize),
        None => (0, 0),
    };

    let text = format!("{} / {}\nframes encoded", encoded, sent);
    draw.text(&text).color(WHITE).font_size(32).x_y(0.0, 50.0);

    let progress = if sent > 0 {
        encoded as f32 / sent as f32
    } else {
        1.0
    };
    draw_progress_bar(draw, progress, 0.0, -50.0);
}

fn draw_export_overlay(model: &mut Model, frame: u32, total: u32) {
    let draw = &model.draw;
    let bar_y = -(model.config.rendering.texture_height as f32) / 2.0 + 40.0;

    let text = format!("Exporting frame {} / {}", frame + 1, total);
    draw.text(&text)
        .color(BLACK)
        .font_size(18)
        .x_y(0.0, bar_y + 30.0);

    let progress = (frame + 1) as f32 / total.max(1) as f32;
    draw_progress_bar(draw, progress, 0.0, bar_y);
}

fn draw_progress_bar(draw: &Draw, progress: f32, x: f32, y: f32) {
    let bar_width = 400.0;
    let bar_height = 30.0;

    // Background bar
    draw.rect().color(GRAY).w_h(bar_width, bar_height).x_y(x, y);

    // Progress bar
    draw.rect()
        .color(GREEN)
        .w_h(bar_width * progress, bar_height)
        .x_y(x - bar_width / 2.0 + (bar_width * progress) / 2.0, y);
}

fn render_progress(app: &App, model: &mut Model) {
    let window = app.main_window();
    let device = window.device();
    let ce_desc = wgpu::CommandEncoderDescriptor {
        label: Some("Progress renderer"),
    };
    let mut encoder = device.create_command_encoder(&ce_desc);
    let texture_view = model.texture.view().build();

    model.draw_renderer.encode_render_pass(
        device,
        &mut encoder,
        &model.draw,
        1.0,
        model.texture.size(),
        &texture_view,
        None,
    );
    window.queue().submit(Some(encoder.finish()));
}

// ******************************* Debug overlay *******************************

fn draw_debug_overlay(model: &mut Model) {
    let draw = &model.draw;

    // Draw (+,+) axes
    draw.line()
        .points(pt2(0.0, 0.0), pt2(50.0, 0.0))
        .color(RED)
        .stroke_weight(1.0);
    draw.line()
        .points(pt2(0.0, 0.0), pt2(0.0, 50.0))
        .color(BLUE)
        .stroke_weight(1.0);

    let x = model.config.rendering.texture_width as f32 / 2.0 - 80.0;
    let y = model.config.rendering.texture_height as f32 / 2.0 - 20.0;
    draw.text(&format!("FPS: {:.1}", model.fps))
        .x_y(x, y)
        .color(RED);
}

// ******************************* Startup helpers *******************************

/// First CLI argument overrides the configured scene. Bare names are
/// looked up under scenes/, with or without the .rhai extension.
fn scene_path_from_args(config: &Config) -> PathBuf {
    let Some(arg) = std::env::args().nth(1) else {
        return config.resolve_scene_path();
    };

    let direct = PathBuf::from(&arg);
    if direct.exists() {
        return direct;
    }
    let in_scenes = Path::new("scenes").join(&arg);
    if in_scenes.exists() {
        return in_scenes;
    }
    let with_ext = Path::new("scenes").join(format!("{arg}.rhai"));
    if with_ext.exists() {
        return with_ext;
    }
    // Let SceneScript::load report the missing file
    direct
}
