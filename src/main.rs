use std::time::Instant;

use alphamatrix::config::SceneConfig;
use alphamatrix::display::window::{Display, InputEvent, RenderTarget};
use alphamatrix::effects::Time;
use alphamatrix::util::FpsCounter;
use log::{info, warn};
use sdl2::keyboard::Keycode;

const DEFAULT_SCALE: u32 = 24;

struct Options {
    scene: Option<String>,
    scale: u32,
    vsync: bool,
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        scene: None,
        scale: DEFAULT_SCALE,
        vsync: true,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => options.vsync = false,
            "--scene" | "-s" => {
                if i + 1 < args.len() {
                    options.scene = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--scale" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<u32>() {
                        Ok(s) if s > 0 => options.scale = s,
                        _ => warn!("ignoring bad scale '{}'", args[i + 1]),
                    }
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: alphamatrix-viewer [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --scene FILE, -s FILE  Load a JSON scene (default: built-in demo)");
                println!("  --scale N              Screen pixels per LED (default: {})", DEFAULT_SCALE);
                println!("  --no-vsync             Disable VSync for uncapped framerate");
                println!("  --help                 Show this help message");
                std::process::exit(0);
            },
            other => warn!("unknown argument '{}'", other),
        }
        i += 1;
    }

    options
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();

    let scene = match &options.scene {
        Some(path) => SceneConfig::load(path).map_err(|e| format!("{path}: {e}"))?,
        None => SceneConfig::default(),
    };
    let mut system = scene.build().map_err(|e| e.to_string())?;
    let (width, height) = (scene.width, scene.height);

    let (mut display, texture_creator) =
        Display::with_options("alphamatrix", width, height, options.scale, options.vsync)?;
    let mut target = RenderTarget::new(&texture_creator, width, height)?;

    let mut fps_counter = FpsCounter::new(60);
    let mut frames: u64 = 0;

    info!("scene '{}' {}x{}, {} effects", scene.name, width, height, system.manager().len());
    info!("Space pauses, Escape quits");

    // Effect time only advances while running
    let start = Instant::now();
    let mut paused_at: Option<Instant> = None;
    let mut paused_total = std::time::Duration::ZERO;

    'main: loop {
        let (_dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::Space) => {
                    paused_at = match paused_at {
                        Some(at) => {
                            paused_total += at.elapsed();
                            None
                        },
                        None => Some(Instant::now()),
                    };
                },
                InputEvent::KeyDown(_) => {},
            }
        }

        if paused_at.is_none() {
            let now = start.elapsed() - paused_total;
            system.recalc_and_render(now.as_millis() as Time);
        }

        display.present(&mut target, &system.frame())?;

        frames += 1;
        if frames % 120 == 0 {
            let (min_fps, max_fps) = fps_counter.min_max_fps();
            display.set_title(&format!(
                "alphamatrix - {} - {:.0} fps ({:.0}..{:.0})",
                scene.name, avg_fps, min_fps, max_fps
            ))?;
        }
    }

    Ok(())
}
