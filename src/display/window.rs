//! SDL2 preview window for a [`MatrixPixels`]

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use super::{Matrix, MatrixPixels};

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    scale: u32,
}

/// Streaming texture sized to the matrix, upscaled on present
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    bytes: Vec<u8>,
    width: u16,
    height: u16,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Open a window of `width * scale` by `height * scale`
    /// vsync=false: uncapped framerate
    pub fn with_options(
        title: &str,
        width: u16,
        height: u16,
        scale: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        // Nearest-neighbour upscaling keeps LED cells sharp
        sdl2::hint::set("SDL_RENDER_SCALE_QUALITY", "0");

        let scale = scale.max(1);
        let window = video_subsystem
            .window(title, width as u32 * scale, height as u32 * scale)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self {
                canvas,
                event_pump,
                scale,
            },
            texture_creator,
        ))
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), String> {
        self.canvas
            .window_mut()
            .set_title(title)
            .map_err(|e| e.to_string())
    }

    pub fn present(&mut self, target: &mut RenderTarget, matrix: &MatrixPixels) -> Result<(), String> {
        if matrix.width() != target.width || matrix.height() != target.height {
            return Err(format!(
                "matrix {}x{} does not match render target {}x{}",
                matrix.width(),
                matrix.height(),
                target.width,
                target.height
            ));
        }

        // ARGB8888 is a native-endian packed u32, same layout as the matrix
        target.bytes.clear();
        target
            .bytes
            .extend(matrix.as_argb_slice().iter().flat_map(|p| p.to_ne_bytes()));
        target
            .texture
            .update(None, &target.bytes, target.width as usize * 4)
            .map_err(|e| e.to_string())?;

        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    pub fn new(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u16,
        height: u16,
    ) -> Result<Self, String> {
        let mut texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width as u32, height as u32)
            .map_err(|e| e.to_string())?;
        texture.set_blend_mode(sdl2::render::BlendMode::None);
        Ok(Self {
            texture,
            bytes: Vec::with_capacity(width as usize * height as usize * 4),
            width,
            height,
        })
    }
}
