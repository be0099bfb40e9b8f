//! A matrix, its effect stack and the random source, bundled

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use log::debug;

use super::{EffectHandle, EffectManager, SharedMatrix, Time};
use crate::display::MatrixPixels;
use crate::util::RandGen;

pub struct MatrixSfxSystem {
    matrix: SharedMatrix,
    manager: EffectManager,
    rng: RandGen,
}

impl MatrixSfxSystem {
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_seed(width, height, RandGen::DEFAULT_SEED)
    }

    pub fn with_seed(width: u16, height: u16, seed: u16) -> Self {
        let matrix = Rc::new(RefCell::new(MatrixPixels::new(width, height)));
        Self {
            manager: EffectManager::new(Some(matrix.clone())),
            matrix,
            rng: RandGen::new(seed),
        }
    }

    /// Shared handle to the output matrix
    pub fn matrix(&self) -> &SharedMatrix {
        &self.matrix
    }

    /// Borrow the current frame
    pub fn frame(&self) -> Ref<'_, MatrixPixels> {
        self.matrix.borrow()
    }

    pub fn manager(&self) -> &EffectManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut EffectManager {
        &mut self.manager
    }

    pub fn rng_mut(&mut self) -> &mut RandGen {
        &mut self.rng
    }

    /// Add an effect to the stack, bound to this system's matrix
    pub fn add(&mut self, effect: EffectHandle) -> Option<usize> {
        self.manager.add(effect)
    }

    pub fn recalc(&mut self, time: Time) {
        self.manager.recalc(&mut self.rng, time);
    }

    pub fn render(&mut self, time: Time) {
        self.manager.render(&mut self.rng, time);
    }

    /// Full frame: recalc, render, then the post-frame pass
    pub fn recalc_and_render(&mut self, time: Time) {
        self.recalc(time);
        self.render(time);
        self.manager.frame_done(&mut self.rng, time);
    }

    /// Swap in another output matrix and rebind every effect
    pub fn set_matrix(&mut self, matrix: SharedMatrix) {
        self.matrix = matrix;
        self.manager.set_matrix(Some(self.matrix.clone()));
    }

    /// Resize the output matrix (clearing it) and rebind so autosized
    /// effects pick up the new rect
    pub fn resize(&mut self, width: u16, height: u16) {
        self.matrix.borrow_mut().resize(width, height);
        debug!("matrix resized to {width}x{height}");
        self.manager.set_matrix(Some(self.matrix.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorRgba;
    use crate::display::Matrix;
    use crate::effects::props::*;
    use crate::effects::{into_handle, write_property, Clear, Rectangle, Snowfall};
    use crate::geometry::Rect;

    fn rectangle(color: ColorRgba) -> EffectHandle {
        let handle = into_handle(Rectangle::new());
        write_property(&mut *handle.borrow_mut(), PROP_COLOR, PropValue::Color(color));
        handle
    }

    #[test]
    fn test_opaque_red_fill() {
        let mut sys = MatrixSfxSystem::new(4, 4);
        sys.add(rectangle(ColorRgba::RED));
        sys.recalc_and_render(0);
        let frame = sys.frame();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(frame.get_pixel(x, y), ColorRgba::new(255, 255, 0, 0));
            }
        }
    }

    #[test]
    fn test_white_half_alpha_over_blue() {
        let mut sys = MatrixSfxSystem::new(4, 4);
        sys.add(rectangle(ColorRgba::BLUE));
        let white = ColorRgba::WHITE.with_raw_alpha(128);
        sys.add(rectangle(white));
        sys.recalc_and_render(0);
        let expected = ColorRgba::source_over(ColorRgba::BLUE, white);
        let frame = sys.frame();
        assert!(frame.as_argb_slice().iter().all(|&p| ColorRgba::unpack(p) == expected));
    }

    #[test]
    fn test_resize_rebinds_autosized_effects() {
        let mut sys = MatrixSfxSystem::new(4, 4);
        let rect = rectangle(ColorRgba::GREEN);
        sys.add(rect.clone());
        sys.resize(6, 2);
        assert_eq!(rect.borrow().property(PROP_RECT_DEST), PropValue::Rect(Rect::from_size(6, 2)));
        sys.recalc_and_render(0);
        assert_eq!(sys.frame().get_pixel(5, 1), ColorRgba::GREEN);
    }

    #[test]
    fn test_set_matrix() {
        let mut sys = MatrixSfxSystem::new(2, 2);
        let clear = into_handle(Clear::new());
        sys.add(clear);
        sys.add(rectangle(ColorRgba::RED));
        let other = Rc::new(RefCell::new(MatrixPixels::new(3, 3)));
        sys.set_matrix(other.clone());
        sys.recalc_and_render(0);
        assert_eq!(other.borrow().get_pixel(2, 2), ColorRgba::RED);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let run = || {
            let mut sys = MatrixSfxSystem::with_seed(8, 8, 99);
            sys.add(into_handle(Clear::new()));
            sys.add(into_handle(Snowfall::new()));
            for t in 0..200u32 {
                sys.recalc_and_render(t * 10);
            }
            let frame = sys.frame().clone();
            frame
        };
        assert_eq!(run(), run());
    }
}
