use super::Matrix;
use crate::color::ColorRgba;

/// One byte per cell, read back as an opaque grey
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixBytes {
    bytes: Vec<u8>,
    width: u16,
    height: u16,
    pub out_of_bounds: u8,
}

impl MatrixBytes {
    pub fn new(width: u16, height: u16, out_of_bounds: u8) -> Self {
        Self {
            bytes: vec![0; width as usize * height as usize],
            width,
            height,
            out_of_bounds,
        }
    }

    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    #[inline]
    pub fn get_value(&self, x: i32, y: i32) -> u8 {
        if !self.in_bounds(x, y) {
            return self.out_of_bounds;
        }
        self.bytes[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set_value(&mut self, x: i32, y: i32, value: u8) {
        if self.in_bounds(x, y) {
            let idx = y as usize * self.width as usize + x as usize;
            self.bytes[idx] = value;
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

#[inline]
fn average(color: ColorRgba) -> u8 {
    ((color.r as u16 + color.g as u16 + color.b as u16) / 3) as u8
}

impl Matrix for MatrixBytes {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn get_pixel(&self, x: i32, y: i32) -> ColorRgba {
        let v = self.get_value(x, y);
        ColorRgba::rgb(v, v, v)
    }

    /// Blend the averaged grey toward the stored value by source alpha
    fn set_pixel(&mut self, x: i32, y: i32, color: ColorRgba) {
        if color.a == 0 || !self.in_bounds(x, y) {
            return;
        }
        let src = average(color) as i32;
        let dst = self.get_value(x, y) as i32;
        let blended = dst + ((src - dst) * color.a as i32 + 127) / 255;
        self.set_value(x, y, blended.clamp(0, 255) as u8);
    }

    fn set_pixel_rewrite(&mut self, x: i32, y: i32, color: ColorRgba) {
        self.set_value(x, y, average(color));
    }
}
