use super::Matrix;
use crate::color::{mul8, ColorRgba};

/// One bit per cell, packed eight to a byte
///
/// Reads outside the matrix return `out_of_bounds`, which is how occupancy
/// grids treat their borders as solid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixBoolean {
    bits: Vec<u8>,
    width: u16,
    height: u16,
    pub out_of_bounds: bool,
}

impl MatrixBoolean {
    pub fn new(width: u16, height: u16, out_of_bounds: bool) -> Self {
        let count = width as usize * height as usize;
        Self {
            bits: vec![0; count.div_ceil(8)],
            width,
            height,
            out_of_bounds,
        }
    }

    /// Move the buffer out, leaving an empty matrix
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    #[inline]
    fn bit_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bit at linear index `k`
    #[inline]
    pub fn get(&self, k: usize) -> bool {
        if k >= self.bit_count() {
            return self.out_of_bounds;
        }
        self.bits[k / 8] & (1 << (k % 8)) != 0
    }

    #[inline]
    pub fn set(&mut self, k: usize, value: bool) {
        if k >= self.bit_count() {
            return;
        }
        if value {
            self.bits[k / 8] |= 1 << (k % 8);
        } else {
            self.bits[k / 8] &= !(1 << (k % 8));
        }
    }

    #[inline]
    pub fn get_value(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return self.out_of_bounds;
        }
        self.get(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn set_value(&mut self, x: i32, y: i32, value: bool) {
        if self.in_bounds(x, y) {
            self.set(y as usize * self.width as usize + x as usize, value);
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Number of set cells
    pub fn count_set(&self) -> usize {
        (0..self.bit_count()).filter(|&k| self.get(k)).count()
    }
}

#[inline]
fn is_lit(color: ColorRgba) -> bool {
    color.r != 0 || color.g != 0 || color.b != 0
}

impl Matrix for MatrixBoolean {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn get_pixel(&self, x: i32, y: i32) -> ColorRgba {
        if self.get_value(x, y) {
            ColorRgba::WHITE
        } else {
            ColorRgba::TRANSPARENT
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: ColorRgba) {
        if color.a == 0 {
            return;
        }
        self.set_value(x, y, is_lit(color));
    }

    fn set_pixel_alpha(&mut self, x: i32, y: i32, color: ColorRgba, alpha: u8) {
        if mul8(color.a, alpha) == 0 {
            return;
        }
        self.set_value(x, y, is_lit(color));
    }

    fn set_pixel_rewrite(&mut self, x: i32, y: i32, color: ColorRgba) {
        self.set_value(x, y, is_lit(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_by_coordinate() {
        let mut m = MatrixBoolean::new(5, 3, false);
        m.set_value(4, 2, true);
        assert!(m.get_value(4, 2));
        assert!(m.get(14));
        assert_eq!(m.count_set(), 1);
        m.set_value(4, 2, false);
        assert!(!m.get_value(4, 2));
    }

    #[test]
    fn test_out_of_bounds_default() {
        let m = MatrixBoolean::new(2, 2, true);
        assert!(m.get_value(-1, 0));
        assert!(m.get_value(0, 2));
        assert!(m.get(4));
        assert!(!m.get_value(0, 0));

        let mut m = MatrixBoolean::new(2, 2, false);
        m.set_value(5, 5, true);
        m.set(100, true);
        assert_eq!(m.count_set(), 0);
    }

    #[test]
    fn test_matrix_surface() {
        let mut m = MatrixBoolean::new(2, 2, false);
        m.set_pixel(0, 0, ColorRgba::RED);
        assert_eq!(m.get_pixel(0, 0), ColorRgba::WHITE);
        m.set_pixel(1, 0, ColorRgba::TRANSPARENT);
        assert_eq!(m.get_pixel(1, 0), ColorRgba::TRANSPARENT);
        m.set_pixel_alpha(1, 1, ColorRgba::GREEN, 0);
        assert!(!m.get_value(1, 1));
        m.set_pixel_rewrite(0, 0, ColorRgba::BLACK);
        assert!(!m.get_value(0, 0));
    }

    #[test]
    fn test_clear_and_take() {
        let mut m = MatrixBoolean::new(3, 3, true);
        m.set_value(1, 1, true);
        m.clear();
        assert_eq!(m.count_set(), 0);
        let moved = m.take();
        assert_eq!(moved.width(), 3);
        assert_eq!(m.width(), 0);
        assert!(!m.out_of_bounds);
    }
}
