use super::Matrix;
use crate::color::{mul8, ColorRgba};
use crate::fixed::Fp16;
use crate::geometry::Rect;

// ============================================================================
// MatrixPixels
// ============================================================================

/// Row-major ARGB pixel matrix, one packed `u32` per pixel
///
/// `Clone` is a deep copy. [`MatrixPixels::take`] steals the buffer and leaves
/// an empty 0x0 matrix behind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatrixPixels {
    pixels: Vec<u32>,
    width: u16,
    height: u16,
}

impl MatrixPixels {
    /// Create a transparent matrix
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Move the buffer out, leaving `self` as a 0x0 matrix
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Calculate buffer index for in-bounds (x, y)
    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Clear to transparent black
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Change the size. The content is cleared when the size changes.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
    }

    /// Composite `color` over every pixel of `area` inside the matrix
    pub fn fill_area(&mut self, area: Rect, color: ColorRgba) {
        super::blit::fill_area(self, area, color);
    }

    /// Packed `0xAARRGGBB` pixels in row-major order
    #[inline]
    pub fn as_argb_slice(&self) -> &[u32] {
        &self.pixels
    }

    /// Sub-pixel plot split between the nearest pixel and one neighbour
    ///
    /// The neighbour is chosen along the axis with the larger fractional part,
    /// diagonally when both are equal. Alpha moves to the neighbour in
    /// proportion to the offset from the nearest pixel centre.
    pub fn set_pixel_float2(&mut self, x: Fp16, y: Fp16, color: ColorRgba) {
        let cx = x.round_int();
        let cy = y.round_int();

        if x.frac_abs_raw() == 0 && y.frac_abs_raw() == 0 {
            self.set_pixel(cx, cy, color);
            return;
        }

        let dx = x - Fp16::from_int(cx);
        let dy = y - Fp16::from_int(cy);
        let step = |d: Fp16| if d.raw() >= 0 { 1 } else { -1 };

        // Axis choice uses the grid fractions, not the offset from the centre
        let fx_axis = x.frac_abs_raw();
        let fy_axis = y.frac_abs_raw();
        let (sx, sy) = if fy_axis > fx_axis {
            (cx, cy + step(dy))
        } else if fx_axis > fy_axis {
            (cx + step(dx), cy)
        } else {
            (cx + step(dx), cy + step(dy))
        };

        let max_offset = dx.frac_abs_raw().max(dy.frac_abs_raw()) as u32;
        let weight = ((max_offset * 255 + 128) / 256).min(255) as u8;
        let secondary = mul8(color.a, weight);
        let center = color.a - secondary;

        if center > 0 {
            self.set_pixel(cx, cy, color.with_raw_alpha(center));
        }
        if secondary > 0 {
            self.set_pixel(sx, sy, color.with_raw_alpha(secondary));
        }
    }

    /// Bilinear 4-tap splat. Integer coordinates are pixel centres.
    pub fn set_pixel_float4(&mut self, x: Fp16, y: Fp16, color: ColorRgba) {
        if x.frac_abs_raw() == 0 && y.frac_abs_raw() == 0 {
            self.set_pixel(x.int_trunc(), y.int_trunc(), color);
            return;
        }

        let x0 = x.floor_int();
        let y0 = y.floor_int();
        let fx = (x - Fp16::from_int(x0)).frac_abs_raw() as u32;
        let fy = (y - Fp16::from_int(y0)).frac_abs_raw() as u32;
        let scale = Fp16::SCALE as u32;
        let (inv_fx, inv_fy) = (scale - fx, scale - fy);

        // Weights sum to 256 * 256
        let to_alpha = |w: u32| ((color.a as u32 * w + 32768) >> 16) as u8;
        let taps = [
            (x0, y0, to_alpha(inv_fx * inv_fy)),
            (x0 + 1, y0, to_alpha(fx * inv_fy)),
            (x0, y0 + 1, to_alpha(inv_fx * fy)),
            (x0 + 1, y0 + 1, to_alpha(fx * fy)),
        ];
        for (px, py, a) in taps {
            if a > 0 {
                self.set_pixel(px, py, color.with_raw_alpha(a));
            }
        }
    }
}

impl Matrix for MatrixPixels {
    #[inline]
    fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn get_pixel(&self, x: i32, y: i32) -> ColorRgba {
        if self.in_bounds(x, y) {
            ColorRgba::unpack(self.pixels[self.index(x, y)])
        } else {
            ColorRgba::TRANSPARENT
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: i32, y: i32, color: ColorRgba) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            let dst = ColorRgba::unpack(self.pixels[idx]);
            self.pixels[idx] = ColorRgba::source_over(dst, color).to_argb();
        }
    }

    #[inline]
    fn set_pixel_rewrite(&mut self, x: i32, y: i32, color: ColorRgba) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.pixels[idx] = color.to_argb();
        }
    }
}
