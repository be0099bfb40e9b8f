//! Pixel matrices and the drawing helpers that work over them

pub mod blit;
mod boolean;
mod bytes;
pub mod font;
mod pixel_buffer;
#[cfg(feature = "viewer")]
pub mod window;

pub use boolean::MatrixBoolean;
pub use bytes::MatrixBytes;
pub use font::{DigitFont, Font, DIGITAL_CLOCK_4X7, DIGITS_3X5};
pub use pixel_buffer::MatrixPixels;

use crate::color::ColorRgba;
use crate::geometry::Rect;

/// Common surface of every pixel matrix
///
/// Every accessor checks bounds itself. Out-of-range reads return the
/// matrix's default value and out-of-range writes are ignored.
pub trait Matrix {
    fn width(&self) -> u16;
    fn height(&self) -> u16;

    #[inline]
    fn rect(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i32 && y < self.height() as i32
    }

    fn get_pixel(&self, x: i32, y: i32) -> ColorRgba;

    /// Composite `color` over the stored pixel
    fn set_pixel(&mut self, x: i32, y: i32, color: ColorRgba);

    /// Composite with the source alpha scaled by `alpha`
    fn set_pixel_alpha(&mut self, x: i32, y: i32, color: ColorRgba, alpha: u8) {
        if alpha == 0 {
            return;
        }
        self.set_pixel(x, y, color.with_alpha(alpha));
    }

    /// Store `color` as-is
    fn set_pixel_rewrite(&mut self, x: i32, y: i32, color: ColorRgba);
}
