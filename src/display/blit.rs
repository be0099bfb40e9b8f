//! Copy, fill, average and scale operations over any [`Matrix`]

use super::Matrix;
use crate::color::{lerp, ColorRgba, ColorRgba16};
use crate::geometry::Rect;

/// Samples per first-level chunk in [`get_area_color`]
const AREA_CHUNK: u32 = 256;
/// Largest area [`get_area_color`] will average
const AREA_MAX_PIXELS: u32 = AREA_CHUNK * AREA_CHUNK;

/// Composite all of `src` at `(x, y)`, clipped to `dst`
pub fn draw_matrix<D, S>(dst: &mut D, x: i32, y: i32, src: &S, alpha: u8)
where
    D: Matrix + ?Sized,
    S: Matrix + ?Sized,
{
    let start_x = (-x).max(0);
    let start_y = (-y).max(0);
    let end_x = (src.width() as i32).min(dst.width() as i32 - x);
    let end_y = (src.height() as i32).min(dst.height() as i32 - y);

    for sy in start_y..end_y {
        for sx in start_x..end_x {
            dst.set_pixel_alpha(sx + x, sy + y, src.get_pixel(sx, sy), alpha);
        }
    }
}

/// Composite `src_rect` of `src` at `(x, y)`. `src_rect` is clipped to the source.
pub fn draw_matrix_area<D, S>(dst: &mut D, src_rect: Rect, x: i32, y: i32, src: &S, alpha: u8)
where
    D: Matrix + ?Sized,
    S: Matrix + ?Sized,
{
    let clipped = src_rect.intersect(&src.rect());
    for oy in 0..clipped.height as i32 {
        for ox in 0..clipped.width as i32 {
            let pixel = src.get_pixel(clipped.x + ox, clipped.y + oy);
            dst.set_pixel_alpha(x + ox, y + oy, pixel, alpha);
        }
    }
}

/// Same as [`draw_matrix_area`] but stores source pixels without compositing
pub fn draw_matrix_area_rewrite<D, S>(dst: &mut D, src_rect: Rect, x: i32, y: i32, src: &S)
where
    D: Matrix + ?Sized,
    S: Matrix + ?Sized,
{
    let clipped = src_rect.intersect(&src.rect());
    for oy in 0..clipped.height as i32 {
        for ox in 0..clipped.width as i32 {
            let pixel = src.get_pixel(clipped.x + ox, clipped.y + oy);
            dst.set_pixel_rewrite(x + ox, y + oy, pixel);
        }
    }
}

/// Composite `color` over `area` clipped to `dst`
pub fn fill_area<D: Matrix + ?Sized>(dst: &mut D, area: Rect, color: ColorRgba) {
    let target = area.intersect(&dst.rect());
    for y in target.y..target.bottom() {
        for x in target.x..target.right() {
            dst.set_pixel(x, y, color);
        }
    }
}

/// Average colour of `area` clipped to `m`
///
/// Sums run in two levels of at most 256 samples each so a 16-bit channel
/// accumulator never overflows. Areas above 65536 pixels and empty areas
/// return transparent.
pub fn get_area_color<M: Matrix + ?Sized>(m: &M, area: Rect) -> ColorRgba {
    let bounded = area.intersect(&m.rect());
    if bounded.is_empty() || bounded.area() > AREA_MAX_PIXELS {
        return ColorRgba::TRANSPARENT;
    }

    let mut sum1 = ColorRgba16::default();
    let mut count1: u16 = 0;
    let mut sum2 = ColorRgba16::default();
    let mut count2: u16 = 0;

    for y in bounded.y..bounded.bottom() {
        for x in bounded.x..bounded.right() {
            sum1 += m.get_pixel(x, y).sum(ColorRgba::TRANSPARENT);
            count1 += 1;
            if count1 as u32 == AREA_CHUNK {
                sum2 += sum1.div(count1);
                count2 += 1;
                sum1 = ColorRgba16::default();
                count1 = 0;
            }
        }
    }

    if count1 > 0 {
        sum2 += sum1.div(count1);
        count2 += 1;
    }
    sum2.to_color8(count2)
}

/// Bilinear blit from `src_rect` of `src` into `dst_rect` of `dst`
///
/// Returns `false` when either rect is empty or `src_rect` is not fully inside
/// the source. A destination clipped away entirely is still a success.
pub fn draw_matrix_scale<D, S>(dst: &mut D, src_rect: Rect, dst_rect: Rect, src: &S) -> bool
where
    D: Matrix + ?Sized,
    S: Matrix + ?Sized,
{
    if src_rect.is_empty() || dst_rect.is_empty() || !src.rect().contains_rect(&src_rect) {
        return false;
    }
    let bounded = dst_rect.intersect(&dst.rect());
    if bounded.is_empty() {
        return true;
    }

    // 16.16 steps in i64 so rects up to u16::MAX do not overflow
    let scale_x = (i64::from(src_rect.width) << 16) / i64::from(dst_rect.width);
    let scale_y = (i64::from(src_rect.height) << 16) / i64::from(dst_rect.height);

    for dy in bounded.y..bounded.bottom() {
        let src_y = (i64::from(src_rect.y) << 16) + i64::from(dy - dst_rect.y) * scale_y;
        let sy = (src_y >> 16) as i32;
        let fy = ((src_y & 0xFFFF) >> 8) as u8;
        for dx in bounded.x..bounded.right() {
            let src_x = (i64::from(src_rect.x) << 16) + i64::from(dx - dst_rect.x) * scale_x;
            let sx = (src_x >> 16) as i32;
            let fx = ((src_x & 0xFFFF) >> 8) as u8;

            let top = lerp(src.get_pixel(sx, sy), src.get_pixel(sx + 1, sy), fx);
            let bottom = lerp(src.get_pixel(sx, sy + 1), src.get_pixel(sx + 1, sy + 1), fx);
            dst.set_pixel(dx, dy, lerp(top, bottom, fy));
        }
    }
    true
}

/// Pixel at `(x, y)` composited over `bg`
pub fn get_pixel_blend<M: Matrix + ?Sized>(m: &M, x: i32, y: i32, bg: ColorRgba) -> ColorRgba {
    ColorRgba::source_over(bg, m.get_pixel(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MatrixPixels;

    fn filled(w: u16, h: u16, color: ColorRgba) -> MatrixPixels {
        let mut m = MatrixPixels::new(w, h);
        let r = m.rect();
        fill_area(&mut m, r, color);
        m
    }

    #[test]
    fn test_draw_matrix_clips_negative_offset() {
        let src = filled(3, 3, ColorRgba::RED);
        let mut dst = MatrixPixels::new(4, 4);
        draw_matrix(&mut dst, -1, 2, &src, 255);
        assert_eq!(dst.get_pixel(0, 2), ColorRgba::RED);
        assert_eq!(dst.get_pixel(1, 3), ColorRgba::RED);
        assert_eq!(dst.get_pixel(2, 2), ColorRgba::TRANSPARENT);
        assert_eq!(dst.get_pixel(0, 1), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_draw_matrix_area_and_rewrite() {
        let mut src = MatrixPixels::new(4, 4);
        src.set_pixel_rewrite(2, 2, ColorRgba::new(100, 1, 2, 3));
        let mut dst = MatrixPixels::new(4, 4);
        draw_matrix_area_rewrite(&mut dst, Rect::new(2, 2, 5, 5), 0, 0, &src);
        assert_eq!(dst.get_pixel(0, 0), ColorRgba::new(100, 1, 2, 3));

        let mut dst = filled(4, 4, ColorRgba::BLACK);
        draw_matrix_area(&mut dst, Rect::new(2, 2, 1, 1), 1, 1, &src, 255);
        assert_eq!(
            dst.get_pixel(1, 1),
            ColorRgba::source_over(ColorRgba::BLACK, ColorRgba::new(100, 1, 2, 3))
        );
    }

    #[test]
    fn test_get_area_color_average() {
        let mut m = MatrixPixels::new(2, 1);
        m.set_pixel_rewrite(0, 0, ColorRgba::new(255, 100, 0, 0));
        m.set_pixel_rewrite(1, 0, ColorRgba::new(255, 200, 0, 50));
        assert_eq!(get_area_color(&m, m.rect()), ColorRgba::new(255, 150, 0, 25));
    }

    #[test]
    fn test_get_area_color_empty_and_oversized() {
        let m = filled(4, 4, ColorRgba::WHITE);
        assert_eq!(get_area_color(&m, Rect::new(10, 10, 2, 2)), ColorRgba::TRANSPARENT);

        let big = filled(257, 256, ColorRgba::WHITE);
        assert_eq!(get_area_color(&big, big.rect()), ColorRgba::TRANSPARENT);
        let max = filled(256, 256, ColorRgba::WHITE);
        assert_eq!(get_area_color(&max, max.rect()), ColorRgba::WHITE);
    }

    #[test]
    fn test_get_area_color_chunked_remainder() {
        let m = filled(300, 1, ColorRgba::rgb(10, 20, 30));
        assert_eq!(get_area_color(&m, m.rect()), ColorRgba::rgb(10, 20, 30));
    }

    #[test]
    fn test_scale_rejects_bad_source() {
        let src = filled(4, 4, ColorRgba::RED);
        let mut dst = MatrixPixels::new(8, 8);
        let dst_rect = dst.rect();
        assert!(!draw_matrix_scale(&mut dst, Rect::new(2, 2, 4, 4), dst_rect, &src));
        assert!(!draw_matrix_scale(&mut dst, Rect::default(), dst_rect, &src));
        assert!(draw_matrix_scale(&mut dst, src.rect(), Rect::new(20, 20, 4, 4), &src));
        assert_eq!(dst.get_pixel(0, 0), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_scale_uniform_source() {
        let src = filled(2, 2, ColorRgba::GREEN);
        let mut dst = MatrixPixels::new(4, 4);
        let dst_rect = dst.rect();
        assert!(draw_matrix_scale(&mut dst, src.rect(), dst_rect, &src));
        assert_eq!(dst.get_pixel(0, 0), ColorRgba::GREEN);
        // last column samples half outside the source
        assert_eq!(dst.get_pixel(3, 0).a, 127);
    }

    #[test]
    fn test_scale_wide_source_downsamples() {
        let src = filled(40_000, 1, ColorRgba::RED);
        let mut dst = MatrixPixels::new(4, 1);
        let dst_rect = dst.rect();
        assert!(draw_matrix_scale(&mut dst, src.rect(), dst_rect, &src));
        assert_eq!(dst.get_pixel(0, 0), ColorRgba::RED);
        assert_eq!(dst.get_pixel(2, 0), ColorRgba::RED);
    }

    #[test]
    fn test_pixel_blend() {
        let m = MatrixPixels::new(1, 1);
        assert_eq!(get_pixel_blend(&m, 0, 0, ColorRgba::BLUE), ColorRgba::BLUE);
    }
}
