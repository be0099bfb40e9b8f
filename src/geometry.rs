//! Integer rectangles and triangle rasterization

use serde::{Deserialize, Serialize};

use crate::fixed::Fp32;

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle with a signed origin and unsigned extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Rect at the origin
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True if `other` lies fully inside `self`. Empty rects are never contained.
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlapping region, `Rect::default()` when disjoint
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Rect::default();
        }
        Rect::new(x0, y0, (x1 - x0) as u16, (y1 - y0) as u16)
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    #[inline]
    pub const fn same_size(&self, other: &Rect) -> bool {
        self.width == other.width && self.height == other.height
    }
}

// ============================================================================
// Triangle rasterization
// ============================================================================

/// Fill a triangle by testing the edge functions at each pixel centre inside
/// `clip`. A pixel is inside when all three edge values share a sign, so both
/// windings are accepted.
pub fn fill_triangle<F>(clip: Rect, v1: (f32, f32), v2: (f32, f32), v3: (f32, f32), mut plot: F)
where
    F: FnMut(i32, i32),
{
    if clip.is_empty() {
        return;
    }
    let (dx12, dy12) = (v2.0 - v1.0, v2.1 - v1.1);
    let (dx23, dy23) = (v3.0 - v2.0, v3.1 - v2.1);
    let (dx31, dy31) = (v1.0 - v3.0, v1.1 - v3.1);

    for y in clip.y..clip.bottom() {
        let py = y as f32 + 0.5;
        for x in clip.x..clip.right() {
            let px = x as f32 + 0.5;
            let e1 = (px - v1.0) * dy12 - (py - v1.1) * dx12;
            let e2 = (px - v2.0) * dy23 - (py - v2.1) * dx23;
            let e3 = (px - v3.0) * dy31 - (py - v3.1) * dx31;
            if (e1 >= 0.0 && e2 >= 0.0 && e3 >= 0.0) || (e1 <= 0.0 && e2 <= 0.0 && e3 <= 0.0) {
                plot(x, y);
            }
        }
    }
}

/// [`fill_triangle`] computed in Q16.16
pub fn fill_triangle_fp<F>(clip: Rect, v1: (Fp32, Fp32), v2: (Fp32, Fp32), v3: (Fp32, Fp32), mut plot: F)
where
    F: FnMut(i32, i32),
{
    if clip.is_empty() {
        return;
    }
    let (dx12, dy12) = (v2.0 - v1.0, v2.1 - v1.1);
    let (dx23, dy23) = (v3.0 - v2.0, v3.1 - v2.1);
    let (dx31, dy31) = (v1.0 - v3.0, v1.1 - v3.1);
    let zero = Fp32::ZERO;

    for y in clip.y..clip.bottom() {
        let py = Fp32::from_int(y) + Fp32::HALF;
        for x in clip.x..clip.right() {
            let px = Fp32::from_int(x) + Fp32::HALF;
            let e1 = (px - v1.0) * dy12 - (py - v1.1) * dx12;
            let e2 = (px - v2.0) * dy23 - (py - v2.1) * dx23;
            let e3 = (px - v3.0) * dy31 - (py - v3.1) * dx31;
            if (e1 >= zero && e2 >= zero && e3 >= zero) || (e1 <= zero && e2 <= zero && e3 <= zero) {
                plot(x, y);
            }
        }
    }
}
