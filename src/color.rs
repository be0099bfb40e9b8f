//! Packed ARGB colors and straight-alpha compositing

use std::ops::{Add, AddAssign, DivAssign};

// ============================================================================
// 8-bit primitives
// ============================================================================

/// Multiply two 8-bit fractions: `round(a * b / 255)`
#[inline]
pub const fn mul8(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}

/// Un-premultiply `p` by alpha `a`: `round(p * 255 / a)`, 0 when `a == 0`
#[inline]
pub const fn div255(p: u16, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let v = (p as u32 * 255 + a as u32 / 2) / a as u32;
    if v > 255 {
        255
    } else {
        v as u8
    }
}

#[inline]
const fn blend_channel(cs: u8, cd: u8, as_: u8, ad: u8, inv_as: u8, aout: u8) -> u8 {
    let src_p = mul8(cs, as_) as u16;
    let dst_p = mul8(cd, ad);
    div255(src_p + mul8(dst_p, inv_as) as u16, aout)
}

#[inline]
const fn lerp8(a: u8, b: u8, t: u8) -> u8 {
    ((a as u32 * (255 - t as u32) + b as u32 * t as u32 + 127) / 255) as u8
}

// ============================================================================
// ColorRgba
// ============================================================================

/// Straight-alpha ARGB color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorRgba {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(255, 0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const RED: Self = Self::new(255, 255, 0, 0);
    pub const GREEN: Self = Self::new(255, 0, 255, 0);
    pub const BLUE: Self = Self::new(255, 0, 0, 255);
    pub const YELLOW: Self = Self::new(255, 255, 255, 0);
    pub const ORANGE: Self = Self::new(255, 255, 165, 0);

    #[inline]
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque color from RGB
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(255, r, g, b)
    }

    /// Build from packed `0xAARRGGBB`.
    ///
    /// An alpha byte of zero is read as opaque RGB shorthand, so `0x00FF0000`
    /// is opaque red. Use [`ColorRgba::TRANSPARENT`] or [`ColorRgba::new`] for
    /// a real zero alpha.
    #[inline]
    pub const fn from_argb(packed: u32) -> Self {
        let a = (packed >> 24) as u8;
        Self {
            a: if a == 0 { 0xFF } else { a },
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Unpack `0xAARRGGBB` as stored, without the alpha shorthand
    #[inline]
    pub const fn unpack(packed: u32) -> Self {
        Self::new((packed >> 24) as u8, (packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    /// Packed `0xAARRGGBB`
    #[inline]
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Same color with alpha scaled by `alpha`
    #[inline]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self::new(mul8(self.a, alpha), self.r, self.g, self.b)
    }

    /// Same RGB with alpha replaced
    #[inline]
    pub const fn with_raw_alpha(self, a: u8) -> Self {
        Self::new(a, self.r, self.g, self.b)
    }

    /// Channel-wise sum into a 16-bit accumulator
    #[inline]
    pub const fn sum(self, other: Self) -> ColorRgba16 {
        ColorRgba16 {
            a: self.a as u16 + other.a as u16,
            r: self.r as u16 + other.r as u16,
            g: self.g as u16 + other.g as u16,
            b: self.b as u16 + other.b as u16,
        }
    }

    /// Porter-Duff source-over of `src` onto `dst`, straight alpha
    #[inline]
    pub const fn source_over(dst: Self, src: Self) -> Self {
        Self::source_over_alpha(dst, src, 255)
    }

    /// Source-over with `src.a` additionally scaled by `global_alpha`
    pub const fn source_over_alpha(dst: Self, src: Self, global_alpha: u8) -> Self {
        let as_ = mul8(src.a, global_alpha);
        let inv_as = 255 - as_;
        let aout = as_ + mul8(dst.a, inv_as);
        if aout == 0 {
            return Self::TRANSPARENT;
        }
        Self {
            a: aout,
            r: blend_channel(src.r, dst.r, as_, dst.a, inv_as, aout),
            g: blend_channel(src.g, dst.g, as_, dst.a, inv_as, aout),
            b: blend_channel(src.b, dst.b, as_, dst.a, inv_as, aout),
        }
    }
}

impl From<u32> for ColorRgba {
    fn from(packed: u32) -> Self {
        Self::from_argb(packed)
    }
}

impl From<ColorRgba> for u32 {
    fn from(c: ColorRgba) -> Self {
        c.to_argb()
    }
}

/// `dst + src` composites `src` over `dst`
impl Add for ColorRgba {
    type Output = Self;

    #[inline]
    fn add(self, src: Self) -> Self {
        Self::source_over(self, src)
    }
}

impl AddAssign for ColorRgba {
    #[inline]
    fn add_assign(&mut self, src: Self) {
        *self = Self::source_over(*self, src);
    }
}

/// Divides all four channels, alpha included
impl DivAssign<u8> for ColorRgba {
    fn div_assign(&mut self, d: u8) {
        if d == 0 {
            return;
        }
        self.a /= d;
        self.r /= d;
        self.g /= d;
        self.b /= d;
    }
}

/// Per-channel linear interpolation, `t` in `[0, 255]`
#[inline]
pub const fn lerp(a: ColorRgba, b: ColorRgba, t: u8) -> ColorRgba {
    ColorRgba::new(
        lerp8(a.a, b.a, t),
        lerp8(a.r, b.r, t),
        lerp8(a.g, b.g, t),
        lerp8(a.b, b.b, t),
    )
}

// ============================================================================
// ColorRgba16 accumulator
// ============================================================================

/// 16-bit-per-channel accumulator used for area averaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorRgba16 {
    pub a: u16,
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl ColorRgba16 {
    /// Channel-wise integer division; `n == 0` yields zero
    pub const fn div(self, n: u16) -> Self {
        if n == 0 {
            return Self { a: 0, r: 0, g: 0, b: 0 };
        }
        Self {
            a: self.a / n,
            r: self.r / n,
            g: self.g / n,
            b: self.b / n,
        }
    }

    /// Average of `n` accumulated samples, clamped to 8 bits
    pub fn to_color8(self, n: u16) -> ColorRgba {
        let avg = self.div(n);
        ColorRgba::new(
            avg.a.min(255) as u8,
            avg.r.min(255) as u8,
            avg.g.min(255) as u8,
            avg.b.min(255) as u8,
        )
    }
}

impl AddAssign for ColorRgba16 {
    fn add_assign(&mut self, rhs: Self) {
        self.a = self.a.saturating_add(rhs.a);
        self.r = self.r.saturating_add(rhs.r);
        self.g = self.g.saturating_add(rhs.g);
        self.b = self.b.saturating_add(rhs.b);
    }
}
