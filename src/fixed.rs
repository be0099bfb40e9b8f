//! Saturating fixed-point numbers
//!
//! `Fp16` is Q8.8 on an `i16`, `Fp32` is Q16.16 on an `i32`. Every operation
//! widens, computes, then clamps to the type bounds. Division by zero returns
//! raw zero. `sin`/`cos` go through `f32` and are not bit-exact across
//! platforms.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

macro_rules! fixed_point {
    (
        $(#[$meta:meta])*
        $name:ident, $raw:ty, $wide:ty, $frac:expr,
        pi: $pi:expr, half_pi: $half_pi:expr, tau: $tau:expr, deg_to_rad: $deg:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name($raw);

        impl $name {
            pub const FRAC_BITS: u32 = $frac;
            pub const SCALE: $wide = 1 << $frac;

            pub const ZERO: Self = Self(0);
            pub const ONE: Self = Self(1 << $frac);
            pub const HALF: Self = Self(1 << ($frac - 1));
            pub const MIN: Self = Self(<$raw>::MIN);
            pub const MAX: Self = Self(<$raw>::MAX);

            pub const PI: Self = Self($pi);
            pub const HALF_PI: Self = Self($half_pi);
            pub const TAU: Self = Self($tau);
            pub const DEG_TO_RAD: Self = Self($deg);

            #[inline]
            pub const fn from_raw(raw: $raw) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> $raw {
                self.0
            }

            /// Clamp a widened raw value into range
            #[inline]
            const fn saturate(v: $wide) -> Self {
                if v > <$raw>::MAX as $wide {
                    Self::MAX
                } else if v < <$raw>::MIN as $wide {
                    Self::MIN
                } else {
                    Self(v as $raw)
                }
            }

            pub const fn from_int(v: i32) -> Self {
                Self::saturate((v as $wide) << $frac)
            }

            /// Round half away from zero; NaN maps to zero
            pub fn from_f32(v: f32) -> Self {
                if v.is_nan() {
                    return Self::ZERO;
                }
                let scaled = (v * Self::SCALE as f32).round();
                if scaled >= <$raw>::MAX as f32 {
                    Self::MAX
                } else if scaled <= <$raw>::MIN as f32 {
                    Self::MIN
                } else {
                    Self(scaled as $raw)
                }
            }

            #[inline]
            pub fn to_f32(self) -> f32 {
                self.0 as f32 / Self::SCALE as f32
            }

            /// `n / d` rounded to nearest, zero when `d == 0`
            pub const fn from_ratio(n: i32, d: i32) -> Self {
                if d == 0 {
                    return Self::ZERO;
                }
                let num = (n as i64) << $frac;
                let den = d as i64;
                let half = den.abs() / 2;
                let adj = if (num < 0) != (den < 0) { -half } else { half };
                let q = (num + adj) / den;
                if q > <$raw>::MAX as i64 {
                    Self::MAX
                } else if q < <$raw>::MIN as i64 {
                    Self::MIN
                } else {
                    Self(q as $raw)
                }
            }

            /// Integer part, toward zero
            #[inline]
            pub const fn int_trunc(self) -> i32 {
                (self.0 as $wide / Self::SCALE) as i32
            }

            #[inline]
            pub const fn floor_int(self) -> i32 {
                (self.0 >> $frac) as i32
            }

            #[inline]
            pub const fn ceil_int(self) -> i32 {
                ((self.0 as $wide + Self::SCALE - 1) >> $frac) as i32
            }

            /// Nearest integer, halves away from zero
            #[inline]
            pub const fn round_int(self) -> i32 {
                let v = self.0 as $wide;
                let half = Self::SCALE / 2;
                if v >= 0 {
                    ((v + half) >> $frac) as i32
                } else {
                    -(((-v + half) >> $frac) as i32)
                }
            }

            #[inline]
            pub const fn abs(self) -> Self {
                if self.0 == <$raw>::MIN {
                    Self::MAX
                } else if self.0 < 0 {
                    Self(-self.0)
                } else {
                    self
                }
            }

            /// Fractional bits of `abs()`
            #[inline]
            pub const fn frac_abs_raw(self) -> $raw {
                self.abs().0 & ((1 << $frac) - 1)
            }

            /// Fractional bits carrying the sign of the value
            #[inline]
            pub const fn frac_raw_signed(self) -> $raw {
                (self.0 as $wide % Self::SCALE) as $raw
            }

            pub fn sin(self) -> Self {
                Self::from_f32(self.to_f32().sin())
            }

            pub fn cos(self) -> Self {
                Self::from_f32(self.to_f32().cos())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_f32())
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self::saturate(self.0 as $wide + rhs.0 as $wide)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self::saturate(self.0 as $wide - rhs.0 as $wide)
            }
        }

        impl Mul for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                Self::saturate((self.0 as $wide * rhs.0 as $wide) >> $frac)
            }
        }

        impl Div for $name {
            type Output = Self;
            #[inline]
            fn div(self, rhs: Self) -> Self {
                if rhs.0 == 0 {
                    return Self::ZERO;
                }
                Self::saturate(((self.0 as $wide) << $frac) / rhs.0 as $wide)
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self::saturate(-(self.0 as $wide))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl MulAssign for $name {
            fn mul_assign(&mut self, rhs: Self) {
                *self = *self * rhs;
            }
        }

        impl DivAssign for $name {
            fn div_assign(&mut self, rhs: Self) {
                *self = *self / rhs;
            }
        }
    };
}

fixed_point!(
    /// Q8.8 fixed point
    Fp16, i16, i32, 8,
    pi: 804, half_pi: 402, tau: 1608, deg_to_rad: 4
);

fixed_point!(
    /// Q16.16 fixed point
    Fp32, i32, i64, 16,
    pi: 205_887, half_pi: 102_944, tau: 411_775, deg_to_rad: 1144
);

impl From<Fp16> for Fp32 {
    #[inline]
    fn from(v: Fp16) -> Self {
        Fp32::from_raw((v.raw() as i32) << 8)
    }
}

/// Narrowing rounds halves away from zero and saturates
impl From<Fp32> for Fp16 {
    fn from(v: Fp32) -> Self {
        let raw = v.raw() as i64;
        let narrowed = if raw >= 0 {
            (raw + 128) >> 8
        } else {
            -((-raw + 128) >> 8)
        };
        Fp16::from_raw(narrowed.clamp(i16::MIN as i64, i16::MAX as i64) as i16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_f32_rounding() {
        assert_eq!(Fp16::from_f32(0.1).raw(), 26);
        assert_eq!(Fp32::from_f32(0.1).raw(), 6554);
        assert_eq!(Fp16::from_f32(0.7).raw(), 179);
        assert_eq!(Fp32::from_f32(0.7).raw(), 45875);
        assert_eq!(Fp16::from_f32(0.0001).raw(), 0);
        assert_eq!(Fp32::from_f32(0.0001).raw(), 7);
        assert_eq!(Fp16::from_f32(-0.1).raw(), -26);
        assert_eq!(Fp16::from_f32(1000.0), Fp16::MAX);
        assert_eq!(Fp16::from_f32(f32::NAN), Fp16::ZERO);
    }

    #[test]
    fn test_constants() {
        assert_eq!(Fp16::ONE.raw(), 256);
        assert_eq!(Fp32::HALF.raw(), 32768);
        assert!((Fp32::PI.to_f32() - std::f32::consts::PI).abs() < 1e-4);
        assert!((Fp32::TAU.to_f32() - std::f32::consts::TAU).abs() < 1e-4);
        assert!((Fp16::HALF_PI.to_f32() - std::f32::consts::FRAC_PI_2).abs() < 0.01);
    }

    #[test]
    fn test_saturating_arithmetic() {
        assert_eq!(Fp16::MAX + Fp16::ONE, Fp16::MAX);
        assert_eq!(Fp16::MIN - Fp16::ONE, Fp16::MIN);
        assert_eq!(-Fp16::MIN, Fp16::MAX);
        assert_eq!(Fp16::from_int(100) * Fp16::from_int(100), Fp16::MAX);
        assert_eq!(Fp16::from_int(1000), Fp16::MAX);
        assert_eq!(Fp32::from_int(3) * Fp32::HALF, Fp32::from_f32(1.5));
    }

    #[test]
    fn test_division() {
        assert_eq!(Fp16::ONE / Fp16::ZERO, Fp16::ZERO);
        assert_eq!(Fp32::from_int(3) / Fp32::from_int(2), Fp32::from_f32(1.5));
        assert_eq!(Fp32::from_ratio(1, 0), Fp32::ZERO);
        assert_eq!(Fp32::from_ratio(1, 3).raw(), 21845);
        assert_eq!(Fp32::from_ratio(-1, 3).raw(), -21845);
        assert_eq!(Fp16::from_ratio(1, 2), Fp16::HALF);
    }

    #[test]
    fn test_integer_parts() {
        let v = Fp16::from_f32(-1.5);
        assert_eq!(v.int_trunc(), -1);
        assert_eq!(v.floor_int(), -2);
        assert_eq!(v.ceil_int(), -1);
        assert_eq!(v.round_int(), -2);
        assert_eq!(Fp16::from_f32(1.5).round_int(), 2);
        assert_eq!(Fp16::from_f32(1.25).round_int(), 1);
        assert_eq!(Fp16::from_f32(2.0).ceil_int(), 2);
        assert_eq!(v.frac_abs_raw(), 128);
        assert_eq!(v.frac_raw_signed(), -128);
        assert_eq!(Fp16::MIN.abs(), Fp16::MAX);
    }

    #[test]
    fn test_cross_format() {
        let a = Fp16::from_f32(2.75);
        assert_eq!(Fp32::from(a), Fp32::from_f32(2.75));
        assert_eq!(Fp16::from(Fp32::from_raw(128)).raw(), 1);
        assert_eq!(Fp16::from(Fp32::from_raw(-128)).raw(), -1);
        assert_eq!(Fp16::from(Fp32::from_raw(127)).raw(), 0);
        assert_eq!(Fp16::from(Fp32::from_int(1000)), Fp16::MAX);
    }

    #[test]
    fn test_trig() {
        assert!(Fp32::ZERO.sin().abs() <= Fp32::from_raw(1));
        assert_eq!(Fp32::ZERO.cos(), Fp32::ONE);
        assert!((Fp32::HALF_PI.sin() - Fp32::ONE).abs() < Fp32::from_f32(0.001));
    }

    proptest! {
        #[test]
        fn prop_f32_roundtrip_fp16(raw: i16) {
            let v = Fp16::from_raw(raw);
            let back = Fp16::from_f32(v.to_f32());
            prop_assert!((back.raw() as i32 - raw as i32).abs() <= 1);
        }

        #[test]
        fn prop_f32_roundtrip_fp32(raw in -(1i32 << 23)..(1i32 << 23)) {
            let v = Fp32::from_raw(raw);
            let back = Fp32::from_f32(v.to_f32());
            prop_assert!((back.raw() as i64 - raw as i64).abs() <= 1);
        }

        #[test]
        fn prop_div_by_zero_is_zero(raw: i32) {
            prop_assert_eq!(Fp32::from_raw(raw) / Fp32::ZERO, Fp32::ZERO);
        }

        #[test]
        fn prop_ops_match_clamped_wide(a: i16, b: i16) {
            let (fa, fb) = (Fp16::from_raw(a), Fp16::from_raw(b));
            let sum = (a as i32 + b as i32).clamp(i16::MIN as i32, i16::MAX as i32);
            let prod = ((a as i32 * b as i32) >> 8).clamp(i16::MIN as i32, i16::MAX as i32);
            prop_assert_eq!((fa + fb).raw() as i32, sum);
            prop_assert_eq!((fa * fb).raw() as i32, prod);
        }

        #[test]
        fn prop_round_is_symmetric(raw in -32767i16..=i16::MAX) {
            let v = Fp16::from_raw(raw);
            prop_assert_eq!(v.round_int(), -(-v).round_int());
        }
    }
}
