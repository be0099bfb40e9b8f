//! Animated RGB gradient, in float and in Q16.16

use super::props::*;
use super::{base_property_info, DynamicParams, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::fixed::Fp32;
use crate::util::RandGen;

/// Map a phase to 0..=255 through `sin * 0.5 + 0.5`
#[inline]
fn wave(v: f32) -> u8 {
    ((v.sin() * 0.5 + 0.5) * 255.0) as u8
}

fn wave_fp(phase: Fp32) -> u8 {
    let norm = phase.sin() * Fp32::HALF + Fp32::HALF;
    (norm * Fp32::from_int(255)).round_int().clamp(0, 255) as u8
}

/// Three phase-shifted sine waves, one per channel
pub struct GradientWaves {
    base: RenderBase,
    params: DynamicParams,
}

impl GradientWaves {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("GradientWaves"),
            params: DynamicParams::default(),
        }
    }
}

impl Default for GradientWaves {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GradientWaves {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        DynamicParams::property_info(index).or_else(|| base_property_info(index))
    }

    fn property(&self, index: u8) -> PropValue {
        self.params.property(index).unwrap_or_else(|| self.base.property(index))
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match self.params.set_property(index, &value) {
            Some(ok) => ok,
            None => self.base.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, time: Time) {
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let t = time as f32 * 0.001 * self.params.speed.to_f32();
        let k = 0.4 * self.params.inv_scale();

        for y in target.y..target.bottom() {
            let yf = y as f32 * k;
            for x in target.x..target.right() {
                let xf = x as f32 * k;
                let r = wave(t * 0.8 + xf);
                let g = wave(t + yf);
                let b = wave(t * 0.6 + xf + yf * 0.5);
                m.set_pixel(x, y, ColorRgba::new(255, r, g, b));
            }
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}

/// [`GradientWaves`] with time and phase in Q16.16
pub struct GradientWavesFp {
    base: RenderBase,
    params: DynamicParams,
}

impl GradientWavesFp {
    const K_RED: Fp32 = Fp32::from_ratio(7, 10);
    const K_XY: Fp32 = Fp32::from_ratio(3, 10);
    const K_BLUE_Y: Fp32 = Fp32::from_ratio(4, 10);

    pub fn new() -> Self {
        Self {
            base: RenderBase::new("GradientWavesFp"),
            params: DynamicParams::default(),
        }
    }

    /// Milliseconds to seconds in Q16.16, scaled by speed
    fn phase_time(&self, time: Time) -> Fp32 {
        let raw = (i64::from(time) * Fp32::SCALE / 1000).min(i64::from(i32::MAX)) as i32;
        Fp32::from_raw(raw) * Fp32::from(self.params.speed)
    }
}

impl Default for GradientWavesFp {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GradientWavesFp {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        DynamicParams::property_info(index).or_else(|| base_property_info(index))
    }

    fn property(&self, index: u8) -> PropValue {
        self.params.property(index).unwrap_or_else(|| self.base.property(index))
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match self.params.set_property(index, &value) {
            Some(ok) => ok,
            None => self.base.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, time: Time) {
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let t = self.phase_time(time);
        let scale = Fp32::from(self.params.scale);
        let inv_scale = if scale > Fp32::ZERO { Fp32::ONE / scale } else { Fp32::ONE };
        let k = Self::K_XY * inv_scale;

        for y in target.y..target.bottom() {
            let ys = Fp32::from_int(y) * k;
            for x in target.x..target.right() {
                let xs = Fp32::from_int(x) * k;
                let r = wave_fp(t * Self::K_RED + xs);
                let g = wave_fp(t + ys);
                let b = wave_fp(t * Fp32::HALF + xs + ys * Self::K_BLUE_Y);
                m.set_pixel(x, y, ColorRgba::new(255, r, g, b));
            }
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MatrixPixels;
    use crate::effects::SharedMatrix;
    use crate::fixed::Fp16;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn render_into<E: Effect>(effect: &mut E, w: u16, h: u16, time: Time) -> MatrixPixels {
        let m: SharedMatrix = Rc::new(RefCell::new(MatrixPixels::new(w, h)));
        effect.set_matrix(Some(m.clone()));
        effect.render(&mut RandGen::default(), time);
        let frame = m.borrow().clone();
        frame
    }

    #[test]
    fn test_wave_range() {
        assert_eq!(wave(0.0), 127);
        assert_eq!(wave(std::f32::consts::FRAC_PI_2), 255);
        assert_eq!(wave(-std::f32::consts::FRAC_PI_2), 0);
        assert_eq!(wave_fp(Fp32::ZERO), 128);
        assert_eq!(wave_fp(Fp32::HALF_PI), 255);
    }

    #[test]
    fn test_origin_at_time_zero() {
        let frame = render_into(&mut GradientWaves::new(), 4, 4, 0);
        assert_eq!(frame.get_pixel(0, 0), ColorRgba::new(255, 127, 127, 127));
        assert!(frame.as_argb_slice().iter().all(|&p| p >> 24 == 0xFF));
    }

    #[test]
    fn test_float_and_fixed_agree_at_origin() {
        let frame = render_into(&mut GradientWavesFp::new(), 2, 2, 0);
        let c = frame.get_pixel(0, 0);
        assert_eq!((c.a, c.r, c.g, c.b), (255, 128, 128, 128));
    }

    #[test]
    fn test_animates_over_time() {
        let mut e = GradientWavesFp::new();
        let a = render_into(&mut e, 4, 2, 0);
        let b = render_into(&mut e, 4, 2, 700);
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_speed_is_static() {
        let mut e = GradientWaves::new();
        assert!(e.set_property(PROP_SPEED, PropValue::Fp16(Fp16::ZERO)));
        let a = render_into(&mut e, 3, 3, 0);
        let b = render_into(&mut e, 3, 3, 5000);
        assert_eq!(a, b);
    }
}
