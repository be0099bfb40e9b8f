//! Classic sine-sum plasma

use super::props::*;
use super::{base_property_info, DynamicParams, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::util::RandGen;

/// Classic demoscene plasma: a sum of three sines mapped to red/green, with
/// a slow horizontal sine on blue
pub struct Plasma {
    base: RenderBase,
    params: DynamicParams,
}

impl Plasma {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("Plasma"),
            params: DynamicParams::default(),
        }
    }

    fn sample(x: f32, y: f32, t: f32) -> ColorRgba {
        let v = (x * 0.35 + t).sin() + (y * 0.35 - t).sin() + ((x + y) * 0.25 + t * 0.5).sin();
        let norm = (v + 3.0) / 6.0;
        let r = (norm * 255.0) as u8;
        let g = ((1.0 - norm) * 255.0) as u8;
        let b = ((0.5 + 0.5 * (t + x * 0.1).sin()) * 255.0) as u8;
        ColorRgba::new(255, r, g, b)
    }
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Plasma {
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
        let t = time as f32 * 0.0025 * self.params.speed.to_f32();
        let inv_scale = self.params.inv_scale();

        for y in target.y..target.bottom() {
            let yf = y as f32 * inv_scale;
            for x in target.x..target.right() {
                let xf = x as f32 * inv_scale;
                m.set_pixel(x, y, Self::sample(xf, yf, t));
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
