//! A single pixel bouncing around the destination rect

use log::debug;

use super::props::*;
use super::{base_property_info, DynamicParams, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::fixed::{Fp16, Fp32};
use crate::util::RandGen;

/// Distance travelled per tick, in pixels
const MOVE_STEP: Fp32 = Fp32::from_ratio(3, 10);

/// Random wall deflection in degrees, either side
const SPREAD_MIN_DEG: u8 = 15;
const SPREAD_MAX_DEG: u8 = 30;

/// Scale `(x, y)` to unit length, `(1, 0)` for the zero vector
fn normalize(x: Fp32, y: Fp32) -> (Fp32, Fp32) {
    let mag = Fp32::from_f32((x * x + y * y).to_f32().sqrt());
    if mag == Fp32::ZERO {
        return (Fp32::ONE, Fp32::ZERO);
    }
    (x / mag, y / mag)
}

/// Moves in a straight line at a fixed step per tick and reflects off the
/// rect walls with a small random change of direction
///
/// With `dual_trail` the pixel is split between the previous and the current
/// cell, weighted by progress past the shared boundary.
pub struct BouncingPixel {
    base: RenderBase,
    params: DynamicParams,
    pub color: ColorRgba,
    pub smooth_movement: bool,
    pub dual_trail: bool,
    pos: (Fp32, Fp32),
    vel: (Fp32, Fp32),
    prev_cell: (i32, i32),
    last_update: Time,
    needs_reset: bool,
}

impl BouncingPixel {
    pub const PROP_SMOOTH_MOVEMENT: u8 = PROP_BASE_LAST + 1;
    pub const PROP_DUAL_TRAIL: u8 = PROP_BASE_LAST + 2;

    pub fn new() -> Self {
        Self {
            base: RenderBase::new("BouncingPixel"),
            params: DynamicParams::default(),
            color: ColorRgba::WHITE,
            smooth_movement: true,
            dual_trail: false,
            pos: (Fp32::ZERO, Fp32::ZERO),
            vel: (Fp32::ONE, Fp32::ZERO),
            prev_cell: (0, 0),
            last_update: 0,
            needs_reset: true,
        }
    }

    /// Current position in matrix coordinates
    pub fn position(&self) -> (Fp32, Fp32) {
        self.pos
    }

    pub fn velocity(&self) -> (Fp32, Fp32) {
        self.vel
    }

    fn cell(&self) -> (i32, i32) {
        (self.pos.0.round_int(), self.pos.1.round_int())
    }

    /// Centre of the rect, random heading
    fn reset(&mut self, rng: &mut RandGen, time: Time) {
        let r = self.base.rect_dest;
        self.pos = (
            Fp32::from_int(r.x) + Fp32::from_int(i32::from(r.width)) * Fp32::HALF,
            Fp32::from_int(r.y) + Fp32::from_int(i32::from(r.height)) * Fp32::HALF,
        );
        let angle = Fp32::from_ratio(i32::from(rng.next_u8()), 256) * Fp32::TAU;
        self.vel = normalize(angle.cos(), angle.sin());
        self.prev_cell = self.cell();
        self.last_update = time;
        self.needs_reset = false;
        debug!("{}: reset at {:?}", self.base.class_name, self.cell());
    }

    /// Clamp to the rect and reflect the velocity on each axis that hit a wall
    fn bounce(&mut self, rng: &mut RandGen) {
        let r = self.base.rect_dest;
        let min = (Fp32::from_int(r.x), Fp32::from_int(r.y));
        let max = (
            Fp32::from_int(r.right() - 1),
            Fp32::from_int(r.bottom() - 1),
        );

        let hit_x = self.pos.0 < min.0 || self.pos.0 > max.0;
        let hit_y = self.pos.1 < min.1 || self.pos.1 > max.1;
        self.pos.0 = self.pos.0.clamp(min.0, max.0);
        self.pos.1 = self.pos.1.clamp(min.1, max.1);
        if !hit_x && !hit_y {
            return;
        }

        if hit_x {
            self.vel.0 = -self.vel.0;
        }
        if hit_y {
            self.vel.1 = -self.vel.1;
        }

        let spread = i32::from(rng.next_u8_in_range(SPREAD_MIN_DEG, SPREAD_MAX_DEG));
        let sign = if rng.next_u8() & 1 != 0 { 1 } else { -1 };
        let angle = Fp32::from_int(spread * sign) * Fp32::DEG_TO_RAD;
        let (cos, sin) = (angle.cos(), angle.sin());
        let (vx, vy) = self.vel;
        self.vel = normalize(vx * cos - vy * sin, vx * sin + vy * cos);
    }

    /// Split alpha between the previous and current cell
    fn render_dual(&self, m: &mut impl Matrix) {
        let (cx, cy) = self.cell();
        if self.prev_cell == (cx, cy) {
            m.set_pixel(cx, cy, self.color);
            return;
        }
        let (px, py) = self.prev_cell;
        let new_c = (Fp32::from_int(cx), Fp32::from_int(cy));
        let boundary = (
            (Fp32::from_int(px) + new_c.0) * Fp32::HALF,
            (Fp32::from_int(py) + new_c.1) * Fp32::HALF,
        );
        let to_new = (new_c.0 - boundary.0, new_c.1 - boundary.1);
        let dist_sq = to_new.0 * to_new.0 + to_new.1 * to_new.1;

        let mut t = Fp32::ZERO;
        if dist_sq > Fp32::from_raw(7) {
            let from_b = (self.pos.0 - boundary.0, self.pos.1 - boundary.1);
            let dot = from_b.0 * to_new.0 + from_b.1 * to_new.1;
            t = (dot / dist_sq).clamp(Fp32::ZERO, Fp32::ONE);
        }

        let base_alpha = Fp32::from_int(i32::from(self.color.a));
        let alpha_old = (base_alpha * (Fp32::ONE - t)).round_int().clamp(0, 255) as u8;
        let alpha_new = (base_alpha * t).round_int().clamp(0, 255) as u8;
        if alpha_old > 0 {
            m.set_pixel(px, py, self.color.with_raw_alpha(alpha_old));
        }
        if alpha_new > 0 {
            m.set_pixel(cx, cy, self.color.with_raw_alpha(alpha_new));
        }
    }
}

impl Default for BouncingPixel {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for BouncingPixel {
    fn property_count(&self) -> u8 {
        Self::PROP_DUAL_TRAIL
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        let info = match index {
            PROP_SCALE | PROP_SPEED => return DynamicParams::property_info(index),
            PROP_COLOR => PropInfo::new(PropType::Color, "Pixel color"),
            Self::PROP_SMOOTH_MOVEMENT => PropInfo::new(PropType::Bool, "Smooth movement"),
            Self::PROP_DUAL_TRAIL => PropInfo::new(PropType::Bool, "Dual trail"),
            _ => return base_property_info(index),
        };
        Some(info)
    }

    fn property(&self, index: u8) -> PropValue {
        if let Some(v) = self.params.property(index) {
            return v;
        }
        match index {
            PROP_COLOR => PropValue::Color(self.color),
            Self::PROP_SMOOTH_MOVEMENT => PropValue::Bool(self.smooth_movement),
            Self::PROP_DUAL_TRAIL => PropValue::Bool(self.dual_trail),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        if let Some(ok) = self.params.set_property(index, &value) {
            return ok;
        }
        match (index, value) {
            (PROP_COLOR, PropValue::Color(c)) => self.color = c,
            (Self::PROP_SMOOTH_MOVEMENT, PropValue::Bool(v)) => self.smooth_movement = v,
            (Self::PROP_DUAL_TRAIL, PropValue::Bool(v)) => self.dual_trail = v,
            (PROP_COLOR | Self::PROP_SMOOTH_MOVEMENT | Self::PROP_DUAL_TRAIL, _) => return false,
            (index, value) => return self.base.set_property(index, value),
        }
        true
    }

    fn on_property_changed(&mut self, index: u8) {
        self.base.on_property_changed(index);
        if matches!(index, PROP_MATRIX_DEST | PROP_RECT_DEST) {
            self.needs_reset = true;
        }
    }

    fn recalc(&mut self, rng: &mut RandGen, time: Time) {
        if self.base.disabled || self.base.matrix_dest.is_none() || self.base.rect_dest.is_empty() {
            return;
        }
        if self.needs_reset {
            self.reset(rng, time);
        }

        let step = self.params.step_interval();
        if step == 0 || time.wrapping_sub(self.last_update) < step {
            return;
        }
        self.last_update = time;

        let old_cell = self.cell();
        self.pos.0 += self.vel.0 * MOVE_STEP;
        self.pos.1 += self.vel.1 * MOVE_STEP;
        self.bounce(rng);
        if self.cell() != old_cell {
            self.prev_cell = old_cell;
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let (cx, cy) = self.cell();
        if !target.contains(cx, cy) {
            return;
        }
        if self.dual_trail {
            self.render_dual(&mut *m);
        } else if self.smooth_movement {
            m.set_pixel_float4(Fp16::from(self.pos.0), Fp16::from(self.pos.1), self.color);
        } else {
            m.set_pixel(cx, cy, self.color);
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}
