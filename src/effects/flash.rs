//! A random point that blinks on and off, moving on each cycle

use super::props::*;
use super::{base_property_info, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::util::RandGen;

/// One random pixel in a random color, lit for `on_time` ms and then dark
/// for `off_time` ms before moving somewhere else
pub struct RandomFlashPoint {
    base: RenderBase,
    pub on_time: u16,
    pub off_time: u16,
    point: (i32, i32),
    color: ColorRgba,
    phase_start: Time,
    is_on: bool,
    needs_respawn: bool,
}

impl RandomFlashPoint {
    pub const PROP_ON_TIME: u8 = PROP_BASE_LAST + 1;
    pub const PROP_OFF_TIME: u8 = PROP_BASE_LAST + 2;

    pub fn new() -> Self {
        Self {
            base: RenderBase::new("RandomFlashPoint"),
            on_time: 120,
            off_time: 300,
            point: (0, 0),
            color: ColorRgba::WHITE,
            phase_start: 0,
            is_on: false,
            needs_respawn: true,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Position and color of the current flash
    pub fn point(&self) -> ((i32, i32), ColorRgba) {
        (self.point, self.color)
    }

    fn respawn(&mut self, rng: &mut RandGen, time: Time) {
        if let Some(target) = self.base.clipped_rect() {
            self.point = (
                target.x + i32::from(rng.next_coord_below(target.width)),
                target.y + i32::from(rng.next_coord_below(target.height)),
            );
            self.color = ColorRgba::new(255, rng.next_u8(), rng.next_u8(), rng.next_u8());
        }
        self.is_on = true;
        self.phase_start = time;
    }
}

impl Default for RandomFlashPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for RandomFlashPoint {
    fn property_count(&self) -> u8 {
        Self::PROP_OFF_TIME
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            Self::PROP_ON_TIME => Some(PropInfo::new(PropType::UInt16, "On time (ms)")),
            Self::PROP_OFF_TIME => Some(PropInfo::new(PropType::UInt16, "Off time (ms)")),
            _ => base_property_info(index),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            Self::PROP_ON_TIME => PropValue::UInt16(self.on_time),
            Self::PROP_OFF_TIME => PropValue::UInt16(self.off_time),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        let slot = match index {
            Self::PROP_ON_TIME => &mut self.on_time,
            Self::PROP_OFF_TIME => &mut self.off_time,
            _ => return self.base.set_property(index, value),
        };
        value.as_u16().map(|v| *slot = v).is_some()
    }

    fn on_property_changed(&mut self, index: u8) {
        self.base.on_property_changed(index);
        if matches!(index, PROP_MATRIX_DEST | PROP_RECT_DEST) {
            self.needs_respawn = true;
        }
    }

    fn recalc(&mut self, rng: &mut RandGen, time: Time) {
        if self.base.disabled || self.base.clipped_rect().is_none() {
            return;
        }
        if self.needs_respawn {
            self.respawn(rng, time);
            self.needs_respawn = false;
            return;
        }

        let elapsed = time.wrapping_sub(self.phase_start);
        if self.is_on {
            // A zero on-time keeps the point lit
            if self.on_time != 0 && elapsed >= Time::from(self.on_time) {
                self.is_on = false;
                self.phase_start = time;
            }
        } else if self.off_time != 0 && elapsed >= Time::from(self.off_time) {
            self.respawn(rng, time);
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if !self.is_on {
            return;
        }
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let (x, y) = self.point;
        if target.contains(x, y) {
            m.set_pixel(x, y, self.color);
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}
