//! State shared by every effect that draws into a destination matrix

use std::cell::RefMut;

use log::debug;

use super::props::*;
use super::{SharedMatrix, Time};
use crate::display::{Matrix, MatrixPixels};
use crate::fixed::{Fp16, Fp32};
use crate::geometry::Rect;

/// Metadata of the shared slots 1 to 15. Slots past 5 start disabled.
pub fn base_property_info(index: u8) -> Option<PropInfo> {
    let info = match index {
        PROP_CLASS_NAME => PropInfo::new(PropType::StrConst, "Class name").read_only(),
        PROP_MATRIX_DEST => PropInfo::new(PropType::Matrix, "Matrix dest"),
        PROP_RECT_DEST => PropInfo::new(PropType::Rect, "Rect dest"),
        PROP_RENDER_RECT_AUTOSIZE => PropInfo::new(PropType::Bool, "Render rect autosize"),
        PROP_DISABLED => PropInfo::new(PropType::Bool, "Disabled"),
        PROP_SCALE => PropInfo::disabled(PropType::Fp16, "Scale"),
        PROP_SPEED => PropInfo::disabled(PropType::Fp16, "Speed"),
        PROP_ALPHA => PropInfo::disabled(PropType::UInt8, "Alpha"),
        PROP_COLOR => PropInfo::disabled(PropType::Color, "Color"),
        PROP_COLOR2 => PropInfo::disabled(PropType::Color, "Color 2"),
        PROP_COLOR3 => PropInfo::disabled(PropType::Color, "Color 3"),
        PROP_COLOR_BACKGROUND => PropInfo::disabled(PropType::Color, "Background color"),
        PROP_MATRIX_SOURCE => PropInfo::disabled(PropType::Matrix, "Matrix source"),
        PROP_RECT_SOURCE => PropInfo::disabled(PropType::Rect, "Rect source"),
        PROP_REWRITE => PropInfo::disabled(PropType::Bool, "Rewrite"),
        _ => return None,
    };
    Some(info)
}

/// Destination matrix, destination rect and the two flags every drawing
/// effect carries
#[derive(Clone)]
pub struct RenderBase {
    pub class_name: &'static str,
    pub matrix_dest: Option<SharedMatrix>,
    pub rect_dest: Rect,
    pub autosize: bool,
    pub disabled: bool,
}

impl RenderBase {
    pub fn new(class_name: &'static str) -> Self {
        Self {
            class_name,
            matrix_dest: None,
            rect_dest: Rect::default(),
            autosize: true,
            disabled: false,
        }
    }

    pub fn property(&self, index: u8) -> PropValue {
        match index {
            PROP_CLASS_NAME => PropValue::StrConst(self.class_name),
            PROP_MATRIX_DEST => PropValue::Matrix(self.matrix_dest.clone()),
            PROP_RECT_DEST => PropValue::Rect(self.rect_dest),
            PROP_RENDER_RECT_AUTOSIZE => PropValue::Bool(self.autosize),
            PROP_DISABLED => PropValue::Bool(self.disabled),
            _ => PropValue::None,
        }
    }

    /// Store a shared slot. Returns false for other indices or a wrong type.
    pub fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match (index, value) {
            (PROP_MATRIX_DEST, PropValue::Matrix(m)) => self.matrix_dest = m,
            (PROP_RECT_DEST, PropValue::Rect(r)) => self.rect_dest = r,
            (PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(b)) => self.autosize = b,
            (PROP_DISABLED, PropValue::Bool(b)) => self.disabled = b,
            _ => return false,
        }
        true
    }

    pub fn on_property_changed(&mut self, index: u8) {
        if matches!(index, PROP_MATRIX_DEST | PROP_RENDER_RECT_AUTOSIZE) {
            self.update_render_rect();
        }
    }

    /// With autosize on, make the destination rect cover the whole matrix
    pub fn update_render_rect(&mut self) {
        if !self.autosize {
            return;
        }
        if let Some(m) = &self.matrix_dest {
            if let Ok(m) = m.try_borrow() {
                self.rect_dest = m.rect();
                debug!("{}: autosized to {:?}", self.class_name, self.rect_dest);
            }
        }
    }

    /// Destination rect clipped to the matrix, `None` when empty
    pub fn clipped_rect(&self) -> Option<Rect> {
        let m = self.matrix_dest.as_ref()?.try_borrow().ok()?;
        let target = self.rect_dest.intersect(&m.rect());
        (!target.is_empty()).then_some(target)
    }

    /// Borrow the destination for drawing
    ///
    /// `None` when disabled, unbound, clipped away or already borrowed.
    /// The returned rect is the destination rect clipped to the matrix.
    pub fn target(&self) -> Option<(RefMut<'_, MatrixPixels>, Rect)> {
        if self.disabled {
            return None;
        }
        let m = self.matrix_dest.as_ref()?.try_borrow_mut().ok()?;
        let target = self.rect_dest.intersect(&m.rect());
        if target.is_empty() {
            return None;
        }
        Some((m, target))
    }
}

/// Scale and speed, the two animation knobs shared by procedural effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicParams {
    pub scale: Fp16,
    pub speed: Fp16,
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            scale: Fp16::ONE,
            speed: Fp16::ONE,
        }
    }
}

impl DynamicParams {
    /// Base tick length for simulations that step every 50 ms at speed 1
    pub const TICK_MS: i32 = 50;

    pub fn property_info(index: u8) -> Option<PropInfo> {
        match index {
            PROP_SCALE => Some(PropInfo::new(PropType::Fp16, "Scale")),
            PROP_SPEED => Some(PropInfo::new(PropType::Fp16, "Speed")),
            _ => None,
        }
    }

    pub fn property(&self, index: u8) -> Option<PropValue> {
        match index {
            PROP_SCALE => Some(PropValue::Fp16(self.scale)),
            PROP_SPEED => Some(PropValue::Fp16(self.speed)),
            _ => None,
        }
    }

    /// `None` when `index` is not scale or speed
    pub fn set_property(&mut self, index: u8, value: &PropValue) -> Option<bool> {
        let slot = match index {
            PROP_SCALE => &mut self.scale,
            PROP_SPEED => &mut self.speed,
            _ => return None,
        };
        Some(match value.as_fp16() {
            Some(v) => {
                *slot = v;
                true
            },
            None => false,
        })
    }

    /// `1 / scale`, or 1 when scale is not positive. Larger scale stretches
    /// the pattern.
    pub fn inv_scale(&self) -> f32 {
        let s = self.scale.to_f32();
        if s > 0.0 {
            1.0 / s
        } else {
            1.0
        }
    }

    /// `round(TICK_MS / speed)` in milliseconds, 0 when speed is not positive
    pub fn step_interval(&self) -> Time {
        if self.speed <= Fp16::ZERO {
            return 0;
        }
        let step = Fp32::from_int(Self::TICK_MS) / Fp32::from(self.speed);
        step.round_int().max(0) as Time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_base_info_defaults() {
        assert!(base_property_info(PROP_CLASS_NAME).is_some_and(|i| i.read_only));
        assert!(base_property_info(PROP_RECT_DEST).is_some_and(|i| !i.disabled));
        assert!(base_property_info(PROP_COLOR).is_some_and(|i| i.disabled));
        assert!(base_property_info(0).is_none());
        assert!(base_property_info(16).is_none());
    }

    #[test]
    fn test_autosize_on_bind() {
        let m = Rc::new(RefCell::new(MatrixPixels::new(6, 3)));
        let mut base = RenderBase::new("Test");
        base.matrix_dest = Some(m);
        base.on_property_changed(PROP_MATRIX_DEST);
        assert_eq!(base.rect_dest, Rect::from_size(6, 3));

        base.autosize = false;
        base.rect_dest = Rect::new(1, 1, 2, 2);
        base.on_property_changed(PROP_MATRIX_DEST);
        assert_eq!(base.rect_dest, Rect::new(1, 1, 2, 2));
    }

    #[test]
    fn test_target_requires_matrix_and_enabled() {
        let m = Rc::new(RefCell::new(MatrixPixels::new(4, 4)));
        let mut base = RenderBase::new("Test");
        assert!(base.target().is_none());
        base.matrix_dest = Some(m.clone());
        base.rect_dest = Rect::new(2, 2, 10, 10);
        assert_eq!(base.target().map(|(_, r)| r), Some(Rect::new(2, 2, 2, 2)));
        base.disabled = true;
        assert!(base.target().is_none());
        base.disabled = false;
        let _held = m.borrow_mut();
        assert!(base.target().is_none());
    }

    #[test]
    fn test_set_property_type_checked() {
        let mut base = RenderBase::new("Test");
        assert!(base.set_property(PROP_DISABLED, PropValue::Bool(true)));
        assert!(base.disabled);
        assert!(!base.set_property(PROP_DISABLED, PropValue::UInt8(1)));
        assert!(!base.set_property(PROP_COLOR, PropValue::Bool(true)));
    }

    #[test]
    fn test_step_interval() {
        let mut p = DynamicParams::default();
        assert_eq!(p.step_interval(), 50);
        p.speed = Fp16::from_int(2);
        assert_eq!(p.step_interval(), 25);
        p.speed = Fp16::from_f32(0.5);
        assert_eq!(p.step_interval(), 100);
        p.speed = Fp16::ZERO;
        assert_eq!(p.step_interval(), 0);
        p.speed = Fp16::from_int(120);
        assert_eq!(p.step_interval(), 0);
    }
}
