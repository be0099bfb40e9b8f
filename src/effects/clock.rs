//! Four-digit clock drawn through a linked glyph effect

use log::debug;

use super::props::*;
use super::{base_property_info, upgrade_link, ClassFamily, Effect, EffectLink, RenderBase, Time};
use crate::geometry::Rect;
use crate::util::RandGen;

const DIGIT_COUNT: usize = 4;

/// Last four decimal digits of `time`, most significant first
fn split_digits(time: u32) -> [u8; DIGIT_COUNT] {
    let mut digits = [0u8; DIGIT_COUNT];
    let mut divisor = 1u32;
    for d in digits.iter_mut().rev() {
        *d = ((time / divisor) % 10) as u8;
        divisor *= 10;
    }
    digits
}

/// Renders the last four decimal digits of `time` left to right
///
/// The clock does not own its glyph. The linked glyph is enabled only while
/// the clock draws it, so it stays quiet if it also sits in the effect stack.
pub struct DigitalClock {
    base: RenderBase,
    pub time: u32,
    pub spacing: u16,
    render_digit: Option<EffectLink>,
}

impl DigitalClock {
    pub const PROP_TIME: u8 = PROP_BASE_LAST + 1;
    pub const PROP_RENDER_DIGIT: u8 = PROP_BASE_LAST + 2;
    pub const PROP_SPACING: u8 = PROP_BASE_LAST + 3;

    pub fn new() -> Self {
        Self {
            base: RenderBase::new("DigitalClock"),
            time: 0,
            spacing: 1,
            render_digit: None,
        }
    }

    /// Hand the clock's matrix to the linked glyph
    fn bind_digit_matrix(&self) {
        let Some(matrix) = &self.base.matrix_dest else {
            return;
        };
        if let Some(digit) = upgrade_link(&self.render_digit) {
            if let Ok(mut digit) = digit.try_borrow_mut() {
                digit.set_matrix(Some(matrix.clone()));
            }
        }
    }
}

impl Default for DigitalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for DigitalClock {
    fn class_family(&self) -> ClassFamily {
        ClassFamily::DigitalClock
    }

    fn property_count(&self) -> u8 {
        Self::PROP_SPACING
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        let info = match index {
            PROP_RENDER_RECT_AUTOSIZE => return base_property_info(index).map(PropInfo::hidden),
            Self::PROP_TIME => PropInfo::new(PropType::UInt32, "Time").with_desc("last four decimal digits are shown"),
            Self::PROP_RENDER_DIGIT => PropInfo::new(PropType::EffectGlyph, "Render digit"),
            Self::PROP_SPACING => PropInfo::new(PropType::UInt16, "Spacing"),
            _ => return base_property_info(index),
        };
        Some(info)
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            Self::PROP_TIME => PropValue::UInt32(self.time),
            Self::PROP_RENDER_DIGIT => PropValue::Effect(upgrade_link(&self.render_digit)),
            Self::PROP_SPACING => PropValue::UInt16(self.spacing),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match (index, value) {
            (Self::PROP_TIME, PropValue::UInt32(v)) => self.time = v,
            (Self::PROP_SPACING, PropValue::UInt16(v)) => self.spacing = v,
            (Self::PROP_RENDER_DIGIT, PropValue::Effect(e)) => {
                self.render_digit = e.as_ref().map(std::rc::Rc::downgrade);
            },
            (Self::PROP_TIME | Self::PROP_SPACING | Self::PROP_RENDER_DIGIT, _) => return false,
            (index, value) => return self.base.set_property(index, value),
        }
        true
    }

    fn on_property_changed(&mut self, index: u8) {
        self.base.on_property_changed(index);
        match index {
            Self::PROP_RENDER_DIGIT => {
                let valid = upgrade_link(&self.render_digit).map(|d| {
                    d.try_borrow()
                        .map(|d| d.query_class_family(ClassFamily::Glyph))
                        .unwrap_or(false)
                });
                match valid {
                    Some(true) => {
                        debug!("{}: render digit linked", self.base.class_name);
                        self.bind_digit_matrix();
                    },
                    Some(false) => self.render_digit = None,
                    None => {},
                }
            },
            PROP_MATRIX_DEST => self.bind_digit_matrix(),
            _ => {},
        }
    }

    fn render(&self, rng: &mut RandGen, time: Time) {
        if self.base.disabled || self.base.matrix_dest.is_none() {
            return;
        }
        let Some(digit) = upgrade_link(&self.render_digit) else {
            return;
        };
        let Ok(mut digit) = digit.try_borrow_mut() else {
            return;
        };
        let Some(glyph) = digit.query_glyph_mut() else {
            return;
        };
        let Some(font) = glyph.font() else {
            return;
        };

        let (fw, fh) = (font.width(), font.height());
        let origin = self.base.rect_dest;
        glyph.base_mut().disabled = false;
        for (i, &d) in split_digits(self.time).iter().enumerate() {
            glyph.symbol_index = d;
            let x = origin.x + (i32::from(fw) + i32::from(self.spacing)) * i as i32;
            glyph.base_mut().rect_dest = Rect::new(x, origin.y, fw, fh);
            glyph.render(rng, time);
        }
        glyph.base_mut().disabled = true;
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}
