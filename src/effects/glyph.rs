//! Single bitmap-font symbol

use super::props::*;
use super::{base_property_info, ClassFamily, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::{Font, Matrix, DIGITAL_CLOCK_4X7};
use crate::geometry::Rect;
use crate::util::RandGen;

/// Glyph drawing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphStyle {
    /// Fill the rect with the background, then draw the lit bits
    #[default]
    Plain,
    /// Seven-segment look: unlit segments (the bits of `8`) get the
    /// background color, everything else is left alone
    ClockDigit,
}

/// Draws one symbol of a bitmap font, centred in the destination rect
pub struct Glyph {
    base: RenderBase,
    font: Option<&'static dyn Font>,
    pub style: GlyphStyle,
    pub symbol_index: u8,
    pub color: ColorRgba,
    pub background: ColorRgba,
}

impl Glyph {
    pub const PROP_SYMBOL_INDEX: u8 = PROP_BASE_LAST + 1;
    pub const PROP_FONT_WIDTH: u8 = PROP_BASE_LAST + 2;
    pub const PROP_FONT_HEIGHT: u8 = PROP_BASE_LAST + 3;

    pub fn new() -> Self {
        let mut glyph = Self {
            base: RenderBase::new("Glyph"),
            font: None,
            style: GlyphStyle::Plain,
            symbol_index: 0,
            color: ColorRgba::WHITE,
            background: ColorRgba::BLACK,
        };
        glyph.set_font(&DIGITAL_CLOCK_4X7);
        glyph
    }

    /// Digit for the clock effect: 4x7 segment font, unlit segments dimmed
    pub fn clock_digit() -> Self {
        Self {
            style: GlyphStyle::ClockDigit,
            ..Self::new()
        }
    }

    pub fn font(&self) -> Option<&'static dyn Font> {
        self.font
    }

    /// Select a font, re-clamping the symbol index and the autosized rect
    pub fn set_font(&mut self, font: &'static dyn Font) {
        self.font = Some(font);
        self.update_render_rect();
        self.clamp_symbol();
    }

    pub fn font_size(&self) -> (u16, u16) {
        self.font.map_or((0, 0), |f| (f.width(), f.height()))
    }

    pub(crate) fn base_mut(&mut self) -> &mut RenderBase {
        &mut self.base
    }

    fn clamp_symbol(&mut self) {
        if let Some(font) = self.font {
            let count = font.count();
            if u16::from(self.symbol_index) >= count {
                self.symbol_index = count.saturating_sub(1).min(u16::from(u8::MAX)) as u8;
            }
        }
    }

    /// With autosize on, the rect keeps its origin and takes the font size
    fn update_render_rect(&mut self) {
        if !self.base.autosize {
            return;
        }
        let (w, h) = self.font_size();
        if self.font.is_some() {
            let r = self.base.rect_dest;
            self.base.rect_dest = Rect::new(r.x, r.y, w, h);
        }
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Glyph {
    fn class_family(&self) -> ClassFamily {
        ClassFamily::Glyph
    }

    fn property_count(&self) -> u8 {
        Self::PROP_FONT_HEIGHT
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        let info = match index {
            PROP_RENDER_RECT_AUTOSIZE => return base_property_info(index).map(PropInfo::hidden),
            PROP_COLOR => PropInfo::new(PropType::Color, "Symbol color"),
            PROP_COLOR_BACKGROUND => PropInfo::new(PropType::Color, "Background color"),
            Self::PROP_SYMBOL_INDEX => PropInfo::new(PropType::UInt8, "Glyph index"),
            Self::PROP_FONT_WIDTH => PropInfo::new(PropType::UInt16, "Font width").read_only(),
            Self::PROP_FONT_HEIGHT => PropInfo::new(PropType::UInt16, "Font height").read_only(),
            _ => return base_property_info(index),
        };
        Some(info)
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            PROP_COLOR => PropValue::Color(self.color),
            PROP_COLOR_BACKGROUND => PropValue::Color(self.background),
            Self::PROP_SYMBOL_INDEX => PropValue::UInt8(self.symbol_index),
            Self::PROP_FONT_WIDTH => PropValue::UInt16(self.font_size().0),
            Self::PROP_FONT_HEIGHT => PropValue::UInt16(self.font_size().1),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match (index, value) {
            (PROP_COLOR, PropValue::Color(c)) => self.color = c,
            (PROP_COLOR_BACKGROUND, PropValue::Color(c)) => self.background = c,
            (Self::PROP_SYMBOL_INDEX, PropValue::UInt8(v)) => self.symbol_index = v,
            (PROP_COLOR | PROP_COLOR_BACKGROUND | Self::PROP_SYMBOL_INDEX, _) => return false,
            (index, value) => return self.base.set_property(index, value),
        }
        true
    }

    fn on_property_changed(&mut self, index: u8) {
        match index {
            PROP_MATRIX_DEST | PROP_RENDER_RECT_AUTOSIZE => self.update_render_rect(),
            Self::PROP_SYMBOL_INDEX => self.clamp_symbol(),
            _ => self.base.on_property_changed(index),
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let Some(font) = self.font else {
            return;
        };
        let Some((mut m, target)) = self.base.target() else {
            return;
        };

        if self.style == GlyphStyle::Plain {
            m.fill_area(target, self.background);
        }

        let r = self.base.rect_dest;
        let gw = r.width.min(font.width());
        let gh = r.height.min(font.height());
        if gw == 0 || gh == 0 || u16::from(self.symbol_index) >= font.count() {
            return;
        }
        let ox = r.x + i32::from((r.width - gw) / 2);
        let oy = r.y + i32::from((r.height - gh) / 2);
        let symbol = u16::from(self.symbol_index);

        for row in 0..gh {
            let py = oy + i32::from(row);
            for col in 0..gw {
                let px = ox + i32::from(col);
                if !target.contains(px, py) {
                    continue;
                }
                if font.is_set(symbol, col, row) {
                    m.set_pixel(px, py, self.color);
                } else if self.style == GlyphStyle::ClockDigit && font.is_set(8, col, row) {
                    m.set_pixel(px, py, self.background);
                }
            }
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }

    fn query_glyph_mut(&mut self) -> Option<&mut Glyph> {
        Some(self)
    }
}
