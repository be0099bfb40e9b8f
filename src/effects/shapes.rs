//! Solid shapes: clear, rectangle, point and triangle

use super::props::*;
use super::{base_property_info, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::geometry::fill_triangle;
use crate::util::RandGen;

/// Clears the whole destination matrix to transparent black
pub struct Clear {
    base: RenderBase,
}

impl Clear {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("Clear"),
        }
    }
}

impl Default for Clear {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Clear {
    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if self.base.disabled {
            return;
        }
        let Some(matrix) = &self.base.matrix_dest else {
            return;
        };
        if let Ok(mut m) = matrix.try_borrow_mut() {
            m.clear();
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}

/// Fills the destination rect with a solid color
pub struct Rectangle {
    base: RenderBase,
    pub color: ColorRgba,
}

impl Rectangle {
    pub fn new() -> Self {
        Self::with_name("Rectangle")
    }

    fn with_name(class_name: &'static str) -> Self {
        Self {
            base: RenderBase::new(class_name),
            color: ColorRgba::WHITE,
        }
    }

    fn color_property(&self, index: u8) -> Option<PropValue> {
        (index == PROP_COLOR).then_some(PropValue::Color(self.color))
    }

    fn set_color_property(&mut self, index: u8, value: &PropValue) -> Option<bool> {
        if index != PROP_COLOR {
            return None;
        }
        let color = value.as_color();
        if let Some(c) = color {
            self.color = c;
        }
        Some(color.is_some())
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Rectangle {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            PROP_COLOR => Some(PropInfo::new(PropType::Color, "Rectangle color")),
            _ => base_property_info(index),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        self.color_property(index).unwrap_or_else(|| self.base.property(index))
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match self.set_color_property(index, &value) {
            Some(ok) => ok,
            None => self.base.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        m.fill_area(target, self.color);
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}

/// Square rectangle, 1x1 by default. Autosize is off and cannot be turned on.
pub struct Point {
    inner: Rectangle,
}

impl Point {
    pub fn new() -> Self {
        let mut inner = Rectangle::with_name("Point");
        inner.base.rect_dest.width = 1;
        inner.base.rect_dest.height = 1;
        inner.base.autosize = false;
        Self { inner }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Point {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            PROP_RENDER_RECT_AUTOSIZE => base_property_info(index).map(PropInfo::hidden),
            PROP_COLOR => Some(PropInfo::new(PropType::Color, "Point color")),
            _ => self.inner.property_info(index),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        self.inner.property(index)
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        self.inner.set_property(index, value)
    }

    fn on_property_changed(&mut self, index: u8) {
        match index {
            PROP_RENDER_RECT_AUTOSIZE => {},
            PROP_RECT_DEST => {
                let rect = &mut self.inner.base.rect_dest;
                let side = rect.width.min(rect.height);
                rect.width = side;
                rect.height = side;
            },
            _ => self.inner.base.on_property_changed(index),
        }
    }

    fn render(&self, rng: &mut RandGen, time: Time) {
        self.inner.render(rng, time);
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.inner.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.inner.base)
    }
}

/// Filled triangle inscribed in the destination rect: bottom-right,
/// bottom-left and top-centre
pub struct TriangleSimple {
    base: RenderBase,
    pub color: ColorRgba,
}

impl TriangleSimple {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("TriangleSimple"),
            color: ColorRgba::WHITE,
        }
    }
}

impl Default for TriangleSimple {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for TriangleSimple {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            PROP_COLOR => Some(PropInfo::new(PropType::Color, "Triangle color")),
            _ => base_property_info(index),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            PROP_COLOR => PropValue::Color(self.color),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match (index, &value) {
            (PROP_COLOR, PropValue::Color(c)) => {
                self.color = *c;
                true
            },
            (PROP_COLOR, _) => false,
            _ => self.base.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let r = self.base.rect_dest;
        let right = (r.right() - 1) as f32;
        let bottom = (r.bottom() - 1) as f32;
        let left = r.x as f32;
        let apex = (left + r.width as f32 * 0.5, r.y as f32);
        let color = self.color;
        fill_triangle(target, (right, bottom), (left, bottom), apex, |x, y| {
            m.set_pixel(x, y, color);
        });
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}
