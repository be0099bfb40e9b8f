//! Filled circles inscribed in the clipped destination rect

use super::props::*;
use super::{base_property_info, Effect, RenderBase, Time};
use crate::color::{lerp, ColorRgba};
use crate::display::{Matrix, MatrixPixels};
use crate::geometry::Rect;
use crate::util::RandGen;

/// Centre and radius of the circle inscribed in `target`
fn inscribed(target: Rect) -> (f32, f32, f32) {
    let cx = target.x as f32 + target.width as f32 * 0.5;
    let cy = target.y as f32 + target.height as f32 * 0.5;
    let radius = target.width.min(target.height) as f32 * 0.5;
    (cx, cy, radius)
}

#[inline]
fn coverage_alpha(coverage: f32) -> u8 {
    (coverage.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Circle with a per-pixel distance test and a 1 px anti-aliased rim
pub struct Circle {
    base: RenderBase,
    pub color: ColorRgba,
    pub background: ColorRgba,
    pub smooth_edges: bool,
}

impl Circle {
    pub const PROP_SMOOTH_EDGES: u8 = PROP_BASE_LAST + 1;

    pub fn new() -> Self {
        Self::with_name("Circle")
    }

    fn with_name(class_name: &'static str) -> Self {
        Self {
            base: RenderBase::new(class_name),
            color: ColorRgba::WHITE,
            background: ColorRgba::TRANSPARENT,
            smooth_edges: true,
        }
    }

    /// Color slots shared by every circle variant
    fn color_info(index: u8) -> Option<PropInfo> {
        match index {
            PROP_COLOR => Some(PropInfo::new(PropType::Color, "Circle color")),
            PROP_COLOR_BACKGROUND => Some(PropInfo::new(PropType::Color, "Background color")),
            _ => None,
        }
    }

    fn color_property(&self, index: u8) -> Option<PropValue> {
        match index {
            PROP_COLOR => Some(PropValue::Color(self.color)),
            PROP_COLOR_BACKGROUND => Some(PropValue::Color(self.background)),
            _ => None,
        }
    }

    fn set_color_property(&mut self, index: u8, value: &PropValue) -> Option<bool> {
        let slot = match index {
            PROP_COLOR => &mut self.color,
            PROP_COLOR_BACKGROUND => &mut self.background,
            _ => return None,
        };
        Some(value.as_color().map(|c| *slot = c).is_some())
    }

    fn draw_exact(&self, m: &mut MatrixPixels, target: Rect) {
        let (cx, cy, radius) = inscribed(target);
        let radius_sq = radius * radius;

        for y in target.y..target.bottom() {
            let dy = y as f32 + 0.5 - cy;
            for x in target.x..target.right() {
                let dx = x as f32 + 0.5 - cx;
                let dist_sq = dx * dx + dy * dy;
                if !self.smooth_edges {
                    let c = if dist_sq <= radius_sq { self.color } else { self.background };
                    m.set_pixel(x, y, c);
                    continue;
                }
                m.set_pixel(x, y, self.background);
                let alpha = coverage_alpha(radius + 0.5 - dist_sq.sqrt());
                if alpha > 0 {
                    m.set_pixel_alpha(x, y, self.color, alpha);
                }
            }
        }
    }

    /// Per scanline: background, solid chord interior, then the two edge
    /// columns (anti-aliased when smooth)
    fn draw_scanline(&self, m: &mut MatrixPixels, target: Rect) {
        let (cx, cy, radius) = inscribed(target);
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        const AA_WIDTH: f32 = 1.0;

        for y in target.y..target.bottom() {
            let dy = y as f32 + 0.5 - cy;
            let dy_sq = dy * dy;
            for x in target.x..target.right() {
                m.set_pixel(x, y, self.background);
            }
            if dy_sq > radius_sq + AA_WIDTH * AA_WIDTH {
                continue;
            }

            let half = (radius_sq - dy_sq).max(0.0).sqrt();
            let (left_f, right_f) = (cx - half, cx + half);
            let (xl, xr) = (left_f.floor() as i32, right_f.floor() as i32);

            for x in (xl + 1).max(target.x)..xr.min(target.right()) {
                m.set_pixel(x, y, self.color);
            }

            if !self.smooth_edges {
                if target.contains(xl, y) {
                    m.set_pixel(xl, y, self.color);
                }
                if xr != xl && target.contains(xr, y) {
                    m.set_pixel(xr, y, self.color);
                }
                continue;
            }

            let edges = [(xl, (xl as f32 + 0.5 - left_f).abs()), (xr, (right_f - (xr as f32 + 0.5)).abs())];
            for (x, dist) in edges {
                let alpha = coverage_alpha(AA_WIDTH - dist);
                if alpha > 0 && target.contains(x, y) {
                    m.set_pixel_alpha(x, y, self.color, alpha);
                }
            }
        }
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Circle {
    fn property_count(&self) -> u8 {
        Self::PROP_SMOOTH_EDGES
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            Self::PROP_SMOOTH_EDGES => Some(PropInfo::new(PropType::Bool, "Smooth edges")),
            _ => Self::color_info(index).or_else(|| base_property_info(index)),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            Self::PROP_SMOOTH_EDGES => PropValue::Bool(self.smooth_edges),
            _ => self.color_property(index).unwrap_or_else(|| self.base.property(index)),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        if index == Self::PROP_SMOOTH_EDGES {
            return value.as_bool().map(|v| self.smooth_edges = v).is_some();
        }
        match self.set_color_property(index, &value) {
            Some(ok) => ok,
            None => self.base.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if let Some((mut m, target)) = self.base.target() {
            self.draw_exact(&mut m, target);
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.base)
    }
}

/// [`Circle`] computed per scanline chord
pub struct CircleFast {
    inner: Circle,
}

impl CircleFast {
    pub fn new() -> Self {
        Self {
            inner: Circle::with_name("CircleFast"),
        }
    }
}

impl Default for CircleFast {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for CircleFast {
    fn property_count(&self) -> u8 {
        self.inner.property_count()
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        self.inner.property_info(index)
    }

    fn property(&self, index: u8) -> PropValue {
        self.inner.property(index)
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        self.inner.set_property(index, value)
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if let Some((mut m, target)) = self.inner.base.target() {
            self.inner.draw_scanline(&mut m, target);
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.inner.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.inner.base)
    }
}

/// Radial gradient from `color` at the centre to the background at the rim
///
/// `gradient_offset` (0..=255 of the radius) keeps a solid core before the
/// gradient starts.
pub struct CircleGradient {
    inner: Circle,
    pub gradient_offset: u8,
}

impl CircleGradient {
    pub const PROP_GRADIENT_OFFSET: u8 = PROP_BASE_LAST + 1;

    pub fn new() -> Self {
        Self {
            inner: Circle::with_name("CircleGradient"),
            gradient_offset: 0,
        }
    }

    fn draw(&self, m: &mut MatrixPixels, target: Rect) {
        let (cx, cy, radius) = inscribed(target);
        if radius <= 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let start = radius * f32::from(self.gradient_offset) / 255.0;
        let span = radius - start;
        let (color, background) = (self.inner.color, self.inner.background);

        for y in target.y..target.bottom() {
            let dy = y as f32 + 0.5 - cy;
            for x in target.x..target.right() {
                let dx = x as f32 + 0.5 - cx;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq > radius_sq {
                    m.set_pixel(x, y, background);
                    continue;
                }
                let dist = dist_sq.sqrt();
                let t = if span > 0.0 && dist > start {
                    ((dist - start) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                m.set_pixel(x, y, lerp(color, background, (t * 255.0 + 0.5) as u8));
            }
        }
    }
}

impl Default for CircleGradient {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for CircleGradient {
    fn property_count(&self) -> u8 {
        Self::PROP_GRADIENT_OFFSET
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            Self::PROP_GRADIENT_OFFSET => Some(PropInfo::new(PropType::UInt8, "Gradient offset")),
            _ => Circle::color_info(index).or_else(|| base_property_info(index)),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            Self::PROP_GRADIENT_OFFSET => PropValue::UInt8(self.gradient_offset),
            _ => self.inner.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match index {
            Self::PROP_GRADIENT_OFFSET => value.as_u8().map(|v| self.gradient_offset = v).is_some(),
            _ => self.inner.set_property(index, value),
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if let Some((mut m, target)) = self.inner.base.target() {
            self.draw(&mut m, target);
        }
    }

    fn render_base(&self) -> Option<&RenderBase> {
        Some(&self.inner.base)
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        Some(&mut self.inner.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{write_property, SharedMatrix};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn render<E: Effect>(mut e: E, size: u16) -> MatrixPixels {
        let m: SharedMatrix = Rc::new(RefCell::new(MatrixPixels::new(size, size)));
        e.set_matrix(Some(m.clone()));
        e.render(&mut RandGen::default(), 0);
        let frame = m.borrow().clone();
        frame
    }

    #[test]
    fn test_circle_centre_and_corners() {
        let f = render(Circle::new(), 9);
        assert_eq!(f.get_pixel(4, 4), ColorRgba::WHITE);
        assert_eq!(f.get_pixel(0, 0), ColorRgba::TRANSPARENT);
        // Rim pixels are partially covered
        let rim = f.get_pixel(0, 2);
        assert!(rim.a > 0 && rim.a < 255, "rim alpha {}", rim.a);
    }

    #[test]
    fn test_hard_edges_binary() {
        let mut c = Circle::new();
        assert!(write_property(&mut c, Circle::PROP_SMOOTH_EDGES, PropValue::Bool(false)));
        let f = render(c, 8);
        assert!(f
            .as_argb_slice()
            .iter()
            .all(|&p| { ColorRgba::unpack(p) == ColorRgba::WHITE || p == 0 }));
    }

    #[test]
    fn test_fast_matches_exact_inside() {
        let exact = render(Circle::new(), 12);
        let fast = render(CircleFast::new(), 12);
        for (x, y) in [(6, 6), (3, 6), (6, 2), (8, 8)] {
            assert_eq!(exact.get_pixel(x, y), fast.get_pixel(x, y), "at ({x},{y})");
        }
        assert_eq!(fast.get_pixel(0, 0), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_gradient_centre_to_rim() {
        let mut g = CircleGradient::new();
        assert!(write_property(&mut g, PROP_COLOR_BACKGROUND, PropValue::Color(ColorRgba::BLACK)));
        assert!(!write_property(&mut g, 17, PropValue::Bool(true)));
        let f = render(g, 10);
        let centre = f.get_pixel(5, 5);
        let near_rim = f.get_pixel(1, 5);
        assert!(centre.r > near_rim.r);
        assert_eq!(f.get_pixel(0, 0), ColorRgba::BLACK);
    }
}
