//! Effects that read from a source matrix and write into the destination
//!
//! Source and destination may be the same matrix. Every pipe reads first
//! (snapshot or aggregate), releases the source borrow, then draws.

use std::rc::Rc;

use log::{debug, warn};

use super::props::*;
use super::{base_property_info, ClassFamily, Effect, RenderBase, SharedMatrix, Time};
use crate::color::ColorRgba;
use crate::display::blit::{draw_matrix_area, draw_matrix_scale, fill_area, get_area_color};
use crate::display::{Matrix, MatrixPixels};
use crate::geometry::Rect;
use crate::util::RandGen;

/// Source matrix and rect shared by every pipe
#[derive(Clone, Default)]
pub struct PipeSource {
    pub matrix: Option<SharedMatrix>,
    pub rect: Rect,
}

impl PipeSource {
    pub fn property_info(index: u8) -> Option<PropInfo> {
        match index {
            PROP_MATRIX_SOURCE => Some(PropInfo::new(PropType::Matrix, "Matrix source")),
            PROP_RECT_SOURCE => Some(PropInfo::new(PropType::Rect, "Rect source")),
            _ => None,
        }
    }

    pub fn property(&self, index: u8) -> Option<PropValue> {
        match index {
            PROP_MATRIX_SOURCE => Some(PropValue::Matrix(self.matrix.clone())),
            PROP_RECT_SOURCE => Some(PropValue::Rect(self.rect)),
            _ => None,
        }
    }

    pub fn set_property(&mut self, index: u8, value: &PropValue) -> Option<bool> {
        match (index, value) {
            (PROP_MATRIX_SOURCE, PropValue::Matrix(m)) => self.matrix = m.clone(),
            (PROP_RECT_SOURCE, PropValue::Rect(r)) => self.rect = *r,
            (PROP_MATRIX_SOURCE | PROP_RECT_SOURCE, _) => return Some(false),
            _ => return None,
        }
        Some(true)
    }

    /// A new source with an empty source rect adopts the whole source matrix.
    /// With autosize on, the destination rect follows the source rect.
    pub fn on_source_changed(&mut self, base: &mut RenderBase) {
        let Some(rect) = self.read(|src| src.rect()) else {
            return;
        };
        if self.rect.is_empty() {
            self.rect = rect;
        }
        if base.autosize {
            base.rect_dest = rect;
            debug!("{}: dest rect follows source {:?}", base.class_name, rect);
        }
    }

    /// Run `f` against the source, releasing the borrow before returning
    pub fn read<R>(&self, f: impl FnOnce(&MatrixPixels) -> R) -> Option<R> {
        let src = self.matrix.as_ref()?.try_borrow().ok()?;
        Some(f(&src))
    }

    /// True when the source is also the destination matrix
    pub fn is_dest(&self, base: &RenderBase) -> bool {
        match (&self.matrix, &base.matrix_dest) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Property handling common to pipe effects
macro_rules! pipe_properties {
    () => {
        fn property(&self, index: u8) -> PropValue {
            self.source.property(index).unwrap_or_else(|| self.base.property(index))
        }

        fn set_property(&mut self, index: u8, value: PropValue) -> bool {
            match self.source.set_property(index, &value) {
                Some(ok) => ok,
                None => self.base.set_property(index, value),
            }
        }

        fn on_property_changed(&mut self, index: u8) {
            self.base.on_property_changed(index);
            if index == PROP_MATRIX_SOURCE {
                self.source.on_source_changed(&mut self.base);
            }
        }

        fn class_family(&self) -> ClassFamily {
            ClassFamily::Pipe
        }

        fn render_base(&self) -> Option<&RenderBase> {
            Some(&self.base)
        }

        fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
            Some(&mut self.base)
        }
    };
}

// ============================================================================
// AverageArea
// ============================================================================

/// Fill the destination rect with the average color of the source rect
pub struct AverageArea {
    base: RenderBase,
    source: PipeSource,
}

impl AverageArea {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("AverageArea"),
            source: PipeSource::default(),
        }
    }
}

impl Default for AverageArea {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for AverageArea {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        PipeSource::property_info(index).or_else(|| base_property_info(index))
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        if self.base.disabled {
            return;
        }
        let Some(color) = self.source.read(|src| get_area_color(src, self.source.rect)) else {
            return;
        };
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        fill_area(&mut *m, target, color);
    }

    pipe_properties!();
}

// ============================================================================
// MatrixCopy
// ============================================================================

/// Copy the source rect into the destination rect, scaling when sizes differ
pub struct MatrixCopy {
    base: RenderBase,
    source: PipeSource,
}

impl MatrixCopy {
    pub fn new() -> Self {
        Self {
            base: RenderBase::new("MatrixCopy"),
            source: PipeSource::default(),
        }
    }
}

impl Default for MatrixCopy {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for MatrixCopy {
    fn property_info(&self, index: u8) -> Option<PropInfo> {
        PipeSource::property_info(index).or_else(|| base_property_info(index))
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let src_rect = self.source.rect;
        let dst_rect = self.base.rect_dest;
        if self.base.disabled || !dst_rect.intersects(&src_rect) {
            return;
        }

        let snapshot;
        let borrowed;
        let src: &MatrixPixels = if self.source.is_dest(&self.base) {
            let Some(copy) = self.source.read(MatrixPixels::clone) else {
                return;
            };
            snapshot = copy;
            &snapshot
        } else {
            let Some(Ok(b)) = self.source.matrix.as_ref().map(|m| m.try_borrow()) else {
                return;
            };
            borrowed = b;
            &borrowed
        };

        let Some((mut m, _)) = self.base.target() else {
            return;
        };
        if dst_rect.same_size(&src_rect) {
            draw_matrix_area(&mut *m, src_rect, dst_rect.x, dst_rect.y, src, 255);
        } else {
            draw_matrix_scale(&mut *m, src_rect, dst_rect, src);
        }
    }

    pipe_properties!();
}

// ============================================================================
// Remap
// ============================================================================

/// How [`Remap`] maps a source cell (relative to the source rect) to a
/// destination cell (relative to the destination rect)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapMode {
    /// Row-major flattening into an `N x 1` destination, `N = w * h`
    Linear2DTo1D,
    /// Destination read from the index matrix: `x = g << 8 | b`, `y = a << 8 | r`
    ByIndexMatrix,
    /// Row-major table over the source rect
    ByTable(Vec<(i32, i32)>),
}

/// Copy pixels one by one to remapped positions
pub struct Remap {
    base: RenderBase,
    source: PipeSource,
    pub rewrite: bool,
    mode: RemapMode,
    index_matrix: Option<SharedMatrix>,
}

impl Remap {
    pub const PROP_INDEX_MATRIX: u8 = PROP_BASE_LAST + 1;

    pub fn new(mode: RemapMode) -> Self {
        Self {
            base: RenderBase::new("Remap"),
            source: PipeSource::default(),
            rewrite: false,
            mode,
            index_matrix: None,
        }
    }

    pub fn linear_2d_to_1d() -> Self {
        Self::new(RemapMode::Linear2DTo1D)
    }

    pub fn by_index_matrix() -> Self {
        Self::new(RemapMode::ByIndexMatrix)
    }

    pub fn by_table(table: Vec<(i32, i32)>) -> Self {
        Self::new(RemapMode::ByTable(table))
    }

    pub fn mode(&self) -> &RemapMode {
        &self.mode
    }

    /// Unbind a destination that is not `N x 1` for a linear remap
    fn validate_linear(&mut self) {
        if self.mode != RemapMode::Linear2DTo1D {
            return;
        }
        let Some(dest) = &self.base.matrix_dest else {
            return;
        };
        let Some(src_len) = self.source.read(|src| src.width() as u32 * src.height() as u32) else {
            return;
        };
        let fits = dest
            .try_borrow()
            .map(|d| d.height() == 1 && d.width() as u32 == src_len)
            .unwrap_or(false);
        if !fits {
            warn!("{}: destination must be {}x1, unbinding", self.base.class_name, src_len);
            self.base.matrix_dest = None;
        }
    }

    /// Source-rect-relative cell to destination-rect-relative cell
    fn target_of(&self, src: &MatrixPixels, index: Option<&MatrixPixels>, x: i32, y: i32) -> Option<(i32, i32)> {
        match &self.mode {
            RemapMode::Linear2DTo1D => Some((y * src.width() as i32 + x, 0)),
            RemapMode::ByIndexMatrix => {
                let c = index?.get_pixel(x, y);
                let dx = i32::from(c.g) << 8 | i32::from(c.b);
                let dy = i32::from(c.a) << 8 | i32::from(c.r);
                Some((dx, dy))
            },
            RemapMode::ByTable(table) => {
                let k = usize::try_from(y * self.source.rect.width as i32 + x).ok()?;
                table.get(k).copied()
            },
        }
    }
}

impl Effect for Remap {
    fn property_count(&self) -> u8 {
        Self::PROP_INDEX_MATRIX
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            PROP_REWRITE => Some(PropInfo::new(PropType::Bool, "Rewrite")),
            Self::PROP_INDEX_MATRIX if self.mode == RemapMode::ByIndexMatrix => {
                Some(PropInfo::new(PropType::Matrix, "Matrix index"))
            },
            Self::PROP_INDEX_MATRIX => Some(PropInfo::disabled(PropType::Matrix, "Matrix index")),
            _ => PipeSource::property_info(index).or_else(|| base_property_info(index)),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            PROP_REWRITE => PropValue::Bool(self.rewrite),
            Self::PROP_INDEX_MATRIX => PropValue::Matrix(self.index_matrix.clone()),
            _ => self.source.property(index).unwrap_or_else(|| self.base.property(index)),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        match (index, value) {
            (PROP_REWRITE, PropValue::Bool(b)) => self.rewrite = b,
            (Self::PROP_INDEX_MATRIX, PropValue::Matrix(m)) => self.index_matrix = m,
            (PROP_REWRITE | Self::PROP_INDEX_MATRIX, _) => return false,
            (index, value) => {
                return match self.source.set_property(index, &value) {
                    Some(ok) => ok,
                    None => self.base.set_property(index, value),
                }
            },
        }
        true
    }

    fn on_property_changed(&mut self, index: u8) {
        self.base.on_property_changed(index);
        if index == PROP_MATRIX_SOURCE {
            // A linear destination is 1 pixel high, never the source's shape
            if self.mode == RemapMode::Linear2DTo1D {
                if let Some(r) = self.source.read(|src| src.rect()) {
                    if self.source.rect.is_empty() {
                        self.source.rect = r;
                    }
                }
            } else {
                self.source.on_source_changed(&mut self.base);
            }
        }
        if matches!(index, PROP_MATRIX_DEST | PROP_MATRIX_SOURCE) {
            self.validate_linear();
        }
    }

    fn class_family(&self) -> ClassFamily {
        ClassFamily::Pipe
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let src_rect = self.source.rect;
        if self.base.disabled || src_rect.is_empty() || self.base.matrix_dest.is_none() {
            return;
        }

        let index_ref = match (&self.mode, &self.index_matrix) {
            (RemapMode::ByIndexMatrix, Some(m)) => match m.try_borrow() {
                Ok(m) => Some(m),
                Err(_) => return,
            },
            (RemapMode::ByIndexMatrix, None) => return,
            _ => None,
        };

        let moves: Option<Vec<(i32, i32, ColorRgba)>> = self.source.read(|src| {
            let mut moves = Vec::with_capacity(src_rect.area() as usize);
            for y in 0..src_rect.height as i32 {
                for x in 0..src_rect.width as i32 {
                    let Some((dx, dy)) = self.target_of(src, index_ref.as_deref(), x, y) else {
                        continue;
                    };
                    let pixel = src.get_pixel(src_rect.x + x, src_rect.y + y);
                    moves.push((self.base.rect_dest.x + dx, self.base.rect_dest.y + dy, pixel));
                }
            }
            moves
        });
        drop(index_ref);
        let Some(moves) = moves else {
            return;
        };

        let Some(dest) = &self.base.matrix_dest else {
            return;
        };
        let Ok(mut m) = dest.try_borrow_mut() else {
            return;
        };
        for (x, y, pixel) in moves {
            if self.rewrite {
                m.set_pixel_rewrite(x, y, pixel);
            } else {
                m.set_pixel(x, y, pixel);
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
    use crate::effects::write_property;
    use std::cell::RefCell;

    fn shared(w: u16, h: u16) -> SharedMatrix {
        Rc::new(RefCell::new(MatrixPixels::new(w, h)))
    }

    fn checker(w: u16, h: u16) -> SharedMatrix {
        let m = shared(w, h);
        {
            let mut b = m.borrow_mut();
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    let c = if (x + y) % 2 == 0 { ColorRgba::WHITE } else { ColorRgba::BLACK };
                    b.set_pixel_rewrite(x, y, c);
                }
            }
        }
        m
    }

    fn bind(effect: &mut dyn Effect, dest: &SharedMatrix, src: &SharedMatrix) {
        assert!(write_property(effect, PROP_MATRIX_DEST, PropValue::Matrix(Some(dest.clone()))));
        assert!(write_property(effect, PROP_MATRIX_SOURCE, PropValue::Matrix(Some(src.clone()))));
    }

    #[test]
    fn test_source_sets_rects() {
        let dest = shared(8, 8);
        let src = shared(3, 2);
        let mut copy = MatrixCopy::new();
        bind(&mut copy, &dest, &src);
        assert_eq!(copy.property(PROP_RECT_SOURCE), PropValue::Rect(Rect::from_size(3, 2)));
        assert_eq!(copy.property(PROP_RECT_DEST), PropValue::Rect(Rect::from_size(3, 2)));
        assert_eq!(copy.class_family(), ClassFamily::Pipe);
        assert!(copy.query_class_family(ClassFamily::MatrixDest));
    }

    #[test]
    fn test_average_area_same_matrix() {
        let m = checker(4, 4);
        let mut avg = AverageArea::new();
        bind(&mut avg, &m, &m);
        avg.render(&mut RandGen::default(), 0);
        let c = m.borrow().get_pixel(0, 0);
        assert_eq!(c.a, 255);
        assert!((126..=129).contains(&c.r), "r = {}", c.r);
        assert_eq!(m.borrow().get_pixel(3, 3), c);
    }

    #[test]
    fn test_matrix_copy_same_size() {
        let dest = shared(4, 4);
        let src = checker(2, 2);
        let mut copy = MatrixCopy::new();
        bind(&mut copy, &dest, &src);
        copy.render(&mut RandGen::default(), 0);
        let d = dest.borrow();
        assert_eq!(d.get_pixel(0, 0), ColorRgba::WHITE);
        assert_eq!(d.get_pixel(1, 0), ColorRgba::BLACK);
        assert_eq!(d.get_pixel(2, 2), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_matrix_copy_scales() {
        let dest = shared(4, 4);
        let src = shared(2, 2);
        src.borrow_mut().fill_area(Rect::from_size(2, 2), ColorRgba::RED);
        let mut copy = MatrixCopy::new();
        bind(&mut copy, &dest, &src);
        assert!(write_property(&mut copy, PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(false)));
        assert!(write_property(&mut copy, PROP_RECT_DEST, PropValue::Rect(Rect::from_size(4, 4))));
        copy.render(&mut RandGen::default(), 0);
        assert_eq!(dest.borrow().get_pixel(0, 0), ColorRgba::RED);
        assert_eq!(dest.borrow().get_pixel(1, 1), ColorRgba::RED);
        // Last column samples past the source edge
        assert!(dest.borrow().get_pixel(3, 0).a < 255);
    }

    #[test]
    fn test_linear_remap() {
        let src = shared(3, 2);
        for (i, x, y) in [(1u8, 0, 0), (2, 2, 0), (3, 1, 1)] {
            src.borrow_mut().set_pixel_rewrite(x, y, ColorRgba::new(255, i, 0, 0));
        }
        let dest = shared(6, 1);
        let mut remap = Remap::linear_2d_to_1d();
        bind(&mut remap, &dest, &src);
        assert!(remap.render_base().is_some_and(|b| b.matrix_dest.is_some()));
        remap.render(&mut RandGen::default(), 0);
        let d = dest.borrow();
        assert_eq!(d.get_pixel(0, 0).r, 1);
        assert_eq!(d.get_pixel(2, 0).r, 2);
        assert_eq!(d.get_pixel(4, 0).r, 3);
    }

    #[test]
    fn test_linear_remap_rejects_bad_dest() {
        let src = shared(3, 2);
        let dest = shared(5, 1);
        let mut remap = Remap::linear_2d_to_1d();
        bind(&mut remap, &dest, &src);
        assert!(remap.render_base().is_some_and(|b| b.matrix_dest.is_none()));
        remap.render(&mut RandGen::default(), 0);
    }

    #[test]
    fn test_remap_by_index_matrix() {
        let src = shared(2, 1);
        src.borrow_mut().set_pixel_rewrite(0, 0, ColorRgba::RED);
        src.borrow_mut().set_pixel_rewrite(1, 0, ColorRgba::GREEN);
        let index = shared(2, 1);
        // (0,0) -> (3,2), (1,0) -> (0,1)
        index.borrow_mut().set_pixel_rewrite(0, 0, ColorRgba::new(0, 2, 0, 3));
        index.borrow_mut().set_pixel_rewrite(1, 0, ColorRgba::new(0, 1, 0, 0));
        let dest = shared(4, 4);

        let mut remap = Remap::by_index_matrix();
        bind(&mut remap, &dest, &src);
        assert!(write_property(&mut remap, PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(false)));
        assert!(write_property(&mut remap, PROP_RECT_DEST, PropValue::Rect(Rect::from_size(4, 4))));
        assert!(write_property(&mut remap, Remap::PROP_INDEX_MATRIX, PropValue::Matrix(Some(index))));
        assert!(write_property(&mut remap, PROP_REWRITE, PropValue::Bool(true)));
        remap.render(&mut RandGen::default(), 0);
        let d = dest.borrow();
        assert_eq!(d.get_pixel(3, 2), ColorRgba::RED);
        assert_eq!(d.get_pixel(0, 1), ColorRgba::GREEN);
        assert_eq!(d.get_pixel(0, 0), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_index_matrix_only_in_index_mode() {
        let mut remap = Remap::by_table(vec![(0, 0)]);
        assert!(!write_property(&mut remap, Remap::PROP_INDEX_MATRIX, PropValue::Matrix(None)));
    }

    #[test]
    fn test_remap_by_table_uses_dest_offset() {
        let src = checker(2, 1);
        let dest = shared(5, 5);
        let mut remap = Remap::by_table(vec![(0, 0), (0, 1)]);
        bind(&mut remap, &dest, &src);
        assert!(write_property(&mut remap, PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(false)));
        assert!(write_property(&mut remap, PROP_RECT_DEST, PropValue::Rect(Rect::new(1, 2, 3, 3))));
        remap.render(&mut RandGen::default(), 0);
        let d = dest.borrow();
        assert_eq!(d.get_pixel(1, 2), ColorRgba::WHITE);
        assert_eq!(d.get_pixel(1, 3), ColorRgba::BLACK);
        assert_eq!(d.get_pixel(2, 1), ColorRgba::TRANSPARENT);
    }
}
