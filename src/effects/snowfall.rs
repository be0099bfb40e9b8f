//! Falling snow that piles up in a bitmap and is cleared when the pile
//! gets too high.

use log::{debug, trace};

use super::props::*;
use super::{base_property_info, DynamicParams, Effect, RenderBase, Time};
use crate::color::ColorRgba;
use crate::display::{Matrix, MatrixBoolean};
use crate::fixed::Fp16;
use crate::util::RandGen;

/// Settles between two compaction passes
const COMPACT_INTERVAL: u8 = 10;
const SPAWN_DELAY_MIN: i32 = -5;
const SPAWN_DELAY_MAX: i32 = -1;

/// Flake position in rect-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flake {
    pub x: Fp16,
    pub y: Fp16,
}

impl Flake {
    /// `x == -1` marks a flake that still needs its first spawn
    const FORCE_INIT: Self = Self {
        x: Fp16::from_int(-1),
        y: Fp16::ZERO,
    };

    fn needs_init(&self) -> bool {
        self.x == Self::FORCE_INIT.x
    }

    /// Random column, a few steps above the visible area
    fn spawn(&mut self, rng: &mut RandGen, width: u16) {
        if width == 0 {
            return;
        }
        self.x = Fp16::from_int(i32::from(rng.next_coord_below(width)));
        let delay = rng.next_u8_in_range(0, (SPAWN_DELAY_MAX - SPAWN_DELAY_MIN) as u8);
        self.y = Fp16::from_int(SPAWN_DELAY_MIN + i32::from(delay));
    }
}

/// Settled snow plus the bookkeeping for compaction and clearing
#[derive(Debug, Clone)]
struct SnowPile {
    bitmap: MatrixBoolean,
    filled: u32,
    settles: u8,
    clearing: u16,
    prefer_right: bool,
}

impl SnowPile {
    fn new(width: u16, height: u16) -> Self {
        Self {
            bitmap: MatrixBoolean::new(width, height, true),
            filled: 0,
            settles: 0,
            clearing: 0,
            prefer_right: false,
        }
    }

    fn area(&self) -> u32 {
        u32::from(self.bitmap.width()) * u32::from(self.bitmap.height())
    }

    /// Start clearing once the fill level reaches `percent` of the area
    fn check_restart(&mut self, percent: u8) {
        if self.clearing == 0 && self.filled >= self.area() * u32::from(percent) / 100 {
            self.clearing = self.bitmap.height();
            self.filled = 0;
            if self.clearing > 0 {
                debug!("snowfall: pile full, clearing over {} rows", self.clearing);
            }
        }
    }

    /// Freeze a flake at `(x, y)`
    fn settle(&mut self, x: i32, y: i32) {
        if !self.bitmap.get_value(x, y) {
            self.bitmap.set_value(x, y, true);
            self.filled = (self.filled + 1).min(self.area());
        }
        trace!("snowfall: settled at ({x}, {y}), filled {}", self.filled);

        self.settles += 1;
        if self.settles >= COMPACT_INTERVAL {
            self.compact();
            self.settles = 0;
        }
        if self.clearing > 0 {
            self.shift_down();
            self.clearing -= 1;
        }
    }

    fn move_to(&mut self, x: i32, y: i32, nx: i32, ny: i32) -> bool {
        if self.bitmap.get_value(nx, ny) {
            return false;
        }
        self.bitmap.set_value(x, y, false);
        self.bitmap.set_value(nx, ny, true);
        true
    }

    fn move_side(&mut self, x: i32, y: i32, dir: i32) -> bool {
        let moved = self.move_to(x, y, x + dir, y + 1);
        if moved {
            self.prefer_right = !self.prefer_right;
        }
        moved
    }

    /// One settling pass, bottom to top and right to left. Each cell drops
    /// straight down if it can, otherwise diagonally with alternating side.
    fn compact(&mut self) {
        let (w, h) = (i32::from(self.bitmap.width()), i32::from(self.bitmap.height()));
        for y in (0..h).rev() {
            for x in (0..w).rev() {
                if !self.bitmap.get_value(x, y) || self.move_to(x, y, x, y + 1) {
                    continue;
                }
                let first = if self.prefer_right { 1 } else { -1 };
                let _ = self.move_side(x, y, first) || self.move_side(x, y, -first);
            }
        }
    }

    /// Drop the bottom row and move everything one row down
    fn shift_down(&mut self) {
        let (w, h) = (i32::from(self.bitmap.width()), i32::from(self.bitmap.height()));
        for y in (1..h).rev() {
            for x in 0..w {
                let v = self.bitmap.get_value(x, y - 1);
                self.bitmap.set_value(x, y, v);
            }
        }
        for x in 0..w {
            self.bitmap.set_value(x, 0, false);
        }
    }
}

/// Snowflakes falling in the destination rect and piling up at the bottom
///
/// Falling speed follows `speed`. When the pile covers the restart
/// percentage of the rect, each of the next `height` settles shifts the pile
/// one row down until it is gone.
pub struct Snowfall {
    base: RenderBase,
    params: DynamicParams,
    pub color: ColorRgba,
    pub restart_fill_percent: u8,
    pub smooth_movement: bool,
    flakes: Vec<Flake>,
    pile: Option<SnowPile>,
    last_update: Time,
}

impl Snowfall {
    pub const PROP_COUNT: u8 = PROP_BASE_LAST + 1;
    pub const PROP_RESTART_FILL_PERCENT: u8 = PROP_BASE_LAST + 2;
    pub const PROP_SMOOTH_MOVEMENT: u8 = PROP_BASE_LAST + 3;

    const DEFAULT_COUNT: u16 = 4;

    pub fn new() -> Self {
        Self {
            base: RenderBase::new("Snowfall"),
            params: DynamicParams::default(),
            color: ColorRgba::WHITE,
            restart_fill_percent: 80,
            smooth_movement: true,
            flakes: vec![Flake::FORCE_INIT; usize::from(Self::DEFAULT_COUNT)],
            pile: None,
            last_update: 0,
        }
    }

    pub fn count(&self) -> u16 {
        self.flakes.len() as u16
    }

    pub fn flakes(&self) -> &[Flake] {
        &self.flakes
    }

    /// Settled snow, `None` until a non-empty rect is set
    pub fn bitmap(&self) -> Option<&MatrixBoolean> {
        self.pile.as_ref().map(|p| &p.bitmap)
    }

    pub fn filled(&self) -> u32 {
        self.pile.as_ref().map_or(0, |p| p.filled)
    }

    /// Settles left before clearing ends, 0 when not clearing
    pub fn clearing(&self) -> u16 {
        self.pile.as_ref().map_or(0, |p| p.clearing)
    }

    fn rebuild_pile(&mut self) {
        let r = self.base.rect_dest;
        self.pile = (!r.is_empty()).then(|| SnowPile::new(r.width, r.height));
        self.last_update = 0;
        debug!("{}: snow bitmap reset to {}x{}", self.base.class_name, r.width, r.height);
    }
}

impl Default for Snowfall {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Snowfall {
    fn property_count(&self) -> u8 {
        Self::PROP_SMOOTH_MOVEMENT
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        let info = match index {
            PROP_RENDER_RECT_AUTOSIZE => return base_property_info(index).map(PropInfo::hidden),
            PROP_SCALE | PROP_SPEED => return DynamicParams::property_info(index),
            PROP_COLOR => PropInfo::new(PropType::Color, "Snowflake color"),
            Self::PROP_COUNT => PropInfo::new(PropType::UInt16, "Snowflake count"),
            Self::PROP_RESTART_FILL_PERCENT => PropInfo::new(PropType::UInt8, "Restart fill percent"),
            Self::PROP_SMOOTH_MOVEMENT => PropInfo::new(PropType::Bool, "Smooth movement"),
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
            Self::PROP_COUNT => PropValue::UInt16(self.count()),
            Self::PROP_RESTART_FILL_PERCENT => PropValue::UInt8(self.restart_fill_percent),
            Self::PROP_SMOOTH_MOVEMENT => PropValue::Bool(self.smooth_movement),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        if let Some(ok) = self.params.set_property(index, &value) {
            return ok;
        }
        match (index, value) {
            (PROP_COLOR, PropValue::Color(c)) => self.color = c,
            (Self::PROP_COUNT, PropValue::UInt16(n)) => self.flakes = vec![Flake::FORCE_INIT; usize::from(n)],
            (Self::PROP_RESTART_FILL_PERCENT, PropValue::UInt8(v)) => self.restart_fill_percent = v,
            (Self::PROP_SMOOTH_MOVEMENT, PropValue::Bool(v)) => self.smooth_movement = v,
            (PROP_COLOR | Self::PROP_COUNT | Self::PROP_RESTART_FILL_PERCENT | Self::PROP_SMOOTH_MOVEMENT, _) => {
                return false
            },
            (index, value) => return self.base.set_property(index, value),
        }
        true
    }

    fn on_property_changed(&mut self, index: u8) {
        self.base.on_property_changed(index);
        if matches!(index, PROP_MATRIX_DEST | PROP_RECT_DEST) {
            self.rebuild_pile();
        }
    }

    fn recalc(&mut self, rng: &mut RandGen, time: Time) {
        if self.base.disabled {
            return;
        }
        let width = self.base.rect_dest.width;
        let Some(pile) = self.pile.as_mut() else {
            return;
        };
        if self.base.rect_dest.is_empty() {
            return;
        }

        pile.check_restart(self.restart_fill_percent);

        let step = self.params.step_interval();
        if step == 0 || time.wrapping_sub(self.last_update) < step {
            return;
        }
        self.last_update = time;

        let fall = self.params.speed * Fp16::from_ratio(1, 10);
        for flake in &mut self.flakes {
            if flake.y < Fp16::ZERO {
                flake.y += Fp16::ONE;
                continue;
            }
            if flake.needs_init() {
                flake.spawn(rng, width);
                continue;
            }
            let next = flake.y + fall;
            if pile.bitmap.get_value(flake.x.round_int(), next.round_int()) {
                let (x, y) = (flake.x.round_int(), flake.y.round_int());
                flake.spawn(rng, width);
                pile.settle(x, y);
                continue;
            }
            flake.y = next;
        }
    }

    fn render(&self, _rng: &mut RandGen, _time: Time) {
        let Some(pile) = &self.pile else {
            return;
        };
        let Some((mut m, target)) = self.base.target() else {
            return;
        };
        let r = self.base.rect_dest;

        for y in target.y..target.bottom() {
            for x in target.x..target.right() {
                if pile.bitmap.get_value(x - r.x, y - r.y) {
                    m.set_pixel(x, y, self.color);
                }
            }
        }

        for flake in self.flakes.iter().filter(|f| f.y >= Fp16::ZERO) {
            let gx = Fp16::from_int(r.x) + flake.x;
            let gy = Fp16::from_int(r.y) + flake.y;
            if !target.contains(gx.round_int(), gy.round_int()) {
                continue;
            }
            if self.smooth_movement {
                m.set_pixel_float4(gx, gy, self.color);
            } else {
                m.set_pixel(gx.round_int(), gy.round_int(), self.color);
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
    use crate::effects::{write_property, SharedMatrix};
    use crate::geometry::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bound(w: u16, h: u16) -> (Snowfall, SharedMatrix) {
        let m: SharedMatrix = Rc::new(RefCell::new(MatrixPixels::new(w, h)));
        let mut s = Snowfall::new();
        s.set_matrix(Some(m.clone()));
        (s, m)
    }

    fn run(s: &mut Snowfall, rng: &mut RandGen, ticks: u32) {
        for t in 1..=ticks {
            s.recalc(rng, t * 50);
        }
    }

    #[test]
    fn test_bitmap_follows_rect() {
        let (mut s, _m) = bound(8, 6);
        assert_eq!(s.bitmap().map(|b| (b.width(), b.height())), Some((8, 6)));
        assert!(write_property(&mut s, PROP_RECT_DEST, PropValue::Rect(Rect::new(2, 2, 3, 2))));
        assert_eq!(s.bitmap().map(|b| (b.width(), b.height())), Some((3, 2)));
        assert!(write_property(&mut s, PROP_RECT_DEST, PropValue::Rect(Rect::new(2, 2, 0, 2))));
        assert!(s.bitmap().is_none());
    }

    #[test]
    fn test_count_resets_flakes() {
        let mut s = Snowfall::new();
        assert_eq!(s.count(), 4);
        assert!(write_property(&mut s, Snowfall::PROP_COUNT, PropValue::UInt16(10)));
        assert_eq!(s.flakes().len(), 10);
        assert!(s.flakes().iter().all(Flake::needs_init));
        assert!(!write_property(&mut s, PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(false)));
    }

    #[test]
    fn test_spawn_within_width() {
        let mut rng = RandGen::new(7);
        for width in [1u16, 3, 16, 100] {
            for _ in 0..200 {
                let mut f = Flake::FORCE_INIT;
                f.spawn(&mut rng, width);
                let x = f.x.round_int();
                assert!((0..i32::from(width)).contains(&x));
                assert!((SPAWN_DELAY_MIN..=SPAWN_DELAY_MAX).contains(&f.y.round_int()));
            }
        }
    }

    #[test]
    fn test_no_step_before_interval() {
        let (mut s, _m) = bound(4, 4);
        let mut rng = RandGen::default();
        s.recalc(&mut rng, 49);
        assert!(s.flakes().iter().all(Flake::needs_init));
        s.recalc(&mut rng, 50);
        assert!(s.flakes().iter().all(|f| !f.needs_init()));
    }

    #[test]
    fn test_snow_accumulates_and_stays_bounded() {
        let (mut s, _m) = bound(6, 5);
        assert!(write_property(&mut s, Snowfall::PROP_COUNT, PropValue::UInt16(12)));
        assert!(write_property(&mut s, Snowfall::PROP_RESTART_FILL_PERCENT, PropValue::UInt8(100)));
        assert!(write_property(&mut s, PROP_SPEED, PropValue::Fp16(Fp16::from_int(4))));
        let mut rng = RandGen::new(3);
        let mut peak = 0;
        for t in 1..4000u32 {
            s.recalc(&mut rng, t * 13);
            assert!(s.filled() <= 30);
            peak = peak.max(s.filled());
        }
        assert!(peak > 0);
    }

    #[test]
    fn test_clearing_lasts_height_settles() {
        let mut pile = SnowPile::new(4, 3);
        for y in 0..3 {
            for x in 0..4 {
                pile.bitmap.set_value(x, y, true);
            }
        }
        pile.filled = 12;
        pile.check_restart(80);
        assert_eq!(pile.clearing, 3);
        assert_eq!(pile.filled, 0);

        for expected in [2u16, 1, 0] {
            pile.settle(0, 0);
            assert_eq!(pile.clearing, expected);
        }
        // Three shifts push out every pre-existing row
        pile.bitmap.set_value(0, 0, false);
        pile.bitmap.set_value(0, 1, false);
        pile.bitmap.set_value(0, 2, false);
        assert_eq!(pile.bitmap.count_set(), 0);

        pile.settle(1, 2);
        assert_eq!(pile.clearing, 0);
        assert!(pile.bitmap.get_value(1, 2));
    }

    #[test]
    fn test_compact_moves_down_then_sideways() {
        let mut pile = SnowPile::new(3, 3);
        pile.bitmap.set_value(1, 1, true);
        pile.bitmap.set_value(1, 2, true);
        pile.bitmap.set_value(1, 0, true);
        pile.compact();
        // (1,1) slides left and flips the side, then (1,0) drops into the gap
        assert!(pile.bitmap.get_value(0, 2));
        assert!(pile.bitmap.get_value(1, 1));
        assert!(!pile.bitmap.get_value(1, 0));
        assert!(pile.prefer_right);
        assert_eq!(pile.bitmap.count_set(), 3);
    }

    #[test]
    fn test_shift_down() {
        let mut pile = SnowPile::new(2, 3);
        pile.bitmap.set_value(0, 0, true);
        pile.bitmap.set_value(1, 2, true);
        pile.shift_down();
        assert!(pile.bitmap.get_value(0, 1));
        assert!(!pile.bitmap.get_value(0, 0));
        assert!(!pile.bitmap.get_value(1, 2));
    }

    #[test]
    fn test_same_seed_same_pile() {
        let make = || {
            let (mut s, _m) = bound(10, 8);
            let mut rng = RandGen::new(1234);
            run(&mut s, &mut rng, 2000);
            (s.bitmap().cloned(), s.filled(), s.flakes().to_vec())
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_render_draws_pile() {
        let (mut s, m) = bound(4, 4);
        if let Some(p) = s.pile.as_mut() {
            p.bitmap.set_value(2, 3, true);
        }
        s.color = ColorRgba::RED;
        s.render(&mut RandGen::default(), 0);
        assert_eq!(m.borrow().get_pixel(2, 3), ColorRgba::RED);
        assert_eq!(m.borrow().get_pixel(1, 3), ColorRgba::TRANSPARENT);
    }
}
