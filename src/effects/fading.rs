//! Post-frame trails: the composed frame is blended with a slowly fading copy of earlier frames

use log::debug;

use super::props::*;
use super::{base_property_info, ClassFamily, Effect, RenderBase, Time};
use crate::color::{mul8, ColorRgba};
use crate::display::{Matrix, MatrixPixels};
use crate::util::RandGen;

/// Milliseconds per fade step
const FADE_INTERVAL: Time = 32;
/// Catch-up steps applied at most after a long gap between frames
const MAX_FADE_STEPS: Time = 32;
/// Trail alpha accumulated per frame in overlay mode
const ACCUMULATE_ALPHA: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeMode {
    /// The current frame is drawn over the fading trail
    #[default]
    Background,
    /// The trail builds up slowly and is shown over the current frame
    Overlay,
}

/// Post-frame trail: keeps a faded copy of past frames and mixes it into
/// every finished frame
pub struct SlowFading {
    base: RenderBase,
    mode: FadeMode,
    /// Trail strength, higher fades slower
    pub fade_alpha: u8,
    /// How much of the current frame shows through directly in overlay mode
    pub direct_alpha: u8,
    trail: MatrixPixels,
    last_fade: Option<Time>,
}

impl SlowFading {
    pub const PROP_FADE_ALPHA: u8 = PROP_BASE_LAST + 1;
    pub const PROP_DIRECT_ALPHA: u8 = PROP_BASE_LAST + 2;

    pub fn new(mode: FadeMode) -> Self {
        let fade_alpha = match mode {
            FadeMode::Background => 224,
            FadeMode::Overlay => 240,
        };
        Self {
            base: RenderBase::new("SlowFading"),
            mode,
            fade_alpha,
            direct_alpha: 0,
            trail: MatrixPixels::default(),
            last_fade: None,
        }
    }

    pub fn background() -> Self {
        Self::new(FadeMode::Background)
    }

    pub fn overlay() -> Self {
        Self::new(FadeMode::Overlay)
    }

    pub fn mode(&self) -> FadeMode {
        self.mode
    }

    pub fn trail(&self) -> &MatrixPixels {
        &self.trail
    }

    /// Per-step alpha multiplier. The decay is squared so low settings
    /// still leave a visible trail.
    fn fade_mul(&self) -> u8 {
        let decay = 255 - self.fade_alpha;
        255 - mul8(decay, decay)
    }

    fn fade_trail(&mut self) {
        let mul = self.fade_mul();
        for y in 0..self.trail.height() as i32 {
            for x in 0..self.trail.width() as i32 {
                let pixel = self.trail.get_pixel(x, y);
                if pixel.a == 0 {
                    continue;
                }
                let a = if pixel.a < 4 { 0 } else { mul8(pixel.a, mul) };
                if a != pixel.a {
                    self.trail.set_pixel_rewrite(x, y, pixel.with_raw_alpha(a));
                }
            }
        }
    }

    fn advance(&mut self, time: Time) {
        let Some(last) = self.last_fade else {
            self.last_fade = Some(time);
            return;
        };
        let steps = time.wrapping_sub(last) / FADE_INTERVAL;
        if steps == 0 {
            return;
        }
        for _ in 0..steps.min(MAX_FADE_STEPS) {
            self.fade_trail();
        }
        self.last_fade = Some(if steps > MAX_FADE_STEPS {
            time
        } else {
            last.wrapping_add(steps * FADE_INTERVAL)
        });
    }
}

impl Default for SlowFading {
    fn default() -> Self {
        Self::background()
    }
}

impl Effect for SlowFading {
    fn class_family(&self) -> ClassFamily {
        ClassFamily::PostFrame
    }

    fn property_count(&self) -> u8 {
        Self::PROP_DIRECT_ALPHA
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        match index {
            Self::PROP_FADE_ALPHA => Some(PropInfo::new(PropType::UInt8, "Fade alpha")),
            Self::PROP_DIRECT_ALPHA if self.mode == FadeMode::Overlay => {
                Some(PropInfo::new(PropType::UInt8, "Direct alpha"))
            },
            Self::PROP_DIRECT_ALPHA => Some(PropInfo::disabled(PropType::UInt8, "Direct alpha")),
            _ => base_property_info(index),
        }
    }

    fn property(&self, index: u8) -> PropValue {
        match index {
            Self::PROP_FADE_ALPHA => PropValue::UInt8(self.fade_alpha),
            Self::PROP_DIRECT_ALPHA => PropValue::UInt8(self.direct_alpha),
            _ => self.base.property(index),
        }
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        let slot = match index {
            Self::PROP_FADE_ALPHA => &mut self.fade_alpha,
            Self::PROP_DIRECT_ALPHA => &mut self.direct_alpha,
            _ => return self.base.set_property(index, value),
        };
        value.as_u8().map(|v| *slot = v).is_some()
    }

    fn on_frame_done(&mut self, frame: &mut MatrixPixels, _rng: &mut RandGen, time: Time) {
        if self.base.disabled {
            return;
        }
        let (w, h) = (frame.width(), frame.height());
        if w == 0 || h == 0 {
            self.trail = MatrixPixels::default();
            return;
        }
        if self.trail.width() != w || self.trail.height() != h {
            self.trail = MatrixPixels::new(w, h);
            debug!("{}: trail buffer {}x{}", self.base.class_name, w, h);
        }
        self.base.rect_dest = frame.rect();

        self.advance(time);

        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let cur = frame.get_pixel(x, y);
                let trail = self.trail.get_pixel(x, y);
                let out = match self.mode {
                    FadeMode::Background => {
                        let out = ColorRgba::source_over(trail, cur);
                        self.trail.set_pixel_rewrite(x, y, out);
                        out
                    },
                    FadeMode::Overlay => {
                        let acc = ColorRgba::source_over_alpha(trail, cur, ACCUMULATE_ALPHA);
                        self.trail.set_pixel_rewrite(x, y, acc);
                        ColorRgba::source_over_alpha(acc, cur, self.direct_alpha)
                    },
                };
                frame.set_pixel_rewrite(x, y, out);
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

    fn frame_with_red() -> MatrixPixels {
        let mut f = MatrixPixels::new(3, 2);
        f.set_pixel_rewrite(0, 0, ColorRgba::RED);
        f
    }

    #[test]
    fn test_defaults_per_mode() {
        assert_eq!(SlowFading::background().fade_alpha, 224);
        assert_eq!(SlowFading::overlay().fade_alpha, 240);
        let mut bg = SlowFading::background();
        assert!(!write_property(&mut bg, SlowFading::PROP_DIRECT_ALPHA, PropValue::UInt8(9)));
        let mut ov = SlowFading::overlay();
        assert!(write_property(&mut ov, SlowFading::PROP_DIRECT_ALPHA, PropValue::UInt8(9)));
        assert_eq!(ov.direct_alpha, 9);
        assert_eq!(ov.class_family(), ClassFamily::PostFrame);
        assert!(ov.query_class_family(ClassFamily::Pipe));
    }

    #[test]
    fn test_background_trail_fades() {
        let mut fx = SlowFading::background();
        let mut rng = RandGen::default();
        let mut frame = frame_with_red();
        fx.on_frame_done(&mut frame, &mut rng, 1000);
        assert_eq!(frame.get_pixel(0, 0), ColorRgba::RED);

        // One step later, the red pixel is gone from the frame but the trail shows
        let mut frame = MatrixPixels::new(3, 2);
        fx.on_frame_done(&mut frame, &mut rng, 1032);
        let expected = mul8(255, 255 - mul8(31, 31));
        assert_eq!(frame.get_pixel(0, 0), ColorRgba::RED.with_raw_alpha(expected));
        assert_eq!(frame.get_pixel(1, 0), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_no_fade_within_interval() {
        let mut fx = SlowFading::background();
        let mut rng = RandGen::default();
        fx.on_frame_done(&mut frame_with_red(), &mut rng, 0);
        let mut frame = MatrixPixels::new(3, 2);
        fx.on_frame_done(&mut frame, &mut rng, 31);
        assert_eq!(frame.get_pixel(0, 0), ColorRgba::RED);
    }

    #[test]
    fn test_long_gap_clears_trail() {
        let mut fx = SlowFading::background();
        assert!(write_property(&mut fx, SlowFading::PROP_FADE_ALPHA, PropValue::UInt8(128)));
        let mut rng = RandGen::default();
        fx.on_frame_done(&mut frame_with_red(), &mut rng, 0);
        let mut frame = MatrixPixels::new(3, 2);
        fx.on_frame_done(&mut frame, &mut rng, 60_000);
        assert_eq!(frame.get_pixel(0, 0).a, 0);
    }

    #[test]
    fn test_overlay_reveals_slowly() {
        let mut fx = SlowFading::overlay();
        let mut rng = RandGen::default();
        let mut frame = frame_with_red();
        fx.on_frame_done(&mut frame, &mut rng, 0);
        // Only the accumulated share is visible with direct alpha 0
        assert_eq!(frame.get_pixel(0, 0).a, ACCUMULATE_ALPHA);

        let mut alpha = 0;
        for t in 1..40 {
            let mut frame = frame_with_red();
            fx.on_frame_done(&mut frame, &mut rng, t);
            let a = frame.get_pixel(0, 0).a;
            assert!(a >= alpha);
            alpha = a;
        }
        assert!(alpha > ACCUMULATE_ALPHA);
    }

    #[test]
    fn test_trail_follows_frame_size() {
        let mut fx = SlowFading::background();
        let mut rng = RandGen::default();
        fx.on_frame_done(&mut MatrixPixels::new(4, 4), &mut rng, 0);
        assert_eq!(fx.trail().rect(), MatrixPixels::new(4, 4).rect());
        fx.on_frame_done(&mut MatrixPixels::new(2, 5), &mut rng, 10);
        assert_eq!((fx.trail().width(), fx.trail().height()), (2, 5));
    }

    #[test]
    fn test_disabled_leaves_frame() {
        let mut fx = SlowFading::overlay();
        assert!(write_property(&mut fx, PROP_DISABLED, PropValue::Bool(true)));
        let mut frame = frame_with_red();
        fx.on_frame_done(&mut frame, &mut RandGen::default(), 0);
        assert_eq!(frame, frame_with_red());
    }
}
