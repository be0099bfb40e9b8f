//! Effects: units that draw into a shared matrix, plus the property model and
//! the scheduler that drives them.

pub mod base;
mod bouncing;
mod circle;
mod clock;
mod fading;
pub mod family;
mod flash;
mod glyph;
mod gradient;
pub mod manager;
mod pipes;
mod plasma;
pub mod props;
mod shapes;
mod snowfall;
pub mod system;

pub use base::{base_property_info, DynamicParams, RenderBase};
pub use bouncing::BouncingPixel;
pub use circle::{Circle, CircleFast, CircleGradient};
pub use clock::DigitalClock;
pub use fading::{FadeMode, SlowFading};
pub use family::ClassFamily;
pub use flash::RandomFlashPoint;
pub use glyph::{Glyph, GlyphStyle};
pub use gradient::{GradientWaves, GradientWavesFp};
pub use manager::{EffectManager, MAX_EFFECTS};
pub use pipes::{AverageArea, MatrixCopy, Remap, RemapMode};
pub use plasma::Plasma;
pub use props::{PropInfo, PropType, PropValue};
pub use shapes::{Clear, Point, Rectangle, TriangleSimple};
pub use snowfall::Snowfall;
pub use system::MatrixSfxSystem;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::warn;

use crate::display::MatrixPixels;
use crate::util::RandGen;
use props::{PROP_BASE_LAST, PROP_CLASS_NAME, PROP_MATRIX_DEST};

/// Caller-supplied millisecond clock. Compare with `wrapping_sub`.
pub type Time = u32;

/// Matrix shared between the system and the effects drawing into it
pub type SharedMatrix = Rc<RefCell<MatrixPixels>>;

/// Owning handle to an effect
pub type EffectHandle = Rc<RefCell<dyn Effect>>;

/// Non-owning link from one effect to another
pub type EffectLink = Weak<RefCell<dyn Effect>>;

/// Trait for all effects
///
/// Properties use 1-based indices. `set_property` only stores a value; go
/// through [`write_property`] to get validation and change notification.
pub trait Effect {
    fn class_name(&self) -> &'static str {
        self.render_base().map_or("EffectBase", |b| b.class_name)
    }

    fn class_family(&self) -> ClassFamily {
        if self.render_base().is_some() {
            ClassFamily::MatrixDest
        } else {
            ClassFamily::EffectBase
        }
    }

    /// True if this effect belongs to `family` or one of its descendants
    fn query_class_family(&self, family: ClassFamily) -> bool {
        self.class_family().is_a(family)
    }

    fn property_count(&self) -> u8 {
        PROP_BASE_LAST
    }

    fn property_info(&self, index: u8) -> Option<PropInfo> {
        base_property_info(index)
    }

    fn property(&self, index: u8) -> PropValue {
        if index == PROP_CLASS_NAME {
            return PropValue::StrConst(self.class_name());
        }
        self.render_base().map_or(PropValue::None, |b| b.property(index))
    }

    fn set_property(&mut self, index: u8, value: PropValue) -> bool {
        self.render_base_mut()
            .is_some_and(|b| b.set_property(index, value))
    }

    /// Called after a property was written. Must only touch state tied to `index`.
    fn on_property_changed(&mut self, index: u8) {
        if let Some(b) = self.render_base_mut() {
            b.on_property_changed(index);
        }
    }

    /// Per-frame state update
    fn recalc(&mut self, _rng: &mut RandGen, _time: Time) {}

    /// Draw one frame into the destination matrix
    fn render(&self, _rng: &mut RandGen, _time: Time) {}

    /// Called with the composed frame, for post-frame effects only
    fn on_frame_done(&mut self, _frame: &mut MatrixPixels, _rng: &mut RandGen, _time: Time) {}

    fn is_disabled(&self) -> bool {
        self.render_base().is_some_and(|b| b.disabled)
    }

    fn render_base(&self) -> Option<&RenderBase> {
        None
    }

    fn render_base_mut(&mut self) -> Option<&mut RenderBase> {
        None
    }

    /// Matrix-destination state if this effect is in that family
    fn query_matrix_dest_mut(&mut self) -> Option<&mut RenderBase> {
        if self.query_class_family(ClassFamily::MatrixDest) {
            self.render_base_mut()
        } else {
            None
        }
    }

    fn query_glyph_mut(&mut self) -> Option<&mut Glyph> {
        None
    }

    /// Bind (or unbind) the destination matrix and notify
    fn set_matrix(&mut self, matrix: Option<SharedMatrix>) {
        let Some(base) = self.render_base_mut() else {
            return;
        };
        base.matrix_dest = matrix;
        self.on_property_changed(PROP_MATRIX_DEST);
    }
}

/// Wrap an effect into a shareable handle
pub fn into_handle<E: Effect + 'static>(effect: E) -> EffectHandle {
    Rc::new(RefCell::new(effect))
}

/// Identity comparison of two handles
#[inline]
pub fn same_effect(a: &EffectHandle, b: &EffectHandle) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// Resolve a link, `None` if the target was dropped
#[inline]
pub fn upgrade_link(link: &Option<EffectLink>) -> Option<EffectHandle> {
    link.as_ref().and_then(Weak::upgrade)
}

/// Validated property write with change notification
///
/// Rejects index 0, indices past the table, read-only or disabled slots and
/// values of the wrong type. An effect link whose target is not in the
/// required family is rejected and the slot is reset to null.
pub fn write_property(effect: &mut dyn Effect, index: u8, value: PropValue) -> bool {
    if index == 0 || index > effect.property_count() {
        warn!("{}: property index {} out of range", effect.class_name(), index);
        return false;
    }
    let Some(info) = effect.property_info(index) else {
        return false;
    };
    if info.read_only || info.disabled {
        warn!("{}: property '{}' is not writable", effect.class_name(), info.name);
        return false;
    }
    if !value.matches(info.value_type) {
        warn!(
            "{}: property '{}' expects {:?}, got {:?}",
            effect.class_name(),
            info.name,
            info.value_type,
            value
        );
        return false;
    }

    if let (Some(family), Some(target)) = (info.value_type.as_family(), value.as_effect()) {
        let accepted = target
            .try_borrow()
            .map(|t| t.query_class_family(family))
            .unwrap_or(false);
        if !accepted {
            warn!(
                "{}: link '{}' requires family {:?}, resetting",
                effect.class_name(),
                info.name,
                family
            );
            effect.set_property(index, PropValue::Effect(None));
            effect.on_property_changed(index);
            return false;
        }
    }

    if !effect.set_property(index, value) {
        return false;
    }
    effect.on_property_changed(index);
    true
}
