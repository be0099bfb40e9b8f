//! Effect ownership and scheduling

use log::{debug, warn};

use super::props::PropValue;
use super::{same_effect, ClassFamily, EffectHandle, SharedMatrix, Time};
use crate::util::RandGen;

/// Upper bound on slots in one manager
pub const MAX_EFFECTS: usize = 32;
const MIN_CAPACITY: usize = 4;

/// Owns an ordered list of effects and runs them against one matrix
///
/// Slots grow by doubling from 4 up to [`MAX_EFFECTS`] and shrink again once
/// a quarter of them sit unused.
#[derive(Default)]
pub struct EffectManager {
    effects: Vec<EffectHandle>,
    capacity: usize,
    matrix: Option<SharedMatrix>,
}

impl EffectManager {
    pub fn new(matrix: Option<SharedMatrix>) -> Self {
        Self {
            effects: Vec::new(),
            capacity: 0,
            matrix,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Allocated slot count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn matrix(&self) -> Option<&SharedMatrix> {
        self.matrix.as_ref()
    }

    pub fn get(&self, index: usize) -> Option<&EffectHandle> {
        self.effects.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectHandle> {
        self.effects.iter()
    }

    /// Position of `handle`, compared by identity
    pub fn position(&self, handle: &EffectHandle) -> Option<usize> {
        self.effects.iter().position(|e| same_effect(e, handle))
    }

    fn grow(&mut self) -> bool {
        if self.effects.len() < self.capacity {
            return true;
        }
        if self.capacity >= MAX_EFFECTS {
            return false;
        }
        let new_capacity = (self.capacity * 2).clamp(MIN_CAPACITY, MAX_EFFECTS);
        self.effects.reserve_exact(new_capacity - self.effects.len());
        self.capacity = new_capacity;
        true
    }

    fn shrink(&mut self) {
        let count = self.effects.len();
        if count * 4 > self.capacity * 3 {
            return;
        }
        let target = (count * 2).max(MIN_CAPACITY);
        if target < self.capacity {
            self.effects.shrink_to(target);
            self.capacity = target;
        }
    }

    fn bind(&self, handle: &EffectHandle) {
        let Ok(mut effect) = handle.try_borrow_mut() else {
            warn!("effect busy, matrix not bound");
            return;
        };
        if effect.query_class_family(ClassFamily::MatrixDest) {
            effect.set_matrix(self.matrix.clone());
        }
    }

    /// Append an effect. `None` when the manager is full or already holds it.
    pub fn add(&mut self, handle: EffectHandle) -> Option<usize> {
        if self.position(&handle).is_some() {
            warn!("effect already managed");
            return None;
        }
        if !self.grow() {
            warn!("effect manager full ({MAX_EFFECTS} slots)");
            return None;
        }
        self.bind(&handle);
        if let Ok(e) = handle.try_borrow() {
            debug!("added {} at {}", e.class_name(), self.effects.len());
        }
        self.effects.push(handle);
        Some(self.effects.len() - 1)
    }

    /// Remove and return the effect at `index`, keeping the order of the rest
    pub fn take(&mut self, index: usize) -> Option<EffectHandle> {
        if index >= self.effects.len() {
            return None;
        }
        let handle = self.effects.remove(index);
        debug!("removed effect at {index}");
        self.shrink();
        Some(handle)
    }

    pub fn remove(&mut self, index: usize) -> bool {
        self.take(index).is_some()
    }

    /// Replace the effect at `index`; `None` removes it
    pub fn set(&mut self, index: usize, handle: Option<EffectHandle>) -> bool {
        if index >= self.effects.len() {
            return false;
        }
        let Some(handle) = handle else {
            return self.remove(index);
        };
        if let Some(pos) = self.position(&handle) {
            return pos == index;
        }
        self.bind(&handle);
        self.effects[index] = handle;
        true
    }

    /// Rebind every matrix-destination effect
    pub fn set_matrix(&mut self, matrix: Option<SharedMatrix>) {
        self.matrix = matrix;
        for handle in &self.effects {
            self.bind(handle);
        }
        debug!("rebound {} effects", self.effects.len());
    }

    /// Remove an effect after nulling every link other effects hold to it
    pub fn delete_slow_and_safety(&mut self, index: usize) -> bool {
        let Some(target) = self.effects.get(index).cloned() else {
            return false;
        };
        for (i, owner) in self.effects.iter().enumerate() {
            if i == index {
                continue;
            }
            let Ok(mut owner) = owner.try_borrow_mut() else {
                continue;
            };
            let mut first_cleared = None;
            for prop in 1..=owner.property_count() {
                let is_link = owner
                    .property_info(prop)
                    .is_some_and(|info| info.value_type.is_effect_link());
                if !is_link {
                    continue;
                }
                let points_here = owner
                    .property(prop)
                    .as_effect()
                    .is_some_and(|linked| same_effect(linked, &target));
                if points_here {
                    owner.set_property(prop, PropValue::Effect(None));
                    first_cleared.get_or_insert(prop);
                    debug!("{}: cleared link {} before delete", owner.class_name(), prop);
                }
            }
            // Notify each owner once
            if let Some(prop) = first_cleared {
                owner.on_property_changed(prop);
            }
        }
        self.remove(index)
    }

    /// Drop every effect and release the slots
    pub fn clear_all(&mut self) {
        self.effects = Vec::new();
        self.capacity = 0;
    }

    pub fn recalc(&mut self, rng: &mut RandGen, time: Time) {
        for handle in &self.effects {
            if let Ok(mut e) = handle.try_borrow_mut() {
                if !e.is_disabled() {
                    e.recalc(rng, time);
                }
            }
        }
    }

    pub fn render(&self, rng: &mut RandGen, time: Time) {
        for handle in &self.effects {
            if let Ok(e) = handle.try_borrow() {
                if !e.is_disabled() {
                    e.render(rng, time);
                }
            }
        }
    }

    /// Hand the composed frame to post-frame effects
    pub fn frame_done(&mut self, rng: &mut RandGen, time: Time) {
        let Some(matrix) = &self.matrix else {
            return;
        };
        let Ok(mut frame) = matrix.try_borrow_mut() else {
            warn!("frame busy, post-frame pass skipped");
            return;
        };
        for handle in &self.effects {
            if let Ok(mut e) = handle.try_borrow_mut() {
                if !e.is_disabled() && e.query_class_family(ClassFamily::PostFrame) {
                    e.on_frame_done(&mut frame, rng, time);
                }
            }
        }
    }

    /// Recalc and render in one pass, effect by effect
    pub fn update_and_render_all(&mut self, rng: &mut RandGen, time: Time) {
        for handle in &self.effects {
            if let Ok(mut e) = handle.try_borrow_mut() {
                if e.is_disabled() {
                    continue;
                }
                e.recalc(rng, time);
                e.render(rng, time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Matrix, MatrixPixels};
    use crate::effects::props::*;
    use crate::effects::{into_handle, write_property, Clear, DigitalClock, Effect, Glyph, Rectangle};
    use crate::geometry::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shared(w: u16, h: u16) -> SharedMatrix {
        Rc::new(RefCell::new(MatrixPixels::new(w, h)))
    }

    #[test]
    fn test_add_binds_and_returns_index() {
        let m = shared(4, 2);
        let mut mgr = EffectManager::new(Some(m));
        let rect = into_handle(Rectangle::new());
        assert_eq!(mgr.add(rect.clone()), Some(0));
        assert_eq!(mgr.capacity(), 4);
        assert_eq!(rect.borrow().property(PROP_RECT_DEST), PropValue::Rect(Rect::from_size(4, 2)));
        assert_eq!(mgr.add(rect), None);
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_capacity_growth_and_limit() {
        let mut mgr = EffectManager::new(None);
        for i in 0..MAX_EFFECTS {
            assert_eq!(mgr.add(into_handle(Clear::new())), Some(i));
        }
        assert_eq!(mgr.capacity(), MAX_EFFECTS);
        assert_eq!(mgr.add(into_handle(Clear::new())), None);
        assert_eq!(mgr.len(), MAX_EFFECTS);
    }

    #[test]
    fn test_capacity_doubles() {
        let mut mgr = EffectManager::new(None);
        let mut caps = Vec::new();
        for _ in 0..9 {
            mgr.add(into_handle(Clear::new()));
            caps.push(mgr.capacity());
        }
        assert_eq!(caps, vec![4, 4, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn test_remove_compacts_and_shrinks() {
        let mut mgr = EffectManager::new(None);
        let handles: Vec<_> = (0..8).map(|_| into_handle(Clear::new())).collect();
        for h in &handles {
            mgr.add(h.clone());
        }
        assert_eq!(mgr.capacity(), 8);
        assert!(mgr.remove(1));
        assert!(same_effect(mgr.get(1).unwrap(), &handles[2]));
        assert_eq!(mgr.len(), 7);
        assert_eq!(mgr.capacity(), 8);
        mgr.remove(0);
        mgr.remove(0);
        // 5 of 8 used: 5*4 = 20 <= 24, shrink target 10 is not smaller
        assert_eq!(mgr.capacity(), 8);
        mgr.remove(0);
        mgr.remove(0);
        assert_eq!(mgr.capacity(), 6);
        assert!(!mgr.remove(10));
    }

    #[test]
    fn test_set_replaces_and_removes() {
        let mut mgr = EffectManager::new(Some(shared(2, 2)));
        mgr.add(into_handle(Clear::new()));
        mgr.add(into_handle(Clear::new()));
        let rect = into_handle(Rectangle::new());
        assert!(mgr.set(0, Some(rect.clone())));
        assert!(same_effect(mgr.get(0).unwrap(), &rect));
        assert!(rect.borrow().render_base().is_some_and(|b| b.matrix_dest.is_some()));
        assert!(mgr.set(0, None));
        assert_eq!(mgr.len(), 1);
        assert!(!mgr.set(5, None));
    }

    #[test]
    fn test_delete_slow_and_safety_clears_links() {
        let mut mgr = EffectManager::new(Some(shared(16, 8)));
        let glyph = into_handle(Glyph::new());
        let clock_a = into_handle(DigitalClock::new());
        let clock_b = into_handle(DigitalClock::new());
        mgr.add(glyph.clone());
        mgr.add(clock_a.clone());
        mgr.add(clock_b.clone());
        for clock in [&clock_a, &clock_b] {
            let mut c = clock.borrow_mut();
            assert!(write_property(&mut *c, DigitalClock::PROP_RENDER_DIGIT, PropValue::Effect(Some(glyph.clone()))));
        }

        assert!(mgr.delete_slow_and_safety(0));
        assert_eq!(mgr.len(), 2);
        for clock in [&clock_a, &clock_b] {
            assert_eq!(clock.borrow().property(DigitalClock::PROP_RENDER_DIGIT), PropValue::Effect(None));
        }
    }

    struct TwoLinks {
        first: Option<EffectHandle>,
        second: Option<EffectHandle>,
        notified: Rc<RefCell<Vec<u8>>>,
    }

    impl Effect for TwoLinks {
        fn property_count(&self) -> u8 {
            2
        }

        fn property_info(&self, index: u8) -> Option<PropInfo> {
            match index {
                1 => Some(PropInfo::new(PropType::EffectBase, "First")),
                2 => Some(PropInfo::new(PropType::EffectBase, "Second")),
                _ => None,
            }
        }

        fn property(&self, index: u8) -> PropValue {
            match index {
                1 => PropValue::Effect(self.first.clone()),
                2 => PropValue::Effect(self.second.clone()),
                _ => PropValue::None,
            }
        }

        fn set_property(&mut self, index: u8, value: PropValue) -> bool {
            let PropValue::Effect(link) = value else {
                return false;
            };
            match index {
                1 => self.first = link,
                2 => self.second = link,
                _ => return false,
            }
            true
        }

        fn on_property_changed(&mut self, index: u8) {
            self.notified.borrow_mut().push(index);
        }
    }

    #[test]
    fn test_delete_slow_and_safety_notifies_owner_once() {
        let mut mgr = EffectManager::new(None);
        let target = into_handle(Clear::new());
        let notified = Rc::new(RefCell::new(Vec::new()));
        let owner = into_handle(TwoLinks {
            first: Some(target.clone()),
            second: Some(target.clone()),
            notified: notified.clone(),
        });
        mgr.add(target);
        mgr.add(owner.clone());

        assert!(mgr.delete_slow_and_safety(0));
        assert_eq!(notified.borrow().len(), 1);
        assert_eq!(owner.borrow().property(1), PropValue::Effect(None));
        assert_eq!(owner.borrow().property(2), PropValue::Effect(None));
    }

    #[test]
    fn test_set_matrix_rebinds() {
        let mut mgr = EffectManager::new(Some(shared(2, 2)));
        let rect = into_handle(Rectangle::new());
        mgr.add(rect.clone());
        let bigger = shared(8, 3);
        mgr.set_matrix(Some(bigger.clone()));
        assert_eq!(rect.borrow().property(PROP_RECT_DEST), PropValue::Rect(bigger.borrow().rect()));
    }

    #[test]
    fn test_disabled_effect_skipped() {
        let m = shared(2, 2);
        let mut mgr = EffectManager::new(Some(m.clone()));
        let rect = into_handle(Rectangle::new());
        mgr.add(rect.clone());
        write_property(&mut *rect.borrow_mut(), PROP_DISABLED, PropValue::Bool(true));
        let mut rng = RandGen::default();
        mgr.update_and_render_all(&mut rng, 0);
        assert_eq!(m.borrow().get_pixel(0, 0).a, 0);
    }

    #[test]
    fn test_clear_all() {
        let mut mgr = EffectManager::new(None);
        mgr.add(into_handle(Clear::new()));
        mgr.clear_all();
        assert!(mgr.is_empty());
        assert_eq!(mgr.capacity(), 0);
    }
}
