//! Capability groups used to check effect links without downcasting

use super::props::PropType;

/// Closed set of effect capability groups, each with a single parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassFamily {
    ClassBase,
    EffectBase,
    MatrixDest,
    Pipe,
    PostFrame,
    Glyph,
    DigitalClock,
    UserArea,
}

impl ClassFamily {
    pub const fn parent(self) -> Option<ClassFamily> {
        match self {
            ClassFamily::ClassBase => None,
            ClassFamily::EffectBase => Some(ClassFamily::ClassBase),
            ClassFamily::MatrixDest => Some(ClassFamily::EffectBase),
            ClassFamily::Pipe => Some(ClassFamily::MatrixDest),
            ClassFamily::PostFrame => Some(ClassFamily::Pipe),
            ClassFamily::Glyph => Some(ClassFamily::MatrixDest),
            ClassFamily::DigitalClock => Some(ClassFamily::MatrixDest),
            ClassFamily::UserArea => Some(ClassFamily::EffectBase),
        }
    }

    /// True if `self` is `family` or descends from it
    pub fn is_a(self, family: ClassFamily) -> bool {
        let mut current = Some(self);
        while let Some(f) = current {
            if f == family {
                return true;
            }
            current = f.parent();
        }
        false
    }

    pub const fn prop_type(self) -> PropType {
        match self {
            ClassFamily::ClassBase => PropType::ClassBase,
            ClassFamily::EffectBase => PropType::EffectBase,
            ClassFamily::MatrixDest => PropType::EffectMatrixDest,
            ClassFamily::Pipe => PropType::EffectPipe,
            ClassFamily::PostFrame => PropType::EffectPostFrame,
            ClassFamily::Glyph => PropType::EffectGlyph,
            ClassFamily::DigitalClock => PropType::EffectDigitalClock,
            ClassFamily::UserArea => PropType::EffectUserArea,
        }
    }
}
