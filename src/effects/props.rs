//! Property metadata and values
//!
//! Every effect exposes a table of properties with 1-based indices. Index 0
//! is never valid. Indices 1 to 15 are shared by all effects and start out
//! disabled. Each effect type enables the ones it uses and appends its own
//! from 16 on.

use std::fmt;
use std::rc::Rc;

use super::family::ClassFamily;
use super::{same_effect, EffectHandle, SharedMatrix};
use crate::color::ColorRgba;
use crate::display::Matrix;
use crate::fixed::{Fp16, Fp32};
use crate::geometry::Rect;

pub const PROP_CLASS_NAME: u8 = 1;
pub const PROP_MATRIX_DEST: u8 = 2;
pub const PROP_RECT_DEST: u8 = 3;
pub const PROP_RENDER_RECT_AUTOSIZE: u8 = 4;
pub const PROP_DISABLED: u8 = 5;
pub const PROP_SCALE: u8 = 6;
pub const PROP_SPEED: u8 = 7;
pub const PROP_ALPHA: u8 = 8;
pub const PROP_COLOR: u8 = 9;
pub const PROP_COLOR2: u8 = 10;
pub const PROP_COLOR3: u8 = 11;
pub const PROP_COLOR_BACKGROUND: u8 = 12;
pub const PROP_MATRIX_SOURCE: u8 = 13;
pub const PROP_RECT_SOURCE: u8 = 14;
pub const PROP_REWRITE: u8 = 15;
/// Last shared index; type-specific properties follow
pub const PROP_BASE_LAST: u8 = PROP_REWRITE;

/// Value tag of a property
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropType {
    None = 0,
    UInt8 = 1,
    UInt16 = 2,
    UInt32 = 3,
    Int8 = 4,
    Int16 = 5,
    Int32 = 6,
    Fp16 = 7,
    Fp32 = 8,
    Bool = 9,
    Ptr = 10,
    StrConst = 11,
    Str = 12,
    Matrix = 13,
    Rect = 14,
    Color = 15,
    ClassBase = 25,
    EffectBase = 32,
    EffectMatrixDest = 33,
    EffectPipe = 34,
    EffectPostFrame = 35,
    EffectGlyph = 36,
    EffectDigitalClock = 37,
    EffectUserArea = 64,
}

impl PropType {
    /// Family required by an effect-link property, `None` for plain values
    pub const fn as_family(self) -> Option<ClassFamily> {
        match self {
            PropType::ClassBase => Some(ClassFamily::ClassBase),
            PropType::EffectBase => Some(ClassFamily::EffectBase),
            PropType::EffectMatrixDest => Some(ClassFamily::MatrixDest),
            PropType::EffectPipe => Some(ClassFamily::Pipe),
            PropType::EffectPostFrame => Some(ClassFamily::PostFrame),
            PropType::EffectGlyph => Some(ClassFamily::Glyph),
            PropType::EffectDigitalClock => Some(ClassFamily::DigitalClock),
            PropType::EffectUserArea => Some(ClassFamily::UserArea),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_effect_link(self) -> bool {
        self.as_family().is_some()
    }
}

/// Metadata for one property slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropInfo {
    pub value_type: PropType,
    pub name: &'static str,
    pub desc: Option<&'static str>,
    pub read_only: bool,
    pub disabled: bool,
}

impl PropInfo {
    /// Enabled, writable property
    pub const fn new(value_type: PropType, name: &'static str) -> Self {
        Self {
            value_type,
            name,
            desc: None,
            read_only: false,
            disabled: false,
        }
    }

    /// Slot that exists but is not used by this effect
    pub const fn disabled(value_type: PropType, name: &'static str) -> Self {
        Self {
            disabled: true,
            ..Self::new(value_type, name)
        }
    }

    pub const fn read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    pub const fn hidden(self) -> Self {
        Self {
            disabled: true,
            ..self
        }
    }

    pub const fn with_desc(self, desc: &'static str) -> Self {
        Self {
            desc: Some(desc),
            ..self
        }
    }

    /// Name in snake_case, as used by scene files
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(self.name.len());
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                key.push(c.to_ascii_lowercase());
            } else if !key.is_empty() && !key.ends_with('_') {
                key.push('_');
            }
        }
        while key.ends_with('_') {
            key.pop();
        }
        key
    }
}

/// Typed property value
#[derive(Clone)]
pub enum PropValue {
    None,
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Fp16(Fp16),
    Fp32(Fp32),
    Bool(bool),
    StrConst(&'static str),
    Str(String),
    Matrix(Option<SharedMatrix>),
    Rect(Rect),
    Color(ColorRgba),
    /// Link to another effect; the family is checked against the slot's tag
    Effect(Option<EffectHandle>),
}

impl PropValue {
    /// True if this value can be stored in a slot of type `t`
    pub fn matches(&self, t: PropType) -> bool {
        match self {
            PropValue::None => t == PropType::None,
            PropValue::UInt8(_) => t == PropType::UInt8,
            PropValue::UInt16(_) => t == PropType::UInt16,
            PropValue::UInt32(_) => t == PropType::UInt32,
            PropValue::Int8(_) => t == PropType::Int8,
            PropValue::Int16(_) => t == PropType::Int16,
            PropValue::Int32(_) => t == PropType::Int32,
            PropValue::Fp16(_) => t == PropType::Fp16,
            PropValue::Fp32(_) => t == PropType::Fp32,
            PropValue::Bool(_) => t == PropType::Bool,
            PropValue::StrConst(_) => t == PropType::StrConst,
            PropValue::Str(_) => t == PropType::Str,
            PropValue::Matrix(_) => t == PropType::Matrix,
            PropValue::Rect(_) => t == PropType::Rect,
            PropValue::Color(_) => t == PropType::Color,
            PropValue::Effect(_) => t.is_effect_link(),
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match *self {
            PropValue::UInt8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            PropValue::UInt16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            PropValue::UInt32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fp16(&self) -> Option<Fp16> {
        match *self {
            PropValue::Fp16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match *self {
            PropValue::Rect(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<ColorRgba> {
        match *self {
            PropValue::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&SharedMatrix> {
        match self {
            PropValue::Matrix(m) => m.as_ref(),
            _ => None,
        }
    }

    pub fn as_effect(&self) -> Option<&EffectHandle> {
        match self {
            PropValue::Effect(e) => e.as_ref(),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::None, PropValue::None) => true,
            (PropValue::UInt8(a), PropValue::UInt8(b)) => a == b,
            (PropValue::UInt16(a), PropValue::UInt16(b)) => a == b,
            (PropValue::UInt32(a), PropValue::UInt32(b)) => a == b,
            (PropValue::Int8(a), PropValue::Int8(b)) => a == b,
            (PropValue::Int16(a), PropValue::Int16(b)) => a == b,
            (PropValue::Int32(a), PropValue::Int32(b)) => a == b,
            (PropValue::Fp16(a), PropValue::Fp16(b)) => a == b,
            (PropValue::Fp32(a), PropValue::Fp32(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::StrConst(a), PropValue::StrConst(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Matrix(a), PropValue::Matrix(b)) => match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (PropValue::Rect(a), PropValue::Rect(b)) => a == b,
            (PropValue::Color(a), PropValue::Color(b)) => a == b,
            (PropValue::Effect(a), PropValue::Effect(b)) => match (a, b) {
                (Some(a), Some(b)) => same_effect(a, b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::None => write!(f, "None"),
            PropValue::UInt8(v) => write!(f, "UInt8({v})"),
            PropValue::UInt16(v) => write!(f, "UInt16({v})"),
            PropValue::UInt32(v) => write!(f, "UInt32({v})"),
            PropValue::Int8(v) => write!(f, "Int8({v})"),
            PropValue::Int16(v) => write!(f, "Int16({v})"),
            PropValue::Int32(v) => write!(f, "Int32({v})"),
            PropValue::Fp16(v) => write!(f, "Fp16({v})"),
            PropValue::Fp32(v) => write!(f, "Fp32({v})"),
            PropValue::Bool(v) => write!(f, "Bool({v})"),
            PropValue::StrConst(v) => write!(f, "StrConst({v:?})"),
            PropValue::Str(v) => write!(f, "Str({v:?})"),
            PropValue::Matrix(m) => match m {
                Some(m) => match m.try_borrow() {
                    Ok(m) => write!(f, "Matrix({}x{})", m.width(), m.height()),
                    Err(_) => write!(f, "Matrix(<borrowed>)"),
                },
                None => write!(f, "Matrix(None)"),
            },
            PropValue::Rect(r) => write!(f, "Rect({r:?})"),
            PropValue::Color(c) => write!(f, "Color({:#010X})", c.to_argb()),
            PropValue::Effect(e) => match e {
                Some(e) => match e.try_borrow() {
                    Ok(e) => write!(f, "Effect({})", e.class_name()),
                    Err(_) => write!(f, "Effect(<borrowed>)"),
                },
                None => write!(f, "Effect(None)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_type_tags() {
        assert_eq!(PropType::Fp16 as u8, 7);
        assert_eq!(PropType::Color as u8, 15);
        assert_eq!(PropType::EffectGlyph as u8, 36);
        assert_eq!(PropType::EffectUserArea as u8, 64);
        assert!(PropType::EffectPipe.is_effect_link());
        assert!(!PropType::Matrix.is_effect_link());
    }

    #[test]
    fn test_value_matching() {
        assert!(PropValue::UInt8(3).matches(PropType::UInt8));
        assert!(!PropValue::UInt8(3).matches(PropType::UInt16));
        assert!(PropValue::Effect(None).matches(PropType::EffectGlyph));
        assert!(!PropValue::Effect(None).matches(PropType::Ptr));
        assert!(PropValue::Matrix(None).matches(PropType::Matrix));
    }

    #[test]
    fn test_info_key() {
        assert_eq!(PropInfo::new(PropType::UInt16, "Snowflake count").key(), "snowflake_count");
        assert_eq!(PropInfo::new(PropType::Color, "Color 2").key(), "color_2");
        assert_eq!(PropInfo::new(PropType::Bool, "Render rect autosize").key(), "render_rect_autosize");
    }

    #[test]
    fn test_info_builders() {
        let info = PropInfo::new(PropType::UInt8, "Font width").read_only().with_desc("glyph columns");
        assert!(info.read_only);
        assert!(!info.disabled);
        assert_eq!(info.desc, Some("glyph columns"));
        assert!(PropInfo::disabled(PropType::Fp16, "Scale").disabled);
    }
}
