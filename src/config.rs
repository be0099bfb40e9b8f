//! JSON scene files: matrix size, seed and an ordered effect stack

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::ColorRgba;
use crate::effects::props::*;
use crate::effects::{
    into_handle, write_property, AverageArea, BouncingPixel, Circle, CircleFast, CircleGradient, Clear,
    DigitalClock, Effect, EffectHandle, Glyph, GradientWaves, GradientWavesFp, MatrixCopy, MatrixSfxSystem,
    Plasma, Point, RandomFlashPoint, Rectangle, Remap, SlowFading, Snowfall, TriangleSimple,
};
use crate::error::{Error, Result};
use crate::fixed::{Fp16, Fp32};
use crate::geometry::Rect;

/// Effect kinds a scene can name
pub const EFFECT_KINDS: &[&str] = &[
    "clear",
    "rectangle",
    "point",
    "triangle_simple",
    "gradient_waves",
    "gradient_waves_fp",
    "plasma",
    "glyph",
    "clock_digit_glyph",
    "digital_clock",
    "circle",
    "circle_fast",
    "circle_gradient",
    "bouncing_pixel",
    "random_flash_point",
    "snowfall",
    "average_area",
    "matrix_copy",
    "remap_2d_to_1d",
    "slow_fading_background",
    "slow_fading_overlay",
];

/// Instantiate an effect by its scene name
pub fn create_effect(kind: &str) -> Option<EffectHandle> {
    let handle = match kind {
        "clear" => into_handle(Clear::new()),
        "rectangle" => into_handle(Rectangle::new()),
        "point" => into_handle(Point::new()),
        "triangle_simple" => into_handle(TriangleSimple::new()),
        "gradient_waves" => into_handle(GradientWaves::new()),
        "gradient_waves_fp" => into_handle(GradientWavesFp::new()),
        "plasma" => into_handle(Plasma::new()),
        "glyph" => into_handle(Glyph::new()),
        "clock_digit_glyph" => into_handle(Glyph::clock_digit()),
        "digital_clock" => into_handle(DigitalClock::new()),
        "circle" => into_handle(Circle::new()),
        "circle_fast" => into_handle(CircleFast::new()),
        "circle_gradient" => into_handle(CircleGradient::new()),
        "bouncing_pixel" => into_handle(BouncingPixel::new()),
        "random_flash_point" => into_handle(RandomFlashPoint::new()),
        "snowfall" => into_handle(Snowfall::new()),
        "average_area" => into_handle(AverageArea::new()),
        "matrix_copy" => into_handle(MatrixCopy::new()),
        "remap_2d_to_1d" => into_handle(Remap::linear_2d_to_1d()),
        "slow_fading_background" => into_handle(SlowFading::background()),
        "slow_fading_overlay" => into_handle(SlowFading::overlay()),
        _ => return None,
    };
    Some(handle)
}

/// Link from one effect property to an earlier effect in the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Property key, e.g. `render_digit`
    pub property: String,
    /// Position of the linked effect
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub kind: String,
    /// Fixed destination rect; autosize is turned off when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub disabled: bool,
    /// Values keyed by property name in snake_case
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkConfig>,
}

impl EffectConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            rect: None,
            disabled: false,
            properties: BTreeMap::new(),
            link: None,
        }
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_link(mut self, property: impl Into<String>, target: usize) -> Self {
        self.link = Some(LinkConfig {
            property: property.into(),
            target,
        });
        self
    }
}

fn default_seed() -> u16 {
    crate::util::RandGen::DEFAULT_SEED
}

/// A complete scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    pub width: u16,
    pub height: u16,
    #[serde(default = "default_seed")]
    pub seed: u16,
    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

impl SceneConfig {
    pub fn new(name: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            seed: default_seed(),
            effects: Vec::new(),
        }
    }

    /// Save scene to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load scene from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Instantiate the matrix and the effect stack
    ///
    /// Pipes read from the scene's own matrix. Unknown property names are
    /// skipped with a warning; values that do not fit a property are errors.
    pub fn build(&self) -> Result<MatrixSfxSystem> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidMatrixSize {
                width: self.width,
                height: self.height,
            });
        }
        let mut system = MatrixSfxSystem::with_seed(self.width, self.height, self.seed);
        let mut handles: Vec<EffectHandle> = Vec::with_capacity(self.effects.len());

        for (position, cfg) in self.effects.iter().enumerate() {
            let handle = create_effect(&cfg.kind).ok_or_else(|| Error::UnknownEffect(cfg.kind.clone()))?;
            if system.add(handle.clone()).is_none() {
                return Err(Error::ManagerFull(cfg.kind.clone()));
            }
            {
                let mut effect = handle.borrow_mut();
                let effect = &mut *effect;
                if effect.property_info(PROP_MATRIX_SOURCE).is_some_and(|i| !i.disabled) {
                    let source = PropValue::Matrix(Some(system.matrix().clone()));
                    write_property(effect, PROP_MATRIX_SOURCE, source);
                }
                configure(effect, cfg, position, &handles)?;
            }
            handles.push(handle);
        }

        debug!("scene '{}' built with {} effects", self.name, handles.len());
        Ok(system)
    }
}

impl Default for SceneConfig {
    /// Plasma backdrop, a clock in the middle and snow on top
    fn default() -> Self {
        let mut scene = Self::new("demo", 32, 16);
        scene.effects = vec![
            EffectConfig::new("plasma").with_property("speed", 0.5),
            // Drawn only through the clock
            EffectConfig::new("clock_digit_glyph")
                .with_property("symbol_color", "#FFFFD200")
                .disabled(),
            EffectConfig::new("digital_clock")
                .with_rect(Rect::new(6, 4, 19, 7))
                .with_property("time", 1234)
                .with_link("render_digit", 1),
            EffectConfig::new("snowfall").with_property("snowflake_count", 12),
        ];
        scene
    }
}

fn configure(effect: &mut dyn Effect, cfg: &EffectConfig, position: usize, built: &[EffectHandle]) -> Result<()> {
    if let Some(rect) = cfg.rect {
        write_property(effect, PROP_RENDER_RECT_AUTOSIZE, PropValue::Bool(false));
        if !write_property(effect, PROP_RECT_DEST, PropValue::Rect(rect)) {
            return Err(invalid(effect, "rect"));
        }
    }

    for (key, json) in &cfg.properties {
        let Some((index, info)) = find_property(effect, key) else {
            warn!("{}: unknown property '{}' ignored", effect.class_name(), key);
            continue;
        };
        let value = prop_value(info.value_type, json).ok_or_else(|| invalid(effect, key))?;
        if !write_property(effect, index, value) {
            return Err(invalid(effect, key));
        }
    }

    if let Some(link) = &cfg.link {
        let target = built
            .get(link.target)
            .filter(|_| link.target < position)
            .ok_or_else(|| invalid(effect, &link.property))?;
        let index = find_property(effect, &link.property)
            .filter(|(_, info)| info.value_type.is_effect_link())
            .map(|(index, _)| index)
            .ok_or_else(|| invalid(effect, &link.property))?;
        if !write_property(effect, index, PropValue::Effect(Some(target.clone()))) {
            return Err(invalid(effect, &link.property));
        }
    }

    // Last, so other writes are not rejected on a disabled effect
    if cfg.disabled {
        write_property(effect, PROP_DISABLED, PropValue::Bool(true));
    }
    Ok(())
}

fn invalid(effect: &dyn Effect, property: &str) -> Error {
    Error::InvalidProperty {
        effect: effect.class_name().to_string(),
        property: property.to_string(),
    }
}

/// Enabled property whose snake_case name is `key`
fn find_property(effect: &dyn Effect, key: &str) -> Option<(u8, PropInfo)> {
    (1..=effect.property_count()).find_map(|index| {
        effect
            .property_info(index)
            .filter(|info| !info.disabled && info.key() == key)
            .map(|info| (index, info))
    })
}

/// Convert a JSON value to a property of type `t`
///
/// Colors are `"#RRGGBB"`, `"#AARRGGBB"` or a packed number; a zero alpha
/// byte reads as opaque. Rects are `{x, y, width, height}` objects.
fn prop_value(t: PropType, json: &Value) -> Option<PropValue> {
    let value = match t {
        PropType::UInt8 => PropValue::UInt8(u8::try_from(json.as_u64()?).ok()?),
        PropType::UInt16 => PropValue::UInt16(u16::try_from(json.as_u64()?).ok()?),
        PropType::UInt32 => PropValue::UInt32(u32::try_from(json.as_u64()?).ok()?),
        PropType::Int8 => PropValue::Int8(i8::try_from(json.as_i64()?).ok()?),
        PropType::Int16 => PropValue::Int16(i16::try_from(json.as_i64()?).ok()?),
        PropType::Int32 => PropValue::Int32(i32::try_from(json.as_i64()?).ok()?),
        PropType::Fp16 => PropValue::Fp16(Fp16::from_f32(json.as_f64()? as f32)),
        PropType::Fp32 => PropValue::Fp32(Fp32::from_f32(json.as_f64()? as f32)),
        PropType::Bool => PropValue::Bool(json.as_bool()?),
        PropType::Str => PropValue::Str(json.as_str()?.to_string()),
        PropType::Color => PropValue::Color(parse_color(json)?),
        PropType::Rect => PropValue::Rect(serde_json::from_value(json.clone()).ok()?),
        _ => return None,
    };
    Some(value)
}

fn parse_color(json: &Value) -> Option<ColorRgba> {
    let packed = match json {
        Value::String(s) => {
            let hex = s.strip_prefix('#').unwrap_or(s);
            if hex.len() != 6 && hex.len() != 8 {
                return None;
            }
            u32::from_str_radix(hex, 16).ok()?
        },
        Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
        _ => return None,
    };
    Some(ColorRgba::from_argb(packed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Matrix;

    #[test]
    fn test_every_kind_instantiates() {
        for kind in EFFECT_KINDS {
            assert!(create_effect(kind).is_some(), "{kind}");
        }
        assert!(create_effect("fire").is_none());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color(&Value::from("#FF0000")), Some(ColorRgba::RED));
        assert_eq!(parse_color(&Value::from("80FFFFFF")), Some(ColorRgba::WHITE.with_raw_alpha(0x80)));
        assert_eq!(parse_color(&Value::from(0x0000FF00u32)), Some(ColorRgba::GREEN));
        assert_eq!(parse_color(&Value::from("#F00")), None);
        assert_eq!(parse_color(&Value::Bool(true)), None);
    }

    #[test]
    fn test_build_fills_matrix() {
        let json = r##"{
            "name": "red",
            "width": 4,
            "height": 3,
            "effects": [
                { "kind": "rectangle", "properties": { "rectangle_color": "#FF0000" } }
            ]
        }"##;
        let scene = SceneConfig::from_json(json).unwrap();
        assert_eq!(scene.seed, crate::util::RandGen::DEFAULT_SEED);
        let mut sys = scene.build().unwrap();
        sys.recalc_and_render(0);
        assert_eq!(sys.frame().get_pixel(3, 2), ColorRgba::RED);
    }

    #[test]
    fn test_rect_and_disabled() {
        let mut scene = SceneConfig::new("t", 6, 6);
        scene.effects.push(EffectConfig::new("rectangle").with_rect(Rect::new(1, 1, 2, 2)));
        scene.effects.push(EffectConfig::new("clear").disabled());
        let mut sys = scene.build().unwrap();
        sys.recalc_and_render(0);
        let frame = sys.frame();
        assert_eq!(frame.get_pixel(1, 1), ColorRgba::WHITE);
        assert_eq!(frame.get_pixel(0, 0), ColorRgba::TRANSPARENT);
        assert_eq!(frame.get_pixel(3, 3), ColorRgba::TRANSPARENT);
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let mut scene = SceneConfig::new("t", 4, 4);
        scene.effects.push(EffectConfig::new("metaballs"));
        assert!(matches!(scene.build(), Err(Error::UnknownEffect(k)) if k == "metaballs"));
    }

    #[test]
    fn test_zero_size_is_error() {
        let scene = SceneConfig::new("t", 0, 4);
        assert!(matches!(scene.build(), Err(Error::InvalidMatrixSize { width: 0, height: 4 })));
    }

    #[test]
    fn test_unknown_property_ignored_bad_value_rejected() {
        let mut scene = SceneConfig::new("t", 4, 4);
        scene.effects.push(EffectConfig::new("snowfall").with_property("wind", 3));
        assert!(scene.build().is_ok());

        scene.effects[0] = EffectConfig::new("snowfall").with_property("restart_fill_percent", 300);
        assert!(matches!(scene.build(), Err(Error::InvalidProperty { .. })));
    }

    #[test]
    fn test_manager_full() {
        let mut scene = SceneConfig::new("t", 2, 2);
        scene.effects = vec![EffectConfig::new("clear"); crate::effects::MAX_EFFECTS + 1];
        assert!(matches!(scene.build(), Err(Error::ManagerFull(_))));
    }

    #[test]
    fn test_link_must_point_backwards() {
        let mut scene = SceneConfig::new("t", 20, 8);
        scene.effects = vec![
            EffectConfig::new("digital_clock").with_link("render_digit", 1),
            EffectConfig::new("glyph"),
        ];
        assert!(matches!(scene.build(), Err(Error::InvalidProperty { .. })));
    }

    #[test]
    fn test_default_scene_builds_and_runs() {
        let scene = SceneConfig::default();
        let mut sys = scene.build().unwrap();
        assert_eq!(sys.manager().len(), 4);
        for t in 0..50u32 {
            sys.recalc_and_render(t * 20);
        }
        assert!(sys.frame().as_argb_slice().iter().all(|&p| p >> 24 == 0xFF));
    }

    #[test]
    fn test_pipe_reads_scene_matrix() {
        let mut scene = SceneConfig::new("t", 4, 4);
        scene.effects = vec![
            EffectConfig::new("rectangle")
                .with_rect(Rect::new(0, 0, 2, 4))
                .with_property("rectangle_color", "#FFFFFF"),
            EffectConfig::new("average_area"),
        ];
        let mut sys = scene.build().unwrap();
        sys.recalc_and_render(0);
        let frame = sys.frame();
        let c = frame.get_pixel(3, 3);
        assert!(c.a > 100 && c.a < 160, "a = {}", c.a);
        assert_eq!(frame.get_pixel(2, 0), c);
        assert_eq!(frame.get_pixel(0, 0).a, 255);
    }

    #[test]
    fn test_json_roundtrip_via_file() {
        let scene = SceneConfig::default();
        let path = std::env::temp_dir().join(format!("alphamatrix-scene-{}.json", std::process::id()));
        scene.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, scene);
        assert!(matches!(SceneConfig::load(&path), Err(Error::Io(_))));
        assert!(matches!(SceneConfig::from_json("{"), Err(Error::Json(_))));
    }
}
