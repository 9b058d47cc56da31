use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use percent_encoding::percent_decode_str;

use crate::controller::input::KeyBindings;

/// Which set of models the bootstrapper loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneVariant {
    /// Farmhouse with the cat next to it
    #[default]
    Farmhouse,
    Cat,
    Dome,
}

impl SceneVariant {
    pub const ALL: [SceneVariant; 3] = [SceneVariant::Farmhouse, SceneVariant::Cat, SceneVariant::Dome];

    pub fn name(&self) -> &'static str {
        match self {
            SceneVariant::Farmhouse => "farmhouse",
            SceneVariant::Cat => "cat",
            SceneVariant::Dome => "dome",
        }
    }

    /// Models placed in the scene for this variant
    pub fn placements(&self) -> Vec<ModelPlacement> {
        let house = ModelPlacement::new("farmhouse_free.glb", 20.0, Vec3::new(0.0, 0.0, 0.0));
        let cat = ModelPlacement::new("cat_lowpoly.glb", 20.0, Vec3::new(30.0, 0.0, -100.0));
        let dome = ModelPlacement::new("dome.glb", 20.0, Vec3::new(0.0, 0.0, 0.0));
        match self {
            SceneVariant::Farmhouse => vec![house, cat],
            SceneVariant::Cat => vec![cat],
            SceneVariant::Dome => vec![dome],
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SceneVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownVariant(wanted.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown scene variant {0:?} (expected farmhouse, cat or dome)")]
    UnknownVariant(String),
    #[error("unsupported MSAA sample count {0} (expected 1 or 4)")]
    MsaaSamples(u32),
    #[error("movement speed must be a positive finite number, got {0}")]
    MoveSpeed(f32),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// A model file together with where it sits in the world
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlacement {
    /// Path relative to the asset root
    pub path: String,
    pub scale: f32,
    pub position: Vec3,
}

impl ModelPlacement {
    pub fn new(path: &str, scale: f32, position: Vec3) -> Self {
        Self { path: path.to_string(), scale, position }
    }
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            z_near: 1.0,
            z_far: 1000.0,
            position: Vec3::new(-2.0, 40.0, -181.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovementConfig {
    /// Distance travelled per rendered frame while a movement key is held
    pub speed: f32,
    pub bindings: KeyBindings,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { speed: 3.0, bindings: KeyBindings::default() }
    }
}

impl MovementConfig {
    pub fn set_speed(&mut self, speed: f32) -> Result<(), ConfigError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::MoveSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OrbitConfig {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub screen_space_panning: bool,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            screen_space_panning: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShadowConfig {
    pub bias: f32,
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half extent of the orthographic shadow camera
    pub extent: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self { bias: -0.001, map_size: 2048, near: 0.5, far: 500.0, extent: 100.0 }
    }
}

#[derive(Debug, Clone)]
pub struct LightRigConfig {
    pub sun_color: u32,
    pub sun_intensity: f32,
    pub sun_position: Vec3,
    pub sun_target: Vec3,
    pub shadow: Option<ShadowConfig>,
    pub ambient_color: u32,
}

impl Default for LightRigConfig {
    fn default() -> Self {
        Self {
            sun_color: 0xFFFFFF,
            sun_intensity: 1.0,
            sun_position: Vec3::new(20.0, 100.0, 10.0),
            sun_target: Vec3::ZERO,
            shadow: Some(ShadowConfig::default()),
            ambient_color: 0x101010,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroundConfig {
    pub width: f32,
    pub depth: f32,
    pub segments: u32,
    pub color: u32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self { width: 500.0, depth: 500.0, segments: 10, color: 0xFFFFFF }
    }
}

/// Cube map face images in +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone)]
pub struct SkyboxConfig {
    pub faces: [String; 6],
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            faces: ["posx.jpg", "negx.jpg", "posy.jpg", "negy.jpg", "posz.jpg", "negz.jpg"]
                .map(String::from),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub msaa_samples: u32,
    /// Background until the skybox finishes loading
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { msaa_samples: 4, clear_color: [0.0, 0.0, 0.0, 1.0] }
    }
}

impl RenderConfig {
    pub fn set_msaa_samples(&mut self, samples: u32) -> Result<(), ConfigError> {
        match samples {
            1 | 4 => {
                self.msaa_samples = samples;
                Ok(())
            }
            other => Err(ConfigError::MsaaSamples(other)),
        }
    }
}

/// Everything the bootstrapper needs to assemble a scene
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub variant: SceneVariant,
    pub asset_root: String,
    pub camera: CameraConfig,
    pub movement: MovementConfig,
    pub orbit: OrbitConfig,
    pub lights: LightRigConfig,
    pub ground: GroundConfig,
    pub skybox: SkyboxConfig,
    pub models: Vec<ModelPlacement>,
    pub render: RenderConfig,
}

impl ViewerConfig {
    pub fn for_variant(variant: SceneVariant) -> Self {
        Self {
            variant,
            asset_root: "resources".to_string(),
            camera: CameraConfig::default(),
            movement: MovementConfig::default(),
            orbit: OrbitConfig::default(),
            lights: LightRigConfig::default(),
            ground: GroundConfig::default(),
            skybox: SkyboxConfig::default(),
            models: variant.placements(),
            render: RenderConfig::default(),
        }
    }

    /// Apply `key=value` overrides, as found in a browser query string.
    /// Values are percent-decoded and `+` reads as a space.
    pub fn apply_query(&mut self, query: &str) -> Result<(), ConfigError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_query_value(raw).ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            })?;
            let value = value.as_str();
            match key {
                "variant" => {
                    let variant = value.parse::<SceneVariant>()?;
                    self.variant = variant;
                    self.models = variant.placements();
                }
                "assets" => self.asset_root = value.trim_end_matches('/').to_string(),
                "speed" => {
                    let speed = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
                    self.movement.set_speed(speed)?;
                }
                "msaa" => {
                    let samples = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
                    self.render.set_msaa_samples(samples)?;
                }
                other => tracing::debug!(key = other, "ignoring unknown query parameter"),
            }
        }
        Ok(())
    }
}

/// `None` when the decoded bytes are not UTF-8
fn decode_query_value(raw: &str) -> Option<String> {
    let raw = raw.replace('+', " ");
    percent_decode_str(&raw).decode_utf8().ok().map(|v| v.into_owned())
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::for_variant(SceneVariant::default())
    }
}

/// sRGB transfer function inverse for one channel in `0.0..=1.0`
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a `0xRRGGBB` sRGB color into linear RGB
pub fn srgb_hex_to_linear(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xFF) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_parsing_is_case_insensitive() {
        assert_eq!("Dome".parse::<SceneVariant>(), Ok(SceneVariant::Dome));
        assert_eq!(" cat ".parse::<SceneVariant>(), Ok(SceneVariant::Cat));
        assert_eq!(
            "castle".parse::<SceneVariant>(),
            Err(ConfigError::UnknownVariant("castle".to_string()))
        );
    }

    #[test]
    fn variants_pick_their_models() {
        let farm = ViewerConfig::for_variant(SceneVariant::Farmhouse);
        let paths: Vec<_> = farm.models.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["farmhouse_free.glb", "cat_lowpoly.glb"]);
        assert_eq!(farm.models[1].position, Vec3::new(30.0, 0.0, -100.0));

        let dome = ViewerConfig::for_variant(SceneVariant::Dome);
        assert_eq!(dome.models.len(), 1);
        assert_eq!(dome.models[0].path, "dome.glb");
    }

    #[test]
    fn query_overrides() {
        let mut config = ViewerConfig::default();
        config.apply_query("?variant=cat&assets=static/res/&speed=5&msaa=1&foo=bar").unwrap();
        assert_eq!(config.variant, SceneVariant::Cat);
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.asset_root, "static/res");
        assert_eq!(config.movement.speed, 5.0);
        assert_eq!(config.render.msaa_samples, 1);

        assert!(config.apply_query("msaa=3").is_err());
        assert!(config.apply_query("speed=fast").is_err());
    }

    #[test]
    fn query_rejects_unusable_speeds() {
        let mut config = ViewerConfig::default();
        for bad in ["speed=NaN", "speed=inf", "speed=-3", "speed=0"] {
            assert!(
                matches!(config.apply_query(bad), Err(ConfigError::MoveSpeed(_))),
                "{bad} should be rejected"
            );
        }
        assert_eq!(config.movement.speed, 3.0);
    }

    #[test]
    fn set_speed_keeps_previous_value_on_error() {
        let mut movement = MovementConfig::default();
        movement.set_speed(0.25).unwrap();
        assert_eq!(movement.speed, 0.25);
        assert!(movement.set_speed(f32::NEG_INFINITY).is_err());
        assert_eq!(movement.speed, 0.25);
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let mut config = ViewerConfig::default();
        config.apply_query("assets=my%20dir%2Fmodels&variant=d%6Fme").unwrap();
        assert_eq!(config.asset_root, "my dir/models");
        assert_eq!(config.variant, SceneVariant::Dome);

        config.apply_query("assets=scene+one").unwrap();
        assert_eq!(config.asset_root, "scene one");

        assert!(matches!(
            config.apply_query("assets=%FF"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn hex_colors_convert_to_linear() {
        assert_eq!(srgb_hex_to_linear(0xFFFFFF), Vec3::ONE);
        assert_eq!(srgb_hex_to_linear(0x000000), Vec3::ZERO);
        let dim = srgb_hex_to_linear(0x101010);
        assert!(dim.x > 0.0 && dim.x < 0.01, "0x10 should be very dark in linear space: {dim}");
    }
}
