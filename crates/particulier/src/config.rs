//! Scene configuration parsed from TOML
//!
//! ```toml
//! [[system]]
//! name = "fountain"
//! capacity = 2000
//! force = [0, -10, 0]
//!
//! [[system.emitter]]
//! velocity_min = [-10, 20, -10]
//! velocity_max = [10, 40, 10]
//! rate = 10
//! ```

use std::path::Path;

use particulier_core::{ParticulierError, Result};

use crate::backend::ParticleKind;
use crate::system::DEFAULT_FORCE;

/// Configuration for one emitter, parsed from a `[[system.emitter]]` table
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// Initial anchor position in world space
    pub position: [f32; 3],
    pub offset_min: [f32; 3],
    pub offset_max: [f32; 3],
    pub velocity_min: [f32; 3],
    pub velocity_max: [f32; 3],
    pub color_min: [f32; 3],
    pub color_max: [f32; 3],
    pub alpha: f32,
    pub scale: [f32; 2],
    /// Lifespan in seconds
    pub life: f32,
    /// Spawns per frame when driven by a frame loop
    pub rate: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            offset_min: [-1.0, 0.0, -1.0],
            offset_max: [1.0, 0.0, 1.0],
            velocity_min: [-10.0, 20.0, -10.0],
            velocity_max: [10.0, 40.0, 10.0],
            color_min: [0.0, 0.5, 1.0],
            color_max: [0.0, 1.0, 1.0],
            alpha: 0.3,
            scale: [0.3, 0.3],
            life: 3.0,
            rate: 10,
        }
    }
}

impl EmitterConfig {
    /// Parse from a TOML table. Missing or malformed keys keep their defaults.
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("position") {
            config.position = toml_vec3(v, config.position);
        }
        if let Some(v) = table.get("offset_min") {
            config.offset_min = toml_vec3(v, config.offset_min);
        }
        if let Some(v) = table.get("offset_max") {
            config.offset_max = toml_vec3(v, config.offset_max);
        }
        if let Some(v) = table.get("velocity_min") {
            config.velocity_min = toml_vec3(v, config.velocity_min);
        }
        if let Some(v) = table.get("velocity_max") {
            config.velocity_max = toml_vec3(v, config.velocity_max);
        }
        if let Some(v) = table.get("color_min") {
            config.color_min = toml_vec3(v, config.color_min);
        }
        if let Some(v) = table.get("color_max") {
            config.color_max = toml_vec3(v, config.color_max);
        }
        if let Some(v) = table.get("alpha") {
            config.alpha = toml_f32(v, config.alpha);
        }
        if let Some(v) = table.get("scale") {
            config.scale = toml_vec2(v, config.scale);
        }
        if let Some(v) = table.get("life") {
            config.life = toml_f32(v, config.life);
        }
        if let Some(v) = table.get("rate") {
            config.rate = v.as_integer().unwrap_or(config.rate as i64).max(0) as u32;
        }

        config
    }
}

/// Configuration for one particle system and the emitters feeding it
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    pub name: String,
    pub capacity: usize,
    pub force: [f32; 3],
    pub kind: ParticleKind,
    pub emitters: Vec<EmitterConfig>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: String::from("particles"),
            capacity: 1000,
            force: DEFAULT_FORCE,
            kind: ParticleKind::Quad,
            emitters: Vec::new(),
        }
    }
}

impl SystemConfig {
    /// Parse from a `[[system]]` table. Fails only on a non-positive capacity.
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = table.get("name").and_then(|v| v.as_str()) {
            config.name = name.to_string();
        }
        if let Some(v) = table.get("capacity") {
            let n = v
                .as_integer()
                .ok_or_else(|| ParticulierError::Config(format!("capacity must be an integer, got {v}")))?;
            config.capacity = match usize::try_from(n) {
                Ok(0) | Err(_) => return Err(ParticulierError::InvalidCapacity(0)),
                Ok(n) => n,
            };
        }
        if let Some(v) = table.get("force") {
            config.force = toml_vec3(v, config.force);
        }
        if let Some(v) = table.get("kind") {
            config.kind = match v.as_str().unwrap_or("quad") {
                "point" => ParticleKind::Point,
                _ => ParticleKind::Quad,
            };
        }
        if let Some(emitters) = table.get("emitter").and_then(|v| v.as_array()) {
            config.emitters = emitters
                .iter()
                .filter_map(|v| v.as_table())
                .map(EmitterConfig::from_toml)
                .collect();
        }

        Ok(config)
    }
}

/// A full particle scene: every system and its emitters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneConfig {
    pub systems: Vec<SystemConfig>,
}

impl SceneConfig {
    /// The looping fountain: one system, one emitter at the origin
    pub fn fountain() -> Self {
        Self {
            systems: vec![SystemConfig {
                name: String::from("fountain"),
                capacity: 2000,
                emitters: vec![EmitterConfig::default()],
                ..Default::default()
            }],
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let table: toml::value::Table = toml::from_str(source)?;
        let mut systems = Vec::new();
        if let Some(entries) = table.get("system").and_then(|v| v.as_array()) {
            for entry in entries {
                let Some(system) = entry.as_table() else {
                    return Err(ParticulierError::Config(
                        "`system` entries must be tables".to_string(),
                    ));
                };
                systems.push(SystemConfig::from_toml(system)?);
            }
        }
        Ok(Self { systems })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_vec2(v: &toml::Value, default: [f32; 2]) -> [f32; 2] {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 2 {
            return [toml_f32(&arr[0], default[0]), toml_f32(&arr[1], default[1])];
        }
    }
    default
}

fn toml_vec3(v: &toml::Value, default: [f32; 3]) -> [f32; 3] {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 3 {
            return [
                toml_f32(&arr[0], default[0]),
                toml_f32(&arr[1], default[1]),
                toml_f32(&arr[2], default[2]),
            ];
        }
    }
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_emitter_is_the_fountain() {
        let config = EmitterConfig::default();
        assert_eq!(config.velocity_min, [-10.0, 20.0, -10.0]);
        assert_eq!(config.velocity_max, [10.0, 40.0, 10.0]);
        assert_eq!(config.life, 3.0);
        assert!((config.alpha - 0.3).abs() < 1e-6);
    }

    #[test]
    fn parse_scene() {
        let source = r#"
[[system]]
name = "sparks"
capacity = 500
force = [0, -4.5, 0]
kind = "point"

[[system.emitter]]
position = [1, 2, 3]
color_min = [1.0, 0.5, 0.0]
scale = [0.1, 0.2]
life = 1.5
rate = 4

[[system]]
name = "smoke"
"#;
        let scene = SceneConfig::from_toml_str(source).unwrap();
        assert_eq!(scene.systems.len(), 2);

        let sparks = &scene.systems[0];
        assert_eq!(sparks.name, "sparks");
        assert_eq!(sparks.capacity, 500);
        assert_eq!(sparks.kind, ParticleKind::Point);
        assert!((sparks.force[1] + 4.5).abs() < 1e-6);
        assert_eq!(sparks.emitters.len(), 1);

        let emitter = &sparks.emitters[0];
        assert_eq!(emitter.position, [1.0, 2.0, 3.0]);
        assert_eq!(emitter.color_min, [1.0, 0.5, 0.0]);
        assert_eq!(emitter.scale, [0.1, 0.2]);
        assert_eq!(emitter.rate, 4);
        // Untouched keys keep defaults
        assert_eq!(emitter.velocity_max, [10.0, 40.0, 10.0]);

        let smoke = &scene.systems[1];
        assert_eq!(smoke.capacity, 1000);
        assert_eq!(smoke.force, DEFAULT_FORCE);
        assert!(smoke.emitters.is_empty());
    }

    #[test]
    fn non_positive_capacity_fails() {
        for source in ["[[system]]\ncapacity = 0", "[[system]]\ncapacity = -3"] {
            let err = SceneConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, ParticulierError::InvalidCapacity(0)));
        }
    }

    #[test]
    fn malformed_values_fall_back() {
        let table: toml::value::Table =
            toml::from_str("velocity_min = [1, 2]\nlife = \"long\"").unwrap();
        let config = EmitterConfig::from_toml(&table);
        assert_eq!(config.velocity_min, [-10.0, 20.0, -10.0]);
        assert_eq!(config.life, 3.0);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = SceneConfig::from_toml_str("[[system]\n").unwrap_err();
        assert!(matches!(err, ParticulierError::TomlParseError(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ParticulierError::IoError(_)));
    }
}
