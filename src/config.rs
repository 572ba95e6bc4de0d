//! Tunables for one run of the game.
//!
//! Every field has a default matching the shipped art and feel, so a partial
//! `config.json` (or none at all) still yields a playable game. The viewport
//! is overwritten with the real canvas size at startup.

use crate::engine::Size;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub viewport: Size,
    pub character: CharacterConfig,
    pub melee: MeleeConfig,
    pub archer: ArcherConfig,
    pub arrow: ArrowConfig,
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterConfig {
    pub size: f32,
    /// scroll offset change per step while a horizontal key is held
    pub scroll_speed: f32,
    pub jump_strength: f32,
    pub gravity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeleeConfig {
    pub enabled: bool,
    pub size: f32,
    pub speed: f32,
    pub spawn_interval_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcherConfig {
    pub enabled: bool,
    pub size: f32,
    pub speed: f32,
    /// world distance walked before settling in to shoot
    pub walk_distance: f32,
    /// steps between arrows
    pub fire_interval: u32,
    /// gap between the archer's feet and the bottom of the viewport
    pub ground_clearance: f32,
    pub spawn_interval_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrowConfig {
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    /// how far past either viewport edge an arrow lives on
    pub despawn_margin: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub source: String,
    /// parallax factor, 1.0 moves with the scroll
    pub speed: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            viewport: Size {
                width: 800.0,
                height: 400.0,
            },
            character: CharacterConfig::default(),
            melee: MeleeConfig::default(),
            archer: ArcherConfig::default(),
            arrow: ArrowConfig::default(),
            layers: vec![
                LayerConfig::new("assets/far-mountain.png", 0.2),
                LayerConfig::new("assets/moremountains.png", 0.4),
                LayerConfig::new("assets/moremountaintrees.png", 0.6),
                LayerConfig::new("assets/mountain-trees.png", 0.8),
            ],
        }
    }
}

impl Default for CharacterConfig {
    fn default() -> Self {
        CharacterConfig {
            size: 75.0,
            scroll_speed: 15.0,
            jump_strength: 20.0,
            gravity: 1.0,
        }
    }
}

impl Default for MeleeConfig {
    fn default() -> Self {
        MeleeConfig {
            enabled: true,
            size: 65.0,
            speed: 3.0,
            spawn_interval_ms: 2000.0,
        }
    }
}

impl Default for ArcherConfig {
    fn default() -> Self {
        ArcherConfig {
            enabled: true,
            size: 120.0,
            speed: 2.0,
            walk_distance: 200.0,
            fire_interval: 60,
            ground_clearance: 10.0,
            spawn_interval_ms: 3000.0,
        }
    }
}

impl Default for ArrowConfig {
    fn default() -> Self {
        ArrowConfig {
            speed: 5.0,
            width: 50.0,
            height: 10.0,
            despawn_margin: 50.0,
        }
    }
}

impl LayerConfig {
    pub fn new(source: &str, speed: f32) -> Self {
        LayerConfig {
            source: source.to_string(),
            speed,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.viewport.width > 0.0 && self.viewport.height > 0.0,
            "viewport must have a positive size, got {:?}",
            self.viewport
        );
        ensure!(self.character.size > 0.0, "character size must be positive");
        ensure!(
            self.viewport.height >= self.character.size
                && self.viewport.height >= self.archer.size + self.archer.ground_clearance
                && self.viewport.height >= self.melee.size,
            "viewport height {} is too short for the characters",
            self.viewport.height
        );
        ensure!(self.character.gravity > 0.0, "gravity must be positive");
        ensure!(self.melee.size > 0.0, "melee enemy size must be positive");
        ensure!(
            self.melee.spawn_interval_ms > 0.0,
            "melee spawn interval must be positive"
        );
        ensure!(self.archer.size > 0.0, "archer size must be positive");
        ensure!(self.archer.speed > 0.0, "archer speed must be positive");
        ensure!(
            self.archer.spawn_interval_ms > 0.0,
            "archer spawn interval must be positive"
        );
        ensure!(self.archer.fire_interval > 0, "archer fire interval must be positive");
        for layer in &self.layers {
            ensure!(
                layer.speed > 0.0 && layer.speed <= 1.0,
                "layer {} speed {} is outside (0, 1]",
                layer.source,
                layer.speed
            );
        }
        Ok(())
    }

    /// Replace the viewport with the measured canvas size
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn layer_speed_outside_unit_range_is_rejected() {
        let mut config = GameConfig::default();
        config.layers.push(LayerConfig::new("assets/too-fast.png", 1.5));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("too-fast"));
    }

    #[test]
    fn zero_fire_interval_is_rejected() {
        let mut config = GameConfig::default();
        config.archer.fire_interval = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn viewport_shorter_than_the_characters_is_rejected() {
        let short = |height| {
            GameConfig::default().with_viewport(Size {
                width: 800.0,
                height,
            })
        };

        assert!(short(50.0).validate().is_err());
        // archers stand 10 above the bottom edge
        assert!(short(129.0).validate().is_err());
        assert!(short(130.0).validate().is_ok());
    }

    #[test]
    fn with_viewport_replaces_the_size() {
        let viewport = Size {
            width: 1280.0,
            height: 720.0,
        };
        let config = GameConfig::default().with_viewport(viewport);

        assert_eq!(config.viewport, viewport);
        assert_eq!(config.character, CharacterConfig::default());
    }
}
