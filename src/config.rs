/// Fixed maze geometry and the tunable game settings.
///
/// Geometry is compile-time: every level table is `GRID_WIDTH` x
/// `GRID_HEIGHT` cells of `GRID_SIZE` canvas units. Tuning values live in
/// [`GameConfig`], which can be loaded from YAML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Edge length of one grid cell in canvas units.
pub const GRID_SIZE: f32 = 50.0;
pub const GRID_WIDTH: usize = 13;
pub const GRID_HEIGHT: usize = 11;
/// Canvas margin left of column 0.
pub const OFFSET_X: f32 = 50.0;
/// Canvas margin above row 0.
pub const OFFSET_Y: f32 = 50.0;

/// Diameter-ish size of a segment; doubles as the collision radius.
pub const SEGMENT_SIZE: f32 = 25.0;
/// Distance between consecutive segments, as a multiple of the segment size.
pub const SEGMENT_SPACING_FACTOR: f32 = 1.1;

/// Door progress change per tick (0 = closed, 1 = open).
pub const DOOR_STEP: f32 = 0.02;
/// Death animation progress per tick.
pub const DEATH_STEP: f32 = 0.015;

/// Target frame interval (~60 ticks per second).
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Canvas-space centre of grid cell (`gx`, `gy`).
pub fn cell_center(gx: i32, gy: i32) -> (f32, f32) {
    (
        OFFSET_X + gx as f32 * GRID_SIZE + GRID_SIZE / 2.0,
        OFFSET_Y + gy as f32 * GRID_SIZE + GRID_SIZE / 2.0,
    )
}

/// Grid cell containing canvas position (`x`, `y`). May be out of range.
pub fn cell_of(x: f32, y: f32) -> (i32, i32) {
    (
        ((x - OFFSET_X) / GRID_SIZE).floor() as i32,
        ((y - OFFSET_Y) / GRID_SIZE).floor() as i32,
    )
}

// ── Tuning ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub level: u32,
    pub lives: u32,
    /// Canvas units per tick.
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub player_length: usize,
    pub enemy_length: usize,
    pub enemy_count: usize,
    pub initial_delay_ms: u64,
    pub preview_ms: u64,
    pub release_interval_ms: u64,
    pub respawn_wait_ms: u64,
    pub respawn_release_ms: u64,
    pub head_points: u32,
    pub body_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level: 1,
            lives: 3,
            player_speed: 4.0,
            enemy_speed: 3.0,
            player_length: 3,
            enemy_length: 5,
            enemy_count: 2,
            initial_delay_ms: 500,
            preview_ms: 750,
            release_interval_ms: 1500,
            respawn_wait_ms: 1000,
            respawn_release_ms: 1000,
            head_points: 100,
            body_points: 50,
        }
    }
}

impl GameConfig {
    pub fn from_yaml_str(content: &str) -> GameResult<Self> {
        let config: GameConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> GameResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Speeds must stay below half a cell or the turn window (distance to
    /// the next centre < speed) could skip a centre entirely.
    pub fn validate(&self) -> GameResult<()> {
        let max_speed = GRID_SIZE / 2.0;
        for (name, speed) in [("player_speed", self.player_speed), ("enemy_speed", self.enemy_speed)] {
            if !(speed > 0.0 && speed < max_speed) {
                return Err(GameError::InvalidConfig(format!(
                    "{} must be in (0, {}), got {}",
                    name, max_speed, speed
                )));
            }
        }
        for (name, length) in [("player_length", self.player_length), ("enemy_length", self.enemy_length)] {
            if length < 2 {
                return Err(GameError::InvalidConfig(format!(
                    "{} must be at least 2, got {}",
                    name, length
                )));
            }
        }
        if self.enemy_count == 0 {
            return Err(GameError::InvalidConfig("enemy_count must be at least 1".into()));
        }
        if self.lives == 0 {
            return Err(GameError::InvalidConfig("lives must be at least 1".into()));
        }
        Ok(())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn preview_duration(&self) -> Duration {
        Duration::from_millis(self.preview_ms)
    }

    pub fn release_interval(&self) -> Duration {
        Duration::from_millis(self.release_interval_ms)
    }

    pub fn respawn_wait(&self) -> Duration {
        Duration::from_millis(self.respawn_wait_ms)
    }

    pub fn respawn_release(&self) -> Duration {
        Duration::from_millis(self.respawn_release_ms)
    }
}
