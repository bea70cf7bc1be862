// ── Inbound sprite payload ──────────────────────────────────────────────────
//
// The map backend emits one `PlaceSpritesEvent` per map (re)load. Positions
// are grid cells serialised as `"x,y"`; `place_sprites` converts them to
// world pixels and forwards each kind to its batched entry point.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::{UVec2, Vec2};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{DrawReport, TilesheetError};
use crate::tilesheets::{AnimatedDraw, FallbackDraw, SpriteDraw, Tilesheets};

/// Grid cell, written as `"x,y"` on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridPosition(pub UVec2);

impl GridPosition {
    /// Top-left corner of the cell in y-up world pixels.
    pub fn to_world(self, tile_size: Vec2) -> Vec2 {
        Vec2::new(self.0.x as f32 * tile_size.x, -(self.0.y as f32) * tile_size.y)
    }
}

impl FromStr for GridPosition {
    type Err = TilesheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TilesheetError::InvalidPosition(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self(UVec2::new(x, y)))
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0.x, self.0.y)
    }
}

impl Serialize for GridPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridPosition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticSprite {
    pub position: GridPosition,
    pub index: u32,
    pub layer: u32,
    pub z: i32,
    #[serde(default)]
    pub rotate_deg: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimatedSprite {
    pub position: GridPosition,
    pub indices: Vec<u32>,
    pub layer: u32,
    pub z: i32,
    #[serde(default)]
    pub rotate_deg: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSprite {
    pub position: GridPosition,
    pub index: u32,
    pub z: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceSpritesEvent {
    #[serde(default)]
    pub static_sprites: Vec<StaticSprite>,
    #[serde(default)]
    pub animated_sprites: Vec<AnimatedSprite>,
    #[serde(default)]
    pub fallback_sprites: Vec<FallbackSprite>,
}

impl PlaceSpritesEvent {
    pub fn from_json(json: &str) -> Result<Self, TilesheetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self, TilesheetError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| TilesheetError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Distinct z-levels mentioned anywhere in the event, ascending.
    pub fn z_levels(&self) -> Vec<i32> {
        let mut levels: Vec<i32> = self
            .static_sprites
            .iter()
            .map(|s| s.z)
            .chain(self.animated_sprites.iter().map(|s| s.z))
            .chain(self.fallback_sprites.iter().map(|s| s.z))
            .collect();
        levels.sort_unstable();
        levels.dedup();
        levels
    }
}

/// Draw the part of `event` that lies on the visible z-level.
///
/// Fails only when no tilesheets are loaded; per-sprite problems are in the
/// returned report.
pub fn place_sprites(
    tilesheets: Option<&mut Tilesheets>,
    event: &PlaceSpritesEvent,
) -> Result<DrawReport, TilesheetError> {
    let tilesheets = tilesheets.ok_or(TilesheetError::NotLoaded)?;
    let z = tilesheets.z_level();
    let tile_size = tilesheets.tile_size();

    let statics: Vec<SpriteDraw> = event
        .static_sprites
        .iter()
        .filter(|s| s.z == z)
        .map(|s| SpriteDraw {
            position: s.position.to_world(tile_size),
            index: s.index,
            layer: s.layer,
            rotation_deg: s.rotate_deg as f32,
        })
        .collect();

    let animated: Vec<AnimatedDraw> = event
        .animated_sprites
        .iter()
        .filter(|s| s.z == z)
        .map(|s| AnimatedDraw {
            position: s.position.to_world(tile_size),
            indices: s.indices.clone(),
            layer: s.layer,
            rotation_deg: s.rotate_deg as f32,
        })
        .collect();

    let fallbacks: Vec<FallbackDraw> = event
        .fallback_sprites
        .iter()
        .filter(|s| s.z == z)
        .map(|s| FallbackDraw { position: s.position.to_world(tile_size), index: s.index })
        .collect();

    let mut report = tilesheets.draw_static_sprites_batched(&statics);
    report.merge(tilesheets.draw_animated_sprites_batched(&animated));
    report.merge(tilesheets.draw_fallback_sprites_batched(&fallbacks));
    log::debug!(
        "placed {} sprites on z {} ({} skipped, {} animated)",
        report.drawn,
        z,
        report.skipped.len(),
        animated.len(),
    );
    Ok(report)
}
