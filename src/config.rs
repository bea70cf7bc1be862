// ── Tileset configuration (`tile_config.json`) ──────────────────────────────
//
// Only the parts the renderer needs are modelled; everything else in the file
// (tile id tables, ascii colour groups, iso flags) is ignored by serde.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{IVec2, UVec2};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::TilesheetError;
use crate::range::{SpriteRange, parse_range};
use crate::tilesheet::{DEFAULT_MAX_INSTANCES, Tilesheet, TilesheetDescriptor};
use crate::tilesheets::Tilesheets;

pub const TILE_CONFIG_FILE: &str = "tile_config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalSpritesheet {
    pub file: String,
    pub sprite_width: Option<u32>,
    pub sprite_height: Option<u32>,
    pub sprite_offset_x: Option<i32>,
    pub sprite_offset_y: Option<i32>,
    /// Free-form comment; by convention `"range <lo> to <hi>"`.
    #[serde(rename = "//")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsciiGroup {
    pub offset: i32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSpritesheet {
    pub file: String,
    pub ascii: Vec<AsciiGroup>,
}

/// The fallback sheet is the one with an `ascii` table, so it is tried first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Spritesheet {
    Fallback(FallbackSpritesheet),
    Normal(NormalSpritesheet),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesetConfig {
    pub tile_info: Vec<TileInfo>,
    #[serde(rename = "tiles-new")]
    pub spritesheets: Vec<Spritesheet>,
}

impl TilesetConfig {
    pub fn from_json(json: &str) -> Result<Self, TilesheetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self, TilesheetError> {
        let json = fs::read_to_string(path)
            .map_err(|source| TilesheetError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Grid tile size from the first `tile_info` entry.
    pub fn tile_size(&self) -> Result<UVec2, TilesheetError> {
        self.tile_info
            .first()
            .map(|info| UVec2::new(info.width, info.height))
            .ok_or(TilesheetError::MissingTileInfo)
    }

    pub fn normal_sheets(&self) -> impl Iterator<Item = &NormalSpritesheet> {
        self.spritesheets.iter().filter_map(|s| match s {
            Spritesheet::Normal(n) => Some(n),
            Spritesheet::Fallback(_) => None,
        })
    }

    pub fn fallback_sheet(&self) -> Option<&FallbackSpritesheet> {
        self.spritesheets.iter().find_map(|s| match s {
            Spritesheet::Fallback(f) => Some(f),
            Spritesheet::Normal(_) => None,
        })
    }
}

impl NormalSpritesheet {
    /// Parsed range. Tile configs number their first sheet from 1, so a lower
    /// bound of 1 is widened to 0.
    pub fn range(&self) -> Option<SpriteRange> {
        let range = parse_range(self.comment.as_deref()?)?;
        Some(if range.lo == 1 { SpriteRange { lo: 0, ..range } } else { range })
    }

    pub fn descriptor(&self) -> TilesheetDescriptor {
        let mut descriptor = TilesheetDescriptor::new(&self.file).with_sprite_offset(IVec2::new(
            self.sprite_offset_x.unwrap_or(0),
            self.sprite_offset_y.unwrap_or(0),
        ));
        match self.range() {
            Some(range) => descriptor = descriptor.with_range(range),
            None => log::warn!("spritesheet '{}' has no usable range comment", self.file),
        }
        if let (Some(w), Some(h)) = (self.sprite_width, self.sprite_height) {
            descriptor = descriptor.with_sprite_size(UVec2::new(w, h));
        }
        descriptor
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Where to load a tileset from and how large each sheet's pool is.
#[derive(Debug, Clone)]
pub struct TilesheetsConfig {
    pub tileset_dir: PathBuf,
    pub max_instances: u32,
}

impl TilesheetsConfig {
    pub fn new(tileset_dir: impl Into<PathBuf>) -> Self {
        Self { tileset_dir: tileset_dir.into(), max_instances: DEFAULT_MAX_INSTANCES }
    }
}

/// Build tilesheets from a parsed config, fetching each image through
/// `load_image` (called with the sheet's `file` entry).
pub fn build_tilesheets(
    config: &TilesetConfig,
    max_instances: u32,
    mut load_image: impl FnMut(&str) -> Result<RgbaImage, TilesheetError>,
) -> Result<Tilesheets, TilesheetError> {
    let tile_size = config.tile_size()?;
    let fallback = config.fallback_sheet().ok_or(TilesheetError::MissingFallback)?;

    let mut sheets = Vec::new();
    for sheet in config.normal_sheets() {
        let image = load_image(&sheet.file)?;
        sheets.push(Tilesheet::new(sheet.descriptor(), image, tile_size, max_instances));
    }

    let fallback = Tilesheet::new(
        TilesheetDescriptor::new(&fallback.file),
        load_image(&fallback.file)?,
        tile_size,
        max_instances,
    );
    Tilesheets::new(tile_size, sheets, fallback)
}

/// Read `tile_config.json` and every spritesheet image from a tileset
/// directory.
pub fn load_tilesheets(config: &TilesheetsConfig) -> Result<Tilesheets, TilesheetError> {
    let dir = &config.tileset_dir;
    log::info!("loading tileset from {}", dir.display());
    let tileset = TilesetConfig::read(&dir.join(TILE_CONFIG_FILE))?;

    build_tilesheets(&tileset, config.max_instances, |file| {
        let path = dir.join(file);
        let image = image::open(&path)
            .map_err(|source| TilesheetError::Image { path: path.clone(), source })?;
        Ok(image.to_rgba8())
    })
}

/// Tileset directories (at most two levels below `gfx_root`) that contain a
/// `tile_config.json`, sorted by path.
pub fn available_tilesets(gfx_root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = walkdir::WalkDir::new(gfx_root)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == TILE_CONFIG_FILE)
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    found.sort();
    found
}

// ── Tests ───────────────────────────────────────────────────────────────────
