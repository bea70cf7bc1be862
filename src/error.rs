use std::path::PathBuf;

use crate::range::SpriteRange;

/// Everything that can go wrong while loading or drawing into tilesheets.
///
/// Per-sprite variants (`CapacityExceeded`, `TileOutOfAtlas`,
/// `DepthOutOfBounds`, `EmptyAnimation`) never abort a batch: they end up in
/// [`DrawReport::skipped`] and the rest of the batch is still drawn.
#[derive(Debug, thiserror::Error)]
pub enum TilesheetError {
    #[error("tilesheet '{sheet}' is full ({max_instances} instances)")]
    CapacityExceeded { sheet: String, max_instances: u32 },

    #[error("tile {local_index} is outside tilesheet '{sheet}' ({tile_count} tiles)")]
    TileOutOfAtlas { sheet: String, local_index: u32, tile_count: u32 },

    #[error("cell ({column}, {row}) layer {layer} is outside the depth range")]
    DepthOutOfBounds { column: i64, row: i64, layer: u32 },

    #[error("animated sprite at ({x}, {y}) has no frames")]
    EmptyAnimation { x: f32, y: f32 },

    #[error("ranges of '{first}' ({first_range}) and '{second}' ({second_range}) overlap")]
    OverlappingRanges {
        first: String,
        first_range: SpriteRange,
        second: String,
        second_range: SpriteRange,
    },

    #[error("tileset config has no fallback spritesheet")]
    MissingFallback,

    #[error("tileset config has no tile_info entry")]
    MissingTileInfo,

    #[error("no tilesheets are loaded")]
    NotLoaded,

    #[error("invalid grid position '{0}', expected 'x,y'")]
    InvalidPosition(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Outcome of one batched draw call.
#[derive(Debug, Default)]
pub struct DrawReport {
    /// Number of sprites written into an instance slot.
    pub drawn: usize,
    /// Sprites that were rejected, in input order.
    pub skipped: Vec<TilesheetError>,
}

impl DrawReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn merge(&mut self, other: DrawReport) {
        self.drawn += other.drawn;
        self.skipped.extend(other.skipped);
    }

    pub(crate) fn skip(&mut self, err: TilesheetError) {
        log::warn!("skipping sprite: {err}");
        self.skipped.push(err);
    }
}
