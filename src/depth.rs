// ── Painter's-order depth ───────────────────────────────────────────────────
//
// World space is y-up: grid row `r` sits at world y `-r * tile_h`, so
// `world_row = -r` and the depth formula below grows as rows go down the
// map. Larger depth is nearer the viewer.
//
//   depth = (MAX_DEPTH - MAX_ROW * (world_row + 1)) + column * LAYER_STRIDE + layer
//
// `MAX_ROW` is larger than the widest row (`MAX_COLUMNS * LAYER_STRIDE`), so
// every row owns a disjoint band and `(row, column, layer)` is a strict total
// order for `layer < LAYER_STRIDE`. All depths fit in `[0, DEPTH_RANGE)`,
// which is exactly representable as `f32`.

use glam::Vec2;

use crate::error::TilesheetError;

/// Distinct layers per cell (`layer` must be below this).
pub const LAYER_STRIDE: i64 = 16;
/// Widest supported map, in cells.
pub const MAX_COLUMNS: i64 = 1024;
/// Tallest supported map, in cells.
pub const MAX_ROWS: i64 = 1024;
/// Depth band of one row.
pub const MAX_ROW: i64 = MAX_COLUMNS * LAYER_STRIDE;
/// Depth offset so row 0 starts at 0.
pub const MAX_DEPTH: i64 = MAX_ROW;
/// Upper bound (exclusive) of every depth `compute_depth` returns.
pub const DEPTH_RANGE: f32 = (MAX_ROW * MAX_ROWS) as f32;
/// Depth of parked (unoccupied) instances; clipped by the camera.
pub const OFFSCREEN_DEPTH: f32 = -DEPTH_RANGE;

/// Depth of a sprite whose cell's top-left corner is at `position` (world
/// pixels) on the given `layer`.
pub fn compute_depth(position: Vec2, layer: u32, tile_size: Vec2) -> Result<f32, TilesheetError> {
    let column = (position.x / tile_size.x).floor() as i64;
    // A cell spans y in (-(row + 1) * tile_h, -row * tile_h].
    let row = (-position.y / tile_size.y).floor() as i64;
    let world_row = -row;

    if !(0..MAX_COLUMNS).contains(&column)
        || !(0..MAX_ROWS).contains(&row)
        || i64::from(layer) >= LAYER_STRIDE
    {
        return Err(TilesheetError::DepthOutOfBounds { column, row, layer });
    }

    let depth = (MAX_DEPTH - MAX_ROW * (world_row + 1)) + column * LAYER_STRIDE + i64::from(layer);
    Ok(depth as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: Vec2 = Vec2::new(32.0, 32.0);

    fn cell(col: u32, row: u32) -> Vec2 {
        Vec2::new(col as f32 * TILE.x, -(row as f32) * TILE.y)
    }

    #[test]
    fn origin_cell_is_zero() {
        assert_eq!(compute_depth(cell(0, 0), 0, TILE).unwrap(), 0.0);
    }

    #[test]
    fn layer_breaks_ties_within_cell() {
        let floor = compute_depth(cell(3, 3), 0, TILE).unwrap();
        let furniture = compute_depth(cell(3, 3), 3, TILE).unwrap();
        assert_eq!(furniture - floor, 3.0);
    }

    #[test]
    fn last_cell_stays_below_range() {
        let d = compute_depth(cell(1023, 1023), 15, TILE).unwrap();
        assert!(d < DEPTH_RANGE);
    }

    #[test]
    fn layer_at_stride_is_rejected() {
        assert!(compute_depth(cell(0, 0), 16, TILE).is_err());
    }

    #[test]
    fn positive_world_y_is_rejected() {
        // Row -1 would sit above the map.
        assert!(compute_depth(Vec2::new(0.0, 32.0), 0, TILE).is_err());
    }
}
