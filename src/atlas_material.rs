use std::ops::Range;

use glam::{UVec2, Vec2};
use image::RgbaImage;

/// Index of one draw instance inside a tilesheet's instance buffers.
pub type InstanceSlot = u32;

// ── DirtySpan ───────────────────────────────────────────────────────────────

/// Smallest slot range touched since the last GPU upload.
#[derive(Clone, Debug, Default)]
pub(crate) struct DirtySpan(Option<Range<u32>>);

impl DirtySpan {
    pub fn include(&mut self, slots: Range<u32>) {
        if slots.is_empty() {
            return;
        }
        self.0 = Some(match self.0.take() {
            Some(r) => r.start.min(slots.start)..r.end.max(slots.end),
            None => slots,
        });
    }

    pub fn take(&mut self) -> Option<Range<u32>> {
        self.0.take()
    }

    pub fn is_dirty(&self) -> bool {
        self.0.is_some()
    }
}

// ── AtlasMaterial ───────────────────────────────────────────────────────────

/// One atlas image plus the per-instance UV-offset table that selects a tile
/// from it.
///
/// The table lives on the CPU; [`take_dirty`](Self::take_dirty) hands the
/// renderer the span that must be re-uploaded. Tiles are laid out row-major
/// with no spacing, so tile `i` sits at
/// `(i % tiles_per_row, i / tiles_per_row) * tile_size`.
pub struct AtlasMaterial {
    image: RgbaImage,
    tile_size: UVec2,
    tiles_per_row: u32,
    tile_count: u32,
    uv_offsets: Vec<[f32; 2]>,
    dirty: DirtySpan,
    /// Number of batches that marked the UV table dirty.
    uv_batches: u64,
    instances_in_use: u32,
}

impl AtlasMaterial {
    pub fn new(image: RgbaImage, tile_size: UVec2, max_instances: u32) -> Self {
        let tile_size = tile_size.max(UVec2::ONE);
        let tiles_per_row = image.width() / tile_size.x;
        let rows = image.height() / tile_size.y;
        Self {
            image,
            tile_size,
            tiles_per_row,
            tile_count: tiles_per_row * rows,
            uv_offsets: vec![[0.0, 0.0]; max_instances as usize],
            dirty: DirtySpan::default(),
            uv_batches: 0,
            instances_in_use: 0,
        }
    }

    /// Next slot that has never been handed out since the last reset.
    ///
    /// The caller must record the slot (via [`mark_in_use`](Self::mark_in_use))
    /// before asking again, otherwise the same slot is returned twice.
    pub fn next_free_instance(&self) -> InstanceSlot {
        self.instances_in_use
    }

    pub fn mark_in_use(&mut self, slot: InstanceSlot) {
        self.instances_in_use = self.instances_in_use.max(slot + 1);
    }

    /// Forget every handed-out slot.
    pub fn reset_instances(&mut self) {
        self.instances_in_use = 0;
    }

    pub fn instances_in_use(&self) -> u32 {
        self.instances_in_use
    }

    /// Top-left pixel of tile `local_index`, or `None` if the image does not
    /// contain that many tiles.
    pub fn tile_pixel_coords(&self, local_index: u32) -> Option<UVec2> {
        if local_index >= self.tile_count {
            return None;
        }
        let col = local_index % self.tiles_per_row;
        let row = local_index / self.tiles_per_row;
        Some(UVec2::new(col, row) * self.tile_size)
    }

    /// Point each slot at the tile whose top-left pixel is the matching entry
    /// of `pixel_coords`. The table is marked dirty once for the whole batch.
    pub fn set_uvs_at(&mut self, slots: &[InstanceSlot], pixel_coords: &[UVec2]) {
        let size = self.image_size();
        let mut touched: Option<Range<u32>> = None;

        for (&slot, &px) in slots.iter().zip(pixel_coords) {
            let Some(uv) = self.uv_offsets.get_mut(slot as usize) else { continue };
            *uv = (px.as_vec2() / size).to_array();
            touched = Some(match touched {
                Some(r) => r.start.min(slot)..r.end.max(slot + 1),
                None => slot..slot + 1,
            });
        }

        if let Some(r) = touched {
            self.dirty.include(r);
            self.uv_batches += 1;
        }
    }

    /// UV offset currently assigned to `slot`.
    pub fn uv_at(&self, slot: InstanceSlot) -> Option<[f32; 2]> {
        self.uv_offsets.get(slot as usize).copied()
    }

    /// Extent of one tile in UV units.
    pub fn uv_size(&self) -> Vec2 {
        self.tile_size.as_vec2() / self.image_size()
    }

    pub fn tile_size(&self) -> UVec2 {
        self.tile_size
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn uv_offsets(&self) -> &[[f32; 2]] {
        &self.uv_offsets
    }

    pub fn uv_batches(&self) -> u64 {
        self.uv_batches
    }

    pub fn needs_update(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Slot span changed since the previous call.
    pub fn take_dirty(&mut self) -> Option<Range<u32>> {
        self.dirty.take()
    }

    fn image_size(&self) -> Vec2 {
        Vec2::new(self.image.width().max(1) as f32, self.image.height().max(1) as f32)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> AtlasMaterial {
        // 4 × 2 tiles of 8 × 8 px.
        AtlasMaterial::new(RgbaImage::new(32, 16), UVec2::new(8, 8), 16)
    }

    #[test]
    fn tile_coords_are_row_major() {
        let m = material();
        assert_eq!(m.tile_count(), 8);
        assert_eq!(m.tile_pixel_coords(0), Some(UVec2::new(0, 0)));
        assert_eq!(m.tile_pixel_coords(3), Some(UVec2::new(24, 0)));
        assert_eq!(m.tile_pixel_coords(5), Some(UVec2::new(8, 8)));
        assert_eq!(m.tile_pixel_coords(8), None);
    }

    #[test]
    fn uvs_are_normalised() {
        let mut m = material();
        m.set_uvs_at(&[2], &[UVec2::new(8, 8)]);
        assert_eq!(m.uv_at(2), Some([0.25, 0.5]));
        assert_eq!(m.uv_size(), Vec2::new(0.25, 0.5));
    }

    #[test]
    fn batch_marks_dirty_once() {
        let mut m = material();
        m.set_uvs_at(&[0, 5, 2], &[UVec2::ZERO, UVec2::new(8, 0), UVec2::new(16, 0)]);
        assert_eq!(m.uv_batches(), 1);
        assert_eq!(m.take_dirty(), Some(0..6));
        assert!(!m.needs_update());
    }

    #[test]
    fn empty_batch_is_not_dirty() {
        let mut m = material();
        m.set_uvs_at(&[], &[]);
        assert_eq!(m.uv_batches(), 0);
        assert!(!m.needs_update());
    }

    #[test]
    fn allocator_counts_and_resets() {
        let mut m = material();
        assert_eq!(m.next_free_instance(), 0);
        m.mark_in_use(0);
        m.mark_in_use(1);
        assert_eq!(m.next_free_instance(), 2);
        m.reset_instances();
        assert_eq!(m.next_free_instance(), 0);
    }

    #[test]
    fn dirty_span_merges() {
        let mut d = DirtySpan::default();
        d.include(4..6);
        d.include(1..2);
        d.include(3..3);
        assert_eq!(d.take(), Some(1..6));
        assert_eq!(d.take(), None);
    }
}
