use std::collections::HashMap;

use glam::{IVec2, UVec2, Vec2, Vec3};
use image::RgbaImage;

use crate::atlas_material::{AtlasMaterial, DirtySpan, InstanceSlot};
use crate::error::{DrawReport, TilesheetError};
use crate::range::{SpriteRange, parse_range};
use crate::renderer::mesh::TilesheetMesh;
use crate::renderer::pipeline::SpriteInstance;

/// Instances per tilesheet when the caller does not say otherwise.
pub const DEFAULT_MAX_INSTANCES: u32 = 200_000;

// ── OccupancyKey ────────────────────────────────────────────────────────────

/// Screen cell plus stacking layer. Z-level is deliberately not part of it:
/// only one level is drawn at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OccupancyKey {
    pub x: i32,
    pub y: i32,
    pub layer: u32,
}

impl OccupancyKey {
    pub fn new(position: Vec2, layer: u32) -> Self {
        Self { x: position.x.round() as i32, y: position.y.round() as i32, layer }
    }
}

// ── LocalDraw ───────────────────────────────────────────────────────────────

/// One sprite addressed by its atlas-local tile index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalDraw {
    /// World pixel position of the cell's top-left corner; `z` is the depth.
    pub position: Vec3,
    pub local_index: u32,
    pub layer: u32,
    pub rotation_deg: f32,
}

// ── TilesheetDescriptor ─────────────────────────────────────────────────────

/// Metadata a tilesheet is built from, next to its decoded image.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesheetDescriptor {
    pub name: String,
    pub range: Option<SpriteRange>,
    /// Sprite size in atlas pixels; `None` inherits the tileset's tile size.
    pub sprite_size: Option<UVec2>,
    /// Draw offset in screen pixels (y-down), as written in tile configs.
    pub sprite_offset: IVec2,
}

impl TilesheetDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), range: None, sprite_size: None, sprite_offset: IVec2::ZERO }
    }

    pub fn with_range(mut self, range: SpriteRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Parse a `"range <lo> to <hi>"` comment. An unparsable comment leaves
    /// the sheet without a range.
    pub fn with_range_comment(mut self, comment: &str) -> Self {
        self.range = parse_range(comment);
        if self.range.is_none() {
            log::warn!("tilesheet '{}': unparsable range comment {comment:?}", self.name);
        }
        self
    }

    pub fn with_sprite_size(mut self, size: UVec2) -> Self {
        self.sprite_size = Some(size);
        self
    }

    pub fn with_sprite_offset(mut self, offset: IVec2) -> Self {
        self.sprite_offset = offset;
        self
    }
}

// ── Tilesheet ───────────────────────────────────────────────────────────────

/// One atlas and its fixed-capacity instance pool.
///
/// Each `(cell, layer)` key owns at most one slot; drawing the same key again
/// overwrites that slot. Slots are handed out monotonically and only come back
/// on [`clear`](Self::clear). Unused slots are parked at
/// [`SpriteInstance::PARKED`], behind the camera's far plane.
pub struct Tilesheet {
    name: String,
    range: Option<SpriteRange>,
    material: AtlasMaterial,
    sprite_offset: Vec2,
    max_instances: u32,
    instances: Vec<SpriteInstance>,
    occupancy: HashMap<OccupancyKey, InstanceSlot>,
    dirty: DirtySpan,
    instance_batches: u64,
    mesh: Option<TilesheetMesh>,
}

impl Tilesheet {
    pub fn new(
        descriptor: TilesheetDescriptor,
        image: RgbaImage,
        tile_size: UVec2,
        max_instances: u32,
    ) -> Self {
        let sprite_size = descriptor.sprite_size.unwrap_or(tile_size);
        let material = AtlasMaterial::new(image, sprite_size, max_instances);
        log::debug!(
            "tilesheet '{}': {} tiles of {}x{}, range {:?}",
            descriptor.name,
            material.tile_count(),
            sprite_size.x,
            sprite_size.y,
            descriptor.range,
        );

        Self {
            name: descriptor.name,
            range: descriptor.range,
            material,
            sprite_offset: descriptor.sprite_offset.as_vec2(),
            max_instances,
            instances: vec![SpriteInstance::PARKED; max_instances as usize],
            occupancy: HashMap::new(),
            dirty: DirtySpan::default(),
            instance_batches: 0,
            mesh: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> Option<SpriteRange> {
        self.range
    }

    /// Whether this sheet's range covers the global sprite `index`.
    pub fn is_within_range(&self, index: u32) -> bool {
        self.range.is_some_and(|r| r.contains(index))
    }

    /// Atlas-local index for a global sprite index; sheets without a range
    /// use the global index as is.
    pub fn local_index(&self, index: u32) -> u32 {
        match self.range {
            Some(r) => index.saturating_sub(r.lo),
            None => index,
        }
    }

    /// Draw a batch of sprites, reusing the slot of any key already mapped.
    ///
    /// Sprites whose tile is missing from the atlas, or that need a new slot
    /// while the pool is full, are skipped and reported. Both instance and UV
    /// buffers are marked dirty once for the whole batch.
    pub fn draw_sprite_local_index_batched(&mut self, draws: &[LocalDraw]) -> DrawReport {
        self.draw_tracked(draws).0
    }

    /// Like [`draw_sprite_local_index_batched`](Self::draw_sprite_local_index_batched),
    /// also returning whether each draw landed in a slot.
    pub(crate) fn draw_tracked(&mut self, draws: &[LocalDraw]) -> (DrawReport, Vec<bool>) {
        let mut report = DrawReport::default();
        let mut slots = Vec::with_capacity(draws.len());
        let mut pixels = Vec::with_capacity(draws.len());
        let mut landed = vec![false; draws.len()];

        for (draw, ok) in draws.iter().zip(&mut landed) {
            let Some(px) = self.material.tile_pixel_coords(draw.local_index) else {
                report.skip(TilesheetError::TileOutOfAtlas {
                    sheet: self.name.clone(),
                    local_index: draw.local_index,
                    tile_count: self.material.tile_count(),
                });
                continue;
            };

            let key = OccupancyKey::new(draw.position.truncate(), draw.layer);
            let slot = match self.slot_for(key) {
                Ok(slot) => slot,
                Err(err) => {
                    report.skip(err);
                    continue;
                }
            };

            self.instances[slot as usize] = SpriteInstance {
                position: [
                    draw.position.x + self.sprite_offset.x,
                    draw.position.y - self.sprite_offset.y,
                    draw.position.z,
                ],
                rotation: draw.rotation_deg.to_radians(),
            };
            slots.push(slot);
            pixels.push(px);
            report.drawn += 1;
            *ok = true;
        }

        if let (Some(&min), Some(&max)) = (slots.iter().min(), slots.iter().max()) {
            self.dirty.include(min..max + 1);
            self.instance_batches += 1;
        }
        self.material.set_uvs_at(&slots, &pixels);
        (report, landed)
    }

    /// Park the slot held by `key` and forget the key. The slot is not handed
    /// out again before [`clear`](Self::clear).
    pub fn release(&mut self, key: OccupancyKey) -> bool {
        let Some(slot) = self.occupancy.remove(&key) else { return false };
        self.instances[slot as usize] = SpriteInstance::PARKED;
        self.dirty.include(slot..slot + 1);
        true
    }

    /// Park every mapped slot and forget all keys.
    pub fn clear(&mut self) {
        let in_use = self.material.instances_in_use();
        for &slot in self.occupancy.values() {
            self.instances[slot as usize] = SpriteInstance::PARKED;
        }
        self.dirty.include(0..in_use);
        self.occupancy.clear();
        self.material.reset_instances();
    }

    fn slot_for(&mut self, key: OccupancyKey) -> Result<InstanceSlot, TilesheetError> {
        if let Some(&slot) = self.occupancy.get(&key) {
            return Ok(slot);
        }
        let slot = self.material.next_free_instance();
        if slot >= self.max_instances {
            return Err(TilesheetError::CapacityExceeded {
                sheet: self.name.clone(),
                max_instances: self.max_instances,
            });
        }
        self.occupancy.insert(key, slot);
        self.material.mark_in_use(slot);
        Ok(slot)
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    /// Number of keys currently holding a slot.
    pub fn mapped_count(&self) -> usize {
        self.occupancy.len()
    }

    pub fn next_free_instance(&self) -> InstanceSlot {
        self.material.next_free_instance()
    }

    pub fn slot_of(&self, key: OccupancyKey) -> Option<InstanceSlot> {
        self.occupancy.get(&key).copied()
    }

    pub fn instance(&self, slot: InstanceSlot) -> Option<&SpriteInstance> {
        self.instances.get(slot as usize)
    }

    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn material(&self) -> &AtlasMaterial {
        &self.material
    }

    pub fn max_instances(&self) -> u32 {
        self.max_instances
    }

    /// Batches that marked the instance buffer dirty.
    pub fn instance_batches(&self) -> u64 {
        self.instance_batches
    }

    pub fn needs_update(&self) -> bool {
        self.dirty.is_dirty() || self.material.needs_update()
    }

    // ── GPU ─────────────────────────────────────────────────────────────────

    /// Create the GPU mesh for this sheet, uploading the full pools once.
    pub fn attach_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) {
        let mesh = TilesheetMesh::new(
            device,
            queue,
            layout,
            &self.name,
            self.material.image(),
            self.material.tile_size().as_vec2(),
            self.material.uv_size(),
            &self.instances,
            self.material.uv_offsets(),
        );
        self.dirty.take();
        self.material.take_dirty();
        self.mesh = Some(mesh);
    }

    /// Upload whatever changed since the last sync. No-op without a mesh.
    pub fn sync(&mut self, queue: &wgpu::Queue) {
        let Some(mesh) = &mut self.mesh else { return };
        if let Some(span) = self.dirty.take() {
            mesh.write_instances(queue, span.start, &self.instances[span.start as usize..span.end as usize]);
        }
        if let Some(span) = self.material.take_dirty() {
            let uvs = &self.material.uv_offsets()[span.start as usize..span.end as usize];
            mesh.write_uvs(queue, span.start, uvs);
        }
        mesh.set_instance_count(self.material.instances_in_use());
    }

    /// The renderable mesh, once [`attach_mesh`](Self::attach_mesh) ran.
    pub fn mesh(&self) -> Option<&TilesheetMesh> {
        self.mesh.as_ref()
    }

    /// Release the GPU texture and buffers.
    pub fn dispose(self) {
        if let Some(mesh) = self.mesh {
            log::debug!("disposing tilesheet '{}'", self.name);
            mesh.destroy();
        }
    }
}
