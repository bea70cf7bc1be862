use std::collections::HashMap;

use glam::{UVec2, Vec2};

use crate::depth::compute_depth;
use crate::error::{DrawReport, TilesheetError};
use crate::renderer::mesh::TilesheetMesh;
use crate::tilesheet::{LocalDraw, OccupancyKey, Tilesheet};

/// Render ticks an animation frame stays on screen.
pub const ANIMATION_FRAME_DURATION: u32 = 30;

/// Fallback tile drawn for sprite indices no ranged sheet claims
/// (`'?'` in the code-page layout fallback atlases use).
pub const UNROUTED_PLACEHOLDER: u32 = b'?' as u32;

/// Layer every fallback sprite is drawn on.
pub const FALLBACK_LAYER: u32 = 0;

// ── Draw requests ───────────────────────────────────────────────────────────

/// A static sprite at a world pixel position (top-left of its cell).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpriteDraw {
    /// World space is y-up: grid row `r` sits at `y = -r * tile_h`.
    /// [`GridPosition::to_world`](crate::events::GridPosition::to_world)
    /// converts grid cells.
    pub position: Vec2,
    pub index: u32,
    pub layer: u32,
    pub rotation_deg: f32,
}

/// A sprite that cycles through `indices`, one frame per
/// [`ANIMATION_FRAME_DURATION`] ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedDraw {
    /// Same y-up convention as [`SpriteDraw::position`].
    pub position: Vec2,
    pub indices: Vec<u32>,
    pub layer: u32,
    pub rotation_deg: f32,
}

/// A sprite drawn straight from the fallback atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FallbackDraw {
    /// Same y-up convention as [`SpriteDraw::position`].
    pub position: Vec2,
    pub index: u32,
}

/// A registered animation and its playback state.
#[derive(Clone, Debug)]
pub struct AnimatedSprite {
    pub draw: AnimatedDraw,
    pub z_level: i32,
    pub frames_since_last_draw: u32,
    /// Frame drawn on the next due tick.
    pub current_frame: usize,
}

/// Where a global sprite index is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Sheet(usize),
    Fallback,
}

// ── Tilesheets ──────────────────────────────────────────────────────────────

/// All tilesheets of the active tileset plus the mandatory fallback sheet.
///
/// Routes global sprite indices to the first sheet (in registration order)
/// whose range claims them, computes painter's depth, and batches each call
/// so a sheet's buffers are marked dirty at most once per call.
///
/// A `(cell, layer)` key is held by one sheet at a time; redrawing it with an
/// index that routes elsewhere parks the old sheet's slot.
pub struct Tilesheets {
    tile_size: Vec2,
    sheets: Vec<Tilesheet>,
    fallback: Tilesheet,
    owners: HashMap<OccupancyKey, Route>,
    animated: Vec<AnimatedSprite>,
    z_level: i32,
    unrouted_placeholder: u32,
}

impl Tilesheets {
    /// Fails when two sheets claim overlapping ranges.
    pub fn new(
        tile_size: UVec2,
        sheets: Vec<Tilesheet>,
        fallback: Tilesheet,
    ) -> Result<Self, TilesheetError> {
        for (i, a) in sheets.iter().enumerate() {
            let Some(ra) = a.range() else { continue };
            for b in &sheets[i + 1..] {
                let Some(rb) = b.range() else { continue };
                if ra.overlaps(&rb) {
                    return Err(TilesheetError::OverlappingRanges {
                        first: a.name().to_string(),
                        first_range: ra,
                        second: b.name().to_string(),
                        second_range: rb,
                    });
                }
            }
        }

        log::info!("loaded {} tilesheets plus fallback '{}'", sheets.len(), fallback.name());
        Ok(Self {
            tile_size: tile_size.max(UVec2::ONE).as_vec2(),
            sheets,
            fallback,
            owners: HashMap::new(),
            animated: Vec::new(),
            z_level: 0,
            unrouted_placeholder: UNROUTED_PLACEHOLDER,
        })
    }

    /// Fallback tile used for indices no sheet claims.
    pub fn with_unrouted_placeholder(mut self, local_index: u32) -> Self {
        self.unrouted_placeholder = local_index;
        self
    }

    /// First sheet whose range claims `index`, else the fallback.
    pub fn route(&self, index: u32) -> Route {
        self.sheets
            .iter()
            .position(|s| s.is_within_range(index))
            .map_or(Route::Fallback, Route::Sheet)
    }

    // ── Batched drawing ─────────────────────────────────────────────────────

    pub fn draw_static_sprites_batched(&mut self, sprites: &[SpriteDraw]) -> DrawReport {
        self.draw_routed(sprites)
    }

    /// Register animations. Nothing is drawn until the next
    /// [`update_animated_sprites`](Self::update_animated_sprites), which
    /// draws each new entry's first frame.
    ///
    /// Entries that could never be drawn (no frames, a cell or layer outside
    /// the depth range, a frame missing from its atlas) are rejected here.
    pub fn draw_animated_sprites_batched(&mut self, sprites: &[AnimatedDraw]) -> DrawReport {
        let mut report = DrawReport::default();
        for sprite in sprites {
            if let Err(err) = self.check_animation(sprite) {
                report.skip(err);
                continue;
            }
            self.animated.push(AnimatedSprite {
                draw: sprite.clone(),
                z_level: self.z_level,
                frames_since_last_draw: ANIMATION_FRAME_DURATION,
                current_frame: 0,
            });
        }
        report
    }

    /// Draw into the fallback sheet without consulting any range.
    pub fn draw_fallback_sprites_batched(&mut self, sprites: &[FallbackDraw]) -> DrawReport {
        let mut report = DrawReport::default();
        let mut batch = Vec::with_capacity(sprites.len());

        for sprite in sprites {
            match compute_depth(sprite.position, FALLBACK_LAYER, self.tile_size) {
                Ok(depth) => batch.push(LocalDraw {
                    position: sprite.position.extend(depth),
                    local_index: sprite.index,
                    layer: FALLBACK_LAYER,
                    rotation_deg: 0.0,
                }),
                Err(err) => report.skip(err),
            }
        }

        if !batch.is_empty() {
            let (drawn, landed) = self.fallback.draw_tracked(&batch);
            report.merge(drawn);
            for (draw, _) in batch.iter().zip(landed).filter(|(_, ok)| *ok) {
                self.claim(OccupancyKey::new(draw.position.truncate(), draw.layer), Route::Fallback);
            }
        }
        report
    }

    /// Advance every animation on `z_level` by one render tick and draw the
    /// entries whose frame is due. An entry whose frame fails to draw is
    /// dropped.
    pub fn update_animated_sprites(&mut self, z_level: i32) -> DrawReport {
        let mut due = Vec::new();
        let mut due_entries = Vec::new();

        for (i, entry) in self.animated.iter_mut().enumerate().filter(|(_, e)| e.z_level == z_level) {
            entry.frames_since_last_draw += 1;
            if entry.frames_since_last_draw < ANIMATION_FRAME_DURATION {
                continue;
            }
            entry.frames_since_last_draw = 0;

            let frames = &entry.draw.indices;
            due.push(SpriteDraw {
                position: entry.draw.position,
                index: frames[entry.current_frame],
                layer: entry.draw.layer,
                rotation_deg: entry.draw.rotation_deg,
            });
            due_entries.push(i);
            entry.current_frame = (entry.current_frame + 1) % frames.len();
        }

        if due.is_empty() {
            return DrawReport::default();
        }
        let (report, landed) = self.draw_routed_tracked(&due);

        let failed: Vec<usize> = due_entries
            .into_iter()
            .zip(landed)
            .filter_map(|(i, ok)| (!ok).then_some(i))
            .collect();
        if !failed.is_empty() {
            log::warn!("dropping {} animations that failed to draw", failed.len());
            let mut index = 0;
            self.animated.retain(|_| {
                let keep = !failed.contains(&index);
                index += 1;
                keep
            });
        }
        report
    }

    /// Clear every sheet and drop all animations.
    pub fn clear_all(&mut self) {
        for sheet in &mut self.sheets {
            sheet.clear();
        }
        self.fallback.clear();
        self.owners.clear();
        self.animated.clear();
    }

    /// Make `z_level` the visible level. Clears everything when the level
    /// changes; the caller then re-issues the draws for the new level.
    pub fn switch_z_level(&mut self, z_level: i32) -> bool {
        if z_level == self.z_level {
            return false;
        }
        log::debug!("switching z-level {} -> {}", self.z_level, z_level);
        self.z_level = z_level;
        self.clear_all();
        true
    }

    fn draw_routed(&mut self, sprites: &[SpriteDraw]) -> DrawReport {
        self.draw_routed_tracked(sprites).0
    }

    /// Route, depth-sort and draw `sprites`, one batch per touched sheet.
    /// Also returns, per input sprite, whether it landed in a slot.
    fn draw_routed_tracked(&mut self, sprites: &[SpriteDraw]) -> (DrawReport, Vec<bool>) {
        let mut report = DrawReport::default();
        let mut batches: Vec<Vec<LocalDraw>> = vec![Vec::new(); self.sheets.len()];
        let mut origins: Vec<Vec<usize>> = vec![Vec::new(); self.sheets.len()];
        let mut fallback_batch = Vec::new();
        let mut fallback_origins = Vec::new();
        let mut routes = vec![None; sprites.len()];

        for (n, sprite) in sprites.iter().enumerate() {
            let depth = match compute_depth(sprite.position, sprite.layer, self.tile_size) {
                Ok(depth) => depth,
                Err(err) => {
                    report.skip(err);
                    continue;
                }
            };
            let position = sprite.position.extend(depth);

            let route = self.route(sprite.index);
            routes[n] = Some(route);
            match route {
                Route::Sheet(i) => {
                    batches[i].push(LocalDraw {
                        position,
                        local_index: self.sheets[i].local_index(sprite.index),
                        layer: sprite.layer,
                        rotation_deg: sprite.rotation_deg,
                    });
                    origins[i].push(n);
                }
                Route::Fallback => {
                    log::debug!("sprite {} has no tilesheet, using fallback", sprite.index);
                    fallback_batch.push(LocalDraw {
                        position,
                        local_index: self.unrouted_placeholder,
                        layer: sprite.layer,
                        rotation_deg: 0.0,
                    });
                    fallback_origins.push(n);
                }
            }
        }

        let mut landed = vec![false; sprites.len()];
        for ((sheet, batch), origin) in self.sheets.iter_mut().zip(&batches).zip(&origins) {
            if !batch.is_empty() {
                let (drawn, ok) = sheet.draw_tracked(batch);
                report.merge(drawn);
                for (&n, ok) in origin.iter().zip(ok) {
                    landed[n] = ok;
                }
            }
        }
        if !fallback_batch.is_empty() {
            let (drawn, ok) = self.fallback.draw_tracked(&fallback_batch);
            report.merge(drawn);
            for (&n, ok) in fallback_origins.iter().zip(ok) {
                landed[n] = ok;
            }
        }

        // Input order decides which sheet keeps a key drawn twice in one call.
        for (n, sprite) in sprites.iter().enumerate() {
            if let (true, Some(route)) = (landed[n], routes[n]) {
                self.claim(OccupancyKey::new(sprite.position, sprite.layer), route);
            }
        }
        (report, landed)
    }

    /// Record `route` as the holder of `key`, parking the key's slot in the
    /// sheet that held it before.
    fn claim(&mut self, key: OccupancyKey, route: Route) {
        let Some(previous) = self.owners.insert(key, route) else { return };
        if previous == route {
            return;
        }
        let released = match previous {
            Route::Sheet(i) => self.sheets[i].release(key),
            Route::Fallback => self.fallback.release(key),
        };
        if released {
            log::debug!("key {key:?} moved from {previous:?} to {route:?}");
        }
    }

    /// Reject an animation that no tick could ever draw.
    fn check_animation(&self, sprite: &AnimatedDraw) -> Result<(), TilesheetError> {
        if sprite.indices.is_empty() {
            return Err(TilesheetError::EmptyAnimation {
                x: sprite.position.x,
                y: sprite.position.y,
            });
        }
        compute_depth(sprite.position, sprite.layer, self.tile_size)?;

        for &index in &sprite.indices {
            let (sheet, local_index) = match self.route(index) {
                Route::Sheet(i) => (&self.sheets[i], self.sheets[i].local_index(index)),
                Route::Fallback => (&self.fallback, self.unrouted_placeholder),
            };
            let material = sheet.material();
            if material.tile_pixel_coords(local_index).is_none() {
                return Err(TilesheetError::TileOutOfAtlas {
                    sheet: sheet.name().to_string(),
                    local_index,
                    tile_count: material.tile_count(),
                });
            }
        }
        Ok(())
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    pub fn z_level(&self) -> i32 {
        self.z_level
    }

    pub fn sheets(&self) -> &[Tilesheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Tilesheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn fallback(&self) -> &Tilesheet {
        &self.fallback
    }

    pub fn animated_sprites(&self) -> &[AnimatedSprite] {
        &self.animated
    }

    /// Mapped instances across all sheets and the fallback.
    pub fn mapped_count(&self) -> usize {
        self.sheets.iter().map(Tilesheet::mapped_count).sum::<usize>() + self.fallback.mapped_count()
    }

    // ── GPU ─────────────────────────────────────────────────────────────────

    pub fn attach_meshes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) {
        for sheet in &mut self.sheets {
            sheet.attach_mesh(device, queue, layout);
        }
        self.fallback.attach_mesh(device, queue, layout);
    }

    /// Upload pending changes of every sheet.
    pub fn sync(&mut self, queue: &wgpu::Queue) {
        for sheet in &mut self.sheets {
            sheet.sync(queue);
        }
        self.fallback.sync(queue);
    }

    /// Renderable meshes, ranged sheets first, fallback last.
    pub fn meshes(&self) -> impl Iterator<Item = &TilesheetMesh> {
        self.sheets
            .iter()
            .chain(std::iter::once(&self.fallback))
            .filter_map(Tilesheet::mesh)
    }

    /// Release the GPU resources of every sheet.
    pub fn dispose(self) {
        for sheet in self.sheets {
            sheet.dispose();
        }
        self.fallback.dispose();
    }
}
