use glam::{UVec2, Vec2};

use crate::depth::DEPTH_RANGE;

/// Camera uniform uploaded to the GPU: the combined view-projection matrix.
///
/// Layout (column-major, matching WGSL `mat4x4<f32>`):
/// ```text
/// col0: [sx,  0,   0,  0]
/// col1: [0,   sy,  0,  0]
/// col2: [0,   0,   sz, 0]
/// col3: [tx,  ty,  1,  1]
/// ```
/// where `sx = 2z/w`, `sy = 2z/h`, `tx = -sx*cx`, `ty = -sy*cy` and
/// `sz = -1/DEPTH_RANGE`, so painter's depth `d` lands at clip z `1 - d/DEPTH_RANGE`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Column-major 4×4 view-projection matrix sent to the vertex shader.
    pub view_proj: [[f32; 4]; 4],
}

/// 2D orthographic camera over the y-up world the tilesheets draw into.
pub struct Camera {
    /// World-space pixel position the camera is centered on.
    pub position: Vec2,
    /// Current zoom level (1.0 = 1:1, >1 zooms in, <1 zooms out).
    pub zoom: f32,
    /// Smooth-zoom lerp target; `zoom_by` writes here.
    pub(crate) target_zoom: f32,
}

impl Camera {
    pub const MIN_ZOOM: f32 = 0.1;
    pub const MAX_ZOOM: f32 = 8.0;

    pub fn new(center_x: f32, center_y: f32) -> Self {
        Self {
            position: Vec2::new(center_x, center_y),
            zoom: 1.0,
            target_zoom: 1.0,
        }
    }

    /// Advance the smooth zoom by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        // Converges at ~8× per second.
        let speed = 8.0_f32;
        self.zoom += (self.target_zoom - self.zoom) * (speed * dt).min(1.0);
    }

    /// Multiply the zoom target by `factor`, clamped to the supported range.
    pub fn zoom_by(&mut self, factor: f32) {
        self.target_zoom = (self.target_zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    /// Move by `delta` screen pixels (y-down), independent of zoom.
    pub fn pan(&mut self, delta: Vec2) {
        let z = self.zoom.max(0.01);
        self.position += Vec2::new(delta.x, -delta.y) / z;
    }

    /// Build the GPU-ready `CameraUniform` for the given viewport dimensions.
    ///
    /// Derivation (y-up world → NDC):
    /// ```text
    /// x_ndc = sx * world_x + tx    (sx = 2z/w, tx = -sx*cx)
    /// y_ndc = sy * world_y + ty    (sy = 2z/h, ty = -sy*cy)
    /// ```
    pub fn build_view_proj(&self, width: f32, height: f32) -> CameraUniform {
        let z = self.zoom.max(0.01);
        let sx = 2.0 * z / width;
        let sy = 2.0 * z / height;
        let sz = -1.0 / DEPTH_RANGE;
        let tx = -sx * self.position.x;
        let ty = -sy * self.position.y;

        CameraUniform {
            view_proj: [
                [sx,  0.0, 0.0, 0.0], // col0
                [0.0, sy,  0.0, 0.0], // col1
                [0.0, 0.0, sz,  0.0], // col2
                [tx,  ty,  1.0, 1.0], // col3
            ],
        }
    }

    /// Convert a cursor position (physical pixels, y-down) to world pixels.
    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Vec2 {
        let z = self.zoom.max(0.01);
        let centred = screen - viewport * 0.5;
        self.position + Vec2::new(centred.x, -centred.y) / z
    }
}

/// Grid cell containing the world point, or `None` above/left of the map.
pub fn world_to_cell(world: Vec2, tile_size: Vec2) -> Option<UVec2> {
    let col = (world.x / tile_size.x).floor();
    let row = (-world.y / tile_size.y).floor();
    if col < 0.0 || row < 0.0 {
        return None;
    }
    Some(UVec2::new(col as u32, row as u32))
}
