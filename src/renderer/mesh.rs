use glam::Vec2;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::pipeline::{SheetUniform, SpriteInstance};

/// GPU side of one tilesheet: the atlas texture, both per-instance buffers
/// and the bind group that ties them to the sprite pipeline.
///
/// Buffers are sized for the sheet's full capacity up front; only the dirty
/// span is rewritten afterwards.
pub struct TilesheetMesh {
    texture: wgpu::Texture,
    instance_buffer: wgpu::Buffer,
    uv_buffer: wgpu::Buffer,
    sheet_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
    instance_count: u32,
}

impl TilesheetMesh {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        image: &RgbaImage,
        sprite_size: Vec2,
        uv_size: Vec2,
        instances: &[SpriteInstance],
        uv_offsets: &[[f32; 2]],
    ) -> Self {
        let (img_w, img_h) = image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: img_w.max(1),
                    height: img_h.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_instance_buffer"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let uv_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite_uv_buffer"),
            contents: bytemuck::cast_slice(uv_offsets),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let uniform = SheetUniform { sprite_size: sprite_size.to_array(), uv_size: uv_size.to_array() };
        let sheet_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sheet_uniform_buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sheet_bg"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sheet_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            texture,
            instance_buffer,
            uv_buffer,
            sheet_buffer,
            bind_group,
            capacity: instances.len() as u32,
            instance_count: 0,
        }
    }

    pub fn write_instances(&self, queue: &wgpu::Queue, first: u32, data: &[SpriteInstance]) {
        let offset = first as u64 * std::mem::size_of::<SpriteInstance>() as u64;
        queue.write_buffer(&self.instance_buffer, offset, bytemuck::cast_slice(data));
    }

    pub fn write_uvs(&self, queue: &wgpu::Queue, first: u32, data: &[[f32; 2]]) {
        let offset = first as u64 * std::mem::size_of::<[f32; 2]>() as u64;
        queue.write_buffer(&self.uv_buffer, offset, bytemuck::cast_slice(data));
    }

    /// Number of leading slots to draw.
    pub fn set_instance_count(&mut self, count: u32) {
        self.instance_count = count.min(self.capacity);
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Record this sheet's draw into `pass`. Group 0 (camera) and the
    /// pipeline must already be set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.instance_count == 0 {
            return;
        }
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.set_vertex_buffer(1, self.uv_buffer.slice(..));
        pass.draw(0..6, 0..self.instance_count);
    }

    pub fn destroy(self) {
        self.texture.destroy();
        self.instance_buffer.destroy();
        self.uv_buffer.destroy();
        self.sheet_buffer.destroy();
    }
}
