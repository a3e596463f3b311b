//! GPU compute pass packing f32 pixels to RGBA8 for display readback.
//!
//! Quarters the readback bandwidth of raw f32 output.

use crate::buffers::{
    GpuFrameHandle, PIXEL_BYTES, create_compute_pipeline, create_u32_uniform, linear_workgroups,
    storage_ro_entry, storage_rw_entry, uniform_entry, write_u32_uniform,
};

/// Runs `pack_rgba8.wgsl` and caches its output buffer.
pub struct FormatConverter {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    pixel_count_buf: wgpu::Buffer,
    /// Reallocated when the pixel count changes.
    output: Option<PackedOutput>,
}

struct PackedOutput {
    buffer: wgpu::Buffer,
    pixel_count: u32,
}

impl FormatConverter {
    pub fn new(device: &wgpu::Device) -> Self {
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "pack_rgba8",
            include_str!("../shaders/pack_rgba8.wgsl"),
            &[
                storage_ro_entry(0, PIXEL_BYTES),
                storage_rw_entry(1, 4),
                uniform_entry(2, 16),
            ],
        );
        Self {
            pipeline,
            layout,
            pixel_count_buf: create_u32_uniform(device, "tintbox_pack_pixel_count"),
            output: None,
        }
    }

    /// Record the packing pass. Returns the packed buffer (4 bytes per pixel).
    pub fn convert(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &GpuFrameHandle,
        encoder: &mut wgpu::CommandEncoder,
    ) -> &wgpu::Buffer {
        let pixel_count = source.pixel_count();
        write_u32_uniform(queue, &self.pixel_count_buf, pixel_count);
        if self.output.as_ref().is_some_and(|o| o.pixel_count != pixel_count) {
            self.output = None;
        }
        let output = self.output.get_or_insert_with(|| PackedOutput {
            buffer: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tintbox_packed_rgba8"),
                size: pixel_count as u64 * 4,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
            pixel_count,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tintbox_pack_rgba8_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: source.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.pixel_count_buf.as_entire_binding(),
                },
            ],
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tintbox_pack_rgba8_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let (x, y) = linear_workgroups(pixel_count);
            pass.dispatch_workgroups(x, y, 1);
        }
        &output.buffer
    }
}
