//! GPU compute dispatch for the RGB + luma histogram.

use tintbox_core::scopes::histogram::HISTOGRAM_BINS;

use crate::buffers::{
    GpuFrameHandle, PIXEL_BYTES, create_compute_pipeline, create_u32_uniform, linear_workgroups,
    storage_ro_entry, storage_rw_entry, uniform_entry, write_u32_uniform,
};

/// Size of the bins buffer: 256 bins × 4 channels × `u32`.
pub const HISTOGRAM_BYTES: u64 = (HISTOGRAM_BINS * 4 * 4) as u64;

/// Dispatches `histogram.wgsl` and owns its output buffer.
pub struct ScopeDispatch {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    pixel_count_buf: wgpu::Buffer,
    /// Atomic `u32` bins, `[R, G, B, Luma]`.
    pub histogram: wgpu::Buffer,
}

impl ScopeDispatch {
    pub fn new(device: &wgpu::Device) -> Self {
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "histogram",
            include_str!("../shaders/histogram.wgsl"),
            &[
                storage_ro_entry(0, PIXEL_BYTES),
                storage_rw_entry(1, HISTOGRAM_BYTES),
                uniform_entry(2, 16),
            ],
        );
        let histogram = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tintbox_histogram_buffer"),
            size: HISTOGRAM_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            layout,
            pixel_count_buf: create_u32_uniform(device, "tintbox_histogram_pixel_count"),
            histogram,
        }
    }

    /// Clear the bins and record the histogram pass over `image`.
    pub fn dispatch(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &GpuFrameHandle,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let pixel_count = image.pixel_count();
        write_u32_uniform(queue, &self.pixel_count_buf, pixel_count);
        encoder.clear_buffer(&self.histogram, 0, None);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tintbox_histogram_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: image.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.histogram.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.pixel_count_buf.as_entire_binding(),
                },
            ],
        });
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tintbox_histogram_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y) = linear_workgroups(pixel_count);
        pass.dispatch_workgroups(x, y, 1);
    }
}
