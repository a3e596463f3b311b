//! GPU compute pass running `composite.wgsl`.

use bytemuck::{Pod, Zeroable};
use tintbox_core::composite::{CompositeParams, GradeKernel};
use tintbox_core::split::{GradedSide, SplitView};

use crate::buffers::{
    GpuFrameHandle, PIXEL_BYTES, create_compute_pipeline, storage_ro_entry, storage_rw_entry,
    uniform_entry,
};

/// Workgroup edge length; matches `@workgroup_size(16, 16)`.
const WORKGROUP: u32 = 16;

/// Uniform block for `composite.wgsl`. Every field is a 16-byte row.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub wb_rows: [[f32; 4]; 3],
    pub lift: [f32; 4],
    pub gamma: [f32; 4],
    pub gain: [f32; 4],
    /// Contrast, saturation, shadows, highlights.
    pub tone: [f32; 4],
    /// Vignette amount, midpoint, feather, chromatic aberration.
    pub vignette: [f32; 4],
    /// Grain amount, grain size.
    pub grain: [f32; 4],
    pub divider_color: [f32; 4],
    /// Width, height, seed, split mode (0 off, 1 graded left, 2 graded right).
    pub dims: [u32; 4],
    /// Split position, divider width in pixels.
    pub split: [f32; 4],
}

impl CompositeUniforms {
    pub fn new(params: &CompositeParams, width: u32, height: u32) -> Self {
        let kernel = GradeKernel::new(&params.settings, &params.effects, params.frame_index);
        let s = kernel.settings();
        let fx = kernel.effects();
        let wb = kernel.white_balance();
        let row = |r: [f32; 3]| [r[0], r[1], r[2], 0.0];
        let rgb = |v: tintbox_core::Rgb| [v.r, v.g, v.b, 0.0];

        let (mode, position) = match params.split {
            None => (0, 0.5),
            Some(split) => {
                let mode = match split.graded_side {
                    GradedSide::Left => 1,
                    GradedSide::Right => 2,
                };
                (mode, SplitView::new(split.position).position)
            }
        };

        Self {
            wb_rows: [row(wb[0]), row(wb[1]), row(wb[2])],
            lift: rgb(s.lift),
            gamma: rgb(s.gamma),
            gain: rgb(s.gain),
            tone: [s.contrast, s.saturation, s.shadows, s.highlights],
            vignette: [
                fx.vignette_amount,
                fx.vignette_midpoint,
                fx.vignette_feather,
                fx.chromatic_aberration,
            ],
            grain: [fx.grain_amount, fx.grain_size, 0.0, 0.0],
            divider_color: params.divider.color,
            dims: [width, height, kernel.seed(), mode],
            split: [position, params.divider.width_px, 0.0, 0.0],
        }
    }
}

/// Owns the composite pipeline and its uniform buffer.
pub struct CompositePass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl CompositePass {
    /// Compiles `composite.wgsl`.
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_size = std::mem::size_of::<CompositeUniforms>() as u64;
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "composite",
            include_str!("../shaders/composite.wgsl"),
            &[
                storage_ro_entry(0, PIXEL_BYTES),
                storage_rw_entry(1, PIXEL_BYTES),
                uniform_entry(2, uniform_size),
            ],
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tintbox_composite_uniforms"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            layout,
            uniform_buffer,
        }
    }

    /// Record the composite dispatch onto `encoder`. The caller submits.
    pub fn dispatch(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &GpuFrameHandle,
        output: &GpuFrameHandle,
        params: &CompositeParams,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let uniforms = CompositeUniforms::new(params, source.width, source.height);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tintbox_composite_bg"),
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
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tintbox_composite_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            source.width.div_ceil(WORKGROUP),
            source.height.div_ceil(WORKGROUP),
            1,
        );
    }
}
