//! GPU buffer management and shared bind group layout helpers.

use std::num::NonZeroU64;

use tintbox_core::Frame;
use wgpu::util::DeviceExt;

use crate::GpuError;

/// Bytes per RGBA f32 pixel.
pub const PIXEL_BYTES: u64 = 16;

/// Invocations per workgroup in the per-pixel passes.
pub const LINEAR_WORKGROUP_SIZE: u32 = 256;

/// Per-dimension workgroup count guaranteed by `wgpu::Limits::default()`.
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;

/// A frame stored on the GPU as a storage buffer of `vec4<f32>`.
pub struct GpuFrameHandle {
    pub buffer: wgpu::Buffer,
    pub width: u32,
    pub height: u32,
}

impl GpuFrameHandle {
    /// Upload a [`Frame`] as a storage buffer.
    pub fn upload(device: &wgpu::Device, frame: &Frame) -> Result<Self, GpuError> {
        if frame.is_empty() {
            return Err(GpuError::EmptyFrame {
                width: frame.width,
                height: frame.height,
            });
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tintbox_frame_upload"),
            contents: frame.as_bytes(),
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        Ok(Self {
            buffer,
            width: frame.width,
            height: frame.height,
        })
    }

    /// Overwrite the pixels in place. Dimensions must match.
    pub fn write(&self, queue: &wgpu::Queue, frame: &Frame) -> bool {
        if !self.matches(frame.width, frame.height) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, frame.as_bytes());
        true
    }

    /// Uninitialized output buffer of the given size.
    pub fn create_output(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tintbox_frame_output"),
            size: (width as u64) * (height as u64) * PIXEL_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            width,
            height,
        }
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Workgroup grid `(x, y)` covering `count` invocations of a per-pixel pass.
///
/// Rows are folded into `y` so large frames stay under the per-dimension
/// limit. Shaders rebuild the index as `id.y * num_workgroups.x * 256 + id.x`
/// and skip indices at or past `count`.
pub fn linear_workgroups(count: u32) -> (u32, u32) {
    let groups = count.div_ceil(LINEAR_WORKGROUP_SIZE);
    if groups == 0 {
        return (0, 0);
    }
    let x = groups.min(MAX_WORKGROUPS_PER_DIMENSION);
    (x, groups.div_ceil(x))
}

/// A 16-byte uniform holding one `u32` (padded for uniform alignment).
pub(crate) fn create_u32_uniform(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: 16,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(crate) fn write_u32_uniform(queue: &wgpu::Queue, buffer: &wgpu::Buffer, value: u32) {
    let padded = [value, 0, 0, 0];
    queue.write_buffer(buffer, 0, bytemuck::cast_slice(&padded));
}

// ── Layout helpers ──────────────────────────────────────────────────

pub(crate) fn storage_ro_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    storage_entry(binding, min_size, true)
}

pub(crate) fn storage_rw_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    storage_entry(binding, min_size, false)
}

fn storage_entry(binding: u32, min_size: u64, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

pub(crate) fn uniform_entry(binding: u32, min_size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

/// Compile a single-bind-group compute pipeline. The entry point must be
/// named after the pass.
pub(crate) fn create_compute_pipeline(
    device: &wgpu::Device,
    name: &str,
    wgsl_source: &str,
    layout_entries: &[wgpu::BindGroupLayoutEntry],
) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("tintbox_{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(wgsl_source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("tintbox_{name}_layout")),
        entries: layout_entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("tintbox_{name}_pipeline_layout")),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(&format!("tintbox_{name}_pipeline")),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some(name),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}
