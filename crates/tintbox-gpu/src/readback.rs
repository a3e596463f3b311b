//! Blocking GPU-to-CPU readback through a reusable staging buffer.

use std::sync::mpsc;

use tintbox_core::Frame;
use tintbox_core::scopes::HistogramData;

use crate::GpuError;

/// A `MAP_READ` buffer grown on demand and reused across reads.
#[derive(Default)]
pub struct Readback {
    staging: Option<wgpu::Buffer>,
}

impl Readback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `size` bytes of `src` to the CPU. Blocks on `device.poll`.
    pub fn read_bytes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        src: &wgpu::Buffer,
        size: u64,
    ) -> Result<Vec<u8>, GpuError> {
        if self.staging.as_ref().is_none_or(|buf| buf.size() < size) {
            self.staging = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tintbox_readback_staging"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
        }
        let Some(staging) = self.staging.as_ref() else {
            return Err(GpuError::Readback("staging buffer missing".into()));
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tintbox_readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(src, 0, staging, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..size);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }

    /// Download an RGBA f32 buffer as a [`Frame`].
    pub fn read_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        src: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) -> Result<Frame, GpuError> {
        let size = width as u64 * height as u64 * 16;
        let bytes = self.read_bytes(device, queue, src, size)?;
        let pixels: Vec<[f32; 4]> = bytes
            .chunks_exact(16)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        Frame::new(width, height, pixels).map_err(|e| GpuError::Readback(e.to_string()))
    }

    /// Download the histogram bins buffer.
    pub fn read_histogram(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        src: &wgpu::Buffer,
    ) -> Result<HistogramData, GpuError> {
        let bytes = self.read_bytes(device, queue, src, crate::scope_dispatch::HISTOGRAM_BYTES)?;
        let counts: Vec<u32> = bytes
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        HistogramData::from_flat(&counts).ok_or_else(|| {
            GpuError::Readback(format!("unexpected histogram length {}", counts.len()))
        })
    }
}
