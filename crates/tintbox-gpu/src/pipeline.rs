//! Top-level GPU compositor that owns the device and orchestrates all passes.

use tintbox_core::composite::CompositeParams;
use tintbox_core::scopes::HistogramData;
use tintbox_core::Frame;
use tracing::{debug, info};

use crate::buffers::GpuFrameHandle;
use crate::composite_pass::CompositePass;
use crate::format_converter::FormatConverter;
use crate::readback::Readback;
use crate::scope_dispatch::ScopeDispatch;
use crate::{GpuError, required_features};

/// Grades frames on the GPU: upload → composite → (pack | histogram) → readback.
///
/// Output matches [`tintbox_core::composite_frame`] up to float rounding.
pub struct GpuCompositor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    composite: CompositePass,
    scopes: ScopeDispatch,
    converter: FormatConverter,
    readback: Readback,
    source: Option<GpuFrameHandle>,
    output: Option<GpuFrameHandle>,
}

impl GpuCompositor {
    /// Request an adapter and device, then build the pipelines. Blocks.
    pub fn create_blocking() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        }))?;
        let info = adapter.get_info();
        info!("Using GPU adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tintbox_device"),
            required_features: required_features(),
            required_limits: adapter.limits(),
            ..Default::default()
        }))?;
        Self::new(device, queue)
    }

    /// Build the pipelines on an existing device. Shader compilation or
    /// validation failures are returned rather than raised on the device.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let composite = CompositePass::new(&device);
        let scopes = ScopeDispatch::new(&device);
        let converter = FormatConverter::new(&device);
        pop_error_scope(&device, "setup")?;
        Ok(Self {
            device,
            queue,
            composite,
            scopes,
            converter,
            readback: Readback::new(),
            source: None,
            output: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn has_frame(&self) -> bool {
        self.source.is_some()
    }

    /// Upload the source frame, reusing GPU buffers while the size is stable.
    pub fn upload_frame(&mut self, frame: &Frame) -> Result<(), GpuError> {
        if let Some(source) = &self.source
            && !frame.is_empty()
            && source.write(&self.queue, frame)
        {
            return Ok(());
        }
        let source = GpuFrameHandle::upload(&self.device, frame)?;
        debug!("Allocated GPU frame buffers for {}x{}", frame.width, frame.height);
        self.output = Some(GpuFrameHandle::create_output(
            &self.device,
            frame.width,
            frame.height,
        ));
        self.source = Some(source);
        Ok(())
    }

    /// Composite the uploaded frame into the output buffer.
    pub fn render(&mut self, params: &CompositeParams) -> Result<(), GpuError> {
        let (Some(source), Some(output)) = (&self.source, &self.output) else {
            return Err(GpuError::NoFrame);
        };
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tintbox_composite_encoder"),
            });
        self.composite
            .dispatch(&self.device, &self.queue, source, output, params, &mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));
        pop_error_scope(&self.device, "composite")
    }

    /// Read the last render back as RGBA f32.
    pub fn download_frame(&mut self) -> Result<Frame, GpuError> {
        let output = self.output.as_ref().ok_or(GpuError::NoFrame)?;
        self.readback.read_frame(
            &self.device,
            &self.queue,
            &output.buffer,
            output.width,
            output.height,
        )
    }

    /// Read the last render back as tightly packed RGBA8 for display.
    pub fn download_rgba8(&mut self) -> Result<Vec<u8>, GpuError> {
        let output = self.output.as_ref().ok_or(GpuError::NoFrame)?;
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tintbox_pack_encoder"),
            });
        let packed = self
            .converter
            .convert(&self.device, &self.queue, output, &mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));
        pop_error_scope(&self.device, "pack")?;
        let size = output.pixel_count() as u64 * 4;
        self.readback
            .read_bytes(&self.device, &self.queue, packed, size)
    }

    /// Histogram of the last render.
    pub fn histogram(&mut self) -> Result<HistogramData, GpuError> {
        let output = self.output.as_ref().ok_or(GpuError::NoFrame)?;
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tintbox_histogram_encoder"),
            });
        self.scopes
            .dispatch(&self.device, &self.queue, output, &mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));
        pop_error_scope(&self.device, "histogram")?;
        self.readback
            .read_histogram(&self.device, &self.queue, &self.scopes.histogram)
    }

    /// Upload, render and download in one call.
    pub fn composite(
        &mut self,
        frame: &Frame,
        params: &CompositeParams,
    ) -> Result<Frame, GpuError> {
        self.upload_frame(frame)?;
        self.render(params)?;
        self.download_frame()
    }
}

/// Close the innermost validation scope, turning a captured error into
/// [`GpuError::Pipeline`].
fn pop_error_scope(device: &wgpu::Device, stage: &'static str) -> Result<(), GpuError> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(GpuError::Pipeline {
            stage,
            message: err.to_string(),
        }),
        None => Ok(()),
    }
}
