//! Tintbox GPU: wgpu compute compositor, histogram and readback.
//!
//! This crate owns all GPU resources. No Bevy dependency; it exposes a
//! plain wgpu API that `tintbox-bevy` wraps into ECS resources and systems.
//! Every pass mirrors a CPU function in `tintbox-core`, which stays the
//! reference for correctness.

pub mod buffers;
pub mod composite_pass;
pub mod format_converter;
pub mod pipeline;
pub mod readback;
pub mod scope_dispatch;

pub use composite_pass::CompositeUniforms;
pub use pipeline::GpuCompositor;

/// Errors from GPU setup, dispatch, and readback.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to build {stage} pipeline: {message}")]
    Pipeline { stage: &'static str, message: String },
    #[error("GPU readback failed: {0}")]
    Readback(String),
    #[error("no frame has been uploaded")]
    NoFrame,
    #[error("cannot upload an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },
}

/// Device features the compositor needs. Core WGSL only, so none.
pub fn required_features() -> wgpu::Features {
    wgpu::Features::empty()
}
