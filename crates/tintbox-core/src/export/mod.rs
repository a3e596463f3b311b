//! Interchange outputs: baked `.cube` LUTs and XML project descriptions.

pub mod cube;
pub mod project;

pub use cube::{Lut3D, LutError};
pub use project::{save_project_xml, write_project_xml};
