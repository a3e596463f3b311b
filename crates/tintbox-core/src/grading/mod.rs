//! Per-pixel grading stages: white balance, wheels, sliders and finishing effects.

pub mod effects;
pub mod sliders;
pub mod wheels;
pub mod white_balance;
