//! GPU integration tests. Compare the compute path against the CPU reference.
//!
//! Run with: `cargo test -p tintbox-gpu`. Tests return early when the
//! machine has no usable adapter.

use std::sync::{Mutex, OnceLock};

use tintbox_core::composite::{CompositeParams, Divider, composite_frame};
use tintbox_core::scopes::histogram;
use tintbox_core::split::{GradedSide, SplitView};
use tintbox_core::{ColorSettings, EffectSettings, Frame, Rgb};
use tintbox_gpu::{GpuCompositor, GpuError};

/// GPU math differs from the CPU in the last few ulps (pow, dot).
const TOLERANCE: f32 = 2e-3;

fn gpu_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn compositor() -> Option<GpuCompositor> {
    match GpuCompositor::create_blocking() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Skipping GPU test: {e}");
            None
        }
    }
}

fn test_card(width: u32, height: u32) -> Frame {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = x as f32 / (width - 1) as f32;
            let g = y as f32 / (height - 1) as f32;
            let b = ((x * 7 + y * 3) % 11) as f32 / 10.0;
            pixels.push([r, g, b, 0.25 + 0.75 * r]);
        }
    }
    Frame::new(width, height, pixels).unwrap()
}

fn assert_close(gpu: &Frame, cpu: &Frame, what: &str) {
    assert_eq!((gpu.width, gpu.height), (cpu.width, cpu.height));
    let mut max_error: f32 = 0.0;
    for (i, (g, c)) in gpu.pixels.iter().zip(&cpu.pixels).enumerate() {
        for ch in 0..4 {
            let err = (g[ch] - c[ch]).abs();
            max_error = max_error.max(err);
            assert!(
                err < TOLERANCE,
                "{what}: pixel {i} channel {ch}: gpu={} cpu={} err={err}",
                g[ch],
                c[ch],
            );
        }
    }
    eprintln!("{what}: max error {max_error}");
}

#[test]
fn test_neutral_matches_source() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(37, 21);
    let out = gpu.composite(&card, &CompositeParams::default()).unwrap();
    assert_close(&out, &card, "neutral");
}

#[test]
fn test_full_grade_matches_cpu() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(64, 48);
    let params = CompositeParams {
        settings: ColorSettings::NEUTRAL
            .with_white_balance(0.4, -0.3)
            .with_contrast(1.3)
            .with_saturation(0.7)
            .with_tones(0.2, -0.1)
            .with_lift(Rgb::new(0.05, -0.02, 0.0))
            .with_gamma(Rgb::new(1.2, 0.9, 1.0))
            .with_gain(Rgb::new(1.1, 1.0, 0.0)),
        effects: EffectSettings {
            vignette_amount: 0.6,
            vignette_midpoint: 0.3,
            vignette_feather: 0.4,
            ..EffectSettings::NONE
        },
        ..Default::default()
    };
    let out = gpu.composite(&card, &params).unwrap();
    assert_close(&out, &composite_frame(&card, &params), "full grade");
}

#[test]
fn test_grain_and_aberration_match_cpu() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(80, 40);
    let params = CompositeParams {
        effects: EffectSettings {
            grain_amount: 0.3,
            grain_size: 2.0,
            chromatic_aberration: 1.0,
            ..EffectSettings::NONE
        },
        frame_index: 42,
        ..Default::default()
    };
    let out = gpu.composite(&card, &params).unwrap();
    assert_close(&out, &composite_frame(&card, &params), "grain + aberration");
}

#[test]
fn test_split_view_matches_cpu() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(50, 10);
    for side in [GradedSide::Left, GradedSide::Right] {
        let params = CompositeParams {
            settings: ColorSettings::NEUTRAL.with_saturation(0.0),
            split: Some(SplitView::new(0.37).with_graded_side(side)),
            divider: Divider {
                width_px: 3.0,
                color: [1.0, 0.0, 1.0, 1.0],
            },
            ..Default::default()
        };
        let out = gpu.composite(&card, &params).unwrap();
        assert_close(&out, &composite_frame(&card, &params), "split view");
    }
}

#[test]
fn test_extreme_lift_never_nan() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(16, 16);
    let params = CompositeParams {
        settings: ColorSettings::NEUTRAL
            .with_lift(Rgb::splat(f32::MAX))
            .with_gain(Rgb::new(0.0, 1.0, 4.0)),
        ..Default::default()
    };
    let out = gpu.composite(&card, &params).unwrap();
    for p in &out.pixels {
        assert_eq!(&p[..3], &[0.0, 1.0, 1.0]);
    }
}

#[test]
fn test_rgba8_and_histogram_readback() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    let card = test_card(32, 32);
    gpu.upload_frame(&card).unwrap();
    gpu.render(&CompositeParams::default()).unwrap();

    let bytes = gpu.download_rgba8().unwrap();
    let expected = card.to_rgba8();
    assert_eq!(bytes.len(), expected.len());
    for (i, (a, b)) in bytes.iter().zip(&expected).enumerate() {
        assert!(a.abs_diff(*b) <= 1, "byte {i}: gpu={a} cpu={b}");
    }

    let hist = gpu.histogram().unwrap();
    for (ch, bins) in hist.bins.iter().enumerate() {
        let sum: u32 = bins.iter().sum();
        assert_eq!(sum, 32 * 32, "channel {ch}");
    }
    let cpu = histogram::compute(&gpu.download_frame().unwrap());
    assert_eq!(hist.bins[0], cpu.bins[0]);
}

#[test]
fn test_render_without_frame_is_an_error() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    assert!(matches!(
        gpu.render(&CompositeParams::default()),
        Err(GpuError::NoFrame)
    ));
    assert!(matches!(
        gpu.upload_frame(&Frame::filled(0, 0, [0.0; 4])),
        Err(GpuError::EmptyFrame { .. })
    ));
}

#[test]
fn test_odd_sized_frame_readback_covers_every_pixel() {
    let _lock = gpu_test_lock().lock().unwrap();
    let Some(mut gpu) = compositor() else { return };
    // Not a multiple of the workgroup size.
    let card = test_card(333, 77);
    gpu.upload_frame(&card).unwrap();
    gpu.render(&CompositeParams::default()).unwrap();

    let bytes = gpu.download_rgba8().unwrap();
    let expected = card.to_rgba8();
    assert_eq!(bytes.len(), expected.len());
    let last = expected.len() - 4;
    for i in last..expected.len() {
        assert!(bytes[i].abs_diff(expected[i]) <= 1, "byte {i}");
    }

    let hist = gpu.histogram().unwrap();
    assert_eq!(hist.total(), 333 * 77);
}
