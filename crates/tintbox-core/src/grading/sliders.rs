//! Slider-based grading adjustments (contrast, saturation, shadows/highlights).

/// Rec. 709 luminance weights.
pub const LUMA_REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Contrast pivot (mid-grey in display space).
const PIVOT: f32 = 0.5;

/// Rec. 709 luma of an RGB triple.
#[inline]
pub fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_REC709[0] + rgb[1] * LUMA_REC709[1] + rgb[2] * LUMA_REC709[2]
}

/// Apply linear contrast around mid-grey.
///
/// ```text
/// out = (in − 0.5) × contrast + 0.5
/// ```
///
/// `contrast = 1.0` returns the input untouched.
pub fn apply_contrast(rgb: [f32; 3], contrast: f32) -> [f32; 3] {
    if (contrast - 1.0).abs() < 1e-7 {
        return rgb;
    }
    rgb.map(|c| (c - PIVOT) * contrast + PIVOT)
}

/// Scale chroma relative to Rec. 709 luma.
///
/// ```text
/// out = luma + (in − luma) × saturation
/// ```
///
/// `saturation = 0` is greyscale, `1` is untouched.
pub fn apply_saturation(rgb: [f32; 3], saturation: f32) -> [f32; 3] {
    if (saturation - 1.0).abs() < 1e-7 {
        return rgb;
    }
    let y = luma(rgb);
    rgb.map(|c| y + (c - y) * saturation)
}

/// Apply shadows and highlights tonal weighting.
///
/// A smoothstep over `[0, 1]` splits each channel into a shadow weight and a
/// highlight weight. Positive `shadows` lifts dark values, positive
/// `highlights` brightens bright values; negative values do the reverse.
///
/// ```text
/// s = smoothstep(0, 1, in)
/// out = in + shadows × (1 − s) × 0.5 + highlights × s × 0.5
/// ```
///
/// Both at 0.0 produce no change.
pub fn apply_shadows_highlights(rgb: [f32; 3], shadows: f32, highlights: f32) -> [f32; 3] {
    if shadows.abs() < 1e-7 && highlights.abs() < 1e-7 {
        return rgb;
    }
    rgb.map(|c| {
        let t = c.clamp(0.0, 1.0);
        // Smoothstep: 3t² − 2t³
        let s = t * t * (3.0 - 2.0 * t);
        c + shadows * (1.0 - s) * 0.5 + highlights * s * 0.5
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_contrast_one_is_identity() {
        let rgb = [0.3, 0.5, 0.7];
        assert_eq!(apply_contrast(rgb, 1.0), rgb);
    }

    #[test]
    fn test_contrast_at_pivot_is_identity() {
        let result = apply_contrast([0.5; 3], 1.8);
        for c in result {
            assert!((c - 0.5).abs() < EPSILON);
        }
    }

    #[test]
    fn test_contrast_increases_spread() {
        let result = apply_contrast([0.8, 0.2, 0.8], 1.5);
        assert!(result[0] > 0.8, "highlights pushed up");
        assert!(result[1] < 0.2, "shadows pushed down");
    }

    #[test]
    fn test_saturation_zero_produces_grayscale() {
        let result = apply_saturation([0.8, 0.4, 0.2], 0.0);
        assert!((result[0] - result[1]).abs() < EPSILON);
        assert!((result[1] - result[2]).abs() < EPSILON);
    }

    #[test]
    fn test_saturation_preserves_luma() {
        let rgb = [0.8, 0.4, 0.2];
        let boosted = apply_saturation(rgb, 1.7);
        assert!((luma(boosted) - luma(rgb)).abs() < EPSILON);
    }

    #[test]
    fn test_shadows_highlights_zero_is_identity() {
        let rgb = [0.3, 0.5, 0.7];
        assert_eq!(apply_shadows_highlights(rgb, 0.0, 0.0), rgb);
    }

    #[test]
    fn test_shadows_affect_darks_more_than_brights() {
        let dark = apply_shadows_highlights([0.1; 3], 0.4, 0.0)[0] - 0.1;
        let bright = apply_shadows_highlights([0.9; 3], 0.4, 0.0)[0] - 0.9;
        assert!(dark > bright && bright >= 0.0);
    }

    #[test]
    fn test_negative_highlights_pull_brights_down() {
        let result = apply_shadows_highlights([0.9; 3], 0.0, -0.5);
        assert!(result[0] < 0.9);
    }
}
