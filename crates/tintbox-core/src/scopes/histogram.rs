//! RGB + luminance histogram computation.

use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::grading::sliders::luma;

/// Bins per channel.
pub const HISTOGRAM_BINS: usize = 256;

/// Histogram data for R, G, B, and luminance channels (256 bins each).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    /// Bin counts for `[R, G, B, Luma]` channels. Each `Vec` has 256 entries.
    pub bins: [Vec<u32>; 4],
    /// Peak bin value across all channels (for normalization).
    pub peak: u32,
}

/// Channel order within [`HistogramData::bins`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Luma = 3,
}

impl HistogramData {
    pub fn empty() -> Self {
        Self {
            bins: std::array::from_fn(|_| vec![0; HISTOGRAM_BINS]),
            peak: 0,
        }
    }

    /// Assemble from raw counts laid out `[R×256, G×256, B×256, L×256]`,
    /// as read back from the GPU.
    pub fn from_flat(counts: &[u32]) -> Option<Self> {
        if counts.len() != HISTOGRAM_BINS * 4 {
            return None;
        }
        let bins: [Vec<u32>; 4] =
            std::array::from_fn(|c| counts[c * HISTOGRAM_BINS..(c + 1) * HISTOGRAM_BINS].to_vec());
        let mut data = Self { bins, peak: 0 };
        data.update_peak();
        Some(data)
    }

    pub fn channel(&self, channel: HistogramChannel) -> &[u32] {
        &self.bins[channel as usize]
    }

    /// Total samples in one channel. Equals the pixel count of the source.
    pub fn total(&self) -> u64 {
        self.bins[0].iter().map(|&n| n as u64).sum()
    }

    /// Bin heights scaled so the tallest bin is 1.
    pub fn normalized(&self, channel: HistogramChannel) -> Vec<f32> {
        let peak = self.peak.max(1) as f32;
        self.channel(channel).iter().map(|&n| n as f32 / peak).collect()
    }

    fn update_peak(&mut self) {
        self.peak = self.bins.iter().flatten().copied().max().unwrap_or(0);
    }
}

/// Bin index for a display value. Matches `bin_index` in `histogram.wgsl`.
#[inline]
pub fn bin_index(v: f32) -> usize {
    let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
    ((v * 255.0 + 0.5) as usize).min(HISTOGRAM_BINS - 1)
}

/// Compute the histogram of a rendered frame.
///
/// Luma uses Rec. 709 weights on the clamped RGB values.
pub fn compute(frame: &Frame) -> HistogramData {
    let mut data = HistogramData::empty();
    for p in &frame.pixels {
        let rgb = [p[0], p[1], p[2]].map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) });
        data.bins[0][bin_index(rgb[0])] += 1;
        data.bins[1][bin_index(rgb[1])] += 1;
        data.bins[2][bin_index(rgb[2])] += 1;
        data.bins[3][bin_index(luma(rgb))] += 1;
    }
    data.update_peak();
    data
}

/// Compute the histogram of tightly packed 8-bit RGBA.
pub fn compute_rgba8(bytes: &[u8]) -> HistogramData {
    let mut data = HistogramData::empty();
    for p in bytes.chunks_exact(4) {
        data.bins[0][p[0] as usize] += 1;
        data.bins[1][p[1] as usize] += 1;
        data.bins[2][p[2] as usize] += 1;
        let rgb = [p[0], p[1], p[2]].map(|c| c as f32 / 255.0);
        data.bins[3][bin_index(luma(rgb))] += 1;
    }
    data.update_peak();
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_sum_to_pixel_count() {
        let pixels = (0..300)
            .map(|i| {
                let v = (i % 17) as f32 / 16.0;
                [v, 1.0 - v, v * 0.5, 1.0]
            })
            .collect();
        let frame = Frame::new(30, 10, pixels).unwrap();
        let hist = compute(&frame);
        for channel in &hist.bins {
            assert_eq!(channel.len(), HISTOGRAM_BINS);
            assert_eq!(channel.iter().sum::<u32>(), 300);
        }
        assert_eq!(hist.total(), 300);
    }

    #[test]
    fn test_solid_color_lands_in_one_bin() {
        let hist = compute(&Frame::filled(4, 4, [1.0, 0.0, 0.5, 1.0]));
        assert_eq!(hist.channel(HistogramChannel::Red)[255], 16);
        assert_eq!(hist.channel(HistogramChannel::Green)[0], 16);
        assert_eq!(hist.channel(HistogramChannel::Blue)[128], 16);
        assert_eq!(hist.peak, 16);
    }

    #[test]
    fn test_white_luma_is_top_bin() {
        let hist = compute(&Frame::filled(2, 2, [1.0; 4]));
        assert_eq!(hist.channel(HistogramChannel::Luma)[255], 4);
    }

    #[test]
    fn test_out_of_range_and_nan_are_clamped() {
        let frame = Frame::new(3, 1, vec![[-1.0; 4], [2.0; 4], [f32::NAN; 4]]).unwrap();
        let hist = compute(&frame);
        assert_eq!(hist.bins[0][0], 2);
        assert_eq!(hist.bins[0][255], 1);
    }

    #[test]
    fn test_rgba8_matches_float_path() {
        let bytes: Vec<u8> = (0..=255u8).flat_map(|v| [v, v / 3, 255 - v, 255]).collect();
        let frame = Frame::from_rgba8(16, 16, &bytes).unwrap();
        assert_eq!(compute_rgba8(&bytes), compute(&frame));
    }

    #[test]
    fn test_from_flat_requires_exact_length() {
        assert!(HistogramData::from_flat(&[0; 10]).is_none());
        let mut flat = vec![0u32; HISTOGRAM_BINS * 4];
        flat[3 * HISTOGRAM_BINS + 7] = 9;
        let hist = HistogramData::from_flat(&flat).unwrap();
        assert_eq!(hist.channel(HistogramChannel::Luma)[7], 9);
        assert_eq!(hist.peak, 9);
    }

    #[test]
    fn test_normalized_peak_is_one() {
        let hist = compute(&Frame::filled(3, 3, [0.2, 0.4, 0.6, 1.0]));
        let n = hist.normalized(HistogramChannel::Red);
        assert_eq!(n.iter().cloned().fold(0.0, f32::max), 1.0);
    }
}
