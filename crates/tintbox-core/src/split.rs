//! Before/after split-view comparison.

use serde::{Deserialize, Serialize};

/// Which side of the split shows the graded render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradedSide {
    #[default]
    Left,
    Right,
}

/// Split position and orientation. `position` is a normalized horizontal
/// coordinate in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitView {
    pub position: f32,
    #[serde(default)]
    pub graded_side: GradedSide,
}

/// What a given column of the output shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRegion {
    Graded,
    Raw,
    Divider,
}

impl SplitView {
    pub fn new(position: f32) -> Self {
        Self {
            position: sanitize_position(position),
            graded_side: GradedSide::Left,
        }
    }

    pub fn with_graded_side(self, graded_side: GradedSide) -> Self {
        Self {
            graded_side,
            ..self
        }
    }

    /// Classify pixel column `x` of a `width`-wide frame.
    ///
    /// The column center `(x + 0.5) / width` is compared against the split
    /// position: `< position` is the left side, `>= position` the right.
    /// Columns whose center lies within half the divider width of the
    /// boundary are the divider.
    pub fn region(&self, x: u32, width: u32, divider_width_px: f32) -> SplitRegion {
        let position = sanitize_position(self.position);
        let center = x as f32 + 0.5;
        let boundary = position * width as f32;
        if divider_width_px > 0.0 && (center - boundary).abs() < divider_width_px * 0.5 {
            return SplitRegion::Divider;
        }
        let left = center < boundary;
        match (left, self.graded_side) {
            (true, GradedSide::Left) | (false, GradedSide::Right) => SplitRegion::Graded,
            _ => SplitRegion::Raw,
        }
    }
}

fn sanitize_position(p: f32) -> f32 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.5 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_graded_by_default() {
        let split = SplitView::new(0.5);
        assert_eq!(split.region(0, 10, 0.0), SplitRegion::Graded);
        assert_eq!(split.region(4, 10, 0.0), SplitRegion::Graded);
        assert_eq!(split.region(5, 10, 0.0), SplitRegion::Raw);
        assert_eq!(split.region(9, 10, 0.0), SplitRegion::Raw);
    }

    #[test]
    fn test_graded_right_swaps_sides() {
        let split = SplitView::new(0.5).with_graded_side(GradedSide::Right);
        assert_eq!(split.region(0, 10, 0.0), SplitRegion::Raw);
        assert_eq!(split.region(9, 10, 0.0), SplitRegion::Graded);
    }

    #[test]
    fn test_divider_straddles_boundary() {
        let split = SplitView::new(0.5);
        assert_eq!(split.region(4, 10, 2.0), SplitRegion::Divider);
        assert_eq!(split.region(5, 10, 2.0), SplitRegion::Divider);
        assert_eq!(split.region(3, 10, 2.0), SplitRegion::Graded);
        assert_eq!(split.region(6, 10, 2.0), SplitRegion::Raw);
    }

    #[test]
    fn test_extreme_positions() {
        let all_raw = SplitView::new(0.0);
        let all_graded = SplitView::new(1.0);
        for x in 0..8 {
            assert_eq!(all_raw.region(x, 8, 0.0), SplitRegion::Raw);
            assert_eq!(all_graded.region(x, 8, 0.0), SplitRegion::Graded);
        }
        assert_eq!(SplitView::new(f32::NAN).position, 0.5);
    }
}
