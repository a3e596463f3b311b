//! Frame sources: where the compositor's input comes from.

use std::time::Duration;

use tracing::debug;

use crate::frame::{Frame, FrameError};

/// A decoded video or still the compositor can pull frames from.
///
/// Hosts wrap their decoder in this trait. [`FrameSequence`] is the
/// in-memory implementation.
pub trait FrameSource {
    /// The frame to display now. `None` while nothing is loaded.
    fn current_frame(&self) -> Option<&Frame>;

    /// Index of the current frame. Seeds per-frame effects such as grain.
    fn frame_index(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_playing(&self) -> bool;

    fn set_playing(&mut self, playing: bool);

    /// Move playback forward by `dt`. Returns `true` when the current frame
    /// changed. No-op while paused.
    fn advance(&mut self, dt: Duration) -> bool;

    /// Jump to frame `index`.
    fn seek(&mut self, index: usize) -> Result<(), FrameError>;
}

/// Frames held in memory, played back at a fixed rate.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    frame_duration: Duration,
    position: usize,
    playing: bool,
    looping: bool,
    elapsed: Duration,
}

impl FrameSequence {
    /// Slowest and fastest supported playback rates.
    pub const FPS_RANGE: std::ops::RangeInclusive<f32> = 0.001..=1000.0;

    /// `fps` is clamped to [`FPS_RANGE`](Self::FPS_RANGE); values that are
    /// not finite and positive fall back to 30.
    pub fn new(frames: Vec<Frame>, fps: f32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps.clamp(*Self::FPS_RANGE.start(), *Self::FPS_RANGE.end())
        } else {
            30.0
        };
        Self {
            frames,
            frame_duration: Duration::from_secs_f64(1.0 / fps as f64),
            position: 0,
            playing: false,
            looping: true,
            elapsed: Duration::ZERO,
        }
    }

    /// A one-frame source, e.g. for grading a still.
    pub fn still(frame: Frame) -> Self {
        Self::new(vec![frame], 30.0)
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}

impl FrameSource for FrameSequence {
    fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.position)
    }

    fn frame_index(&self) -> usize {
        self.position
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing && !self.frames.is_empty();
        self.elapsed = Duration::ZERO;
    }

    fn advance(&mut self, dt: Duration) -> bool {
        if !self.playing || self.frames.len() < 2 {
            return false;
        }
        self.elapsed += dt;
        // Nonzero: the frame rate is clamped in `new`.
        let frame_ns = self.frame_duration.as_nanos().max(1);
        let steps = self.elapsed.as_nanos() / frame_ns;
        if steps == 0 {
            return false;
        }
        self.elapsed = Duration::from_nanos((self.elapsed.as_nanos() % frame_ns) as u64);

        let len = self.frames.len() as u128;
        let start = self.position;
        let target = self.position as u128 + steps;
        if target < len {
            self.position = target as usize;
        } else if self.looping {
            self.position = (target % len) as usize;
        } else {
            debug!("Reached end of sequence, pausing");
            self.position = self.frames.len() - 1;
            self.playing = false;
            self.elapsed = Duration::ZERO;
        }
        self.position != start
    }

    fn seek(&mut self, index: usize) -> Result<(), FrameError> {
        if index >= self.frames.len() {
            return Err(FrameError::OutOfRange {
                index,
                len: self.frames.len(),
            });
        }
        self.position = index;
        self.elapsed = Duration::ZERO;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(n: usize) -> FrameSequence {
        let frames = (0..n)
            .map(|i| Frame::filled(2, 2, [i as f32 / n as f32, 0.0, 0.0, 1.0]))
            .collect();
        FrameSequence::new(frames, 10.0)
    }

    #[test]
    fn test_paused_sequence_does_not_advance() {
        let mut seq = sequence(3);
        assert!(!seq.advance(Duration::from_secs(1)));
        assert_eq!(seq.frame_index(), 0);
    }

    #[test]
    fn test_playback_steps_at_frame_rate() {
        let mut seq = sequence(5);
        seq.set_playing(true);
        assert!(!seq.advance(Duration::from_millis(50)));
        assert!(seq.advance(Duration::from_millis(60)));
        assert_eq!(seq.frame_index(), 1);
        assert!(seq.advance(Duration::from_millis(200)));
        assert_eq!(seq.frame_index(), 3);
    }

    #[test]
    fn test_loops_or_stops_at_end() {
        let mut looping = sequence(2);
        looping.set_playing(true);
        looping.advance(Duration::from_millis(210));
        assert_eq!(looping.frame_index(), 0);
        assert!(looping.is_playing());

        let mut once = sequence(2).with_looping(false);
        once.set_playing(true);
        once.advance(Duration::from_millis(210));
        assert_eq!(once.frame_index(), 1);
        assert!(!once.is_playing());
    }

    #[test]
    fn test_seek_bounds() {
        let mut seq = sequence(3);
        seq.seek(2).unwrap();
        assert_eq!(seq.frame_index(), 2);
        let err = seq.seek(3).unwrap_err();
        assert!(matches!(err, FrameError::OutOfRange { index: 3, len: 3 }));
        assert_eq!(seq.frame_index(), 2);
    }

    #[test]
    fn test_empty_sequence_never_plays() {
        let mut seq = FrameSequence::new(Vec::new(), 24.0);
        seq.set_playing(true);
        assert!(!seq.is_playing());
        assert!(seq.current_frame().is_none());
    }

    #[test]
    fn test_extreme_frame_rates_are_clamped() {
        let slow = FrameSequence::new(vec![Frame::filled(1, 1, [0.0; 4]); 2], 1e-30);
        assert!((slow.frame_duration().as_secs_f64() - 1000.0).abs() < 0.01);

        let mut fast = FrameSequence::new(vec![Frame::filled(1, 1, [0.0; 4]); 2], 1e10);
        assert!((fast.frame_duration().as_secs_f64() - 0.001).abs() < 1e-9);
        fast.set_playing(true);
        fast.advance(Duration::from_millis(16));
        assert_eq!(fast.frame_index(), 0, "16 steps around a 2-frame loop");
        fast.advance(Duration::from_secs(3600));
        assert!(fast.is_playing());
    }

    #[test]
    fn test_long_stall_lands_on_the_right_frame() {
        let mut seq = sequence(3);
        seq.set_playing(true);
        // 10 fps: 1.25 s is 12 frames plus a remainder, 12 % 3 = 0.
        assert!(!seq.advance(Duration::from_millis(1250)));
        assert_eq!(seq.frame_index(), 0);
        assert!(seq.advance(Duration::from_millis(50)));
        assert_eq!(seq.frame_index(), 1);
    }
}
