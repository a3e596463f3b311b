//! Render cadence and histogram sampling cadence.
//!
//! Both are plain state machines driven by the host's clock, so the same
//! logic runs under Bevy's `Time` and in unit tests.

use std::time::Duration;

use tracing::debug;

/// Decides whether the current tick needs a new composite.
///
/// While playing every tick renders. While paused, a settings change or a
/// seek marks the scheduler dirty and exactly one render follows. A static
/// source with static settings never re-renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderScheduler {
    playing: bool,
    dirty: bool,
}

impl RenderScheduler {
    /// A scheduler that renders on its first tick.
    pub fn new() -> Self {
        Self {
            playing: false,
            dirty: true,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.playing && !playing {
            // Render the frame playback stopped on.
            self.dirty = true;
        }
        self.playing = playing;
    }

    /// Settings changed or the source seeked.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the pending render, if any. Call once per tick.
    pub fn should_render(&mut self) -> bool {
        let render = self.playing || self.dirty;
        if render && !self.playing {
            debug!("Rendering paused frame after change");
        }
        self.dirty = false;
        render
    }
}

/// Ticket for one histogram sample. Results are accepted only while the
/// ticket is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTicket(u64);

/// Fires on a fixed interval, independent of the render rate.
///
/// Sampling is best-effort: the sampled frame is whatever was rendered last.
/// Results from a ticket issued before [`invalidate`](Self::invalidate) or
/// superseded by a newer ticket are stale and must be dropped.
#[derive(Debug, Clone)]
pub struct HistogramSampler {
    interval: Duration,
    last: Option<Duration>,
    generation: u64,
}

impl HistogramSampler {
    /// Zero intervals are raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last: None,
            generation: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Returns a ticket when a sample is due at `now` (time since start).
    pub fn poll(&mut self, now: Duration) -> Option<SampleTicket> {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        };
        if !due {
            return None;
        }
        self.last = Some(now);
        self.generation += 1;
        Some(SampleTicket(self.generation))
    }

    /// Drop every outstanding ticket, e.g. when a new clip is loaded.
    ///
    /// The interval keeps running, so a stream of edits cannot force a
    /// sample on every tick.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Whether a result for `ticket` should still be displayed.
    pub fn is_current(&self, ticket: SampleTicket) -> bool {
        ticket.0 == self.generation
    }
}

impl Default for HistogramSampler {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
