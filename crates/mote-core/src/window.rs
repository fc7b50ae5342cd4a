//! Fixed-depth ring windows, the building block of the cascade.

use serde::{Deserialize, Serialize};

use crate::config::{CHANNEL_COUNT, WINDOW_DEPTH};
use crate::sample::Sample;

/// A circular buffer of the last [`WINDOW_DEPTH`] admitted samples.
///
/// "Full" is purely a function of admission count modulo the depth: the
/// window reports an average exactly when a write wraps the cursor back to
/// slot 0, independent of which physical tick caused the write. The whole
/// struct is plain data so it serializes into the durable snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingWindow {
    slots: [Sample; WINDOW_DEPTH],
    cursor: usize,
}

impl Default for RingWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl RingWindow {
    pub const fn new() -> Self {
        Self {
            slots: [Sample::zeroed(); WINDOW_DEPTH],
            cursor: 0,
        }
    }

    /// Write `sample` at the cursor and advance it modulo the depth.
    ///
    /// Returns the window mean exactly when the write wraps the cursor to 0,
    /// i.e. once per [`WINDOW_DEPTH`] admissions.
    pub fn admit(&mut self, sample: Sample) -> Option<Sample> {
        self.slots[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % WINDOW_DEPTH;
        if self.cursor == 0 { Some(self.mean()) } else { None }
    }

    /// Per-channel floor mean of all stored slots.
    ///
    /// With a power-of-two depth this is an arithmetic right shift; the
    /// integer-division fallback keeps non-power-of-two builds correct.
    pub fn mean(&self) -> Sample {
        let mut out = Sample::zeroed();
        for ch in 0..CHANNEL_COUNT {
            let mut sum: i32 = 0;
            for slot in &self.slots {
                sum += i32::from(slot.channels[ch]);
            }
            let mean = if WINDOW_DEPTH.is_power_of_two() {
                sum >> WINDOW_DEPTH.trailing_zeros()
            } else {
                sum.div_euclid(WINDOW_DEPTH as i32)
            };
            out.channels[ch] = mean as i16;
        }
        out
    }

    /// Broadcast `sample` into every slot and reset the cursor.
    ///
    /// Used for cold-start seeding so no mean is ever computed against
    /// undefined slot contents.
    pub fn fill(&mut self, sample: Sample) {
        self.slots = [sample; WINDOW_DEPTH];
        self.cursor = 0;
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: i16) -> Sample {
        Sample::splat(v)
    }

    #[test]
    fn test_emits_mean_every_depth_admissions() {
        let mut w = RingWindow::new();
        let stream: [i16; 8] = [10, 20, 30, 40, 50, 60, 70, 80];
        let mut means = heapless::Vec::<i16, 4>::new();

        for v in stream {
            if let Some(avg) = w.admit(uniform(v)) {
                means.push(avg.channels[0]).unwrap();
            }
        }

        // Floor mean of each consecutive depth-4 block.
        assert_eq!(means.as_slice(), &[25, 65]);
    }

    #[test]
    fn test_floor_mean_of_negative_sums() {
        let mut w = RingWindow::new();
        let mut result = None;
        for v in [-1, -1, -1, 0] {
            result = w.admit(uniform(v));
        }
        // Sum -3 over depth 4 floors to -1, not 0.
        assert_eq!(result.unwrap().channels[0], -1);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut w = RingWindow::new();
        for i in 0..37 {
            assert!(w.cursor() < WINDOW_DEPTH);
            w.admit(uniform(i));
        }
        assert_eq!(w.cursor(), 37 % WINDOW_DEPTH);
    }

    #[test]
    fn test_fill_broadcasts_and_resets() {
        let mut w = RingWindow::new();
        w.admit(uniform(5));
        w.fill(uniform(100));
        assert_eq!(w.cursor(), 0);
        assert_eq!(w.mean(), uniform(100));
    }

    #[test]
    fn test_mean_mixes_channels_independently() {
        let mut w = RingWindow::new();
        let mut a = Sample::zeroed();
        a.channels[0] = 8;
        let mut b = Sample::zeroed();
        b.channels[1] = 16;
        w.admit(a);
        w.admit(a);
        w.admit(b);
        w.admit(b);
        let m = w.mean();
        assert_eq!(m.channels[0], 4);
        assert_eq!(m.channels[1], 8);
        assert_eq!(m.channels[2], 0);
    }
}
