//! Shared utilities

/// Deterministic 16-bit linear congruential generator
///
/// `state = state * 2053 + 13849`, wrapping. Sequences are bit-exact for a
/// given seed, which keeps effect output reproducible across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandGen {
    state: u16,
}

impl RandGen {
    pub const DEFAULT_SEED: u16 = 1337;
    const MUL: u16 = 2053;
    const INC: u16 = 13849;

    pub fn new(seed: u16) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn state(&self) -> u16 {
        self.state
    }

    #[inline]
    fn step(&mut self) -> u16 {
        self.state = self.state.wrapping_mul(Self::MUL).wrapping_add(Self::INC);
        self.state
    }

    /// Low byte of the next state
    #[inline]
    pub fn next_u8(&mut self) -> u8 {
        (self.step() & 0xFF) as u8
    }

    /// Value in `[0, lim)`
    #[inline]
    pub fn next_u8_below(&mut self, lim: u8) -> u8 {
        ((self.next_u8() as u16 * lim as u16) >> 8) as u8
    }

    /// Value in `[min, max]`; returns `min` when the range is inverted
    pub fn next_u8_in_range(&mut self, min: u8, max: u8) -> u8 {
        if min > max {
            return min;
        }
        let delta = max - min;
        if delta == u8::MAX {
            return self.next_u8();
        }
        self.next_u8_below(delta + 1) + min
    }

    #[inline]
    pub fn next_u16(&mut self) -> u16 {
        self.step()
    }

    /// Value in `[0, lim)`
    #[inline]
    pub fn next_u16_below(&mut self, lim: u16) -> u16 {
        ((self.next_u16() as u32 * lim as u32) >> 16) as u16
    }

    /// Value in `[min, max]`; returns `min` when the range is inverted
    pub fn next_u16_in_range(&mut self, min: u16, max: u16) -> u16 {
        if min > max {
            return min;
        }
        let delta = max - min;
        if delta == u16::MAX {
            return self.next_u16();
        }
        self.next_u16_below(delta + 1) + min
    }

    /// Coordinate in `[0, lim)`.
    ///
    /// Extents up to 256 draw a single byte, wider extents combine two bytes.
    pub fn next_coord_below(&mut self, lim: u16) -> u16 {
        match lim {
            0 => 0,
            1..=256 => ((self.next_u8() as u32 * lim as u32) >> 8) as u16,
            _ => {
                let hi = self.next_u8() as u32;
                let lo = self.next_u8() as u32;
                (((hi << 8 | lo) * lim as u32) >> 16) as u16
            },
        }
    }

    /// Mix external entropy into the state
    #[inline]
    pub fn add_entropy(&mut self, entropy: u16) {
        self.state = self.state.wrapping_add(entropy);
    }
}

impl Default for RandGen {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

// ============================================================================
// FPS Counter
// ============================================================================

use std::collections::VecDeque;
use std::time::Instant;

/// FPS counter with rolling average
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    last_frame: Instant,
    sample_count: usize,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_frame: Instant::now(),
            sample_count: sample_count.max(1),
        }
    }

    /// Record a frame. Returns `(delta_seconds, average_fps)`
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.sample_count {
            self.frame_times.pop_front();
        }

        let avg_dt = self.avg_frame_time_ms() / 1000.0;
        let avg_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        (dt, avg_fps)
    }

    /// Average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        let avg_dt: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32;
        avg_dt * 1000.0
    }

    /// Min/max FPS over the sample window
    pub fn min_max_fps(&self) -> (f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0);
        }
        let min_dt = self.frame_times.iter().copied().fold(f32::INFINITY, f32::min);
        let max_dt = self.frame_times.iter().copied().fold(0.0, f32::max);
        let max_fps = if min_dt > 0.0 { 1.0 / min_dt } else { 0.0 };
        let min_fps = if max_dt > 0.0 { 1.0 / max_dt } else { 0.0 };
        (min_fps, max_fps)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
}
