//! Fixed-step timing state

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingOptions {
    pub fps: f32,
    /// Step length in milliseconds. Derived from `fps` when absent.
    pub delta: Option<u32>,
    /// Opaque scalar multiplied into integration
    pub correction: f32,
    pub max_steps_per_tick: u32,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self { fps: 60.0, delta: None, correction: 1.0, max_steps_per_tick: 20 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Timing {
    pub fps: f32,
    /// Last timestamp seen by the heartbeat
    pub timestamp: f64,
    /// Fixed step length in milliseconds
    pub delta: u32,
    pub correction: f32,
    pub max_steps_per_tick: u32,
    /// Whole milliseconds not yet consumed by a step
    pub accumulator: i64,
    pub total_updates: u64,
}

impl Timing {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(options: &TimingOptions) -> Self {
        let delta = options
            .delta
            .unwrap_or_else(|| (1000.0 / options.fps).ceil() as u32)
            .max(1);
        Self {
            fps: options.fps,
            timestamp: 0.0,
            delta,
            correction: options.correction,
            max_steps_per_tick: options.max_steps_per_tick,
            accumulator: 0,
            total_updates: 0,
        }
    }

    /// Feed a wall-clock timestamp. Adds the whole milliseconds elapsed since
    /// the previous one to the accumulator.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self, timestamp: f64) {
        let frame_time = timestamp - self.timestamp;
        self.timestamp = timestamp;
        // Saturating float to int cast; NaN becomes 0
        self.accumulator = self.accumulator.saturating_add(frame_time.floor() as i64);
    }

    /// True when a whole step is waiting in the accumulator
    pub fn step_ready(&self) -> bool {
        self.accumulator >= i64::from(self.delta)
    }

    pub fn consume_step(&mut self) {
        self.accumulator -= i64::from(self.delta);
        self.total_updates += 1;
    }

    /// Simulated time of the latest step: `total_updates * delta`
    #[allow(clippy::cast_precision_loss)]
    pub fn local_timestamp(&self) -> f64 {
        self.total_updates as f64 * f64::from(self.delta)
    }

    pub fn delta_ms(&self) -> f64 {
        f64::from(self.delta)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(&TimingOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_rounded_up() {
        assert_eq!(Timing::default().delta, 17);
        let timing = Timing::new(&TimingOptions { delta: Some(16), ..Default::default() });
        assert_eq!(timing.delta, 16);
    }

    #[test]
    fn fractional_time_is_truncated() {
        let mut timing = Timing::default();
        timing.advance(10.9);
        timing.advance(21.5);
        // floor(10.9) + floor(10.6)
        assert_eq!(timing.accumulator, 20);
    }
}
