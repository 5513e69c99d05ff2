//! Fixed-timestep clock using an accumulator pattern.
//!
//! The host calls `update()` with wall-clock timestamps at whatever rate it
//! likes. `TickClock` converts that into whole ticks of a fixed length, so
//! passive income is credited in deterministic steps.

pub struct TickClock {
    /// Milliseconds per tick (e.g. 1000ms = one tick per second)
    ms_per_tick: f64,
    /// Largest frame delta accepted, in ms
    max_delta_ms: f64,
    /// Accumulated milliseconds not yet consumed as ticks
    accumulator: f64,
    /// Total elapsed ticks since creation
    pub total_ticks: u64,
    /// Timestamp of the last update (ms), None if first frame
    last_timestamp: Option<f64>,
}

impl TickClock {
    pub fn new(tick_interval_ms: u64, max_delta_ms: u64) -> Self {
        Self {
            ms_per_tick: tick_interval_ms.max(1) as f64,
            max_delta_ms: max_delta_ms as f64,
            accumulator: 0.0,
            total_ticks: 0,
            last_timestamp: None,
        }
    }

    /// Feed a wall-clock timestamp. Returns the whole ticks that elapsed.
    pub fn update(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_timestamp {
            // Clamp so a backgrounded tab does not dump hours of ticks at once
            Some(prev) => (now_ms - prev).clamp(0.0, self.max_delta_ms),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        self.total_ticks += ticks as u64;
        ticks
    }

    /// Seconds covered by `ticks` ticks.
    pub fn seconds(&self, ticks: u32) -> f64 {
        ticks as f64 * self.ms_per_tick / 1000.0
    }
}

/// Wall-clock milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

/// Wall-clock milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
