//! Time Management
//!
//! Frame timing for the engine loop:
//! - Variable frame step with clamping, time scale and pause
//! - Fixed-step accumulator for simulation systems

/// Fixed time step configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimeStep {
    /// Fixed timestep in seconds
    pub step: f64,
    /// Maximum number of fixed updates per frame (to prevent spiral of death)
    pub max_updates: u32,
}

impl Default for FixedTimeStep {
    fn default() -> Self {
        Self {
            step: 1.0 / 60.0,
            max_updates: 8,
        }
    }
}

impl FixedTimeStep {
    /// Create a fixed time step running at the given frequency
    pub fn from_hz(hz: f64) -> Self {
        Self {
            step: 1.0 / hz,
            ..Self::default()
        }
    }

    /// Set the maximum number of updates per frame
    pub fn with_max_updates(mut self, max: u32) -> Self {
        self.max_updates = max;
        self
    }
}

/// Largest frame delta accepted, in seconds
const MAX_FRAME_DELTA: f64 = 0.25;

/// Tracks frame time and the fixed-update accumulator
#[derive(Debug, Clone)]
pub struct TimeManager {
    fixed: FixedTimeStep,
    /// Scaled delta time of the last frame
    delta_time: f64,
    /// Scaled time since start
    total_time: f64,
    fixed_accumulator: f64,
    fixed_updates_this_frame: u32,
    frame_count: u64,
    fixed_update_count: u64,
    time_scale: f64,
    paused: bool,
}

impl TimeManager {
    /// Create a time manager with the given fixed step
    pub fn new(fixed: FixedTimeStep) -> Self {
        Self {
            fixed,
            delta_time: 0.0,
            total_time: 0.0,
            fixed_accumulator: 0.0,
            fixed_updates_this_frame: 0,
            frame_count: 0,
            fixed_update_count: 0,
            time_scale: 1.0,
            paused: false,
        }
    }

    /// Start a new frame that took `delta_time` seconds
    pub fn update(&mut self, delta_time: f64) {
        let clamped = delta_time.clamp(0.0, MAX_FRAME_DELTA);
        let scaled = if self.paused { 0.0 } else { clamped * self.time_scale };

        self.delta_time = scaled;
        self.total_time += scaled;
        self.fixed_accumulator += scaled;
        self.fixed_updates_this_frame = 0;
        self.frame_count += 1;
    }

    /// Consume one fixed step from the accumulator if one is due.
    ///
    /// Once the per-frame cap is hit the remaining backlog is dropped. A step
    /// that is not positive never runs.
    pub fn next_fixed_step(&mut self) -> bool {
        if self.fixed.step.is_nan() || self.fixed.step <= 0.0 {
            return false;
        }
        if self.fixed_accumulator < self.fixed.step {
            return false;
        }
        if self.fixed_updates_this_frame >= self.fixed.max_updates {
            self.fixed_accumulator %= self.fixed.step;
            return false;
        }

        self.fixed_accumulator -= self.fixed.step;
        self.fixed_updates_this_frame += 1;
        self.fixed_update_count += 1;
        true
    }

    /// Fixed step settings
    pub fn fixed_step(&self) -> FixedTimeStep {
        self.fixed
    }

    /// How far the accumulator is into the next fixed step, in `[0, 1]`
    pub fn fixed_interpolation(&self) -> f64 {
        if self.fixed.step.is_nan() || self.fixed.step <= 0.0 {
            return 0.0;
        }
        (self.fixed_accumulator / self.fixed.step).clamp(0.0, 1.0)
    }

    /// Scaled delta time of the current frame
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Scaled time since start
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fixed_update_count(&self) -> u64 {
        self.fixed_update_count
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the time scale (for slow motion or fast forward)
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new(FixedTimeStep::default())
    }
}
