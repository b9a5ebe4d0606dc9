//! Frame-driven game loop with a clamped variable timestep.
//!
//! The host owns the actual frame primitive (a redraw request, an animation
//! frame callback, a test fake) behind `FrameScheduler`. Each delivered frame
//! calls `GameLoop::tick`, which measures the wall-clock gap, clamps it to
//! `MAX_DELTA` so a long stall (window hidden, debugger pause) cannot produce
//! a giant simulation step, and runs update then render exactly once.
//!
//! `stop()` cancels the pending frame, but a frame the host already queued can
//! still arrive; `tick` checks `running` first and ignores it.

const FPS_SAMPLE_COUNT: usize = 60;

/// Upper bound for a single update step, in seconds.
pub const MAX_DELTA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Update/render pair driven by the loop.
pub trait FrameHandler {
    fn update(&mut self, dt: f64);
    fn render(&mut self);
}

/// Rolling frame-time statistics for the debug overlay.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: [f64; FPS_SAMPLE_COUNT],
    sample_index: usize,
    pub frame_count: u64,
    pub last_dt: f64,
    pub clamped_frames: u64,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            sample_index: 0,
            frame_count: 0,
            last_dt: 0.0,
            clamped_frames: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    fn record(&mut self, dt: f64) {
        self.frame_count += 1;
        self.last_dt = dt;
        self.samples[self.sample_index] = dt;
        self.sample_index = (self.sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

pub struct GameLoop<S: FrameScheduler> {
    scheduler: S,
    running: bool,
    last_time_ms: f64,
    pending: Option<FrameToken>,
    pub stats: FrameStats,
}

impl<S: FrameScheduler> GameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            running: false,
            last_time_ms: 0.0,
            pending: None,
            stats: FrameStats::new(),
        }
    }

    /// Begin ticking. Calling again while running changes nothing.
    pub fn start(&mut self, now_ms: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_time_ms = now_ms;
        self.pending = Some(self.scheduler.request_frame());
        log::info!("Game loop started");
    }

    /// Run one frame. Returns `false` if the loop is stopped and the frame
    /// was ignored.
    pub fn tick(&mut self, now_ms: f64, handler: &mut impl FrameHandler) -> bool {
        if !self.running {
            return false;
        }
        self.pending = None;

        let dt = clamp_delta(now_ms - self.last_time_ms);
        if (now_ms - self.last_time_ms) / 1000.0 > MAX_DELTA {
            self.stats.clamped_frames += 1;
            log::debug!(
                "Frame gap {:.1}ms clamped to {}ms",
                now_ms - self.last_time_ms,
                MAX_DELTA * 1000.0
            );
        }
        self.last_time_ms = now_ms;
        self.stats.record(dt);

        handler.update(dt);
        handler.render();

        // The handler may have stopped the loop through shared state; only
        // reschedule if we are still meant to run.
        if self.running {
            self.pending = Some(self.scheduler.request_frame());
        }
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Game loop stopped");
        }
        self.running = false;
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel_frame(token);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

/// Convert a millisecond gap into a step in `0..=MAX_DELTA` seconds.
/// Negative gaps (clock adjustments) become zero.
pub fn clamp_delta(gap_ms: f64) -> f64 {
    if !gap_ms.is_finite() {
        return 0.0;
    }
    (gap_ms / 1000.0).clamp(0.0, MAX_DELTA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[derive(Default)]
    struct FakeScheduler {
        next: u64,
        requested: Vec<FrameToken>,
        cancelled: Vec<FrameToken>,
    }

    impl FrameScheduler for FakeScheduler {
        fn request_frame(&mut self) -> FrameToken {
            self.next += 1;
            let token = FrameToken(self.next);
            self.requested.push(token);
            token
        }

        fn cancel_frame(&mut self, token: FrameToken) {
            self.cancelled.push(token);
        }
    }

    #[derive(Default)]
    struct Recorder {
        deltas: Vec<f64>,
        calls: Vec<&'static str>,
    }

    impl FrameHandler for Recorder {
        fn update(&mut self, dt: f64) {
            self.deltas.push(dt);
            self.calls.push("update");
        }

        fn render(&mut self) {
            self.calls.push("render");
        }
    }

    #[test]
    fn start_is_idempotent() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        game_loop.start(0.0);
        game_loop.start(5.0);
        assert_eq!(game_loop.scheduler().requested.len(), 1);
        assert!(game_loop.is_running());
    }

    #[test]
    fn tick_runs_update_then_render_and_reschedules() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        game_loop.start(1000.0);
        assert!(game_loop.tick(1016.0, &mut handler));
        assert_eq!(handler.calls, vec!["update", "render"]);
        assert!((handler.deltas[0] - 0.016).abs() < 1e-9);
        assert_eq!(game_loop.scheduler().requested.len(), 2);
    }

    #[test]
    fn delta_is_clamped_for_any_gap() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        let mut now = 0.0;
        game_loop.start(now);
        for _ in 0..500 {
            // Includes backwards jumps and multi-second stalls.
            now += rng.gen_range(-50.0..5000.0);
            game_loop.tick(now, &mut handler);
        }
        assert_eq!(handler.deltas.len(), 500);
        for dt in handler.deltas {
            assert!((0.0..=MAX_DELTA).contains(&dt), "dt {dt} out of range");
        }
    }

    #[test]
    fn long_stall_counts_as_clamped() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        game_loop.start(0.0);
        game_loop.tick(3000.0, &mut handler);
        assert_eq!(handler.deltas, vec![MAX_DELTA]);
        assert_eq!(game_loop.stats.clamped_frames, 1);
    }

    #[test]
    fn tick_after_stop_is_ignored() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        game_loop.start(0.0);
        game_loop.stop();
        // A frame that was already in flight arrives anyway.
        assert!(!game_loop.tick(16.0, &mut handler));
        assert!(handler.calls.is_empty());
    }

    #[test]
    fn stop_twice_cancels_once_and_schedules_nothing() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        game_loop.start(0.0);
        game_loop.stop();
        game_loop.stop();
        assert_eq!(game_loop.scheduler().requested.len(), 1);
        assert_eq!(game_loop.scheduler().cancelled, vec![FrameToken(1)]);
        assert!(!game_loop.is_running());
    }

    #[test]
    fn restart_after_stop_resets_clock() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        game_loop.start(0.0);
        game_loop.stop();
        game_loop.start(10_000.0);
        game_loop.tick(10_020.0, &mut handler);
        assert!((handler.deltas[0] - 0.02).abs() < 1e-9);
    }

    #[test]
    fn clamp_delta_handles_odd_inputs() {
        assert_eq!(clamp_delta(-5.0), 0.0);
        assert_eq!(clamp_delta(f64::NAN), 0.0);
        assert_eq!(clamp_delta(f64::INFINITY), 0.0);
        assert_eq!(clamp_delta(50.0), 0.05);
    }

    #[test]
    fn stats_track_frames() {
        let mut game_loop = GameLoop::new(FakeScheduler::default());
        let mut handler = Recorder::default();
        game_loop.start(0.0);
        for i in 1..=120 {
            game_loop.tick(i as f64 * 20.0, &mut handler);
        }
        assert_eq!(game_loop.stats.frame_count, 120);
        assert!((game_loop.stats.smoothed_fps - 50.0).abs() < 0.01);
    }
}
