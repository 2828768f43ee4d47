//! The snowflake pool and its per-frame update.

use std::time::{Duration, Instant};

use flurry_core::{AnimationSpeed, Bounds, FieldConfig, ResizePolicy, Span};
use rand::{SeedableRng, rngs::StdRng};

use crate::particle::Particle;
use crate::render::{RenderTarget, Sprite, Unavailable};
use crate::subscription::SubscriberId;
use crate::timer::FrameTimer;
use crate::viewport::ResizeListener;
use crate::visibility::VisibilityListener;

/// Fixed-size pool of snowflakes.
///
/// The field is the only thing that mutates its particles and its render
/// target. Nothing it does is allowed to fail loudly: when the render target
/// or the viewport is missing, operations log a warning and do nothing.
#[derive(Debug)]
pub struct ParticleField<R: RenderTarget> {
    id: SubscriberId,
    config: FieldConfig,
    particles: Vec<Particle>,
    bounds: Option<Bounds>,
    target: Option<R>,
    timer: FrameTimer,
    active: bool,
    /// Set while the surface is hidden; frames stay stopped until it shows.
    hidden: bool,
    speed: AnimationSpeed,
    resize_policy: ResizePolicy,
    /// Animation time, advanced only by frames that ran.
    clock: Duration,
    next_id: u64,
    rng: StdRng,
    /// Last environment problem reported, so a missing target does not log
    /// once per frame.
    degraded: Option<Unavailable>,
}

impl<R: RenderTarget> ParticleField<R> {
    /// Create an empty, inactive field.
    pub fn new(config: FieldConfig, target: Option<R>) -> Self {
        Self::with_seed(config, target, rand::random())
    }

    /// Create an empty, inactive field with a fixed random seed.
    pub fn with_seed(config: FieldConfig, target: Option<R>, seed: u64) -> Self {
        Self {
            id: SubscriberId::unique(),
            config,
            particles: Vec::new(),
            bounds: None,
            target,
            timer: FrameTimer::default(),
            active: false,
            hidden: false,
            speed: AnimationSpeed::default(),
            resize_policy: ResizePolicy::default(),
            clock: Duration::ZERO,
            next_id: 0,
            rng: StdRng::seed_from_u64(seed),
            degraded: None,
        }
    }

    /// Identity used when subscribing to viewport and visibility sources.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Whether frames are currently being run.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the surface was last reported hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn speed(&self) -> AnimationSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: AnimationSpeed) {
        self.speed = speed;
    }

    pub fn resize_policy(&self) -> ResizePolicy {
        self.resize_policy
    }

    pub fn set_resize_policy(&mut self, policy: ResizePolicy) {
        self.resize_policy = policy;
    }

    pub fn set_frame_interval(&mut self, interval: Duration) {
        self.timer.set_interval(interval);
    }

    /// How long until the next frame is due, `None` while paused.
    pub fn time_until_frame(&self, now: Instant) -> Option<Duration> {
        self.timer.time_until_due(now)
    }

    pub fn target(&self) -> Option<&R> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut R> {
        self.target.as_mut()
    }

    /// Attach a render target, sizing it to the current bounds.
    pub fn attach(&mut self, mut target: R) -> Option<R> {
        if let Some(bounds) = self.bounds {
            target.fit(bounds);
        }
        self.degraded = None;
        self.target.replace(target)
    }

    /// Detach the render target. Later frames become no-ops.
    pub fn detach(&mut self) -> Option<R> {
        self.target.take()
    }

    /// Populate the pool with `count` fresh particles and start running.
    ///
    /// Any existing particles are released first. Does nothing (beyond a
    /// warning) without a render target or with unusable bounds.
    pub fn initialize(&mut self, count: usize, bounds: Bounds) {
        if let Err(e) = self.environment(Some(bounds)) {
            self.report(e);
            return;
        }

        self.release_all();
        self.bounds = Some(bounds);
        if let Some(target) = self.target.as_mut() {
            target.fit(bounds);
        }

        let spawn_y = Span::new(-self.config.spawn_margin, bounds.height);
        self.particles.reserve(count);
        for _ in 0..count {
            self.spawn(bounds, spawn_y);
        }
        self.config.count = count;

        log::debug!(
            "Initialized {count} particles in {}x{}",
            bounds.width,
            bounds.height
        );

        self.render();
        self.resume();
    }

    /// Advance every particle by one frame of length `delta`.
    ///
    /// `wind` is shared by all particles in the frame. Ignored while paused;
    /// a no-op frame without a render target or bounds.
    pub fn advance(&mut self, delta: Duration, wind: f32) {
        if !self.active {
            return;
        }
        let bounds = match self.environment(self.bounds) {
            Ok(bounds) => bounds,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        let frames = delta.as_secs_f32() * 1000.0 / self.config.reference_frame_ms;
        let damping = self.config.damping;
        let floor = bounds.height + self.config.despawn_margin;
        let left = -self.config.wrap_margin;
        let right = bounds.width + self.config.wrap_margin;

        for p in &mut self.particles {
            p.y += p.vy * frames;
            p.x += (p.vx + wind) * damping;
            p.rotation += p.rotation_speed;

            // Falling out the bottom respawns above; leaving a side wraps.
            if p.y > floor {
                p.respawn(&mut self.rng, bounds, self.config.respawn_band);
            }
            if p.x > right {
                p.x = left;
            } else if p.x < left {
                p.x = right;
            }
        }

        self.render();
    }

    /// Run a frame if one is due. Returns true if a frame ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        let Some(delta) = self.timer.poll(now) else {
            return false;
        };

        let delta = delta.mul_f32(self.speed.time_scale());
        self.clock += delta;
        let wind = self.wind_at(self.clock);
        self.advance(delta, wind);
        true
    }

    /// Wind force at animation time `clock`.
    pub fn wind_at(&self, clock: Duration) -> f32 {
        (clock.as_secs_f32() * self.config.wind_frequency).sin() * self.config.wind_strength
    }

    /// Update the bounds used for respawning and wrapping.
    ///
    /// Particles already in flight keep their positions.
    pub fn resize(&mut self, bounds: Bounds) {
        if !bounds.is_usable() {
            self.report(Unavailable::Viewport {
                width: bounds.width,
                height: bounds.height,
            });
            return;
        }
        self.bounds = Some(bounds);
        if let Some(target) = self.target.as_mut() {
            target.fit(bounds);
        }
    }

    /// Tear down and recreate the pool for `bounds`.
    ///
    /// A paused field stays paused; a field that never had particles starts
    /// unless the surface is hidden.
    pub fn rebuild(&mut self, bounds: Bounds) {
        let keep_paused = !self.active && !self.particles.is_empty();
        let count = self.config.count;
        self.teardown();
        self.initialize(count, bounds);
        if keep_paused {
            self.pause();
        }
    }

    /// Grow or shrink the pool to exactly `count` particles.
    ///
    /// Shrinking removes the oldest particles first.
    pub fn set_count(&mut self, count: usize) {
        let current = self.particles.len();
        if count < current {
            let removed: Vec<u64> = self.particles.drain(..current - count).map(|p| p.id).collect();
            if let Some(target) = self.target.as_mut() {
                for id in removed {
                    target.release(id);
                }
            }
        } else if count > current {
            let Some(bounds) = self.bounds else {
                self.report(Unavailable::Viewport {
                    width: 0.0,
                    height: 0.0,
                });
                return;
            };
            let band = self.config.respawn_band;
            for _ in current..count {
                self.spawn(bounds, band);
            }
        }
        self.config.count = count;
    }

    /// Stop running frames. Idempotent.
    pub fn pause(&mut self) {
        self.timer.cancel();
        if self.active {
            log::debug!("Particle field paused");
        }
        self.active = false;
    }

    /// Start running frames again. Does nothing if already running or while
    /// the surface is hidden.
    pub fn resume(&mut self) {
        if self.active {
            return;
        }
        if self.hidden {
            log::debug!("Surface hidden, particle field stays paused");
            return;
        }
        self.active = true;
        self.timer.arm(Instant::now());
        log::debug!("Particle field resumed");
    }

    /// Pause, release every particle and clear the render target.
    pub fn teardown(&mut self) {
        self.pause();
        self.release_all();
        if let Some(target) = self.target.as_mut() {
            target.clear();
        }
    }

    fn spawn(&mut self, bounds: Bounds, spawn_y: Span) {
        let particle = Particle::spawn(self.next_id, &mut self.rng, &self.config, bounds, spawn_y);
        self.next_id += 1;
        self.particles.push(particle);
    }

    fn release_all(&mut self) {
        let drained = self.particles.drain(..);
        match self.target.as_mut() {
            Some(target) => drained.for_each(|p| target.release(p.id)),
            None => drained.for_each(drop),
        }
    }

    fn render(&mut self) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        target.clear();
        for p in &self.particles {
            target.draw_glyph(&Sprite::from(p));
        }
    }

    /// Check that a render target and usable bounds are present.
    fn environment(&mut self, bounds: Option<Bounds>) -> Result<Bounds, Unavailable> {
        if self.target.is_none() {
            return Err(Unavailable::RenderTarget);
        }
        let bounds = bounds.ok_or(Unavailable::Viewport {
            width: 0.0,
            height: 0.0,
        })?;
        if !bounds.is_usable() {
            return Err(Unavailable::Viewport {
                width: bounds.width,
                height: bounds.height,
            });
        }
        self.degraded = None;
        Ok(bounds)
    }

    fn report(&mut self, problem: Unavailable) {
        if self.degraded != Some(problem) {
            log::warn!("Snowfall disabled: {problem}");
            self.degraded = Some(problem);
        }
    }
}

impl<R: RenderTarget> ResizeListener for ParticleField<R> {
    fn on_resize(&mut self, bounds: Bounds) {
        match self.resize_policy {
            ResizePolicy::Retain if !self.particles.is_empty() => self.resize(bounds),
            ResizePolicy::Retain | ResizePolicy::Rebuild => self.rebuild(bounds),
        }
    }
}

impl<R: RenderTarget> VisibilityListener for ParticleField<R> {
    fn on_hidden(&mut self) {
        self.hidden = true;
        self.pause();
    }

    fn on_visible(&mut self) {
        self.hidden = false;
        self.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingTarget;

    const FRAME: Duration = Duration::from_micros(16_600);

    fn bounds() -> Bounds {
        Bounds::new(800.0, 600.0)
    }

    fn field(config: FieldConfig) -> ParticleField<RecordingTarget> {
        ParticleField::with_seed(config, Some(RecordingTarget::default()), 42)
    }

    fn still_config() -> FieldConfig {
        FieldConfig {
            drift: Span::new(0.0, 0.0),
            rotation_speed: Span::new(0.0, 0.0),
            ..Default::default()
        }
    }

    fn assert_in_bounds(field: &ParticleField<RecordingTarget>) {
        let config = field.config();
        let height = field.bounds().map(|b| b.height).unwrap_or(0.0);
        for p in field.particles() {
            assert!(
                p.y >= -config.spawn_margin && p.y <= height + config.despawn_margin,
                "particle {} escaped at y={}",
                p.id,
                p.y
            );
        }
    }

    #[test]
    fn test_initialize_creates_exact_count() {
        let mut field = field(FieldConfig::default());
        field.initialize(30, bounds());

        assert_eq!(field.len(), 30);
        assert!(field.is_active());
        assert_eq!(field.target().unwrap().drawn.len(), 30);
        assert_eq!(field.target().unwrap().bounds, Some(bounds()));
        assert_in_bounds(&field);
    }

    #[test]
    fn test_thousand_frames_stay_in_bounds() {
        let mut field = field(FieldConfig::default());
        field.initialize(30, bounds());

        for _ in 0..1000 {
            field.advance(FRAME, 0.0);
            assert_in_bounds(&field);
        }
        assert_eq!(field.len(), 30);
        assert_eq!(field.target().unwrap().drawn.len(), 30);
    }

    #[test]
    fn test_windy_frames_stay_in_bounds() {
        let mut field = field(FieldConfig::default());
        field.initialize(50, bounds());

        for step in 0..2000 {
            let wind = field.wind_at(FRAME * step) * 20.0;
            field.advance(FRAME * 3, wind);
        }
        assert_in_bounds(&field);
        let right = 800.0 + field.config().wrap_margin;
        let left = -field.config().wrap_margin;
        assert!(field.particles().iter().all(|p| p.x >= left && p.x <= right));
    }

    #[test]
    fn test_missing_target_is_a_no_op() {
        let mut field: ParticleField<RecordingTarget> =
            ParticleField::with_seed(FieldConfig::default(), None, 1);
        field.initialize(30, bounds());
        assert!(field.is_empty());
        assert!(!field.is_active());

        field.advance(FRAME, 0.0);
        field.set_count(5);
        field.teardown();
        assert!(field.is_empty());
    }

    #[test]
    fn test_unusable_bounds_is_a_no_op() {
        let mut field = field(FieldConfig::default());
        field.initialize(30, Bounds::new(0.0, 600.0));
        assert!(field.is_empty());
        assert_eq!(field.bounds(), None);

        field.resize(Bounds::new(f32::NAN, 10.0));
        assert_eq!(field.bounds(), None);
    }

    #[test]
    fn test_detached_target_freezes_frames() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());
        let before = field.particles().to_vec();

        let target = field.detach();
        assert!(target.is_some());
        field.advance(FRAME, 0.0);
        assert_eq!(field.particles(), before.as_slice());

        field.attach(RecordingTarget::default());
        field.advance(FRAME, 0.0);
        assert_ne!(field.particles(), before.as_slice());
    }

    #[test]
    fn test_set_count_grows_and_shrinks() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());

        field.set_count(25);
        assert_eq!(field.len(), 25);
        field.set_count(4);
        assert_eq!(field.len(), 4);
        field.set_count(0);
        assert_eq!(field.len(), 0);
        field.set_count(7);
        assert_eq!(field.len(), 7);
        assert_eq!(field.config().count, 7);
    }

    #[test]
    fn test_shrink_removes_oldest() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());
        field.set_count(12);

        field.set_count(5);
        let ids: Vec<u64> = field.particles().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7, 8, 9, 10, 11]);
        assert_eq!(field.target().unwrap().released, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pause_is_idempotent_and_freezes() {
        let mut field = field(FieldConfig::default());
        field.initialize(20, bounds());

        field.pause();
        let once = field.particles().to_vec();
        field.pause();
        assert!(!field.is_active());
        assert_eq!(field.particles(), once.as_slice());

        for _ in 0..10 {
            field.advance(FRAME, 1.0);
        }
        assert!(!field.tick(Instant::now() + Duration::from_secs(1)));
        assert_eq!(field.particles(), once.as_slice());
        assert_eq!(field.time_until_frame(Instant::now()), None);
    }

    #[test]
    fn test_resume_is_idempotent() {
        let mut field = field(FieldConfig::default());
        field.initialize(5, bounds());
        field.pause();

        field.resume();
        let due = field.time_until_frame(Instant::now());
        field.resume();
        assert!(field.is_active());
        assert!(due.is_some());
        assert!(field.time_until_frame(Instant::now()) <= due);
    }

    #[test]
    fn test_wrap_to_opposite_edge() {
        let mut field = field(still_config());
        field.initialize(1, bounds());
        let margin = field.config().wrap_margin;

        field.particles[0].x = 800.0 + margin + 1.0;
        field.particles[0].y = 0.0;
        field.advance(FRAME, 0.0);
        assert_eq!(field.particles()[0].x, -margin);

        field.particles[0].x = -margin - 1.0;
        field.advance(FRAME, 0.0);
        assert_eq!(field.particles()[0].x, 800.0 + margin);
    }

    #[test]
    fn test_respawn_above_viewport() {
        let mut field = field(FieldConfig::default());
        field.initialize(8, bounds());
        let floor = 600.0 + field.config().despawn_margin;

        for p in &mut field.particles {
            p.y = floor + 1.0;
        }
        field.advance(FRAME, 0.0);

        for p in field.particles() {
            assert!((-100.0..=-10.0).contains(&p.y), "y={}", p.y);
            assert!((0.0..=800.0).contains(&p.x), "x={}", p.x);
        }
    }

    #[test]
    fn test_glyph_is_stable_across_respawn() {
        let mut field = field(FieldConfig::default());
        field.initialize(15, bounds());
        let glyphs: Vec<char> = field.particles().iter().map(|p| p.glyph()).collect();

        for _ in 0..5000 {
            field.advance(FRAME * 4, 0.0);
        }
        let after: Vec<char> = field.particles().iter().map(|p| p.glyph()).collect();
        assert_eq!(glyphs, after);
    }

    #[test]
    fn test_teardown_clears_everything() {
        let mut field = field(FieldConfig::default());
        field.initialize(12, bounds());
        field.teardown();

        assert!(field.is_empty());
        assert!(!field.is_active());
        let target = field.target().unwrap();
        assert!(target.drawn.is_empty());
        assert_eq!(target.released.len(), 12);
    }

    #[test]
    fn test_resize_keeps_particles() {
        let mut field = field(FieldConfig::default());
        field.set_resize_policy(ResizePolicy::Retain);
        field.initialize(10, bounds());
        let before = field.particles().to_vec();

        field.on_resize(Bounds::new(400.0, 300.0));
        assert_eq!(field.bounds(), Some(Bounds::new(400.0, 300.0)));
        assert_eq!(field.particles(), before.as_slice());
        assert_eq!(
            field.target().unwrap().bounds,
            Some(Bounds::new(400.0, 300.0))
        );
    }

    #[test]
    fn test_rebuild_recreates_pool() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());
        field.set_count(14);

        field.on_resize(Bounds::new(400.0, 300.0));
        assert_eq!(field.len(), 14);
        assert!(field.particles().iter().all(|p| p.id >= 14));
        assert!(field.is_active());

        field.pause();
        field.rebuild(bounds());
        assert_eq!(field.len(), 14);
        assert!(!field.is_active());
    }

    #[test]
    fn test_first_resize_starts_empty_field() {
        let mut field = field(FieldConfig {
            count: 6,
            ..Default::default()
        });
        field.set_resize_policy(ResizePolicy::Retain);
        assert!(field.is_empty());

        field.on_resize(bounds());
        assert_eq!(field.len(), 6);
        assert!(field.is_active());
    }

    #[test]
    fn test_visibility_pauses_and_resumes() {
        let mut field = field(FieldConfig::default());
        field.initialize(3, bounds());

        field.on_hidden();
        assert!(!field.is_active());
        field.on_visible();
        assert!(field.is_active());
    }

    #[test]
    fn test_hidden_field_stays_paused_through_first_resize() {
        let mut field = field(FieldConfig {
            count: 9,
            ..Default::default()
        });
        field.on_hidden();
        assert!(field.is_empty());

        field.on_resize(bounds());
        assert_eq!(field.len(), 9);
        assert!(!field.is_active());
        assert_eq!(field.time_until_frame(Instant::now()), None);

        field.resume();
        assert!(!field.is_active());
        field.on_visible();
        assert!(field.is_active());
        assert!(!field.is_hidden());
    }

    #[test]
    fn test_hidden_field_stays_paused_through_rebuild() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());
        field.on_hidden();

        field.rebuild(Bounds::new(400.0, 300.0));
        assert_eq!(field.len(), 10);
        assert!(!field.is_active());
    }

    #[test]
    fn test_tick_runs_due_frames() {
        let mut field = field(FieldConfig::default());
        field.initialize(10, bounds());
        let before = field.particles().to_vec();

        let now = Instant::now();
        assert!(field.tick(now + Duration::from_secs(1)));
        assert!(!field.tick(now + Duration::from_secs(1)));
        assert_ne!(field.particles(), before.as_slice());
    }

    #[test]
    fn test_wind_is_bounded_by_strength() {
        let field = field(FieldConfig {
            wind_strength: 0.75,
            ..Default::default()
        });
        for ms in (0..60_000).step_by(250) {
            assert!(field.wind_at(Duration::from_millis(ms)).abs() <= 0.75);
        }
        assert_eq!(field.wind_at(Duration::ZERO), 0.0);
    }
}
