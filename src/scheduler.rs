//! Animation lifecycle: start/stop, frame pacing, substeps and live edits.
//!
//! The host owns the display clock. It calls [`Scheduler::tick`] from its
//! frame callback and implements [`FrameHost`] so the scheduler can request
//! and cancel frames. Only one frame request is ever outstanding.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec as AllocVec;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::body::{Body, Neighbor, StepParams};
use crate::container::Container;
use crate::error::{DrawError, SimError};
use crate::float::Float;
use crate::neighbor::nearby;
use crate::observer::{NoOpTickObserver, TickObserver};
use crate::params::{ParamPatch, SimulationParams};
use crate::placement::place;
use crate::shape::{ObstacleGeometry, RenderSurface, ShapeCache, ShapeDescriptor};

/// Frame time the physics constants are tuned for (60 fps).
pub const IDEAL_FRAME_MS: f64 = 1000.0 / 60.0;
/// Slowest target the pacing adapts down to.
pub const MIN_TARGET_FPS: f64 = 30.0;
/// Fastest target the pacing adapts up to.
pub const MAX_TARGET_FPS: f64 = 60.0;
/// Measured fps must differ from the target by more than this to adapt.
pub const FPS_HYSTERESIS: f64 = 5.0;
/// Each adaptation moves the target interval by this factor.
pub const ADAPT_FACTOR: f64 = 1.1;
/// Ticks arriving this close to the target interval still run.
pub const FRAME_TOLERANCE_MS: f64 = 1.0;
/// How long the live-editing flag stays up after a patch.
pub const LIVE_EDIT_MS: f64 = 800.0;
/// Physics passes per frame at the highest speed setting.
pub const MAX_SUBSTEPS: usize = 3;
/// Cap on elapsed / ideal frame time, so a stalled tab does not explode.
pub const MAX_TIME_SCALE: f64 = 4.0;

/// Token for an outstanding frame request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host side of the animation loop.
pub trait FrameHost {
    /// Ask for `tick` to be called on the next display frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraw a request made by `request_frame`.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Whether there is still something to draw on.
    fn surface_ready(&self) -> bool {
        true
    }

    /// Whether the host component is still alive.
    fn is_mounted(&self) -> bool {
        true
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// What a call to `tick` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scheduler is stopped; nothing happened.
    Idle,
    /// Surface gone or host unmounted; the scheduler stopped itself.
    Halted,
    /// Too early for the target frame rate; rescheduled without physics.
    Skipped,
    /// Physics advanced and the frame was drawn.
    Advanced { substeps: usize },
}

/// How a live patch was taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PatchEffect {
    /// In effect from the next substep on.
    Applied,
    /// Stored, but only a restart rebuilds the bodies with it.
    RestartRequired,
}

/// Substeps per tick for a speed multiplier: `floor(speed)` within 1..=3.
pub fn substeps_for(speed: f32) -> usize {
    let whole = libm::floorf(speed);
    if !(whole >= 1.0) {
        1
    } else {
        (whole as usize).min(MAX_SUBSTEPS)
    }
}

/// Drives the body set frame by frame.
pub struct Scheduler<F: Float = f32> {
    params: SimulationParams,
    bodies: AllocVec<Body<F>>,
    cache: ShapeCache,
    surface: Option<Box<dyn RenderSurface>>,
    obstacle: Option<Rc<ObstacleGeometry>>,
    /// Descriptor waiting to be resolved at the next tick boundary.
    pending_shape: Option<ShapeDescriptor>,
    state: RunState,
    pending_frame: Option<FrameHandle>,
    last_frame_ms: Option<f64>,
    last_callback_ms: Option<f64>,
    target_interval_ms: f64,
    live_edit_until: Option<f64>,
    generation: u64,
}

impl<F: Float> Scheduler<F> {
    /// A stopped scheduler with bodies placed but no render surface, so
    /// glyph and path obstacles resolve to nothing.
    pub fn new(params: SimulationParams) -> Result<Self, SimError> {
        Self::build(params, None)
    }

    /// A stopped scheduler that rasterizes obstacles on `surface`.
    pub fn with_surface(params: SimulationParams, surface: Box<dyn RenderSurface>) -> Result<Self, SimError> {
        Self::build(params, Some(surface))
    }

    fn build(params: SimulationParams, surface: Option<Box<dyn RenderSurface>>) -> Result<Self, SimError> {
        params.validate()?;
        let mut scheduler = Scheduler {
            params,
            bodies: AllocVec::new(),
            cache: ShapeCache::new(),
            surface,
            obstacle: None,
            pending_shape: None,
            state: RunState::Stopped,
            pending_frame: None,
            last_frame_ms: None,
            last_callback_ms: None,
            target_interval_ms: IDEAL_FRAME_MS,
            live_edit_until: None,
            generation: 0,
        };
        scheduler.rebuild();
        Ok(scheduler)
    }

    pub fn state(&self) -> RunState { self.state }
    pub fn is_running(&self) -> bool { self.state == RunState::Running }
    pub fn bodies(&self) -> &[Body<F>] { &self.bodies }
    pub fn params(&self) -> &SimulationParams { &self.params }
    pub fn target_interval_ms(&self) -> f64 { self.target_interval_ms }
    pub fn pending_frame(&self) -> Option<FrameHandle> { self.pending_frame }
    pub fn shape_cache(&self) -> &ShapeCache { &self.cache }

    /// Current obstacle geometry, if the obstacle is enabled.
    pub fn obstacle(&self) -> Option<&ObstacleGeometry> {
        if self.params.obstacle_enabled {
            self.obstacle.as_deref()
        } else {
            None
        }
    }

    /// Replace the render surface; the next restart or colour change uses it.
    pub fn set_surface(&mut self, surface: Option<Box<dyn RenderSurface>>) {
        self.surface = surface;
    }

    /// `Stopped -> Running`. Cancels any stray request and asks for the
    /// first frame. Does nothing if already running.
    pub fn start<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.state == RunState::Running {
            return;
        }
        if let Some(stray) = self.pending_frame.take() {
            host.cancel_frame(stray);
        }
        self.state = RunState::Running;
        self.last_frame_ms = None;
        self.last_callback_ms = None;
        self.pending_frame = Some(host.request_frame());
        log::info!("simulation started with {} bodies", self.bodies.len());
    }

    /// `Running -> Stopped`. The outstanding request is cancelled, so no
    /// further tick does any work until `start`.
    pub fn stop<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.state == RunState::Stopped && self.pending_frame.is_none() {
            return;
        }
        self.halt(host);
        log::info!("simulation stopped");
    }

    /// Host is going away: stop unconditionally.
    pub fn teardown<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        self.halt(host);
        self.live_edit_until = None;
        log::info!("simulation torn down");
    }

    fn halt<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(handle) = self.pending_frame.take() {
            host.cancel_frame(handle);
        }
        self.state = RunState::Stopped;
    }

    /// Throw away every body and place a fresh set from the current
    /// parameters. Running state is kept.
    pub fn restart(&mut self) {
        self.rebuild();
    }

    /// Validate `params`, adopt them and restart.
    pub fn reset(&mut self, params: SimulationParams) -> Result<(), SimError> {
        params.validate()?;
        self.params = params;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.pending_shape = None;
        self.obstacle = if self.params.obstacle_enabled {
            let descriptor = ShapeDescriptor::from_params(&self.params);
            Some(self.resolve(&descriptor))
        } else {
            None
        };

        let seed = self.params.seed.wrapping_add(self.generation);
        self.generation += 1;
        let mut rng = SmallRng::seed_from_u64(seed);
        let obstacle = self.obstacle();
        let bodies = place(self.params.body_count, &self.params, obstacle, &mut rng);
        self.bodies = bodies;
        log::debug!("placed {} bodies (generation {})", self.bodies.len(), self.generation);
    }

    fn resolve(&mut self, descriptor: &ShapeDescriptor) -> Rc<ObstacleGeometry> {
        let surface = self.surface.as_mut().map(|s| s.as_mut() as &mut dyn RenderSurface);
        self.cache.resolve(descriptor, surface)
    }

    /// Whether a patch arrived within the last [`LIVE_EDIT_MS`].
    pub fn is_live_editing(&self, now_ms: f64) -> bool {
        self.live_edit_until.map_or(false, |until| now_ms < until)
    }

    /// Apply one parameter edit.
    ///
    /// The patched snapshot is validated first. `RepelDistance` is written
    /// onto every live body at once; `ObstacleColor` invalidates the cached
    /// geometry and re-resolves at the next tick boundary, keeping the old
    /// geometry until then. Structural keys are stored but need
    /// [`Scheduler::restart`]. While running, every patch (re)starts the
    /// live-editing window.
    pub fn apply(&mut self, patch: ParamPatch, now_ms: f64) -> Result<PatchEffect, SimError> {
        let mut next = self.params.clone();
        next.apply_patch(&patch);
        next.validate()?;

        let old_descriptor = ShapeDescriptor::from_params(&self.params);
        self.params = next;

        match &patch {
            ParamPatch::RepelDistance(v) => {
                let repel = F::from_f32(*v);
                for body in self.bodies.iter_mut() {
                    body.repel_distance = repel;
                }
            }
            ParamPatch::ObstacleColor(_) => {
                self.cache.invalidate(&old_descriptor);
                if self.params.obstacle_enabled {
                    self.pending_shape = Some(ShapeDescriptor::from_params(&self.params));
                } else {
                    self.obstacle = None;
                }
            }
            ParamPatch::ObstacleEnabled(true) if self.obstacle.as_ref().map_or(true, |o| o.is_empty()) => {
                self.pending_shape = Some(ShapeDescriptor::from_params(&self.params));
            }
            _ => {}
        }

        if self.state == RunState::Running {
            self.live_edit_until = Some(now_ms + LIVE_EDIT_MS);
        }
        if patch.is_structural() {
            Ok(PatchEffect::RestartRequired)
        } else {
            Ok(PatchEffect::Applied)
        }
    }

    /// Handle one display frame. See [`Scheduler::tick_observed`].
    pub fn tick<H, D>(&mut self, now_ms: f64, host: &mut H, draw: D) -> Result<TickOutcome, SimError>
    where
        H: FrameHost + ?Sized,
        D: FnMut(&[Body<F>]) -> Result<(), DrawError>,
    {
        self.tick_observed(now_ms, host, draw, &mut NoOpTickObserver)
    }

    /// Handle one display frame.
    ///
    /// Adapts the target rate toward the display rate within 30-60 fps,
    /// skips physics when the frame came early for that target, runs 1-3 substeps by
    /// speed, draws once and requests the next frame. A draw error or a
    /// body going non-finite stops the scheduler and is returned; no frame
    /// request is left behind.
    pub fn tick_observed<H, D, O>(
        &mut self,
        now_ms: f64,
        host: &mut H,
        mut draw: D,
        observer: &mut O,
    ) -> Result<TickOutcome, SimError>
    where
        H: FrameHost + ?Sized,
        D: FnMut(&[Body<F>]) -> Result<(), DrawError>,
        O: TickObserver,
    {
        if self.state != RunState::Running {
            return Ok(TickOutcome::Idle);
        }
        // The request that fired is spent.
        self.pending_frame = None;

        if !host.surface_ready() || !host.is_mounted() {
            self.halt(host);
            log::info!("simulation halted: surface unavailable or host unmounted");
            return Ok(TickOutcome::Halted);
        }

        if self.live_edit_until.map_or(false, |until| now_ms >= until) {
            self.live_edit_until = None;
        }
        if let Some(descriptor) = self.pending_shape.take() {
            self.obstacle = Some(self.resolve(&descriptor));
        }

        // Display rate comes from consecutive callbacks, skipped or not.
        if let Some(previous) = self.last_callback_ms.replace(now_ms) {
            self.adapt_target(now_ms - previous, observer);
        }

        let elapsed = match self.last_frame_ms {
            Some(last) => now_ms - last,
            None => IDEAL_FRAME_MS,
        };
        if elapsed < self.target_interval_ms - FRAME_TOLERANCE_MS {
            observer.on_frame_skipped(elapsed);
            self.pending_frame = Some(host.request_frame());
            return Ok(TickOutcome::Skipped);
        }
        self.last_frame_ms = Some(now_ms);

        let time_scale = (elapsed / IDEAL_FRAME_MS).clamp(0.0, MAX_TIME_SCALE);
        let substeps = substeps_for(self.params.speed);
        for index in 0..substeps {
            observer.on_substep(index);
            if let Err(e) = self.substep(F::from_f32(time_scale as f32), observer) {
                return Err(self.fault(host, e));
            }
        }

        if let Err(e) = draw(self.bodies.as_slice()) {
            return Err(self.fault(host, SimError::Draw(e)));
        }
        observer.on_draw();

        self.pending_frame = Some(host.request_frame());
        Ok(TickOutcome::Advanced { substeps })
    }

    /// Nudge the target interval 10% toward the measured rate when it is
    /// more than [`FPS_HYSTERESIS`] away, staying within 30-60 fps. A rate
    /// within [`FPS_HYSTERESIS`] of either end of that band moves the target
    /// straight to that end.
    fn adapt_target<O: TickObserver>(&mut self, delta_ms: f64, observer: &mut O) {
        if !(delta_ms > 0.0) {
            return;
        }
        let fps = 1000.0 / delta_ms;
        let target_fps = 1000.0 / self.target_interval_ms;
        let proposed = if fps >= MAX_TARGET_FPS - FPS_HYSTERESIS {
            // 10% steps from 30 stall at 58.5 fps, inside the hysteresis.
            1000.0 / MAX_TARGET_FPS
        } else if fps <= MIN_TARGET_FPS + FPS_HYSTERESIS {
            1000.0 / MIN_TARGET_FPS
        } else if fps < target_fps - FPS_HYSTERESIS {
            self.target_interval_ms * ADAPT_FACTOR
        } else if fps > target_fps + FPS_HYSTERESIS {
            self.target_interval_ms / ADAPT_FACTOR
        } else {
            return;
        };
        let clamped = proposed.clamp(1000.0 / MAX_TARGET_FPS, 1000.0 / MIN_TARGET_FPS);
        if clamped != self.target_interval_ms {
            log::trace!(
                "measured {:.1} fps; target {:.1} -> {:.1} fps",
                fps,
                target_fps,
                1000.0 / clamped
            );
            self.target_interval_ms = clamped;
            observer.on_target_interval(clamped);
        }
    }

    /// One physics pass over every body, in order.
    fn substep<O: TickObserver>(&mut self, time_scale: F, observer: &mut O) -> Result<(), SimError> {
        let step = StepParams::from_params(&self.params, time_scale);
        let container = Container::<F>::from_params(&self.params);
        let obstacle = if self.params.obstacle_enabled {
            self.obstacle.as_deref()
        } else {
            None
        };
        let bodies = &mut self.bodies;
        let mut neighbors: AllocVec<Neighbor<F>> = AllocVec::new();

        for i in 0..bodies.len() {
            neighbors.clear();
            neighbors.extend(nearby(&bodies[i], bodies.as_slice()).into_iter().map(Neighbor::of));
            let body = &mut bodies[i];
            body.update(&neighbors, &step, &container, obstacle);
            if !body.is_finite() {
                return Err(SimError::NonFinite { body: body.id() });
            }
            observer.on_body_update(body.id(), neighbors.len());
        }
        Ok(())
    }

    fn fault<H: FrameHost + ?Sized>(&mut self, host: &mut H, error: SimError) -> SimError {
        self.halt(host);
        log::error!("simulation stopped unexpectedly: {}", error);
        error
    }
}
