//! # Motion Simulator
//!
//! Moves a synthetic user along a trail so navigation can be demoed without GPS.
//!
//! The simulator is a small state machine (`Stopped` / `Playing`) driven by
//! [`MotionSimulator::advance`], which consumes elapsed seconds and interpolates the
//! position linearly between consecutive trail points. Each hop between points takes
//! `haversine(prev, next) / (base_speed × multiplier)` seconds.
//!
//! ## Events
//!
//! Listeners registered with [`MotionSimulator::subscribe`] receive every state change
//! synchronously, in order: `Started`, `Moved`, `Paused`, `Reset`, `Finished`.
//!
//! ## Example
//!
//! ```rust
//! use trail_nav::{build_trail_points, GpsPoint, MotionSimulator, SimulationConfig};
//!
//! let trail = build_trail_points(&[
//!     GpsPoint::new(34.8500, -82.4000),
//!     GpsPoint::new(34.8510, -82.4000),
//!     GpsPoint::new(34.8520, -82.4000),
//! ]);
//! let mut sim = MotionSimulator::new(trail, SimulationConfig::default()).unwrap();
//!
//! sim.play();
//! while sim.state().is_playing {
//!     sim.advance(1.0);
//! }
//! assert_eq!(sim.state().current_index, 2);
//! ```

use log::{debug, info};

use crate::geo_utils::haversine_distance;
use crate::projection::find_nearest_trail_point;
use crate::{GpsPoint, LocomotionMode, TrailPoint, TravelDirection};

/// Playback speed relative to the locomotion mode's base speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpeedMultiplier {
    X1,
    X2,
    #[default]
    X4,
}

impl SpeedMultiplier {
    pub fn factor(self) -> f64 {
        match self {
            SpeedMultiplier::X1 => 1.0,
            SpeedMultiplier::X2 => 2.0,
            SpeedMultiplier::X4 => 4.0,
        }
    }

    /// Next speed in the ×1 → ×2 → ×4 → ×1 cycle (speed button behaviour).
    pub fn cycle(self) -> Self {
        match self {
            SpeedMultiplier::X1 => SpeedMultiplier::X2,
            SpeedMultiplier::X2 => SpeedMultiplier::X4,
            SpeedMultiplier::X4 => SpeedMultiplier::X1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Observable simulator state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationState {
    pub is_playing: bool,
    pub speed_multiplier: SpeedMultiplier,
    /// Always within `[0, len - 1]`
    pub current_index: usize,
    pub direction: TravelDirection,
}

impl SimulationState {
    pub fn playback(&self) -> PlaybackState {
        if self.is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }
}

/// Initial simulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Default: walking
    pub mode: LocomotionMode,
    /// Default: ×4
    pub speed: SpeedMultiplier,
    /// Default: forward
    pub direction: TravelDirection,
    /// Clamped into the trail. Default: 0
    pub start_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum SimulationEvent {
    Started,
    Paused,
    Reset { index: usize },
    Moved { index: usize, position: GpsPoint },
    /// The trail end (in the travel direction) was reached; playback stopped.
    Finished { index: usize },
}

/// Handle returned by [`MotionSimulator::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SimulationEvent) + Send>;

/// A hop between two consecutive trail points currently in progress.
#[derive(Debug, Clone, Copy)]
struct Segment {
    from: GpsPoint,
    to: GpsPoint,
    duration: f64,
    elapsed: f64,
}

impl Segment {
    fn position(&self) -> GpsPoint {
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        GpsPoint::new(
            self.from.latitude + (self.to.latitude - self.from.latitude) * t,
            self.from.longitude + (self.to.longitude - self.from.longitude) * t,
        )
    }
}

/// Synthetic motion along a trail.
pub struct MotionSimulator {
    points: Vec<TrailPoint>,
    state: SimulationState,
    mode: LocomotionMode,
    segment: Option<Segment>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for MotionSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSimulator")
            .field("points", &self.points.len())
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MotionSimulator {
    /// Create a stopped simulator. Returns `None` for an empty trail.
    pub fn new(points: Vec<TrailPoint>, config: SimulationConfig) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let current_index = config.start_index.min(points.len() - 1);

        Some(Self {
            points,
            state: SimulationState {
                is_playing: false,
                speed_multiplier: config.speed,
                current_index,
                direction: config.direction,
            },
            mode: config.mode,
            segment: None,
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn mode(&self) -> LocomotionMode {
        self.mode
    }

    /// The trail point at `current_index`.
    pub fn current_point(&self) -> &TrailPoint {
        &self.points[self.state.current_index]
    }

    /// Current position, interpolated when a hop is in progress.
    pub fn position(&self) -> GpsPoint {
        match &self.segment {
            Some(segment) => segment.position(),
            None => self.current_point().position(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SimulationEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Start moving. No-op while already playing.
    pub fn play(&mut self) {
        if self.state.is_playing {
            return;
        }
        self.state.is_playing = true;
        info!(
            "[Simulation] Playing from index {} ({:?}, {:?}, x{})",
            self.state.current_index,
            self.state.direction,
            self.mode,
            self.state.speed_multiplier.factor()
        );
        self.emit(SimulationEvent::Started);
    }

    /// Stop moving, keeping `current_index`. The hop in progress is discarded.
    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.state.is_playing = false;
        self.segment = None;
        debug!("[Simulation] Paused at index {}", self.state.current_index);
        self.emit(SimulationEvent::Paused);
    }

    /// Stop and jump to `to_index`, clamped into the trail.
    pub fn reset(&mut self, to_index: usize) {
        let index = to_index.min(self.points.len() - 1);
        self.state.is_playing = false;
        self.state.current_index = index;
        self.segment = None;
        debug!("[Simulation] Reset to index {}", index);
        self.emit(SimulationEvent::Reset { index });
    }

    /// Reset onto the trail point nearest `location`. Returns the chosen index.
    pub fn reset_to_location(&mut self, location: GpsPoint) -> usize {
        let index = find_nearest_trail_point(location, &self.points).map_or(0, |r| r.index_on_trail);
        self.reset(index);
        index
    }

    /// Applies from the next hop.
    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.state.speed_multiplier = speed;
    }

    /// Applies from the next hop.
    pub fn set_direction(&mut self, direction: TravelDirection) {
        self.state.direction = direction;
    }

    /// Applies from the next hop.
    pub fn set_mode(&mut self, mode: LocomotionMode) {
        self.mode = mode;
    }

    /// Advance simulated time by `dt_seconds`.
    ///
    /// Consumes the time across as many hops as it covers. Returns the position
    /// afterwards, or `None` if the simulator was not playing. Reaching the end of
    /// the trail stops playback and emits `Finished` after the final `Moved`.
    pub fn advance(&mut self, dt_seconds: f64) -> Option<GpsPoint> {
        if !self.state.is_playing {
            return None;
        }

        let mut remaining = dt_seconds.max(0.0);
        let mut finished = false;

        loop {
            match self.segment.as_mut() {
                Some(segment) => {
                    let left = segment.duration - segment.elapsed;
                    if remaining < left {
                        segment.elapsed += remaining;
                        break;
                    }
                    remaining -= left;
                    self.segment = None;
                    if remaining <= 0.0 {
                        break;
                    }
                }
                None => {
                    if !self.start_next_segment() {
                        finished = true;
                        break;
                    }
                }
            }
        }

        let position = self.position();
        self.emit(SimulationEvent::Moved { index: self.state.current_index, position });

        if finished {
            self.state.is_playing = false;
            info!("[Simulation] Reached the end at index {}", self.state.current_index);
            self.emit(SimulationEvent::Finished { index: self.state.current_index });
        }

        Some(position)
    }

    /// Step `current_index` towards the travel direction and start the hop to it.
    /// Returns false when the trail end has been reached; the index is left as is.
    fn start_next_segment(&mut self) -> bool {
        let current = self.state.current_index;
        let Some(next) = current
            .checked_add_signed(self.state.direction.step())
            .filter(|&n| n < self.points.len())
        else {
            return false;
        };

        let from = self.points[current].position();
        let to = self.points[next].position();
        let speed = self.mode.base_speed() * self.state.speed_multiplier.factor();

        self.state.current_index = next;
        self.segment = Some(Segment {
            from,
            to,
            duration: haversine_distance(&from, &to) / speed,
            elapsed: 0.0,
        });
        true
    }

    fn emit(&mut self, event: SimulationEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
