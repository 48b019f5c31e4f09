//! Playback state machine over a built timeline.
//!
//! The controller owns the "current day" position and the playing/paused
//! mode. Every day change emits a [`DaySnapshot`] to a [`SceneCollaborator`]:
//! weather styling for the scene, and a scale plus part visibility for each
//! plant.
//!
//! # States
//!
//! | State                  | Entered by                                     |
//! |------------------------|------------------------------------------------|
//! | Paused                 | construction, `pause`, `dispose`, last-day tick |
//! | Playing(speed)         | `play` from Paused, before the last day        |
//!
//! The controller itself never sleeps. While playing it holds a
//! [`TimerHandle`] describing the interval at which [`TimelineController::tick`]
//! should be called; the async driver in [`crate::runner`] honors it. Each
//! `play` or speed change replaces the handle with a new generation, so at
//! most one timer is ever live.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use cropsim_types::{PlantId, Timeline, TimelineDay, WeatherVisuals};
use cropsim_world::{PlantVisual, plant_visual};

use crate::config::{FieldConfig, PlaybackConfig};

/// Shortest interval a timer may fire at.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    /// The timeline has no days to play.
    #[error("timeline has no days")]
    EmptyTimeline,

    /// Speed factors must be positive and finite.
    #[error("invalid speed factor: {0}")]
    InvalidSpeed(f64),
}

// ---------------------------------------------------------------------------
// Collaborator
// ---------------------------------------------------------------------------

/// Everything emitted for one day change.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySnapshot<'a> {
    /// 0-based position in the timeline.
    pub index: usize,
    /// Number of days in the timeline.
    pub total_days: usize,
    /// The day being shown.
    pub day: &'a TimelineDay,
    /// Scene styling for the day's weather.
    pub visuals: WeatherVisuals,
    /// How every plant should be drawn.
    pub plant_visual: PlantVisual,
}

/// Renderer and UI side effects driven by the controller.
pub trait SceneCollaborator {
    /// Restyle sky, fog, lights, rain, and clouds.
    fn apply_day_visuals(&mut self, visuals: &WeatherVisuals);

    /// Rescale one plant and toggle its reproductive parts.
    fn set_plant_growth(&mut self, plant: PlantId, visual: &PlantVisual);

    /// Called once per emitted snapshot, after visuals and plants.
    fn on_day_changed(&mut self, snapshot: &DaySnapshot<'_>);

    /// Drop any weather effect state (rain particles, clouds).
    fn release_weather_effects(&mut self);
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The live repeating timer while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    /// Increments on every restart; a driver rebuilds its timer when it
    /// changes.
    pub generation: u64,
    /// Time between ticks.
    pub interval: Duration,
}

/// Playback position and mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// 0-based index of the day on screen, always within the timeline.
    pub current_day_index: usize,
    /// Whether playback is advancing.
    pub is_playing: bool,
    /// Multiplier on the base playback rate, always positive.
    pub speed_factor: f64,
    /// Present exactly while playing.
    pub timer: Option<TimerHandle>,
}

/// Tunables for a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Interval between days at speed 1.0.
    pub base_interval: Duration,
    /// Speed factor at construction.
    pub initial_speed: f64,
    /// Smallest rendered plant scale.
    pub min_plant_scale: f64,
}

impl ControllerSettings {
    /// Settings from the playback and field sections of the configuration.
    pub const fn from_config(playback: &PlaybackConfig, field: &FieldConfig) -> Self {
        Self {
            base_interval: Duration::from_millis(playback.base_interval_ms),
            initial_speed: playback.initial_speed,
            min_plant_scale: field.min_plant_scale,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default(), &FieldConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives day-by-day playback of a timeline.
#[derive(Debug)]
pub struct TimelineController<S> {
    timeline: Arc<Timeline>,
    plants: Vec<PlantId>,
    scene: S,
    state: PlaybackState,
    base_interval: Duration,
    min_plant_scale: f64,
    timer_generation: u64,
    disposed: bool,
}

impl<S: SceneCollaborator> TimelineController<S> {
    /// Create a paused controller on day 0 and emit the day-0 snapshot.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::EmptyTimeline`] if the timeline has no days.
    /// - [`ControllerError::InvalidSpeed`] if the initial speed is not
    ///   positive and finite.
    pub fn new(
        timeline: Arc<Timeline>,
        plants: Vec<PlantId>,
        scene: S,
        settings: &ControllerSettings,
    ) -> Result<Self, ControllerError> {
        if timeline.is_empty() {
            return Err(ControllerError::EmptyTimeline);
        }
        validate_speed(settings.initial_speed)?;

        let mut controller = Self {
            timeline,
            plants,
            scene,
            state: PlaybackState {
                current_day_index: 0,
                is_playing: false,
                speed_factor: settings.initial_speed,
                timer: None,
            },
            base_interval: settings.base_interval,
            min_plant_scale: settings.min_plant_scale,
            timer_generation: 0,
            disposed: false,
        };
        info!(
            days = controller.timeline.len(),
            plants = controller.plants.len(),
            speed = settings.initial_speed,
            "Timeline controller created"
        );
        controller.emit();
        Ok(controller)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Jump to a day, clamped to the timeline, and emit its snapshot.
    ///
    /// Does not change the playing/paused mode. Returns the index now shown.
    pub fn set_day(&mut self, index: i64) -> usize {
        if self.disposed {
            return self.state.current_day_index;
        }
        let clamped = usize::try_from(index.max(0))
            .unwrap_or(usize::MAX)
            .min(self.last_index());
        self.state.current_day_index = clamped;
        self.emit();
        clamped
    }

    /// Step forward one day. No-op on the last day.
    pub fn next_day(&mut self) -> usize {
        if self.disposed || self.is_at_end() {
            return self.state.current_day_index;
        }
        self.step_to(self.state.current_day_index.saturating_add(1))
    }

    /// Step back one day. No-op on the first day.
    pub fn prev_day(&mut self) -> usize {
        if self.disposed || self.state.current_day_index == 0 {
            return self.state.current_day_index;
        }
        self.step_to(self.state.current_day_index.saturating_sub(1))
    }

    fn step_to(&mut self, index: usize) -> usize {
        self.state.current_day_index = index.min(self.last_index());
        self.emit();
        self.state.current_day_index
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Start advancing one day per interval.
    ///
    /// No-op when already playing, when on the last day, or after
    /// [`dispose`](Self::dispose).
    pub fn play(&mut self) {
        if self.disposed || self.state.is_playing || self.is_at_end() {
            return;
        }
        self.state.is_playing = true;
        self.start_timer();
        info!(
            day = self.state.current_day_index,
            speed = self.state.speed_factor,
            "Playback started"
        );
    }

    /// Stop advancing. Idempotent.
    pub fn pause(&mut self) {
        let was_playing = self.state.is_playing;
        self.state.is_playing = false;
        self.state.timer = None;
        if was_playing {
            info!(day = self.state.current_day_index, "Playback paused");
        }
    }

    /// Change the playback rate.
    ///
    /// While playing the timer is restarted at the new interval without
    /// skipping a day; while paused the speed is kept for the next `play`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidSpeed`] if `factor` is not positive
    /// and finite. The previous speed is kept.
    pub fn set_speed(&mut self, factor: f64) -> Result<(), ControllerError> {
        validate_speed(factor)?;
        self.state.speed_factor = factor;
        if self.state.is_playing {
            self.start_timer();
        }
        info!(speed = factor, playing = self.state.is_playing, "Playback speed changed");
        Ok(())
    }

    /// Advance one day if playing.
    ///
    /// Reaching the last day cancels the timer and pauses. Returns whether
    /// the day advanced.
    pub fn tick(&mut self) -> bool {
        if self.disposed || self.state.timer.is_none() {
            return false;
        }
        if self.is_at_end() {
            self.pause();
            return false;
        }
        self.step_to(self.state.current_day_index.saturating_add(1));
        if self.is_at_end() {
            self.pause();
            info!(days = self.timeline.len(), "Playback reached the last day");
        }
        true
    }

    /// Cancel any timer and release weather effects. Later operations emit
    /// nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.pause();
        self.scene.release_weather_effects();
        self.disposed = true;
        debug!("Timeline controller disposed");
    }

    fn start_timer(&mut self) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        self.state.timer = Some(TimerHandle {
            generation: self.timer_generation,
            interval: self.interval(),
        });
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    fn emit(&mut self) {
        let index = self.state.current_day_index;
        let Some(day) = self.timeline.day(index) else {
            return;
        };
        let snapshot = DaySnapshot {
            index,
            total_days: self.timeline.len(),
            day,
            visuals: day.weather.visuals(),
            plant_visual: plant_visual(self.timeline.crop_type, day.growth_percent, self.min_plant_scale),
        };

        self.scene.apply_day_visuals(&snapshot.visuals);
        for &plant in &self.plants {
            self.scene.set_plant_growth(plant, &snapshot.plant_visual);
        }
        self.scene.on_day_changed(&snapshot);

        debug!(
            day = index,
            date = %day.weather.date,
            weather = ?day.weather.weather_kind,
            growth = day.growth_percent,
            stage = day.growth_stage.label(),
            "Day snapshot emitted"
        );
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// 0-based index of the day on screen.
    pub const fn current_day_index(&self) -> usize {
        self.state.current_day_index
    }

    /// The day on screen.
    pub fn current_day(&self) -> Option<&TimelineDay> {
        self.timeline.day(self.state.current_day_index)
    }

    /// Whether playback is advancing.
    pub const fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Current speed multiplier.
    pub const fn speed_factor(&self) -> f64 {
        self.state.speed_factor
    }

    /// The live timer, present exactly while playing.
    pub const fn timer(&self) -> Option<TimerHandle> {
        self.state.timer
    }

    /// The full playback state.
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Interval between ticks at the current speed.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.base_interval.as_secs_f64() / self.state.speed_factor)
            .unwrap_or(Duration::MAX)
            .max(MIN_TICK_INTERVAL)
    }

    /// Whether the last day is on screen.
    pub fn is_at_end(&self) -> bool {
        self.state.current_day_index >= self.last_index()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The timeline being played.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// The scene collaborator.
    pub const fn scene(&self) -> &S {
        &self.scene
    }

    fn last_index(&self) -> usize {
        self.timeline.last_index().unwrap_or(0)
    }
}

fn validate_speed(factor: f64) -> Result<(), ControllerError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(ControllerError::InvalidSpeed(factor))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
