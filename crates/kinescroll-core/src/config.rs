#![forbid(unsafe_code)]

//! The configuration snapshot consumed by the core.
//!
//! [`ScrollConfig`] is a read-only value supplied by the settings
//! collaborator: speed bounds, tap-navigation geometry, and feature toggles.
//! The core never mutates it. New snapshots arrive through a
//! [`ConfigHandle`], which can be swapped from anywhere at any time; readers
//! pick up the new value at their next checkpoint.
//!
//! # Loading
//!
//! With the `serde` feature the snapshot loads from the host's JSON
//! (camelCase keys) or from TOML:
//!
//! ```toml
//! minSpeed = 10.0
//! maxSpeed = 400.0
//! defaultSpeed = 60.0
//! tapZoneLayout = "topBottom"
//! ```
//!
//! # Defaults
//!
//! Every field has a default, so partial documents are fine.
//!
//! # Failure Modes
//!
//! Invalid snapshots (`min >= max`, default outside the bounds, ...) are
//! reported by [`ScrollConfig::validate`]. Consumers still clamp through
//! [`SpeedBounds`], which tolerates inverted or non-finite bounds without
//! panicking.

use std::sync::Arc;

use arc_swap::ArcSwap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::semantic_event::Position;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How the viewport is split into tap zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum TapZoneLayout {
    /// Left zone pages up, right zone pages down.
    #[default]
    LeftRight,
    /// Top zone pages up, bottom zone pages down.
    TopBottom,
}

/// Direction of a discrete page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageDirection {
    Up,
    Down,
}

impl PageDirection {
    /// `-1.0` for up, `1.0` for down.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Up => -1.0,
            Self::Down => 1.0,
        }
    }
}

impl TapZoneLayout {
    /// Page direction for a tap at `pos` in a `width × height` viewport.
    ///
    /// `split_percent` is the size of the first (left or top) zone.
    #[must_use]
    pub fn direction_for(
        self,
        pos: Position,
        width: f64,
        height: f64,
        split_percent: f64,
    ) -> PageDirection {
        let fraction = split_percent.max(0.0).min(100.0) / 100.0;
        let (coord, extent) = match self {
            Self::LeftRight => (pos.x, width),
            Self::TopBottom => (pos.y, height),
        };
        if coord < extent * fraction {
            PageDirection::Up
        } else {
            PageDirection::Down
        }
    }
}

/// Which mid-contact signal drives vertical speed adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SpeedAdjustSource {
    /// Direction changes and distance ticks both adjust speed.
    #[default]
    Both,
    /// One step per speed-tick distance of vertical travel.
    DistanceTicks,
    /// One step per vertical direction-change signal.
    DirectionChange,
}

impl SpeedAdjustSource {
    /// Whether a `signal` of this kind should adjust speed under `self`.
    #[must_use]
    pub const fn drives(self, signal: Self) -> bool {
        matches!(
            (self, signal),
            (Self::Both, _)
                | (Self::DistanceTicks, Self::DistanceTicks)
                | (Self::DirectionChange, Self::DirectionChange)
        )
    }
}

// ---------------------------------------------------------------------------
// SpeedBounds
// ---------------------------------------------------------------------------

/// Inclusive speed range in px/s.
///
/// Construction normalizes inverted bounds so clamping never panics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBounds {
    min: f64,
    max: f64,
}

impl SpeedBounds {
    /// Bounds covering `a` and `b` in whichever order they come.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        let min = a.min(b);
        let max = b.max(a);
        let min = if min.is_finite() { min } else { 0.0 };
        let max = if max.is_finite() { max.max(min) } else { min };
        Self { min, max }
    }

    /// Lower bound.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Clamp `speed` into the range. NaN maps to the lower bound.
    #[must_use]
    pub fn clamp(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.min;
        }
        speed.max(self.min).min(self.max)
    }

    /// Whether `speed` lies inside the range.
    #[must_use]
    pub fn contains(&self, speed: f64) -> bool {
        speed >= self.min && speed <= self.max
    }
}

// ---------------------------------------------------------------------------
// ScrollConfig
// ---------------------------------------------------------------------------

/// Read-only configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ScrollConfig {
    /// Slowest autoscroll speed (px/s).
    pub min_speed: f64,
    /// Fastest autoscroll speed (px/s).
    pub max_speed: f64,
    /// Speed applied on every (re)activation (px/s).
    pub default_speed: f64,
    /// Step applied per speed adjustment (px/s).
    pub granularity: f64,
    /// Single taps page up/down while autoscroll is inactive.
    pub tap_navigation_enabled: bool,
    /// Two-finger tap and wheel can start autoscroll.
    pub autoscroll_enabled: bool,
    /// Tap-scroll distance as a percentage of the viewport height.
    pub tap_scroll_percent: f64,
    pub tap_zone_layout: TapZoneLayout,
    /// Size of the first tap zone in percent.
    pub tap_zone_split: f64,
    /// Hint passed along with end-of-content notifications.
    pub chain_navigation_enabled: bool,
    pub speed_adjust_source: SpeedAdjustSource,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            min_speed: 10.0,
            max_speed: 500.0,
            default_speed: 50.0,
            granularity: 10.0,
            tap_navigation_enabled: true,
            autoscroll_enabled: true,
            tap_scroll_percent: 90.0,
            tap_zone_layout: TapZoneLayout::LeftRight,
            tap_zone_split: 50.0,
            chain_navigation_enabled: false,
            speed_adjust_source: SpeedAdjustSource::Both,
        }
    }
}

impl ScrollConfig {
    /// Normalized speed range.
    #[must_use]
    pub fn speed_bounds(&self) -> SpeedBounds {
        SpeedBounds::new(self.min_speed, self.max_speed)
    }

    /// Default speed clamped into the range.
    #[must_use]
    pub fn initial_speed(&self) -> f64 {
        self.speed_bounds().clamp(self.default_speed)
    }

    /// Step size per adjustment; non-finite or negative steps count as zero.
    #[must_use]
    pub fn speed_step(&self) -> f64 {
        if self.granularity.is_finite() {
            self.granularity.max(0.0)
        } else {
            0.0
        }
    }

    /// Tap-scroll distance for a viewport of `viewport_height` pixels.
    #[must_use]
    pub fn tap_scroll_distance(&self, viewport_height: f64) -> f64 {
        let percent = if self.tap_scroll_percent.is_finite() {
            self.tap_scroll_percent.max(0.0)
        } else {
            0.0
        };
        viewport_height.max(0.0) * percent / 100.0
    }

    /// Validate all parameters.
    ///
    /// Returns every problem found; an empty list means the snapshot is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("minSpeed", self.min_speed),
            ("maxSpeed", self.max_speed),
            ("defaultSpeed", self.default_speed),
            ("granularity", self.granularity),
            ("tapScrollPercent", self.tap_scroll_percent),
            ("tapZoneSplit", self.tap_zone_split),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite, got {value}"));
            }
        }

        if self.min_speed <= 0.0 {
            errors.push(format!("minSpeed must be > 0, got {}", self.min_speed));
        }
        if self.min_speed >= self.max_speed {
            errors.push(format!(
                "minSpeed must be < maxSpeed, got {} >= {}",
                self.min_speed, self.max_speed
            ));
        }
        if self.default_speed < self.min_speed || self.default_speed > self.max_speed {
            errors.push(format!(
                "defaultSpeed must be in [{}, {}], got {}",
                self.min_speed, self.max_speed, self.default_speed
            ));
        }
        if self.granularity <= 0.0 {
            errors.push(format!("granularity must be > 0, got {}", self.granularity));
        }
        if self.tap_scroll_percent <= 0.0 || self.tap_scroll_percent > 100.0 {
            errors.push(format!(
                "tapScrollPercent must be in (0, 100], got {}",
                self.tap_scroll_percent
            ));
        }
        if !(0.0..=100.0).contains(&self.tap_zone_split) {
            errors.push(format!(
                "tapZoneSplit must be in [0, 100], got {}",
                self.tap_zone_split
            ));
        }

        errors
    }

    /// `self` if valid, otherwise every validation error.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from a JSON string (camelCase keys).
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a TOML string.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Serialize to a single-line JSON document.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(ConfigError::Json)
    }
}

// ---------------------------------------------------------------------------
// ConfigHandle
// ---------------------------------------------------------------------------

/// Shared, swappable configuration snapshot.
///
/// Cloning is cheap; all clones observe the same current snapshot.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<ScrollConfig>>,
}

impl ConfigHandle {
    /// Create a handle holding `config`.
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<ScrollConfig> {
        self.inner.load_full()
    }

    /// Replace the snapshot.
    pub fn store(&self, config: ScrollConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Number of clones of this handle still alive, including `self`.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Replace the snapshot with an edited copy of the current one.
    pub fn update(&self, edit: impl Fn(&mut ScrollConfig)) {
        self.inner.rcu(|current| {
            let mut next = ScrollConfig::clone(current);
            edit(&mut next);
            next
        });
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse error.
    #[cfg(feature = "serde")]
    Toml(toml::de::Error),
    /// JSON parse or encode error.
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "serde")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "serde")]
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "serde")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "serde")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
