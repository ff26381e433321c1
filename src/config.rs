//! Motion tuning for the stage and the arrangement widgets.
//!
//! All easing rates, momentum factors and thresholds are gathered into a
//! single `MotionConfig` that can be serialized to/from TOML and pushed into
//! a running stage via `Stage::reconfigure`.

use std::path::Path;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// MotionConfig
// ---------------------------------------------------------------------------

/// Root tuning container.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MotionConfig {
    pub stage: StageMotion,
    pub carousel: CarouselMotion,
    pub slider: SliderMotion,
    pub field: FieldMotion,
    pub particles: ParticleMotion,
}

// --- Sub-structs ---

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StageMotion {
    /// Origin → target smoothing, per second.
    pub ease_rate: f64,
    /// Out-of-range target → range smoothing, per second.
    pub range_ease_rate: f64,
    /// Release delta multiplier.
    pub momentum: f64,
    /// Wheel delta multiplier.
    pub scroll_gain: f64,
    /// Wheel events this soon after a drag release are dropped.
    pub suppress_window_ms: u64,
    /// Overflow in pixels at which drag input is fully resisted.
    pub overscroll_resistance: f64,
    /// Swipe delta multiplier.
    pub swipe_gain: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CarouselMotion {
    pub radius: f64,
    /// Degrees of rotation per pixel dragged.
    pub sensitivity: f64,
    pub ease_rate: f64,
    /// Release delta (px) → per-frame angular momentum (deg).
    pub momentum_scale: f64,
    /// Per-frame momentum multiplier while coasting.
    pub decay: f64,
    /// Momentum below this magnitude ends coasting.
    pub rest_threshold: f64,
    /// Degrees from target at which rotation snaps.
    pub snap_threshold: f64,
    pub tap_threshold: f64,
    /// Upper bound on the frame delta used for easing, seconds.
    pub max_step: f64,
    /// Amplitude of the idle bob, pixels.
    pub bob: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SliderMotion {
    pub gutter: f64,
    pub momentum: f64,
    pub ease_rate: f64,
    pub bound_ease_rate: f64,
    /// Distance in pixels at which the offset snaps to its target.
    pub settle_distance: f64,
    pub tap_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FieldMotion {
    pub momentum: f64,
    pub ease_rate: f64,
    pub settle_distance: f64,
    /// Margin around the field box before a pane wraps, pixels.
    pub edge_buffer: f64,
    /// Extra depth margin per unit of a pane's own depth offset.
    pub depth_buffer_ratio: f64,
    /// Distance from a wrap edge over which panes fade in/out.
    pub fade_distance: f64,
    pub max_blur: f64,
    /// Wheel delta → depth multiplier.
    pub zoom_gain: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ParticleMotion {
    pub stream_width: f64,
    /// Upward drift in pixels per second for a mid-size particle.
    pub rise_speed: f64,
    pub sway: f64,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for StageMotion {
    fn default() -> Self {
        Self {
            ease_rate: 5.0,
            range_ease_rate: 20.0,
            momentum: 20.0,
            scroll_gain: 2.0,
            suppress_window_ms: 200,
            overscroll_resistance: 300.0,
            swipe_gain: 1.0,
        }
    }
}

impl Default for CarouselMotion {
    fn default() -> Self {
        Self {
            radius: 600.0,
            sensitivity: 0.05,
            ease_rate: 5.0,
            momentum_scale: 0.1,
            decay: 0.975,
            rest_threshold: 0.025,
            snap_threshold: 0.1,
            tap_threshold: 5.0,
            max_step: 0.025,
            bob: 5.0,
        }
    }
}

impl Default for SliderMotion {
    fn default() -> Self {
        Self {
            gutter: 30.0,
            momentum: 20.0,
            ease_rate: 5.0,
            bound_ease_rate: 20.0,
            settle_distance: 1.0,
            tap_threshold: 5.0,
        }
    }
}

impl Default for FieldMotion {
    fn default() -> Self {
        Self {
            momentum: 20.0,
            ease_rate: 5.0,
            settle_distance: 1.0,
            edge_buffer: 100.0,
            depth_buffer_ratio: 0.5,
            fade_distance: 100.0,
            max_blur: 8.0,
            zoom_gain: 1.0,
        }
    }
}

impl Default for ParticleMotion {
    fn default() -> Self {
        Self {
            stream_width: 200.0,
            rise_speed: 100.0,
            sway: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl MotionConfig {
    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialize from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load `path`, falling back to defaults (with a warning) when it is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(target: "config", "using default motion config: {e:#}");
                Self::default()
            }
        }
    }

    /// Suppression window as seconds.
    pub fn suppress_window(&self) -> f64 {
        self.stage.suppress_window_ms as f64 / 1000.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
