// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::interaction::{
    DragController, HitTolerance, Zones, DEFAULT_MOUSE_TOLERANCE, DEFAULT_TOUCH_TOLERANCE,
    DEFAULT_ZONE_FRACTION,
};
use crate::markers::{
    LoopWindow, MarkerResolver, DEFAULT_LOOP_END_FRACTION, DEFAULT_LOOP_START_FRACTION,
};
use crate::zero_crossing::{ZeroCrossingLocator, DEFAULT_EPSILON, DEFAULT_SEARCH_DISTANCE};

/// A YAML representation of the marker editor settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct EditorConfig {
    /// Whether moves are snapped to the nearest zero crossing.
    snap_to_zero: Option<bool>,

    /// Zero-crossing search settings.
    #[serde(default)]
    zero_crossing: ZeroCrossingConfig,

    /// Pointer hit radii.
    #[serde(default)]
    hit_tolerance: HitToleranceConfig,

    /// Vertical zones for stacked marker layouts.
    #[serde(default)]
    zones: ZonesConfig,

    /// The loop window used when a file has no embedded loop.
    #[serde(default)]
    default_loop: LoopWindowConfig,
}

impl EditorConfig {
    /// Returns true if moves snap to zero crossings.
    pub fn snap_to_zero(&self) -> bool {
        self.snap_to_zero.unwrap_or(false)
    }

    /// Gets the zero-crossing settings.
    pub fn zero_crossing(&self) -> &ZeroCrossingConfig {
        &self.zero_crossing
    }

    /// Gets the hit tolerance settings.
    pub fn hit_tolerance(&self) -> &HitToleranceConfig {
        &self.hit_tolerance
    }

    /// Gets the zone settings.
    pub fn zones(&self) -> &ZonesConfig {
        &self.zones
    }

    /// Gets the default loop settings.
    pub fn default_loop(&self) -> &LoopWindowConfig {
        &self.default_loop
    }

    /// Builds the marker resolver described by this config.
    pub fn resolver(&self) -> MarkerResolver {
        MarkerResolver::new(self.zero_crossing.locator(), self.snap_to_zero())
    }

    /// Builds an idle drag controller described by this config.
    pub fn drag_controller(&self) -> DragController {
        DragController::new(
            self.resolver(),
            self.hit_tolerance.tolerance(),
            self.zones.zones(),
        )
    }

    /// Checks that values which parsed fine are also usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let epsilon = self.zero_crossing.epsilon();
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(invalid("zero_crossing.epsilon", epsilon));
        }

        for (field, radius) in [
            ("hit_tolerance.mouse", self.hit_tolerance.mouse()),
            ("hit_tolerance.touch", self.hit_tolerance.touch()),
        ] {
            if !radius.is_finite() || radius < 0.0 {
                return Err(invalid(field, radius));
            }
        }

        for (field, fraction) in [
            ("zones.top", self.zones.top()),
            ("zones.bottom", self.zones.bottom()),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(invalid(field, fraction));
            }
        }
        if self.zones.top() + self.zones.bottom() > 1.0 {
            return Err(ConfigError::Invalid {
                field: "zones",
                reason: "top and bottom zones overlap".to_string(),
            });
        }

        for (field, fraction) in [
            ("default_loop.start", self.default_loop.start()),
            ("default_loop.end", self.default_loop.end()),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(invalid(field, fraction));
            }
        }
        if self.default_loop.start() >= self.default_loop.end() {
            return Err(ConfigError::Invalid {
                field: "default_loop",
                reason: "start must be before end".to_string(),
            });
        }

        Ok(())
    }
}

fn invalid<T: std::fmt::Display>(field: &'static str, value: T) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: format!("{} is out of range", value),
    }
}

/// Zero-crossing search settings.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ZeroCrossingConfig {
    /// Frames scanned in each direction.
    search_distance: Option<usize>,
    /// Amplitude below which a frame is accepted immediately.
    epsilon: Option<f32>,
}

impl ZeroCrossingConfig {
    /// Gets the search distance in frames.
    pub fn search_distance(&self) -> usize {
        self.search_distance.unwrap_or(DEFAULT_SEARCH_DISTANCE)
    }

    /// Gets the early-exit epsilon.
    pub fn epsilon(&self) -> f32 {
        self.epsilon.unwrap_or(DEFAULT_EPSILON)
    }

    /// Builds the locator described by this config.
    pub fn locator(&self) -> ZeroCrossingLocator {
        ZeroCrossingLocator::new(self.search_distance(), self.epsilon())
    }
}

/// Pointer hit radii in pixels.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct HitToleranceConfig {
    mouse: Option<f32>,
    touch: Option<f32>,
}

impl HitToleranceConfig {
    /// Gets the mouse hit radius.
    pub fn mouse(&self) -> f32 {
        self.mouse.unwrap_or(DEFAULT_MOUSE_TOLERANCE)
    }

    /// Gets the touch hit radius.
    pub fn touch(&self) -> f32 {
        self.touch.unwrap_or(DEFAULT_TOUCH_TOLERANCE)
    }

    pub fn tolerance(&self) -> HitTolerance {
        HitTolerance::new(self.mouse(), self.touch())
    }
}

/// Top and bottom zone heights as fractions of the view height.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ZonesConfig {
    top: Option<f32>,
    bottom: Option<f32>,
}

impl ZonesConfig {
    /// Gets the top zone fraction.
    pub fn top(&self) -> f32 {
        self.top.unwrap_or(DEFAULT_ZONE_FRACTION)
    }

    /// Gets the bottom zone fraction.
    pub fn bottom(&self) -> f32 {
        self.bottom.unwrap_or(DEFAULT_ZONE_FRACTION)
    }

    pub fn zones(&self) -> Zones {
        Zones::new(self.top(), self.bottom())
    }
}

/// Loop window fractions of the buffer length.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct LoopWindowConfig {
    start: Option<f64>,
    end: Option<f64>,
}

impl LoopWindowConfig {
    /// Gets the loop start fraction.
    pub fn start(&self) -> f64 {
        self.start.unwrap_or(DEFAULT_LOOP_START_FRACTION)
    }

    /// Gets the loop end fraction.
    pub fn end(&self) -> f64 {
        self.end.unwrap_or(DEFAULT_LOOP_END_FRACTION)
    }

    pub fn window(&self) -> LoopWindow {
        LoopWindow::new(self.start(), self.end())
    }
}
