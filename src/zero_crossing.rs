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
//! Locates quiet edit points near a requested frame.
//!
//! The search is a local descent on absolute amplitude rather than a strict
//! sign-change detector. Buffers with a DC offset never cross zero but still
//! have a quietest point nearby, and that point is what makes a click-free cut.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::buffer::SampleBuffer;

/// Default number of frames to scan in each direction.
pub const DEFAULT_SEARCH_DISTANCE: usize = 500;

/// Default amplitude below which a frame is accepted immediately.
pub const DEFAULT_EPSILON: f32 = 0.01;

/// The direction(s) to scan from the starting frame.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Scan towards the end of the buffer.
    Forward,
    /// Scan towards the start of the buffer.
    Backward,
    /// Scan both ways and keep the better hit.
    #[default]
    Both,
}

impl Direction {
    /// Returns the direction matching the sign of a movement delta. No movement scans both ways.
    pub fn from_delta(delta: f64) -> Direction {
        if delta > 0.0 {
            Direction::Forward
        } else if delta < 0.0 {
            Direction::Backward
        } else {
            Direction::Both
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "both" => Ok(Direction::Both),
            _ => Err(format!("unknown direction '{}'", s)),
        }
    }
}

/// The result of scanning in a single direction.
#[derive(Clone, Copy, Debug)]
struct Hit {
    frame: usize,
    abs: f32,
}

/// Search parameters for zero-crossing lookups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZeroCrossingLocator {
    max_distance: usize,
    epsilon: f32,
}

impl Default for ZeroCrossingLocator {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_SEARCH_DISTANCE,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl ZeroCrossingLocator {
    /// Creates a new locator with the given search budget and epsilon.
    pub fn new(max_distance: usize, epsilon: f32) -> Self {
        Self {
            max_distance,
            // A NaN epsilon would never stop a scan early; treat it as disabled.
            epsilon: if epsilon.is_nan() { 0.0 } else { epsilon },
        }
    }

    /// Returns the maximum number of frames scanned in each direction.
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Returns the early-exit amplitude threshold.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Returns a copy of this locator with a different search budget.
    pub fn with_max_distance(self, max_distance: usize) -> Self {
        Self {
            max_distance,
            ..self
        }
    }

    /// Finds the frame nearest to `start_frame` whose amplitude is closest to zero.
    ///
    /// The start frame is clamped into the buffer first. The returned frame is
    /// always within the buffer and never more than `max_distance` frames away
    /// from the clamped start. An empty buffer returns the start frame (floored
    /// at 0) without scanning.
    pub fn locate(&self, buffer: &SampleBuffer, start_frame: i64, direction: Direction) -> usize {
        let frame_count = buffer.frame_count();
        if frame_count == 0 {
            return start_frame.max(0) as usize;
        }

        let start = start_frame.clamp(0, frame_count as i64 - 1) as usize;
        let located = match direction {
            Direction::Forward => self.scan(buffer, start, true).frame,
            Direction::Backward => self.scan(buffer, start, false).frame,
            Direction::Both => {
                let forward = self.scan(buffer, start, true);
                let backward = self.scan(buffer, start, false);
                // Quieter wins; on equal amplitude the closer frame wins, then the earlier one.
                if forward.abs < backward.abs
                    || (forward.abs == backward.abs
                        && forward.frame.abs_diff(start) < backward.frame.abs_diff(start))
                {
                    forward.frame
                } else {
                    backward.frame
                }
            }
        };

        trace!(start, located, ?direction, "Located zero crossing");
        located
    }

    fn scan(&self, buffer: &SampleBuffer, start: usize, forward: bool) -> Hit {
        let samples = buffer.samples();
        let mut best = Hit {
            frame: start,
            abs: samples[start].abs(),
        };
        if best.abs < self.epsilon {
            return best;
        }

        let steps = if forward {
            self.max_distance.min(samples.len() - 1 - start)
        } else {
            self.max_distance.min(start)
        };

        for step in 1..=steps {
            let frame = if forward { start + step } else { start - step };
            let abs = samples[frame].abs();
            if abs < best.abs {
                best = Hit { frame, abs };
            }
            if abs < self.epsilon {
                return best;
            }
        }

        best
    }
}

/// Finds the nearest zero crossing using the default epsilon.
pub fn find_nearest_zero_crossing(
    buffer: &SampleBuffer,
    start_frame: i64,
    direction: Direction,
    max_search_distance: usize,
) -> usize {
    ZeroCrossingLocator::new(max_search_distance, DEFAULT_EPSILON).locate(
        buffer,
        start_frame,
        direction,
    )
}
