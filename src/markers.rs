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
//! Sample and loop markers and the rules that keep them ordered.
//!
//! A [`MarkerSet`] always satisfies `0 <= in < out <= frame_count`, and when a
//! loop region is present, `in <= loop_start < loop_end <= out`. The only
//! exception is an empty buffer, where every marker sits at frame 0.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::convert;

pub mod resolver;


pub use resolver::{
    move_in_point, move_loop_end, move_loop_start, move_out_point, Gesture, MarkerResolver,
};

/// Default loop window start, as a fraction of the buffer length.
pub const DEFAULT_LOOP_START_FRACTION: f64 = 0.2;

/// Default loop window end, as a fraction of the buffer length.
pub const DEFAULT_LOOP_END_FRACTION: f64 = 0.8;

/// One of the four editable markers.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Start of the audible portion of the sample.
    In,
    /// End of the audible portion of the sample.
    Out,
    /// Start of the sustain loop.
    LoopStart,
    /// End of the sustain loop.
    LoopEnd,
}

impl Marker {
    /// All markers in timeline order.
    pub const ALL: [Marker; 4] = [Marker::In, Marker::LoopStart, Marker::LoopEnd, Marker::Out];

    /// Returns true for the loop markers.
    pub fn is_loop(self) -> bool {
        matches!(self, Marker::LoopStart | Marker::LoopEnd)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Marker::In => "in",
            Marker::Out => "out",
            Marker::LoopStart => "loop start",
            Marker::LoopEnd => "loop end",
        };
        write!(f, "{}", name)
    }
}

/// A sustain loop region. `end` is exclusive.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopRegion {
    pub start: usize,
    pub end: usize,
}

impl LoopRegion {
    /// Creates a new loop region.
    pub fn new(start: usize, end: usize) -> LoopRegion {
        LoopRegion { start, end }
    }

    /// Returns the length of the loop in frames.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the loop covers no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The fractional window used to place a loop when no embedded loop is available.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct LoopWindow {
    start: f64,
    end: f64,
}

impl Default for LoopWindow {
    fn default() -> Self {
        LoopWindow {
            start: DEFAULT_LOOP_START_FRACTION,
            end: DEFAULT_LOOP_END_FRACTION,
        }
    }
}

impl LoopWindow {
    /// Creates a new loop window. Fractions are clamped into [0.0, 1.0] and
    /// swapped if given in the wrong order. Non-finite fractions fall back to
    /// the defaults.
    pub fn new(start: f64, end: f64) -> LoopWindow {
        let start = if start.is_finite() {
            start.clamp(0.0, 1.0)
        } else {
            DEFAULT_LOOP_START_FRACTION
        };
        let end = if end.is_finite() {
            end.clamp(0.0, 1.0)
        } else {
            DEFAULT_LOOP_END_FRACTION
        };

        if start <= end {
            LoopWindow { start, end }
        } else {
            LoopWindow {
                start: end,
                end: start,
            }
        }
    }

    /// Returns the start fraction.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Returns the end fraction.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Places the window over a buffer of the given length. The region may still
    /// need normalizing against the other markers.
    pub fn region(&self, frame_count: usize) -> LoopRegion {
        let start = convert::percentage_to_frame(self.start * 100.0, frame_count).max(0) as usize;
        let end = convert::percentage_to_frame(self.end * 100.0, frame_count).max(0) as usize;
        LoopRegion::new(start, end)
    }
}

/// The in/out markers of a sample and its optional sustain loop, in frames.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerSet {
    in_point: usize,
    out_point: usize,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    loop_region: Option<LoopRegion>,
}

impl MarkerSet {
    /// Creates a marker set without checking it against any buffer. Call
    /// [`MarkerSet::normalized`] to repair values restored from storage.
    pub fn new(in_point: usize, out_point: usize, loop_region: Option<LoopRegion>) -> MarkerSet {
        MarkerSet {
            in_point,
            out_point,
            loop_region,
        }
    }

    /// Creates the default markers for a buffer of the given length: the whole
    /// buffer, plus a loop over the given window when one is supplied.
    pub fn with_defaults(frame_count: usize, loop_window: Option<LoopWindow>) -> MarkerSet {
        MarkerSet::new(
            0,
            frame_count,
            loop_window.map(|window| window.region(frame_count)),
        )
        .normalized(frame_count)
    }

    /// Returns the in-point.
    pub fn in_point(&self) -> usize {
        self.in_point
    }

    /// Returns the out-point.
    pub fn out_point(&self) -> usize {
        self.out_point
    }

    /// Returns the loop region, if this sample loops.
    pub fn loop_region(&self) -> Option<LoopRegion> {
        self.loop_region
    }

    /// Returns the loop start, if this sample loops.
    pub fn loop_start(&self) -> Option<usize> {
        self.loop_region.map(|region| region.start)
    }

    /// Returns the loop end, if this sample loops.
    pub fn loop_end(&self) -> Option<usize> {
        self.loop_region.map(|region| region.end)
    }

    /// Returns true if this marker set carries loop markers.
    pub fn has_loop(&self) -> bool {
        self.loop_region.is_some()
    }

    /// Returns the number of audible frames between the in and out points.
    pub fn length(&self) -> usize {
        self.out_point.saturating_sub(self.in_point)
    }

    /// Returns the loop length in frames, if this sample loops.
    pub fn loop_length(&self) -> Option<usize> {
        self.loop_region.map(|region| region.len())
    }

    /// Returns the position of the given marker, or None for a loop marker on a
    /// marker set without a loop.
    pub fn position(&self, marker: Marker) -> Option<usize> {
        match marker {
            Marker::In => Some(self.in_point),
            Marker::Out => Some(self.out_point),
            Marker::LoopStart => self.loop_start(),
            Marker::LoopEnd => self.loop_end(),
        }
    }

    /// Returns every present marker with its position, in timeline order.
    pub fn markers(&self) -> Vec<(Marker, usize)> {
        Marker::ALL
            .iter()
            .filter_map(|marker| self.position(*marker).map(|position| (*marker, position)))
            .collect()
    }

    /// Returns true if the ordering invariants hold for a buffer of the given length.
    pub fn is_valid(&self, frame_count: usize) -> bool {
        if frame_count == 0 {
            return self.in_point == 0 && self.out_point == 0 && self.loop_region.is_none();
        }

        let sample_ok = self.in_point < self.out_point && self.out_point <= frame_count;
        match self.loop_region {
            Some(region) => {
                sample_ok
                    && self.in_point <= region.start
                    && region.start < region.end
                    && region.end <= self.out_point
            }
            None => sample_ok,
        }
    }

    /// Repairs the marker set so that it is valid for a buffer of the given length.
    ///
    /// Valid sets are returned unchanged. An empty buffer collapses everything to
    /// frame 0 and drops the loop, since no loop can exist without frames.
    pub fn normalized(&self, frame_count: usize) -> MarkerSet {
        if frame_count == 0 {
            return MarkerSet::new(0, 0, None);
        }

        let out_point = self.out_point.clamp(1, frame_count);
        let in_point = self.in_point.min(out_point - 1);
        let loop_region = self.loop_region.map(|region| {
            let end = region.end.clamp(in_point + 1, out_point);
            let start = region.start.clamp(in_point, end - 1);
            LoopRegion::new(start, end)
        });

        MarkerSet {
            in_point,
            out_point,
            loop_region,
        }
    }

    /// Returns seconds and percentages for every marker, for display or export.
    pub fn times(&self, sample_rate: u32, frame_count: usize) -> MarkerTimes {
        let time = |frame: usize| MarkerTime::new(frame, sample_rate, frame_count);
        MarkerTimes {
            in_point: time(self.in_point),
            out_point: time(self.out_point),
            loop_start: self.loop_start().map(time),
            loop_end: self.loop_end().map(time),
        }
    }
}

impl fmt::Display for MarkerSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "in: {}, out: {}", self.in_point, self.out_point)?;
        if let Some(region) = self.loop_region {
            write!(f, ", loop: {}..{}", region.start, region.end)?;
        }
        Ok(())
    }
}

/// A marker position expressed as frames, seconds and percentage of length.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MarkerTime {
    pub frame: usize,
    pub seconds: f64,
    pub percentage: f64,
}

impl MarkerTime {
    fn new(frame: usize, sample_rate: u32, frame_count: usize) -> MarkerTime {
        MarkerTime {
            frame,
            seconds: convert::frame_to_seconds(frame as i64, sample_rate),
            percentage: convert::frame_to_percentage(frame as i64, frame_count),
        }
    }
}

/// Human readable positions for a whole marker set.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct MarkerTimes {
    pub in_point: MarkerTime,
    pub out_point: MarkerTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_start: Option<MarkerTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_end: Option<MarkerTime>,
}

/// Creates the default markers for a freshly loaded buffer. Loop-capable
/// instruments get a loop over the default 20%-80% window.
pub fn create_default_markers(buffer: &SampleBuffer, loop_capable: bool) -> MarkerSet {
    MarkerSet::with_defaults(buffer.frame_count(), loop_capable.then(LoopWindow::default))
}

/// Creates the markers for a loop-capable instrument, preferring a loop
/// embedded in the source file over the given fallback window.
pub fn create_markers_with_loop(
    buffer: &SampleBuffer,
    embedded: Option<LoopRegion>,
    fallback: LoopWindow,
) -> MarkerSet {
    let frame_count = buffer.frame_count();
    match embedded {
        Some(region) => MarkerSet::new(0, frame_count, Some(region)).normalized(frame_count),
        None => MarkerSet::with_defaults(frame_count, Some(fallback)),
    }
}
