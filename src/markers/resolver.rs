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
use tracing::trace;

use super::{LoopRegion, Marker, MarkerSet};
use crate::buffer::SampleBuffer;
use crate::zero_crossing::{Direction, ZeroCrossingLocator};

/// How a move request was produced. Decides which way snapping searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// A single click or tap that places a marker. Snaps in both directions.
    Click,
    /// A continuous drag. Snaps in the direction the pointer is travelling.
    Drag(Direction),
}

impl Gesture {
    fn snap_direction(self) -> Direction {
        match self {
            Gesture::Click => Direction::Both,
            Gesture::Drag(direction) => direction,
        }
    }
}

/// The single authority for moving markers.
///
/// Every move is total: out of range requests clamp to the nearest valid
/// position and neighbouring markers are pushed or pulled as needed, so the
/// result always satisfies the marker ordering invariants. Moves are
/// idempotent, which makes it safe to feed every pointer event straight in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkerResolver {
    locator: ZeroCrossingLocator,
    snap_to_zero: bool,
}

impl MarkerResolver {
    /// Creates a new resolver.
    pub fn new(locator: ZeroCrossingLocator, snap_to_zero: bool) -> MarkerResolver {
        MarkerResolver {
            locator,
            snap_to_zero,
        }
    }

    /// Returns true if requests are snapped to zero crossings before being applied.
    pub fn snap_to_zero(&self) -> bool {
        self.snap_to_zero
    }

    /// Enables or disables snapping to zero crossings.
    pub fn set_snap_to_zero(&mut self, snap_to_zero: bool) {
        self.snap_to_zero = snap_to_zero;
    }

    /// Returns the zero-crossing locator used for snapping.
    pub fn locator(&self) -> &ZeroCrossingLocator {
        &self.locator
    }

    /// Moves the in-point.
    pub fn move_in_point(
        &self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        requested: i64,
        gesture: Gesture,
    ) -> MarkerSet {
        self.move_marker(markers, buffer, Marker::In, requested, gesture)
    }

    /// Moves the out-point.
    pub fn move_out_point(
        &self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        requested: i64,
        gesture: Gesture,
    ) -> MarkerSet {
        self.move_marker(markers, buffer, Marker::Out, requested, gesture)
    }

    /// Moves the loop start. A no-op for marker sets without a loop.
    pub fn move_loop_start(
        &self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        requested: i64,
        gesture: Gesture,
    ) -> MarkerSet {
        self.move_marker(markers, buffer, Marker::LoopStart, requested, gesture)
    }

    /// Moves the loop end. A no-op for marker sets without a loop.
    pub fn move_loop_end(
        &self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        requested: i64,
        gesture: Gesture,
    ) -> MarkerSet {
        self.move_marker(markers, buffer, Marker::LoopEnd, requested, gesture)
    }

    /// Moves the given marker to the requested frame and returns the resolved set.
    ///
    /// The incoming set is normalized against the buffer first, so a set that
    /// was carried over from a different buffer still resolves to a valid one.
    pub fn move_marker(
        &self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        marker: Marker,
        requested: i64,
        gesture: Gesture,
    ) -> MarkerSet {
        let frame_count = buffer.frame_count();
        let markers = markers.normalized(frame_count);
        if frame_count == 0 {
            return markers;
        }

        let target = requested_frame(self, buffer, requested, gesture);
        let resolved = match (marker, markers.loop_region) {
            (Marker::In, region) => markers.apply_in_point(target, region),
            (Marker::Out, region) => markers.apply_out_point(target, region, frame_count),
            (Marker::LoopStart, Some(region)) => markers.apply_loop_start(target, region),
            (Marker::LoopEnd, Some(region)) => markers.apply_loop_end(target, region),
            (Marker::LoopStart | Marker::LoopEnd, None) => return markers,
        };

        trace!(%marker, requested, target, %resolved, "Resolved marker move");
        resolved
    }
}

/// Routes the request through the zero-crossing locator when snapping is on.
fn requested_frame(
    resolver: &MarkerResolver,
    buffer: &SampleBuffer,
    requested: i64,
    gesture: Gesture,
) -> i64 {
    if !resolver.snap_to_zero {
        return requested;
    }
    resolver
        .locator
        .locate(buffer, requested, gesture.snap_direction()) as i64
}

impl MarkerSet {
    fn apply_in_point(&self, requested: i64, region: Option<LoopRegion>) -> MarkerSet {
        // The in-point may reach loop_end - 1 but never passes it, so the loop
        // start always has somewhere to go when it is pushed.
        let upper = match region {
            Some(region) => (self.out_point - 1).min(region.end - 1),
            None => self.out_point - 1,
        };
        let in_point = clamp_frame(requested, 0, upper);

        let loop_region = region.map(|region| {
            if in_point >= region.start {
                LoopRegion::new((in_point + 1).min(region.end - 1), region.end)
            } else {
                region
            }
        });

        MarkerSet {
            in_point,
            out_point: self.out_point,
            loop_region,
        }
    }

    fn apply_out_point(
        &self,
        requested: i64,
        region: Option<LoopRegion>,
        frame_count: usize,
    ) -> MarkerSet {
        // With a loop the out-point stays past the loop end, and the loop end
        // must keep at least one frame after the loop start.
        let lower = match region {
            Some(region) => (self.in_point + 1).max(region.start + 2),
            None => self.in_point + 1,
        }
        .min(frame_count);
        let out_point = clamp_frame(requested, lower, frame_count);

        let loop_region = region.map(|region| {
            if out_point <= region.end {
                let end = out_point.saturating_sub(1).max(region.start + 1);
                LoopRegion::new(region.start, end)
            } else {
                region
            }
        });

        MarkerSet {
            in_point: self.in_point,
            out_point,
            loop_region,
        }
    }

    fn apply_loop_start(&self, requested: i64, region: LoopRegion) -> MarkerSet {
        // Dragging the loop start below the in-point drags the in-point along.
        let start = clamp_frame(requested, 0, region.end - 1);
        MarkerSet {
            in_point: self.in_point.min(start),
            out_point: self.out_point,
            loop_region: Some(LoopRegion::new(start, region.end)),
        }
    }

    fn apply_loop_end(&self, requested: i64, region: LoopRegion) -> MarkerSet {
        let end = clamp_frame(requested, region.start + 1, self.out_point);
        MarkerSet {
            in_point: self.in_point,
            out_point: self.out_point,
            loop_region: Some(LoopRegion::new(region.start, end)),
        }
    }
}

/// Clamps a signed frame request into `[lower, upper]`.
fn clamp_frame(requested: i64, lower: usize, upper: usize) -> usize {
    if requested <= lower as i64 {
        lower
    } else if requested >= upper as i64 {
        upper
    } else {
        requested as usize
    }
}

/// Moves the in-point, snapping in both directions when `snap_to_zero` is set.
pub fn move_in_point(
    markers: &MarkerSet,
    buffer: &SampleBuffer,
    requested: i64,
    snap_to_zero: bool,
) -> MarkerSet {
    MarkerResolver::new(ZeroCrossingLocator::default(), snap_to_zero).move_in_point(
        markers,
        buffer,
        requested,
        Gesture::Click,
    )
}

/// Moves the out-point, snapping in both directions when `snap_to_zero` is set.
pub fn move_out_point(
    markers: &MarkerSet,
    buffer: &SampleBuffer,
    requested: i64,
    snap_to_zero: bool,
) -> MarkerSet {
    MarkerResolver::new(ZeroCrossingLocator::default(), snap_to_zero).move_out_point(
        markers,
        buffer,
        requested,
        Gesture::Click,
    )
}

/// Moves the loop start, snapping in both directions when `snap_to_zero` is set.
pub fn move_loop_start(
    markers: &MarkerSet,
    buffer: &SampleBuffer,
    requested: i64,
    snap_to_zero: bool,
) -> MarkerSet {
    MarkerResolver::new(ZeroCrossingLocator::default(), snap_to_zero).move_loop_start(
        markers,
        buffer,
        requested,
        Gesture::Click,
    )
}

/// Moves the loop end, snapping in both directions when `snap_to_zero` is set.
pub fn move_loop_end(
    markers: &MarkerSet,
    buffer: &SampleBuffer,
    requested: i64,
    snap_to_zero: bool,
) -> MarkerSet {
    MarkerResolver::new(ZeroCrossingLocator::default(), snap_to_zero).move_loop_end(
        markers,
        buffer,
        requested,
        Gesture::Click,
    )
}
