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
//! Turns pointer events over a rendered waveform into marker moves.

use tracing::{debug, trace};

use crate::buffer::SampleBuffer;
use crate::convert;
use crate::markers::{Gesture, Marker, MarkerResolver, MarkerSet};
use crate::zero_crossing::Direction;

/// Default hit radius for mouse pointers, in pixels.
pub const DEFAULT_MOUSE_TOLERANCE: f32 = 8.0;

/// Default hit radius for touch input, in pixels. Large enough for an accessible target.
pub const DEFAULT_TOUCH_TOLERANCE: f32 = 22.0;

/// Default height of the top and bottom zones, as a fraction of the view height.
pub const DEFAULT_ZONE_FRACTION: f32 = 1.0 / 3.0;

/// The kind of device that produced a pointer event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// A pointer position relative to the top left corner of the waveform view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
    pub kind: PointerKind,
}

impl Pointer {
    /// Creates a mouse pointer at the given position.
    pub fn mouse(x: f32, y: f32) -> Pointer {
        Pointer {
            x,
            y,
            kind: PointerKind::Mouse,
        }
    }

    /// Creates a touch point at the given position.
    pub fn touch(x: f32, y: f32) -> Pointer {
        Pointer {
            x,
            y,
            kind: PointerKind::Touch,
        }
    }
}

/// How markers are arranged in a view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// All markers share one row.
    #[default]
    Single,
    /// Loop markers are drawn in a row above the sample markers.
    Stacked,
}

/// The size and layout of a rendered waveform view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewGeometry {
    pub width: f32,
    pub height: f32,
    pub layout: Layout,
}

impl ViewGeometry {
    pub fn new(width: f32, height: f32, layout: Layout) -> ViewGeometry {
        ViewGeometry {
            width,
            height,
            layout,
        }
    }

    /// Returns true if the view has a width and the pointer has an x position
    /// that can be mapped to a frame.
    fn is_hittable(&self, pointer: Pointer) -> bool {
        self.width > 0.0 && !pointer.x.is_nan()
    }
}

/// Pixel radius within which a pointer grabs a marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitTolerance {
    mouse: f32,
    touch: f32,
}

impl Default for HitTolerance {
    fn default() -> Self {
        HitTolerance {
            mouse: DEFAULT_MOUSE_TOLERANCE,
            touch: DEFAULT_TOUCH_TOLERANCE,
        }
    }
}

impl HitTolerance {
    /// Creates a new hit tolerance. Negative or NaN radii are treated as 0.
    pub fn new(mouse: f32, touch: f32) -> HitTolerance {
        HitTolerance {
            mouse: mouse.max(0.0),
            touch: touch.max(0.0),
        }
    }

    /// Returns the radius for the given pointer kind.
    pub fn radius(&self, kind: PointerKind) -> f32 {
        match kind {
            PointerKind::Mouse => self.mouse,
            PointerKind::Touch => self.touch,
        }
    }
}

/// The markers a pointer is allowed to pick in a stacked layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// Top band: loop markers only.
    Loop,
    /// Bottom band: in and out points only.
    Sample,
    /// Middle band: everything.
    All,
}

impl Zone {
    /// Returns true if the marker can be picked from this zone.
    pub fn admits(self, marker: Marker) -> bool {
        match self {
            Zone::Loop => marker.is_loop(),
            Zone::Sample => !marker.is_loop(),
            Zone::All => true,
        }
    }
}

/// Heights of the top and bottom zones as fractions of the view height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zones {
    top: f32,
    bottom: f32,
}

impl Default for Zones {
    fn default() -> Self {
        Zones {
            top: DEFAULT_ZONE_FRACTION,
            bottom: DEFAULT_ZONE_FRACTION,
        }
    }
}

impl Zones {
    /// Creates new zones. Fractions are clamped into [0.0, 1.0], and the bottom
    /// zone is shrunk if the two would overlap.
    pub fn new(top: f32, bottom: f32) -> Zones {
        let top = if top.is_nan() { 0.0 } else { top.clamp(0.0, 1.0) };
        let bottom = if bottom.is_nan() {
            0.0
        } else {
            bottom.clamp(0.0, 1.0 - top)
        };
        Zones { top, bottom }
    }

    /// Returns the top zone fraction.
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Returns the bottom zone fraction.
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Returns the zone containing the given vertical position.
    pub fn zone_at(&self, y: f32, height: f32) -> Zone {
        if height.is_nan() || height <= 0.0 || y.is_nan() {
            return Zone::All;
        }

        if y < height * self.top {
            Zone::Loop
        } else if y > height * (1.0 - self.bottom) {
            Zone::Sample
        } else {
            Zone::All
        }
    }
}

/// The drag session state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    /// A marker is grabbed. `last_x` is used to find the drag direction.
    Armed { marker: Marker, last_x: f32 },
}

/// The outcome of a pointer down event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
    /// The pointer landed on a marker, which is now being dragged.
    Armed(Marker),
    /// The pointer landed away from every marker, so the nearest one was moved to it.
    Jumped { marker: Marker, markers: MarkerSet },
    /// Nothing to interact with (an empty buffer or a zero sized view).
    Ignored,
}

/// Drives marker edits from pointer events.
///
/// The controller only holds the drag session. Marker sets are passed in on
/// every event and resolved sets are handed back, so the host stays the owner
/// of its markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragController {
    resolver: MarkerResolver,
    tolerance: HitTolerance,
    zones: Zones,
    state: DragState,
}

impl DragController {
    /// Creates a new, idle drag controller.
    pub fn new(resolver: MarkerResolver, tolerance: HitTolerance, zones: Zones) -> DragController {
        DragController {
            resolver,
            tolerance,
            zones,
            state: DragState::Idle,
        }
    }

    /// Returns the resolver used for moves.
    pub fn resolver(&self) -> &MarkerResolver {
        &self.resolver
    }

    /// Enables or disables snapping to zero crossings for subsequent moves.
    pub fn set_snap_to_zero(&mut self, snap_to_zero: bool) {
        self.resolver.set_snap_to_zero(snap_to_zero);
    }

    /// Returns the current drag state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Returns the marker being dragged, if any.
    pub fn active_marker(&self) -> Option<Marker> {
        match self.state {
            DragState::Idle => None,
            DragState::Armed { marker, .. } => Some(marker),
        }
    }

    /// Handles a pointer or touch down event.
    ///
    /// Within the hit tolerance of a marker the marker is armed for dragging
    /// and the markers are left alone. Otherwise the nearest eligible marker
    /// jumps to the pointer as if it had been clicked into place.
    pub fn pointer_down(
        &mut self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        view: &ViewGeometry,
        pointer: Pointer,
    ) -> Interaction {
        self.state = DragState::Idle;

        let frame_count = buffer.frame_count();
        if frame_count == 0 || !view.is_hittable(pointer) {
            return Interaction::Ignored;
        }

        let markers = markers.normalized(frame_count);
        let zone = match (view.layout, markers.has_loop()) {
            (Layout::Stacked, true) => self.zones.zone_at(pointer.y, view.height),
            _ => Zone::All,
        };
        let Some((marker, distance)) = nearest_marker(&markers, frame_count, view, pointer.x, zone)
        else {
            return Interaction::Ignored;
        };

        if distance <= self.tolerance.radius(pointer.kind) {
            debug!(%marker, x = pointer.x, distance, "Armed marker");
            self.state = DragState::Armed {
                marker,
                last_x: pointer.x,
            };
            return Interaction::Armed(marker);
        }

        let target = convert::pixel_to_frame(pointer.x, view.width, frame_count);
        let moved = self
            .resolver
            .move_marker(&markers, buffer, marker, target, Gesture::Click);
        debug!(%marker, x = pointer.x, target, markers = %moved, "Jumped marker");
        Interaction::Jumped {
            marker,
            markers: moved,
        }
    }

    /// Handles a pointer move. Returns the resolved markers while a marker is
    /// armed, or None when idle.
    pub fn pointer_move(
        &mut self,
        markers: &MarkerSet,
        buffer: &SampleBuffer,
        view: &ViewGeometry,
        pointer: Pointer,
    ) -> Option<MarkerSet> {
        let DragState::Armed { marker, last_x } = self.state else {
            return None;
        };
        if !view.is_hittable(pointer) {
            // No usable x position; the drag stays armed and the markers stay put.
            trace!(%marker, x = pointer.x, width = view.width, "Ignored pointer move");
            return Some(markers.normalized(buffer.frame_count()));
        }

        let direction = Direction::from_delta((pointer.x - last_x) as f64);
        self.state = DragState::Armed {
            marker,
            last_x: pointer.x,
        };

        let target = convert::pixel_to_frame(pointer.x, view.width, buffer.frame_count());
        let moved = self
            .resolver
            .move_marker(markers, buffer, marker, target, Gesture::Drag(direction));
        trace!(%marker, x = pointer.x, target, ?direction, "Dragged marker");
        Some(moved)
    }

    /// Handles a pointer up event, ending the drag. Returns the marker that was released.
    pub fn pointer_up(&mut self) -> Option<Marker> {
        let released = self.active_marker();
        if let Some(marker) = released {
            debug!(%marker, "Released marker");
        }
        self.state = DragState::Idle;
        released
    }

    /// Handles the pointer leaving the view. The drag is abandoned; moves that
    /// were already returned stay valid.
    pub fn pointer_leave(&mut self) {
        if let Some(marker) = self.active_marker() {
            debug!(%marker, "Abandoned drag");
        }
        self.state = DragState::Idle;
    }
}

/// Finds the marker closest to the pointer among those admitted by the zone.
///
/// Markers are visited in timeline order. On equal distance, a later marker
/// only wins if the pointer is to its right, so coincident markers resolve to
/// the one that can follow the pointer.
fn nearest_marker(
    markers: &MarkerSet,
    frame_count: usize,
    view: &ViewGeometry,
    x: f32,
    zone: Zone,
) -> Option<(Marker, f32)> {
    let mut best: Option<(Marker, f32)> = None;
    for (marker, position) in markers.markers() {
        if !zone.admits(marker) {
            continue;
        }

        let marker_x = convert::frame_to_pixel(position as i64, view.width, frame_count);
        let distance = (x - marker_x).abs();
        let better = match best {
            None => true,
            Some((_, best_distance)) => {
                distance < best_distance || (distance == best_distance && x > marker_x)
            }
        };
        if better {
            best = Some((marker, distance));
        }
    }
    best
}
