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
//! Sample marker editing for hardware sampler presets.
//!
//! The core is pure and synchronous: a read-only [`SampleBuffer`], a
//! [`ZeroCrossingLocator`], the [`MarkerResolver`] that keeps in, out and loop
//! markers ordered, and a [`DragController`] that turns pointer events into
//! resolver calls. Loading audio from disk lives in [`audio`].

pub mod audio;
pub mod buffer;
pub mod config;
pub mod convert;
pub mod interaction;
pub mod markers;
pub mod util;
pub mod zero_crossing;

#[cfg(test)]
mod testutil;

pub use buffer::SampleBuffer;
pub use interaction::DragController;
pub use markers::{Gesture, LoopRegion, Marker, MarkerResolver, MarkerSet};
pub use zero_crossing::{Direction, ZeroCrossingLocator};
