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
//! Host side loading of audio files into sample buffers.
//!
//! Nothing in the marker engine depends on this module. It exists so that the
//! command line tool (and any other host) can go from a file on disk to a
//! [`crate::buffer::SampleBuffer`] and the loop stored in the file, if any.

mod decode;
pub mod error;
pub mod metadata;

pub use decode::{load_sample_buffer, LoadedAudio};
pub use error::LoadError;
