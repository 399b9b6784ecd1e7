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
//! Stateless conversions between frames, seconds, percentages and pixels.
//!
//! Every function here is total. Degenerate inputs (a sample rate of 0, a view
//! width of 0, a frame count of 0 or 1, NaN) produce 0 rather than a division
//! by zero or a garbage frame.

/// Converts a frame index to seconds.
pub fn frame_to_seconds(frame: i64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frame as f64 / sample_rate as f64
}

/// Converts seconds to the nearest frame index.
pub fn seconds_to_frame(seconds: f64, sample_rate: u32) -> i64 {
    if sample_rate == 0 || !seconds.is_finite() {
        return 0;
    }
    // Float to int casts saturate, so huge values land on the i64 bounds.
    (seconds * sample_rate as f64).round() as i64
}

/// Converts a frame index to a percentage of the buffer length.
pub fn frame_to_percentage(frame: i64, frame_count: usize) -> f64 {
    if frame_count == 0 {
        return 0.0;
    }
    (frame as f64 / frame_count as f64) * 100.0
}

/// Converts a percentage of the buffer length to the nearest frame index.
pub fn percentage_to_frame(percentage: f64, frame_count: usize) -> i64 {
    if frame_count == 0 || !percentage.is_finite() {
        return 0;
    }
    (percentage / 100.0 * frame_count as f64).round() as i64
}

/// Maps a horizontal pixel position within a waveform view to a frame index.
///
/// The result is not clamped to the buffer; positions left of the view map to
/// negative frames and positions past the right edge map beyond the end. The
/// marker resolver is responsible for clamping.
pub fn pixel_to_frame(x: f32, view_width: f32, frame_count: usize) -> i64 {
    if frame_count <= 1 || view_width.is_nan() || view_width <= 0.0 || !x.is_finite() {
        return 0;
    }
    ((x as f64 / view_width as f64) * frame_count as f64).round() as i64
}

/// Maps a frame index to a horizontal pixel position within a waveform view.
pub fn frame_to_pixel(frame: i64, view_width: f32, frame_count: usize) -> f32 {
    if frame_count <= 1 || view_width.is_nan() || view_width <= 0.0 {
        return 0.0;
    }
    ((frame as f64 / frame_count as f64) * view_width as f64) as f32
}
