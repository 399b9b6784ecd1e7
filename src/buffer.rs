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
//! Read-only view over the analysis channel of a decoded sample.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::convert;

/// One channel of decoded audio used for marker analysis.
///
/// The sample data is stored in an Arc so that any number of editors (a small
/// inline waveform and a zoomed editor, for example) can share the same buffer
/// without copying it. Nothing in the crate mutates a buffer once it is built.
#[derive(Clone)]
pub struct SampleBuffer {
    /// Amplitudes for the analysis channel. Not required to be within [-1.0, 1.0].
    samples: Arc<[f32]>,
    /// Frames per second.
    sample_rate: u32,
}

impl SampleBuffer {
    /// Creates a buffer from a single channel of samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Creates a buffer with no frames.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Creates a buffer from interleaved samples, keeping only channel 0.
    pub fn from_interleaved(interleaved: &[f32], channel_count: u16, sample_rate: u32) -> Self {
        let channels = channel_count as usize;
        if channels == 0 {
            return Self::empty(sample_rate);
        }

        let samples = interleaved.iter().step_by(channels).copied().collect();
        Self::new(samples, sample_rate)
    }

    /// Creates a buffer from planar samples (one Vec per channel), keeping only channel 0.
    pub fn from_planar(mut planar: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        if planar.is_empty() {
            return Self::empty(sample_rate);
        }

        Self::new(planar.swap_remove(0), sample_rate)
    }

    /// Returns the amplitude at the given frame, or 0.0 if the frame is out of range.
    #[inline]
    pub fn amplitude_at(&self, frame: i64) -> f32 {
        if frame < 0 {
            return 0.0;
        }
        self.samples.get(frame as usize).copied().unwrap_or(0.0)
    }

    /// Returns the number of frames in the buffer.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample rate of the buffer.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the length of the buffer in seconds. A sample rate of 0 yields 0.
    pub fn duration_seconds(&self) -> f64 {
        convert::frame_to_seconds(self.frame_count() as i64, self.sample_rate)
    }

    /// Returns the length of the buffer as a Duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds())
    }

    /// Returns the raw samples of the analysis channel.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("frame_count", &self.frame_count())
            .field("sample_rate", &self.sample_rate)
            .field("memory_kb", &(self.memory_size() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_amplitude_at_is_bounds_checked() {
        let buffer = SampleBuffer::new(vec![0.5, -0.25, 1.5], 44100);

        assert_eq!(buffer.amplitude_at(0), 0.5);
        assert_eq!(buffer.amplitude_at(1), -0.25);
        // Values are not clamped.
        assert_eq!(buffer.amplitude_at(2), 1.5);
        assert_eq!(buffer.amplitude_at(3), 0.0);
        assert_eq!(buffer.amplitude_at(-1), 0.0);
        assert_eq!(buffer.amplitude_at(i64::MAX), 0.0);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 44100], 44100);
        assert_eq!(buffer.frame_count(), 44100);
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-9);
        assert_eq!(buffer.duration(), Duration::from_secs(1));

        let half = SampleBuffer::new(vec![0.0; 24000], 48000);
        assert!((half.duration_seconds() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sample_rate_has_zero_duration() {
        let buffer = SampleBuffer::new(vec![0.1; 100], 0);
        assert_eq!(buffer.duration_seconds(), 0.0);
        assert_eq!(buffer.duration(), Duration::ZERO);
    }

    #[test]
    fn test_empty() {
        let buffer = SampleBuffer::empty(48000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.amplitude_at(0), 0.0);
        assert_eq!(buffer.duration_seconds(), 0.0);
    }

    #[test]
    fn test_from_interleaved_keeps_channel_zero() {
        let interleaved = vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = SampleBuffer::from_interleaved(&interleaved, 2, 44100);

        assert_eq!(buffer.samples(), &[0.1f32, 0.2, 0.3][..]);
        assert_eq!(buffer.sample_rate(), 44100);
    }

    #[test]
    fn test_from_interleaved_zero_channels() {
        let buffer = SampleBuffer::from_interleaved(&[0.1, 0.2], 0, 44100);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_from_planar_keeps_channel_zero() {
        let buffer = SampleBuffer::from_planar(vec![vec![0.5, 0.25], vec![-1.0, -1.0]], 22050);
        assert_eq!(buffer.samples(), &[0.5f32, 0.25][..]);

        let empty = SampleBuffer::from_planar(Vec::new(), 22050);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let buffer = SampleBuffer::new((0..1000).map(|i| i as f32 / 1000.0).collect(), 44100);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let buffer = buffer.clone();
                thread::spawn(move || buffer.amplitude_at(i * 100))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let amplitude = handle.join().unwrap();
            assert_eq!(amplitude, (i * 100) as f32 / 1000.0);
        }
    }
}
