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

use std::{any::TypeId, error::Error, fs::File, path::PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Audio test utilities for generating test signals.
pub mod audio_test_utils {
    use std::f32::consts::PI;

    /// Generate a sine wave.
    pub fn generate_sine(
        frequency: f32,
        amplitude: f32,
        sample_rate: u32,
        duration_seconds: f32,
    ) -> Vec<f32> {
        let sample_count = (sample_rate as f32 * duration_seconds) as usize;
        (0..sample_count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * PI * frequency * t).sin()
            })
            .collect()
    }

    /// Adds a constant offset to every sample.
    pub fn with_dc_offset(samples: Vec<f32>, offset: f32) -> Vec<f32> {
        samples.into_iter().map(|sample| sample + offset).collect()
    }
}

/// Writes a 32 bit WAV file with one Vec of samples per channel.
pub fn write_wav<S: hound::Sample + Copy + 'static>(
    path: PathBuf,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    write_wav_with_bits(path, samples, sample_rate, 32)
}

/// Writes a WAV file with one Vec of samples per channel at the given bit depth.
pub fn write_wav_with_bits<S: hound::Sample + Copy + 'static>(
    path: PathBuf,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), Box<dyn Error>> {
    let tempwav = File::create(path)?;

    // Determine sample format based on the type
    let sample_format = if TypeId::of::<S>() == TypeId::of::<f32>() {
        SampleFormat::Float
    } else if TypeId::of::<S>() == TypeId::of::<i32>() || TypeId::of::<S>() == TypeId::of::<i16>()
    {
        SampleFormat::Int
    } else {
        return Err("Unsupported sample format".into());
    };

    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let mut writer = WavWriter::new(
        tempwav,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )?;

    // Interleave the channels frame by frame.
    let frames = samples.iter().map(Vec::len).max().unwrap_or(0);
    for frame in 0..frames {
        for channel in &samples {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// A quiet ramp that never spells out a chunk id in its bytes.
pub fn ramp(frames: usize) -> impl Iterator<Item = i16> {
    (0..frames).map(|i| (i % 100) as i16 * 100)
}

/// Builds a mono 16 bit WAV file in memory. When a loop is given, a `smpl`
/// chunk with a single loop (end inclusive, as stored in the file) follows the
/// data chunk.
pub fn wav_with_loop(frames: usize, sample_loop: Option<(u32, u32)>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"WAVE");

    body.extend_from_slice(b"fmt ");
    body.extend_from_slice(&16u32.to_le_bytes());
    body.extend_from_slice(&1u16.to_le_bytes()); // PCM
    body.extend_from_slice(&1u16.to_le_bytes()); // channels
    body.extend_from_slice(&44100u32.to_le_bytes());
    body.extend_from_slice(&(44100u32 * 2).to_le_bytes());
    body.extend_from_slice(&2u16.to_le_bytes()); // block align
    body.extend_from_slice(&16u16.to_le_bytes());

    body.extend_from_slice(b"data");
    body.extend_from_slice(&(frames as u32 * 2).to_le_bytes());
    for sample in ramp(frames) {
        body.extend_from_slice(&sample.to_le_bytes());
    }

    if let Some((start, end)) = sample_loop {
        let mut smpl = vec![0u8; 36];
        smpl[12..16].copy_from_slice(&60u32.to_le_bytes()); // unity note
        smpl[28..32].copy_from_slice(&1u32.to_le_bytes()); // loop count
        smpl.extend_from_slice(&0u32.to_le_bytes()); // cue id
        smpl.extend_from_slice(&0u32.to_le_bytes()); // forward loop
        smpl.extend_from_slice(&start.to_le_bytes());
        smpl.extend_from_slice(&end.to_le_bytes());
        smpl.extend_from_slice(&0u32.to_le_bytes()); // fraction
        smpl.extend_from_slice(&0u32.to_le_bytes()); // play forever

        body.extend_from_slice(b"smpl");
        body.extend_from_slice(&(smpl.len() as u32).to_le_bytes());
        body.extend_from_slice(&smpl);
    }

    let mut data = Vec::with_capacity(body.len() + 8);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend_from_slice(&body);
    data
}

/// Builds a mono 16 bit AIFF file in memory. When a loop is given, it is
/// stored as the sustain loop of the `INST` chunk between two `MARK` markers.
pub fn aiff_with_loop(frames: usize, sustain_loop: Option<(u32, u32)>) -> Vec<u8> {
    fn chunk(body: &mut Vec<u8>, id: &[u8; 4], contents: &[u8]) {
        body.extend_from_slice(id);
        body.extend_from_slice(&(contents.len() as u32).to_be_bytes());
        body.extend_from_slice(contents);
        if contents.len() % 2 == 1 {
            body.push(0);
        }
    }

    fn marker(mark: &mut Vec<u8>, id: u16, position: u32, name: &str) {
        mark.extend_from_slice(&id.to_be_bytes());
        mark.extend_from_slice(&position.to_be_bytes());
        mark.push(name.len() as u8);
        mark.extend_from_slice(name.as_bytes());
        if (1 + name.len()) % 2 == 1 {
            mark.push(0);
        }
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"AIFF");

    let mut comm = Vec::new();
    comm.extend_from_slice(&1u16.to_be_bytes()); // channels
    comm.extend_from_slice(&(frames as u32).to_be_bytes());
    comm.extend_from_slice(&16u16.to_be_bytes());
    // 44100 as an 80 bit extended float.
    comm.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);
    chunk(&mut body, b"COMM", &comm);

    // Sound data comes before the loop chunks, as symphonia stops reading at SSND.
    let mut ssnd = vec![0u8; 8];
    for sample in ramp(frames) {
        ssnd.extend_from_slice(&sample.to_be_bytes());
    }
    chunk(&mut body, b"SSND", &ssnd);

    let play_mode: u16 = if let Some((start, end)) = sustain_loop {
        let mut mark = Vec::new();
        mark.extend_from_slice(&2u16.to_be_bytes());
        marker(&mut mark, 1, start, "begin");
        marker(&mut mark, 2, end, "end");
        chunk(&mut body, b"MARK", &mark);
        1
    } else {
        0
    };

    let mut inst = vec![60, 0, 0, 127, 1, 127, 0, 0];
    inst.extend_from_slice(&play_mode.to_be_bytes());
    inst.extend_from_slice(&1u16.to_be_bytes());
    inst.extend_from_slice(&2u16.to_be_bytes());
    inst.extend_from_slice(&[0; 6]); // release loop
    chunk(&mut body, b"INST", &inst);

    let mut data = Vec::with_capacity(body.len() + 8);
    data.extend_from_slice(b"FORM");
    data.extend_from_slice(&(body.len() as u32).to_be_bytes());
    data.extend_from_slice(&body);
    data
}
