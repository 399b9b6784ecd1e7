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
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, info, warn};

use super::error::LoadError;
use super::metadata::{self, EmbeddedMetadata};
use crate::buffer::SampleBuffer;
use crate::markers::LoopRegion;

/// The most frames reserved up front from a header's length. Longer files grow
/// the buffer as they decode.
const MAX_RESERVED_FRAMES: u64 = 1 << 22;

/// A decoded audio file, reduced to its analysis channel.
#[derive(Clone, Debug)]
pub struct LoadedAudio {
    /// Channel 0 of the file.
    pub buffer: SampleBuffer,
    /// The number of channels in the source file.
    pub channel_count: u16,
    /// The sustain loop stored in the file, if any.
    pub loop_region: Option<LoopRegion>,
}

/// Decodes the audio file at the given path into a sample buffer holding its
/// first channel. Supports WAV, AIFF and every other format symphonia reads.
pub fn load_sample_buffer(path: &Path) -> Result<LoadedAudio, LoadError> {
    let file_path = path.display().to_string();
    let file = File::open(path).map_err(|e| LoadError::Io(file_path.clone(), e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| LoadError::Unsupported(file_path.clone(), e))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| LoadError::NoAudioTrack(file_path.clone()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| LoadError::MissingSampleRate(file_path.clone()))?;

    let decoder_opts: DecoderOptions = Default::default();
    let mut decoder = get_codecs()
        .make(&params, &decoder_opts)
        .map_err(|e| LoadError::Unsupported(file_path.clone(), e))?;

    let mut channel_count = params.channels.map(|c| c.count() as u16).unwrap_or(0);
    let mut samples = Vec::with_capacity(reserved_frames(params.n_frames));
    while let Some(packet) = next_packet(format_reader.as_mut())? {
        if packet.track_id() != track_id {
            continue;
        }

        match decode_packet(decoder.as_mut(), &packet, &mut samples) {
            Ok(channels) => {
                if channel_count == 0 {
                    channel_count = channels as u16;
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet only loses its own frames.
                warn!(path = ?path, err = e, "Skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Loops are a nice to have; a file we could decode is still usable without one.
    let metadata = match metadata::read_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = ?path, err = %e, "Unable to read embedded metadata");
            EmbeddedMetadata::default()
        }
    };

    // The AIFF reader can run past the end of the sound data into the next chunk.
    if let Some(declared) = metadata.declared_frames {
        if samples.len() > declared {
            debug!(
                path = ?path,
                decoded = samples.len(),
                declared,
                "Trimming frames past the declared length"
            );
            samples.truncate(declared);
        }
    }
    let loop_region = metadata.loop_region;

    let buffer = SampleBuffer::new(samples, sample_rate);
    info!(
        path = ?path,
        frames = buffer.frame_count(),
        sample_rate,
        channels = channel_count,
        loop_region = ?loop_region,
        "Loaded sample"
    );

    Ok(LoadedAudio {
        buffer,
        channel_count,
        loop_region,
    })
}

/// Reads the next packet, returning None at the end of the stream.
fn next_packet(format_reader: &mut dyn FormatReader) -> Result<Option<Packet>, LoadError> {
    match format_reader.next_packet() {
        Ok(packet) => Ok(Some(packet)),
        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(None)
        }
        // Some readers report the end of the stream as a decode error.
        Err(SymphoniaError::DecodeError(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Caps the capacity reserved from a header's frame count.
fn reserved_frames(n_frames: Option<u64>) -> usize {
    n_frames.map_or(0, |n| n.min(MAX_RESERVED_FRAMES) as usize)
}

/// Decodes a packet into `samples` and returns the decoded channel count. The
/// packet is decoded a second time only after the decoder asks for a reset.
fn decode_packet(
    decoder: &mut dyn Decoder,
    packet: &Packet,
    samples: &mut Vec<f32>,
) -> Result<usize, SymphoniaError> {
    match decoder.decode(packet) {
        Ok(decoded) => return Ok(append_first_channel(decoded, samples)),
        Err(SymphoniaError::ResetRequired) => {}
        Err(e) => return Err(e),
    }

    decoder.reset();
    let decoded = decoder.decode(packet)?;
    Ok(append_first_channel(decoded, samples))
}

/// Converts channel 0 of a decoded buffer to f32, appends it, and returns the
/// buffer's channel count.
fn append_first_channel(decoded: AudioBufferRef, samples: &mut Vec<f32>) -> usize {
    let channels = decoded.spec().channels.count();
    match decoded {
        AudioBufferRef::F32(buf) => extend_from_channel(&buf, samples, |s| s),
        AudioBufferRef::F64(buf) => extend_from_channel(&buf, samples, |s| s as f32),
        AudioBufferRef::S8(buf) => extend_from_channel(&buf, samples, scale_s8),
        AudioBufferRef::S16(buf) => extend_from_channel(&buf, samples, scale_s16),
        AudioBufferRef::S24(buf) => extend_from_channel(&buf, samples, |s| scale_s24(s.inner())),
        AudioBufferRef::S32(buf) => extend_from_channel(&buf, samples, scale_s32),
        AudioBufferRef::U8(buf) => extend_from_channel(&buf, samples, scale_u8),
        AudioBufferRef::U16(buf) => extend_from_channel(&buf, samples, scale_u16),
        AudioBufferRef::U24(buf) => extend_from_channel(&buf, samples, |s| scale_u24(s.inner())),
        AudioBufferRef::U32(buf) => extend_from_channel(&buf, samples, scale_u32),
    }
    channels
}

fn extend_from_channel<T, F>(buf: &AudioBuffer<T>, samples: &mut Vec<f32>, convert: F)
where
    T: Sample,
    F: Fn(T) -> f32,
{
    if buf.spec().channels.count() == 0 {
        return;
    }
    samples.extend(buf.chan(0).iter().map(|sample| convert(*sample)));
}

#[inline]
fn scale_s8(sample: i8) -> f32 {
    sample as f32 / (1i64 << 7) as f32
}

#[inline]
fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
fn scale_s24(sample: i32) -> f32 {
    sample as f32 / (1i64 << 23) as f32
}

#[inline]
fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

#[inline]
fn scale_u8(sample: u8) -> f32 {
    (sample as f32 / u8::MAX as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u16(sample: u16) -> f32 {
    (sample as f32 / u16::MAX as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u24(sample: u32) -> f32 {
    let max = (1u32 << 24) - 1;
    (sample as f32 / max as f32) * 2.0 - 1.0
}

#[inline]
fn scale_u32(sample: u32) -> f32 {
    (sample as f32 / u32::MAX as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use std::fs;

    use symphonia::core::audio::{AsAudioBufferRef, Channels, SignalSpec};
    use symphonia::core::codecs::{CodecDescriptor, CodecParameters, FinalizeResult};

    use super::*;
    use crate::testutil::audio_test_utils::generate_sine;
    use crate::testutil::{aiff_with_loop, wav_with_loop, write_wav, write_wav_with_bits};

    /// A mono decoder that hands out four silent frames and counts its calls.
    struct CountingDecoder {
        params: CodecParameters,
        buf: AudioBuffer<f32>,
        decodes: usize,
        resets: usize,
        needs_reset: bool,
    }

    impl CountingDecoder {
        fn new(needs_reset: bool) -> CountingDecoder {
            let mut buf = AudioBuffer::new(4, SignalSpec::new(44100, Channels::FRONT_LEFT));
            buf.render_reserved(Some(4));
            CountingDecoder {
                params: CodecParameters::new(),
                buf,
                decodes: 0,
                resets: 0,
                needs_reset,
            }
        }
    }

    impl Decoder for CountingDecoder {
        fn try_new(
            _params: &CodecParameters,
            _options: &DecoderOptions,
        ) -> symphonia::core::errors::Result<Self> {
            Ok(CountingDecoder::new(false))
        }

        fn supported_codecs() -> &'static [CodecDescriptor] {
            &[]
        }

        fn reset(&mut self) {
            self.resets += 1;
            self.needs_reset = false;
        }

        fn codec_params(&self) -> &CodecParameters {
            &self.params
        }

        fn decode(&mut self, _packet: &Packet) -> symphonia::core::errors::Result<AudioBufferRef> {
            self.decodes += 1;
            if self.needs_reset {
                return Err(SymphoniaError::ResetRequired);
            }
            Ok(self.buf.as_audio_buffer_ref())
        }

        fn finalize(&mut self) -> FinalizeResult {
            FinalizeResult::default()
        }

        fn last_decoded(&self) -> AudioBufferRef {
            self.buf.as_audio_buffer_ref()
        }
    }

    fn packet() -> Packet {
        Packet::new_from_slice(0, 0, 4, &[0u8; 8])
    }

    #[test]
    fn test_decode_packet_decodes_once() {
        let mut decoder = CountingDecoder::new(false);
        let mut samples = Vec::new();

        let channels = decode_packet(&mut decoder, &packet(), &mut samples).unwrap();
        assert_eq!(channels, 1);
        assert_eq!(samples, vec![0.0; 4]);
        assert_eq!(decoder.decodes, 1);
        assert_eq!(decoder.resets, 0);

        decode_packet(&mut decoder, &packet(), &mut samples).unwrap();
        assert_eq!(samples.len(), 8);
        assert_eq!(decoder.decodes, 2);
    }

    #[test]
    fn test_decode_packet_retries_after_reset() {
        let mut decoder = CountingDecoder::new(true);
        let mut samples = Vec::new();

        let channels = decode_packet(&mut decoder, &packet(), &mut samples).unwrap();
        assert_eq!(channels, 1);
        assert_eq!(samples.len(), 4);
        assert_eq!(decoder.decodes, 2);
        assert_eq!(decoder.resets, 1);
    }

    #[test]
    fn test_reserved_frames_is_capped() {
        assert_eq!(reserved_frames(None), 0);
        assert_eq!(reserved_frames(Some(1000)), 1000);
        assert_eq!(reserved_frames(Some(u32::MAX as u64)), MAX_RESERVED_FRAMES as usize);
        assert_eq!(reserved_frames(Some(u64::MAX)), MAX_RESERVED_FRAMES as usize);
    }

    #[test]
    fn test_load_mono_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sine.wav");
        let sine = generate_sine(440.0, 0.5, 44100, 0.25);
        write_wav(path.clone(), vec![sine.clone()], 44100).unwrap();

        let loaded = load_sample_buffer(&path).unwrap();
        assert_eq!(loaded.channel_count, 1);
        assert_eq!(loaded.buffer.sample_rate(), 44100);
        assert_eq!(loaded.buffer.frame_count(), sine.len());
        assert_eq!(loaded.buffer.samples(), &sine[..]);
        assert_eq!(loaded.loop_region, None);
    }

    #[test]
    fn test_load_stereo_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let left: Vec<i16> = vec![16384, -16384, 8192, 0];
        let right: Vec<i16> = vec![-1, -1, -1, -1];
        write_wav_with_bits(path.clone(), vec![left, right], 48000, 16).unwrap();

        let loaded = load_sample_buffer(&path).unwrap();
        assert_eq!(loaded.channel_count, 2);
        assert_eq!(loaded.buffer.sample_rate(), 48000);
        assert_eq!(loaded.buffer.samples(), &[0.5f32, -0.5, 0.25, 0.0][..]);
    }

    #[test]
    fn test_load_reads_embedded_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looped.wav");
        fs::write(&path, wav_with_loop(1000, Some((100, 899)))).unwrap();

        let loaded = load_sample_buffer(&path).unwrap();
        assert_eq!(loaded.buffer.frame_count(), 1000);
        assert_eq!(loaded.loop_region, Some(LoopRegion::new(100, 900)));
    }

    #[test]
    fn test_load_aiff_with_sustain_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looped.aiff");
        fs::write(&path, aiff_with_loop(1000, Some((250, 750)))).unwrap();

        let loaded = load_sample_buffer(&path).unwrap();
        assert_eq!(loaded.channel_count, 1);
        assert_eq!(loaded.buffer.sample_rate(), 44100);
        assert_eq!(loaded.buffer.frame_count(), 1000);
        assert_eq!(loaded.loop_region, Some(LoopRegion::new(250, 750)));

        let samples = loaded.buffer.samples();
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 100.0 / 32768.0);
        assert_eq!(samples[999], 9900.0 / 32768.0);
    }

    #[test]
    fn test_load_aiff_without_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.aiff");
        fs::write(&path, aiff_with_loop(500, None)).unwrap();

        let loaded = load_sample_buffer(&path).unwrap();
        assert_eq!(loaded.buffer.frame_count(), 500);
        assert_eq!(loaded.loop_region, None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_sample_buffer(&dir.path().join("missing.wav"));
        assert!(matches!(result, Err(LoadError::Io(_, _))));
    }

    #[test]
    fn test_load_not_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "definitely not audio").unwrap();

        let result = load_sample_buffer(&path);
        assert!(matches!(result, Err(LoadError::Unsupported(_, _))));
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale_s16(i16::MIN), -1.0);
        assert_eq!(scale_s16(0), 0.0);
        assert_eq!(scale_s8(64), 0.5);
        assert_eq!(scale_s24(1 << 22), 0.5);
        assert_eq!(scale_s32(i32::MIN), -1.0);
        assert_eq!(scale_u8(0), -1.0);
        assert_eq!(scale_u8(u8::MAX), 1.0);
        assert_eq!(scale_u16(u16::MAX), 1.0);
        assert_eq!(scale_u24((1 << 24) - 1), 1.0);
        assert_eq!(scale_u32(0), -1.0);
    }
}
