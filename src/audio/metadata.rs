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
//! Reads sustain loops and declared lengths embedded in WAV and AIFF files.
//!
//! WAV files carry loops in the `smpl` chunk, where the loop end is the last
//! frame played. AIFF files reference two `MARK` markers from the sustain loop
//! of the `INST` chunk, and markers sit between frames. Both are returned as a
//! [`LoopRegion`] with an exclusive end.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::error::LoadError;
use crate::markers::LoopRegion;

/// Size of the fixed part of a `smpl` chunk, before the loop records.
const SMPL_HEADER_LEN: usize = 36;

/// Size of one `smpl` loop record.
const SMPL_LOOP_LEN: usize = 24;

/// Information stored in a WAV or AIFF file next to the audio itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmbeddedMetadata {
    /// The first sustain loop, if any.
    pub loop_region: Option<LoopRegion>,
    /// The frame count declared in an AIFF `COMM` chunk.
    pub declared_frames: Option<usize>,
}

/// Reads the sustain loop and declared length stored in the given file.
pub fn read_metadata(path: &Path) -> Result<EmbeddedMetadata, LoadError> {
    let data = fs::read(path).map_err(|e| LoadError::Io(path.display().to_string(), e))?;
    let metadata = EmbeddedMetadata {
        loop_region: parse_loop(&data),
        declared_frames: parse_declared_frames(&data),
    };
    debug!(path = ?path, metadata = ?metadata, "Read embedded metadata");
    Ok(metadata)
}

/// Parses the first sustain loop out of the raw bytes of a WAV or AIFF file.
/// Returns None for other formats, files without a loop, and empty loops.
pub fn parse_loop(data: &[u8]) -> Option<LoopRegion> {
    let region = match data.get(0..4)? {
        b"RIFF" if data.get(8..12)? == b"WAVE" => wav_loop(data),
        b"FORM" if matches!(data.get(8..12)?, b"AIFF" | b"AIFC") => aiff_loop(data),
        _ => None,
    }?;

    if region.is_empty() {
        return None;
    }
    Some(region)
}

/// Parses the frame count declared in the `COMM` chunk of an AIFF file.
/// Returns None for other formats.
pub fn parse_declared_frames(data: &[u8]) -> Option<usize> {
    if data.get(0..4)? != b"FORM" || !matches!(data.get(8..12)?, b"AIFF" | b"AIFC") {
        return None;
    }
    let comm = chunks(data, Endian::Big).find(|(id, _)| id == b"COMM")?.1;
    read_u32(comm, 2, Endian::Big).map(|frames| frames as usize)
}

fn wav_loop(data: &[u8]) -> Option<LoopRegion> {
    let smpl = chunks(data, Endian::Little).find(|(id, _)| id == b"smpl")?.1;

    let loop_count = read_u32(smpl, 28, Endian::Little)?;
    if loop_count == 0 {
        return None;
    }

    let record = smpl.get(SMPL_HEADER_LEN..SMPL_HEADER_LEN + SMPL_LOOP_LEN)?;
    let start = read_u32(record, 8, Endian::Little)?;
    let end = read_u32(record, 12, Endian::Little)?;
    Some(LoopRegion::new(start as usize, end as usize + 1))
}

fn aiff_loop(data: &[u8]) -> Option<LoopRegion> {
    let inst = chunks(data, Endian::Big).find(|(id, _)| id == b"INST")?.1;

    // The sustain loop starts 8 bytes into INST: play mode, begin marker, end marker.
    let play_mode = read_u16(inst, 8, Endian::Big)?;
    if play_mode == 0 {
        return None;
    }
    let begin_id = read_u16(inst, 10, Endian::Big)?;
    let end_id = read_u16(inst, 12, Endian::Big)?;

    let mark = chunks(data, Endian::Big).find(|(id, _)| id == b"MARK")?.1;
    let start = marker_position(mark, begin_id)?;
    let end = marker_position(mark, end_id)?;
    Some(LoopRegion::new(start as usize, end as usize))
}

/// Finds the position of the marker with the given id in a `MARK` chunk.
fn marker_position(mark: &[u8], wanted: u16) -> Option<u32> {
    let count = read_u16(mark, 0, Endian::Big)?;
    let mut offset = 2;
    for _ in 0..count {
        let id = read_u16(mark, offset, Endian::Big)?;
        let position = read_u32(mark, offset + 2, Endian::Big)?;
        // The name is a pascal string padded so that length byte and text are even.
        let name_len = *mark.get(offset + 6)? as usize;
        let padded = (1 + name_len + 1) & !1;

        if id == wanted {
            return Some(position);
        }
        offset += 6 + padded;
    }
    None
}

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

/// Iterates the chunks of a RIFF or IFF container as (id, body) pairs. Stops
/// at the first truncated chunk.
fn chunks<'a>(
    data: &'a [u8],
    endian: Endian,
) -> impl Iterator<Item = ([u8; 4], &'a [u8])> + 'a {
    let mut offset = 12;
    std::iter::from_fn(move || {
        let id: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        let len = read_u32(data, offset + 4, endian)? as usize;
        let body_start = offset + 8;
        let body = data.get(body_start..body_start.checked_add(len)?)?;
        // Chunks are padded to an even length.
        offset = body_start + len + (len & 1);
        Some((id, body))
    })
}

fn read_u16(data: &[u8], offset: usize, endian: Endian) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
    Some(match endian {
        Endian::Little => u16::from_le_bytes(bytes),
        Endian::Big => u16::from_be_bytes(bytes),
    })
}

fn read_u32(data: &[u8], offset: usize, endian: Endian) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(match endian {
        Endian::Little => u32::from_le_bytes(bytes),
        Endian::Big => u32::from_be_bytes(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{aiff_with_loop, wav_with_loop};

    #[test]
    fn test_wav_loop_end_is_made_exclusive() {
        let data = wav_with_loop(1000, Some((200, 799)));
        assert_eq!(parse_loop(&data), Some(LoopRegion::new(200, 800)));
    }

    #[test]
    fn test_wav_without_smpl() {
        let data = wav_with_loop(1000, None);
        assert_eq!(parse_loop(&data), None);
    }

    #[test]
    fn test_wav_with_zero_loops() {
        let mut data = wav_with_loop(1000, Some((200, 799)));
        // Rewrite the loop count in the smpl header to 0.
        let smpl = data
            .windows(4)
            .position(|window| window == b"smpl")
            .unwrap();
        data[smpl + 8 + 28..smpl + 8 + 32].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(parse_loop(&data), None);
    }

    #[test]
    fn test_aiff_sustain_loop() {
        let data = aiff_with_loop(1000, Some((250, 750)));
        assert_eq!(parse_loop(&data), Some(LoopRegion::new(250, 750)));
    }

    #[test]
    fn test_aiff_without_loop() {
        let data = aiff_with_loop(1000, None);
        assert_eq!(parse_loop(&data), None);
    }

    #[test]
    fn test_empty_aiff_loop_is_dropped() {
        let data = aiff_with_loop(1000, Some((300, 300)));
        assert_eq!(parse_loop(&data), None);
    }

    #[test]
    fn test_other_data() {
        assert_eq!(parse_loop(b""), None);
        assert_eq!(parse_loop(b"RIFF"), None);
        assert_eq!(parse_loop(b"fLaC\0\0\0\0\0\0\0\0"), None);

        // A truncated smpl chunk is ignored rather than read past the end.
        let mut data = wav_with_loop(10, Some((2, 5)));
        data.truncate(data.len() - 10);
        assert_eq!(parse_loop(&data), None);
    }

    #[test]
    fn test_aiff_declared_frames() {
        assert_eq!(parse_declared_frames(&aiff_with_loop(1000, None)), Some(1000));
        assert_eq!(parse_declared_frames(&wav_with_loop(1000, None)), None);
        assert_eq!(parse_declared_frames(b"FORM"), None);
    }

    #[test]
    fn test_read_metadata_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looped.wav");
        fs::write(&path, wav_with_loop(100, Some((10, 89)))).unwrap();
        assert_eq!(
            read_metadata(&path).unwrap(),
            EmbeddedMetadata {
                loop_region: Some(LoopRegion::new(10, 90)),
                declared_frames: None,
            }
        );

        let path = dir.path().join("looped.aiff");
        fs::write(&path, aiff_with_loop(100, Some((10, 90)))).unwrap();
        assert_eq!(
            read_metadata(&path).unwrap(),
            EmbeddedMetadata {
                loop_region: Some(LoopRegion::new(10, 90)),
                declared_frames: Some(100),
            }
        );

        let missing = read_metadata(&dir.path().join("missing.wav"));
        assert!(matches!(missing, Err(LoadError::Io(_, _))));
    }
}
