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

/// Error types for loading audio files into sample buffers.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unable to read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Unsupported audio file {0}: {1}")]
    Unsupported(String, symphonia::core::errors::Error),

    #[error("No audio track found in {0}")]
    NoAudioTrack(String),

    #[error("Sample rate not specified in {0}")]
    MissingSampleRate(String),

    #[error("Audio file error: {0}")]
    Audio(#[from] symphonia::core::errors::Error),
}
