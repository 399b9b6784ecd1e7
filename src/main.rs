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
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use samplemark::audio::{self, LoadedAudio};
use samplemark::config::{self, EditorConfig};
use samplemark::convert;
use samplemark::markers::{
    create_default_markers, create_markers_with_loop, Gesture, MarkerSet, MarkerTime, MarkerTimes,
};
use samplemark::util::{filename_display, seconds_display};
use samplemark::zero_crossing::Direction;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Sample marker and zero-crossing editor."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the format, embedded loop and default markers of a sample.
    Inspect {
        /// The path to the sample.
        path: PathBuf,
        /// Treat the sample as loop-capable.
        #[arg(short, long = "loop")]
        looping: bool,
    },
    /// Finds the zero crossing nearest to a frame.
    ZeroCrossing {
        /// The path to the sample.
        path: PathBuf,
        /// The frame to search from.
        frame: i64,
        /// The direction to search in: both, forward or backward.
        #[arg(short, long, default_value = "both")]
        direction: Direction,
        /// The maximum number of frames to scan in each direction.
        #[arg(long)]
        distance: Option<usize>,
    },
    /// Moves markers and prints the resolved marker set as JSON.
    /// Moves are applied in the order in, out, loop start, loop end.
    Edit {
        /// The path to the sample.
        path: PathBuf,
        /// Treat the sample as loop-capable.
        #[arg(short, long = "loop")]
        looping: bool,
        /// The requested in-point frame.
        #[arg(long = "in")]
        in_point: Option<i64>,
        /// The requested out-point frame.
        #[arg(long = "out")]
        out_point: Option<i64>,
        /// The requested loop start frame.
        #[arg(long)]
        loop_start: Option<i64>,
        /// The requested loop end frame.
        #[arg(long)]
        loop_end: Option<i64>,
        /// Snap every move to the nearest zero crossing.
        #[arg(short, long)]
        snap: bool,
        /// The path to an editor config file.
        #[arg(short, long = "config")]
        config_path: Option<PathBuf>,
    },
    /// Prints default markers for a set of samples as a JSON array.
    Kit {
        /// The paths to the samples.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Treat the samples as loop-capable.
        #[arg(short, long = "loop")]
        looping: bool,
    },
}

/// The JSON form of a sample's markers.
#[derive(Serialize)]
struct MarkerReport {
    file: String,
    sample_rate: u32,
    frame_count: usize,
    markers: MarkerSet,
    times: MarkerTimes,
}

impl MarkerReport {
    fn new(path: &Path, loaded: &LoadedAudio, markers: MarkerSet) -> MarkerReport {
        let buffer = &loaded.buffer;
        MarkerReport {
            file: filename_display(path).to_string(),
            sample_rate: buffer.sample_rate(),
            frame_count: buffer.frame_count(),
            times: markers.times(buffer.sample_rate(), buffer.frame_count()),
            markers,
        }
    }
}

/// Creates the starting markers for a loaded sample.
fn initial_markers(loaded: &LoadedAudio, looping: bool, config: &EditorConfig) -> MarkerSet {
    if looping {
        create_markers_with_loop(
            &loaded.buffer,
            loaded.loop_region,
            config.default_loop().window(),
        )
    } else {
        create_default_markers(&loaded.buffer, false)
    }
}

fn print_time(name: &str, time: &MarkerTime) {
    println!(
        "  {:<11} {:>10}  {}  {:.2}%",
        name,
        time.frame,
        seconds_display(time.seconds),
        time.percentage
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { path, looping } => {
            let config = config::load(None)?;
            let loaded = audio::load_sample_buffer(&path)?;
            let buffer = &loaded.buffer;

            println!("{}:", filename_display(&path));
            println!("  Sample rate: {} Hz", buffer.sample_rate());
            println!("  Channels:    {}", loaded.channel_count);
            println!("  Frames:      {}", buffer.frame_count());
            println!("  Duration:    {}", seconds_display(buffer.duration_seconds()));
            match loaded.loop_region {
                Some(region) => println!("  Loop:        {}..{}", region.start, region.end),
                None => println!("  Loop:        none"),
            }

            let markers = initial_markers(&loaded, looping, &config);
            let times = markers.times(buffer.sample_rate(), buffer.frame_count());
            println!("\nMarkers:");
            print_time("In", &times.in_point);
            if let Some(loop_start) = &times.loop_start {
                print_time("Loop start", loop_start);
            }
            if let Some(loop_end) = &times.loop_end {
                print_time("Loop end", loop_end);
            }
            print_time("Out", &times.out_point);
        }
        Commands::ZeroCrossing {
            path,
            frame,
            direction,
            distance,
        } => {
            let config = config::load(None)?;
            let loaded = audio::load_sample_buffer(&path)?;
            let buffer = &loaded.buffer;

            let mut locator = config.zero_crossing().locator();
            if let Some(distance) = distance {
                locator = locator.with_max_distance(distance);
            }

            let found = locator.locate(buffer, frame, direction);
            println!(
                "Nearest zero crossing to frame {} ({:?}): frame {} at {}, amplitude {:.6}",
                frame,
                direction,
                found,
                seconds_display(convert::frame_to_seconds(found as i64, buffer.sample_rate())),
                buffer.amplitude_at(found as i64),
            );
        }
        Commands::Edit {
            path,
            looping,
            in_point,
            out_point,
            loop_start,
            loop_end,
            snap,
            config_path,
        } => {
            let config = config::load(config_path.as_deref())?;
            let loaded = audio::load_sample_buffer(&path)?;

            let mut resolver = config.resolver();
            if snap {
                resolver.set_snap_to_zero(true);
            }

            let buffer = &loaded.buffer;
            let mut markers = initial_markers(&loaded, looping, &config);
            if let Some(frame) = in_point {
                markers = resolver.move_in_point(&markers, buffer, frame, Gesture::Click);
            }
            if let Some(frame) = out_point {
                markers = resolver.move_out_point(&markers, buffer, frame, Gesture::Click);
            }
            if let Some(frame) = loop_start {
                markers = resolver.move_loop_start(&markers, buffer, frame, Gesture::Click);
            }
            if let Some(frame) = loop_end {
                markers = resolver.move_loop_end(&markers, buffer, frame, Gesture::Click);
            }
            info!(markers = %markers, "Resolved markers");

            let report = MarkerReport::new(&path, &loaded, markers);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Kit { paths, looping } => {
            let config = config::load(None)?;

            let reports = paths
                .par_iter()
                .map(|path| -> Result<MarkerReport, audio::LoadError> {
                    let loaded = audio::load_sample_buffer(path)?;
                    let markers = initial_markers(&loaded, looping, &config);
                    Ok(MarkerReport::new(path, &loaded, markers))
                })
                .collect::<Result<Vec<_>, _>>()?;

            info!(samples = reports.len(), "Computed kit markers");
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}
