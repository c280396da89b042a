// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF-Lite command line converter.
//!
//! ```text
//! dxf-lite convert <input> <output> [arc-segments] [--level <m>]
//! ```
//!
//! Writes the scene (`.json`, or `.obj` when the output ends in `.obj`)
//! and `<output-stem>_mapping.json` beside it. The mapping is written on a
//! background thread while the scene is written on the main thread.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use dxf_lite_processing::{
    mapping_path, spawn_mapping_export, write_scene, Pipeline, PipelineConfig,
};

#[derive(Parser)]
#[command(name = "dxf-lite", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one drawing document into 3D solids
    Convert {
        /// Drawing document (JSON written by the drawing reader)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Scene output (.json or .obj)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Segments per bulge arc
        #[arg(value_name = "ARC_SEGMENTS")]
        arc_segments: Option<usize>,

        /// Global elevation level, overriding the document and file name
        #[arg(long, allow_hyphen_values = true)]
        level: Option<f64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,dxf_lite_processing=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Convert {
            input,
            output,
            arc_segments,
            level,
        } => convert(input, output, arc_segments, level),
    }
}

fn convert(
    input: PathBuf,
    output: PathBuf,
    arc_segments: Option<usize>,
    level: Option<f64>,
) -> Result<()> {
    let mut config = PipelineConfig::from_env();
    if let Some(segments) = arc_segments {
        if segments == 0 {
            return Err(anyhow!("Arc segment count must be at least 1"));
        }
        config = config.with_arc_segments(segments);
    }

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        arc_segments = config.arc_segments,
        "Starting conversion"
    );

    let snapshot = Pipeline::new(config)
        .convert_file(&input, level)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    let mapping = mapping_path(&output);
    let export = spawn_mapping_export(snapshot.clone(), mapping.clone())
        .context("Failed to start mapping export")?;

    let scene_result = write_scene(&output, &snapshot.solids, &snapshot.report)
        .with_context(|| format!("Failed to write scene: {}", output.display()));

    // Join before propagating any scene error so the export never outlives main
    let export_result = export
        .join()
        .map_err(|_| anyhow!("Mapping export thread panicked"))?
        .with_context(|| format!("Failed to write mapping: {}", mapping.display()));

    scene_result?;
    let entries = export_result?;

    let report = &snapshot.report;
    tracing::info!(
        solids = snapshot.len(),
        mapping_entries = entries,
        total_volume = snapshot.total_volume(),
        global_level = snapshot.global_level,
        skipped = report.skipped.len(),
        unmatched_fixtures = report.unmatched_fixtures.len(),
        failed_booleans = report.failed_booleans,
        dropped_voids = report.dropped_voids,
        "Conversion complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "dxf-lite",
            "convert",
            "ground_+0.00.json",
            "out/ground.obj",
            "24",
            "--level",
            "-2.85",
        ])
        .unwrap();

        let Command::Convert {
            input,
            output,
            arc_segments,
            level,
        } = cli.command;
        assert_eq!(input, PathBuf::from("ground_+0.00.json"));
        assert_eq!(output, PathBuf::from("out/ground.obj"));
        assert_eq!(arc_segments, Some(24));
        assert_eq!(level, Some(-2.85));
    }

    #[test]
    fn test_arc_segments_optional() {
        let cli = Cli::try_parse_from(["dxf-lite", "convert", "in.json", "out.json"]).unwrap();
        let Command::Convert {
            arc_segments, level, ..
        } = cli.command;
        assert_eq!(arc_segments, None);
        assert_eq!(level, None);
    }
}
