//! Convert a DEM raster into a pyramid of Web-Mercator terrain tiles.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use dem2tin::{asc_grid, init_logging, MethodArg};
use tin_tiles::{generate_tile_pyramid, MeshWriter, ObjWriter, QuantizedMeshWriter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
  Terrain,
  Obj,
}

/// Slice a DEM into `<zoom>/<tx>/<ty>` terrain tiles for 3D globe
/// viewers.
#[derive(Parser, Debug)]
#[command(name = "dem2tintiles")]
#[command(about = "Converts a DEM raster to a pyramid of TIN tiles")]
struct Args {
  /// Input raster (Esri ASCII grid) in Web-Mercator meters.
  #[arg(long)]
  input: PathBuf,

  /// Output directory for the tile pyramid.
  #[arg(long)]
  output_dir: PathBuf,

  /// Coarsest zoom level to produce.
  #[arg(long, default_value_t = 0)]
  min_zoom: i32,

  /// Finest zoom level to produce.
  #[arg(long, default_value_t = 99)]
  max_zoom: i32,

  /// Meshing method.
  #[arg(long, value_enum, default_value = "terra")]
  method: MethodArg,

  /// Maximum vertical error in meters (terra/zemlya), or the sampling
  /// step (dense).
  #[arg(long, default_value_t = 1.0)]
  max_error: f64,

  /// Tile output format.
  #[arg(long, value_enum, default_value = "terrain")]
  output_format: OutputFormat,

  /// Write .terrain tiles without gzip wrapping.
  #[arg(long)]
  no_gzip: bool,
}

fn main() -> Result<()> {
  init_logging();
  let args = Args::parse();

  let raster = asc_grid::read_asc_file(&args.input)?;
  tracing::info!(
    "loaded raster {}: {}x{} cells at {} m/px",
    args.input.display(),
    raster.width(),
    raster.height(),
    raster.cell_size()
  );

  let writer: Box<dyn MeshWriter> = match args.output_format {
    OutputFormat::Terrain => Box::new(QuantizedMeshWriter {
      gzip: !args.no_gzip,
    }),
    OutputFormat::Obj => Box::new(ObjWriter),
  };

  generate_tile_pyramid(
    raster,
    args.min_zoom,
    args.max_zoom,
    &args.output_dir,
    args.method.into(),
    args.max_error,
    writer.as_ref(),
  )
  .context("generating tile pyramid")?;

  tracing::info!("tile pyramid written to {}", args.output_dir.display());
  Ok(())
}
