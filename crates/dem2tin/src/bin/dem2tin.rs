//! Convert a DEM raster into a single TIN mesh.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dem2tin::{asc_grid, init_logging, MethodArg};
use tin_codec::write_mesh_as_qm;
use tin_mesh::{generate_tin_dense_quadwalk, generate_tin_terra, generate_tin_zemlya, Mesh};
use tin_tiles::{MeshWriter, ObjWriter, WebMercatorEcef};

/// Convert a digital elevation model into a triangulated irregular
/// network within a given vertical error bound.
#[derive(Parser, Debug)]
#[command(name = "dem2tin")]
#[command(about = "Converts a DEM raster to a TIN mesh")]
struct Args {
  /// Input raster (Esri ASCII grid).
  #[arg(long)]
  input: PathBuf,

  /// Output mesh file; the extension selects the format (.obj or
  /// .terrain).
  #[arg(long)]
  output: PathBuf,

  /// Meshing method.
  #[arg(long, value_enum, default_value = "terra")]
  method: MethodArg,

  /// Maximum vertical error in raster units (terra/zemlya), or the
  /// sampling step (dense).
  #[arg(long, default_value_t = 1.0)]
  max_error: f64,
}

fn main() -> Result<()> {
  init_logging();
  let args = Args::parse();

  let raster = asc_grid::read_asc_file(&args.input)?;
  tracing::info!(
    "loaded raster {}: {}x{} cells",
    args.input.display(),
    raster.width(),
    raster.height()
  );

  let mut mesh: Mesh = match args.method {
    MethodArg::Terra => generate_tin_terra(raster, args.max_error)?,
    MethodArg::Zemlya => generate_tin_zemlya(raster, args.max_error)?,
    MethodArg::Dense => generate_tin_dense_quadwalk(&raster, args.max_error.max(1.0) as usize)?,
  };

  if mesh.empty() {
    bail!("meshing produced an empty mesh");
  }
  tracing::info!(
    "meshed {} vertices, {} faces",
    mesh.vertices().len(),
    mesh.faces().len()
  );

  let extension = args
    .output
    .extension()
    .and_then(|e| e.to_str())
    .unwrap_or_default();

  match extension {
    "obj" => {
      let bbox = mesh.get_bbox();
      ObjWriter
        .write_mesh_to_file(&args.output, &mut mesh, &bbox)
        .context("writing OBJ mesh")?;
    }
    "terrain" => {
      mesh.generate_triangles();
      let mut file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
      write_mesh_as_qm(&mut file, &mesh, &WebMercatorEcef)
        .context("writing quantized mesh")?;
    }
    other => bail!("unsupported output format .{other}, use .obj or .terrain"),
  }

  tracing::info!("wrote {}", args.output.display());
  Ok(())
}
