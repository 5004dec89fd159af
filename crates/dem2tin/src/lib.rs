//! Shared plumbing for the dem2tin command line tools: the ASCII-grid
//! raster loader and logging bootstrap.

pub mod asc_grid;

use clap::ValueEnum;
use tin_tiles::MeshingMethod;

/// Meshing method selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
  Terra,
  Zemlya,
  Dense,
}

impl From<MethodArg> for MeshingMethod {
  fn from(arg: MethodArg) -> Self {
    match arg {
      MethodArg::Terra => MeshingMethod::Terra,
      MethodArg::Zemlya => MeshingMethod::Zemlya,
      MethodArg::Dense => MeshingMethod::Dense,
    }
  }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_logging() {
  use tracing_subscriber::EnvFilter;

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();
}
