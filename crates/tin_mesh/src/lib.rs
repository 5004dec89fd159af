//! tin_mesh - greedy-refinement TIN meshing of digital elevation models.
//!
//! This crate turns a geo-referenced height raster into a triangulated
//! irregular network whose vertical error stays within a caller-supplied
//! bound. Two engines share one incremental Delaunay substrate:
//!
//! - **Terra**: one global greedy refinement pass. Every triangle is
//!   scan-converted to find its worst-approximated sample; the worst
//!   sample overall is inserted until the bound holds everywhere.
//! - **Zemlya**: the hierarchical variant. A mip-style pyramid of
//!   averages injects detail level by level, picking up large-scale
//!   structure before local noise.
//!
//! Both run single-threaded and deterministic: the point-location
//! tie-breaker is seeded with a fixed value and the candidate queue
//! breaks importance ties by scan order.
//!
//! # Example
//!
//! ```ignore
//! use tin_mesh::{RasterDouble, generate_tin_terra};
//!
//! let mut raster = RasterDouble::with_size(100, 100);
//! // fill raster ...
//! let mesh = generate_tin_terra(raster, 0.5)?;
//! println!("{} vertices, {} faces", mesh.vertices().len(), mesh.faces().len());
//! ```

pub mod clip;
pub mod delaunay;
pub mod dense;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod mesh_to_raster;
pub mod pool;
pub mod quadedge;
pub mod raster;
pub mod raster_tools;
pub mod terra;
pub mod zemlya;

pub use error::MeshError;
pub use geometry::{BBox2D, BBox3D, Face, Triangle, Vertex, VertexIndex};
pub use mesh::Mesh;
pub use raster::{GridValue, Raster, RasterDouble};

pub use dense::generate_tin_dense_quadwalk;
pub use terra::{generate_tin_terra, generate_tin_terra_with_cap, TerraMesh};
pub use zemlya::{generate_tin_zemlya, ZemlyaMesh};
