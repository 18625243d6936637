//! Collision BSP builder and JSP codec.
//!
//! Turns a decoded model (a [`Scene`]) into a compact axis-aligned BSP over
//! its strip triangles and writes it as a chunked `.jsp` file in the byte
//! order of the target platform.
//!
//! ```ignore
//! use jsp_tree::{rw, BuildConfig, Jsp, Platform};
//!
//! let scene = rw::read_clump_file("level.dff")?;
//! let (jsp, stats) = Jsp::build(&scene, &BuildConfig::default())?;
//! jsp.write_to_path("level.jsp", Platform::GameCube)?;
//! ```

mod aabb;
mod config;
mod error;
mod extract;
mod jsp;
mod triangle;

pub mod bsp;
pub mod rw;
pub mod scene;
pub mod stream;

pub use aabb::{Axis, BoundingBox};
pub use config::{
    BuildConfig, DEFAULT_MAX_LEAF_TRIANGLES, MAX_BSP_DEPTH, Platform, UnknownPlatform,
};
pub use error::{Error, Result};
pub use extract::{Extraction, extract};
pub use jsp::{
    COLLISION_CHUNK, COLLISION_MAGIC, JSP_TAG, JSP_VERSION, Jsp, LIBRARY_ID, METADATA_CHUNK,
    STRIP_VECTORS_CHUNK, SurfaceInfo, SurfaceInfoFlags,
};
pub use scene::Scene;
pub use triangle::{CollTriangle, TriangleFlags, WorkingTriangle};
