//! Procedural layout of multi-room voxel structures: strongholds, mine
//! tunnels, ruined portals, and buried treasure. A structure is a graph of
//! rectangular pieces grown by weighted recursive expansion, persisted as a
//! flat record list, and painted lazily one chunk at a time through a
//! [`WorldPainter`] the consumer supplies.

pub mod builder;
pub mod catalog;
pub mod families;
pub mod geom;
pub mod graph;
pub mod painter;
pub mod piece;
pub mod template;

#[cfg(test)]
pub(crate) mod test_support;

use rand::{rngs::SmallRng, SeedableRng};
use std::mem;

pub use crate::builder::LayoutBuilder;
pub use crate::catalog::{CatalogEntry, PieceCatalog};
pub use crate::geom::{BoundingBox, Facing};
pub use crate::graph::StructureGraph;
pub use crate::painter::{BlockState, ChunkPos, Heightmap, WorldPainter};
pub use crate::piece::{PieceBase, PieceRecord, RecordError, StructurePiece};

/// Builds the non-cryptographic rng the generators use from four seed words.
pub fn small_rng(seed: [u32; 4]) -> SmallRng {
    SmallRng::from_seed(unsafe { mem::transmute(seed) })
}
