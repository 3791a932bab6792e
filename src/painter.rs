//! The world-mutation boundary. The layout core never touches chunk storage
//! directly; pieces paint themselves through [`WorldPainter`], one chunk at a
//! time, whenever the surrounding generator realizes that chunk.

use crate::geom::BoundingBox;
use glam::IVec3;

pub const CHUNK_BLOCKS: i32 = 16;
pub const WORLD_MIN_Y: i32 = 0;
pub const WORLD_MAX_Y: i32 = 255;

/// The closed set of block states the structure families place. Consumers map
/// these onto their own palette.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BlockState {
    Air,
    StoneBrick,
    CrackedStoneBrick,
    MossyStoneBrick,
    StoneSlab,
    SmoothStone,
    Cobblestone,
    Planks,
    Fence,
    Torch,
    IronBars,
    WoodDoor,
    IronDoor,
    Bookshelf,
    Cobweb,
    Rail,
    Gravel,
    Dirt,
    Sand,
    Netherrack,
    EndPortalFrame,
    Water,
    Lava,
}

impl BlockState {
    pub fn is_liquid(self) -> bool {
        matches!(self, BlockState::Water | BlockState::Lava)
    }
}

/// Which surface a heightmap probe should report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Heightmap {
    WorldSurface,
    OceanFloor,
}

/// A 16x16 column of the world, addressed in chunk coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkPos { x, z }
    }

    pub fn containing(pos: IVec3) -> Self {
        ChunkPos {
            x: pos.x.div_euclid(CHUNK_BLOCKS),
            z: pos.z.div_euclid(CHUNK_BLOCKS),
        }
    }

    /// The full-height block box this chunk covers; pieces clip their painting
    /// against it.
    pub fn block_box(&self) -> BoundingBox {
        BoundingBox::new(
            IVec3::new(self.x * CHUNK_BLOCKS, WORLD_MIN_Y, self.z * CHUNK_BLOCKS),
            IVec3::new(
                self.x * CHUNK_BLOCKS + CHUNK_BLOCKS - 1,
                WORLD_MAX_Y,
                self.z * CHUNK_BLOCKS + CHUNK_BLOCKS - 1,
            ),
        )
    }
}

/// Implement this to let the structure generators write into your world.
///
/// Chunk storage, lighting, and block-update propagation are the implementor's
/// problem; `flags` is forwarded opaquely to `set_block` the way the consumer's
/// world update API expects.
pub trait WorldPainter {
    fn set_block(&mut self, pos: IVec3, state: BlockState, flags: u32);

    fn block_at(&self, pos: IVec3) -> BlockState;

    /// Top surface height of the column at `(x, z)` for the given heightmap.
    fn top_surface_y(&self, x: i32, z: i32, heightmap: Heightmap) -> i32;

    /// Places a loot container whose contents are resolved later from
    /// `loot_table` and `seed`.
    fn place_loot_container(&mut self, pos: IVec3, loot_table: &str, seed: i64);

    fn place_spawner(&mut self, pos: IVec3, mob: &str);
}
