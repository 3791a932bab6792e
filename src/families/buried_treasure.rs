//! The buried treasure family: one chest under the ocean floor. The layout
//! phase cannot see terrain, so the piece's box is a full-height column at
//! the target block and the painting phase probes the heightmap.

use crate::builder::LayoutBuilder;
use crate::geom::{BoundingBox, Facing};
use crate::graph::StructureGraph;
use crate::painter::{BlockState, ChunkPos, Heightmap, WorldPainter, WORLD_MAX_Y, WORLD_MIN_Y};
use crate::piece::{PieceBase, PieceRecord, RecordError, StructurePiece};

use glam::IVec3;
use rand::Rng;

const TREASURE_LOOT: &str = "chests/buried_treasure";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuriedTreasureKind {
    Chest,
}

/// Lays out a treasure at block `(x, z)`. Always a single piece.
pub fn build(x: i32, z: i32) -> StructureGraph<BuriedTreasurePiece> {
    let bb = BoundingBox::new(
        IVec3::new(x, WORLD_MIN_Y, z),
        IVec3::new(x, WORLD_MAX_Y, z),
    );
    log::debug!("buried treasure column at ({}, {})", x, z);
    StructureGraph::new(BuriedTreasurePiece::Chest(Chest {
        base: PieceBase::new(bb, None, 0),
        has_placed_chest: false,
    }))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chest {
    pub base: PieceBase,
    /// Set once the chest exists; repeated paints of the chunk are no-ops.
    pub has_placed_chest: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BuriedTreasurePiece {
    Chest(Chest),
}

const TAG_CHEST: &str = "BuriedTreasure";

impl StructurePiece for BuriedTreasurePiece {
    type Kind = BuriedTreasureKind;

    const CHAIN_CAP: u32 = 0;
    const RANGE_CAP: i32 = 0;
    const FLOOR_Y: i32 = WORLD_MIN_Y;
    const FORBID_REPEAT: bool = false;

    fn base(&self) -> &PieceBase {
        let BuriedTreasurePiece::Chest(p) = self;
        &p.base
    }

    fn kind(&self) -> BuriedTreasureKind {
        BuriedTreasureKind::Chest
    }

    fn candidate<R: Rng>(
        _kind: BuriedTreasureKind,
        _existing: &[Self],
        _rng: &mut R,
        _anchor: IVec3,
        _facing: Facing,
        _chain_length: u32,
    ) -> Option<Self> {
        None
    }

    fn fallback<R: Rng>(
        _existing: &[Self],
        _rng: &mut R,
        _anchor: IVec3,
        _facing: Facing,
        _chain_length: u32,
    ) -> Option<Self> {
        None
    }

    fn fill_openings<R: Rng>(
        &self,
        _graph: &mut StructureGraph<Self>,
        _builder: &mut LayoutBuilder<Self>,
        _rng: &mut R,
    ) {
    }

    fn generate<W: WorldPainter, R: Rng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        clip: &BoundingBox,
        _chunk: ChunkPos,
    ) -> bool {
        let BuriedTreasurePiece::Chest(p) = self;
        let (x, z) = (p.base.bounding_box.min.x, p.base.bounding_box.min.z);
        // One block under the ocean floor, probed now rather than at layout.
        let y = world.top_surface_y(x, z, Heightmap::OceanFloor) - 1;
        let pos = IVec3::new(x, y, z);
        if !clip.contains(pos) {
            return false;
        }
        if !p.has_placed_chest {
            world.place_loot_container(pos, TREASURE_LOOT, rng.gen());
            p.has_placed_chest = true;
        }
        // Keep the chest covered even if the column above eroded.
        if world.block_at(pos + IVec3::new(0, 1, 0)).is_liquid() {
            world.set_block(pos + IVec3::new(0, 1, 0), BlockState::Sand, 2);
        }
        true
    }

    fn to_record(&self) -> PieceRecord {
        let BuriedTreasurePiece::Chest(p) = self;
        PieceRecord::new(TAG_CHEST, &p.base).with_flag("Chest", p.has_placed_chest)
    }

    fn from_record(record: &PieceRecord) -> Result<Self, RecordError> {
        if record.id != TAG_CHEST {
            return Err(RecordError::UnknownKind(record.id.clone()));
        }
        Ok(BuriedTreasurePiece::Chest(Chest {
            base: record.base()?,
            has_placed_chest: record.flag("Chest"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::small_rng;
    use crate::test_support::MemoryPainter;

    #[test]
    fn test_layout_is_one_full_height_column() {
        let graph = build(100, -40);
        assert_eq!(graph.len(), 1);
        let bb = graph.root().base().bounding_box;
        assert_eq!((bb.min.x, bb.max.x), (100, 100));
        assert_eq!((bb.min.z, bb.max.z), (-40, -40));
        assert_eq!(bb.min.y, WORLD_MIN_Y);
        assert_eq!(bb.max.y, WORLD_MAX_Y);
    }

    #[test]
    fn test_chest_is_placed_once_across_repeated_paints() {
        let mut graph = build(9, 9);
        let mut world = MemoryPainter::new();
        world.surface_y = 40;
        let mut rng = small_rng([3; 4]);
        let chunk = ChunkPos::containing(IVec3::new(9, 0, 9));

        assert_eq!(graph.paint_chunk(&mut world, &mut rng, chunk), 1);
        assert_eq!(graph.paint_chunk(&mut world, &mut rng, chunk), 1);
        assert_eq!(world.loot.len(), 1);
        let (pos, table, _) = &world.loot[0];
        assert_eq!(*pos, IVec3::new(9, 39, 9));
        assert_eq!(table, TREASURE_LOOT);

        // The guard survives a save/load cycle.
        let mut reloaded =
            StructureGraph::<BuriedTreasurePiece>::decode(&graph.encode()).unwrap();
        assert_eq!(reloaded.paint_chunk(&mut world, &mut rng, chunk), 1);
        assert_eq!(world.loot.len(), 1);
    }

    #[test]
    fn test_submerged_chest_gets_a_sand_cap() {
        let mut graph = build(0, 0);
        let mut world = MemoryPainter::new();
        world.surface_y = 30;
        world.flood(&BoundingBox::from_corners(
            IVec3::new(0, 30, 0),
            IVec3::new(0, 62, 0),
        ));
        let mut rng = small_rng([5; 4]);

        graph.paint_chunk(&mut world, &mut rng, ChunkPos::new(0, 0));
        assert_eq!(world.block_at(IVec3::new(0, 30, 0)), BlockState::Sand);
    }
}
