//! The mine tunnel family: a dirt hub room with timbered corridors snaking
//! out of it, crossings, and stair drops. Shallow recursion, wide sprawl, and
//! a liquid precheck before any block is placed.

use crate::builder::LayoutBuilder;
use crate::catalog::PieceCatalog;
use crate::geom::{BoundingBox, Facing};
use crate::graph::StructureGraph;
use crate::painter::{BlockState, ChunkPos, WorldPainter};
use crate::piece::{PieceBase, PieceRecord, RecordError, StructurePiece};

use glam::IVec3;
use rand::Rng;

pub const CHAIN_CAP: u32 = 8;
pub const RANGE_CAP: i32 = 80;
pub const FLOOR_Y: i32 = 1;

const CORRIDOR_LOOT: &str = "chests/abandoned_mineshaft";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MineshaftKind {
    Room,
    Corridor,
    Crossing,
    Stairs,
}

pub fn catalog() -> PieceCatalog<MineshaftKind> {
    PieceCatalog::new(&[
        (MineshaftKind::Corridor, 70, 0),
        (MineshaftKind::Crossing, 15, 0),
        (MineshaftKind::Stairs, 15, 0),
    ])
}

/// Grows a mineshaft from a hub room at `(x, y, z)`.
pub fn build<R: Rng>(rng: &mut R, x: i32, y: i32, z: i32) -> StructureGraph<MineshaftPiece> {
    let root = Room::root(rng, IVec3::new(x, y, z));
    log::debug!("growing mineshaft at ({}, {}, {})", x, y, z);
    let mut graph = StructureGraph::new(root.clone());
    let mut builder = LayoutBuilder::new(catalog());
    root.fill_openings(&mut graph, &mut builder, rng);
    log::debug!("mineshaft grew to {} pieces", graph.len());
    graph
}

fn fits(existing: &[MineshaftPiece], bb: &BoundingBox) -> bool {
    bb.min.y > MineshaftPiece::FLOOR_Y && crate::piece::collision(existing, bb).is_none()
}

type Graph = StructureGraph<MineshaftPiece>;
type Builder = LayoutBuilder<MineshaftPiece>;

fn grow<R: Rng>(
    kind: MineshaftKind,
    base: &PieceBase,
    graph: &mut Graph,
    builder: &mut Builder,
    rng: &mut R,
    anchor: IVec3,
    facing: Facing,
) {
    builder.grow_from(graph, rng, anchor, facing, base.chain_length + 1, Some(kind));
}

/// The start: an irregular dirt cavern the corridors tunnel out of.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub base: PieceBase,
}

impl Room {
    fn root<R: Rng>(rng: &mut R, origin: IVec3) -> MineshaftPiece {
        let width = 7 + rng.gen_range(0, 6);
        let depth = 7 + rng.gen_range(0, 6);
        let bb = BoundingBox::new(
            origin,
            origin + IVec3::new(width - 1, 4, depth - 1),
        );
        MineshaftPiece::Room(Room {
            base: PieceBase::new(bb, None, 0),
        })
    }

    fn open_sides<R: Rng>(&self, graph: &mut Graph, builder: &mut Builder, rng: &mut R) {
        let bb = self.base.bounding_box;
        let kind = MineshaftKind::Room;
        // One possible exit per wall, at a random spot along it.
        if rng.gen_range(0, 2) == 0 {
            let ax = rng.gen_range(bb.min.x + 1, bb.max.x);
            let anchor = IVec3::new(ax, bb.min.y + 1, bb.min.z - 1);
            grow(kind, &self.base, graph, builder, rng, anchor, Facing::North);
        }
        if rng.gen_range(0, 2) == 0 {
            let ax = rng.gen_range(bb.min.x + 1, bb.max.x);
            let anchor = IVec3::new(ax, bb.min.y + 1, bb.max.z + 1);
            grow(kind, &self.base, graph, builder, rng, anchor, Facing::South);
        }
        if rng.gen_range(0, 2) == 0 {
            let az = rng.gen_range(bb.min.z + 1, bb.max.z);
            let anchor = IVec3::new(bb.min.x - 1, bb.min.y + 1, az);
            grow(kind, &self.base, graph, builder, rng, anchor, Facing::West);
        }
        if rng.gen_range(0, 2) == 0 {
            let az = rng.gen_range(bb.min.z + 1, bb.max.z);
            let anchor = IVec3::new(bb.max.x + 1, bb.min.y + 1, az);
            grow(kind, &self.base, graph, builder, rng, anchor, Facing::East);
        }
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, _rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        let size = b.bounding_box.size();
        b.fill_shell(
            world,
            clip,
            (0, 0, 0),
            (size.x - 1, size.y - 1, size.z - 1),
            BlockState::Dirt,
            BlockState::Air,
        );
        b.fill(
            world,
            clip,
            (1, 0, 1),
            (size.x - 2, 0, size.z - 2),
            BlockState::Gravel,
        );
    }
}

/// A timbered 3x3 tunnel of 1..=4 five-block sections. The section count
/// itself shrinks until the tunnel clears its neighbors.
#[derive(Clone, Debug, PartialEq)]
pub struct Corridor {
    pub base: PieceBase,
    pub sections: u32,
    pub has_rails: bool,
    pub has_cobwebs: bool,
    /// Painting bookkeeping, persisted so reloaded graphs stay idempotent.
    pub has_placed_chest: bool,
}

impl Corridor {
    fn candidate<R: Rng>(
        existing: &[MineshaftPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<MineshaftPiece> {
        let target = rng.gen_range(2, 5);
        let mut found = None;
        for sections in (1..=target).rev() {
            let bb = BoundingBox::oriented(
                anchor,
                IVec3::new(-1, 0, 0),
                IVec3::new(3, 3, sections * 5),
                facing,
            );
            if fits(existing, &bb) {
                found = Some((bb, sections as u32));
                break;
            }
        }
        let (bb, sections) = found?;
        let has_rails = rng.gen_range(0, 3) == 0;
        let has_cobwebs = !has_rails && rng.gen_range(0, 23) == 0;
        Some(MineshaftPiece::Corridor(Corridor {
            base: PieceBase::new(bb, Some(facing), chain_length),
            sections,
            has_rails,
            has_cobwebs,
            has_placed_chest: false,
        }))
    }

    fn open_ends<R: Rng>(&self, graph: &mut Graph, builder: &mut Builder, rng: &mut R) {
        let bb = self.base.bounding_box;
        let facing = match self.base.facing {
            Some(f) => f,
            None => return,
        };
        let kind = MineshaftKind::Corridor;

        // Continue out the far end.
        let forward = match facing {
            Facing::North => IVec3::new(bb.min.x + 1, bb.min.y, bb.min.z - 1),
            Facing::South => IVec3::new(bb.min.x + 1, bb.min.y, bb.max.z + 1),
            Facing::West => IVec3::new(bb.min.x - 1, bb.min.y, bb.min.z + 1),
            Facing::East => IVec3::new(bb.max.x + 1, bb.min.y, bb.min.z + 1),
        };
        grow(kind, &self.base, graph, builder, rng, forward, facing);

        // Occasionally branch sideways out of one section.
        let branch = rng.gen_range(0, 4);
        if branch > 1 {
            return;
        }
        let depth = rng.gen_range(0, self.sections as i32) * 5 + 2;
        let (anchor, out) = match (facing, branch == 0) {
            (Facing::North, true) | (Facing::South, true) => (
                IVec3::new(bb.min.x - 1, bb.min.y, bb.min.z + depth),
                Facing::West,
            ),
            (Facing::North, false) | (Facing::South, false) => (
                IVec3::new(bb.max.x + 1, bb.min.y, bb.min.z + depth),
                Facing::East,
            ),
            (Facing::West, true) | (Facing::East, true) => (
                IVec3::new(bb.min.x + depth, bb.min.y, bb.min.z - 1),
                Facing::North,
            ),
            (Facing::West, false) | (Facing::East, false) => (
                IVec3::new(bb.min.x + depth, bb.min.y, bb.max.z + 1),
                Facing::South,
            ),
        };
        grow(kind, &self.base, graph, builder, rng, anchor, out);
    }

    fn paint<W: WorldPainter, R: Rng>(&mut self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = self.base;
        let far = self.sections as i32 * 5 - 1;
        b.fill(world, clip, (0, 0, 0), (2, 2, far), BlockState::Air);

        for section in 0..self.sections as i32 {
            let lz = section * 5 + 2;
            // Timber frame: two fence posts and a plank lintel.
            b.place(world, clip, 0, 0, lz, BlockState::Fence);
            b.place(world, clip, 0, 1, lz, BlockState::Fence);
            b.place(world, clip, 2, 0, lz, BlockState::Fence);
            b.place(world, clip, 2, 1, lz, BlockState::Fence);
            b.fill(world, clip, (0, 2, lz), (2, 2, lz), BlockState::Planks);
            if rng.gen_range(0, 4) == 0 {
                b.place(world, clip, 1, 2, lz, BlockState::Torch);
            }
            if self.has_cobwebs {
                if rng.gen_range(0, 3) == 0 {
                    b.place(world, clip, 0, 2, lz - 1, BlockState::Cobweb);
                }
                if rng.gen_range(0, 3) == 0 {
                    b.place(world, clip, 2, 2, lz + 1, BlockState::Cobweb);
                }
            }
        }
        if self.has_rails {
            for lz in 0..=far {
                if rng.gen_range(0, 3) != 0 {
                    b.place(world, clip, 1, 0, lz, BlockState::Rail);
                }
            }
        }
        // A rare supply chest tucked against a post.
        if self.has_cobwebs && !self.has_placed_chest {
            let chest_pos = b.world_pos(2, 0, 1);
            if clip.contains(chest_pos) {
                self.has_placed_chest = true;
                world.place_loot_container(chest_pos, CORRIDOR_LOOT, rng.gen());
            }
        }
    }
}

/// A 5x5 junction, sometimes two stories tall.
#[derive(Clone, Debug, PartialEq)]
pub struct Crossing {
    pub base: PieceBase,
    pub two_floors: bool,
}

impl Crossing {
    fn candidate<R: Rng>(
        existing: &[MineshaftPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<MineshaftPiece> {
        let two_floors = rng.gen_range(0, 4) == 0;
        let height = if two_floors { 9 } else { 5 };
        let bb = BoundingBox::oriented(
            anchor,
            IVec3::new(-2, 0, 0),
            IVec3::new(5, height, 5),
            facing,
        );
        if !fits(existing, &bb) {
            return None;
        }
        Some(MineshaftPiece::Crossing(Crossing {
            base: PieceBase::new(bb, Some(facing), chain_length),
            two_floors,
        }))
    }

    fn open_arms<R: Rng>(&self, graph: &mut Graph, builder: &mut Builder, rng: &mut R) {
        let bb = self.base.bounding_box;
        let facing = match self.base.facing {
            Some(f) => f,
            None => return,
        };
        let kind = MineshaftKind::Crossing;

        let forward = match facing {
            Facing::North => IVec3::new(bb.min.x + 2, bb.min.y, bb.min.z - 1),
            Facing::South => IVec3::new(bb.min.x + 2, bb.min.y, bb.max.z + 1),
            Facing::West => IVec3::new(bb.min.x - 1, bb.min.y, bb.min.z + 2),
            Facing::East => IVec3::new(bb.max.x + 1, bb.min.y, bb.min.z + 2),
        };
        grow(kind, &self.base, graph, builder, rng, forward, facing);

        let (left, left_out, right, right_out) = match facing {
            Facing::North | Facing::South => (
                IVec3::new(bb.min.x - 1, bb.min.y, bb.min.z + 2),
                Facing::West,
                IVec3::new(bb.max.x + 1, bb.min.y, bb.min.z + 2),
                Facing::East,
            ),
            Facing::West | Facing::East => (
                IVec3::new(bb.min.x + 2, bb.min.y, bb.min.z - 1),
                Facing::North,
                IVec3::new(bb.min.x + 2, bb.min.y, bb.max.z + 1),
                Facing::South,
            ),
        };
        grow(kind, &self.base, graph, builder, rng, left, left_out);
        grow(kind, &self.base, graph, builder, rng, right, right_out);

        if self.two_floors {
            let upper = forward + IVec3::new(0, 5, 0);
            grow(kind, &self.base, graph, builder, rng, upper, facing);
        }
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, _rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        let top = b.bounding_box.size().y - 1;
        b.fill(world, clip, (0, 0, 0), (4, top, 4), BlockState::Air);
        // Plank pillars at the four corners carry the roof.
        for &(lx, lz) in &[(0, 0), (0, 4), (4, 0), (4, 4)] {
            b.fill(world, clip, (lx, 0, lz), (lx, top - 1, lz), BlockState::Planks);
        }
        if self.two_floors {
            // Landing between the stories, open in the middle.
            b.fill(world, clip, (0, 4, 0), (4, 4, 4), BlockState::Planks);
            b.fill(world, clip, (1, 4, 1), (3, 4, 3), BlockState::Air);
        }
    }
}

/// An 8-deep stair drop of five blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Stairs {
    pub base: PieceBase,
}

impl Stairs {
    fn candidate(
        existing: &[MineshaftPiece],
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<MineshaftPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -5, 0), IVec3::new(3, 8, 8), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(MineshaftPiece::Stairs(Stairs {
            base: PieceBase::new(bb, Some(facing), chain_length),
        }))
    }

    fn open_bottom<R: Rng>(&self, graph: &mut Graph, builder: &mut Builder, rng: &mut R) {
        let bb = self.base.bounding_box;
        let facing = match self.base.facing {
            Some(f) => f,
            None => return,
        };
        let anchor = match facing {
            Facing::North => IVec3::new(bb.min.x + 1, bb.min.y, bb.min.z - 1),
            Facing::South => IVec3::new(bb.min.x + 1, bb.min.y, bb.max.z + 1),
            Facing::West => IVec3::new(bb.min.x - 1, bb.min.y, bb.min.z + 1),
            Facing::East => IVec3::new(bb.max.x + 1, bb.min.y, bb.min.z + 1),
        };
        grow(MineshaftKind::Stairs, &self.base, graph, builder, rng, anchor, facing);
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, _rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill(world, clip, (0, 5, 0), (2, 7, 1), BlockState::Air);
        // One step down per two blocks of depth.
        for i in 0..5 {
            let lz = i + 2;
            let ly = 4 - i;
            b.fill(world, clip, (0, ly, lz), (2, ly + 2, lz), BlockState::Air);
            b.fill(world, clip, (0, ly - 1, lz), (2, ly - 1, lz), BlockState::Cobblestone);
        }
        b.fill(world, clip, (0, 0, 7), (2, 2, 7), BlockState::Air);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MineshaftPiece {
    Room(Room),
    Corridor(Corridor),
    Crossing(Crossing),
    Stairs(Stairs),
}

const TAG_ROOM: &str = "MsRoom";
const TAG_CORRIDOR: &str = "MsCorridor";
const TAG_CROSSING: &str = "MsCrossing";
const TAG_STAIRS: &str = "MsStairs";

impl StructurePiece for MineshaftPiece {
    type Kind = MineshaftKind;

    const CHAIN_CAP: u32 = CHAIN_CAP;
    const RANGE_CAP: i32 = RANGE_CAP;
    const FLOOR_Y: i32 = FLOOR_Y;
    // Corridors legitimately chain into corridors.
    const FORBID_REPEAT: bool = false;

    fn base(&self) -> &PieceBase {
        match self {
            MineshaftPiece::Room(p) => &p.base,
            MineshaftPiece::Corridor(p) => &p.base,
            MineshaftPiece::Crossing(p) => &p.base,
            MineshaftPiece::Stairs(p) => &p.base,
        }
    }

    fn kind(&self) -> MineshaftKind {
        match self {
            MineshaftPiece::Room(_) => MineshaftKind::Room,
            MineshaftPiece::Corridor(_) => MineshaftKind::Corridor,
            MineshaftPiece::Crossing(_) => MineshaftKind::Crossing,
            MineshaftPiece::Stairs(_) => MineshaftKind::Stairs,
        }
    }

    fn candidate<R: Rng>(
        kind: MineshaftKind,
        existing: &[Self],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self> {
        match kind {
            MineshaftKind::Corridor => {
                Corridor::candidate(existing, rng, anchor, facing, chain_length)
            }
            MineshaftKind::Crossing => {
                Crossing::candidate(existing, rng, anchor, facing, chain_length)
            }
            MineshaftKind::Stairs => Stairs::candidate(existing, anchor, facing, chain_length),
            // The hub room exists only as the root.
            MineshaftKind::Room => None,
        }
    }

    /// The corridor candidate already shrinks itself, so the fallback is a
    /// one-section corridor squeezed against the blockage.
    fn fallback<R: Rng>(
        existing: &[Self],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, 0, 0), IVec3::new(3, 3, 5), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(MineshaftPiece::Corridor(Corridor {
            base: PieceBase::new(bb, Some(facing), chain_length),
            sections: 1,
            has_rails: false,
            has_cobwebs: rng.gen_range(0, 23) == 0,
            has_placed_chest: false,
        }))
    }

    fn fill_openings<R: Rng>(
        &self,
        graph: &mut StructureGraph<Self>,
        builder: &mut LayoutBuilder<Self>,
        rng: &mut R,
    ) {
        match self {
            MineshaftPiece::Room(p) => p.open_sides(graph, builder, rng),
            MineshaftPiece::Corridor(p) => p.open_ends(graph, builder, rng),
            MineshaftPiece::Crossing(p) => p.open_arms(graph, builder, rng),
            MineshaftPiece::Stairs(p) => p.open_bottom(graph, builder, rng),
        }
    }

    fn generate<W: WorldPainter, R: Rng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        clip: &BoundingBox,
        _chunk: ChunkPos,
    ) -> bool {
        // Mine tunnels never breach water or lava; skip the whole invocation
        // if any clip-shell block is liquid.
        if self.base().touches_liquid(world, clip) {
            return false;
        }
        match self {
            MineshaftPiece::Room(p) => p.paint(world, rng, clip),
            MineshaftPiece::Corridor(p) => p.paint(world, rng, clip),
            MineshaftPiece::Crossing(p) => p.paint(world, rng, clip),
            MineshaftPiece::Stairs(p) => p.paint(world, rng, clip),
        }
        true
    }

    fn to_record(&self) -> PieceRecord {
        match self {
            MineshaftPiece::Room(p) => PieceRecord::new(TAG_ROOM, &p.base),
            MineshaftPiece::Corridor(p) => PieceRecord::new(TAG_CORRIDOR, &p.base)
                .with("Num", i64::from(p.sections))
                .with_flag("Rails", p.has_rails)
                .with_flag("Webs", p.has_cobwebs)
                .with_flag("Chest", p.has_placed_chest),
            MineshaftPiece::Crossing(p) => {
                PieceRecord::new(TAG_CROSSING, &p.base).with_flag("TwoFloors", p.two_floors)
            }
            MineshaftPiece::Stairs(p) => PieceRecord::new(TAG_STAIRS, &p.base),
        }
    }

    fn from_record(record: &PieceRecord) -> Result<Self, RecordError> {
        let base = record.base()?;
        match record.id.as_str() {
            TAG_ROOM => Ok(MineshaftPiece::Room(Room { base })),
            TAG_CORRIDOR => Ok(MineshaftPiece::Corridor(Corridor {
                base,
                sections: record.field("Num")? as u32,
                has_rails: record.flag("Rails"),
                has_cobwebs: record.flag("Webs"),
                has_placed_chest: record.flag("Chest"),
            })),
            TAG_CROSSING => Ok(MineshaftPiece::Crossing(Crossing {
                base,
                two_floors: record.flag("TwoFloors"),
            })),
            TAG_STAIRS => Ok(MineshaftPiece::Stairs(Stairs { base })),
            other => Err(RecordError::UnknownKind(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::small_rng;
    use crate::test_support::MemoryPainter;

    fn built() -> StructureGraph<MineshaftPiece> {
        let mut rng = small_rng([21, 42, 63, 84]);
        // A seed whose hub opens at least one side.
        for bump in 0..16 {
            let mut rng_try = small_rng([21, 42, 63, 84 + bump]);
            let graph = build(&mut rng_try, 40, 30, -40);
            if graph.len() > 1 {
                return graph;
            }
        }
        build(&mut rng, 40, 30, -40)
    }

    #[test]
    fn test_chain_cap_bounds_recursion() {
        let graph = built();
        for piece in graph.pieces() {
            assert!(piece.base().chain_length <= CHAIN_CAP);
        }
    }

    #[test]
    fn test_no_two_pieces_overlap() {
        let graph = built();
        let pieces = graph.pieces();
        for i in 0..pieces.len() {
            for j in i + 1..pieces.len() {
                assert!(!pieces[i]
                    .base()
                    .bounding_box
                    .intersects(&pieces[j].base().bounding_box));
            }
        }
    }

    #[test]
    fn test_pieces_stay_inside_the_range_cap() {
        let graph = built();
        let root_min = graph.root().base().bounding_box.min;
        for piece in graph.pieces() {
            let bb = piece.base().bounding_box;
            assert!(crate::geom::chebyshev_xz(bb.min, root_min) <= RANGE_CAP + 20);
        }
    }

    #[test]
    fn test_corridor_shrinks_its_section_count_to_fit() {
        // A wall 11 blocks ahead leaves room for two sections at most.
        let wall = MineshaftPiece::Room(Room {
            base: PieceBase::new(
                BoundingBox::from_corners(IVec3::new(-30, 2, 11), IVec3::new(30, 60, 40)),
                None,
                0,
            ),
        });
        let existing = vec![wall];
        let mut rng = small_rng([4; 4]);

        for _ in 0..32 {
            if let Some(MineshaftPiece::Corridor(c)) =
                Corridor::candidate(&existing, &mut rng, IVec3::new(0, 30, 0), Facing::South, 1)
            {
                assert!(c.sections <= 2);
                assert!(c.base.bounding_box.max.z <= 10);
            }
        }
    }

    #[test]
    fn test_liquid_adjacency_aborts_painting() {
        let facing = Facing::South;
        let bb = BoundingBox::oriented(
            IVec3::new(4, 30, 2),
            IVec3::new(-1, 0, 0),
            IVec3::new(3, 3, 5),
            facing,
        );
        let piece = MineshaftPiece::Corridor(Corridor {
            base: PieceBase::new(bb, Some(facing), 1),
            sections: 1,
            has_rails: true,
            has_cobwebs: false,
            has_placed_chest: false,
        });
        let mut graph = StructureGraph::new(piece);
        let mut rng = small_rng([8; 4]);

        let mut wet = MemoryPainter::new();
        wet.flood(&bb);
        assert_eq!(graph.paint_chunk(&mut wet, &mut rng, ChunkPos::new(0, 0)), 0);
        assert!(wet.blocks.is_empty(), "aborted paint must write nothing");

        // The same piece paints fine into a dry world; the abort never
        // removed it from the graph.
        let mut dry = MemoryPainter::new();
        assert_eq!(graph.paint_chunk(&mut dry, &mut rng, ChunkPos::new(0, 0)), 1);
        assert!(!dry.blocks.is_empty());
    }

    #[test]
    fn test_corridor_chest_is_placed_once_even_across_reload() {
        let facing = Facing::South;
        let bb = BoundingBox::oriented(
            IVec3::new(4, 30, 2),
            IVec3::new(-1, 0, 0),
            IVec3::new(3, 3, 5),
            facing,
        );
        let piece = MineshaftPiece::Corridor(Corridor {
            base: PieceBase::new(bb, Some(facing), 1),
            sections: 1,
            has_rails: false,
            has_cobwebs: true,
            has_placed_chest: false,
        });
        let mut graph = StructureGraph::new(piece);
        let chunk = ChunkPos::new(0, 0);

        let mut world = MemoryPainter::new();
        let mut rng = small_rng([6; 4]);
        graph.paint_chunk(&mut world, &mut rng, chunk);
        graph.paint_chunk(&mut world, &mut rng, chunk);
        assert_eq!(world.loot.len(), 1);

        // The flag persists, so a reloaded graph does not re-place the chest.
        let records = graph.encode();
        let mut graph = StructureGraph::<MineshaftPiece>::decode(&records).unwrap();
        let mut fresh_world = MemoryPainter::new();
        graph.paint_chunk(&mut fresh_world, &mut rng, chunk);
        assert!(fresh_world.loot.is_empty());
    }

    #[test]
    fn test_record_round_trip() {
        let graph = built();
        let back =
            StructureGraph::<MineshaftPiece>::decode(&graph.encode()).unwrap();
        assert_eq!(graph.pieces(), back.pieces());
    }
}
