//! The underground stronghold family: corridors, stairwells, crossings, a
//! library, a prison hall, and a unique portal room, grown as a deep weighted
//! maze under the start stairwell.

use crate::builder::LayoutBuilder;
use crate::catalog::PieceCatalog;
use crate::geom::{BoundingBox, Facing, ALL_FACINGS};
use crate::graph::StructureGraph;
use crate::painter::{BlockState, ChunkPos, WorldPainter};
use crate::piece::{PieceBase, PieceRecord, RecordError, StructurePiece};

use glam::IVec3;
use rand::Rng;

pub const CHAIN_CAP: u32 = 50;
pub const RANGE_CAP: i32 = 112;
/// Candidate boxes must stay above this bedrock floor.
pub const FLOOR_Y: i32 = 10;

pub const PORTAL_ROOM_TAG: &str = "portal_room";

const CORRIDOR_LOOT: &str = "chests/stronghold_corridor";
const LIBRARY_LOOT: &str = "chests/stronghold_library";
const PORTAL_MOB: &str = "silverfish";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrongholdKind {
    Start,
    Corridor,
    PrisonHall,
    LeftTurn,
    RightTurn,
    RoomCrossing,
    StraightStairs,
    SpiralStairs,
    FiveWayCrossing,
    ChestCorridor,
    Library,
    PortalRoom,
    Filler,
}

/// The family's catalog. Weights and quotas are tuning, not incidental; the
/// portal room is unique, and the library is rare.
pub fn catalog() -> PieceCatalog<StrongholdKind> {
    PieceCatalog::new(&[
        (StrongholdKind::Corridor, 40, 0),
        (StrongholdKind::PrisonHall, 5, 0),
        (StrongholdKind::LeftTurn, 20, 0),
        (StrongholdKind::RightTurn, 20, 0),
        (StrongholdKind::RoomCrossing, 10, 6),
        (StrongholdKind::StraightStairs, 5, 0),
        (StrongholdKind::SpiralStairs, 5, 5),
        (StrongholdKind::FiveWayCrossing, 5, 4),
        (StrongholdKind::ChestCorridor, 5, 4),
        (StrongholdKind::Library, 10, 2),
        (StrongholdKind::PortalRoom, 20, 1),
    ])
}

/// Grows a stronghold from the surface anchor at `(x, z)`. The start
/// stairwell descends from y 64 and forces a five-way crossing as its first
/// child, the one place the forced-kind mechanism is used.
pub fn build<R: Rng>(rng: &mut R, x: i32, z: i32) -> StructureGraph<StrongholdPiece> {
    let facing = ALL_FACINGS[rng.gen_range(0, 4)];
    let anchor = IVec3::new(x, 64, z);
    let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -7, 0), IVec3::new(5, 11, 5), facing);
    let root = StrongholdPiece::Start(SpiralStairs {
        base: PieceBase::new(bb, Some(facing), 0),
        entry_door: DoorType::Opening,
    });

    log::debug!("growing stronghold at ({}, {}) facing {:?}", x, z, facing);
    let mut graph = StructureGraph::new(root.clone());
    let mut builder = LayoutBuilder::new(catalog());
    root.fill_openings(&mut graph, &mut builder, rng);
    log::debug!("stronghold grew to {} pieces", graph.len());

    graph
}

/// How a piece's entry opening is dressed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DoorType {
    Opening,
    WoodDoor,
    Grates,
    IronDoor,
}

impl DoorType {
    fn index(self) -> i64 {
        match self {
            DoorType::Opening => 0,
            DoorType::WoodDoor => 1,
            DoorType::Grates => 2,
            DoorType::IronDoor => 3,
        }
    }

    fn from_index(index: i64) -> Option<DoorType> {
        match index {
            0 => Some(DoorType::Opening),
            1 => Some(DoorType::WoodDoor),
            2 => Some(DoorType::Grates),
            3 => Some(DoorType::IronDoor),
            _ => None,
        }
    }
}

fn rand_door<R: Rng>(rng: &mut R) -> DoorType {
    // Plain openings are twice as likely as any dressed door.
    match rng.gen_range(0, 5) {
        0 | 1 => DoorType::Opening,
        2 => DoorType::WoodDoor,
        3 => DoorType::Grates,
        _ => DoorType::IronDoor,
    }
}

/// Stronghold masonry: mostly plain stone brick with cracked and mossy blocks
/// mixed in.
fn rand_masonry<R: Rng>(rng: &mut R) -> BlockState {
    let f: f32 = rng.gen();
    if f < 0.2 {
        BlockState::CrackedStoneBrick
    } else if f < 0.5 {
        BlockState::MossyStoneBrick
    } else {
        BlockState::StoneBrick
    }
}

fn door_field(record: &PieceRecord) -> Result<DoorType, RecordError> {
    let value = record.field("EntryDoor")?;
    DoorType::from_index(value).ok_or(RecordError::BadField {
        field: "EntryDoor",
        id: record.id.clone(),
        value,
    })
}

/// Box check shared by every candidate: above the floor and clear of every
/// existing piece.
fn fits(existing: &[StrongholdPiece], bb: &BoundingBox) -> bool {
    bb.min.y > StrongholdPiece::FLOOR_Y && crate::piece::collision(existing, bb).is_none()
}

type Graph = StructureGraph<StrongholdPiece>;
type Builder = LayoutBuilder<StrongholdPiece>;

/// Opens a child straight ahead of the piece, at the local door offset
/// `(lx, ly)` on the far face.
fn open_forward<R: Rng>(
    kind: StrongholdKind,
    base: &PieceBase,
    graph: &mut Graph,
    builder: &mut Builder,
    rng: &mut R,
    lx: i32,
    ly: i32,
) {
    let bb = base.bounding_box;
    let facing = match base.facing {
        Some(f) => f,
        None => return,
    };
    let anchor = match facing {
        Facing::North => IVec3::new(bb.min.x + lx, bb.min.y + ly, bb.min.z - 1),
        Facing::South => IVec3::new(bb.min.x + lx, bb.min.y + ly, bb.max.z + 1),
        Facing::West => IVec3::new(bb.min.x - 1, bb.min.y + ly, bb.min.z + lx),
        Facing::East => IVec3::new(bb.max.x + 1, bb.min.y + ly, bb.min.z + lx),
    };
    builder.grow_from(graph, rng, anchor, facing, base.chain_length + 1, Some(kind));
}

/// Opens a child on the piece's west side (north side for east/west pieces).
fn open_side_low<R: Rng>(
    kind: StrongholdKind,
    base: &PieceBase,
    graph: &mut Graph,
    builder: &mut Builder,
    rng: &mut R,
    ly: i32,
    lz: i32,
) {
    let bb = base.bounding_box;
    let facing = match base.facing {
        Some(f) => f,
        None => return,
    };
    let (anchor, out) = match facing {
        Facing::North | Facing::South => (
            IVec3::new(bb.min.x - 1, bb.min.y + ly, bb.min.z + lz),
            Facing::West,
        ),
        Facing::West | Facing::East => (
            IVec3::new(bb.min.x + lz, bb.min.y + ly, bb.min.z - 1),
            Facing::North,
        ),
    };
    builder.grow_from(graph, rng, anchor, out, base.chain_length + 1, Some(kind));
}

/// Opens a child on the piece's east side (south side for east/west pieces).
fn open_side_high<R: Rng>(
    kind: StrongholdKind,
    base: &PieceBase,
    graph: &mut Graph,
    builder: &mut Builder,
    rng: &mut R,
    ly: i32,
    lz: i32,
) {
    let bb = base.bounding_box;
    let facing = match base.facing {
        Some(f) => f,
        None => return,
    };
    let (anchor, out) = match facing {
        Facing::North | Facing::South => (
            IVec3::new(bb.max.x + 1, bb.min.y + ly, bb.min.z + lz),
            Facing::East,
        ),
        Facing::West | Facing::East => (
            IVec3::new(bb.min.x + lz, bb.min.y + ly, bb.max.z + 1),
            Facing::South,
        ),
    };
    builder.grow_from(graph, rng, anchor, out, base.chain_length + 1, Some(kind));
}

/// Paints a 3x3 entry at local `(lx, ly, lz)` in the dress of `door`.
fn paint_door<W: WorldPainter>(
    base: &PieceBase,
    world: &mut W,
    clip: &BoundingBox,
    door: DoorType,
    lx: i32,
    ly: i32,
    lz: i32,
) {
    match door {
        DoorType::Opening => {
            base.fill(world, clip, (lx, ly, lz), (lx + 2, ly + 2, lz), BlockState::Air);
        }
        DoorType::WoodDoor => {
            base.fill(world, clip, (lx, ly, lz), (lx + 2, ly + 2, lz), BlockState::StoneBrick);
            base.place(world, clip, lx + 1, ly, lz, BlockState::WoodDoor);
            base.place(world, clip, lx + 1, ly + 1, lz, BlockState::WoodDoor);
        }
        DoorType::Grates => {
            base.fill(world, clip, (lx, ly, lz), (lx + 2, ly + 2, lz), BlockState::IronBars);
            base.place(world, clip, lx + 1, ly, lz, BlockState::Air);
            base.place(world, clip, lx + 1, ly + 1, lz, BlockState::Air);
        }
        DoorType::IronDoor => {
            base.fill(world, clip, (lx, ly, lz), (lx + 2, ly + 2, lz), BlockState::StoneBrick);
            base.place(world, clip, lx + 1, ly, lz, BlockState::IronDoor);
            base.place(world, clip, lx + 1, ly + 1, lz, BlockState::IronDoor);
        }
    }
}

// ---------------------------------------------------------------------------
// Piece kinds
// ---------------------------------------------------------------------------

/// Straight 5x5x7 corridor, possibly with open alcoves on either side.
#[derive(Clone, Debug, PartialEq)]
pub struct Corridor {
    pub base: PieceBase,
    pub entry_door: DoorType,
    pub left_alcove: bool,
    pub right_alcove: bool,
}

impl Corridor {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -1, 0), IVec3::new(5, 5, 7), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::Corridor(Corridor {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
            left_alcove: rng.gen_range(0, 2) == 0,
            right_alcove: rng.gen_range(0, 2) == 0,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 4, 6), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 1, 1, 0);
        paint_door(b, world, clip, DoorType::Opening, 1, 1, 6);
        if self.left_alcove {
            b.fill(world, clip, (0, 1, 2), (0, 2, 3), BlockState::Air);
        }
        if self.right_alcove {
            b.fill(world, clip, (4, 1, 2), (4, 2, 3), BlockState::Air);
        }
    }
}

/// 9x5x11 hall with barred cells along one side.
#[derive(Clone, Debug, PartialEq)]
pub struct PrisonHall {
    pub base: PieceBase,
    pub entry_door: DoorType,
}

impl PrisonHall {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -1, 0), IVec3::new(9, 5, 11), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::PrisonHall(PrisonHall {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (8, 4, 10), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 1, 1, 0);
        // Cell wall splitting the hall lengthwise, with barred windows and
        // two iron cell doors.
        b.fill(world, clip, (4, 1, 2), (4, 3, 8), BlockState::StoneBrick);
        b.fill(world, clip, (4, 2, 3), (4, 2, 7), BlockState::IronBars);
        b.place(world, clip, 4, 1, 3, BlockState::IronDoor);
        b.place(world, clip, 4, 1, 7, BlockState::IronDoor);
    }
}

/// 5x5x5 corner. `left` picks which side wall opens.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub base: PieceBase,
    pub entry_door: DoorType,
    pub left: bool,
}

impl Turn {
    fn candidate<R: Rng>(
        left: bool,
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -1, 0), IVec3::new(5, 5, 5), facing);
        if !fits(existing, &bb) {
            return None;
        }
        let turn = Turn {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
            left,
        };
        Some(if left {
            StrongholdPiece::LeftTurn(turn)
        } else {
            StrongholdPiece::RightTurn(turn)
        })
    }

    /// Whether this turn exits through the low side (world west/north) or the
    /// high side, given the turn direction and facing.
    fn exits_low_side(&self) -> bool {
        match self.base.facing {
            Some(Facing::North) | Some(Facing::East) => self.left,
            _ => !self.left,
        }
    }

    fn open_exit<R: Rng>(&self, graph: &mut Graph, builder: &mut Builder, rng: &mut R) {
        let kind = if self.left {
            StrongholdKind::LeftTurn
        } else {
            StrongholdKind::RightTurn
        };
        if self.exits_low_side() {
            open_side_low(kind, &self.base, graph, builder, rng, 1, 1);
        } else {
            open_side_high(kind, &self.base, graph, builder, rng, 1, 1);
        }
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 4, 4), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 1, 1, 0);
        if self.exits_low_side() {
            b.fill(world, clip, (0, 1, 1), (0, 3, 3), BlockState::Air);
        } else {
            b.fill(world, clip, (4, 1, 1), (4, 3, 3), BlockState::Air);
        }
    }
}

/// 11x7x11 room with exits ahead and to both sides, decorated by `room_type`.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomCrossing {
    pub base: PieceBase,
    pub entry_door: DoorType,
    pub room_type: i64,
}

impl RoomCrossing {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb =
            BoundingBox::oriented(anchor, IVec3::new(-4, -1, 0), IVec3::new(11, 7, 11), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::RoomCrossing(RoomCrossing {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
            room_type: rng.gen_range(0, 3) as i64,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (10, 6, 10), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 4, 1, 0);
        b.fill(world, clip, (0, 1, 4), (0, 3, 6), BlockState::Air);
        b.fill(world, clip, (10, 1, 4), (10, 3, 6), BlockState::Air);
        match self.room_type {
            0 => {
                // Central pillar with a torch.
                b.fill(world, clip, (5, 1, 5), (5, 3, 5), BlockState::StoneBrick);
                b.place(world, clip, 5, 4, 5, BlockState::Torch);
            }
            1 => {
                // Sunken fountain basin.
                b.fill(world, clip, (4, 1, 4), (6, 1, 6), BlockState::SmoothStone);
                b.place(world, clip, 5, 1, 5, BlockState::Water);
            }
            _ => {
                // Flagstone floor and corner posts.
                b.fill(world, clip, (1, 0, 1), (9, 0, 9), BlockState::SmoothStone);
                for &(px, pz) in &[(2, 2), (2, 8), (8, 2), (8, 8)] {
                    b.fill(world, clip, (px, 1, pz), (px, 3, pz), BlockState::Fence);
                }
            }
        }
    }
}

/// 5x11x8 straight run of stairs dropping seven blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct StraightStairs {
    pub base: PieceBase,
    pub entry_door: DoorType,
}

impl StraightStairs {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -7, 0), IVec3::new(5, 11, 8), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::StraightStairs(StraightStairs {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 10, 7), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 1, 7, 0);
        paint_door(b, world, clip, DoorType::Opening, 1, 1, 7);
        // One step down per block of depth, with air cleared above each tread.
        for i in 0..6 {
            let lz = 1 + i;
            let ly = 6 - i;
            b.fill(world, clip, (1, ly, lz), (3, ly, lz), BlockState::SmoothStone);
            b.fill(world, clip, (1, ly + 1, lz), (3, ly + 3, lz), BlockState::Air);
        }
        b.fill(world, clip, (1, 1, 7), (3, 1, 7), BlockState::SmoothStone);
    }
}

/// 5x11x5 spiral stairwell; also the shape of the start piece.
#[derive(Clone, Debug, PartialEq)]
pub struct SpiralStairs {
    pub base: PieceBase,
    pub entry_door: DoorType,
}

impl SpiralStairs {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -7, 0), IVec3::new(5, 11, 5), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::SpiralStairs(SpiralStairs {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 10, 4), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 1, 7, 0);
        paint_door(b, world, clip, DoorType::Opening, 1, 1, 4);
        // Treads spiral down the outer walls.
        let treads = [
            (3, 6, 1),
            (3, 5, 2),
            (3, 4, 3),
            (2, 3, 3),
            (1, 2, 3),
            (1, 1, 2),
            (1, 1, 1),
        ];
        for &(lx, ly, lz) in treads.iter() {
            b.place(world, clip, lx, ly, lz, BlockState::SmoothStone);
        }
    }
}

/// 10x9x11 two-level crossing; the forced piece right after the start.
#[derive(Clone, Debug, PartialEq)]
pub struct FiveWayCrossing {
    pub base: PieceBase,
    pub entry_door: DoorType,
    pub left_low: bool,
    pub left_high: bool,
    pub right_low: bool,
    pub right_high: bool,
}

impl FiveWayCrossing {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb =
            BoundingBox::oriented(anchor, IVec3::new(-4, -3, 0), IVec3::new(10, 9, 11), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::FiveWayCrossing(FiveWayCrossing {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
            left_low: rng.gen_range(0, 2) == 0,
            left_high: rng.gen_range(0, 2) == 0,
            right_low: rng.gen_range(0, 2) == 0,
            right_high: rng.gen_range(0, 3) > 0,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (9, 8, 10), rng, BlockState::Air, rand_masonry);
        paint_door(b, world, clip, self.entry_door, 3, 3, 0);
        // Mezzanine floor between the two levels, with a stairwell gap.
        b.fill(world, clip, (1, 4, 1), (8, 4, 9), BlockState::SmoothStone);
        b.fill(world, clip, (4, 4, 4), (6, 4, 8), BlockState::Air);
        paint_door(b, world, clip, DoorType::Opening, 3, 3, 10);
        if self.left_low {
            b.fill(world, clip, (0, 1, 2), (0, 3, 4), BlockState::Air);
        }
        if self.left_high {
            b.fill(world, clip, (0, 5, 6), (0, 7, 8), BlockState::Air);
        }
        if self.right_low {
            b.fill(world, clip, (9, 1, 2), (9, 3, 4), BlockState::Air);
        }
        if self.right_high {
            b.fill(world, clip, (9, 5, 6), (9, 7, 8), BlockState::Air);
        }
    }
}

/// 5x5x7 corridor with a raised loot chest.
#[derive(Clone, Debug, PartialEq)]
pub struct ChestCorridor {
    pub base: PieceBase,
    pub entry_door: DoorType,
    /// Painting bookkeeping, persisted so reloaded graphs stay idempotent.
    pub has_placed_chest: bool,
}

impl ChestCorridor {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb = BoundingBox::oriented(anchor, IVec3::new(-1, -1, 0), IVec3::new(5, 5, 7), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::ChestCorridor(ChestCorridor {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door: rand_door(rng),
            has_placed_chest: false,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&mut self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 4, 6), rng, BlockState::Air, rand_masonry);
        paint_door(&b, world, clip, self.entry_door, 1, 1, 0);
        paint_door(&b, world, clip, DoorType::Opening, 1, 1, 6);
        b.place(world, clip, 2, 1, 3, BlockState::StoneBrick);
        let chest_pos = b.world_pos(2, 2, 3);
        if !self.has_placed_chest && clip.contains(chest_pos) {
            self.has_placed_chest = true;
            world.place_loot_container(chest_pos, CORRIDOR_LOOT, rng.gen());
        }
    }
}

/// 14-wide library, either one tall hall with a balcony or a short reading
/// room, with a loot chest among the shelves.
#[derive(Clone, Debug, PartialEq)]
pub struct Library {
    pub base: PieceBase,
    pub entry_door: DoorType,
    pub tall: bool,
    pub has_placed_chest: bool,
}

impl Library {
    fn candidate<R: Rng>(
        existing: &[StrongholdPiece],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let entry_door = rand_door(rng);
        // Try the full two-story hall first, then settle for the short room.
        let mut tall = true;
        let mut bb =
            BoundingBox::oriented(anchor, IVec3::new(-4, -1, 0), IVec3::new(14, 11, 15), facing);
        if !fits(existing, &bb) {
            tall = false;
            bb = BoundingBox::oriented(anchor, IVec3::new(-4, -1, 0), IVec3::new(14, 6, 15), facing);
            if !fits(existing, &bb) {
                return None;
            }
        }
        Some(StrongholdPiece::Library(Library {
            base: PieceBase::new(bb, Some(facing), chain_length),
            entry_door,
            tall,
            has_placed_chest: false,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&mut self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = self.base;
        let top = if self.tall { 10 } else { 5 };
        b.fill_shell_with(world, clip, (0, 0, 0), (13, top, 14), rng, BlockState::Air, rand_masonry);
        paint_door(&b, world, clip, self.entry_door, 4, 1, 0);
        b.fill(world, clip, (1, 0, 1), (12, 0, 13), BlockState::Planks);
        // Shelf rows along both side walls.
        for lz in (2..=12).step_by(2) {
            b.fill(world, clip, (1, 1, lz), (1, top - 2, lz), BlockState::Bookshelf);
            b.fill(world, clip, (12, 1, lz), (12, top - 2, lz), BlockState::Bookshelf);
        }
        if self.tall {
            // Balcony ring at the second story.
            b.fill(world, clip, (3, 5, 3), (10, 5, 11), BlockState::Planks);
            b.fill(world, clip, (4, 5, 4), (9, 5, 10), BlockState::Air);
            b.fill(world, clip, (3, 6, 3), (10, 6, 3), BlockState::Fence);
            b.fill(world, clip, (3, 6, 11), (10, 6, 11), BlockState::Fence);
        }
        let chest_pos = b.world_pos(11, 1, 13);
        if !self.has_placed_chest && clip.contains(chest_pos) {
            self.has_placed_chest = true;
            world.place_loot_container(chest_pos, LIBRARY_LOOT, rng.gen());
        }
    }
}

/// The unique 11x8x16 portal room: frame ring, lava trough, and one spawner.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalRoom {
    pub base: PieceBase,
    pub has_placed_spawner: bool,
}

impl PortalRoom {
    fn candidate(
        existing: &[StrongholdPiece],
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        let bb =
            BoundingBox::oriented(anchor, IVec3::new(-4, -1, 0), IVec3::new(11, 8, 16), facing);
        if !fits(existing, &bb) {
            return None;
        }
        Some(StrongholdPiece::PortalRoom(PortalRoom {
            base: PieceBase::new(bb, Some(facing), chain_length),
            has_placed_spawner: false,
        }))
    }

    fn paint<W: WorldPainter, R: Rng>(&mut self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = self.base;
        b.fill_shell_with(world, clip, (0, 0, 0), (10, 7, 15), rng, BlockState::Air, rand_masonry);
        paint_door(&b, world, clip, DoorType::Grates, 4, 1, 0);
        // Lava troughs along the side walls.
        b.fill(world, clip, (1, 1, 1), (1, 1, 14), BlockState::Lava);
        b.fill(world, clip, (9, 1, 1), (9, 1, 14), BlockState::Lava);
        // Raised dais carrying the portal frame ring.
        b.fill(world, clip, (3, 1, 8), (7, 1, 12), BlockState::StoneBrick);
        for lx in 3..=7 {
            b.place(world, clip, lx, 2, 8, BlockState::EndPortalFrame);
            b.place(world, clip, lx, 2, 12, BlockState::EndPortalFrame);
        }
        for lz in 9..=11 {
            b.place(world, clip, 3, 2, lz, BlockState::EndPortalFrame);
            b.place(world, clip, 7, 2, lz, BlockState::EndPortalFrame);
        }
        let spawner_pos = b.world_pos(5, 2, 5);
        if !self.has_placed_spawner && clip.contains(spawner_pos) {
            self.has_placed_spawner = true;
            world.place_spawner(spawner_pos, PORTAL_MOB);
        }
    }
}

/// The fallback connector: a plain 5x5 tunnel of 1..=4 steps squeezed in
/// front of whatever blocked the weighted picks.
#[derive(Clone, Debug, PartialEq)]
pub struct FillerCorridor {
    pub base: PieceBase,
    pub steps: u32,
}

impl FillerCorridor {
    const FULL_STEPS: i32 = 4;

    fn shrink_to_fit(
        existing: &[StrongholdPiece],
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<StrongholdPiece> {
        for steps in (1..=Self::FULL_STEPS).rev() {
            let bb = BoundingBox::oriented(
                anchor,
                IVec3::new(-1, -1, 0),
                IVec3::new(5, 5, steps),
                facing,
            );
            if fits(existing, &bb) {
                return Some(StrongholdPiece::Filler(FillerCorridor {
                    base: PieceBase::new(bb, Some(facing), chain_length),
                    steps: steps as u32,
                }));
            }
        }
        None
    }

    fn paint<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let b = &self.base;
        let far = self.steps as i32 - 1;
        b.fill_shell_with(world, clip, (0, 0, 0), (4, 4, far), rng, BlockState::Air, rand_masonry);
        b.fill(world, clip, (1, 1, 0), (3, 3, 0), BlockState::Air);
        if far > 0 {
            b.fill(world, clip, (1, 1, far), (3, 3, far), BlockState::Air);
        }
    }
}

// ---------------------------------------------------------------------------
// The tagged union
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum StrongholdPiece {
    Start(SpiralStairs),
    Corridor(Corridor),
    PrisonHall(PrisonHall),
    LeftTurn(Turn),
    RightTurn(Turn),
    RoomCrossing(RoomCrossing),
    StraightStairs(StraightStairs),
    SpiralStairs(SpiralStairs),
    FiveWayCrossing(FiveWayCrossing),
    ChestCorridor(ChestCorridor),
    Library(Library),
    PortalRoom(PortalRoom),
    Filler(FillerCorridor),
}

const TAG_START: &str = "ShStart";
const TAG_CORRIDOR: &str = "ShCorridor";
const TAG_PRISON: &str = "ShPrison";
const TAG_LEFT_TURN: &str = "ShLeftTurn";
const TAG_RIGHT_TURN: &str = "ShRightTurn";
const TAG_ROOM_CROSSING: &str = "ShRoomCrossing";
const TAG_STRAIGHT_STAIRS: &str = "ShStraightStairs";
const TAG_SPIRAL_STAIRS: &str = "ShSpiralStairs";
const TAG_FIVE_WAY: &str = "ShFiveWay";
const TAG_CHEST_CORRIDOR: &str = "ShChestCorridor";
const TAG_LIBRARY: &str = "ShLibrary";
const TAG_PORTAL_ROOM: &str = "ShPortalRoom";
const TAG_FILLER: &str = "ShFiller";

impl StructurePiece for StrongholdPiece {
    type Kind = StrongholdKind;

    const CHAIN_CAP: u32 = CHAIN_CAP;
    const RANGE_CAP: i32 = RANGE_CAP;
    const FLOOR_Y: i32 = FLOOR_Y;
    const FORBID_REPEAT: bool = true;

    fn base(&self) -> &PieceBase {
        match self {
            StrongholdPiece::Start(p) => &p.base,
            StrongholdPiece::Corridor(p) => &p.base,
            StrongholdPiece::PrisonHall(p) => &p.base,
            StrongholdPiece::LeftTurn(p) => &p.base,
            StrongholdPiece::RightTurn(p) => &p.base,
            StrongholdPiece::RoomCrossing(p) => &p.base,
            StrongholdPiece::StraightStairs(p) => &p.base,
            StrongholdPiece::SpiralStairs(p) => &p.base,
            StrongholdPiece::FiveWayCrossing(p) => &p.base,
            StrongholdPiece::ChestCorridor(p) => &p.base,
            StrongholdPiece::Library(p) => &p.base,
            StrongholdPiece::PortalRoom(p) => &p.base,
            StrongholdPiece::Filler(p) => &p.base,
        }
    }

    fn kind(&self) -> StrongholdKind {
        match self {
            StrongholdPiece::Start(_) => StrongholdKind::Start,
            StrongholdPiece::Corridor(_) => StrongholdKind::Corridor,
            StrongholdPiece::PrisonHall(_) => StrongholdKind::PrisonHall,
            StrongholdPiece::LeftTurn(_) => StrongholdKind::LeftTurn,
            StrongholdPiece::RightTurn(_) => StrongholdKind::RightTurn,
            StrongholdPiece::RoomCrossing(_) => StrongholdKind::RoomCrossing,
            StrongholdPiece::StraightStairs(_) => StrongholdKind::StraightStairs,
            StrongholdPiece::SpiralStairs(_) => StrongholdKind::SpiralStairs,
            StrongholdPiece::FiveWayCrossing(_) => StrongholdKind::FiveWayCrossing,
            StrongholdPiece::ChestCorridor(_) => StrongholdKind::ChestCorridor,
            StrongholdPiece::Library(_) => StrongholdKind::Library,
            StrongholdPiece::PortalRoom(_) => StrongholdKind::PortalRoom,
            StrongholdPiece::Filler(_) => StrongholdKind::Filler,
        }
    }

    fn notable_tag(&self) -> Option<&'static str> {
        match self {
            StrongholdPiece::PortalRoom(_) => Some(PORTAL_ROOM_TAG),
            _ => None,
        }
    }

    fn candidate<R: Rng>(
        kind: StrongholdKind,
        existing: &[Self],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self> {
        match kind {
            StrongholdKind::Corridor => Corridor::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::PrisonHall => PrisonHall::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::LeftTurn => Turn::candidate(true, existing, rng, anchor, facing, chain_length),
            StrongholdKind::RightTurn => Turn::candidate(false, existing, rng, anchor, facing, chain_length),
            StrongholdKind::RoomCrossing => RoomCrossing::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::StraightStairs => StraightStairs::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::SpiralStairs => SpiralStairs::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::FiveWayCrossing => FiveWayCrossing::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::ChestCorridor => ChestCorridor::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::Library => Library::candidate(existing, rng, anchor, facing, chain_length),
            StrongholdKind::PortalRoom => PortalRoom::candidate(existing, anchor, facing, chain_length),
            // Not in any catalog; only built through `build` and `fallback`.
            StrongholdKind::Start | StrongholdKind::Filler => None,
        }
    }

    fn fallback<R: Rng>(
        existing: &[Self],
        _rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self> {
        FillerCorridor::shrink_to_fit(existing, anchor, facing, chain_length)
    }

    fn fill_openings<R: Rng>(
        &self,
        graph: &mut StructureGraph<Self>,
        builder: &mut LayoutBuilder<Self>,
        rng: &mut R,
    ) {
        match self {
            StrongholdPiece::Start(p) => {
                // The five-way crossing is imposed right after the start;
                // this is the only use of the forced-kind mechanism.
                builder.force_next(StrongholdKind::FiveWayCrossing);
                open_forward(StrongholdKind::Start, &p.base, graph, builder, rng, 1, 1);
            }
            StrongholdPiece::Corridor(p) => {
                open_forward(StrongholdKind::Corridor, &p.base, graph, builder, rng, 1, 1);
            }
            StrongholdPiece::PrisonHall(p) => {
                open_forward(StrongholdKind::PrisonHall, &p.base, graph, builder, rng, 1, 1);
            }
            StrongholdPiece::LeftTurn(p) | StrongholdPiece::RightTurn(p) => {
                p.open_exit(graph, builder, rng);
            }
            StrongholdPiece::RoomCrossing(p) => {
                let kind = StrongholdKind::RoomCrossing;
                open_forward(kind, &p.base, graph, builder, rng, 4, 1);
                open_side_low(kind, &p.base, graph, builder, rng, 1, 4);
                open_side_high(kind, &p.base, graph, builder, rng, 1, 4);
            }
            StrongholdPiece::StraightStairs(p) => {
                open_forward(StrongholdKind::StraightStairs, &p.base, graph, builder, rng, 1, 1);
            }
            StrongholdPiece::SpiralStairs(p) => {
                open_forward(StrongholdKind::SpiralStairs, &p.base, graph, builder, rng, 1, 1);
            }
            StrongholdPiece::FiveWayCrossing(p) => {
                let kind = StrongholdKind::FiveWayCrossing;
                open_forward(kind, &p.base, graph, builder, rng, 4, 3);
                if p.left_low {
                    open_side_low(kind, &p.base, graph, builder, rng, 1, 3);
                }
                if p.left_high {
                    open_side_low(kind, &p.base, graph, builder, rng, 5, 7);
                }
                if p.right_low {
                    open_side_high(kind, &p.base, graph, builder, rng, 1, 3);
                }
                if p.right_high {
                    open_side_high(kind, &p.base, graph, builder, rng, 5, 7);
                }
            }
            StrongholdPiece::ChestCorridor(p) => {
                open_forward(StrongholdKind::ChestCorridor, &p.base, graph, builder, rng, 1, 1);
            }
            // Terminal rooms and the filler never expand.
            StrongholdPiece::Library(_)
            | StrongholdPiece::PortalRoom(_)
            | StrongholdPiece::Filler(_) => {}
        }
    }

    fn generate<W: WorldPainter, R: Rng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        clip: &BoundingBox,
        _chunk: ChunkPos,
    ) -> bool {
        match self {
            StrongholdPiece::Start(p) | StrongholdPiece::SpiralStairs(p) => {
                p.paint(world, rng, clip)
            }
            StrongholdPiece::Corridor(p) => p.paint(world, rng, clip),
            StrongholdPiece::PrisonHall(p) => p.paint(world, rng, clip),
            StrongholdPiece::LeftTurn(p) | StrongholdPiece::RightTurn(p) => {
                p.paint(world, rng, clip)
            }
            StrongholdPiece::RoomCrossing(p) => p.paint(world, rng, clip),
            StrongholdPiece::StraightStairs(p) => p.paint(world, rng, clip),
            StrongholdPiece::FiveWayCrossing(p) => p.paint(world, rng, clip),
            StrongholdPiece::ChestCorridor(p) => p.paint(world, rng, clip),
            StrongholdPiece::Library(p) => p.paint(world, rng, clip),
            StrongholdPiece::PortalRoom(p) => p.paint(world, rng, clip),
            StrongholdPiece::Filler(p) => p.paint(world, rng, clip),
        }
        true
    }

    fn to_record(&self) -> PieceRecord {
        match self {
            StrongholdPiece::Start(p) => {
                PieceRecord::new(TAG_START, &p.base).with("EntryDoor", p.entry_door.index())
            }
            StrongholdPiece::Corridor(p) => PieceRecord::new(TAG_CORRIDOR, &p.base)
                .with("EntryDoor", p.entry_door.index())
                .with_flag("Left", p.left_alcove)
                .with_flag("Right", p.right_alcove),
            StrongholdPiece::PrisonHall(p) => {
                PieceRecord::new(TAG_PRISON, &p.base).with("EntryDoor", p.entry_door.index())
            }
            StrongholdPiece::LeftTurn(p) => {
                PieceRecord::new(TAG_LEFT_TURN, &p.base).with("EntryDoor", p.entry_door.index())
            }
            StrongholdPiece::RightTurn(p) => {
                PieceRecord::new(TAG_RIGHT_TURN, &p.base).with("EntryDoor", p.entry_door.index())
            }
            StrongholdPiece::RoomCrossing(p) => PieceRecord::new(TAG_ROOM_CROSSING, &p.base)
                .with("EntryDoor", p.entry_door.index())
                .with("Type", p.room_type),
            StrongholdPiece::StraightStairs(p) => PieceRecord::new(TAG_STRAIGHT_STAIRS, &p.base)
                .with("EntryDoor", p.entry_door.index()),
            StrongholdPiece::SpiralStairs(p) => PieceRecord::new(TAG_SPIRAL_STAIRS, &p.base)
                .with("EntryDoor", p.entry_door.index()),
            StrongholdPiece::FiveWayCrossing(p) => PieceRecord::new(TAG_FIVE_WAY, &p.base)
                .with("EntryDoor", p.entry_door.index())
                .with_flag("LeftLow", p.left_low)
                .with_flag("LeftHigh", p.left_high)
                .with_flag("RightLow", p.right_low)
                .with_flag("RightHigh", p.right_high),
            StrongholdPiece::ChestCorridor(p) => PieceRecord::new(TAG_CHEST_CORRIDOR, &p.base)
                .with("EntryDoor", p.entry_door.index())
                .with_flag("Chest", p.has_placed_chest),
            StrongholdPiece::Library(p) => PieceRecord::new(TAG_LIBRARY, &p.base)
                .with("EntryDoor", p.entry_door.index())
                .with_flag("Tall", p.tall)
                .with_flag("Chest", p.has_placed_chest),
            StrongholdPiece::PortalRoom(p) => {
                PieceRecord::new(TAG_PORTAL_ROOM, &p.base).with_flag("Mob", p.has_placed_spawner)
            }
            StrongholdPiece::Filler(p) => {
                PieceRecord::new(TAG_FILLER, &p.base).with("Steps", i64::from(p.steps))
            }
        }
    }

    fn from_record(record: &PieceRecord) -> Result<Self, RecordError> {
        let base = record.base()?;
        match record.id.as_str() {
            TAG_START => Ok(StrongholdPiece::Start(SpiralStairs {
                base,
                entry_door: door_field(record)?,
            })),
            TAG_CORRIDOR => Ok(StrongholdPiece::Corridor(Corridor {
                base,
                entry_door: door_field(record)?,
                left_alcove: record.flag("Left"),
                right_alcove: record.flag("Right"),
            })),
            TAG_PRISON => Ok(StrongholdPiece::PrisonHall(PrisonHall {
                base,
                entry_door: door_field(record)?,
            })),
            TAG_LEFT_TURN => Ok(StrongholdPiece::LeftTurn(Turn {
                base,
                entry_door: door_field(record)?,
                left: true,
            })),
            TAG_RIGHT_TURN => Ok(StrongholdPiece::RightTurn(Turn {
                base,
                entry_door: door_field(record)?,
                left: false,
            })),
            TAG_ROOM_CROSSING => Ok(StrongholdPiece::RoomCrossing(RoomCrossing {
                base,
                entry_door: door_field(record)?,
                room_type: record.field("Type")?,
            })),
            TAG_STRAIGHT_STAIRS => Ok(StrongholdPiece::StraightStairs(StraightStairs {
                base,
                entry_door: door_field(record)?,
            })),
            TAG_SPIRAL_STAIRS => Ok(StrongholdPiece::SpiralStairs(SpiralStairs {
                base,
                entry_door: door_field(record)?,
            })),
            TAG_FIVE_WAY => Ok(StrongholdPiece::FiveWayCrossing(FiveWayCrossing {
                base,
                entry_door: door_field(record)?,
                left_low: record.flag("LeftLow"),
                left_high: record.flag("LeftHigh"),
                right_low: record.flag("RightLow"),
                right_high: record.flag("RightHigh"),
            })),
            TAG_CHEST_CORRIDOR => Ok(StrongholdPiece::ChestCorridor(ChestCorridor {
                base,
                entry_door: door_field(record)?,
                has_placed_chest: record.flag("Chest"),
            })),
            TAG_LIBRARY => Ok(StrongholdPiece::Library(Library {
                base,
                entry_door: door_field(record)?,
                tall: record.flag("Tall"),
                has_placed_chest: record.flag("Chest"),
            })),
            TAG_PORTAL_ROOM => Ok(StrongholdPiece::PortalRoom(PortalRoom {
                base,
                has_placed_spawner: record.flag("Mob"),
            })),
            TAG_FILLER => Ok(StrongholdPiece::Filler(FillerCorridor {
                base,
                steps: record.field("Steps")? as u32,
            })),
            other => Err(RecordError::UnknownKind(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::small_rng;
    use crate::test_support::MemoryPainter;

    fn built() -> StructureGraph<StrongholdPiece> {
        let mut rng = small_rng([11, 22, 33, 44]);
        build(&mut rng, 0, 0)
    }

    #[test]
    fn test_no_two_pieces_overlap() {
        let graph = built();
        assert!(graph.len() > 1, "build should grow past the start");
        let pieces = graph.pieces();
        for i in 0..pieces.len() {
            for j in i + 1..pieces.len() {
                let a = pieces[i].base().bounding_box;
                let b = pieces[j].base().bounding_box;
                assert!(!a.intersects(&b), "pieces {} and {} overlap", i, j);
            }
        }
    }

    #[test]
    fn test_chain_lengths_are_contiguous_and_capped() {
        let graph = built();
        assert_eq!(graph.root().base().chain_length, 0);
        for piece in graph.pieces() {
            let chain = piece.base().chain_length;
            assert!(chain <= CHAIN_CAP);
            if chain > 0 {
                // Depth-first growth: every depth is reached through its
                // predecessor.
                assert!(graph
                    .pieces()
                    .iter()
                    .any(|p| p.base().chain_length == chain - 1));
            }
        }
    }

    #[test]
    fn test_pieces_stay_inside_the_range_cap() {
        let graph = built();
        let root_min = graph.root().base().bounding_box.min;
        for piece in graph.pieces() {
            let bb = piece.base().bounding_box;
            // Anchors obey the cap exactly; boxes extend at most one piece
            // footprint (16 blocks) beyond their anchor.
            assert!(crate::geom::chebyshev_xz(bb.min, root_min) <= RANGE_CAP + 16);
            assert!(bb.min.y > FLOOR_Y);
        }
    }

    #[test]
    fn test_quotas_are_respected() {
        let graph = built();
        let count = |kind: StrongholdKind| {
            graph
                .pieces()
                .iter()
                .filter(|p| p.kind() == kind)
                .count()
        };
        assert!(count(StrongholdKind::PortalRoom) <= 1);
        assert!(count(StrongholdKind::Library) <= 2);
        assert!(count(StrongholdKind::FiveWayCrossing) <= 4);
        assert!(count(StrongholdKind::ChestCorridor) <= 4);
        assert!(count(StrongholdKind::SpiralStairs) <= 5);
        assert!(count(StrongholdKind::RoomCrossing) <= 6);
    }

    #[test]
    fn test_portal_room_is_registered_by_name() {
        let graph = built();
        let has_portal = graph
            .pieces()
            .iter()
            .any(|p| p.kind() == StrongholdKind::PortalRoom);
        assert_eq!(graph.named(PORTAL_ROOM_TAG).is_some(), has_portal);
    }

    #[test]
    fn test_same_seed_builds_identical_graphs() {
        let mut a_rng = small_rng([5, 6, 7, 8]);
        let mut b_rng = small_rng([5, 6, 7, 8]);
        let a = build(&mut a_rng, -200, 350);
        let b = build(&mut b_rng, -200, 350);
        assert_eq!(a.pieces(), b.pieces());

        let mut c_rng = small_rng([9, 9, 9, 9]);
        let c = build(&mut c_rng, -200, 350);
        assert_ne!(a.pieces(), c.pieces());
    }

    #[test]
    fn test_record_round_trip_preserves_everything() {
        let graph = built();
        let records = graph.encode();
        let back = StructureGraph::<StrongholdPiece>::decode(&records).unwrap();
        assert_eq!(graph.pieces(), back.pieces());

        let text = graph.to_ron_string().unwrap();
        let back = StructureGraph::<StrongholdPiece>::from_ron_str(&text).unwrap();
        assert_eq!(graph.pieces(), back.pieces());
    }

    #[test]
    fn test_unknown_kind_tag_is_a_load_error() {
        let graph = built();
        let mut records = graph.encode();
        records[1].id = "ShSomethingElse".to_owned();
        match StructureGraph::<StrongholdPiece>::decode(&records) {
            Err(RecordError::UnknownKind(tag)) => assert_eq!(tag, "ShSomethingElse"),
            other => panic!("expected UnknownKind, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn test_blocked_opening_dead_ends_without_error() {
        let mut rng = small_rng([1, 2, 3, 4]);
        let facing = Facing::South;
        let anchor = IVec3::new(0, 64, 0);
        let bb =
            BoundingBox::oriented(anchor, IVec3::new(-1, -7, 0), IVec3::new(5, 11, 5), facing);
        let root = StrongholdPiece::Start(SpiralStairs {
            base: PieceBase::new(bb, Some(facing), 0),
            entry_door: DoorType::Opening,
        });
        let mut graph = StructureGraph::new(root);

        // Wall off everything south of the start, so every candidate and
        // every shrunken filler overlaps.
        let wall = StrongholdPiece::Filler(FillerCorridor {
            base: PieceBase::new(
                BoundingBox::from_corners(IVec3::new(-60, 11, 5), IVec3::new(60, 120, 60)),
                Some(facing),
                0,
            ),
            steps: 4,
        });
        graph.push(wall);

        let mut builder = LayoutBuilder::new(catalog());
        builder.grow_from(
            &mut graph,
            &mut rng,
            IVec3::new(0, 58, 5),
            facing,
            1,
            Some(StrongholdKind::Start),
        );

        // Terminates, and the opening stayed a dead end.
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_chest_is_placed_once_even_across_reload() {
        let facing = Facing::South;
        let bb = BoundingBox::oriented(
            IVec3::new(3, 20, 2),
            IVec3::new(-1, -1, 0),
            IVec3::new(5, 5, 7),
            facing,
        );
        let piece = StrongholdPiece::ChestCorridor(ChestCorridor {
            base: PieceBase::new(bb, Some(facing), 0),
            entry_door: DoorType::Opening,
            has_placed_chest: false,
        });
        let mut graph = StructureGraph::new(piece);
        let chunk = ChunkPos::new(0, 0);

        let mut world = MemoryPainter::new();
        let mut rng = small_rng([2; 4]);
        graph.paint_chunk(&mut world, &mut rng, chunk);
        graph.paint_chunk(&mut world, &mut rng, chunk);
        assert_eq!(world.loot.len(), 1);

        // The flag persists, so a reloaded graph does not re-place the chest.
        let reloaded = graph.encode();
        let mut graph = StructureGraph::<StrongholdPiece>::decode(&reloaded).unwrap();
        let mut fresh_world = MemoryPainter::new();
        graph.paint_chunk(&mut fresh_world, &mut rng, chunk);
        assert!(fresh_world.loot.is_empty());
    }

    #[test]
    fn test_spawner_is_placed_once() {
        let facing = Facing::South;
        let bb = BoundingBox::oriented(
            IVec3::new(5, 20, 0),
            IVec3::new(-4, -1, 0),
            IVec3::new(11, 8, 16),
            facing,
        );
        let piece = StrongholdPiece::PortalRoom(PortalRoom {
            base: PieceBase::new(bb, Some(facing), 3),
            has_placed_spawner: false,
        });
        let mut graph = StructureGraph::new(piece);
        let mut world = MemoryPainter::new();
        let mut rng = small_rng([3; 4]);

        // The whole room fits one chunk; paint it twice.
        for _ in 0..2 {
            graph.paint_chunk(&mut world, &mut rng, ChunkPos::new(0, 0));
        }
        assert_eq!(world.spawners.len(), 1);
        assert_eq!(graph.named(PORTAL_ROOM_TAG).map(|p| p.kind()), Some(StrongholdKind::PortalRoom));
    }

    #[test]
    fn test_filler_shrinks_against_a_blocking_neighbor() {
        let facing = Facing::South;
        // A wall two steps in front of the anchor leaves room for a length-2
        // filler but nothing longer.
        let wall = StrongholdPiece::Filler(FillerCorridor {
            base: PieceBase::new(
                BoundingBox::from_corners(IVec3::new(-20, 11, 12), IVec3::new(20, 90, 30)),
                Some(facing),
                0,
            ),
            steps: 4,
        });
        let existing = vec![wall];

        let piece = FillerCorridor::shrink_to_fit(&existing, IVec3::new(0, 20, 10), facing, 1)
            .expect("a shrunken filler fits");
        match piece {
            StrongholdPiece::Filler(f) => {
                assert_eq!(f.steps, 2);
                assert_eq!(f.base.bounding_box.max.z, 11);
            }
            other => panic!("unexpected piece {:?}", other),
        }
    }
}
