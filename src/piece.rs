//! The per-kind piece contract shared by every structure family, the shared
//! painting helpers, and the persisted record format.
//!
//! A piece's life: `candidate` fixes its box and rolls its sub-choices,
//! `fill_openings` attaches children through the layout builder, and
//! `generate` later paints blocks one chunk at a time. The record codec must
//! reconstruct all of that behavior from the kind tag alone; randomness is
//! never re-rolled on load.

use crate::builder::LayoutBuilder;
use crate::geom::{self, BoundingBox, Facing};
use crate::graph::StructureGraph;
use crate::painter::{BlockState, ChunkPos, WorldPainter};

use glam::IVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fields every piece kind carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PieceBase {
    pub bounding_box: BoundingBox,
    /// `None` for pieces without a horizontal orientation (persisted as -1);
    /// such pieces use the identity transform.
    pub facing: Option<Facing>,
    /// Depth from the graph root; the recursion budget.
    pub chain_length: u32,
}

impl PieceBase {
    pub fn new(bounding_box: BoundingBox, facing: Option<Facing>, chain_length: u32) -> Self {
        PieceBase {
            bounding_box,
            facing,
            chain_length,
        }
    }

    fn facing_or_south(&self) -> Facing {
        self.facing.unwrap_or(Facing::South)
    }

    pub fn world_pos(&self, lx: i32, ly: i32, lz: i32) -> IVec3 {
        geom::world_pos(self.facing_or_south(), &self.bounding_box, lx, ly, lz)
    }

    /// Writes one block at a piece-local offset, silently dropped outside `clip`.
    pub fn place<W: WorldPainter>(
        &self,
        world: &mut W,
        clip: &BoundingBox,
        lx: i32,
        ly: i32,
        lz: i32,
        state: BlockState,
    ) {
        let pos = self.world_pos(lx, ly, lz);
        if clip.contains(pos) {
            world.set_block(pos, state, 2);
        }
    }

    /// Reads the block at a piece-local offset; offsets outside `clip` read as air.
    pub fn probe<W: WorldPainter>(
        &self,
        world: &W,
        clip: &BoundingBox,
        lx: i32,
        ly: i32,
        lz: i32,
    ) -> BlockState {
        let pos = self.world_pos(lx, ly, lz);
        if clip.contains(pos) {
            world.block_at(pos)
        } else {
            BlockState::Air
        }
    }

    /// Fills the local box `lo..=hi` with one state.
    pub fn fill<W: WorldPainter>(
        &self,
        world: &mut W,
        clip: &BoundingBox,
        lo: (i32, i32, i32),
        hi: (i32, i32, i32),
        state: BlockState,
    ) {
        for ly in lo.1..=hi.1 {
            for lz in lo.2..=hi.2 {
                for lx in lo.0..=hi.0 {
                    self.place(world, clip, lx, ly, lz, state);
                }
            }
        }
    }

    /// Fills the boundary of the local box with `shell` and its inside with
    /// `interior`.
    pub fn fill_shell<W: WorldPainter>(
        &self,
        world: &mut W,
        clip: &BoundingBox,
        lo: (i32, i32, i32),
        hi: (i32, i32, i32),
        shell: BlockState,
        interior: BlockState,
    ) {
        for ly in lo.1..=hi.1 {
            for lz in lo.2..=hi.2 {
                for lx in lo.0..=hi.0 {
                    let on_shell = lx == lo.0
                        || lx == hi.0
                        || ly == lo.1
                        || ly == hi.1
                        || lz == lo.2
                        || lz == hi.2;
                    let state = if on_shell { shell } else { interior };
                    self.place(world, clip, lx, ly, lz, state);
                }
            }
        }
    }

    /// Like [`PieceBase::fill_shell`], drawing each shell block from `pick`.
    /// Iteration order is fixed (y, then z, then x), so the per-block draws
    /// consume the stream in a declared order.
    pub fn fill_shell_with<W, R, F>(
        &self,
        world: &mut W,
        clip: &BoundingBox,
        lo: (i32, i32, i32),
        hi: (i32, i32, i32),
        rng: &mut R,
        interior: BlockState,
        mut pick: F,
    ) where
        W: WorldPainter,
        R: Rng,
        F: FnMut(&mut R) -> BlockState,
    {
        for ly in lo.1..=hi.1 {
            for lz in lo.2..=hi.2 {
                for lx in lo.0..=hi.0 {
                    let pos = self.world_pos(lx, ly, lz);
                    if !clip.contains(pos) {
                        continue;
                    }
                    let on_shell = lx == lo.0
                        || lx == hi.0
                        || ly == lo.1
                        || ly == hi.1
                        || lz == lo.2
                        || lz == hi.2;
                    let state = if on_shell { pick(rng) } else { interior };
                    world.set_block(pos, state, 2);
                }
            }
        }
    }

    /// Liquid-adjacency precheck: true when any block on the shell of `clip`
    /// is liquid. Pieces that abort on this contribute no blocks for the call
    /// but stay in the graph.
    pub fn touches_liquid<W: WorldPainter>(&self, world: &W, clip: &BoundingBox) -> bool {
        let (min, max) = (clip.min, clip.max);
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    let on_shell = x == min.x
                        || x == max.x
                        || y == min.y
                        || y == max.y
                        || z == min.z
                        || z == max.z;
                    if on_shell && world.block_at(IVec3::new(x, y, z)).is_liquid() {
                        return true;
                    }
                }
            }
        }
        false
    }
}

/// Finds the first existing piece whose box intersects `bb`.
pub fn collision<'a, P: StructurePiece>(pieces: &'a [P], bb: &BoundingBox) -> Option<&'a P> {
    pieces
        .iter()
        .find(|p| p.base().bounding_box.intersects(bb))
}

/// The polymorphic contract one structure family's tagged union implements.
///
/// Kinds are a closed set fixed at compile time; dispatch happens by matching
/// on the union, and on load purely by the record's kind tag.
pub trait StructurePiece: Clone + Sized {
    type Kind: Copy + PartialEq + std::fmt::Debug;

    /// Maximum chain length (depth from the root) this family allows.
    const CHAIN_CAP: u32;
    /// Maximum horizontal Chebyshev distance of a child anchor from the root.
    const RANGE_CAP: i32;
    /// Candidate boxes must keep `min.y` above this floor.
    const FLOOR_Y: i32;
    /// When true, a pick never draws the same kind as the piece being expanded.
    const FORBID_REPEAT: bool;

    fn base(&self) -> &PieceBase;

    fn kind(&self) -> Self::Kind;

    /// Tag for graphs that keep a named reference to a unique piece instance.
    fn notable_tag(&self) -> Option<&'static str> {
        None
    }

    /// Computes the kind's oriented box at `anchor`, rejects on overlap or
    /// out-of-bounds, and rolls the kind-specific sub-choices that the record
    /// codec will persist verbatim.
    fn candidate<R: Rng>(
        kind: Self::Kind,
        existing: &[Self],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self>;

    /// The minimal deterministic connector tried after the weighted retries
    /// are spent, shrinking from full length down to 1. `None` means the
    /// opening becomes a dead end.
    fn fallback<R: Rng>(
        existing: &[Self],
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
    ) -> Option<Self>;

    /// Declares this kind's child openings, in fixed declaration order
    /// (forward first, then sides), recursing through the builder.
    fn fill_openings<R: Rng>(
        &self,
        graph: &mut StructureGraph<Self>,
        builder: &mut LayoutBuilder<Self>,
        rng: &mut R,
    );

    /// Paints this piece's blocks restricted to `clip` (its box intersected
    /// with the chunk being realized). Returns false when painting was
    /// suppressed for this invocation.
    fn generate<W: WorldPainter, R: Rng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        clip: &BoundingBox,
        chunk: ChunkPos,
    ) -> bool;

    fn to_record(&self) -> PieceRecord;

    fn from_record(record: &PieceRecord) -> Result<Self, RecordError>;
}

/// Kind-specific persisted fields, all named integers (flags are 0/1).
pub type RecordData = BTreeMap<String, i64>;

/// One persisted piece: kind tag, box, facing index (-1 = none), chain
/// length, and the kind-specific fields. Sufficient to rebuild a fully laid
/// out piece on load without re-rolling any randomness.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PieceRecord {
    pub id: String,
    pub bb: [i32; 6],
    pub o: i8,
    pub gd: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: RecordData,
}

impl PieceRecord {
    pub fn new(id: &str, base: &PieceBase) -> Self {
        PieceRecord {
            id: id.to_owned(),
            bb: base.bounding_box.to_array(),
            o: base.facing.map(Facing::index).unwrap_or(-1),
            gd: base.chain_length,
            data: RecordData::new(),
        }
    }

    pub fn with(mut self, key: &str, value: i64) -> Self {
        self.data.insert(key.to_owned(), value);
        self
    }

    pub fn with_flag(self, key: &str, value: bool) -> Self {
        self.with(key, value as i64)
    }

    /// Required kind-specific field; absence is a decode error.
    pub fn field(&self, key: &'static str) -> Result<i64, RecordError> {
        self.data.get(key).copied().ok_or(RecordError::MissingField {
            field: key,
            id: self.id.clone(),
        })
    }

    /// Optional boolean field, absent means false.
    pub fn flag(&self, key: &str) -> bool {
        self.data.get(key).map(|&v| v != 0).unwrap_or(false)
    }

    /// Reconstructs the shared fields, validating box and facing index.
    pub fn base(&self) -> Result<PieceBase, RecordError> {
        let bounding_box = BoundingBox::from_array(self.bb).ok_or(RecordError::BadBox(self.bb))?;
        let facing = match self.o {
            -1 => None,
            i => Some(Facing::from_index(i).ok_or(RecordError::BadFacing(i))?),
        };
        Ok(PieceBase {
            bounding_box,
            facing,
            chain_length: self.gd,
        })
    }
}

/// Why a persisted structure graph could not be reconstructed. All of these
/// are fatal for the structure instance: later pieces' opening coordinates
/// assume every earlier piece is present.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unrecognized piece kind tag `{0}`")]
    UnknownKind(String),
    #[error("bounding box has min > max on an axis: {0:?}")]
    BadBox([i32; 6]),
    #[error("facing index {0} out of range")]
    BadFacing(i8),
    #[error("record `{id}` is missing field `{field}`")]
    MissingField { field: &'static str, id: String },
    #[error("record `{id}` field `{field}` holds invalid value {value}")]
    BadField {
        field: &'static str,
        id: String,
        value: i64,
    },
    #[error("unreadable record list: {0}")]
    Syntax(String),
    #[error("record list holds no pieces")]
    Empty,
}
