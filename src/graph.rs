//! The built structure: a root piece plus every piece in creation order.
//! Immutable once built, except for the painting bookkeeping inside pieces;
//! serializes to a flat list of piece records and reloads straight into the
//! expanded state, without replaying the layout algorithm.

use crate::geom::BoundingBox;
use crate::painter::{ChunkPos, WorldPainter};
use crate::piece::{self, PieceRecord, RecordError, StructurePiece};

use fnv::FnvHashMap;
use rand::Rng;

pub struct StructureGraph<P> {
    pieces: Vec<P>,
    named: FnvHashMap<&'static str, usize>,
}

impl<P: StructurePiece> StructureGraph<P> {
    pub fn new(root: P) -> Self {
        let mut graph = StructureGraph {
            pieces: Vec::new(),
            named: FnvHashMap::default(),
        };
        graph.push(root);
        graph
    }

    pub fn root(&self) -> &P {
        &self.pieces[0]
    }

    pub fn pieces(&self) -> &[P] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The unique piece registered under `tag`, if this graph generated one.
    pub fn named(&self, tag: &str) -> Option<&P> {
        self.named.get(tag).map(|&i| &self.pieces[i])
    }

    /// First existing piece whose box intersects `bb`. Candidates consult
    /// this; it is the only place the non-overlap invariant is enforced.
    pub fn collision(&self, bb: &BoundingBox) -> Option<&P> {
        piece::collision(&self.pieces, bb)
    }

    /// Appends a piece. Pieces are only ever appended, never removed.
    pub(crate) fn push(&mut self, piece: P) -> usize {
        let index = self.pieces.len();
        if let Some(tag) = piece.notable_tag() {
            self.named.insert(tag, index);
        }
        self.pieces.push(piece);
        index
    }

    /// Paints every piece whose box intersects `chunk`, clipped to that
    /// chunk. Lazy and chunk-scoped: callers invoke this once per realized
    /// chunk, in any order, possibly long after the build. Returns how many
    /// pieces contributed blocks.
    pub fn paint_chunk<W: WorldPainter, R: Rng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        chunk: ChunkPos,
    ) -> usize {
        let chunk_box = chunk.block_box();
        let mut painted = 0;
        for piece in self.pieces.iter_mut() {
            if let Some(clip) = piece.base().bounding_box.intersection(&chunk_box) {
                if piece.generate(world, rng, &clip, chunk) {
                    painted += 1;
                }
            }
        }
        painted
    }

    pub fn encode(&self) -> Vec<PieceRecord> {
        self.pieces.iter().map(P::to_record).collect()
    }

    /// Rebuilds a graph from records, dispatching purely on each record's
    /// kind tag. Named references are rebuilt by scanning tags. Any
    /// unrecognized tag or malformed record is fatal for the whole structure
    /// instance.
    pub fn decode(records: &[PieceRecord]) -> Result<Self, RecordError> {
        if records.is_empty() {
            return Err(RecordError::Empty);
        }
        let mut graph = StructureGraph {
            pieces: Vec::with_capacity(records.len()),
            named: FnvHashMap::default(),
        };
        for record in records {
            let piece = P::from_record(record)?;
            graph.push(piece);
        }
        log::debug!("decoded structure graph of {} pieces", graph.len());
        Ok(graph)
    }

    pub fn to_ron_string(&self) -> Result<String, RecordError> {
        ron::ser::to_string(&self.encode()).map_err(|e| RecordError::Syntax(e.to_string()))
    }

    pub fn from_ron_str(s: &str) -> Result<Self, RecordError> {
        let records: Vec<PieceRecord> =
            ron::de::from_str(s).map_err(|e| RecordError::Syntax(e.to_string()))?;
        Self::decode(&records)
    }
}
