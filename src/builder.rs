//! The recursive expansion algorithm: weighted kind selection with retries,
//! the shrinking fallback connector, and the depth and distance bounds that
//! guarantee termination.

use crate::catalog::PieceCatalog;
use crate::geom::{chebyshev_xz, Facing};
use crate::graph::StructureGraph;
use crate::piece::StructurePiece;

use glam::IVec3;
use rand::Rng;

/// Attempts at drawing a weighted kind before falling back to the family's
/// connector piece. The count shapes the statistical distribution of layouts;
/// do not tune it casually.
pub const MAX_PICK_TRIES: usize = 5;

/// Drives one graph build. Owns the catalog (quota counters are global across
/// the build) and the one-shot forced kind; two concurrent builds must each
/// have their own builder.
pub struct LayoutBuilder<P: StructurePiece> {
    catalog: PieceCatalog<P::Kind>,
    forced_kind: Option<P::Kind>,
}

impl<P: StructurePiece> LayoutBuilder<P> {
    pub fn new(catalog: PieceCatalog<P::Kind>) -> Self {
        LayoutBuilder {
            catalog,
            forced_kind: None,
        }
    }

    pub fn catalog(&self) -> &PieceCatalog<P::Kind> {
        &self.catalog
    }

    /// Forces the next pick to try `kind` first. Consumed by exactly one
    /// pick; scoped to this build.
    pub fn force_next(&mut self, kind: P::Kind) {
        self.forced_kind = Some(kind);
    }

    /// Tries to grow one child piece at `anchor`, then recurses through the
    /// new piece's own openings, depth first. Refuses silently when the chain
    /// or distance budget is spent; a refusal is never an error.
    pub fn grow_from<R: Rng>(
        &mut self,
        graph: &mut StructureGraph<P>,
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
        previous: Option<P::Kind>,
    ) {
        if chain_length > P::CHAIN_CAP {
            log::debug!("chain cap {} reached at {:?}", P::CHAIN_CAP, anchor);
            return;
        }
        let root_anchor = graph.root().base().bounding_box.min;
        if chebyshev_xz(anchor, root_anchor) > P::RANGE_CAP {
            log::debug!("range cap {} reached at {:?}", P::RANGE_CAP, anchor);
            return;
        }

        if let Some(piece) = self.pick_piece(graph, rng, anchor, facing, chain_length, previous) {
            graph.push(piece.clone());
            piece.fill_openings(graph, self, rng);
        }
    }

    /// The retry/fallback policy: the forced kind if one is pending, then up
    /// to [`MAX_PICK_TRIES`] weighted draws, then the shrinking connector.
    /// `None` means this opening dead-ends.
    fn pick_piece<R: Rng>(
        &mut self,
        graph: &StructureGraph<P>,
        rng: &mut R,
        anchor: IVec3,
        facing: Facing,
        chain_length: u32,
        previous: Option<P::Kind>,
    ) -> Option<P> {
        if let Some(kind) = self.forced_kind.take() {
            if let Some(piece) =
                P::candidate(kind, graph.pieces(), rng, anchor, facing, chain_length)
            {
                self.catalog.note_generated(kind);
                return Some(piece);
            }
            log::debug!("forced kind {:?} did not fit at {:?}", kind, anchor);
        }

        let exclude = if P::FORBID_REPEAT { previous } else { None };
        for _ in 0..MAX_PICK_TRIES {
            // An empty draw pool means the catalog is exhausted; expansion
            // halts at this opening without a connector.
            let kind = self.catalog.pick(rng, exclude)?;
            if let Some(piece) =
                P::candidate(kind, graph.pieces(), rng, anchor, facing, chain_length)
            {
                self.catalog.note_generated(kind);
                return Some(piece);
            }
        }

        let piece = P::fallback(graph.pieces(), rng, anchor, facing, chain_length);
        if piece.is_none() {
            log::debug!("dead end at {:?}", anchor);
        }
        piece
    }
}
