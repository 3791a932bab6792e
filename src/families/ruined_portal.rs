//! The ruined portal family: a single pre-authored template picked from ten
//! variants, randomly rotated and mirrored, sometimes buried. The template is
//! stamped through a [`TemplateStore`]; the piece itself only scatters the
//! rubble skirt around the footprint.

use crate::builder::LayoutBuilder;
use crate::geom::{BoundingBox, Facing};
use crate::graph::StructureGraph;
use crate::painter::{BlockState, ChunkPos, WorldPainter};
use crate::piece::{PieceBase, PieceRecord, RecordError, StructurePiece};
use crate::template::{Mirror, Rotation, Template, TemplateStore};

use glam::IVec3;
use rand::Rng;

pub const VARIANTS: i64 = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuinedPortalKind {
    Portal,
}

/// Rolls the variant, orientation, and burial, and fixes the footprint box.
/// `template_size` is the unrotated size of the chosen variant's template, so
/// the caller loads the template once before building (variant selection is
/// deterministic in `rng`, see [`roll_variant`]).
pub fn build<R: Rng>(
    rng: &mut R,
    x: i32,
    z: i32,
    surface_y: i32,
    template_size: IVec3,
) -> StructureGraph<RuinedPortalPiece> {
    let variant = roll_variant(rng);
    let rotation = match rng.gen_range(0, 4) {
        0 => Rotation::None,
        1 => Rotation::Clockwise90,
        2 => Rotation::Clockwise180,
        _ => Rotation::Counterclockwise90,
    };
    let mirror = match rng.gen_range(0, 3) {
        0 => Mirror::None,
        1 => Mirror::LeftRight,
        _ => Mirror::FrontBack,
    };
    let buried = rng.gen_bool(0.5);

    // A quarter-turn swaps the horizontal footprint.
    let (sx, sz) = match rotation {
        Rotation::Clockwise90 | Rotation::Counterclockwise90 => {
            (template_size.z, template_size.x)
        }
        _ => (template_size.x, template_size.z),
    };
    // Buried portals sink so only the frame top breaks the surface.
    let min_y = if buried {
        surface_y - template_size.y + 2
    } else {
        surface_y
    };
    let bb = BoundingBox::new(
        IVec3::new(x, min_y, z),
        IVec3::new(x + sx - 1, min_y + template_size.y - 1, z + sz - 1),
    );
    log::debug!("ruined portal variant {} at ({}, {}, {})", variant, x, min_y, z);

    StructureGraph::new(RuinedPortalPiece::Portal(Portal {
        base: PieceBase::new(bb, None, 0),
        variant,
        rotation,
        mirror,
        buried,
    }))
}

/// The variant draw, exposed so callers can pre-load the matching template
/// from the same rng before calling [`build`].
pub fn roll_variant<R: Rng>(rng: &mut R) -> i64 {
    rng.gen_range(1, VARIANTS + 1)
}

/// Stamps the portal template for one chunk, then paints the rubble skirt.
/// Template stamping cannot live in [`StructurePiece::generate`] because it
/// needs the store; callers realizing a chunk call this instead of
/// [`StructureGraph::paint_chunk`]. Returns false when the store has no
/// template for the piece's variant.
pub fn paint_chunk_with<S, W, R>(
    graph: &mut StructureGraph<RuinedPortalPiece>,
    store: &S,
    world: &mut W,
    rng: &mut R,
    chunk: ChunkPos,
) -> bool
where
    S: TemplateStore,
    W: WorldPainter,
    R: Rng,
{
    let RuinedPortalPiece::Portal(portal) = graph.root().clone();
    let clip = match portal.base.bounding_box.intersection(&chunk.block_box()) {
        Some(clip) => clip,
        None => return false,
    };
    let template = match store.load(&portal.template_identifier()) {
        Some(t) => t,
        None => {
            log::warn!("no template `{}`", portal.template_identifier());
            return false;
        }
    };
    let size = template.size();
    let pivot = IVec3::new(size.x / 2, 0, size.z / 2);
    let placed = template.place(
        world,
        portal.base.bounding_box.min,
        pivot,
        portal.rotation,
        portal.mirror,
        &clip,
        rng,
        2,
    );
    graph.paint_chunk(world, rng, chunk);
    placed
}

#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    pub base: PieceBase,
    pub variant: i64,
    pub rotation: Rotation,
    pub mirror: Mirror,
    pub buried: bool,
}

impl Portal {
    pub fn template_identifier(&self) -> String {
        format!("ruined_portal/portal_{}", self.variant)
    }

    /// The netherrack skirt: scattered blocks one layer below the footprint,
    /// denser toward the center.
    fn paint_rubble<W: WorldPainter, R: Rng>(&self, world: &mut W, rng: &mut R, clip: &BoundingBox) {
        let bb = self.base.bounding_box;
        for z in bb.min.z..=bb.max.z {
            for x in bb.min.x..=bb.max.x {
                let pos = IVec3::new(x, bb.min.y - 1, z);
                if !clip.contains(pos) {
                    continue;
                }
                let on_edge = x == bb.min.x || x == bb.max.x || z == bb.min.z || z == bb.max.z;
                let chance = if on_edge { 4 } else { 2 };
                if rng.gen_range(0, chance) == 0 && !world.block_at(pos).is_liquid() {
                    world.set_block(pos, BlockState::Netherrack, 2);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RuinedPortalPiece {
    Portal(Portal),
}

const TAG_PORTAL: &str = "RuinedPortal";

impl StructurePiece for RuinedPortalPiece {
    type Kind = RuinedPortalKind;

    // A ruined portal is a single piece; nothing ever chains off it.
    const CHAIN_CAP: u32 = 0;
    const RANGE_CAP: i32 = 0;
    const FLOOR_Y: i32 = crate::painter::WORLD_MIN_Y;
    const FORBID_REPEAT: bool = false;

    fn base(&self) -> &PieceBase {
        let RuinedPortalPiece::Portal(p) = self;
        &p.base
    }

    fn kind(&self) -> RuinedPortalKind {
        RuinedPortalKind::Portal
    }

    fn candidate<R: Rng>(
        _kind: RuinedPortalKind,
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
        let RuinedPortalPiece::Portal(p) = self;
        p.paint_rubble(world, rng, clip);
        true
    }

    fn to_record(&self) -> PieceRecord {
        let RuinedPortalPiece::Portal(p) = self;
        PieceRecord::new(TAG_PORTAL, &p.base)
            .with("Variant", p.variant)
            .with("Rot", p.rotation.index())
            .with("Mi", p.mirror.index())
            .with_flag("Buried", p.buried)
    }

    fn from_record(record: &PieceRecord) -> Result<Self, RecordError> {
        if record.id != TAG_PORTAL {
            return Err(RecordError::UnknownKind(record.id.clone()));
        }
        let base = record.base()?;
        let variant = record.field("Variant")?;
        if !(1..=VARIANTS).contains(&variant) {
            return Err(RecordError::BadField {
                field: "Variant",
                id: record.id.clone(),
                value: variant,
            });
        }
        let rot = record.field("Rot")?;
        let rotation = Rotation::from_index(rot).ok_or(RecordError::BadField {
            field: "Rot",
            id: record.id.clone(),
            value: rot,
        })?;
        let mi = record.field("Mi")?;
        let mirror = Mirror::from_index(mi).ok_or(RecordError::BadField {
            field: "Mi",
            id: record.id.clone(),
            value: mi,
        })?;
        Ok(RuinedPortalPiece::Portal(Portal {
            base,
            variant,
            rotation,
            mirror,
            buried: record.flag("Buried"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::small_rng;
    use crate::test_support::{FixedTemplate, MemoryPainter, SingleTemplateStore};

    fn built() -> StructureGraph<RuinedPortalPiece> {
        let mut rng = small_rng([7, 7, 7, 7]);
        build(&mut rng, 3, 5, 64, IVec3::new(7, 8, 9))
    }

    #[test]
    fn test_portal_is_a_single_unoriented_piece() {
        let graph = built();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.root().base().facing, None);
        assert_eq!(graph.root().base().chain_length, 0);
        assert_eq!(graph.encode()[0].o, -1);
    }

    #[test]
    fn test_quarter_turns_swap_the_footprint() {
        for seed in 0..16 {
            let mut rng = small_rng([seed, 1, 2, 3]);
            let graph = build(&mut rng, 0, 0, 60, IVec3::new(7, 8, 9));
            let RuinedPortalPiece::Portal(p) = graph.root();
            let size = p.base.bounding_box.size();
            match p.rotation {
                Rotation::Clockwise90 | Rotation::Counterclockwise90 => {
                    assert_eq!((size.x, size.z), (9, 7));
                }
                _ => assert_eq!((size.x, size.z), (7, 9)),
            }
            assert_eq!(size.y, 8);
        }
    }

    #[test]
    fn test_record_round_trip_and_bad_orientation_is_fatal() {
        let graph = built();
        let records = graph.encode();
        let back = StructureGraph::<RuinedPortalPiece>::decode(&records).unwrap();
        assert_eq!(graph.pieces(), back.pieces());

        let mut bad = records.clone();
        bad[0].data.insert("Rot".to_owned(), 9);
        match StructureGraph::<RuinedPortalPiece>::decode(&bad) {
            Err(RecordError::BadField { field: "Rot", value: 9, .. }) => {}
            other => panic!("expected BadField, got {:?}", other.map(|g| g.len())),
        }

        let mut bad = records;
        bad[0].data.insert("Variant".to_owned(), 0);
        assert!(matches!(
            StructureGraph::<RuinedPortalPiece>::decode(&bad),
            Err(RecordError::BadField { field: "Variant", .. })
        ));
    }

    #[test]
    fn test_painting_stamps_the_template_once_per_chunk() {
        let mut graph = built();
        let origin = graph.root().base().bounding_box.min;
        let store = SingleTemplateStore {
            identifier: {
                let RuinedPortalPiece::Portal(p) = graph.root();
                p.template_identifier()
            },
            template: FixedTemplate {
                size: IVec3::new(7, 8, 9),
                block: BlockState::EndPortalFrame,
            },
        };
        let mut world = MemoryPainter::new();
        let mut rng = small_rng([9; 4]);
        let chunk = ChunkPos::containing(origin);

        assert!(paint_chunk_with(&mut graph, &store, &mut world, &mut rng, chunk));
        assert_eq!(world.block_at(origin), BlockState::EndPortalFrame);

        // An empty store means nothing can be stamped.
        let empty = SingleTemplateStore {
            identifier: "ruined_portal/none".to_owned(),
            template: FixedTemplate {
                size: IVec3::new(7, 8, 9),
                block: BlockState::EndPortalFrame,
            },
        };
        let mut bare = MemoryPainter::new();
        assert!(!paint_chunk_with(&mut graph, &empty, &mut bare, &mut rng, chunk));
    }
}
