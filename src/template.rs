//! Boundary traits for the pre-authored template subsystem. Pieces may
//! delegate interior decoration to a template, but loading and stamping live
//! outside this crate.

use crate::geom::BoundingBox;
use crate::painter::WorldPainter;

use glam::IVec3;
use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Counterclockwise90,
}

impl Rotation {
    pub fn index(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Counterclockwise90 => 3,
        }
    }

    pub fn from_index(index: i64) -> Option<Rotation> {
        match index {
            0 => Some(Rotation::None),
            1 => Some(Rotation::Clockwise90),
            2 => Some(Rotation::Clockwise180),
            3 => Some(Rotation::Counterclockwise90),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mirror {
    None,
    LeftRight,
    FrontBack,
}

impl Mirror {
    pub fn index(self) -> i64 {
        match self {
            Mirror::None => 0,
            Mirror::LeftRight => 1,
            Mirror::FrontBack => 2,
        }
    }

    pub fn from_index(index: i64) -> Option<Mirror> {
        match index {
            0 => Some(Mirror::None),
            1 => Some(Mirror::LeftRight),
            2 => Some(Mirror::FrontBack),
            _ => None,
        }
    }
}

/// A loaded template, ready to stamp into the world.
pub trait Template {
    fn size(&self) -> IVec3;

    /// Stamps the template at `origin`, rotated and mirrored around `pivot`,
    /// clipped to `clip`. `merge_flags` is forwarded to the block writes.
    /// Returns false when nothing was placed.
    #[allow(clippy::too_many_arguments)]
    fn place<W: WorldPainter, R: Rng>(
        &self,
        world: &mut W,
        origin: IVec3,
        pivot: IVec3,
        rotation: Rotation,
        mirror: Mirror,
        clip: &BoundingBox,
        rng: &mut R,
        merge_flags: u32,
    ) -> bool;
}

/// Loads templates by identifier.
pub trait TemplateStore {
    type Template: Template;

    fn load(&self, identifier: &str) -> Option<Self::Template>;
}
