//! Pure coordinate math for structure pieces: the four horizontal facings, the
//! inclusive integer bounding box, and the local-to-world transforms every
//! piece kind shares.

use glam::IVec3;

/// One of the four horizontal compass directions a piece can face.
///
/// A piece's facing determines the rotation and mirror applied to its fixed
/// local-offset tables, both when carving blocks and when anchoring children.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

pub const ALL_FACINGS: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

impl Facing {
    pub fn index(self) -> i8 {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    pub fn from_index(index: i8) -> Option<Facing> {
        match index {
            0 => Some(Facing::North),
            1 => Some(Facing::East),
            2 => Some(Facing::South),
            3 => Some(Facing::West),
            _ => None,
        }
    }

}

/// Axis-aligned integer box, inclusive on both ends.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BoundingBox {
    pub min: IVec3,
    pub max: IVec3,
}

impl BoundingBox {
    /// Callers must uphold `min <= max` per axis; use [`BoundingBox::from_corners`]
    /// for unsorted input.
    pub fn new(min: IVec3, max: IVec3) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y && min.z <= max.z);
        BoundingBox { min, max }
    }

    pub fn from_corners(a: IVec3, b: IVec3) -> Self {
        BoundingBox {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a candidate box for a piece anchored at `anchor` and facing
    /// `facing`. `offset` is the local minimum corner relative to the anchor
    /// (x across the opening, y up, z forward into the piece) and `size` is the
    /// piece's local dimensions; the local box is rotated and mirrored into
    /// world space so that local +z always points away from the opening face.
    pub fn oriented(anchor: IVec3, offset: IVec3, size: IVec3, facing: Facing) -> Self {
        debug_assert!(size.x > 0 && size.y > 0 && size.z > 0);
        let lo = offset;
        let hi = offset + size - IVec3::new(1, 1, 1);
        let (min, max) = match facing {
            Facing::South => (
                IVec3::new(anchor.x + lo.x, anchor.y + lo.y, anchor.z + lo.z),
                IVec3::new(anchor.x + hi.x, anchor.y + hi.y, anchor.z + hi.z),
            ),
            Facing::North => (
                IVec3::new(anchor.x + lo.x, anchor.y + lo.y, anchor.z - hi.z),
                IVec3::new(anchor.x + hi.x, anchor.y + hi.y, anchor.z - lo.z),
            ),
            Facing::West => (
                IVec3::new(anchor.x - hi.z, anchor.y + lo.y, anchor.z + lo.x),
                IVec3::new(anchor.x - lo.z, anchor.y + hi.y, anchor.z + hi.x),
            ),
            Facing::East => (
                IVec3::new(anchor.x + lo.z, anchor.y + lo.y, anchor.z + lo.x),
                IVec3::new(anchor.x + hi.z, anchor.y + hi.y, anchor.z + hi.x),
            ),
        };
        BoundingBox { min, max }
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if self.intersects(other) {
            Some(BoundingBox {
                min: self.min.max(other.min),
                max: self.max.min(other.max),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn size(&self) -> IVec3 {
        self.max - self.min + IVec3::new(1, 1, 1)
    }

    pub fn to_array(&self) -> [i32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    pub fn from_array(a: [i32; 6]) -> Option<BoundingBox> {
        if a[0] <= a[3] && a[1] <= a[4] && a[2] <= a[5] {
            Some(BoundingBox {
                min: IVec3::new(a[0], a[1], a[2]),
                max: IVec3::new(a[3], a[4], a[5]),
            })
        } else {
            None
        }
    }
}

/// Maps a piece-local x offset to a world x coordinate.
pub fn world_x(facing: Facing, bb: &BoundingBox, lx: i32, lz: i32) -> i32 {
    match facing {
        Facing::North | Facing::South => bb.min.x + lx,
        Facing::West => bb.max.x - lz,
        Facing::East => bb.min.x + lz,
    }
}

/// Maps a piece-local y offset to a world y coordinate.
pub fn world_y(bb: &BoundingBox, ly: i32) -> i32 {
    bb.min.y + ly
}

/// Maps a piece-local z offset to a world z coordinate.
pub fn world_z(facing: Facing, bb: &BoundingBox, lx: i32, lz: i32) -> i32 {
    match facing {
        Facing::North => bb.max.z - lz,
        Facing::South => bb.min.z + lz,
        Facing::West | Facing::East => bb.min.z + lx,
    }
}

pub fn world_pos(facing: Facing, bb: &BoundingBox, lx: i32, ly: i32, lz: i32) -> IVec3 {
    IVec3::new(
        world_x(facing, bb, lx, lz),
        world_y(bb, ly),
        world_z(facing, bb, lx, lz),
    )
}

/// Horizontal Chebyshev distance between two anchors.
pub fn chebyshev_xz(a: IVec3, b: IVec3) -> i32 {
    (a.x - b.x).abs().max((a.z - b.z).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oriented_box_south_is_identity() {
        let bb = BoundingBox::oriented(
            IVec3::new(10, 20, 30),
            IVec3::new(-1, -1, 0),
            IVec3::new(5, 5, 7),
            Facing::South,
        );

        assert_eq!(bb.min, IVec3::new(9, 19, 30));
        assert_eq!(bb.max, IVec3::new(13, 23, 36));
    }

    #[test]
    fn test_oriented_box_preserves_size_under_every_facing() {
        for &facing in ALL_FACINGS.iter() {
            let bb = BoundingBox::oriented(
                IVec3::new(0, 64, 0),
                IVec3::new(-1, -1, 0),
                IVec3::new(5, 5, 7),
                facing,
            );
            let size = bb.size();
            assert_eq!(size.y, 5);
            // Width and depth swap roles for east/west.
            match facing {
                Facing::North | Facing::South => assert_eq!((size.x, size.z), (5, 7)),
                Facing::East | Facing::West => assert_eq!((size.x, size.z), (7, 5)),
            }
        }
    }

    #[test]
    fn test_oriented_box_grows_away_from_opening() {
        let anchor = IVec3::new(0, 0, 0);
        let off = IVec3::new(0, 0, 0);
        let size = IVec3::new(1, 1, 4);

        let north = BoundingBox::oriented(anchor, off, size, Facing::North);
        assert_eq!((north.min.z, north.max.z), (-3, 0));

        let west = BoundingBox::oriented(anchor, off, size, Facing::West);
        assert_eq!((west.min.x, west.max.x), (-3, 0));
    }

    #[test]
    fn test_world_pos_round_trips_the_far_corner() {
        for &facing in ALL_FACINGS.iter() {
            let bb = BoundingBox::oriented(
                IVec3::new(4, 8, -3),
                IVec3::new(-1, 0, 0),
                IVec3::new(3, 3, 10),
                facing,
            );
            // Local (0, 0, 0) and the local supremum must both land inside.
            assert!(bb.contains(world_pos(facing, &bb, 0, 0, 0)));
            assert!(bb.contains(world_pos(facing, &bb, 2, 2, 9)));
            // And the local origin must sit on the opening face.
            let origin = world_pos(facing, &bb, 0, 0, 0);
            match facing {
                Facing::South => assert_eq!(origin.z, bb.min.z),
                Facing::North => assert_eq!(origin.z, bb.max.z),
                Facing::East => assert_eq!(origin.x, bb.min.x),
                Facing::West => assert_eq!(origin.x, bb.max.x),
            }
        }
    }

    #[test]
    fn test_intersection_is_symmetric_and_clipped() {
        let a = BoundingBox::from_corners(IVec3::new(0, 0, 0), IVec3::new(10, 10, 10));
        let b = BoundingBox::from_corners(IVec3::new(5, 5, 5), IVec3::new(20, 20, 20));

        let ab = a.intersection(&b).unwrap();
        assert_eq!(ab, b.intersection(&a).unwrap());
        assert_eq!(ab.min, IVec3::new(5, 5, 5));
        assert_eq!(ab.max, IVec3::new(10, 10, 10));

        let far = BoundingBox::from_corners(IVec3::new(50, 0, 0), IVec3::new(60, 10, 10));
        assert!(a.intersection(&far).is_none());
        // Inclusive boxes: sharing a single plane still counts as touching.
        let touch = BoundingBox::from_corners(IVec3::new(10, 0, 0), IVec3::new(12, 10, 10));
        assert!(a.intersects(&touch));
    }

    #[test]
    fn test_facing_index_codec() {
        for &f in ALL_FACINGS.iter() {
            assert_eq!(Facing::from_index(f.index()), Some(f));
        }
        assert_eq!(Facing::from_index(-1), None);
        assert_eq!(Facing::from_index(4), None);
    }

    #[test]
    fn test_bad_box_array_is_rejected() {
        assert!(BoundingBox::from_array([0, 0, 0, -1, 5, 5]).is_none());
        assert!(BoundingBox::from_array([3, 1, 2, 3, 1, 2]).is_some());
    }
}
