//! In-memory [`WorldPainter`] and template doubles shared by the unit tests.

use crate::geom::BoundingBox;
use crate::painter::{BlockState, Heightmap, WorldPainter};
use crate::template::{Mirror, Rotation, Template, TemplateStore};

use fnv::{FnvHashMap, FnvHashSet};
use glam::IVec3;
use rand::Rng;

/// A sparse voxel world. Unset blocks read as air, flooded ones as water.
pub struct MemoryPainter {
    pub blocks: FnvHashMap<(i32, i32, i32), BlockState>,
    pub liquid: FnvHashSet<(i32, i32, i32)>,
    pub loot: Vec<(IVec3, String, i64)>,
    pub spawners: Vec<(IVec3, String)>,
    /// Flat terrain height reported for every column.
    pub surface_y: i32,
}

impl MemoryPainter {
    pub fn new() -> Self {
        MemoryPainter {
            blocks: FnvHashMap::default(),
            liquid: FnvHashSet::default(),
            loot: Vec::new(),
            spawners: Vec::new(),
            surface_y: 64,
        }
    }

    /// Marks every block in `bb` as water until something overwrites it.
    pub fn flood(&mut self, bb: &BoundingBox) {
        for y in bb.min.y..=bb.max.y {
            for z in bb.min.z..=bb.max.z {
                for x in bb.min.x..=bb.max.x {
                    self.liquid.insert((x, y, z));
                }
            }
        }
    }
}

impl WorldPainter for MemoryPainter {
    fn set_block(&mut self, pos: IVec3, state: BlockState, _flags: u32) {
        self.blocks.insert((pos.x, pos.y, pos.z), state);
    }

    fn block_at(&self, pos: IVec3) -> BlockState {
        let key = (pos.x, pos.y, pos.z);
        if let Some(&state) = self.blocks.get(&key) {
            state
        } else if self.liquid.contains(&key) {
            BlockState::Water
        } else {
            BlockState::Air
        }
    }

    fn top_surface_y(&self, _x: i32, _z: i32, _heightmap: Heightmap) -> i32 {
        self.surface_y
    }

    fn place_loot_container(&mut self, pos: IVec3, loot_table: &str, seed: i64) {
        self.loot.push((pos, loot_table.to_owned(), seed));
    }

    fn place_spawner(&mut self, pos: IVec3, mob: &str) {
        self.spawners.push((pos, mob.to_owned()));
    }
}

/// A template double that fills its whole box with one state, ignoring
/// rotation and mirroring.
#[derive(Clone)]
pub struct FixedTemplate {
    pub size: IVec3,
    pub block: BlockState,
}

impl Template for FixedTemplate {
    fn size(&self) -> IVec3 {
        self.size
    }

    fn place<W: WorldPainter, R: Rng>(
        &self,
        world: &mut W,
        origin: IVec3,
        _pivot: IVec3,
        _rotation: Rotation,
        _mirror: Mirror,
        clip: &BoundingBox,
        _rng: &mut R,
        flags: u32,
    ) -> bool {
        let mut placed = 0;
        for y in 0..self.size.y {
            for z in 0..self.size.z {
                for x in 0..self.size.x {
                    let pos = origin + IVec3::new(x, y, z);
                    if clip.contains(pos) {
                        world.set_block(pos, self.block, flags);
                        placed += 1;
                    }
                }
            }
        }
        placed > 0
    }
}

/// A store holding exactly one template.
pub struct SingleTemplateStore {
    pub identifier: String,
    pub template: FixedTemplate,
}

impl TemplateStore for SingleTemplateStore {
    type Template = FixedTemplate;

    fn load(&self, identifier: &str) -> Option<FixedTemplate> {
        if identifier == self.identifier {
            Some(self.template.clone())
        } else {
            None
        }
    }
}
