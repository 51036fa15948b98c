//! Spatial hash broad phase
//!
//! Rectangles are bucketed by the grid cells their four corners fall in. The
//! cell size follows the objects: it is reset to twice the size of an object
//! that is more than twice the cell, or when the largest object is less than an
//! eighth of the cell. Either change relinks every tracked object.
//!
//! Cells between corners are not linked. Objects larger than one cell can miss
//! overlaps with small objects in the cells they span, see
//! [`SpatialHashMap::compute_collision`].
//!
//! Cell coordinates are folded into one lossy hash, so distinct cells can share
//! a bucket. Candidates from a bucket are always confirmed with an exact
//! rectangle test.

use ahash::AHashMap;
use brisk_core::{Entity, Rect2, Vec2, rectangles_overlap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{PhysicsError, PhysicsResult};

/// Hash of a grid cell
pub type CellHash = u32;

/// Spatial hash configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialHashConfig {
    /// Cell size before any object is inserted
    pub initial_cell_size: f32,
    /// Maximum hits a single collision query may return
    pub max_collisions: usize,
}

impl Default for SpatialHashConfig {
    fn default() -> Self {
        Self {
            initial_cell_size: 64.0,
            max_collisions: 32,
        }
    }
}

/// Per-entity record of its last rectangle and the cells it occupies
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialHashHandle {
    rect: Rect2,
    cells: SmallVec<[CellHash; 4]>,
}

impl SpatialHashHandle {
    /// Rectangle from the last insert or update
    pub fn rect(&self) -> Rect2 {
        self.rect
    }

    /// Distinct cells the rectangle's corners hash to
    pub fn cells(&self) -> &[CellHash] {
        &self.cells
    }
}

/// Entities overlapping a queried entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionResult {
    entities: SmallVec<[Entity; 8]>,
}

impl CollisionResult {
    /// Overlapping entities in discovery order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }
}

/// Grid-bucketed index of entity rectangles
#[derive(Debug)]
pub struct SpatialHashMap {
    cell_size: f32,
    largest_object_size: f32,
    max_collisions: usize,
    grid: AHashMap<CellHash, Vec<Entity>>,
    objects: AHashMap<Entity, SpatialHashHandle>,
}

/// Hash a position into its grid cell
pub fn spatial_hash(position: Vec2, cell_size: f32) -> CellHash {
    let x = (position.x / cell_size).floor() as i64;
    let y = (position.y / cell_size).floor() as i64;
    (x.wrapping_mul(x) ^ y.wrapping_mul(y)).rem_euclid(i64::from(i32::MAX)) as CellHash
}

/// Add `entity` to the cells of each corner of `rect`, skipping repeats
fn link(
    grid: &mut AHashMap<CellHash, Vec<Entity>>,
    cell_size: f32,
    entity: Entity,
    handle: &mut SpatialHashHandle,
    rect: Rect2,
) {
    handle.rect = rect;
    for corner in rect.corners() {
        let cell = spatial_hash(corner, cell_size);
        if handle.cells.contains(&cell) {
            continue;
        }
        handle.cells.push(cell);
        grid.entry(cell).or_default().push(entity);
    }
}

/// Remove `entity` from every cell in its handle
fn unlink(grid: &mut AHashMap<CellHash, Vec<Entity>>, entity: Entity, handle: &mut SpatialHashHandle) {
    for cell in handle.cells.drain(..) {
        if let Some(bucket) = grid.get_mut(&cell) {
            bucket.retain(|&e| e != entity);
            if bucket.is_empty() {
                grid.remove(&cell);
            }
        }
    }
}

impl SpatialHashMap {
    /// Create an empty map
    pub fn new(config: &SpatialHashConfig) -> Self {
        Self {
            cell_size: config.initial_cell_size,
            largest_object_size: 0.0,
            max_collisions: config.max_collisions,
            grid: AHashMap::new(),
            objects: AHashMap::new(),
        }
    }

    /// Create an empty map with the default collision cap
    pub fn with_cell_size(initial_cell_size: f32) -> Self {
        Self::new(&SpatialHashConfig {
            initial_cell_size,
            ..SpatialHashConfig::default()
        })
    }

    /// Current cell size
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Largest width or height seen among tracked objects
    pub fn largest_object_size(&self) -> f32 {
        self.largest_object_size
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of non-empty grid buckets
    pub fn bucket_count(&self) -> usize {
        self.grid.len()
    }

    /// Handle of a tracked entity
    pub fn get(&self, entity: Entity) -> Option<&SpatialHashHandle> {
        self.objects.get(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.objects.contains_key(&entity)
    }

    /// Entities in the bucket for `cell`
    pub fn bucket(&self, cell: CellHash) -> &[Entity] {
        self.grid.get(&cell).map_or(&[], Vec::as_slice)
    }

    /// Track `entity` at `rect`, or move it there if it is already tracked
    pub fn insert_or_update(&mut self, entity: Entity, rect: Rect2) -> &SpatialHashHandle {
        if self.change_cell_size_if_needed(&rect) {
            self.rebuild(entity);
        }

        let handle = self.objects.entry(entity).or_default();
        unlink(&mut self.grid, entity, handle);
        link(&mut self.grid, self.cell_size, entity, handle, rect);
        handle
    }

    fn change_cell_size_if_needed(&mut self, rect: &Rect2) -> bool {
        let object_max_size = rect.max_extent();
        if object_max_size > self.largest_object_size {
            self.largest_object_size = object_max_size;
        }

        // A degenerate rect would collapse the cell size to zero
        if object_max_size <= 0.0 {
            return false;
        }

        if object_max_size > self.cell_size * 2.0
            || self.largest_object_size < self.cell_size / 8.0
        {
            log::debug!(
                "Spatial hash cell size {} -> {} ({} objects to relink)",
                self.cell_size,
                object_max_size * 2.0,
                self.objects.len()
            );
            self.cell_size = object_max_size * 2.0;
            return true;
        }
        false
    }

    /// Relink every tracked entity except `skip` under the current cell size
    fn rebuild(&mut self, skip: Entity) {
        self.grid.clear();
        for (&entity, handle) in self.objects.iter_mut() {
            handle.cells.clear();
            if entity != skip {
                let rect = handle.rect;
                link(&mut self.grid, self.cell_size, entity, handle, rect);
            }
        }
    }

    /// Stop tracking an entity. Returns its last rectangle if it was tracked.
    pub fn remove(&mut self, entity: Entity) -> Option<Rect2> {
        let mut handle = self.objects.remove(&entity)?;
        unlink(&mut self.grid, entity, &mut handle);

        if handle.rect.max_extent() >= self.largest_object_size {
            self.largest_object_size = self
                .objects
                .values()
                .map(|other| other.rect.max_extent())
                .fold(0.0, f32::max);
        }
        Some(handle.rect)
    }

    /// Every other tracked entity whose rectangle overlaps `entity`'s.
    ///
    /// Untracked entities have no collisions.
    ///
    /// Only corner cells are linked, so an object wider than one cell can cover
    /// a middle cell without being bucketed there. A small object sitting wholly
    /// inside that middle cell is not reported even though the rectangles
    /// overlap. Cell resizing keeps objects within twice the cell size, which
    /// bounds the gap to a single column or row of cells.
    pub fn compute_collision(&self, entity: Entity) -> PhysicsResult<CollisionResult> {
        let mut result = CollisionResult::default();
        let Some(handle) = self.objects.get(&entity) else {
            return Ok(result);
        };

        let mut checked: SmallVec<[Entity; 16]> = SmallVec::new();
        for cell in &handle.cells {
            for &other in self.bucket(*cell) {
                if other == entity || checked.contains(&other) {
                    continue;
                }
                checked.push(other);

                let Some(other_handle) = self.objects.get(&other) else {
                    continue;
                };
                if rectangles_overlap(&handle.rect, &other_handle.rect) {
                    if result.entities.len() >= self.max_collisions {
                        return Err(PhysicsError::CollisionLimitReached {
                            entity,
                            max: self.max_collisions,
                        });
                    }
                    result.entities.push(other);
                }
            }
        }
        Ok(result)
    }

    /// Tracked entities and their handles, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &SpatialHashHandle)> {
        self.objects.iter().map(|(&entity, handle)| (entity, handle))
    }

    /// Stop tracking everything. The cell size is kept.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.objects.clear();
        self.largest_object_size = 0.0;
    }
}

impl Default for SpatialHashMap {
    fn default() -> Self {
        Self::new(&SpatialHashConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u32) -> Entity {
        Entity::from_raw(id)
    }

    /// Entities 1 and 2 overlap, entity 3 sits further out
    fn scenario() -> SpatialHashMap {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        map.insert_or_update(entity(1), Rect2::new(0.0, 0.0, 32.0, 32.0));
        map.insert_or_update(entity(2), Rect2::new(16.0, 16.0, 48.0, 48.0));
        map.insert_or_update(entity(3), Rect2::new(64.0, 64.0, 96.0, 96.0));
        map
    }

    #[test]
    fn test_spatial_hash_cells() {
        assert_eq!(spatial_hash(Vec2::new(10.0, 10.0), 64.0), 0);
        assert_eq!(spatial_hash(Vec2::new(70.0, 10.0), 64.0), 1);
        assert_eq!(spatial_hash(Vec2::new(130.0, 70.0), 64.0), 4 ^ 1);
        // Lossy: mirrored cells share a hash
        assert_eq!(
            spatial_hash(Vec2::new(-10.0, 10.0), 64.0),
            spatial_hash(Vec2::new(70.0, 10.0), 64.0)
        );
    }

    #[test]
    fn test_handle_cells_deduplicated() {
        let map = scenario();

        // All four corners of entity 1 fall in cell (0, 0)
        assert_eq!(map.get(entity(1)).unwrap().cells(), &[0]);
        // Entity 2 spans (0,0), (1,0), (0,1), (1,1) which hash to 0, 1, 1, 0
        assert_eq!(map.get(entity(2)).unwrap().cells(), &[0, 1]);
        assert_eq!(map.get(entity(2)).unwrap().rect(), Rect2::new(16.0, 16.0, 48.0, 48.0));
    }

    #[test]
    fn test_compute_collision_scenario() {
        let map = scenario();
        let result = map.compute_collision(entity(1)).unwrap();
        assert_eq!(result.entities(), &[entity(2)]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_remove_scenario() {
        let mut map = scenario();
        assert_eq!(map.remove(entity(1)), Some(Rect2::new(0.0, 0.0, 32.0, 32.0)));
        assert!(map.get(entity(1)).is_none());
        assert!(!map.compute_collision(entity(2)).unwrap().contains(entity(1)));
        assert!(map.compute_collision(entity(1)).unwrap().is_empty());
        assert!(map.remove(entity(1)).is_none());
    }

    #[test]
    fn test_update_moves_entity() {
        let mut map = scenario();
        map.insert_or_update(entity(1), Rect2::new(500.0, 0.0, 32.0, 32.0));

        assert!(map.compute_collision(entity(1)).unwrap().is_empty());
        assert!(!map.compute_collision(entity(2)).unwrap().contains(entity(1)));
        assert!(!map.bucket(0).contains(&entity(1)));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let mut map = SpatialHashMap::with_cell_size(16.0);
        let rects = [
            Rect2::new(0.0, 0.0, 10.0, 10.0),
            Rect2::new(5.0, 5.0, 10.0, 10.0),
            Rect2::new(30.0, 0.0, 4.0, 4.0),
            Rect2::new(14.0, 14.0, 2.0, 2.0),
            Rect2::new(-20.0, -20.0, 8.0, 8.0),
        ];
        for (i, rect) in rects.iter().enumerate() {
            map.insert_or_update(entity(i as u32), *rect);
        }

        for (i, a) in rects.iter().enumerate() {
            let hits = map.compute_collision(entity(i as u32)).unwrap();
            for (j, b) in rects.iter().enumerate() {
                if i == j {
                    continue;
                }
                assert_eq!(
                    hits.contains(entity(j as u32)),
                    rectangles_overlap(a, b),
                    "pair ({i}, {j})"
                );
            }
        }
    }

    #[test]
    fn test_grows_cell_for_large_object() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        map.insert_or_update(entity(1), Rect2::new(0.0, 0.0, 32.0, 32.0));
        map.insert_or_update(entity(2), Rect2::new(0.0, 0.0, 200.0, 100.0));

        assert_eq!(map.cell_size(), 400.0);
        assert_eq!(map.largest_object_size(), 200.0);
        // Entity 1 was relinked under the new cell size
        assert_eq!(map.get(entity(1)).unwrap().cells(), &[0]);
        assert!(map.compute_collision(entity(1)).unwrap().contains(entity(2)));
    }

    #[test]
    fn test_shrinks_cell_for_small_objects() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        map.insert_or_update(entity(1), Rect2::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(map.cell_size(), 8.0);

        map.insert_or_update(entity(2), Rect2::new(2.0, 2.0, 4.0, 4.0));
        assert_eq!(map.cell_size(), 8.0);
        assert!(map.compute_collision(entity(2)).unwrap().contains(entity(1)));
    }

    #[test]
    fn test_rebuild_keeps_every_entity_linked() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        for i in 0..10 {
            let offset = i as f32 * 20.0;
            map.insert_or_update(entity(i), Rect2::new(offset, 0.0, 16.0, 16.0));
        }
        map.insert_or_update(entity(100), Rect2::new(0.0, 100.0, 300.0, 10.0));

        for (tracked, handle) in map.iter() {
            assert!(!handle.cells().is_empty());
            for cell in handle.cells() {
                assert!(map.bucket(*cell).contains(&tracked));
            }
        }
    }

    #[test]
    fn test_remove_recomputes_largest() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        map.insert_or_update(entity(1), Rect2::new(0.0, 0.0, 40.0, 40.0));
        map.insert_or_update(entity(2), Rect2::new(0.0, 0.0, 30.0, 30.0));
        map.insert_or_update(entity(3), Rect2::new(0.0, 0.0, 40.0, 10.0));

        map.remove(entity(1));
        assert_eq!(map.largest_object_size(), 40.0);

        map.remove(entity(3));
        assert_eq!(map.largest_object_size(), 30.0);

        map.remove(entity(2));
        assert_eq!(map.largest_object_size(), 0.0);
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), 0);
    }

    #[test]
    fn test_point_sized_rect_keeps_cell_size() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        map.insert_or_update(entity(1), Rect2::new(10.0, 10.0, 0.0, 0.0));
        assert_eq!(map.cell_size(), 64.0);
        assert_eq!(map.get(entity(1)).unwrap().cells(), &[0]);
    }

    #[test]
    fn test_wide_object_misses_middle_cell() {
        let mut map = SpatialHashMap::with_cell_size(64.0);
        // Spans cell columns 0 to 2 but only the corner columns are linked
        map.insert_or_update(entity(1), Rect2::new(60.0, 0.0, 120.0, 10.0));
        map.insert_or_update(entity(2), Rect2::new(100.0, 0.0, 10.0, 10.0));
        assert_eq!(map.cell_size(), 64.0);
        assert_eq!(map.get(entity(1)).unwrap().cells(), &[0, 4]);
        assert_eq!(map.get(entity(2)).unwrap().cells(), &[1]);

        let a = map.get(entity(1)).unwrap().rect();
        let b = map.get(entity(2)).unwrap().rect();
        assert!(rectangles_overlap(&a, &b));
        assert!(map.compute_collision(entity(1)).unwrap().is_empty());
        assert!(map.compute_collision(entity(2)).unwrap().is_empty());
    }

    #[test]
    fn test_collision_limit() {
        let config = SpatialHashConfig {
            initial_cell_size: 64.0,
            max_collisions: 2,
        };
        let mut map = SpatialHashMap::new(&config);
        for i in 0..4 {
            map.insert_or_update(entity(i), Rect2::new(0.0, 0.0, 10.0, 10.0));
        }

        let err = map.compute_collision(entity(0)).unwrap_err();
        assert_eq!(
            err,
            PhysicsError::CollisionLimitReached {
                entity: entity(0),
                max: 2
            }
        );
    }
}
