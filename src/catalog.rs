//! Per-family piece catalogs: which kinds exist, how strongly each is
//! weighted, and how many of each a single structure may contain.

use rand::Rng;

/// One catalog row. `quota == 0` means unlimited; `generated` is mutated in
/// place as pieces are created, so counters are global across one whole graph
/// build and must never be shared between concurrent builds.
#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry<K> {
    pub kind: K,
    pub weight: u32,
    pub quota: u32,
    pub generated: u32,
}

impl<K> CatalogEntry<K> {
    pub fn available(&self) -> bool {
        self.quota == 0 || self.generated < self.quota
    }
}

#[derive(Clone, Debug)]
pub struct PieceCatalog<K> {
    entries: Vec<CatalogEntry<K>>,
}

impl<K: Copy + PartialEq> PieceCatalog<K> {
    pub fn new(rows: &[(K, u32, u32)]) -> Self {
        PieceCatalog {
            entries: rows
                .iter()
                .map(|&(kind, weight, quota)| CatalogEntry {
                    kind,
                    weight,
                    quota,
                    generated: 0,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry<K>] {
        &self.entries
    }

    /// True while at least one kind may still be generated.
    pub fn has_available(&self) -> bool {
        self.entries.iter().any(|e| e.available())
    }

    /// Draws a kind by weight among kinds under quota, skipping `exclude`.
    /// Returns `None` when the draw pool is empty; expansion halts at that
    /// opening. Consumes exactly one RNG draw when a pool exists.
    pub fn pick<R: Rng>(&self, rng: &mut R, exclude: Option<K>) -> Option<K> {
        let in_pool = |e: &CatalogEntry<K>| e.available() && Some(e.kind) != exclude;

        let total: u32 = self
            .entries
            .iter()
            .filter(|e| in_pool(e))
            .map(|e| e.weight)
            .sum();
        if total == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0, total);
        for e in self.entries.iter().filter(|e| in_pool(e)) {
            if roll < e.weight {
                return Some(e.kind);
            }
            roll -= e.weight;
        }

        unreachable!("roll bounded by total weight")
    }

    /// Bumps the counter for `kind`. Called the moment a candidate succeeds,
    /// so later openings in the same build see the updated quota.
    pub fn note_generated(&mut self, kind: K) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.kind == kind) {
            e.generated += 1;
        }
    }

    pub fn generated(&self, kind: K) -> u32 {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.generated)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::small_rng;

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    enum K {
        A,
        B,
        C,
    }

    #[test]
    fn test_quota_exhaustion_removes_kind_from_pool() {
        let mut catalog = PieceCatalog::new(&[(K::A, 10, 1), (K::B, 1, 0)]);
        let mut rng = small_rng([7; 4]);

        catalog.note_generated(K::A);
        assert_eq!(catalog.generated(K::A), 1);

        // A is exhausted; only B can ever be drawn now.
        for _ in 0..50 {
            assert_eq!(catalog.pick(&mut rng, None), Some(K::B));
        }
        assert!(catalog.has_available());
    }

    #[test]
    fn test_exclusion_never_draws_previous_kind() {
        let catalog = PieceCatalog::new(&[(K::A, 100, 0), (K::B, 1, 0)]);
        let mut rng = small_rng([3; 4]);

        for _ in 0..50 {
            assert_eq!(catalog.pick(&mut rng, Some(K::A)), Some(K::B));
        }
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let mut catalog = PieceCatalog::new(&[(K::A, 10, 2), (K::C, 5, 1)]);
        let mut rng = small_rng([1; 4]);

        catalog.note_generated(K::A);
        catalog.note_generated(K::A);
        catalog.note_generated(K::C);

        assert!(!catalog.has_available());
        assert_eq!(catalog.pick(&mut rng, None), None);

        // A single kind that is also excluded leaves an empty pool too.
        let lone = PieceCatalog::new(&[(K::B, 10, 0)]);
        assert_eq!(lone.pick(&mut rng, Some(K::B)), None);
    }

    #[test]
    fn test_zero_quota_is_unlimited() {
        let mut catalog = PieceCatalog::new(&[(K::B, 1, 0)]);
        for _ in 0..1000 {
            catalog.note_generated(K::B);
        }
        assert!(catalog.has_available());
    }
}
