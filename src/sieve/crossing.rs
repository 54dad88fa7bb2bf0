use crate::sieve::index::IndexSpace;
use crate::sieve::table::PrimeTable;

/// Span a single wavefront travelled since the last crossing check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontSweep {
    pub rank: usize,
    /// Front position at the previous check (equal to `to` after a scrub)
    pub from: u32,
    pub to: u32,
}

impl FrontSweep {
    pub fn at(rank: usize, position: u32) -> Self {
        Self {
            rank,
            from: position,
            to: position,
        }
    }

    /// Inclusive band `[min - tolerance, max + tolerance]` covered by this sweep
    fn band(&self, tolerance: u32) -> (u32, u32) {
        let (lo, hi) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        (lo.saturating_sub(tolerance), hi.saturating_add(tolerance))
    }
}

/// One persistent flag per position: set once a wavefront crosses a multiple
/// of its prime there, cleared only by `reset`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossingState {
    space: IndexSpace,
    crossed: Vec<bool>,
    count: usize,
}

impl CrossingState {
    pub fn new(n: u32) -> Self {
        Self {
            space: IndexSpace::new(n),
            crossed: vec![false; n as usize],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.crossed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crossed.is_empty()
    }

    /// Number of positions currently marked
    pub fn crossed_count(&self) -> usize {
        self.count
    }

    pub fn is_crossed(&self, position: u32) -> bool {
        self.space
            .slot(position)
            .map(|slot| self.crossed[slot])
            .unwrap_or(false)
    }

    /// Flags in ascending position order
    pub fn flags(&self) -> &[bool] {
        &self.crossed
    }

    pub fn reset(&mut self) {
        self.crossed.fill(false);
        self.count = 0;
    }

    /// Mark every multiple of each swept prime that lies within `tolerance`
    /// of a position its front occupied. Returns how many flags flipped.
    pub fn update(&mut self, table: &PrimeTable, sweeps: &[FrontSweep], tolerance: u32) -> usize {
        let mut marked = 0;
        for sweep in sweeps {
            let (lo, hi) = sweep.band(tolerance);
            for &m in table.multiples_within(sweep.rank, lo, hi) {
                if let Some(slot) = self.space.slot(m) {
                    if !self.crossed[slot] {
                        self.crossed[slot] = true;
                        marked += 1;
                    }
                }
            }
        }
        self.count += marked;
        marked
    }
}
