use crate::sieve::table::PrimeTable;

/// A wavefront that has spawned by the evaluated time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveFront {
    pub rank: usize,
    pub prime: u32,
    /// Seconds since spawn, `t - spawn(rank)`
    pub elapsed: f64,
    /// `round(speed * elapsed)`
    pub position: u32,
    /// Temporal phase term `speed * elapsed` for the render field
    pub phase: f64,
    /// Amplitude weight `1 / sqrt(max(1, p))`
    pub intensity: f64,
}

/// Spawn times and front positions, a pure function of time.
///
/// Holds no counters: evaluating the same `t` twice yields the same fronts.
#[derive(Clone, Debug, PartialEq)]
pub struct WavefrontSchedule {
    primes: Vec<u32>,
    step: f64,
    speed: f64,
}

impl WavefrontSchedule {
    pub fn new(table: &PrimeTable, step: f64, speed: f64) -> Self {
        Self {
            primes: table.primes().to_vec(),
            step,
            speed,
        }
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// `spawn(i) = i * STEP`
    pub fn spawn(&self, rank: usize) -> f64 {
        rank as f64 * self.step
    }

    /// Front position of `rank` at `t`, or `None` before it spawns
    pub fn front(&self, rank: usize, t: f64) -> Option<u32> {
        let spawn = self.spawn(rank);
        if rank >= self.primes.len() || t < spawn {
            return None;
        }
        Some(self.position_after(t - spawn))
    }

    /// Front position, treating an unspawned wave as sitting at 0
    pub fn front_or_origin(&self, rank: usize, t: f64) -> u32 {
        self.front(rank, t).unwrap_or(0)
    }

    /// Every wavefront spawned by `t`, ascending by rank
    pub fn active(&self, t: f64) -> impl Iterator<Item = ActiveFront> + '_ {
        self.primes
            .iter()
            .enumerate()
            .take_while(move |(rank, _)| t >= self.spawn(*rank))
            .map(move |(rank, &prime)| {
                let elapsed = t - self.spawn(rank);
                ActiveFront {
                    rank,
                    prime,
                    elapsed,
                    position: self.position_after(elapsed),
                    phase: self.speed * elapsed,
                    intensity: 1.0 / (prime.max(1) as f64).sqrt(),
                }
            })
    }

    /// Time at which the last-spawned front reaches position `n`
    pub fn sweep_duration(&self, n: u32) -> f64 {
        let last = self.primes.len().saturating_sub(1);
        self.spawn(last) + n as f64 / self.speed
    }

    fn position_after(&self, elapsed: f64) -> u32 {
        // Saturating cast; fronts far past N are clamped by the caller.
        (self.speed * elapsed.max(0.0)).round() as u32
    }
}
