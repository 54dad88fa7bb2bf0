use crate::error::{Result, SieveError};

/// All primes `<= n` in ascending order (Eratosthenes)
pub fn sieve(n: u32) -> Vec<u32> {
    if n < 2 {
        return Vec::new();
    }
    let len = n as usize + 1;
    let mut composite = vec![false; len];
    let mut primes = Vec::new();

    for i in 2..len {
        if composite[i] {
            continue;
        }
        primes.push(i as u32);
        let mut j = i * i;
        while j < len {
            composite[j] = true;
            j += i;
        }
    }

    primes
}

/// Primes by rank and the multiples of each within `[1, N]`.
///
/// Rebuilt on every `setup`; read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimeTable {
    n: u32,
    primes: Vec<u32>,
    /// Ascending multiples `k·p <= N`, `k >= 1`, indexed by rank
    multiples: Vec<Vec<u32>>,
}

impl PrimeTable {
    /// First `prime_cap` primes not exceeding `n`, plus their multiple sets
    pub fn build(n: u32, prime_cap: u32) -> Result<Self> {
        if n < 2 {
            return Err(SieveError::invalid(format!("N must be at least 2, got {n}")));
        }
        if prime_cap < 1 {
            return Err(SieveError::invalid("primeCap must be at least 1"));
        }

        let mut primes = sieve(n);
        primes.truncate(prime_cap as usize);

        let multiples = primes
            .iter()
            .map(|&p| (1..=n / p).map(|k| k * p).collect())
            .collect();

        Ok(Self {
            n,
            primes,
            multiples,
        })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn primes(&self) -> &[u32] {
        &self.primes
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn prime(&self, rank: usize) -> Option<u32> {
        self.primes.get(rank).copied()
    }

    pub fn rank_of(&self, prime: u32) -> Option<usize> {
        self.primes.binary_search(&prime).ok()
    }

    /// Multiple set of the prime at `rank`, ascending
    pub fn multiples(&self, rank: usize) -> &[u32] {
        self.multiples.get(rank).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Multiples of the prime at `rank` lying in `[lo, hi]`
    pub fn multiples_within(&self, rank: usize, lo: u32, hi: u32) -> &[u32] {
        let set = self.multiples(rank);
        let start = set.partition_point(|&m| m < lo);
        let end = set.partition_point(|&m| m <= hi);
        if start >= end {
            &[]
        } else {
            &set[start..end]
        }
    }
}
