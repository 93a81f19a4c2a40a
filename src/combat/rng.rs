//! Random sources for skill activation and damage variance.
//!
//! The engine only sees [RandomSource]: a stream of uniform draws in `[0, 1)`.
//! [Rng] is the fast seeded SplitMix64 used for simulation batches;
//! [ScriptedSource] replays a fixed sequence for deterministic tests.
//! Not cryptographically secure.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// 2^-53: maps the top 53 bits of a u64 onto `[0, 1)`.
const F64_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

pub trait RandomSource {
    /// Next uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Pick an index in `0..len` from one draw. `len` must be non-zero.
pub fn pick_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    let idx = (rng.next_f64() * len as f64) as usize;
    idx.min(len.saturating_sub(1))
}

#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
    z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
    z ^ (z >> 31)
}

/// Seed for run `index` of a batch started from `base_seed`. Independent of
/// the order in which runs execute.
pub fn derive_seed(base_seed: u64, index: u64) -> u64 {
    mix64(base_seed ^ mix64(index.wrapping_add(SPLITMIX64_GOLDEN)))
}

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        mix64(self.state)
    }
}

impl RandomSource for Rng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * F64_UNIT
    }
}

pub fn entropy_seed() -> Result<u64, getrandom::Error> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Replays a fixed list of draws, starting over once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    position: usize,
    consumed: usize,
}

impl ScriptedSource {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            position: 0,
            consumed: 0,
        }
    }

    /// Same draw forever.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Total number of draws handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        self.consumed += 1;
        let Some(&value) = self.draws.get(self.position) else {
            return 0.0;
        };
        self.position = (self.position + 1) % self.draws.len();
        value
    }
}
