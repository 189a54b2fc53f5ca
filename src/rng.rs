//! Source of server randoms.
//!
//! With [`ConfigBuilder::rng_seed`][crate::ConfigBuilder::rng_seed] set, every
//! server random a connection generates is reproducible, which the tests rely
//! on. Without a seed the thread-local generator is used.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SeededRng {
    inner: Option<StdRng>,
}

impl SeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let inner = seed.map(StdRng::seed_from_u64);
        Self { inner }
    }

    /// Fill `dest` with random bytes.
    pub fn fill(&mut self, dest: &mut [u8]) {
        match self.inner.as_mut() {
            Some(rng) => rng.fill(dest),
            None => rand::thread_rng().fill(dest),
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for SeededRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededRng")
            .field("seeded", &self.is_seeded())
            .finish()
    }
}
