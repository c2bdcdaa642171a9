use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces `ORD-<YYYYMMDD>-<NNNN>` identifiers from the UTC date and a
/// four-digit draw in `1000..=9999`.
///
/// The random source is seeded once and shared by every caller. Numbers are
/// not guaranteed unique; the order `id` is the identity.
pub struct OrderNumberGenerator {
    rng: Mutex<StdRng>,
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn generate(&self) -> String {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(&self, at: DateTime<Utc>) -> String {
        let suffix: u16 = {
            // A poisoned lock still holds a usable RNG.
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen_range(1000..=9999)
        };
        format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
    }
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
