/// Identity registry.
///
/// Issues the 128-bit identifiers carried by every simulation entity.
/// Identifiers are random (UUID v4) by default; a registry may instead be
/// seeded so that two simulations built from the same seed hand out the
/// same identifier sequence, which keeps whole runs reproducible.

use std::collections::HashSet;

use uuid::{Builder, Uuid};

// ── Deterministic RNG ─────────────────────────────────────────────────

/// SplitMix64: a small deterministic PRNG.
///
/// Produces identical sequences for a given seed across all platforms.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a new RNG from a seed.
    pub fn new(seed: u64) -> Self {
        DeterministicRng { state: seed }
    }

    /// Generate the next u64.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Fill 16 bytes of randomness.
    pub fn next_bytes(&mut self) -> [u8; 16] {
        let hi = self.next_u64().to_be_bytes();
        let lo = self.next_u64().to_be_bytes();
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&hi);
        out[8..].copy_from_slice(&lo);
        out
    }
}

// ── Id source ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum IdSource {
    /// Operating-system randomness via `Uuid::new_v4`.
    Random,
    /// Seeded bytes shaped into a version 4 UUID.
    Seeded(DeterministicRng),
}

// ── IdRegistry ────────────────────────────────────────────────────────

/// Hands out identifiers that are never repeated within one simulation.
///
/// Collisions between random 128-bit values are astronomically unlikely,
/// but the registry still remembers every identifier it issued and draws
/// again whenever a candidate has been seen before.
#[derive(Debug, Clone)]
pub struct IdRegistry {
    source: IdSource,
    issued: HashSet<Uuid>,
}

impl IdRegistry {
    /// A registry backed by OS randomness.
    pub fn new() -> Self {
        IdRegistry {
            source: IdSource::Random,
            issued: HashSet::with_capacity(128),
        }
    }

    /// A registry whose sequence is fully determined by `seed`.
    pub fn seeded(seed: u64) -> Self {
        IdRegistry {
            source: IdSource::Seeded(DeterministicRng::new(seed)),
            issued: HashSet::with_capacity(128),
        }
    }

    /// Issue a fresh identifier.
    pub fn fresh_id(&mut self) -> Uuid {
        loop {
            let candidate = self.draw();
            if self.issued.insert(candidate) {
                return candidate;
            }
            tracing::warn!(id = %candidate, "identifier collision, drawing again");
        }
    }

    /// Number of identifiers issued so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    /// Returns `true` if `id` was issued by this registry.
    pub fn was_issued(&self, id: Uuid) -> bool {
        self.issued.contains(&id)
    }

    /// Record `id` as issued without handing it out.
    #[cfg(test)]
    pub(crate) fn mark_issued(&mut self, id: Uuid) {
        self.issued.insert(id);
    }

    fn draw(&mut self) -> Uuid {
        match &mut self.source {
            IdSource::Random => Uuid::new_v4(),
            IdSource::Seeded(rng) => Builder::from_random_bytes(rng.next_bytes()).into_uuid(),
        }
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
