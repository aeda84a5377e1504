//! Seed-derived RNG streams for problem generation.
//!
//! Each generation concern draws from its own stream so that replaying a
//! seed reproduces the same problems even when optional draws (compound
//! terms, word-problem coin flips) are skipped on some questions.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

/// Independent RNG streams owned by the problem generator.
#[derive(Debug, Clone)]
pub struct RngStreams {
    pub(crate) operands: SmallRng,
    pub(crate) operation: SmallRng,
    pub(crate) compound: SmallRng,
    pub(crate) word: SmallRng,
}

impl RngStreams {
    /// Construct the streams from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            operands: SmallRng::seed_from_u64(derive_stream_seed(seed, b"operands")),
            operation: SmallRng::seed_from_u64(derive_stream_seed(seed, b"operation")),
            compound: SmallRng::seed_from_u64(derive_stream_seed(seed, b"compound")),
            word: SmallRng::seed_from_u64(derive_stream_seed(seed, b"word")),
        }
    }

    /// Construct from OS entropy for hosts that do not need replays.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
