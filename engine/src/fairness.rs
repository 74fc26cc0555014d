//! Commit-reveal fairness generation for provably fair spins.
//!
//! ## Flow
//!
//! 1. **Commit**: `begin_spin` draws a fresh server seed from the OS CSPRNG,
//!    increments the session nonce, and publishes
//!    `commitment = sha256(sha256_hex(server_seed) : client_seed : nonce)`.
//!    The raw server seed stays withheld.
//! 2. **Draw**: the reel result is derived from the spin's random stream,
//!    `HMAC-SHA256(server_seed, client_seed : nonce)`, so the full result is
//!    reproducible from the seed triple alone.
//! 3. **Reveal**: once the outcome is fixed, `reveal` discloses the server
//!    seed, re-checking that it still reproduces the published commitment.
//! 4. **Verify**: anyone can recompute the commitment from the revealed
//!    record; a mismatch signals tampering and the spin fails closed.
//!
//! Nonces are strictly increasing within a session. Reuse or regression is
//! session corruption: the spin aborts before any balance mutation.

use crate::error::EngineError;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use sweepstack_types::{FairnessRecord, Symbol};

type HmacSha256 = Hmac<Sha256>;

/// Server seed length in bytes.
pub const SERVER_SEED_LEN: usize = 32;

fn sha256_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

/// Compute the commitment for a seed triple. The server seed is hashed first
/// so the commitment can be published without leaking the seed.
pub fn commitment(server_seed: &[u8], client_seed: &str, nonce: u64) -> String {
    let seed_hash = sha256_hex(server_seed);
    sha256_hex(format!("{seed_hash}:{client_seed}:{nonce}").as_bytes())
}

/// Recompute a commitment from a revealed record and compare it against the
/// previously published hash. This is the public verification contract.
pub fn verify(server_seed_hex: &str, client_seed: &str, nonce: u64, claimed: &str) -> bool {
    let Ok(server_seed) = hex::decode(server_seed_hex) else {
        return false;
    };
    commitment(&server_seed, client_seed, nonce) == claimed
}

/// Deterministic random-unit stream for one spin.
///
/// Seeded with `HMAC-SHA256(server_seed, client_seed : nonce)` and extended by
/// re-hashing when exhausted, so any party holding the revealed seed triple
/// can reproduce every draw.
pub struct FairnessStream {
    buffer: Vec<u8>,
    offset: usize,
}

impl FairnessStream {
    fn new(server_seed: &[u8], client_seed: &str, nonce: u64) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(server_seed).expect("hmac accepts any key length");
        mac.update(format!("{client_seed}:{nonce}").as_bytes());
        Self {
            buffer: mac.finalize().into_bytes().to_vec(),
            offset: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_for_tests(server_seed: &[u8], client_seed: &str, nonce: u64) -> Self {
        Self::new(server_seed, client_seed, nonce)
    }

    /// Next random unit in `[0, 1)`, consuming 8 stream bytes.
    pub fn next_unit(&mut self) -> f64 {
        let bytes = self.next_bytes();
        let raw = u64::from_be_bytes(bytes);
        // Top 53 bits give a uniform double in [0, 1).
        (raw >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_bytes(&mut self) -> [u8; 8] {
        if self.offset + 8 > self.buffer.len() {
            self.buffer = Sha256::digest(&self.buffer).to_vec();
            self.offset = 0;
        }
        let mut out = [0u8; 8];
        out.copy_from_slice(&self.buffer[self.offset..self.offset + 8]);
        self.offset += 8;
        out
    }
}

/// In-flight commitment state for the spin currently between commit and reveal.
#[derive(Clone)]
struct ActiveSpin {
    server_seed: [u8; SERVER_SEED_LEN],
    nonce: u64,
    commitment: String,
}

/// Per-player fairness session: client seed, nonce counter, and at most one
/// in-flight commitment.
pub struct FairnessSession {
    client_seed: String,
    /// Last nonce issued; the next spin uses `nonce + 1`.
    nonce: u64,
    active: Option<ActiveSpin>,
}

impl FairnessSession {
    pub fn new(client_seed: impl Into<String>) -> Self {
        Self {
            client_seed: client_seed.into(),
            nonce: 0,
            active: None,
        }
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    /// Adopt a client-supplied seed, but only before any spin has bound the
    /// current one into a commitment.
    pub fn adopt_client_seed(&mut self, client_seed: &str) {
        if self.nonce == 0 && self.active.is_none() && !client_seed.is_empty() {
            self.client_seed = client_seed.to_string();
        }
    }

    /// Last nonce issued by this session.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Begin a spin: fresh server seed from the OS CSPRNG, next nonce,
    /// published commitment.
    pub fn begin_spin(&mut self) -> Result<&str, EngineError> {
        self.begin_spin_with_rng(&mut OsRng)
    }

    /// As [`begin_spin`](Self::begin_spin), with an injected cryptographic
    /// RNG for deterministic tests.
    pub fn begin_spin_with_rng(
        &mut self,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<&str, EngineError> {
        if self.active.is_some() {
            // A previous spin never completed its reveal; the session is
            // corrupted and must be re-established.
            return Err(EngineError::NonceConflict { nonce: self.nonce });
        }
        let nonce = self
            .nonce
            .checked_add(1)
            .ok_or(EngineError::NonceConflict { nonce: self.nonce })?;

        let mut server_seed = [0u8; SERVER_SEED_LEN];
        rng.fill_bytes(&mut server_seed);
        let commitment = commitment(&server_seed, &self.client_seed, nonce);

        self.nonce = nonce;
        self.active = Some(ActiveSpin {
            server_seed,
            nonce,
            commitment,
        });
        Ok(&self
            .active
            .as_ref()
            .expect("active spin just installed")
            .commitment)
    }

    /// The random stream for the in-flight spin.
    pub fn stream(&self) -> Result<FairnessStream, EngineError> {
        let active = self
            .active
            .as_ref()
            .ok_or(EngineError::NonceConflict { nonce: self.nonce })?;
        Ok(FairnessStream::new(
            &active.server_seed,
            &self.client_seed,
            active.nonce,
        ))
    }

    /// Disclose the server seed after the outcome is fixed.
    ///
    /// Re-verifies that the seed still reproduces the published commitment;
    /// a mismatch fails closed with no record produced.
    pub fn reveal(&mut self, result_reels: Vec<Symbol>) -> Result<FairnessRecord, EngineError> {
        let active = self
            .active
            .take()
            .ok_or(EngineError::NonceConflict { nonce: self.nonce })?;
        let recomputed = commitment(&active.server_seed, &self.client_seed, active.nonce);
        if recomputed != active.commitment {
            return Err(EngineError::FairnessVerificationFailed {
                nonce: active.nonce,
            });
        }
        Ok(FairnessRecord {
            server_seed: hex::encode(active.server_seed),
            client_seed: self.client_seed.clone(),
            nonce: active.nonce,
            commitment: active.commitment,
            result_reels,
        })
    }

    /// Drop the in-flight commitment after an aborted spin. The consumed
    /// nonce is never reused.
    pub fn abandon(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    #[test]
    fn commitment_is_reproducible_from_revealed_record() {
        let mut session = FairnessSession::new("client_abc");
        let committed = session
            .begin_spin_with_rng(&mut test_rng(7))
            .unwrap()
            .to_string();
        let record = session.reveal(vec![Symbol::from("💎")]).unwrap();

        assert_eq!(record.commitment, committed);
        assert!(verify(
            &record.server_seed,
            &record.client_seed,
            record.nonce,
            &record.commitment,
        ));
    }

    #[test]
    fn tampered_reveal_fails_verification() {
        let mut session = FairnessSession::new("client_abc");
        session.begin_spin_with_rng(&mut test_rng(7)).unwrap();
        let record = session.reveal(vec![]).unwrap();

        // Flip one nibble of the revealed seed.
        let mut tampered = record.server_seed.clone();
        let flipped = if tampered.starts_with('0') { "1" } else { "0" };
        tampered.replace_range(0..1, flipped);
        assert!(!verify(
            &tampered,
            &record.client_seed,
            record.nonce,
            &record.commitment,
        ));

        // And a wrong nonce fails too.
        assert!(!verify(
            &record.server_seed,
            &record.client_seed,
            record.nonce + 1,
            &record.commitment,
        ));
    }

    #[test]
    fn nonce_strictly_increases_across_spins() {
        let mut session = FairnessSession::new("client_abc");
        let mut rng = test_rng(7);
        let mut last = 0;
        for _ in 0..50 {
            session.begin_spin_with_rng(&mut rng).unwrap();
            let record = session.reveal(vec![]).unwrap();
            assert!(record.nonce > last);
            last = record.nonce;
        }
    }

    #[test]
    fn begin_with_inflight_commitment_is_a_nonce_conflict() {
        let mut session = FairnessSession::new("client_abc");
        let mut rng = test_rng(7);
        session.begin_spin_with_rng(&mut rng).unwrap();
        let err = session.begin_spin_with_rng(&mut rng).unwrap_err();
        assert_eq!(err, EngineError::NonceConflict { nonce: 1 });

        // Abandoning clears the in-flight spin but never reuses its nonce.
        session.abandon();
        session.begin_spin_with_rng(&mut rng).unwrap();
        assert_eq!(session.nonce(), 2);
    }

    #[test]
    fn stream_is_deterministic_for_a_seed_triple() {
        let server_seed = [42u8; SERVER_SEED_LEN];
        let mut a = FairnessStream::new(&server_seed, "client", 3);
        let mut b = FairnessStream::new(&server_seed, "client", 3);
        for _ in 0..64 {
            assert_eq!(a.next_unit(), b.next_unit());
        }

        // A different nonce produces a different stream.
        let mut c = FairnessStream::new(&server_seed, "client", 3);
        let mut d = FairnessStream::new(&server_seed, "client", 4);
        assert_ne!(c.next_unit(), d.next_unit());
    }

    #[test]
    fn stream_units_are_in_unit_interval() {
        let server_seed = [0xA5u8; SERVER_SEED_LEN];
        let mut stream = FairnessStream::new(&server_seed, "client", 1);
        for _ in 0..1_000 {
            let unit = stream.next_unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn distinct_spins_use_distinct_seeds() {
        let mut session = FairnessSession::new("client_abc");
        let mut rng = test_rng(9);
        let mut seeds = std::collections::BTreeSet::new();
        for _ in 0..100 {
            session.begin_spin_with_rng(&mut rng).unwrap();
            let record = session.reveal(vec![]).unwrap();
            assert!(seeds.insert(record.server_seed));
        }
    }
}
