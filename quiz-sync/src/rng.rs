use crate::constants::DICE_FACES;
use crate::crypto::derive_seed;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use sha2::{Digest, Sha256};

// Deterministic client-side roll stream. Values drive the dice animation and
// the auto-resolve face; they are advisory only, since the server echoes back
// the authoritative score. Seeding from (room, round) makes replays and tests
// reproducible.

#[derive(Debug)]
pub struct RollStream {
    rng: Pcg64Mcg,
}

impl RollStream {
    pub fn new(room_code: &str, question_index: u32) -> Self {
        let seed = derive_seed(room_code, &format!("roll-{}", question_index));
        Self {
            rng: pcg_from_seed(seed),
        }
    }

    pub fn next_face(&mut self) -> u8 {
        self.rng.gen_range(1..=DICE_FACES)
    }
}

/// Expand a u64 into 16 bytes to seed the PCG generator deterministically.
pub fn pcg_from_seed(seed: u64) -> Pcg64Mcg {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    let digest = hasher.finalize();
    let mut seed_bytes = [0u8; 16];
    seed_bytes.copy_from_slice(&digest[..16]);
    Pcg64Mcg::from_seed(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_stay_in_range() {
        let mut stream = RollStream::new("room-1", 0);
        for _ in 0..200 {
            let face = stream.next_face();
            assert!((1..=DICE_FACES).contains(&face));
        }
    }

    #[test]
    fn stream_is_deterministic_per_room_and_round() {
        let a: Vec<u8> = {
            let mut stream = RollStream::new("room-1", 3);
            (0..10).map(|_| stream.next_face()).collect()
        };
        let b: Vec<u8> = {
            let mut stream = RollStream::new("room-1", 3);
            (0..10).map(|_| stream.next_face()).collect()
        };
        assert_eq!(a, b);
        let c: Vec<u8> = {
            let mut stream = RollStream::new("room-1", 4);
            (0..10).map(|_| stream.next_face()).collect()
        };
        assert_ne!(a, c);
    }
}
