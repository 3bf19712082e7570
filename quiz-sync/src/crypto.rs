use crate::types::PendingAward;
use sha2::{Digest, Sha256};

// Hashing helpers shared by the reward engine and the fair-ordering
// verification. Kept separate so both sides reuse the same derivations.

/// Client-generated idempotency key for the ledger credit call, derived from
/// the fields that identify the finished match. Stable across retries because
/// the persisted award, not the wall clock, is the input.
pub fn idempotency_key(award: &PendingAward) -> String {
    let mut hasher = Sha256::new();
    hasher.update(award.room_code.as_bytes());
    hasher.update(award.game_type.label().as_bytes());
    hasher.update(award.finished_at_index.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Commitment over a slot value, used to verify the server's representative
/// ordering after the values are revealed.
pub fn slot_commitment(value: u64, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_le_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Derive a u64 seed from a string context and label.
pub fn derive_seed(base: &str, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    hasher.update(label.as_bytes());
    let hash = hasher.finalize();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AwardBreakdown, GameType};

    fn award(room: &str, index: u32) -> PendingAward {
        PendingAward {
            room_code: room.into(),
            game_type: GameType::Quick,
            points: 100,
            exp: 50,
            correct_count: 7,
            finished_at_index: index,
            breakdown: AwardBreakdown::default(),
            created_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn idempotency_key_is_stable_for_the_same_match() {
        let first = idempotency_key(&award("room-1", 9));
        let mut retried = award("room-1", 9);
        retried.created_at_ms += 60_000;
        assert_eq!(first, idempotency_key(&retried));
    }

    #[test]
    fn idempotency_key_differs_across_matches() {
        assert_ne!(
            idempotency_key(&award("room-1", 9)),
            idempotency_key(&award("room-2", 9))
        );
        assert_ne!(
            idempotency_key(&award("room-1", 9)),
            idempotency_key(&award("room-1", 5))
        );
    }

    #[test]
    fn slot_commitment_binds_value_and_salt() {
        let commit = slot_commitment(42, "round-0");
        assert_eq!(commit, slot_commitment(42, "round-0"));
        assert_ne!(commit, slot_commitment(43, "round-0"));
        assert_ne!(commit, slot_commitment(42, "round-1"));
    }
}
