use crate::crypto::idempotency_key;
use crate::types::{GameType, LevelChange, PendingAward};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

// Reward issuance: an exactly-once credit protocol built from an
// at-least-once retry loop plus a durable idempotency record. The award is
// persisted before the first credit attempt and deleted only after the ledger
// confirms, so a crash anywhere in between leaves a record that a later
// focus/visibility/mount trigger retries.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AwardState {
    Idle,
    Awarding,
    Awarded,
    NeedLogin,
    Error,
}

/// Ledger failures are all retryable; the record stays persisted either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    Unavailable(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Unavailable(reason) => write!(f, "ledger unavailable: {}", reason),
        }
    }
}

/// Durable local store for pending awards. One record per key at most;
/// last-writer-wins is acceptable because the engine is the only writer.
pub trait AwardStore {
    fn load(&self, key: &str) -> Option<PendingAward>;
    fn save(&mut self, key: &str, award: &PendingAward) -> Result<(), String>;
    fn delete(&mut self, key: &str);
}

/// The remote account ledger. Must deduplicate on the idempotency key for the
/// protocol to be exactly-once; without that it degrades to at-least-once.
pub trait Ledger {
    fn credit_points_and_exp(
        &mut self,
        user_id: &str,
        points: i64,
        exp: i64,
        idempotency_key: &str,
    ) -> Result<LevelChange, LedgerError>;
}

/// Resolves the authenticated identity; `refresh` asks for one session
/// refresh before giving up.
pub trait IdentityResolver {
    fn resolve(&mut self, refresh: bool) -> Option<String>;
}

/// Best-effort audit trail for credited deltas. Failures are logged and never
/// block the credit outcome.
pub trait AuditLog {
    fn record(&mut self, user_id: &str, field: &str, delta: i64) -> Result<(), String>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Credited {
        points: i64,
        exp: i64,
        levels: LevelChange,
    },
}

pub struct RewardEngine {
    store: Box<dyn AwardStore>,
    ledger: Box<dyn Ledger>,
    identity: Box<dyn IdentityResolver>,
    audit: Box<dyn AuditLog>,
    state: AwardState,
    in_flight: bool,
    notices: Vec<Notice>,
}

impl RewardEngine {
    pub fn new(
        store: Box<dyn AwardStore>,
        ledger: Box<dyn Ledger>,
        identity: Box<dyn IdentityResolver>,
        audit: Box<dyn AuditLog>,
    ) -> Self {
        Self {
            store,
            ledger,
            identity,
            audit,
            state: AwardState::Idle,
            in_flight: false,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> AwardState {
        self.state
    }

    /// Drain notification events for the UI to refresh balances.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Persist a freshly computed award and attempt the credit. Zero-value
    /// awards skip persistence entirely.
    pub fn settle(&mut self, award: PendingAward) -> AwardState {
        if award.is_empty() {
            self.state = AwardState::Idle;
            return self.state;
        }
        let key = award.game_type.storage_key();
        if let Err(err) = self.store.save(&key, &award) {
            // Not persisted, so no credit attempt: the persist-before-credit
            // invariant is what makes a crash recoverable.
            log::warn!("failed to persist pending award: {}", err);
            self.state = AwardState::Error;
            return self.state;
        }
        self.try_credit(award.game_type)
    }

    /// Retry entry point for focus, visibility-restore, and mount triggers.
    /// Idempotent: any order or repetition of triggers is safe.
    pub fn recover(&mut self) -> AwardState {
        if self.in_flight {
            return self.state;
        }
        for game_type in GameType::ALL {
            if self.store.load(&game_type.storage_key()).is_some() {
                return self.try_credit(game_type);
            }
        }
        self.state
    }

    fn try_credit(&mut self, game_type: GameType) -> AwardState {
        if self.in_flight {
            return self.state;
        }
        let key = game_type.storage_key();
        let award = match self.store.load(&key) {
            Some(award) => award,
            None => return self.state,
        };

        self.in_flight = true;
        self.state = AwardState::Awarding;

        let user_id = match self
            .identity
            .resolve(false)
            .or_else(|| self.identity.resolve(true))
        {
            Some(user_id) => user_id,
            None => {
                // Record stays persisted; the user can re-authenticate and a
                // later trigger retries.
                self.in_flight = false;
                self.state = AwardState::NeedLogin;
                return self.state;
            }
        };

        let request_key = idempotency_key(&award);
        match self
            .ledger
            .credit_points_and_exp(&user_id, award.points, award.exp, &request_key)
        {
            Ok(levels) => {
                if let Err(err) = self.audit.record(&user_id, "points", award.points) {
                    log::warn!("audit write failed (points): {}", err);
                }
                if let Err(err) = self.audit.record(&user_id, "exp", award.exp) {
                    log::warn!("audit write failed (exp): {}", err);
                }
                self.notices.push(Notice::Credited {
                    points: award.points,
                    exp: award.exp,
                    levels,
                });
                self.store.delete(&key);
                // Safe to re-arm: the record is gone, so a stray retry finds
                // nothing to credit.
                self.in_flight = false;
                self.state = AwardState::Awarded;
            }
            Err(err) => {
                log::warn!("credit attempt failed: {}", err);
                self.in_flight = false;
                self.state = AwardState::Error;
            }
        }
        self.state
    }
}

/// In-memory store holding serialized records, mirroring the key/value shape
/// of browser local storage. Useful on its own for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AwardStore for MemoryStore {
    fn load(&self, key: &str) -> Option<PendingAward> {
        let raw = self.entries.get(key)?;
        match serde_json::from_str(raw) {
            Ok(award) => Some(award),
            Err(err) => {
                log::warn!("discarding unreadable pending award at {}: {}", key, err);
                None
            }
        }
    }

    fn save(&mut self, key: &str, award: &PendingAward) -> Result<(), String> {
        let raw = serde_json::to_string(award).map_err(|e| e.to_string())?;
        self.entries.insert(key.to_string(), raw);
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store, one JSON file per key, for native hosts of the client
/// core.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key.replace(':', "-")))
    }
}

impl AwardStore for FileStore {
    fn load(&self, key: &str) -> Option<PendingAward> {
        let raw = fs::read_to_string(self.path_for(key)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn save(&mut self, key: &str, award: &PendingAward) -> Result<(), String> {
        let raw = serde_json::to_string(award).map_err(|e| e.to_string())?;
        fs::write(self.path_for(key), raw).map_err(|e| e.to_string())
    }

    fn delete(&mut self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}
