// Core tuning constants for match sync and payout. Kept in one place so the
// coordinator, variant modules, and reward engine share them without duplication.
pub const TICK_INTERVAL_MS: u64 = 150;

pub const POINTS_PER_CORRECT: i64 = 10;
pub const EXP_PER_CORRECT: i64 = 5;

pub const SURVIVAL_STARTING_LIVES: u32 = 3;

pub const DICE_FACES: u8 = 6;
pub const DICE_SCORE_BONUS_DIVISOR: i64 = 10;
pub const DICE_ROUND_BUDGET: u32 = 10;

pub const TEAM_STAGE_BUDGET: u32 = 10;

pub const MIND_GUESS_POINTS: i64 = 10;

pub const QUICK_ROUND_BUDGET: u32 = 10;

pub const AWARD_STORE_PREFIX: &str = "pending-award";
