//! Platform-wide constants.

/// Maximum retained audit log entries (newest-first; older entries are dropped).
pub const AUDIT_LOG_RETENTION: usize = 1_000;

/// Maximum retained transactions (newest-first; older entries are dropped).
pub const TRANSACTION_LOG_RETENTION: usize = 500;

/// Bonus-buy cost multiplier used when a math model does not configure one.
pub const DEFAULT_BONUS_BUY_MULTIPLIER: u64 = 80;

/// Platform fee charged to operators on wagered amounts (basis points).
pub const PLATFORM_FEE_BPS: u64 = 1_000;

/// Payout multipliers (per match-count tier) for symbols absent from a paytable.
pub const DEFAULT_PAYTABLE_MULTIPLIERS: [u64; 3] = [0, 2, 5];

/// Minimum match count that pays anything.
pub const MIN_MATCH_COUNT: usize = 2;

/// Default operator daily bonus grants.
pub const DEFAULT_DAILY_BONUS_GC: u64 = 2_500;
pub const DEFAULT_DAILY_BONUS_SC: u64 = 1;

/// Default operator welcome grants for newly registered players.
pub const DEFAULT_WELCOME_GC: u64 = 10_000;
pub const DEFAULT_WELCOME_SC: u64 = 10;

/// Seconds per UTC day, used for daily bonus eligibility windows.
pub const SECONDS_PER_DAY: u64 = 86_400;
