//! ─── Protocol constants ─────────────────────────────────────────────────────
//!
//! Defaults for knobs that are normally supplied through configuration
//! (`sentinel-node`'s config layer). These are the values used when a config
//! key is left unset, not hard limits.

// ── RPC client (C2) ───────────────────────────────────────────────────────

/// Per-call deadline for `eth_*` JSON-RPC requests.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Maximum retry attempts for a transient RPC failure before the caller sees
/// an error.
pub const DEFAULT_RPC_RETRY_MAX: u32 = 5;

/// Initial backoff delay before the first retry; doubles each attempt up to
/// `DEFAULT_RPC_RETRY_MAX_DELAY_MS`.
pub const DEFAULT_RPC_RETRY_DELAY_MS: u64 = 250;
pub const DEFAULT_RPC_RETRY_MAX_DELAY_MS: u64 = 8_000;

// ── Scanner scheduler (C7) ────────────────────────────────────────────────

/// Maximum blocks requested per `eth_getLogs` call.
pub const DEFAULT_SCAN_BATCH_SIZE: u64 = 2_000;

/// Confirmation depth subtracted from chain head before a block is
/// considered safe to ingest.
pub const DEFAULT_SCAN_CONFIRMATIONS: u64 = 12;

/// Sleep between ticks while catching up (behind safe head).
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 2;

/// Sleep between ticks once caught up to safe head.
pub const DEFAULT_SCAN_INTERVAL_SLOW_SECS: u64 = 12;

// ── Flow state refresher (C9) ─────────────────────────────────────────────

pub const DEFAULT_FLOW_REFRESH_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_FLOW_REFRESH_BATCH_SIZE: usize = 500;

// ── Timelock semantics ────────────────────────────────────────────────────

/// Default Compound grace period when a watched contract's row does not
/// carry one explicitly (14 days, matching Compound Governor's on-chain
/// default).
pub const DEFAULT_GRACE_PERIOD_SECS: i64 = 14 * 24 * 3600;

// ── Notification dispatcher (C10) ─────────────────────────────────────────

/// Bounded capacity of the in-memory `StatusChanged` queue feeding the
/// dispatcher; producers block once full rather than drop events.
pub const DEFAULT_NOTIFY_QUEUE_CAPACITY: usize = 1_024;

// ── Contract registry (C6) ────────────────────────────────────────────────

/// How often the in-memory active-contract cache is refreshed from the
/// store.
pub const DEFAULT_REGISTRY_REFRESH_INTERVAL_SECS: u64 = 30;

// ── Graceful shutdown (C11) ───────────────────────────────────────────────

/// Grace period given to in-flight scan ticks to finish after a shutdown
/// signal before the process exits regardless.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
