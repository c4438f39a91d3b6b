//! Platform constants
//!
//! Limits imposed by the Bitrix24 REST API. They are not configurable on the
//! portal side, so they live here rather than in [`crate::config`].

/// Records returned per page by every `*.list` method.
pub const PAGE_SIZE: u64 = 50;

/// Maximum number of commands accepted by one `batch` submission.
pub const MAX_COMMANDS_PER_BATCH: usize = 50;

/// Suffix identifying list-style methods (`crm.deal.list`, `user.list`).
pub const LIST_METHOD_SUFFIX: &str = ".list";

/// Parameter carrying the page offset on list methods.
pub const START_PARAM: &str = "start";

/// Method used by the batched-invocation entry point.
pub const BATCH_METHOD: &str = "batch";

/// Lightweight method used to verify a session during initialization.
pub const DEFAULT_HANDSHAKE_METHOD: &str = "server.time";

/// Fallback description when the portal reports an error without one.
pub const GENERIC_REMOTE_ERROR: &str = "Bitrix24 API error";
