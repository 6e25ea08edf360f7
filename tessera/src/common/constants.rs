// key layout
pub const DEFAULT_KEY_PREFIX: &str = "tessera";
pub const ID_KEY_PREFIX: &str = "id";
pub const SEGMENT_KEY_PREFIX: &str = "segment";
pub const INDEX_KEY_PREFIX: &str = "index";
pub const NAME_SEPARATOR: char = '/';

// store limits
pub const DEFAULT_MAX_VALUE_SIZE: usize = 65_536;
pub const DEFAULT_MAX_ATOMIC_OPERATIONS: usize = 1_000;
/// Room left in every segment for the store's own framing.
pub const SEGMENT_HEADROOM: usize = 1_024;

// query defaults
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_MAX_RETRIES: u32 = 10;
