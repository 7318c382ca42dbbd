//! Constants for the bond store

// Key type bits
pub const KEYS_PERIPH_LTK: u8 = 0x01;
pub const KEYS_IRK: u8 = 0x02;
pub const KEYS_LTK: u8 = 0x04;
pub const KEYS_LOCAL_CSRK: u8 = 0x08;
pub const KEYS_REMOTE_CSRK: u8 = 0x10;
pub const KEYS_LTK_P256: u8 = 0x20;

// Key flags
pub const KEYS_FLAG_AUTHENTICATED: u8 = 0x01;
pub const KEYS_FLAG_DEBUG: u8 = 0x02;
pub const KEYS_FLAG_SC: u8 = 0x04;

// Identity state of a record
pub const KEYS_STATE_ID_PENDING_ADD: u8 = 0x01;
pub const KEYS_STATE_ID_PENDING_DEL: u8 = 0x02;
pub const KEYS_STATE_ID_ADDED: u8 = 0x04;

/// Identity value meaning "every local identity" for bulk operations
pub const ID_ANY: u8 = 0xFF;

/// Default number of bonded peers the pool can hold
pub const DEFAULT_MAX_PAIRED: usize = 4;

// Settings store layout
pub const SETTINGS_ROOT: &str = "bt";
pub const SETTINGS_SUBSYS_KEYS: &str = "keys";

// Key material sizes
pub const KEY_SIZE: usize = 16;
pub const LTK_RAND_SIZE: usize = 8;
pub const LTK_ENCODED_LEN: usize = LTK_RAND_SIZE + 2 + KEY_SIZE;
pub const IRK_ENCODED_LEN: usize = KEY_SIZE + 6;
pub const CSRK_ENCODED_LEN: usize = KEY_SIZE + 4;

/// Length of a record as written to the settings store:
/// enc_size, flags, keys, ltk, irk, periph_ltk, local_csrk, remote_csrk, aging counter
pub const RECORD_ENCODED_LEN: usize =
    3 + LTK_ENCODED_LEN + IRK_ENCODED_LEN + LTK_ENCODED_LEN + 2 * CSRK_ENCODED_LEN + 4;
