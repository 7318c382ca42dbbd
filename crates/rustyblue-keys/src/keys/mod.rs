//! Bond credential store
//!
//! This module keeps the security material of bonded peers:
//! - Fixed-capacity pool keyed by local identity and peer address
//! - Typed lookups and enumeration over the stored key kinds
//! - Resolution of resolvable private addresses through stored IRKs
//! - Replacement of the least recently used bond when the pool is full
//! - Mirroring of records into a key-value settings store

mod config;
mod constants;
mod eviction;
mod host;
mod pool;
mod resolve;
mod settings;
mod types;

// Re-export public API
pub use self::config::{KeysConfig, OverwritePolicy};
pub use self::constants::{DEFAULT_MAX_PAIRED, ID_ANY, KEY_SIZE, RECORD_ENCODED_LEN};
pub use self::host::{BondHost, Connection, ConnectionState, DetachedHost, IrkResolver};
pub use self::pool::{KeyPool, SharedKeyPool};
pub use self::settings::{
    decode_record, encode_record, key_path, parse_key_path, MemorySettings, SettingsStore,
};
pub use self::types::*;
