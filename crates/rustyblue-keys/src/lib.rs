//! RustyBlue Keys - bond credential storage for a Bluetooth LE host stack
//!
//! This library holds the per-peer security material (long-term keys,
//! identity resolving keys, signing keys) of bonded devices in a
//! fixed-capacity pool, resolves private addresses back to their bonds,
//! decides which bond to give up when the pool is full, and mirrors the
//! records into a key-value settings store.

pub mod error;
pub mod gap;
pub mod keys;

// Re-export common types for convenience
pub use error::{KeysError, KeysResult};
pub use gap::{AddressType, BdAddr, LeAddress};
pub use keys::{
    BondHost, BondInfo, Connection, ConnectionState, DetachedHost, IrkResolver, KeyHandle,
    KeyPool, KeyRecord, KeyType, KeysConfig, MemorySettings, OverwritePolicy, SettingsStore,
    SharedKeyPool,
};
