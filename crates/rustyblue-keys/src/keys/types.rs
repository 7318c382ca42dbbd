//! Type definitions for the bond store
//!
//! Key material layouts follow the Security Manager key distribution: an LTK
//! with its EDIV/Rand pair, an IRK with the last address it resolved, and
//! signing keys with their counters.

use super::constants::*;
use crate::gap::{BdAddr, LeAddress};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Which key kinds a record holds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyType: u8 {
        const PERIPH_LTK = KEYS_PERIPH_LTK;
        const IRK = KEYS_IRK;
        const LTK = KEYS_LTK;
        const LOCAL_CSRK = KEYS_LOCAL_CSRK;
        const REMOTE_CSRK = KEYS_REMOTE_CSRK;
        const LTK_P256 = KEYS_LTK_P256;
        const ALL = Self::PERIPH_LTK.bits()
            | Self::IRK.bits()
            | Self::LTK.bits()
            | Self::LOCAL_CSRK.bits()
            | Self::REMOTE_CSRK.bits()
            | Self::LTK_P256.bits();
    }
}

impl KeyType {
    /// Filter test used by typed lookups and enumeration.
    ///
    /// A record is accepted when it holds at least one of the filter's key
    /// kinds, so `ALL` matches every record with a non-empty mask and a
    /// slot that was reserved but never given a key matches nothing.
    pub fn accepts(&self, keys: KeyType) -> bool {
        self.intersects(keys)
    }
}

bitflags! {
    /// Properties of the pairing that produced the keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u8 {
        const AUTHENTICATED = KEYS_FLAG_AUTHENTICATED;
        const DEBUG = KEYS_FLAG_DEBUG;
        const SC = KEYS_FLAG_SC;
    }
}

bitflags! {
    /// Progress of the peer identity through the controller resolving list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyState: u8 {
        const ID_PENDING_ADD = KEYS_STATE_ID_PENDING_ADD;
        const ID_PENDING_DEL = KEYS_STATE_ID_PENDING_DEL;
        const ID_ADDED = KEYS_STATE_ID_ADDED;
    }
}

/// Security level a stored LTK can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityLevel {
    /// No encryption key stored
    None = 0,
    /// Encryption without authentication (Just Works)
    EncryptionOnly = 1,
    /// Encryption with authentication (MITM protection)
    EncryptionWithAuthentication = 2,
    /// Authenticated Secure Connections
    SecureConnections = 3,
}

/// Long Term Key (LTK) information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongTermKey {
    /// RAND (Random number)
    pub rand: [u8; LTK_RAND_SIZE],
    /// EDIV (Encrypted Diversifier)
    pub ediv: u16,
    /// Key value
    pub val: [u8; KEY_SIZE],
}

impl LongTermKey {
    pub fn new(val: [u8; KEY_SIZE], ediv: u16, rand: [u8; LTK_RAND_SIZE]) -> Self {
        Self { rand, ediv, val }
    }

    /// Secure Connections keys carry no EDIV/Rand
    pub fn new_secure_connections(val: [u8; KEY_SIZE]) -> Self {
        Self {
            rand: [0; LTK_RAND_SIZE],
            ediv: 0,
            val,
        }
    }
}

/// Identity Resolving Key (IRK)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityResolvingKey {
    /// Key value
    pub val: [u8; KEY_SIZE],
    /// Most recent private address resolved with this key
    pub rpa: BdAddr,
}

impl IdentityResolvingKey {
    pub fn new(val: [u8; KEY_SIZE]) -> Self {
        Self {
            val,
            rpa: BdAddr::ANY,
        }
    }
}

/// Connection Signature Resolving Key (CSRK)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SigningKey {
    /// Key value
    pub val: [u8; KEY_SIZE],
    /// Counter for signed data
    pub counter: u32,
}

impl SigningKey {
    pub fn new(val: [u8; KEY_SIZE]) -> Self {
        Self { val, counter: 0 }
    }

    /// Increment the signing counter
    pub fn increment_counter(&mut self) -> u32 {
        self.counter = self.counter.wrapping_add(1);
        self.counter
    }
}

/// Security material bonded with one peer for one local identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyRecord {
    /// Local identity the bond belongs to
    pub id: u8,
    /// Peer address
    pub addr: LeAddress,
    /// Key kinds present in this record
    pub keys: KeyType,
    pub flags: KeyFlags,
    pub state: KeyState,
    /// Encryption key size negotiated at pairing
    pub enc_size: u8,
    /// Central LTK, also holds the LE Secure Connections key
    pub ltk: LongTermKey,
    /// LTK distributed by the peripheral
    pub periph_ltk: LongTermKey,
    pub irk: IdentityResolvingKey,
    pub local_csrk: SigningKey,
    pub remote_csrk: SigningKey,
    /// Usage stamp; larger means more recently used
    pub aging_counter: u32,
}

impl KeyRecord {
    pub fn new(id: u8, addr: LeAddress) -> Self {
        Self {
            id,
            addr,
            ..Self::default()
        }
    }

    /// True once at least one key has been stored, i.e. the peer is bonded.
    pub fn is_bonded(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn matches(&self, id: u8, addr: &LeAddress) -> bool {
        self.id == id && self.addr == *addr
    }

    /// Get the security level the stored encryption keys provide
    pub fn security_level(&self) -> SecurityLevel {
        if !self
            .keys
            .intersects(KeyType::LTK | KeyType::PERIPH_LTK | KeyType::LTK_P256)
        {
            SecurityLevel::None
        } else if self.flags.contains(KeyFlags::SC | KeyFlags::AUTHENTICATED) {
            SecurityLevel::SecureConnections
        } else if self.flags.contains(KeyFlags::AUTHENTICATED) {
            SecurityLevel::EncryptionWithAuthentication
        } else {
            SecurityLevel::EncryptionOnly
        }
    }
}

impl fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id {} {} keys {:#04x}", self.id, self.addr, self.keys.bits())
    }
}

/// Generational reference to a pool slot.
///
/// A handle is invalidated when its slot is cleared; using it afterwards is
/// detected instead of silently reaching whatever record reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHandle {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl KeyHandle {
    /// Slot position inside the pool
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Bond summary handed to bond enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondInfo {
    pub addr: LeAddress,
}
