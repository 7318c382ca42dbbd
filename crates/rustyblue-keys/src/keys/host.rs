//! Collaborator interfaces the bond store calls out to
//!
//! The embedding host stack implements these; the store never reaches for
//! connection, identity or crypto state on its own.

use super::pool::KeyPool;
use super::types::KeyRecord;
use crate::gap::{BdAddr, LeAddress};
use log::debug;

/// Link state as reported by the connection layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Snapshot of one link known to the connection layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Local identity the link was established with
    pub id: u8,
    pub state: ConnectionState,
    /// Peer address; a connected link always has one
    pub dst: Option<LeAddress>,
}

impl Connection {
    pub fn connected(id: u8, dst: LeAddress) -> Self {
        Self {
            id,
            state: ConnectionState::Connected,
            dst: Some(dst),
        }
    }
}

/// Host stack services used by eviction and clearing.
pub trait BondHost {
    /// Links currently known to the connection layer
    fn active_connections(&self) -> Vec<Connection>;

    /// Tear down the bond with a peer.
    ///
    /// Implementations must release the record through [`KeyPool::clear`].
    /// Returns 0 on success or a negative status.
    fn unpair(&mut self, pool: &mut KeyPool, id: u8, addr: &LeAddress) -> i32;

    /// A record whose identity was added to the resolving list is going away
    fn identity_removed(&mut self, _record: &KeyRecord) {}

    /// A restored record carries an identity that should be resolvable again
    fn identity_added(&mut self, _record: &KeyRecord) {}
}

/// Checks whether a resolvable private address was generated from an IRK.
pub trait IrkResolver {
    fn irk_matches(&self, irk: &[u8; 16], addr: &BdAddr) -> bool;
}

impl<F> IrkResolver for F
where
    F: Fn(&[u8; 16], &BdAddr) -> bool,
{
    fn irk_matches(&self, irk: &[u8; 16], addr: &BdAddr) -> bool {
        self(irk, addr)
    }
}

/// Host with no link layer attached: nothing is ever connected and
/// unpairing only forgets the stored keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl BondHost for DetachedHost {
    fn active_connections(&self) -> Vec<Connection> {
        Vec::new()
    }

    fn unpair(&mut self, pool: &mut KeyPool, id: u8, addr: &LeAddress) -> i32 {
        if let Some(handle) = pool.find_addr(id, addr) {
            debug!("Forgetting keys for {} on id {}", addr, id);
            pool.clear(handle, self);
        }
        0
    }
}
