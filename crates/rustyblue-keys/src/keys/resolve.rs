//! Identity resolution of resolvable private addresses

use super::host::IrkResolver;
use super::pool::KeyPool;
use super::types::{KeyHandle, KeyType};
use crate::gap::LeAddress;
use log::debug;

impl KeyPool {
    /// Find the bond whose IRK generated `addr`.
    ///
    /// Addresses that are not resolvable private addresses are looked up
    /// exactly, like `find(KeyType::IRK, ..)`, without any crypto. For an
    /// RPA the IRK records of `id` are first checked for this address as
    /// their last resolved one, then tried against the resolver in slot
    /// order; the first match wins and remembers the address.
    pub fn find_irk<R>(&mut self, id: u8, addr: &LeAddress, resolver: &R) -> Option<KeyHandle>
    where
        R: IrkResolver + ?Sized,
    {
        if !addr.is_rpa() {
            return self.find(KeyType::IRK, id, addr);
        }

        let candidates: Vec<KeyHandle> = self
            .iter_type(KeyType::IRK)
            .filter(|(_, record)| record.id == id)
            .map(|(handle, _)| handle)
            .collect();

        for handle in candidates.iter().copied() {
            if self.get(handle).map_or(false, |record| record.irk.rpa == addr.addr) {
                return Some(handle);
            }
        }

        for handle in candidates {
            let record = match self.get_mut(handle) {
                Some(record) => record,
                None => continue,
            };
            if resolver.irk_matches(&record.irk.val, &addr.addr) {
                record.irk.rpa = addr.addr;
                debug!("Resolved {} to {}", addr, record.addr);
                return Some(handle);
            }
        }

        None
    }
}
