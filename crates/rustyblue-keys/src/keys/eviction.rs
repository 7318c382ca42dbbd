//! Slot reclamation for a full pool
//!
//! Under [`OverwritePolicy::OverwriteOldest`] the bond with the smallest
//! aging counter that is not protecting a live link is given up. Ties go to
//! the lowest slot index. A pool whose every bond has an active link is
//! never shrunk.

use super::config::OverwritePolicy;
use super::host::{BondHost, Connection, ConnectionState};
use super::pool::KeyPool;
use crate::error::invalid_usage;
use log::{debug, warn};

impl KeyPool {
    /// Slots whose `(id, addr)` belongs to a connected link
    pub(crate) fn slots_in_use(&self, connections: &[Connection]) -> Vec<bool> {
        let mut in_use = vec![false; self.slots.len()];

        for conn in connections {
            if conn.state != ConnectionState::Connected {
                continue;
            }
            let dst = match conn.dst {
                Some(dst) => dst,
                None => invalid_usage("connected link reported without a peer address"),
            };
            if let Some(handle) = self.find_addr(conn.id, &dst) {
                in_use[handle.index] = true;
            }
        }

        in_use
    }

    /// Least recently used occupied slot not marked in `in_use`
    pub(crate) fn oldest_unused(&self, in_use: &[bool]) -> Option<usize> {
        let mut oldest: Option<(usize, u32)> = None;

        for (index, slot) in self.slots.iter().enumerate() {
            let record = match slot.record.as_ref() {
                Some(record) => record,
                None => continue,
            };
            if in_use[index] {
                continue;
            }
            match oldest {
                Some((_, counter)) if counter <= record.aging_counter => {}
                _ => oldest = Some((index, record.aging_counter)),
            }
        }

        oldest.map(|(index, _)| index)
    }

    /// Free a slot in a full pool according to the overwrite policy.
    ///
    /// The chosen bond is handed to the host's unpair, which has to clear
    /// it; the slot index is returned only once it is actually empty.
    pub(crate) fn reclaim_slot<H>(&mut self, host: &mut H) -> Option<usize>
    where
        H: BondHost + ?Sized,
    {
        if self.config().overwrite == OverwritePolicy::NoOverwrite {
            return None;
        }

        let in_use = self.slots_in_use(&host.active_connections());
        let index = match self.oldest_unused(&in_use) {
            Some(index) => index,
            None => {
                debug!("Every bonded peer has an active link, nothing to reclaim");
                return None;
            }
        };

        let (id, addr, aging_counter) = match self.slot(index) {
            Some(record) => (record.id, record.addr, record.aging_counter),
            None => return None,
        };
        debug!(
            "Reclaiming slot {} from {} on id {} (aging counter {})",
            index, addr, id, aging_counter
        );

        let err = host.unpair(self, id, &addr);
        if err < 0 {
            warn!("Unpairing {} on id {} failed (err {})", addr, id, err);
        }

        if self.slot(index).is_some() {
            warn!("Slot {} still holds keys after unpairing {}", index, addr);
            return None;
        }

        Some(index)
    }
}
