//! Fixed-capacity pool of bond records
//!
//! The pool is the single store of per-peer security material. Slots are
//! created once at construction and only ever have their contents replaced;
//! records are reached through generational [`KeyHandle`]s.
//!
//! The pool does no locking. Every operation runs to completion, and the
//! embedder is expected to call it from one serialized context (or wrap it
//! in a [`SharedKeyPool`]). Enumeration borrows the pool immutably, so the
//! pool cannot be changed while an iterator is alive.

use super::config::KeysConfig;
use super::constants::ID_ANY;
use super::host::BondHost;
use super::settings::SettingsStore;
use super::types::*;
use crate::error::invalid_usage;
use crate::gap::LeAddress;
use log::{debug, error};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Pool shared with other threads; one lock covers every operation
pub type SharedKeyPool = Arc<Mutex<KeyPool>>;

#[derive(Debug, Default)]
pub(crate) struct Slot {
    /// Bumped each time the slot is emptied
    pub(crate) generation: u32,
    pub(crate) record: Option<KeyRecord>,
}

/// Bond record store
pub struct KeyPool {
    config: KeysConfig,
    pub(crate) slots: Vec<Slot>,
    /// Highest aging counter handed out so far
    pub(crate) aging_counter: u32,
    pub(crate) last_updated: Option<KeyHandle>,
    pub(crate) settings: Option<Box<dyn SettingsStore + Send>>,
}

impl fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPool")
            .field("config", &self.config)
            .field("slots", &self.slots)
            .field("aging_counter", &self.aging_counter)
            .field("last_updated", &self.last_updated)
            .field("persistent", &self.settings.is_some())
            .finish()
    }
}

impl KeyPool {
    /// Create an empty pool without persistence
    pub fn new(config: KeysConfig) -> Self {
        let slots = (0..config.max_paired).map(|_| Slot::default()).collect();
        Self {
            config,
            slots,
            aging_counter: 0,
            last_updated: None,
            settings: None,
        }
    }

    /// Create an empty pool that mirrors its records into `settings`
    pub fn with_settings<S>(config: KeysConfig, settings: S) -> Self
    where
        S: SettingsStore + Send + 'static,
    {
        let mut pool = Self::new(config);
        pool.settings = Some(Box::new(settings));
        pool
    }

    pub fn config(&self) -> &KeysConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.record.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_persistent(&self) -> bool {
        self.settings.is_some()
    }

    /// Record behind a handle, or None if the slot has been cleared since
    pub fn get(&self, handle: KeyHandle) -> Option<&KeyRecord> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_ref())
    }

    pub fn get_mut(&mut self, handle: KeyHandle) -> Option<&mut KeyRecord> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.record.as_mut())
    }

    /// Raw slot contents by position; None for an empty slot
    pub fn slot(&self, index: usize) -> Option<&KeyRecord> {
        self.slots.get(index).and_then(|slot| slot.record.as_ref())
    }

    pub(crate) fn handle_at(&self, index: usize) -> KeyHandle {
        KeyHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    pub(crate) fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.record.is_none())
    }

    fn position(&self, mut pred: impl FnMut(&KeyRecord) -> bool) -> Option<KeyHandle> {
        self.slots
            .iter()
            .position(|slot| slot.record.as_ref().map_or(false, &mut pred))
            .map(|index| self.handle_at(index))
    }

    /// Exact `(id, addr)` lookup regardless of the keys held
    pub fn find_addr(&self, id: u8, addr: &LeAddress) -> Option<KeyHandle> {
        self.position(|record| record.matches(id, addr))
    }

    /// Exact `(id, addr)` lookup that also requires a key of `key_type`
    pub fn find(&self, key_type: KeyType, id: u8, addr: &LeAddress) -> Option<KeyHandle> {
        self.position(|record| key_type.accepts(record.keys) && record.matches(id, addr))
    }

    /// Find the record for `(id, addr)`, creating it if needed.
    ///
    /// A new record starts with no keys. When the pool is full the
    /// configured overwrite policy decides whether an older bond is given
    /// up; None means no slot could be found.
    pub fn get_addr<H>(&mut self, id: u8, addr: &LeAddress, host: &mut H) -> Option<KeyHandle>
    where
        H: BondHost + ?Sized,
    {
        if addr.is_any() {
            invalid_usage("keys requested for the unassigned address");
        }

        if let Some(handle) = self.find_addr(id, addr) {
            return Some(handle);
        }

        let index = match self.first_free_slot() {
            Some(index) => index,
            None => match self.reclaim_slot(host) {
                Some(index) => index,
                None => {
                    debug!("Unable to create keys for {}", addr);
                    return None;
                }
            },
        };

        let aging_counter = self.next_aging_counter();
        self.slots[index].record = Some(KeyRecord {
            aging_counter,
            ..KeyRecord::new(id, *addr)
        });
        let handle = self.handle_at(index);
        self.last_updated = Some(handle);

        debug!("Created keys in slot {} for {} on id {}", index, addr, id);
        Some(handle)
    }

    /// [`get_addr`](Self::get_addr), then mark `key_type` as present
    pub fn get_type<H>(
        &mut self,
        key_type: KeyType,
        id: u8,
        addr: &LeAddress,
        host: &mut H,
    ) -> Option<KeyHandle>
    where
        H: BondHost + ?Sized,
    {
        if let Some(handle) = self.find(key_type, id, addr) {
            return Some(handle);
        }

        let handle = self.get_addr(id, addr, host)?;
        self.add_type(handle, key_type);
        Some(handle)
    }

    pub fn add_type(&mut self, handle: KeyHandle, key_type: KeyType) {
        match self.get_mut(handle) {
            Some(record) => record.keys.insert(key_type),
            None => invalid_usage("add_type called with a stale key handle"),
        }
    }

    /// Occupied records accepted by `key_type`, in slot order
    pub fn iter_type(
        &self,
        key_type: KeyType,
    ) -> impl Iterator<Item = (KeyHandle, &KeyRecord)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.record
                .as_ref()
                .filter(|record| key_type.accepts(record.keys))
                .map(|record| {
                    (
                        KeyHandle {
                            index,
                            generation: slot.generation,
                        },
                        record,
                    )
                })
        })
    }

    pub fn for_each_type<F>(&self, key_type: KeyType, mut func: F)
    where
        F: FnMut(KeyHandle, &KeyRecord),
    {
        for (handle, record) in self.iter_type(key_type) {
            func(handle, record);
        }
    }

    /// Established bonds of a local identity, in slot order
    pub fn bonds(&self, id: u8) -> impl Iterator<Item = BondInfo> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.record.as_ref())
            .filter(move |record| record.id == id && record.is_bonded())
            .map(|record| BondInfo { addr: record.addr })
    }

    pub fn foreach_bond<F>(&self, id: u8, mut func: F)
    where
        F: FnMut(&BondInfo),
    {
        for info in self.bonds(id) {
            func(&info);
        }
    }

    /// Empty a slot and invalidate handles to it
    pub(crate) fn release(&mut self, index: usize) -> Option<KeyRecord> {
        let slot = &mut self.slots[index];
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if self.last_updated.map_or(false, |handle| handle.index == index) {
            self.last_updated = None;
        }
        Some(record)
    }

    /// Forget a record: its keys, its address and its persisted copy.
    ///
    /// A record whose identity reached the resolving list is reported to the
    /// host first so the controller entry can go too.
    pub fn clear<H>(&mut self, handle: KeyHandle, host: &mut H)
    where
        H: BondHost + ?Sized,
    {
        if self.get(handle).is_none() {
            invalid_usage("clear called with a stale key handle");
        }
        let record = match self.release(handle.index) {
            Some(record) => record,
            None => return,
        };

        debug!("Clearing keys for {} on id {}", record.addr, record.id);

        if record.state.contains(KeyState::ID_ADDED) {
            host.identity_removed(&record);
        }
        self.delete_stored(&record);
    }

    /// Clear every record of `id`, or of every identity for [`ID_ANY`]
    pub fn clear_all<H>(&mut self, id: u8, host: &mut H)
    where
        H: BondHost + ?Sized,
    {
        // Reserved slots without any key are cleared too
        let handles: Vec<KeyHandle> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.record
                    .as_ref()
                    .map_or(false, |record| id == ID_ANY || record.id == id)
            })
            .map(|(index, _)| self.handle_at(index))
            .collect();

        for handle in handles {
            self.clear(handle, host);
        }
    }

    /// Hand out a counter above every counter currently in the pool.
    ///
    /// Once the high-water mark reaches `u32::MAX` the occupied records are
    /// renumbered `1..=n` in their existing order first.
    pub(crate) fn next_aging_counter(&mut self) -> u32 {
        if self.aging_counter == u32::MAX {
            self.compact_aging_counters();
        }
        self.aging_counter += 1;
        self.aging_counter
    }

    fn compact_aging_counters(&mut self) {
        let mut order: Vec<(u32, usize)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.record
                    .as_ref()
                    .map(|record| (record.aging_counter, index))
            })
            .collect();
        order.sort_unstable();

        let mut counter = 0u32;
        for (_, index) in order {
            counter += 1;
            if let Some(record) = self.slots[index].record.as_mut() {
                record.aging_counter = counter;
            }
        }

        debug!("Renumbered aging counters of {} records", counter);
        self.aging_counter = counter;
    }

    /// Highest aging counter handed out so far
    pub fn aging_high_water(&self) -> u32 {
        self.aging_counter
    }

    /// Mark the record for `(id, addr)` as the most recently used one.
    ///
    /// Unknown peers are ignored.
    pub fn update_usage(&mut self, id: u8, addr: &LeAddress) {
        let handle = match self.find_addr(id, addr) {
            Some(handle) => handle,
            None => return,
        };

        let aging_counter = self.next_aging_counter();
        if let Some(record) = self.get_mut(handle) {
            record.aging_counter = aging_counter;
        }
        self.last_updated = Some(handle);
        debug!("Aging counter of {} on id {} is now {}", addr, id, aging_counter);

        if self.config.save_aging_counter_on_pairing {
            if let Err(err) = self.store(handle) {
                error!("Failed to persist aging counter for {}: {}", addr, err);
            }
        }
    }

    /// Record most recently created or touched by usage tracking
    pub fn last_updated(&self) -> Option<KeyHandle> {
        self.last_updated.filter(|handle| self.get(*handle).is_some())
    }
}
