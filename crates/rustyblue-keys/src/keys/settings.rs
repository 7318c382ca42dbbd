//! Persistence of bond records in a key-value settings store
//!
//! Records live under `bt/keys/<address><type>[/<id>]`. The identity suffix
//! is left out for identity 0 so stores written by single-identity
//! deployments keep their paths.

use super::constants::*;
use super::host::BondHost;
use super::pool::KeyPool;
use super::types::*;
use crate::error::{invalid_usage, KeysError, KeysResult};
use crate::gap::{AddressType, BdAddr, LeAddress, BD_ADDR_LEN};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Write};

/// Key-value store the bond records are persisted in.
///
/// Errors carry the store's own negative status code.
pub trait SettingsStore {
    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), i32>;

    fn delete(&mut self, key: &str) -> Result<(), i32>;
}

/// In-memory implementation of SettingsStore
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_slice()))
    }
}

impl SettingsStore for MemorySettings {
    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), i32> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), i32> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Settings path of the record for `(id, addr)`
pub fn key_path(id: u8, addr: &LeAddress) -> String {
    let mut msb_first = addr.addr.bytes;
    msb_first.reverse();

    let mut path = format!(
        "{}/{}/{}{}",
        SETTINGS_ROOT,
        SETTINGS_SUBSYS_KEYS,
        hex::encode(msb_first),
        addr.addr_type.to_u8()
    );
    if id != 0 {
        path.push('/');
        path.push_str(&id.to_string());
    }
    path
}

/// Recover `(id, addr)` from a settings path produced by [`key_path`]
pub fn parse_key_path(path: &str) -> KeysResult<(u8, LeAddress)> {
    let invalid = || KeysError::InvalidKeyPath(path.to_string());

    let prefix = format!("{}/{}/", SETTINGS_ROOT, SETTINGS_SUBSYS_KEYS);
    let name = path.strip_prefix(prefix.as_str()).ok_or_else(invalid)?;

    let mut parts = name.split('/');
    let addr_part = parts.next().ok_or_else(invalid)?;
    let id = match parts.next() {
        Some(id) => id.parse::<u8>().map_err(|_| invalid())?,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }
    if addr_part.len() != 2 * BD_ADDR_LEN + 1 || !addr_part.is_ascii() {
        return Err(invalid());
    }

    let (hex_part, type_part) = addr_part.split_at(2 * BD_ADDR_LEN);
    let mut bytes = hex::decode(hex_part).map_err(|_| invalid())?;
    bytes.reverse();
    let addr = BdAddr::from_slice(&bytes).ok_or_else(invalid)?;

    let addr_type = type_part
        .parse::<u8>()
        .ok()
        .and_then(AddressType::from_u8)
        .ok_or_else(invalid)?;

    Ok((id, LeAddress { addr_type, addr }))
}

fn write_ltk(buf: &mut Vec<u8>, ltk: &LongTermKey) -> io::Result<()> {
    buf.write_all(&ltk.rand)?;
    buf.write_u16::<LittleEndian>(ltk.ediv)?;
    buf.write_all(&ltk.val)
}

fn write_csrk(buf: &mut Vec<u8>, csrk: &SigningKey) -> io::Result<()> {
    buf.write_all(&csrk.val)?;
    buf.write_u32::<LittleEndian>(csrk.counter)
}

fn write_record(buf: &mut Vec<u8>, record: &KeyRecord) -> io::Result<()> {
    buf.write_u8(record.enc_size)?;
    buf.write_u8(record.flags.bits())?;
    buf.write_u8(record.keys.bits())?;
    write_ltk(buf, &record.ltk)?;
    buf.write_all(&record.irk.val)?;
    buf.write_all(record.irk.rpa.as_slice())?;
    write_ltk(buf, &record.periph_ltk)?;
    write_csrk(buf, &record.local_csrk)?;
    write_csrk(buf, &record.remote_csrk)?;
    buf.write_u32::<LittleEndian>(record.aging_counter)
}

/// Stored representation of a record's key material and usage stamp.
///
/// Identity and address are carried by the settings path, and the
/// resolving-list state is runtime only, so neither is encoded.
pub fn encode_record(record: &KeyRecord) -> KeysResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(RECORD_ENCODED_LEN);
    write_record(&mut buf, record).map_err(|err| KeysError::Encode(err.to_string()))?;
    Ok(buf)
}

fn read_ltk(cursor: &mut Cursor<&[u8]>) -> io::Result<LongTermKey> {
    let mut ltk = LongTermKey::default();
    cursor.read_exact(&mut ltk.rand)?;
    ltk.ediv = cursor.read_u16::<LittleEndian>()?;
    cursor.read_exact(&mut ltk.val)?;
    Ok(ltk)
}

fn read_csrk(cursor: &mut Cursor<&[u8]>) -> io::Result<SigningKey> {
    let mut csrk = SigningKey::default();
    cursor.read_exact(&mut csrk.val)?;
    csrk.counter = cursor.read_u32::<LittleEndian>()?;
    Ok(csrk)
}

fn read_record(record: &mut KeyRecord, cursor: &mut Cursor<&[u8]>) -> io::Result<()> {
    record.enc_size = cursor.read_u8()?;
    record.flags = KeyFlags::from_bits_truncate(cursor.read_u8()?);
    record.keys = KeyType::from_bits_truncate(cursor.read_u8()?);
    record.ltk = read_ltk(cursor)?;
    cursor.read_exact(&mut record.irk.val)?;
    cursor.read_exact(&mut record.irk.rpa.bytes)?;
    record.periph_ltk = read_ltk(cursor)?;
    record.local_csrk = read_csrk(cursor)?;
    record.remote_csrk = read_csrk(cursor)?;
    record.aging_counter = cursor.read_u32::<LittleEndian>()?;
    Ok(())
}

/// Rebuild the record stored for `(id, addr)`
pub fn decode_record(id: u8, addr: LeAddress, bytes: &[u8]) -> KeysResult<KeyRecord> {
    if bytes.len() != RECORD_ENCODED_LEN {
        return Err(KeysError::InvalidRecordLength(bytes.len()));
    }

    let mut record = KeyRecord::new(id, addr);
    let mut cursor = Cursor::new(bytes);
    read_record(&mut record, &mut cursor)
        .map_err(|_| KeysError::InvalidRecordLength(bytes.len()))?;
    Ok(record)
}

impl KeyPool {
    /// Persist a record under its settings path.
    ///
    /// The store's status is passed through untouched and nothing is
    /// retried; the in-memory record stays as it is either way. Without a
    /// settings store this does nothing.
    pub fn store(&mut self, handle: KeyHandle) -> KeysResult<()> {
        let record = match self.get(handle) {
            Some(record) => record,
            None => invalid_usage("store called with a stale key handle"),
        };
        let path = key_path(record.id, &record.addr);
        let bytes = encode_record(record)?;

        let settings = match self.settings.as_mut() {
            Some(settings) => settings,
            None => return Ok(()),
        };

        match settings.save(&path, &bytes) {
            Ok(()) => {
                debug!("Stored keys at {}", path);
                Ok(())
            }
            Err(err) => {
                error!("Failed to save keys at {} (err {})", path, err);
                Err(KeysError::Storage(err))
            }
        }
    }

    /// Drop the persisted copy of a record that is being cleared
    pub(crate) fn delete_stored(&mut self, record: &KeyRecord) {
        if let Some(settings) = self.settings.as_mut() {
            let path = key_path(record.id, &record.addr);
            if let Err(err) = settings.delete(&path) {
                error!("Failed to delete keys at {} (err {})", path, err);
            }
        }
    }

    /// Restore one record read back from the settings store.
    ///
    /// An empty value means the record was deleted. Loading never evicts:
    /// when no slot is free the record is rejected with `NoFreeSlot`.
    pub fn load(&mut self, path: &str, bytes: &[u8]) -> KeysResult<Option<KeyHandle>> {
        let (id, addr) = parse_key_path(path)?;
        if addr.is_any() {
            return Err(KeysError::InvalidKeyPath(path.to_string()));
        }

        if bytes.is_empty() {
            if let Some(handle) = self.find_addr(id, &addr) {
                debug!("Dropping deleted keys for {} on id {}", addr, id);
                self.release(handle.index);
            }
            return Ok(None);
        }

        let record = decode_record(id, addr, bytes)?;
        let index = match self.find_addr(id, &addr) {
            Some(handle) => handle.index,
            None => match self.first_free_slot() {
                Some(index) => index,
                None => {
                    warn!("No free slot to restore keys for {} on id {}", addr, id);
                    return Err(KeysError::NoFreeSlot);
                }
            },
        };

        let aging_counter = record.aging_counter;
        self.slots[index].record = Some(record);
        let handle = self.handle_at(index);

        if aging_counter > self.aging_counter {
            self.aging_counter = aging_counter;
            self.last_updated = Some(handle);
        }

        debug!("Restored keys for {} on id {}", addr, id);
        Ok(Some(handle))
    }

    /// Announce every restored identity to the host resolving list.
    pub fn restore_identities<H: BondHost + ?Sized>(&mut self, host: &mut H) {
        for slot in self.slots.iter_mut() {
            if let Some(record) = slot.record.as_mut() {
                if record.keys.contains(KeyType::IRK) && !record.state.contains(KeyState::ID_ADDED)
                {
                    host.identity_added(record);
                    record.state.insert(KeyState::ID_ADDED);
                }
            }
        }
    }
}
