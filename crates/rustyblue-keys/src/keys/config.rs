//! Bond store configuration

use super::constants::DEFAULT_MAX_PAIRED;

/// What to do when a new peer needs a slot and the pool is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Refuse; the application has to unpair a device first
    #[default]
    NoOverwrite,
    /// Reclaim the least recently used bond without an active link
    OverwriteOldest,
}

/// Bond store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysConfig {
    /// Number of key slots, fixed for the lifetime of the pool
    pub max_paired: usize,
    /// Replacement policy for a full pool
    pub overwrite: OverwritePolicy,
    /// Persist the record every time its usage is updated
    pub save_aging_counter_on_pairing: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            max_paired: DEFAULT_MAX_PAIRED,
            overwrite: OverwritePolicy::NoOverwrite,
            save_aging_counter_on_pairing: false,
        }
    }
}

impl KeysConfig {
    pub fn new(max_paired: usize) -> Self {
        Self {
            max_paired,
            ..Self::default()
        }
    }

    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_save_aging_counter(mut self, enabled: bool) -> Self {
        self.save_aging_counter_on_pairing = enabled;
        self
    }
}
