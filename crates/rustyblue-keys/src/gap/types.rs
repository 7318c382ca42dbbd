use crate::gap::constants::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressType {
    #[default]
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

impl AddressType {
    pub fn to_u8(&self) -> u8 {
        match self {
            AddressType::Public => PUBLIC_DEVICE_ADDRESS,
            AddressType::Random => RANDOM_DEVICE_ADDRESS,
            AddressType::PublicIdentity => PUBLIC_IDENTITY_ADDRESS,
            AddressType::RandomIdentity => RANDOM_IDENTITY_ADDRESS,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            PUBLIC_DEVICE_ADDRESS => Some(AddressType::Public),
            RANDOM_DEVICE_ADDRESS => Some(AddressType::Random),
            PUBLIC_IDENTITY_ADDRESS => Some(AddressType::PublicIdentity),
            RANDOM_IDENTITY_ADDRESS => Some(AddressType::RandomIdentity),
            _ => None,
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressType::Public => write!(f, "public"),
            AddressType::Random => write!(f, "random"),
            AddressType::PublicIdentity => write!(f, "public-id"),
            AddressType::RandomIdentity => write!(f, "random-id"),
        }
    }
}

/// Six byte device address, stored least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; BD_ADDR_LEN],
}

impl BdAddr {
    pub const ANY: BdAddr = BdAddr {
        bytes: [0; BD_ADDR_LEN],
    };

    pub fn new(bytes: [u8; BD_ADDR_LEN]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= BD_ADDR_LEN {
            let mut bytes = [0u8; BD_ADDR_LEN];
            bytes.copy_from_slice(&slice[0..BD_ADDR_LEN]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn random_subtype(&self) -> u8 {
        self.bytes[BD_ADDR_LEN - 1] & RANDOM_SUBTYPE_MASK
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// A device address qualified by its LE address type.
///
/// Equality compares both the type and the six address bytes; two
/// addresses that resolve to the same identity are still different
/// values here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LeAddress {
    pub addr_type: AddressType,
    pub addr: BdAddr,
}

impl LeAddress {
    /// Sentinel marking an unused key slot.
    pub const ANY: LeAddress = LeAddress {
        addr_type: AddressType::Public,
        addr: BdAddr::ANY,
    };

    pub fn new(addr_type: AddressType, bytes: [u8; BD_ADDR_LEN]) -> Self {
        Self {
            addr_type,
            addr: BdAddr::new(bytes),
        }
    }

    pub fn public(bytes: [u8; BD_ADDR_LEN]) -> Self {
        Self::new(AddressType::Public, bytes)
    }

    pub fn random(bytes: [u8; BD_ADDR_LEN]) -> Self {
        Self::new(AddressType::Random, bytes)
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    /// Resolvable private address: random type with sub-type bits `01`.
    pub fn is_rpa(&self) -> bool {
        self.addr_type == AddressType::Random
            && self.addr.random_subtype() == RANDOM_SUBTYPE_RESOLVABLE
    }

    pub fn is_static_random(&self) -> bool {
        self.addr_type == AddressType::Random
            && self.addr.random_subtype() == RANDOM_SUBTYPE_STATIC
    }

    pub fn is_non_resolvable(&self) -> bool {
        self.addr_type == AddressType::Random
            && self.addr.random_subtype() == RANDOM_SUBTYPE_NON_RESOLVABLE
    }

    /// Public and static random addresses identify a device for its lifetime.
    pub fn is_identity(&self) -> bool {
        match self.addr_type {
            AddressType::Public | AddressType::PublicIdentity | AddressType::RandomIdentity => {
                true
            }
            AddressType::Random => self.is_static_random(),
        }
    }
}

impl fmt::Display for LeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.addr, self.addr_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_type_conversion() {
        for value in 0..=3u8 {
            let addr_type = AddressType::from_u8(value).unwrap();
            assert_eq!(addr_type.to_u8(), value);
        }
        assert_eq!(AddressType::from_u8(0x04), None);
    }

    #[test]
    fn test_random_subtypes() {
        let rpa = LeAddress::random([0x01, 0x02, 0x03, 0x04, 0x05, 0x4A]);
        assert!(rpa.is_rpa());
        assert!(!rpa.is_identity());

        let static_random = LeAddress::random([0x01, 0x02, 0x03, 0x04, 0x05, 0xC1]);
        assert!(static_random.is_static_random());
        assert!(static_random.is_identity());
        assert!(!static_random.is_rpa());

        let nrpa = LeAddress::random([0x01, 0x02, 0x03, 0x04, 0x05, 0x3F]);
        assert!(nrpa.is_non_resolvable());
        assert!(!nrpa.is_rpa());

        // RPA bit pattern on a public address is not an RPA
        let public = LeAddress::public([0x01, 0x02, 0x03, 0x04, 0x05, 0x4A]);
        assert!(!public.is_rpa());
        assert!(public.is_identity());
    }

    #[test]
    fn test_display() {
        let addr = LeAddress::new(AddressType::RandomIdentity, [0x0A, 0x89, 0x67, 0x45, 0x23, 0x01]);
        assert_eq!(addr.to_string(), "01:23:45:67:89:0A (random-id)");
        assert!(LeAddress::ANY.is_any());
        assert!(LeAddress::default().is_any());
    }
}
