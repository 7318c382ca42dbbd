// Address types
pub const PUBLIC_DEVICE_ADDRESS: u8 = 0x00;
pub const RANDOM_DEVICE_ADDRESS: u8 = 0x01;
pub const PUBLIC_IDENTITY_ADDRESS: u8 = 0x02;
pub const RANDOM_IDENTITY_ADDRESS: u8 = 0x03;

// Random address sub-type, taken from the two most significant bits
pub const RANDOM_SUBTYPE_MASK: u8 = 0xC0;
pub const RANDOM_SUBTYPE_NON_RESOLVABLE: u8 = 0x00;
pub const RANDOM_SUBTYPE_RESOLVABLE: u8 = 0x40;
pub const RANDOM_SUBTYPE_STATIC: u8 = 0xC0;

pub const BD_ADDR_LEN: usize = 6;
