/// Example walking a host stack through repeated bond cycles
///
/// Peers are scanned, connected, bonded and disconnected against a pool
/// that is smaller than the number of peers, so the oldest unconnected
/// bond is given up once the pool fills.
use rand::Rng;
use rustyblue_keys::keys::{IdentityResolvingKey, LongTermKey};
use rustyblue_keys::*;

/// Stand-in for the link layer and resolving list of a real host
struct SimulatedHost {
    links: Vec<Connection>,
}

impl BondHost for SimulatedHost {
    fn active_connections(&self) -> Vec<Connection> {
        self.links.clone()
    }

    fn unpair(&mut self, pool: &mut KeyPool, id: u8, addr: &LeAddress) -> i32 {
        println!("  Unpairing {} on id {}", addr, id);
        if let Some(handle) = pool.find_addr(id, addr) {
            pool.clear(handle, self);
        }
        0
    }

    fn identity_removed(&mut self, record: &KeyRecord) {
        println!("  Removed {} from the resolving list", record.addr);
    }

    fn identity_added(&mut self, record: &KeyRecord) {
        println!("  Added {} to the resolving list", record.addr);
    }
}

/// Toy address hash; a real host uses the `ah` function of the controller
fn toy_hash(irk: &[u8; 16], prand: &[u8]) -> [u8; 3] {
    [irk[0] ^ prand[0], irk[1] ^ prand[1], irk[2] ^ prand[2]]
}

fn make_rpa(irk: &[u8; 16], rng: &mut impl Rng) -> LeAddress {
    let mut prand: [u8; 3] = rng.gen();
    prand[2] = (prand[2] & 0x3F) | 0x40;
    let hash = toy_hash(irk, &prand);
    LeAddress::random([hash[0], hash[1], hash[2], prand[0], prand[1], prand[2]])
}

fn resolve(irk: &[u8; 16], addr: &BdAddr) -> bool {
    toy_hash(irk, &addr.bytes[3..]) == addr.bytes[..3]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Bond Cycle Example");
    println!("------------------");

    let mut rng = rand::thread_rng();
    let config = KeysConfig::new(3).with_overwrite(OverwritePolicy::OverwriteOldest);
    let mut pool = KeyPool::with_settings(config, MemorySettings::new());
    let mut host = SimulatedHost { links: Vec::new() };

    let mut peers = Vec::new();
    for _ in 0..5 {
        let mut bytes: [u8; 6] = rng.gen();
        bytes[5] |= 0xC0;
        let identity = LeAddress::new(AddressType::RandomIdentity, bytes);
        let irk: [u8; 16] = rng.gen();
        peers.push((identity, irk));
    }

    for (identity, irk) in &peers {
        // Scan: the peer advertises with a fresh private address
        let rpa = make_rpa(irk, &mut rng);
        let known = pool.find_irk(0, &rpa, &resolve);
        println!("Scanned {} (bonded: {})", rpa, known.is_some());

        // Connect: the link stays up while the peer is bonded
        host.links.push(Connection::connected(0, *identity));

        let handle = match pool.get_type(KeyType::LTK | KeyType::IRK, 0, identity, &mut host) {
            Some(handle) => handle,
            None => {
                println!("  No room for {}", identity);
                host.links.pop();
                continue;
            }
        };

        if let Some(record) = pool.get_mut(handle) {
            record.enc_size = 16;
            record.ltk = LongTermKey::new_secure_connections(rng.gen());
            record.irk = IdentityResolvingKey::new(*irk);
        }
        pool.update_usage(0, identity);
        pool.store(handle)?;
        println!(
            "Bonded {} in slot {} (aging counter {})",
            identity,
            handle.index(),
            pool.aging_high_water()
        );

        // Disconnect
        host.links.retain(|link| link.dst != Some(*identity));

        let resolved = pool.find_irk(0, &make_rpa(irk, &mut rng), &resolve);
        println!("  Next private address resolves to slot {:?}", resolved.map(|h| h.index()));
    }

    println!();
    println!("Bonds after {} peers:", peers.len());
    pool.foreach_bond(0, |info| println!("  {}", info.addr));

    Ok(())
}
