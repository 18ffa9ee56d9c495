//! Identity seed: SHAKE128 over the machine identity.

use data_encoding::BASE32HEX_NOPAD;
use sha3::Shake128;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use uuid::Uuid;

use super::{MacAddr, Wwn};
use crate::constants::privileges::{GROUP_ID_MAX, GROUP_ID_MIN};

/// Generator of stable identities for one machine.
///
/// The hash input is the 16-byte machine id, followed by the machine name and
/// each component, every one prefixed with its length as a big-endian u64.
/// A domain such as `["volume", "wwn"]` contributes one component per label.
#[derive(Debug, Clone)]
pub struct IdentitySeed {
    id: [u8; 16],
    name: String,
}

impl IdentitySeed {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: *id.as_bytes(),
            name: name.into(),
        }
    }

    fn shake(&self, components: &[&[u8]], out: &mut [u8]) {
        let mut hasher = Shake128::default();
        hasher.update(&self.id);
        write_prefixed(&mut hasher, self.name.as_bytes());
        for component in components {
            write_prefixed(&mut hasher, component);
        }
        hasher.finalize_xof().read(out);
    }

    /// Fill `out` with bytes derived from `domain` and `entity`.
    pub fn derive(&self, domain: &[&str], entity: &str, out: &mut [u8]) {
        let mut components: Vec<&[u8]> = domain.iter().map(|label| label.as_bytes()).collect();
        components.push(entity.as_bytes());
        self.shake(&components, out);
    }

    /// 64-bit WWN with NAA type 5 and the KVM OUI 52:54:00.
    pub fn wwn(&self, domain: &[&str], entity: &str) -> Wwn {
        let mut value = [0u8; 8];
        self.derive(domain, entity, &mut value);
        value[0] = 0x55;
        value[1] = 0x25;
        value[2] = 0x40;
        value[3] &= 0x0f;
        Wwn::W64(value)
    }

    /// 128-bit serial number in base-32 extended-hex without padding.
    pub fn serial_number(&self, domain: &[&str], entity: &str) -> String {
        let mut value = [0u8; 16];
        self.derive(domain, entity, &mut value);
        BASE32HEX_NOPAD.encode(&value)
    }

    /// 48-bit hardware address under the locally administered prefix 52:54:00.
    pub fn hardware_addr(&self, domain: &[&str], entity: &str) -> MacAddr {
        let mut value = [0u8; 6];
        self.derive(domain, entity, &mut value);
        value[0] = 0x52;
        value[1] = 0x54;
        value[2] = 0x00;
        MacAddr::new(value)
    }

    /// Version 4, variant 10 UUID.
    pub fn uuid(&self, domain: &[&str], entity: &str) -> Uuid {
        let mut value = [0u8; 16];
        self.derive(domain, entity, &mut value);
        value[6] = (value[6] & 0x0f) | 0x40;
        value[8] = (value[8] & 0x3f) | 0x80;
        Uuid::from_bytes(value)
    }

    /// POSIX group id in `GROUP_ID_MIN..GROUP_ID_MAX`.
    ///
    /// `round` selects an alternative value when the first one collides
    /// with an existing group on the host.
    pub fn group_id(&self, domain: &[&str], round: u64) -> u32 {
        let round = round.to_be_bytes();
        let mut components: Vec<&[u8]> = domain.iter().map(|label| label.as_bytes()).collect();
        components.push(&round);
        let mut value = [0u8; 4];
        self.shake(&components, &mut value);
        GROUP_ID_MIN + u32::from_be_bytes(value) % (GROUP_ID_MAX - GROUP_ID_MIN)
    }
}

fn write_prefixed(hasher: &mut Shake128, data: &[u8]) {
    hasher.update(&(data.len() as u64).to_be_bytes());
    hasher.update(data);
}
