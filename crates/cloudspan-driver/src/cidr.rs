//! Shared base network and subnet CIDR allocation
//!
//! Providers that model a virtual network as a subnet of one shared base
//! network carve `/24` blocks out of [`BASE_VNETWORK_CIDR`]. The allocator is
//! caller-side and non-atomic: two concurrent creations can read the same
//! subnet list and pick the same block.

use crate::error::{CloudError, Result};
use std::net::Ipv4Addr;

/// Name of the shared base network every subnet lives under
pub const BASE_VNETWORK_NAME: &str = "CB-VNet";

/// Address block of the shared base network
pub const BASE_VNETWORK_CIDR: &str = "130.0.0.0/16";

/// Parses the address part of a `a.b.c.d/len` prefix.
pub fn parse_prefix(prefix: &str) -> Result<(Ipv4Addr, u8)> {
    let (addr, len) = prefix
        .trim()
        .split_once('/')
        .ok_or_else(|| CloudError::InvalidCidr(prefix.to_string()))?;
    let addr: Ipv4Addr = addr
        .parse()
        .map_err(|_| CloudError::InvalidCidr(prefix.to_string()))?;
    let len: u8 = len
        .parse()
        .ok()
        .filter(|len| *len <= 32)
        .ok_or_else(|| CloudError::InvalidCidr(prefix.to_string()))?;
    Ok((addr, len))
}

/// Third octet of a prefix, the index of a `/24` inside the base block.
pub fn third_octet(prefix: &str) -> Result<u8> {
    parse_prefix(prefix).map(|(addr, _)| addr.octets()[2])
}

/// Whether `prefix` shares the first two octets of `base_cidr`.
fn in_base_block(base_cidr: &str, prefix: &str) -> Result<bool> {
    let (base, _) = parse_prefix(base_cidr)?;
    let (addr, _) = parse_prefix(prefix)?;
    Ok(base.octets()[..2] == addr.octets()[..2])
}

/// Allocates the next `/24` under `base_cidr`.
///
/// Takes the highest third octet among the `existing` prefixes inside the
/// base block and adds one; prefixes outside it are ignored and gaps left
/// by deleted subnets are not reused. With no subnet in the block the first
/// `/24` (`.0.0/24`) is returned. Past `.255.0/24` the pool is exhausted.
pub fn next_subnet_cidr<I, S>(base_cidr: &str, existing: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (base, _) = parse_prefix(base_cidr)?;

    let mut highest: Option<u8> = None;
    for prefix in existing {
        let prefix = prefix.as_ref();
        if !in_base_block(base_cidr, prefix)? {
            continue;
        }
        let octet = third_octet(prefix)?;
        highest = Some(highest.map_or(octet, |h| h.max(octet)));
    }

    let next = match highest {
        None => 0,
        Some(255) => {
            return Err(CloudError::SubnetPoolExhausted {
                base: base_cidr.to_string(),
            });
        }
        Some(h) => h + 1,
    };

    let [a, b, _, _] = base.octets();
    Ok(format!("{a}.{b}.{next}.0/24"))
}
