//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

/// Returns true if `stored` matches `query` under the NIB's "exact match"
/// rule: an unspecified stored address matches anything, and the caller
/// passing no address at all (`query == None`) also matches anything. This
/// is what lets a DR or off-link slot be allocated before its neighbor's
/// address is known and later promoted in place once it is.
pub(crate) fn addr_matches(stored: Ipv6Addr, query: Option<Ipv6Addr>) -> bool {
    match query {
        None => true,
        Some(query) => stored == Ipv6Addr::UNSPECIFIED || stored == query,
    }
}

/// Returns true if two interface identifiers match under the NIB's
/// wildcard rule: interface `0` on either side matches any interface.
pub(crate) fn iface_matches(stored: u32, query: u32) -> bool {
    query == 0 || stored == 0 || stored == query
}

/// Number of leading bits `a` and `b` have in common, up to 128.
pub(crate) fn match_bits(a: Ipv6Addr, b: Ipv6Addr) -> u8 {
    let mut bits = 0u8;
    for (byte_a, byte_b) in a.octets().iter().zip(b.octets().iter()) {
        let diff = byte_a ^ byte_b;
        if diff == 0 {
            bits += 8;
            continue;
        }
        bits += diff.leading_zeros() as u8;
        break;
    }
    bits
}

/// Derives a neighbor's link-layer address from its IPv6 address when the
/// address-resolution state machine isn't compiled in (feature `arsm`
/// disabled). Only meaningful for link-local addresses: the low 64 bits of
/// the address are copied out and the universal/local bit of the first byte
/// is flipped, undoing the transformation used to form an EUI-64-derived
/// interface identifier.
#[cfg(not(feature = "arsm"))]
pub(crate) fn derive_lladdr(addr: &Ipv6Addr) -> [u8; 8] {
    let octets = addr.octets();
    let mut lladdr = [0u8; 8];
    lladdr.copy_from_slice(&octets[8..16]);
    lladdr[0] ^= 0x02;
    lladdr
}
