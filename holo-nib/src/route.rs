//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

use crate::debug::Debug;
use crate::drl::Drl;
use crate::error::Error;
use crate::mode::Mode;
use crate::offl::OfflPool;
use crate::onl::OnlPool;

/// A single resolved route, returned by [`get_route`]: either a longest-prefix
/// match against an `FT`/`RPL`-tagged off-link entry, or the selected default
/// router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForwardingEntry {
    pub dst: Ipv6Addr,
    pub dst_len: u8,
    pub next_hop: Ipv6Addr,
    pub iface: u32,
    /// True iff this entry is the default router currently primed for use
    /// (RFC 4861 §6.3.6). Always false for an off-link longest-prefix match:
    /// `primary` names DR selection, not route preference, and an installed
    /// route is never a default router.
    pub primary: bool,
}

/// Routing glue (C7): resolves a destination to a next hop by first trying
/// the longest-prefix match over `FT`/`RPL` off-link entries — `PL`-only
/// entries (on-link prefixes with no route attached) never satisfy this —
/// and falling back to default-router selection.
///
/// TODO: on a miss, the original firmware hands the unresolved packet to an
/// RPL "route repair" hook; that collaborator is out of scope for this
/// crate, so callers needing it must do so themselves off the back of
/// `Err(Error::NetUnreachable(dst))`.
pub fn get_route(
    onl: &OnlPool,
    drl: &mut Drl,
    offl: &OfflPool,
    dst: Ipv6Addr,
) -> Result<ForwardingEntry, Error> {
    if let Some(idx) = offl.longest_prefix_match(dst) {
        let entry = offl.get(idx).expect("index returned by longest_prefix_match");
        if entry.mode.intersects(Mode::FT | Mode::RPL) {
            let node = &onl[entry.next_hop];
            return Ok(ForwardingEntry {
                dst: entry.prefix.ip(),
                dst_len: entry.prefix.prefix(),
                next_hop: node.addr,
                iface: node.iface,
                primary: false,
            });
        }
    }

    if let Some(idx) = drl.get_dr(onl) {
        return Ok(drl.ft_get(onl, idx));
    }

    let err = Error::NetUnreachable(dst);
    Debug::RouteMiss(&dst).log();
    err.log();
    Err(err)
}
