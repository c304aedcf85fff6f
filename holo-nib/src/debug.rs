//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

use generational_arena::Index;
use tracing::{debug, trace};

use crate::nud::NudState;

// NIB debug messages, logged through `tracing` rather than printed, mirroring
// `holo-rip::debug` / `holo-isis::debug`. Everything here is `debug`/`trace`
// level: the NIB has no I/O of its own and therefore nothing to report at
// `warn`/`error`.
#[derive(Debug)]
pub(crate) enum Debug<'a> {
    OnlCreate(&'a Ipv6Addr, u32),
    OnlFree(Index),
    NcAdd(&'a Ipv6Addr, u32, NudState),
    NcEvict(Index, &'a Ipv6Addr, u32),
    NcRemove(Index),
    DrlAdd(&'a Ipv6Addr, u32),
    DrlRemove(Index),
    DrlPrime(Index),
    DrlRotate(Option<Index>, Option<Index>),
    OfflAdd(Index, &'a Ipv6Addr, u8),
    OfflRemove(Index),
    AbrAdd(&'a Ipv6Addr),
    AbrRemove(&'a Ipv6Addr),
    RouteMiss(&'a Ipv6Addr),
}

impl Debug<'_> {
    pub(crate) fn log(&self) {
        match self {
            Debug::OnlCreate(addr, iface) => {
                trace!(%addr, iface, "on-link node created");
            }
            Debug::OnlFree(idx) => {
                trace!(?idx, "on-link node freed");
            }
            Debug::NcAdd(addr, iface, state) => {
                debug!(%addr, iface, ?state, "neighbor cache entry added");
            }
            Debug::NcEvict(idx, addr, iface) => {
                debug!(?idx, %addr, iface, "neighbor cache entry evicted for reuse");
            }
            Debug::NcRemove(idx) => {
                debug!(?idx, "neighbor cache entry removed");
            }
            Debug::DrlAdd(addr, iface) => {
                debug!(%addr, iface, "default router added");
            }
            Debug::DrlRemove(idx) => {
                debug!(?idx, "default router removed");
            }
            Debug::DrlPrime(idx) => {
                trace!(?idx, "default router primed");
            }
            Debug::DrlRotate(from, to) => {
                trace!(?from, ?to, "default router selection rotated");
            }
            Debug::OfflAdd(idx, prefix, pfx_len) => {
                debug!(?idx, %prefix, pfx_len, "off-link entry added");
            }
            Debug::OfflRemove(idx) => {
                debug!(?idx, "off-link entry removed");
            }
            Debug::AbrAdd(addr) => {
                debug!(%addr, "authoritative border router added");
            }
            Debug::AbrRemove(addr) => {
                debug!(%addr, "authoritative border router removed");
            }
            Debug::RouteMiss(dst) => {
                trace!(%dst, "route lookup found no next hop");
            }
        }
    }
}
