//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

//! In-memory database backing IPv6 Neighbor Discovery (RFC 4861): the
//! neighbor cache, default router list, off-link prefix/route table,
//! per-interface Neighbor Discovery state, and (feature `multihop-p6c`) the
//! 6LoWPAN authoritative border-router table.
//!
//! Every mutating entry point takes the collaborators it needs to schedule
//! or cancel work through explicitly — an [`EventTimer`] for anything that
//! arms or disarms a timeout, a [`ContextReleaser`] for 6LoWPAN context
//! teardown — rather than owning them, so the NIB itself stays free of I/O
//! and is driven entirely by its caller.

#[cfg(feature = "multihop-p6c")]
pub mod abr;
mod addr;
pub mod config;
mod debug;
pub mod drl;
mod error;
pub mod iface;
pub mod mode;
pub mod nud;
pub mod offl;
pub mod onl;
#[cfg(feature = "queue-pkt")]
pub mod packet;
mod pool;
pub mod route;
pub mod timer;

use std::net::Ipv6Addr;

use rand::Rng;

#[cfg(feature = "multihop-p6c")]
use crate::abr::{AbrIndex, AbrTable, ContextReleaser};
use crate::config::NibConfig;
pub use crate::error::{Error, Pool as ErrorPool};
use crate::drl::{DrIndex, Drl};
use crate::iface::{IfaceIndex, IfaceState, IfaceTable};
use crate::mode::Mode;
use crate::nud::NudState;
use crate::offl::{OfflIndex, OfflPool};
use crate::onl::{OnlIndex, OnlPool};
pub use crate::route::ForwardingEntry;
use crate::timer::EventTimer;

/// The IPv6 Neighbor Information Base: owns every table described above and
/// exposes the mutation and query operations a Neighbor Discovery
/// implementation drives it with.
#[derive(Debug)]
pub struct Nib {
    config: NibConfig,
    onl: OnlPool,
    drl: Drl,
    offl: OfflPool,
    ifaces: IfaceTable,
    #[cfg(feature = "multihop-p6c")]
    abr: AbrTable,
}

impl Nib {
    /// TODO: the original firmware notes persisted ABR state as a load-on-init
    /// hook; no persistence collaborator is in scope for this crate (see
    /// DESIGN.md), so a fresh `Nib` always starts with an empty ABR table and
    /// a caller wanting to restore it across restarts must replay
    /// `abr_add`/`abr_add_pfx` itself once it has somewhere to load from.
    pub fn new(config: NibConfig) -> Self {
        Nib {
            onl: OnlPool::with_capacity(config.nib_numof),
            drl: Drl::with_capacity(config.default_router_numof),
            offl: OfflPool::with_capacity(config.offl_numof),
            ifaces: IfaceTable::with_capacity(config.netif_numof),
            #[cfg(feature = "multihop-p6c")]
            abr: AbrTable::with_capacity(config.abr_numof),
            config,
        }
    }

    pub fn config(&self) -> &NibConfig {
        &self.config
    }

    // ===== C1/C2: neighbor cache =====

    /// Adds a neighbor cache entry in NUD state `state`, evicting a
    /// garbage-collectible entry if the pool is full. Fails with
    /// [`Error::PoolExhausted`] if no slot is free and nothing can be
    /// evicted.
    pub fn nc_add(
        &mut self,
        addr: Ipv6Addr,
        iface: u32,
        state: NudState,
        timer: &mut dyn EventTimer,
    ) -> Result<OnlIndex, Error> {
        self.onl
            .add_nc(addr, iface, state, timer)
            .ok_or(Error::PoolExhausted(ErrorPool::Onl))
    }

    pub fn nc_get(&self, addr: Option<Ipv6Addr>, iface: u32) -> Option<OnlIndex> {
        self.onl.get(addr, iface).filter(|&idx| self.onl[idx].mode.contains(Mode::NC))
    }

    pub fn nc_set_reachable(&mut self, idx: OnlIndex) {
        self.onl.nc_set_reachable(idx);
    }

    pub fn nc_remove(&mut self, idx: OnlIndex, timer: &mut dyn EventTimer) {
        self.onl.remove_nc(idx, timer);
    }

    pub fn onl_get(&self, idx: OnlIndex) -> Option<&onl::OnlNode> {
        self.onl.get_node(idx)
    }

    /// Direct mutable access to an on-link node's non-structural fields —
    /// `lladdr`, `addr_reg_state` and the like — for attribute updates the
    /// ND protocol engine makes outside of this crate's own state machine
    /// (e.g. recording a neighbor's link-layer address off the back of a
    /// received advertisement). Callers must not toggle `mode` through this
    /// handle: table membership is only ever correct to change through the
    /// dedicated `nc_*`/`drl_*`/`offl_*` operations, which also keep the
    /// FIFO and pool-freeing invariants in sync.
    pub fn onl_get_mut(&mut self, idx: OnlIndex) -> Option<&mut onl::OnlNode> {
        self.onl.get_node_mut(idx)
    }

    /// Returns the neighbor's link-layer address: the address tracked by the
    /// address-resolution state machine (feature `arsm`), or — with that
    /// feature disabled — the address derived from the low 64 bits of its
    /// IPv6 address per the link-local-only contract documented on
    /// [`onl::LinkLayerAddr`]. Callers without `arsm` must only query
    /// link-local neighbors; this crate has no way to enforce that from
    /// here.
    pub fn nc_lladdr(&self, idx: OnlIndex) -> Option<onl::LinkLayerAddr> {
        #[cfg(feature = "arsm")]
        {
            self.onl.get_node(idx)?.lladdr
        }
        #[cfg(not(feature = "arsm"))]
        {
            self.onl
                .derive_lladdr(idx)
                .map(|bytes| onl::LinkLayerAddr { bytes, len: 8 })
        }
    }

    pub fn onl_iterate(&self, prev: Option<OnlIndex>) -> Option<OnlIndex> {
        self.onl.iterate(prev)
    }

    // ===== C3: default router list =====

    pub fn drl_add(&mut self, addr: Ipv6Addr, iface: u32) -> Result<DrIndex, Error> {
        self.drl
            .add(&mut self.onl, addr, iface)
            .ok_or(Error::PoolExhausted(ErrorPool::DefaultRouter))
    }

    pub fn drl_remove(&mut self, idx: DrIndex, timer: &mut dyn EventTimer) {
        self.drl.remove(&mut self.onl, idx, timer);
    }

    pub fn drl_iterate(&self, prev: Option<DrIndex>) -> Option<DrIndex> {
        self.drl.iterate(prev)
    }

    pub fn drl_ft_get(&mut self, idx: DrIndex) -> ForwardingEntry {
        self.drl.ft_get(&self.onl, idx)
    }

    // ===== C4: off-link entries / prefix list =====

    pub fn offl_add(
        &mut self,
        next_hop: Option<Ipv6Addr>,
        iface: u32,
        prefix: Ipv6Addr,
        pfx_len: u8,
        kind: Mode,
    ) -> Result<OfflIndex, Error> {
        self.offl
            .add(&mut self.onl, next_hop, iface, prefix, pfx_len, kind)
            .ok_or(Error::PoolExhausted(ErrorPool::OffLink))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pl_add(
        &mut self,
        next_hop: Option<Ipv6Addr>,
        iface: u32,
        prefix: Ipv6Addr,
        pfx_len: u8,
        valid_ms: u32,
        preferred_ms: u32,
        now_ms: u32,
        timer: &mut dyn EventTimer,
    ) -> Result<OfflIndex, Error> {
        self.offl
            .pl_add(
                &mut self.onl,
                next_hop,
                iface,
                prefix,
                pfx_len,
                valid_ms,
                preferred_ms,
                now_ms,
                timer,
            )
            .ok_or(Error::PoolExhausted(ErrorPool::OffLink))
    }

    pub fn pl_remove(&mut self, idx: OfflIndex, timer: &mut dyn EventTimer) {
        #[cfg(feature = "multihop-p6c")]
        self.abr.untrack_offl(idx);
        self.offl.pl_remove(&mut self.onl, idx, timer);
    }

    pub fn offl_remove(&mut self, idx: OfflIndex, kind: Mode, timer: &mut dyn EventTimer) {
        #[cfg(feature = "multihop-p6c")]
        self.abr.untrack_offl(idx);
        self.offl.remove(&mut self.onl, idx, kind, timer);
    }

    pub fn offl_get(&self, idx: OfflIndex) -> Option<&offl::OffLink> {
        self.offl.get(idx)
    }

    pub fn offl_iterate(&self, prev: Option<OfflIndex>) -> Option<OfflIndex> {
        self.offl.iterate(prev)
    }

    // ===== C5: per-interface state =====

    pub fn iface_get_or_insert(&mut self, iface: IfaceIndex) -> Option<&mut IfaceState> {
        self.ifaces.get_or_insert(iface)
    }

    pub fn iface_get(&self, iface: IfaceIndex) -> Option<&IfaceState> {
        self.ifaces.get(iface)
    }

    pub fn iface_recalc_reach_time(
        &mut self,
        iface: IfaceIndex,
        rng: &mut impl Rng,
        timer: &mut dyn EventTimer,
    ) {
        self.ifaces.recalc_reach_time(iface, rng, timer);
    }

    // ===== C6: 6LoWPAN authoritative border routers =====

    #[cfg(feature = "multihop-p6c")]
    pub fn abr_add(&mut self, addr: Ipv6Addr, version: u32) -> Result<AbrIndex, Error> {
        self.abr
            .add(addr, version)
            .ok_or(Error::PoolExhausted(ErrorPool::Abr))
    }

    /// Removes an ABR and cascades: every off-link/prefix-list entry it was
    /// authoritative for is dropped via [`Nib::pl_remove`], and every
    /// 6LoWPAN context it distributed is released through `releaser`.
    #[cfg(feature = "multihop-p6c")]
    pub fn abr_remove(
        &mut self,
        idx: AbrIndex,
        releaser: &mut dyn ContextReleaser,
        timer: &mut dyn EventTimer,
    ) {
        let prefixes: Vec<OfflIndex> = self.abr.prefixes(idx).collect();
        for offl_idx in prefixes {
            self.pl_remove(offl_idx, timer);
        }
        self.abr.remove(idx, releaser);
    }

    #[cfg(feature = "multihop-p6c")]
    pub fn abr_add_pfx(&mut self, idx: AbrIndex, offl: OfflIndex) {
        self.abr.add_pfx(idx, offl);
    }

    #[cfg(feature = "multihop-p6c")]
    pub fn abr_iterate(&self, prev: Option<AbrIndex>) -> Option<AbrIndex> {
        self.abr.iterate(prev)
    }

    // ===== C7: routing =====

    /// Resolves `dst` to a next hop: longest-prefix match over `FT`/`RPL`
    /// off-link entries, falling back to default-router selection. Returns
    /// [`Error::NetUnreachable`] if neither table has anything to offer.
    pub fn get_route(&mut self, dst: Ipv6Addr) -> Result<ForwardingEntry, Error> {
        route::get_route(&self.onl, &mut self.drl, &self.offl, dst)
    }
}
