//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

use generational_arena::Index;

use crate::addr::{addr_matches, iface_matches};
use crate::debug::Debug;
use crate::mode::Mode;
use crate::nud::{AddrRegState, NudState};
use crate::pool::Pool;
use crate::timer::{EventTimer, TimerCtx, TimerKind};
#[cfg(feature = "queue-pkt")]
use crate::packet::{self, DropReason, QueuedPacket};

pub type OnlIndex = Index;

/// Link-layer address carried by a neighbor cache entry.
///
/// With feature `arsm` this is whatever the address-resolution state
/// machine resolved and stored on the node. Without it, [`Nib::nc_lladdr`]
/// derives it on the fly from the neighbor's IPv6 address instead, which is
/// only meaningful for link-local addresses — callers built without `arsm`
/// must restrict themselves to those.
///
/// [`Nib::nc_lladdr`]: crate::Nib::nc_lladdr
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LinkLayerAddr {
    pub bytes: [u8; 8],
    pub len: u8,
}

/// One (IPv6 address, interface) pair referenced by at least one logical
/// table. Shared by the neighbor cache, the default router list and the
/// off-link next-hop table through [`Mode`] bits rather than through
/// separate owned records.
#[derive(Debug)]
pub struct OnlNode {
    pub addr: Ipv6Addr,
    pub iface: u32,
    pub mode: Mode,
    pub nud_state: NudState,
    pub addr_reg_state: AddrRegState,
    #[cfg(feature = "arsm")]
    pub lladdr: Option<LinkLayerAddr>,
    #[cfg(feature = "arsm")]
    pub nud_timeout: Option<u64>,
    #[cfg(feature = "arsm")]
    pub snd_na_timeout: Option<u64>,
    #[cfg(feature = "arsm")]
    pub addr_reg_timeout: Option<u64>,
    #[cfg(feature = "queue-pkt")]
    pub pkt_queue: Vec<Box<dyn QueuedPacket>>,
    next_removable: Option<Index>,
    in_fifo: bool,
}

impl OnlNode {
    fn new(addr: Ipv6Addr, iface: u32) -> Self {
        Debug::OnlCreate(&addr, iface).log();
        OnlNode {
            addr,
            iface,
            mode: Mode::empty(),
            nud_state: NudState::Stale,
            addr_reg_state: AddrRegState::default(),
            #[cfg(feature = "arsm")]
            lladdr: None,
            #[cfg(feature = "arsm")]
            nud_timeout: None,
            #[cfg(feature = "arsm")]
            snd_na_timeout: None,
            #[cfg(feature = "arsm")]
            addr_reg_timeout: None,
            #[cfg(feature = "queue-pkt")]
            pkt_queue: Vec::new(),
            next_removable: None,
            in_fifo: false,
        }
    }

    #[cfg(feature = "arsm")]
    fn cancel_timeouts(&mut self, timer: &mut dyn EventTimer) {
        for handle in [
            self.nud_timeout.take(),
            self.snd_na_timeout.take(),
            self.addr_reg_timeout.take(),
        ]
        .into_iter()
        .flatten()
        {
            timer.cancel(handle);
        }
    }

    #[cfg(not(feature = "arsm"))]
    fn cancel_timeouts(&mut self, _timer: &mut dyn EventTimer) {}
}

/// The on-link node pool (C1) plus the intrusive neighbor-cache FIFO (C2)
/// threaded through it via `next_removable`.
#[derive(Debug)]
pub struct OnlPool {
    pool: Pool<OnlNode>,
    fifo_head: Option<Index>,
    fifo_tail: Option<Index>,
    fifo_len: usize,
}

impl OnlPool {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        OnlPool {
            pool: Pool::with_capacity(capacity),
            fifo_head: None,
            fifo_tail: None,
            fifo_len: 0,
        }
    }

    pub(crate) fn get_node(&self, idx: Index) -> Option<&OnlNode> {
        self.pool.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut OnlNode> {
        self.pool.get_mut(idx)
    }

    /// Returns the existing exact-match record, or allocates a free slot
    /// and initializes it with `(address, iface)`. Returns `None` if
    /// neither exists.
    pub(crate) fn allocate(&mut self, address: Option<Ipv6Addr>, iface: u32) -> Option<Index> {
        if let Some(idx) = self.get(address, iface) {
            return Some(idx);
        }
        let addr = address.unwrap_or(Ipv6Addr::UNSPECIFIED);
        self.pool.try_insert(OnlNode::new(addr, iface))
    }

    /// Exact lookup; interface `0` on either side is a wildcard.
    pub(crate) fn get(&self, address: Option<Ipv6Addr>, iface: u32) -> Option<Index> {
        self.pool.iter().find_map(|(idx, node)| {
            if node.mode.is_empty() {
                return None;
            }
            if !iface_matches(node.iface, iface) {
                return None;
            }
            addr_matches(node.addr, address).then_some(idx)
        })
    }

    /// Pool-order enumeration of all occupied on-link nodes.
    pub fn iterate(&self, prev: Option<Index>) -> Option<Index> {
        self.pool.iterate(prev)
    }

    pub(crate) fn is_full(&self) -> bool {
        self.pool.is_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.pool.len()
    }

    /// If `idx`'s mode is empty, fully frees the slot: zeroes its fields,
    /// cancels any outstanding timers, and unlinks it from the FIFO.
    pub(crate) fn clear(&mut self, idx: Index, timer: &mut dyn EventTimer) {
        let is_empty = match self.pool.get(idx) {
            Some(node) => node.mode.is_empty(),
            None => return,
        };
        if !is_empty {
            return;
        }
        if let Some(node) = self.pool.get_mut(idx) {
            node.cancel_timeouts(timer);
            #[cfg(feature = "queue-pkt")]
            packet::release_all(&mut node.pkt_queue, DropReason::HostUnreachable);
        }
        self.fifo_unlink(idx);
        self.pool.remove(idx);
        Debug::OnlFree(idx).log();
    }

    // ===== FIFO (C2) =====

    fn fifo_push_tail(&mut self, idx: Index) {
        let already_linked = self.pool.get(idx).map(|n| n.in_fifo).unwrap_or(false);
        if already_linked {
            return;
        }
        if let Some(node) = self.pool.get_mut(idx) {
            node.in_fifo = true;
            node.next_removable = None;
        }
        match self.fifo_tail {
            Some(tail) => {
                if let Some(tail_node) = self.pool.get_mut(tail) {
                    tail_node.next_removable = Some(idx);
                }
            }
            None => self.fifo_head = Some(idx),
        }
        self.fifo_tail = Some(idx);
        self.fifo_len += 1;
    }

    fn fifo_pop_head(&mut self) -> Option<Index> {
        let head = self.fifo_head?;
        let next = self.pool.get(head).and_then(|n| n.next_removable);
        self.fifo_head = next;
        if next.is_none() {
            self.fifo_tail = None;
        }
        if let Some(node) = self.pool.get_mut(head) {
            node.in_fifo = false;
            node.next_removable = None;
        }
        self.fifo_len -= 1;
        Some(head)
    }

    /// Unlinks an arbitrary node from the FIFO. The FIFO is singly linked,
    /// so this walks from the head; pool sizes are small enough (tens of
    /// entries) that this is cheap relative to the eviction scan it serves.
    fn fifo_unlink(&mut self, idx: Index) {
        let linked = self.pool.get(idx).map(|n| n.in_fifo).unwrap_or(false);
        if !linked {
            return;
        }
        if self.fifo_head == Some(idx) {
            self.fifo_pop_head();
            return;
        }
        let mut prev = self.fifo_head;
        while let Some(prev_idx) = prev {
            let next = self.pool.get(prev_idx).and_then(|n| n.next_removable);
            if next == Some(idx) {
                let after = self.pool.get(idx).and_then(|n| n.next_removable);
                if let Some(prev_node) = self.pool.get_mut(prev_idx) {
                    prev_node.next_removable = after;
                }
                if self.fifo_tail == Some(idx) {
                    self.fifo_tail = Some(prev_idx);
                }
                break;
            }
            prev = next;
        }
        if let Some(node) = self.pool.get_mut(idx) {
            node.in_fifo = false;
            node.next_removable = None;
        }
        self.fifo_len -= 1;
    }

    // ===== C2: add_nc / eviction / remove_nc =====

    /// Adds a neighbor cache entry, evicting a garbage-collectible victim
    /// if the pool is full. Panics if `state` isn't a valid initial NUD
    /// state (a contract violation by the caller, not a runtime error).
    pub fn add_nc(
        &mut self,
        addr: Ipv6Addr,
        iface: u32,
        state: NudState,
        timer: &mut dyn EventTimer,
    ) -> Option<Index> {
        assert!(
            state.is_valid_initial(),
            "nc_add: {state:?} is not a valid initial NUD state"
        );
        Debug::NcAdd(&addr, iface, state).log();

        if let Some(idx) = self.allocate(Some(addr), iface) {
            let node = &mut self.pool[idx];
            if !node.mode.contains(Mode::NC) {
                node.nud_state = state;
            }
            node.mode.insert(Mode::NC);
            self.fifo_push_tail(idx);
            return Some(idx);
        }

        self.cache_out(addr, iface, state, timer)
    }

    /// Eviction (`cache_out_onl_entry`). Walks the FIFO at most one full
    /// revolution, re-appending every node that isn't garbage-collectible,
    /// and reuses the first one that is. Resolves the ambiguous loop
    /// condition of the original as "stop on first successful reuse, else
    /// one full revolution" per the spec's redesign note.
    fn cache_out(
        &mut self,
        addr: Ipv6Addr,
        iface: u32,
        state: NudState,
        timer: &mut dyn EventTimer,
    ) -> Option<Index> {
        let attempts = self.fifo_len;
        for _ in 0..attempts {
            let cur = self.fifo_pop_head()?;
            let gc_eligible = {
                let node = &self.pool[cur];
                node.mode == Mode::NC && node.addr_reg_state == AddrRegState::Gc
            };
            if !gc_eligible {
                self.fifo_push_tail(cur);
                continue;
            }

            Debug::NcEvict(cur, &addr, iface).log();
            {
                let node = &mut self.pool[cur];
                node.cancel_timeouts(timer);
                #[cfg(feature = "queue-pkt")]
                packet::release_all(&mut node.pkt_queue, DropReason::HostUnreachable);
                node.mode = Mode::NC;
                node.addr = addr;
                node.iface = iface;
                node.nud_state = state;
                node.addr_reg_state = AddrRegState::default();
            }
            self.fifo_push_tail(cur);
            return Some(cur);
        }
        None
    }

    /// Removes the `NC` bit, cancelling NUD-related timers and releasing
    /// any queued packets with [`DropReason::HostUnreachable`]. Frees the
    /// underlying on-link node if no other table still references it.
    pub fn remove_nc(&mut self, idx: Index, timer: &mut dyn EventTimer) {
        let Some(node) = self.pool.get_mut(idx) else {
            return;
        };
        if !node.mode.contains(Mode::NC) {
            return;
        }
        node.mode.remove(Mode::NC);
        node.cancel_timeouts(timer);
        #[cfg(feature = "queue-pkt")]
        packet::release_all(&mut node.pkt_queue, DropReason::HostUnreachable);
        Debug::NcRemove(idx).log();
        self.clear(idx, timer);
    }

    /// Marks a neighbor cache entry reachable, e.g. after NUD confirms it.
    pub fn nc_set_reachable(&mut self, idx: Index) {
        if let Some(node) = self.pool.get_mut(idx) {
            if node.mode.contains(Mode::NC) {
                node.nud_state = NudState::Reachable;
            }
        }
    }

    #[cfg(not(feature = "arsm"))]
    pub(crate) fn derive_lladdr(&self, idx: Index) -> Option<[u8; 8]> {
        self.pool
            .get(idx)
            .map(|node| crate::addr::derive_lladdr(&node.addr))
    }
}

impl std::ops::Index<Index> for OnlPool {
    type Output = OnlNode;

    fn index(&self, index: Index) -> &Self::Output {
        &self.pool[index]
    }
}

impl std::ops::IndexMut<Index> for OnlPool {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.pool[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct NoopTimer;
    impl EventTimer for NoopTimer {
        fn add(&mut self, _ctx: TimerCtx, _kind: TimerKind, _offset_ms: u64) -> u64 {
            0
        }
        fn cancel(&mut self, _handle: u64) {}
        fn lookup(&self, _ctx: TimerCtx, _kind: TimerKind) -> Option<u64> {
            None
        }
    }

    fn addr(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    #[test]
    fn allocate_promotes_placeholder_with_unspecified_address() {
        let mut pool = OnlPool::with_capacity(4);
        let placeholder = pool.allocate(None, 1).unwrap();
        assert_eq!(pool[placeholder].addr, Ipv6Addr::UNSPECIFIED);

        let promoted = pool.allocate(Some(addr("fe80::1")), 1).unwrap();
        assert_eq!(placeholder, promoted);
        assert_eq!(pool[promoted].addr, addr("fe80::1"));
    }

    #[test]
    fn nc_add_then_full_remove_then_add_again_is_a_fresh_insert() {
        let mut timer = NoopTimer;
        let mut pool = OnlPool::with_capacity(4);
        let a = pool
            .add_nc(addr("fe80::1"), 1, NudState::Stale, &mut timer)
            .unwrap();
        pool.remove_nc(a, &mut timer);
        assert!(pool.get(Some(addr("fe80::1")), 1).is_none());

        let b = pool
            .add_nc(addr("fe80::1"), 1, NudState::Stale, &mut timer)
            .unwrap();
        assert_eq!(pool[b].mode, Mode::NC);
        assert_eq!(pool[b].nud_state, NudState::Stale);
    }

    #[test]
    #[should_panic(expected = "not a valid initial NUD state")]
    fn nc_add_rejects_reachable_as_initial_state() {
        let mut timer = NoopTimer;
        let mut pool = OnlPool::with_capacity(4);
        pool.add_nc(addr("fe80::1"), 1, NudState::Reachable, &mut timer);
    }

    #[test]
    fn eviction_reuses_oldest_gc_eligible_entry_and_preserves_fifo_order() {
        let mut timer = NoopTimer;
        let mut pool = OnlPool::with_capacity(2);
        let a = pool
            .add_nc(addr("fe80::1"), 1, NudState::Stale, &mut timer)
            .unwrap();
        let b = pool
            .add_nc(addr("fe80::2"), 1, NudState::Stale, &mut timer)
            .unwrap();

        let c = pool
            .add_nc(addr("fe80::3"), 1, NudState::Stale, &mut timer)
            .unwrap();
        assert_eq!(c, a, "the oldest entry's slot should be reused");
        assert_eq!(pool[c].addr, addr("fe80::3"));
        assert!(pool.get(Some(addr("fe80::1")), 1).is_none());
        assert!(pool.get(Some(addr("fe80::2")), 1).is_some());

        // `b` was re-appended during the scan, so it is now the oldest and
        // is the next one evicted.
        let d = pool
            .add_nc(addr("fe80::4"), 1, NudState::Stale, &mut timer)
            .unwrap();
        assert_eq!(d, b);
    }

    #[test]
    fn eviction_fails_when_nothing_is_gc_eligible() {
        let mut timer = NoopTimer;
        let mut pool = OnlPool::with_capacity(1);
        let a = pool
            .add_nc(addr("fe80::1"), 1, NudState::Stale, &mut timer)
            .unwrap();
        pool[a].addr_reg_state = AddrRegState::Registered;

        assert!(pool
            .add_nc(addr("fe80::2"), 1, NudState::Stale, &mut timer)
            .is_none());
    }
}
