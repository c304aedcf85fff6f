//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

use generational_arena::Index;

use crate::debug::Debug;
use crate::mode::Mode;
use crate::onl::{OnlIndex, OnlPool};
use crate::pool::Pool;
use crate::route::ForwardingEntry;
use crate::timer::EventTimer;

pub type DrIndex = Index;

/// A default-router entry: a non-owning reference to an on-link node
/// carrying `DRL` (and usually `NC`) mode.
#[derive(Debug)]
struct Dr {
    next_hop: OnlIndex,
}

/// The default router list (C3): a pool of [`Dr`] entries plus the "primed"
/// selection pointer driving RFC 4861 §6.3.6-style rotation.
#[derive(Debug)]
pub struct Drl {
    pool: Pool<Dr>,
    prime: Option<DrIndex>,
}

impl Drl {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Drl {
            pool: Pool::with_capacity(capacity),
            prime: None,
        }
    }

    /// Adds a default router, or ORs `DRL` onto the matching existing
    /// entry's on-link node. Fails if the pool is full.
    pub fn add(&mut self, onl: &mut OnlPool, addr: Ipv6Addr, iface: u32) -> Option<DrIndex> {
        if let Some(idx) = self.get(onl, addr, iface) {
            onl[self.pool[idx].next_hop].mode.insert(Mode::DRL);
            return Some(idx);
        }
        if self.pool.is_full() {
            return None;
        }
        let onl_idx = onl.allocate(Some(addr), iface)?;
        onl[onl_idx].mode.insert(Mode::DRL);
        Debug::DrlAdd(&addr, iface).log();
        self.pool.try_insert(Dr { next_hop: onl_idx })
    }

    /// Clears `DRL` on the referenced on-link node, frees it if nothing
    /// else references it, and resets the prime pointer if it pointed here.
    pub fn remove(&mut self, onl: &mut OnlPool, idx: DrIndex, timer: &mut dyn EventTimer) {
        let Some(dr) = self.pool.remove(idx) else {
            return;
        };
        onl[dr.next_hop].mode.remove(Mode::DRL);
        onl.clear(dr.next_hop, timer);
        if self.prime == Some(idx) {
            self.prime = None;
        }
        Debug::DrlRemove(idx).log();
    }

    /// Pool-order enumeration of all occupied default-router slots.
    pub fn iterate(&self, prev: Option<DrIndex>) -> Option<DrIndex> {
        self.pool.iterate(prev)
    }

    pub fn get(&self, onl: &OnlPool, addr: Ipv6Addr, iface: u32) -> Option<DrIndex> {
        self.pool.iter().find_map(|(idx, dr)| {
            let node = &onl[dr.next_hop];
            (node.addr == addr && node.iface == iface).then_some(idx)
        })
    }

    pub(crate) fn next_hop(&self, idx: DrIndex) -> Option<OnlIndex> {
        self.pool.get(idx).map(|dr| dr.next_hop)
    }

    /// Router selection (RFC 4861 §6.3.6-style rotation). Returns the prime
    /// if it's still reachable; otherwise scans for the first reachable
    /// router and primes it; otherwise deterministically rotates the prime
    /// to the next slot (so the caller probes it with NUD) and returns
    /// that, still unreachable. Returns `None` only when the list is empty.
    pub fn get_dr(&mut self, onl: &OnlPool) -> Option<DrIndex> {
        if let Some(prime) = self.prime {
            match self.pool.get(prime) {
                Some(dr) if onl[dr.next_hop].nud_state.is_reachable() => return Some(prime),
                None => self.prime = None,
                _ => {}
            }
        }

        let mut cursor = None;
        while let Some(idx) = self.pool.iterate(cursor) {
            if onl[self.pool[idx].next_hop].nud_state.is_reachable() {
                self.prime = Some(idx);
                Debug::DrlPrime(idx).log();
                return Some(idx);
            }
            cursor = Some(idx);
        }

        self.rotate_prime()
    }

    fn rotate_prime(&mut self) -> Option<DrIndex> {
        let next = match self.prime {
            Some(prime) => self.pool.iterate(Some(prime)).or_else(|| self.pool.iterate(None)),
            None => self.pool.iterate(None),
        };
        Debug::DrlRotate(self.prime, next).log();
        self.prime = next;
        next
    }

    /// Populates a forwarding-table entry for `idx`: destination `::/0`,
    /// this router's address and interface as next hop, `primary` true iff
    /// it is the (reachable) prime.
    pub fn ft_get(&self, onl: &OnlPool, idx: DrIndex) -> ForwardingEntry {
        let dr = &self.pool[idx];
        let node = &onl[dr.next_hop];
        ForwardingEntry {
            dst: Ipv6Addr::UNSPECIFIED,
            dst_len: 0,
            next_hop: node.addr,
            iface: node.iface,
            primary: self.prime == Some(idx) && node.nud_state.is_reachable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nud::NudState;
    use crate::timer::{TimerCtx, TimerKind};

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
    fn rotation_visits_every_unreachable_router_before_repeating() {
        let mut onl = OnlPool::with_capacity(8);
        let mut drl = Drl::with_capacity(8);
        drl.add(&mut onl, addr("fe80::1"), 1).unwrap();
        drl.add(&mut onl, addr("fe80::2"), 1).unwrap();
        // Both routers are fresh on-link nodes, default state is Stale
        // which already counts as "reachable" (not UNREACHABLE/INCOMPLETE);
        // force both unreachable for the rotation scenario.
        for idx in [
            onl.get(Some(addr("fe80::1")), 1).unwrap(),
            onl.get(Some(addr("fe80::2")), 1).unwrap(),
        ] {
            onl[idx].nud_state = NudState::Unreachable;
        }

        let first = drl.get_dr(&onl).unwrap();
        let second = drl.get_dr(&onl).unwrap();
        let third = drl.get_dr(&onl).unwrap();
        let fourth = drl.get_dr(&onl).unwrap();

        assert_ne!(first, second);
        assert_eq!(first, third);
        assert_eq!(second, fourth);
    }

    #[test]
    fn reachable_prime_is_sticky() {
        let mut onl = OnlPool::with_capacity(8);
        let mut drl = Drl::with_capacity(8);
        let a = drl.add(&mut onl, addr("fe80::1"), 1).unwrap();
        drl.add(&mut onl, addr("fe80::2"), 1).unwrap();

        assert_eq!(drl.get_dr(&onl), Some(a));
        assert_eq!(drl.get_dr(&onl), Some(a));

        let ft = drl.ft_get(&onl, a);
        assert!(ft.primary);
        assert_eq!(ft.next_hop, addr("fe80::1"));
        assert_eq!(ft.iface, 1);
    }

    #[test]
    fn remove_clears_prime_and_underlying_node() {
        let mut onl = OnlPool::with_capacity(8);
        let mut timer = NoopTimer;
        let mut drl = Drl::with_capacity(8);
        let a = drl.add(&mut onl, addr("fe80::1"), 1).unwrap();
        drl.get_dr(&onl);

        drl.remove(&mut onl, a, &mut timer);
        assert!(onl.get(Some(addr("fe80::1")), 1).is_none());
        assert_eq!(drl.get_dr(&onl), None);
    }
}
