//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv6Addr;

use generational_arena::Index;
use ipnetwork::Ipv6Network;

use crate::addr::{addr_matches, match_bits};
use crate::debug::Debug;
use crate::mode::Mode;
use crate::onl::{OnlIndex, OnlPool};
use crate::pool::Pool;
use crate::timer::EventTimer;

pub type OfflIndex = Index;

/// One row of the longest-prefix table or prefix list: a prefix, its
/// length, the on-link node used as next hop, and which of {FT, PL, RPL}
/// it belongs to.
#[derive(Debug)]
pub struct OffLink {
    pub prefix: Ipv6Network,
    pub next_hop: OnlIndex,
    pub mode: Mode,
    /// Absolute valid-lifetime deadline, milliseconds. `u32::MAX` means
    /// infinite.
    pub valid_until: u32,
    /// Absolute preferred-lifetime deadline, milliseconds. `u32::MAX` means
    /// infinite.
    pub preferred_until: u32,
    pub prefix_timeout: Option<u64>,
}

/// The off-link entry pool (C4): routes and prefix-list entries, overlaid
/// on the same records via [`Mode`] bits, plus the longest-prefix-match
/// lookup used by the routing glue.
#[derive(Debug)]
pub struct OfflPool {
    pool: Pool<OffLink>,
}

impl OfflPool {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        OfflPool {
            pool: Pool::with_capacity(capacity),
        }
    }

    pub(crate) fn get(&self, idx: OfflIndex) -> Option<&OffLink> {
        self.pool.get(idx)
    }

    fn get_mut(&mut self, idx: OfflIndex) -> Option<&mut OffLink> {
        self.pool.get_mut(idx)
    }

    /// Returns the exact-match entry (same prefix, length and next-hop
    /// node), promoting its next hop's address if a concrete one is
    /// supplied; otherwise allocates a fresh slot. Returns `None` if the
    /// pool is full or the on-link node pool can't supply a next hop.
    ///
    /// Panics if `pfx_len` is out of `1..=128` — an invalid-argument
    /// contract violation, not a recoverable error.
    pub fn allocate(
        &mut self,
        onl: &mut OnlPool,
        next_hop: Option<Ipv6Addr>,
        iface: u32,
        prefix: Ipv6Addr,
        pfx_len: u8,
    ) -> Option<OfflIndex> {
        assert!(
            (1..=128).contains(&pfx_len),
            "offl_add: prefix length {pfx_len} out of range"
        );

        let exact = self.pool.iter().find_map(|(idx, entry)| {
            if entry.mode.is_empty() {
                return None;
            }
            if entry.prefix.prefix() != pfx_len || entry.prefix.ip() != prefix {
                return None;
            }
            let nh = entry.next_hop;
            (onl[nh].iface == iface && addr_matches(onl[nh].addr, next_hop)).then_some((idx, nh))
        });
        if let Some((idx, nh)) = exact {
            if let Some(addr) = next_hop {
                onl[nh].addr = addr;
            }
            onl[nh].mode.insert(Mode::DST);
            return Some(idx);
        }

        if self.pool.is_full() {
            return None;
        }
        let onl_idx = onl.allocate(next_hop, iface)?;
        onl[onl_idx].mode.insert(Mode::DST);
        let net = Ipv6Network::new(prefix, pfx_len)
            .expect("prefix length was validated above");
        Debug::OfflAdd(onl_idx, &prefix, pfx_len).log();
        self.pool.try_insert(OffLink {
            prefix: net,
            next_hop: onl_idx,
            mode: Mode::empty(),
            valid_until: u32::MAX,
            preferred_until: u32::MAX,
            prefix_timeout: None,
        })
    }

    /// Wraps [`allocate`](Self::allocate) and ORs `kind` into the entry's
    /// mode.
    pub fn add(
        &mut self,
        onl: &mut OnlPool,
        next_hop: Option<Ipv6Addr>,
        iface: u32,
        prefix: Ipv6Addr,
        pfx_len: u8,
        kind: Mode,
    ) -> Option<OfflIndex> {
        let idx = self.allocate(onl, next_hop, iface, prefix, pfx_len)?;
        self.pool[idx].mode.insert(kind);
        Some(idx)
    }

    /// Prefix-list specialization of [`add`](Self::add): additionally
    /// converts `valid`/`preferred` lifetimes (already expressed in
    /// milliseconds, the monotonic counter's unit) into absolute deadlines
    /// and schedules a prefix-timeout event `valid` milliseconds out.
    #[allow(clippy::too_many_arguments)]
    pub fn pl_add(
        &mut self,
        onl: &mut OnlPool,
        next_hop: Option<Ipv6Addr>,
        iface: u32,
        prefix: Ipv6Addr,
        pfx_len: u8,
        valid_ms: u32,
        preferred_ms: u32,
        now_ms: u32,
        timer: &mut dyn EventTimer,
    ) -> Option<OfflIndex> {
        assert!(valid_ms >= preferred_ms, "pl_add: valid < preferred");

        let idx = self.add(onl, next_hop, iface, prefix, pfx_len, Mode::PL)?;
        let entry = &mut self.pool[idx];
        entry.valid_until = to_deadline(now_ms, valid_ms);
        entry.preferred_until = to_deadline(now_ms, preferred_ms);
        if valid_ms != u32::MAX {
            let handle = timer.add(
                crate::timer::TimerCtx::Offl(idx),
                crate::timer::TimerKind::PrefixTimeout,
                valid_ms as u64,
            );
            entry.prefix_timeout = Some(handle);
        }
        Some(idx)
    }

    /// Frees `idx` if its next hop isn't shared with any *other* occupied
    /// entry; otherwise just zeroes this entry, leaving the shared next hop
    /// alone.
    fn offl_clear(&mut self, onl: &mut OnlPool, idx: OfflIndex, timer: &mut dyn EventTimer) {
        let Some(entry) = self.pool.remove(idx) else {
            return;
        };
        let shared = self
            .pool
            .iter()
            .any(|(_, other)| other.next_hop == entry.next_hop);
        if !shared {
            onl[entry.next_hop].mode.remove(Mode::DST);
            onl.clear(entry.next_hop, timer);
        }
        Debug::OfflRemove(idx).log();
    }

    /// Clears `kind` from `idx`'s mode; if no membership bits remain,
    /// cancels its prefix timeout and frees it via
    /// [`offl_clear`](Self::offl_clear).
    pub fn remove(
        &mut self,
        onl: &mut OnlPool,
        idx: OfflIndex,
        kind: Mode,
        timer: &mut dyn EventTimer,
    ) {
        let Some(entry) = self.get_mut(idx) else {
            return;
        };
        entry.mode.remove(kind);
        if !entry.mode.is_empty() {
            return;
        }
        if let Some(handle) = entry.prefix_timeout.take() {
            timer.cancel(handle);
        }
        self.offl_clear(onl, idx, timer);
    }

    /// Removes `PL` membership from `idx`. When `multihop-p6c` is enabled,
    /// callers are responsible for also untracking `idx` from every ABR's
    /// prefix bitmap (see [`crate::abr::AbrTable::untrack_offl`]).
    pub fn pl_remove(&mut self, onl: &mut OnlPool, idx: OfflIndex, timer: &mut dyn EventTimer) {
        self.remove(onl, idx, Mode::PL, timer);
    }

    /// Linear scan for the entry with the greatest matching prefix length
    /// covering `dst`. Ties go to whichever entry was encountered first.
    pub fn longest_prefix_match(&self, dst: Ipv6Addr) -> Option<OfflIndex> {
        let mut best: Option<(OfflIndex, u8)> = None;
        for (idx, entry) in self.pool.iter() {
            if entry.mode.is_empty() {
                continue;
            }
            let pfx_len = entry.prefix.prefix();
            let bits = match_bits(entry.prefix.ip(), dst);
            if bits < pfx_len {
                continue;
            }
            if best.is_none_or(|(_, best_bits)| bits > best_bits) {
                best = Some((idx, bits));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Pool-order enumeration of all occupied off-link entries.
    pub fn iterate(&self, prev: Option<OfflIndex>) -> Option<OfflIndex> {
        self.pool.iterate(prev)
    }
}

/// Converts a relative lifetime (milliseconds) into an absolute deadline
/// relative to `now_ms`, preserving the `u32::MAX` "infinite" sentinel and
/// bumping a finite deadline that would otherwise collide with it.
fn to_deadline(now_ms: u32, lifetime_ms: u32) -> u32 {
    if lifetime_ms == u32::MAX {
        return u32::MAX;
    }
    let deadline = now_ms.wrapping_add(lifetime_ms);
    if deadline == u32::MAX {
        deadline.wrapping_add(1)
    } else {
        deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn deadline_preserves_infinite_sentinel_and_avoids_collision() {
        assert_eq!(to_deadline(1000, u32::MAX), u32::MAX);
        assert_eq!(to_deadline(0, u32::MAX - 1), u32::MAX - 1);
        // `now_ms + lifetime_ms` lands exactly on `u32::MAX`, the "infinite"
        // sentinel, even though neither input was infinite; bumping by one
        // per the spec's encoding rule wraps this case to `0` rather than
        // colliding with the sentinel.
        assert_eq!(to_deadline(1, u32::MAX - 1), 0);
    }

    #[test]
    fn longest_prefix_wins_ties_broken_by_first_encountered() {
        let mut onl = OnlPool::with_capacity(8);
        let mut offl = OfflPool::with_capacity(8);
        let narrow = offl
            .add(
                &mut onl,
                Some(addr("fe80::2")),
                1,
                addr("2001:db8::"),
                32,
                Mode::FT,
            )
            .unwrap();
        offl.add(
            &mut onl,
            Some(addr("fe80::3")),
            1,
            addr("2001:db8:1::"),
            48,
            Mode::FT,
        )
        .unwrap();

        let found = offl.longest_prefix_match(addr("2001:db8::5")).unwrap();
        assert_eq!(found, narrow);
    }

    #[test]
    fn offl_clear_leaves_next_hop_alone_while_another_entry_shares_it() {
        let mut onl = OnlPool::with_capacity(8);
        let mut timer = NoopTimer;
        let mut offl = OfflPool::with_capacity(8);
        let a = offl
            .add(
                &mut onl,
                Some(addr("fe80::1")),
                1,
                addr("2001:db8::"),
                32,
                Mode::FT,
            )
            .unwrap();
        offl.add(
            &mut onl,
            Some(addr("fe80::1")),
            1,
            addr("2001:db8:1::"),
            48,
            Mode::PL,
        )
        .unwrap();

        offl.remove(&mut onl, a, Mode::FT, &mut timer);
        assert!(onl.get(Some(addr("fe80::1")), 1).is_some());

        let remaining = offl.iterate(None).unwrap();
        offl.remove(&mut onl, remaining, Mode::PL, &mut timer);
        assert!(onl.get(Some(addr("fe80::1")), 1).is_none());
    }
}
