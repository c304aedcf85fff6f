//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::collections::BTreeSet;
use std::net::Ipv6Addr;

use generational_arena::Index;

use crate::debug::Debug;
use crate::offl::OfflIndex;
use crate::pool::Pool;

pub type AbrIndex = Index;

/// Releases a 6LoWPAN context identifier when the last prefix referencing
/// it is dropped. Stands in for the context-storage module the original
/// firmware's ABR table also had compile-time knowledge of; out of scope
/// here, so modeled as an injected collaborator the same way [`EventTimer`]
/// stands in for the timer module.
///
/// [`EventTimer`]: crate::timer::EventTimer
pub trait ContextReleaser: std::fmt::Debug {
    fn release(&mut self, cid: u8);
}

/// One authoritative border router (6LoWPAN multihop prefix/context
/// distribution, RFC 6775bis-style): its address, the off-link prefixes it
/// is authoritative for, and the 6LoWPAN context identifiers it has
/// distributed.
///
/// The original's prefix/context membership is a fixed-width bitmap indexed
/// by pool slot / context id; `generational_arena::Index` isn't a small
/// dense integer, so both are kept as ordered sets instead — same
/// membership semantics, no bit-packing.
#[derive(Debug)]
pub struct Abr {
    pub addr: Ipv6Addr,
    pub version: u32,
    prefixes: BTreeSet<OfflIndex>,
    contexts: BTreeSet<u8>,
}

/// The authoritative border-router table (C6, feature `multihop-p6c`).
#[derive(Debug)]
pub struct AbrTable {
    pool: Pool<Abr>,
}

impl AbrTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        AbrTable {
            pool: Pool::with_capacity(capacity),
        }
    }

    pub fn get(&self, addr: Ipv6Addr) -> Option<AbrIndex> {
        self.pool
            .iter()
            .find_map(|(idx, abr)| (abr.addr == addr).then_some(idx))
    }

    /// Returns the existing entry for `addr` if `version` isn't newer,
    /// updating its version if it is; otherwise allocates a fresh entry.
    /// Returns `None` if the table is full and `addr` isn't already
    /// tracked.
    pub fn add(&mut self, addr: Ipv6Addr, version: u32) -> Option<AbrIndex> {
        if let Some(idx) = self.get(addr) {
            let abr = &mut self.pool[idx];
            if version > abr.version {
                abr.version = version;
            }
            return Some(idx);
        }
        if self.pool.is_full() {
            return None;
        }
        Debug::AbrAdd(&addr).log();
        self.pool.try_insert(Abr {
            addr,
            version,
            prefixes: BTreeSet::new(),
            contexts: BTreeSet::new(),
        })
    }

    /// Removes an ABR entry, releasing every 6LoWPAN context it was the
    /// last distributor of through `releaser`. Does not touch the
    /// off-link/prefix-list entries it was tracking — see
    /// [`untrack_offl`](Self::untrack_offl) for that, which callers should
    /// run on each tracked prefix before removing a prefix's owning ABR.
    pub fn remove(&mut self, idx: AbrIndex, releaser: &mut dyn ContextReleaser) {
        let Some(abr) = self.pool.remove(idx) else {
            return;
        };
        for cid in abr.contexts {
            releaser.release(cid);
        }
        Debug::AbrRemove(&abr.addr).log();
    }

    pub fn add_pfx(&mut self, idx: AbrIndex, offl: OfflIndex) {
        if let Some(abr) = self.pool.get_mut(idx) {
            abr.prefixes.insert(offl);
        }
    }

    /// Stops tracking `offl` against every ABR that referenced it. Call
    /// this before freeing an off-link entry so no ABR is left pointing at
    /// a stale index.
    pub fn untrack_offl(&mut self, offl: OfflIndex) {
        for (_, abr) in self.pool.iter_mut() {
            abr.prefixes.remove(&offl);
        }
    }

    pub fn add_context(&mut self, idx: AbrIndex, cid: u8) {
        if let Some(abr) = self.pool.get_mut(idx) {
            abr.contexts.insert(cid);
        }
    }

    pub fn prefixes(&self, idx: AbrIndex) -> impl Iterator<Item = OfflIndex> + '_ {
        self.pool
            .get(idx)
            .into_iter()
            .flat_map(|abr| abr.prefixes.iter().copied())
    }

    pub fn iterate(&self, prev: Option<AbrIndex>) -> Option<AbrIndex> {
        self.pool.iterate(prev)
    }
}
