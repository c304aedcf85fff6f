//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use rand::Rng;

use crate::config::{MAX_RANDOM_FACTOR, MIN_RANDOM_FACTOR, REACH_TIME_RECALC_INTERVAL_MS};
use crate::timer::{EventTimer, TimerCtx, TimerKind};

pub type IfaceIndex = u32;

/// Per-interface Neighbor Discovery state (C5): the base reachable time
/// advertised/learned for the link, the randomized value actually in
/// effect, and the retransmit timer.
#[derive(Clone, Copy, Debug)]
pub struct IfaceState {
    pub iface: IfaceIndex,
    /// Base reachable time, milliseconds, before RFC 4861 §6.3.2
    /// randomization.
    pub base_reachable_time_ms: u32,
    /// Currently effective reachable time, milliseconds: `base` scaled by a
    /// random factor in `[0.5, 1.5)`, recomputed on
    /// [`recalc_reach_time`](IfaceTable::recalc_reach_time).
    pub reachable_time_ms: u32,
    pub retrans_timer_ms: u32,
    /// Handle of the scheduled event that reinvokes
    /// [`recalc_reach_time`](IfaceTable::recalc_reach_time), if one is armed.
    recalc_timeout: Option<u64>,
}

impl IfaceState {
    fn new(iface: IfaceIndex) -> Self {
        IfaceState {
            iface,
            base_reachable_time_ms: 0,
            reachable_time_ms: 0,
            retrans_timer_ms: 0,
            recalc_timeout: None,
        }
    }
}

/// The per-interface table (C5): a small fixed-capacity array, one entry
/// created on first reference to an interface index.
#[derive(Debug)]
pub struct IfaceTable {
    ifaces: Vec<IfaceState>,
    capacity: usize,
}

impl IfaceTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        IfaceTable {
            ifaces: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, iface: IfaceIndex) -> Option<&IfaceState> {
        self.ifaces.iter().find(|i| i.iface == iface)
    }

    /// Returns the existing entry for `iface`, or creates one (initialized
    /// to all-zero timers) if the table isn't full. Returns `None` only if
    /// the table is full and `iface` isn't already tracked.
    pub fn get_or_insert(&mut self, iface: IfaceIndex) -> Option<&mut IfaceState> {
        if let Some(pos) = self.ifaces.iter().position(|i| i.iface == iface) {
            return Some(&mut self.ifaces[pos]);
        }
        if self.ifaces.len() >= self.capacity {
            return None;
        }
        self.ifaces.push(IfaceState::new(iface));
        self.ifaces.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IfaceState> {
        self.ifaces.iter()
    }

    /// RFC 4861 §6.3.2: recomputes `reachable_time_ms` from
    /// `base_reachable_time_ms` scaled by a factor drawn uniformly from
    /// `[MIN_RANDOM_FACTOR, MAX_RANDOM_FACTOR)` thousandths, i.e. roughly
    /// `[0.5, 1.5)`, then (re)arms `timer` to call this again in
    /// [`REACH_TIME_RECALC_INTERVAL_MS`] so the effective value keeps
    /// drifting within the same window rather than staying pinned to one
    /// sample for the interface's lifetime. Called whenever
    /// `base_reachable_time_ms` changes and periodically thereafter.
    pub fn recalc_reach_time(
        &mut self,
        iface: IfaceIndex,
        rng: &mut impl Rng,
        timer: &mut dyn EventTimer,
    ) {
        if let Some(state) = self.ifaces.iter_mut().find(|i| i.iface == iface) {
            let factor = rng.random_range(MIN_RANDOM_FACTOR..MAX_RANDOM_FACTOR);
            state.reachable_time_ms =
                ((state.base_reachable_time_ms as u64 * factor as u64) / 1000) as u32;

            if let Some(handle) = state.recalc_timeout.take() {
                timer.cancel(handle);
            }
            state.recalc_timeout = Some(timer.add(
                TimerCtx::Iface(iface),
                TimerKind::ReachTimeRecalc,
                REACH_TIME_RECALC_INTERVAL_MS,
            ));
        }
    }
}
