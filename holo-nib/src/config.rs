//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

/// Pool capacities, standing in for the compile-time `_NUMOF` constants of
/// the original firmware build. Kept as runtime configuration rather than
/// const generics so a single binary can size its NIB to the platform it
/// ends up running on; either way, no pool ever grows past the capacity it
/// was constructed with.
#[derive(Clone, Copy, Debug)]
pub struct NibConfig {
    /// Capacity of the on-link node pool (neighbor cache plus every other
    /// table that shares a slot through mode bits).
    pub nib_numof: usize,
    /// Capacity of the off-link entry pool (forwarding table and prefix
    /// list).
    pub offl_numof: usize,
    /// Capacity of the default router list.
    pub default_router_numof: usize,
    /// Capacity of the authoritative border-router table (feature
    /// `multihop-p6c`).
    pub abr_numof: usize,
    /// Capacity of the per-interface table.
    pub netif_numof: usize,
}

impl Default for NibConfig {
    /// Matches the defaults shipped for a constrained host/router build.
    fn default() -> Self {
        NibConfig {
            nib_numof: 16,
            offl_numof: 16,
            default_router_numof: 2,
            abr_numof: 2,
            netif_numof: 1,
        }
    }
}

/// Lower bound of the RFC 4861 §6.3.2 reachable-time randomization factor,
/// expressed in thousandths.
pub const MIN_RANDOM_FACTOR: u32 = 500;
/// Upper bound of the RFC 4861 §6.3.2 reachable-time randomization factor,
/// expressed in thousandths.
pub const MAX_RANDOM_FACTOR: u32 = 1500;

/// Fixed interval, in milliseconds, at which [`IfaceTable::recalc_reach_time`]
/// reschedules itself so the effective reachable time keeps drifting within
/// the RFC 4861 §6.3.2 randomization window rather than staying pinned to one
/// sample for the life of the interface.
///
/// [`IfaceTable::recalc_reach_time`]: crate::iface::IfaceTable::recalc_reach_time
pub const REACH_TIME_RECALC_INTERVAL_MS: u64 = 60_000;
